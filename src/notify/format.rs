//! Notification text layout.

use crate::types::Request;

/// Formats the notification text for one request.
///
/// The layout is fixed label-value lines and must stay byte-for-byte stable;
/// operators and downstream tooling match on it.
pub fn format_notification(request: &Request) -> String {
    format!(
        "Новая заявка:\n\
         Имя: {}\n\
         Контактные данные: {}\n\
         Текст заявки: {}\n\
         Дата и время: {}",
        request.name, request.contact, request.text, request.datetime
    )
}
