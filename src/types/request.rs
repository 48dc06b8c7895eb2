//! Raw and validated request records.
//!
//! The source API returns a JSON array of request objects. The fetch boundary
//! deserializes each element into a [`RawRequest`] with every field optional:
//! the API occasionally emits partial objects, and rejecting them is the relay
//! loop's job, not the fetcher's. [`Request::try_from_raw`] performs that
//! validation and produces a typed [`MalformedRequest`] naming the first
//! missing field, so malformed payloads never reach the formatting step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RequestId;

/// One element of the source API's JSON array, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub text: Option<String>,
    pub datetime: Option<String>,
}

/// A raw request was missing a required field.
///
/// Malformed requests are skipped without being recorded in the ledger, so
/// they are re-attempted on the next cycle if the source still reports them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request (id={id:?}) is missing required field `{field}`")]
pub struct MalformedRequest {
    /// The id, if present. A missing id is itself reported with `field = "id"`.
    pub id: Option<i64>,
    /// The first required field found missing.
    pub field: &'static str,
}

/// A validated request record with all required fields present.
///
/// `datetime` is an opaque string from the source; it is passed through to
/// the notification verbatim, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub name: String,
    pub contact: String,
    pub text: String,
    pub datetime: String,
}

impl Request {
    /// Validates a raw request, resolving all required fields.
    pub fn try_from_raw(raw: &RawRequest) -> Result<Self, MalformedRequest> {
        let missing = |field: &'static str| MalformedRequest { id: raw.id, field };

        let id = raw.id.ok_or_else(|| missing("id"))?;
        let name = raw.name.clone().ok_or_else(|| missing("name"))?;
        let contact = raw.contact.clone().ok_or_else(|| missing("contact"))?;
        let text = raw.text.clone().ok_or_else(|| missing("text"))?;
        let datetime = raw.datetime.clone().ok_or_else(|| missing("datetime"))?;

        Ok(Request {
            id: RequestId(id),
            name,
            contact,
            text,
            datetime,
        })
    }
}
