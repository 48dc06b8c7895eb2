//! Request Relay - a Telegram bot that forwards new site requests (заявки) to a chat.
//!
//! This library provides the relay loop and its collaborators: the SQLite
//! dedup ledger, the site API fetcher, and the Telegram notifier.

pub mod commands;
pub mod config;
pub mod ledger;
pub mod notify;
pub mod relay;
pub mod source;
pub mod types;
