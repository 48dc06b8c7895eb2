//! Newtype wrapper for the request identifier.
//!
//! The id is assigned by the site API and is the dedup key: a request is
//! forwarded at most once per id under normal operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A request identifier assigned by the site API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId(n)
    }
}
