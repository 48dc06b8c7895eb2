//! Domain types for the relay.

pub mod ids;
pub mod request;

pub use ids::RequestId;
pub use request::{MalformedRequest, RawRequest, Request};
