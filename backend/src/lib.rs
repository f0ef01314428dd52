//! Delivery zones backend library.
//!
//! Maintains delivery zones, assigns states, districts, and pincodes to
//! them, and answers "can we deliver to this pincode, for how much, and how
//! fast?" over HTTP.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
