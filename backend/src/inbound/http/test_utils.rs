//! Test helpers for the HTTP handlers.

use std::sync::Arc;

use actix_web::web;

use crate::domain::ports::{MockDeliveryResolutionQuery, MockRegionAssignment, MockZoneRegistry};

use super::admin_auth::AdminCredentials;
use super::state::HttpState;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// `Authorization` header carrying [`ADMIN_TOKEN`].
pub fn admin_header() -> (&'static str, String) {
    ("Authorization", format!("Bearer {ADMIN_TOKEN}"))
}

/// Port mocks for one handler test; unset mocks reject every call.
#[derive(Default)]
pub struct MockPorts {
    pub zones: MockZoneRegistry,
    pub regions: MockRegionAssignment,
    pub resolution: MockDeliveryResolutionQuery,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            Arc::new(self.zones),
            Arc::new(self.regions),
            Arc::new(self.resolution),
            AdminCredentials::from_token(Some(ADMIN_TOKEN)),
        ))
    }
}
