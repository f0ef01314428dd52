//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and depend only on the
//! driving ports, so they stay testable without a database.

use std::sync::Arc;

use crate::domain::ports::{DeliveryResolutionQuery, RegionAssignment, ZoneRegistry};

use super::admin_auth::AdminCredentials;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub zones: Arc<dyn ZoneRegistry>,
    pub regions: Arc<dyn RegionAssignment>,
    pub resolution: Arc<dyn DeliveryResolutionQuery>,
    pub admin: AdminCredentials,
}

impl HttpState {
    pub fn new(
        zones: Arc<dyn ZoneRegistry>,
        regions: Arc<dyn RegionAssignment>,
        resolution: Arc<dyn DeliveryResolutionQuery>,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            zones,
            regions,
            resolution,
            admin,
        }
    }
}
