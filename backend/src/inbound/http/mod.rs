//! HTTP inbound adapter exposing REST endpoints.
//!
//! Customer endpoints are public; everything under `/admin` requires the
//! bearer token checked by [`admin_auth::AdminAccess`].

pub mod admin_auth;
pub mod error;
pub mod health;
pub mod regions;
pub mod serviceability;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;
pub mod zones;

use actix_web::web;

pub use crate::domain::ApiResult;

/// Base path shared by every REST endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Register the versioned REST scope.
///
/// The caller supplies [`state::HttpState`] as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(API_PREFIX)
            .app_data(regions::import_json_config())
            .service(serviceability::check_serviceability)
            .service(serviceability::quote_delivery)
            .service(zones::list_zones)
            .service(zones::create_zone)
            .service(zones::get_zone)
            .service(zones::update_zone)
            .service(zones::delete_zone)
            .service(regions::list_regions)
            .service(regions::add_region)
            .service(regions::bulk_import)
            .service(regions::import_from_directory)
            .service(regions::remove_region),
    );
}
