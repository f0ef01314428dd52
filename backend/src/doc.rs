//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint, the request and response
//! bodies, and the admin bearer-token scheme. Customer and health endpoints
//! opt out of the default security requirement with `security([])`.
//!
//! The document backs Swagger UI in debug builds and is written out by the
//! `openapi-dump` binary.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{BulkImportReport, ImportFailure, RegionImportRecord};
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::regions::{DirectoryImportPayload, RegionRequest, RegionResponse};
use crate::inbound::http::serviceability::{
    DeliveryResolutionBody, QuoteResponse, ServiceabilityResponse,
};
use crate::inbound::http::zones::{ZoneRequest, ZoneResponse};

/// Name of the admin security scheme referenced by handlers.
pub const ADMIN_SECURITY_SCHEME: &str = "AdminBearer";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            ADMIN_SECURITY_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Static admin token configured via DELIVERY_ADMIN_TOKEN."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Delivery zones API",
        description = "Delivery zone administration and pincode serviceability checks."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("AdminBearer" = [])),
    paths(
        crate::inbound::http::serviceability::check_serviceability,
        crate::inbound::http::serviceability::quote_delivery,
        crate::inbound::http::zones::list_zones,
        crate::inbound::http::zones::create_zone,
        crate::inbound::http::zones::get_zone,
        crate::inbound::http::zones::update_zone,
        crate::inbound::http::zones::delete_zone,
        crate::inbound::http::regions::list_regions,
        crate::inbound::http::regions::add_region,
        crate::inbound::http::regions::remove_region,
        crate::inbound::http::regions::bulk_import,
        crate::inbound::http::regions::import_from_directory,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        ZoneRequest,
        ZoneResponse,
        RegionRequest,
        RegionResponse,
        RegionImportRecord,
        BulkImportReport,
        ImportFailure,
        DirectoryImportPayload,
        ServiceabilityResponse,
        DeliveryResolutionBody,
        QuoteResponse,
    )),
    tags(
        (name = "delivery", description = "Customer-facing serviceability checks"),
        (name = "zones", description = "Delivery zone administration"),
        (name = "regions", description = "Region assignment and bulk import"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
