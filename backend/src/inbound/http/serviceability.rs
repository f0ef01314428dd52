//! Customer-facing serviceability and checkout quote handlers.
//!
//! ```text
//! GET /api/v1/delivery/serviceability/{pincode}
//! GET /api/v1/delivery/quote?pincode=&subtotal=
//! ```
//!
//! Uncovered pincodes and pincodes in inactive zones are reported the same
//! way so customers cannot tell the two apart.

use actix_web::{get, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApiResult, DeliveryQuote, DeliveryResolution, Error, NOT_SERVICEABLE_REASON, Serviceability,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_amount, require};

const PINCODE: FieldName = FieldName::new("pincode");
const SUBTOTAL: FieldName = FieldName::new("subtotal");

/// Zone that will deliver to a pincode.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResolutionBody {
    pub zone_id: String,
    pub zone_number: u32,
    pub zone_name: String,
    pub delivery_days_min: u16,
    pub delivery_days_max: u16,
    #[schema(value_type = String, example = "49.00")]
    pub delivery_charge: Decimal,
    /// Region type that decided the match: `state`, `district`, or `pincode`.
    pub matched_by: String,
    pub matched_state: Option<String>,
    pub matched_city: Option<String>,
    pub matched_pincode: String,
}

impl From<DeliveryResolution> for DeliveryResolutionBody {
    fn from(resolution: DeliveryResolution) -> Self {
        Self {
            zone_id: resolution.zone_id.to_string(),
            zone_number: resolution.zone_number.get(),
            zone_name: resolution.zone_name,
            delivery_days_min: resolution.delivery_days_min,
            delivery_days_max: resolution.delivery_days_max,
            delivery_charge: resolution.delivery_charge.amount(),
            matched_by: resolution.matched_by.to_string(),
            matched_state: resolution.matched_state,
            matched_city: resolution.matched_city,
            matched_pincode: resolution.matched_pincode.to_string(),
        }
    }
}

/// Serviceability verdict for one pincode.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceabilityResponse {
    pub pincode: String,
    pub serviceable: bool,
    /// Present when `serviceable` is false; always `not_serviceable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryResolutionBody>,
}

impl ServiceabilityResponse {
    fn from_verdict(pincode: &str, verdict: Serviceability) -> Self {
        match verdict {
            Serviceability::Available(resolution) => Self {
                pincode: resolution.matched_pincode.to_string(),
                serviceable: true,
                reason: None,
                delivery: Some(DeliveryResolutionBody::from(resolution)),
            },
            Serviceability::NotAvailable(_) => Self {
                pincode: pincode.trim().to_owned(),
                serviceable: false,
                reason: Some(NOT_SERVICEABLE_REASON.to_owned()),
                delivery: None,
            },
        }
    }
}

/// Checkout totals for an order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub pincode: String,
    #[schema(value_type = String, example = "499.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "49.00")]
    pub delivery_charge: Decimal,
    #[schema(value_type = String, example = "548.00")]
    pub total: Decimal,
    pub delivery: DeliveryResolutionBody,
}

impl From<DeliveryQuote> for QuoteResponse {
    fn from(quote: DeliveryQuote) -> Self {
        Self {
            pincode: quote.resolution.matched_pincode.to_string(),
            subtotal: quote.subtotal,
            delivery_charge: quote.delivery_charge,
            total: quote.total,
            delivery: DeliveryResolutionBody::from(quote.resolution),
        }
    }
}

/// Query parameters for a checkout quote.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteQuery {
    #[param(example = "632001")]
    pub pincode: Option<String>,
    /// Order subtotal in rupees.
    #[param(example = "499.00")]
    pub subtotal: Option<String>,
}

/// Check whether a pincode can be delivered to.
#[utoipa::path(
    get,
    path = "/api/v1/delivery/serviceability/{pincode}",
    params(("pincode" = String, Path, description = "Six-digit Indian pincode")),
    responses(
        (status = 200, description = "Serviceability verdict", body = ServiceabilityResponse),
        (status = 400, description = "Malformed pincode", body = Error),
        (status = 503, description = "Pincode directory unavailable", body = Error)
    ),
    tags = ["delivery"],
    security([]),
    operation_id = "checkServiceability"
)]
#[get("/delivery/serviceability/{pincode}")]
pub async fn check_serviceability(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ServiceabilityResponse>> {
    let pincode = path.into_inner();
    let verdict = state.resolution.check_serviceability(&pincode).await?;
    Ok(web::Json(ServiceabilityResponse::from_verdict(
        &pincode, verdict,
    )))
}

/// Quote the delivery charge and order total for a pincode.
#[utoipa::path(
    get,
    path = "/api/v1/delivery/quote",
    params(QuoteQuery),
    responses(
        (status = 200, description = "Checkout quote", body = QuoteResponse),
        (status = 400, description = "Malformed pincode or subtotal", body = Error),
        (status = 404, description = "Pincode not serviceable", body = Error),
        (status = 503, description = "Pincode directory unavailable", body = Error)
    ),
    tags = ["delivery"],
    security([]),
    operation_id = "quoteDelivery"
)]
#[get("/delivery/quote")]
pub async fn quote_delivery(
    state: web::Data<HttpState>,
    query: web::Query<QuoteQuery>,
) -> ApiResult<web::Json<QuoteResponse>> {
    let QuoteQuery { pincode, subtotal } = query.into_inner();
    let pincode = require(pincode, PINCODE)?;
    let subtotal: Decimal = parse_amount(&require(subtotal, SUBTOTAL)?, SUBTOTAL)?;
    let quote = state.resolution.quote_delivery(&pincode, subtotal).await?;
    Ok(web::Json(QuoteResponse::from(quote)))
}
