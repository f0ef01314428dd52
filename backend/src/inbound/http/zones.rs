//! Admin handlers for delivery zones.
//!
//! ```text
//! GET    /api/v1/admin/delivery/zones
//! POST   /api/v1/admin/delivery/zones
//! GET    /api/v1/admin/delivery/zones/{id}
//! PUT    /api/v1/admin/delivery/zones/{id}
//! DELETE /api/v1/admin/delivery/zones/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ApiResult, DeliveryZone, Error, ZoneDraft, ZoneId};
use crate::inbound::http::admin_auth::AdminAccess;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, require};

const ZONE_ID: FieldName = FieldName::new("id");

/// Create or replace payload for a zone.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRequest {
    pub zone_number: Option<i64>,
    pub zone_name: Option<String>,
    pub delivery_days_min: Option<i64>,
    pub delivery_days_max: Option<i64>,
    /// Flat charge in rupees with at most two decimal places.
    #[schema(value_type = Option<String>, example = "49.00")]
    pub delivery_charge: Option<Decimal>,
    pub description: Option<String>,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
}

impl ZoneRequest {
    fn into_draft(self, id: Option<ZoneId>) -> Result<ZoneDraft, Error> {
        Ok(ZoneDraft {
            id,
            zone_number: require(self.zone_number, FieldName::new("zoneNumber"))?,
            zone_name: require(self.zone_name, FieldName::new("zoneName"))?,
            delivery_days_min: require(self.delivery_days_min, FieldName::new("deliveryDaysMin"))?,
            delivery_days_max: require(self.delivery_days_max, FieldName::new("deliveryDaysMax"))?,
            delivery_charge: require(self.delivery_charge, FieldName::new("deliveryCharge"))?,
            description: self
                .description
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty()),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// Zone as returned to admin clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub id: String,
    pub zone_number: u32,
    pub zone_name: String,
    pub delivery_days_min: u16,
    pub delivery_days_max: u16,
    #[schema(value_type = String, example = "49.00")]
    pub delivery_charge: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DeliveryZone> for ZoneResponse {
    fn from(zone: DeliveryZone) -> Self {
        Self {
            id: zone.id.to_string(),
            zone_number: zone.zone_number.get(),
            zone_name: zone.zone_name,
            delivery_days_min: zone.transit_days.min(),
            delivery_days_max: zone.transit_days.max(),
            delivery_charge: zone.delivery_charge.amount(),
            description: zone.description,
            is_active: zone.is_active,
            created_at: zone.created_at.to_rfc3339(),
            updated_at: zone.updated_at.to_rfc3339(),
        }
    }
}

/// List every zone ordered by zone number.
#[utoipa::path(
    get,
    path = "/api/v1/admin/delivery/zones",
    responses(
        (status = 200, description = "All delivery zones", body = [ZoneResponse]),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["zones"],
    operation_id = "listDeliveryZones"
)]
#[get("/admin/delivery/zones")]
pub async fn list_zones(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
) -> ApiResult<web::Json<Vec<ZoneResponse>>> {
    let zones = state.zones.list_zones().await?;
    Ok(web::Json(zones.into_iter().map(ZoneResponse::from).collect()))
}

/// Create a zone.
#[utoipa::path(
    post,
    path = "/api/v1/admin/delivery/zones",
    request_body = ZoneRequest,
    responses(
        (status = 201, description = "Zone created", body = ZoneResponse),
        (status = 400, description = "Invalid zone", body = Error),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 409, description = "Zone number already in use", body = Error)
    ),
    tags = ["zones"],
    operation_id = "createDeliveryZone"
)]
#[post("/admin/delivery/zones")]
pub async fn create_zone(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    payload: web::Json<ZoneRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner().into_draft(None)?;
    let zone = state.zones.upsert_zone(draft).await?;
    Ok(HttpResponse::Created().json(ZoneResponse::from(zone)))
}

/// Fetch one zone.
#[utoipa::path(
    get,
    path = "/api/v1/admin/delivery/zones/{id}",
    params(("id" = String, Path, description = "Zone identifier")),
    responses(
        (status = 200, description = "Delivery zone", body = ZoneResponse),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 404, description = "Zone not found", body = Error)
    ),
    tags = ["zones"],
    operation_id = "getDeliveryZone"
)]
#[get("/admin/delivery/zones/{id}")]
pub async fn get_zone(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    path: web::Path<String>,
) -> ApiResult<web::Json<ZoneResponse>> {
    let id: ZoneId = parse_id(&path, ZONE_ID)?;
    let zone = state.zones.get_zone(id).await?;
    Ok(web::Json(ZoneResponse::from(zone)))
}

/// Replace a zone's attributes, keeping its id and creation time.
#[utoipa::path(
    put,
    path = "/api/v1/admin/delivery/zones/{id}",
    params(("id" = String, Path, description = "Zone identifier")),
    request_body = ZoneRequest,
    responses(
        (status = 200, description = "Zone updated", body = ZoneResponse),
        (status = 400, description = "Invalid zone", body = Error),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 404, description = "Zone not found", body = Error),
        (status = 409, description = "Zone number already in use", body = Error)
    ),
    tags = ["zones"],
    operation_id = "updateDeliveryZone"
)]
#[put("/admin/delivery/zones/{id}")]
pub async fn update_zone(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    path: web::Path<String>,
    payload: web::Json<ZoneRequest>,
) -> ApiResult<web::Json<ZoneResponse>> {
    let id: ZoneId = parse_id(&path, ZONE_ID)?;
    let draft = payload.into_inner().into_draft(Some(id))?;
    let zone = state.zones.upsert_zone(draft).await?;
    Ok(web::Json(ZoneResponse::from(zone)))
}

/// Delete a zone that no longer has regions assigned.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/delivery/zones/{id}",
    params(("id" = String, Path, description = "Zone identifier")),
    responses(
        (status = 204, description = "Zone deleted"),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 404, description = "Zone not found", body = Error),
        (status = 409, description = "Zone still has regions assigned", body = Error)
    ),
    tags = ["zones"],
    operation_id = "deleteDeliveryZone"
)]
#[delete("/admin/delivery/zones/{id}")]
pub async fn delete_zone(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ZoneId = parse_id(&path, ZONE_ID)?;
    state.zones.delete_zone(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
