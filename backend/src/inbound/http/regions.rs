//! Admin handlers for region assignments and imports.
//!
//! ```text
//! GET    /api/v1/admin/delivery/regions?zoneId=
//! POST   /api/v1/admin/delivery/regions
//! DELETE /api/v1/admin/delivery/regions/{id}
//! POST   /api/v1/admin/delivery/regions/import
//! POST   /api/v1/admin/delivery/regions/import-directory
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    BulkImportReport, DirectoryImportRequest, NewRegion, RegionImportRecord,
};
use crate::domain::{
    ApiResult, Error, MAX_IMPORT_RECORDS, RegionId, RegionType, ZoneId, ZoneRegion,
};
use crate::inbound::http::admin_auth::AdminAccess;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, require};

const ZONE_ID: FieldName = FieldName::new("zoneId");
const REGION_TYPE: FieldName = FieldName::new("regionType");
const STATE_NAME: FieldName = FieldName::new("stateName");

/// Manual region assignment payload.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionRequest {
    pub zone_id: Option<String>,
    /// `state`, `district`, or `pincode`.
    #[schema(example = "district")]
    pub region_type: Option<String>,
    #[serde(alias = "state")]
    pub state_name: Option<String>,
    #[serde(alias = "district", alias = "city")]
    pub district_name: Option<String>,
    pub pincode: Option<String>,
}

impl RegionRequest {
    fn into_new_region(self) -> Result<NewRegion, Error> {
        let zone_id: ZoneId = parse_id(&require(self.zone_id, ZONE_ID)?, ZONE_ID)?;
        let raw_type = require(self.region_type, REGION_TYPE)?;
        let region_type = raw_type.parse::<RegionType>().map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(serde_json::json!({
                "field": REGION_TYPE.as_str(),
                "value": raw_type,
            }))
        })?;
        Ok(NewRegion {
            zone_id,
            region_type,
            state_name: self.state_name,
            district_name: self.district_name,
            pincode: self.pincode,
        })
    }
}

/// Region assignment as returned to admin clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionResponse {
    pub id: String,
    pub zone_id: String,
    #[schema(example = "pincode")]
    pub region_type: String,
    /// Normalised natural key, e.g. `district:tamil nadu/vellore`.
    pub region_key: String,
    pub state_name: Option<String>,
    pub district_name: Option<String>,
    pub pincode: Option<String>,
    pub created_at: String,
}

impl From<ZoneRegion> for RegionResponse {
    fn from(region: ZoneRegion) -> Self {
        let target = &region.target;
        Self {
            id: region.id.to_string(),
            zone_id: region.zone_id.to_string(),
            region_type: target.region_type().to_string(),
            region_key: target.key().to_string(),
            state_name: target.state_name().map(|name| name.as_str().to_owned()),
            district_name: target.district_name().map(|name| name.as_str().to_owned()),
            pincode: target.pincode().map(|pincode| pincode.as_str().to_owned()),
            created_at: region.created_at.to_rfc3339(),
        }
    }
}

/// Optional filter for listing regions.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RegionListQuery {
    /// Restrict the listing to one zone.
    pub zone_id: Option<String>,
}

/// Directory import payload.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryImportPayload {
    pub zone_id: Option<String>,
    #[serde(alias = "state")]
    #[schema(example = "Tamil Nadu")]
    pub state_name: Option<String>,
    #[serde(alias = "district", alias = "city")]
    #[schema(example = "Vellore")]
    pub district_name: Option<String>,
}

impl DirectoryImportPayload {
    fn into_request(self) -> Result<DirectoryImportRequest, Error> {
        Ok(DirectoryImportRequest {
            zone_id: parse_id(&require(self.zone_id, ZONE_ID)?, ZONE_ID)?,
            state_name: require(self.state_name, STATE_NAME)?,
            district_name: self.district_name,
        })
    }
}

/// List region assignments, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/delivery/regions",
    params(RegionListQuery),
    responses(
        (status = 200, description = "Region assignments", body = [RegionResponse]),
        (status = 400, description = "Invalid zone id", body = Error),
        (status = 401, description = "Missing or invalid admin token", body = Error)
    ),
    tags = ["regions"],
    operation_id = "listZoneRegions"
)]
#[get("/admin/delivery/regions")]
pub async fn list_regions(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    query: web::Query<RegionListQuery>,
) -> ApiResult<web::Json<Vec<RegionResponse>>> {
    let zone_id = query
        .into_inner()
        .zone_id
        .map(|raw| parse_id::<ZoneId>(&raw, ZONE_ID))
        .transpose()?;
    let regions = state.regions.list_regions(zone_id).await?;
    Ok(web::Json(
        regions.into_iter().map(RegionResponse::from).collect(),
    ))
}

/// Assign one region to a zone.
#[utoipa::path(
    post,
    path = "/api/v1/admin/delivery/regions",
    request_body = RegionRequest,
    responses(
        (status = 201, description = "Region assigned", body = RegionResponse),
        (status = 400, description = "Invalid region", body = Error),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 404, description = "Zone not found", body = Error),
        (status = 409, description = "Region already assigned", body = Error)
    ),
    tags = ["regions"],
    operation_id = "addZoneRegion"
)]
#[post("/admin/delivery/regions")]
pub async fn add_region(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    payload: web::Json<RegionRequest>,
) -> ApiResult<HttpResponse> {
    let region = payload.into_inner().into_new_region()?;
    let created = state.regions.add_region(region).await?;
    Ok(HttpResponse::Created().json(RegionResponse::from(created)))
}

/// Remove a region assignment.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/delivery/regions/{id}",
    params(("id" = String, Path, description = "Region identifier")),
    responses(
        (status = 204, description = "Region removed"),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 404, description = "Region not found", body = Error)
    ),
    tags = ["regions"],
    operation_id = "removeZoneRegion"
)]
#[delete("/admin/delivery/regions/{id}")]
pub async fn remove_region(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: RegionId = parse_id(&path, FieldName::new("id"))?;
    state.regions.remove_region(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Upsert a list of region records, reporting per-record failures.
#[utoipa::path(
    post,
    path = "/api/v1/admin/delivery/regions/import",
    request_body = [RegionImportRecord],
    responses(
        (status = 200, description = "Import summary", body = BulkImportReport),
        (status = 400, description = "Too many records", body = Error),
        (status = 401, description = "Missing or invalid admin token", body = Error)
    ),
    tags = ["regions"],
    operation_id = "bulkImportZoneRegions"
)]
#[post("/admin/delivery/regions/import")]
pub async fn bulk_import(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    payload: web::Json<Vec<RegionImportRecord>>,
) -> ApiResult<web::Json<BulkImportReport>> {
    let report = state
        .regions
        .bulk_import_regions(payload.into_inner())
        .await?;
    Ok(web::Json(report))
}

/// Import every pincode the directory lists for a state or district.
#[utoipa::path(
    post,
    path = "/api/v1/admin/delivery/regions/import-directory",
    request_body = DirectoryImportPayload,
    responses(
        (status = 200, description = "Import summary", body = BulkImportReport),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Missing or invalid admin token", body = Error),
        (status = 404, description = "Zone not found", body = Error),
        (status = 503, description = "Pincode directory unavailable", body = Error)
    ),
    tags = ["regions"],
    operation_id = "importZoneRegionsFromDirectory"
)]
#[post("/admin/delivery/regions/import-directory")]
pub async fn import_from_directory(
    state: web::Data<HttpState>,
    _admin: AdminAccess,
    payload: web::Json<DirectoryImportPayload>,
) -> ApiResult<web::Json<BulkImportReport>> {
    let request = payload.into_inner().into_request()?;
    let report = state.regions.import_from_directory(request).await?;
    Ok(web::Json(report))
}

/// JSON body limit sized for the largest accepted import.
pub fn import_json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(MAX_IMPORT_RECORDS * 256)
}
