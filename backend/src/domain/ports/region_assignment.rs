//! Driving port for assigning regions to zones.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{DeliveryError, RegionId, RegionType, ZoneId, ZoneRegion};

/// Manually entered region assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegion {
    pub zone_id: ZoneId,
    pub region_type: RegionType,
    pub state_name: Option<String>,
    pub district_name: Option<String>,
    pub pincode: Option<String>,
}

/// One record of a bulk import.
///
/// The target zone is named by `zoneId` or by `zoneNumber`. When
/// `regionType` is omitted it is inferred: a pincode makes a pincode region,
/// a district (or a `"State - District"` state) makes a district region,
/// and a bare state makes a state region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionImportRecord {
    #[serde(default)]
    pub zone_id: Option<Uuid>,
    #[serde(default)]
    #[schema(example = 2)]
    pub zone_number: Option<i64>,
    #[serde(default)]
    #[schema(example = "district")]
    pub region_type: Option<String>,
    #[serde(default, alias = "state")]
    #[schema(example = "Tamil Nadu")]
    pub state_name: Option<String>,
    #[serde(default, alias = "district", alias = "city")]
    #[schema(example = "Vellore")]
    pub district_name: Option<String>,
    #[serde(default)]
    #[schema(example = "632001")]
    pub pincode: Option<String>,
}

/// A record the import could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    /// Zero-based position of the record in the submitted list.
    pub index: usize,
    /// Natural key of the record when it could be derived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub reason: String,
}

/// Summary of a bulk or directory import.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportReport {
    pub succeeded: usize,
    pub failed: Vec<ImportFailure>,
    /// The directory listing stopped at the page limit; pincodes past it
    /// were not imported.
    #[serde(default)]
    pub truncated: bool,
}

/// Import every pincode of a state (or district) into a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryImportRequest {
    pub zone_id: ZoneId,
    pub state_name: String,
    pub district_name: Option<String>,
}

/// Administrative operations over region assignments.
///
/// Every successful mutation invalidates cached resolutions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionAssignment: Send + Sync {
    /// # Errors
    ///
    /// - `NotFound` when the zone does not exist.
    /// - `InvalidInput` when the fields do not form a region.
    /// - `Conflict` when the natural key is already assigned.
    async fn add_region(&self, region: NewRegion) -> Result<ZoneRegion, DeliveryError>;

    async fn remove_region(&self, id: RegionId) -> Result<(), DeliveryError>;

    /// Regions ordered by creation time then id.
    async fn list_regions(&self, zone_id: Option<ZoneId>)
    -> Result<Vec<ZoneRegion>, DeliveryError>;

    /// Upsert records one by one, last write wins per natural key.
    ///
    /// A failing record is reported and skipped; earlier records stay
    /// committed.
    async fn bulk_import_regions(
        &self,
        records: Vec<RegionImportRecord>,
    ) -> Result<BulkImportReport, DeliveryError>;

    /// Page through the directory and upsert one pincode region per
    /// distinct pincode found.
    async fn import_from_directory(
        &self,
        request: DirectoryImportRequest,
    ) -> Result<BulkImportReport, DeliveryError>;
}
