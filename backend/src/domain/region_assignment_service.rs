//! Region assignment domain service.
//!
//! Manual additions are strict: an already assigned natural key is a
//! conflict. Imports are lenient: records are upserted by natural key one at
//! a time, so the last record for a key wins and a bad record only costs
//! itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use super::zone_registry_service::invalidate_resolutions;
use crate::domain::ports::{
    BulkImportReport, DirectoryImportRequest, ImportFailure, NewRegion, RegionAssignment,
    RegionImportRecord, RegionRepository, ResolutionCache, ZoneRepository,
};
use crate::domain::{
    DeliveryError, DeliveryZone, DirectoryLookup, LEGACY_DISTRICT_SEPARATOR, RegionId, RegionName,
    RegionTarget, RegionType, ZoneId, ZoneNumber, ZoneRegion,
};

/// Largest number of records accepted by one bulk import.
pub const MAX_IMPORT_RECORDS: usize = 10_000;

/// Region assignment service implementing the driving port.
#[derive(Clone)]
pub struct RegionAssignmentService<Z, R> {
    zones: Arc<Z>,
    regions: Arc<R>,
    directory: DirectoryLookup,
    cache: Arc<dyn ResolutionCache>,
    clock: Arc<dyn Clock>,
}

impl<Z, R> RegionAssignmentService<Z, R> {
    pub fn new(
        zones: Arc<Z>,
        regions: Arc<R>,
        directory: DirectoryLookup,
        cache: Arc<dyn ResolutionCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            zones,
            regions,
            directory,
            cache,
            clock,
        }
    }
}

/// Zones indexed for import record lookups.
struct ZoneIndex {
    by_id: HashMap<ZoneId, ZoneNumber>,
    by_number: HashMap<ZoneNumber, ZoneId>,
}

impl ZoneIndex {
    fn new(zones: &[DeliveryZone]) -> Self {
        Self {
            by_id: zones.iter().map(|zone| (zone.id, zone.zone_number)).collect(),
            by_number: zones.iter().map(|zone| (zone.zone_number, zone.id)).collect(),
        }
    }

    fn select(&self, record: &RegionImportRecord) -> Result<ZoneId, String> {
        let by_id = record.zone_id.map(ZoneId::from_uuid);
        let by_number = record
            .zone_number
            .map(|raw| ZoneNumber::new(raw).map_err(|err| err.to_string()))
            .transpose()?;

        match (by_id, by_number) {
            (Some(id), number) => {
                let owned = self
                    .by_id
                    .get(&id)
                    .ok_or_else(|| format!("zone {id} not found"))?;
                match number {
                    Some(number) if number != *owned => Err(format!(
                        "zone {id} has number {owned}, not {number}"
                    )),
                    _ => Ok(id),
                }
            }
            (None, Some(number)) => self
                .by_number
                .get(&number)
                .copied()
                .ok_or_else(|| format!("zone number {number} not found")),
            (None, None) => Err("record must name a zoneId or a zoneNumber".to_owned()),
        }
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|raw| !raw.trim().is_empty())
}

/// Region type named by the record, or inferred from the fields it fills.
fn record_region_type(record: &RegionImportRecord) -> Result<RegionType, String> {
    if let Some(raw) = record.region_type.as_deref().filter(|raw| !raw.trim().is_empty()) {
        return raw.parse::<RegionType>().map_err(|err| err.to_string());
    }
    if is_present(record.pincode.as_deref()) {
        return Ok(RegionType::Pincode);
    }
    let legacy_district = record
        .state_name
        .as_deref()
        .is_some_and(|state| state.contains(LEGACY_DISTRICT_SEPARATOR));
    if is_present(record.district_name.as_deref()) || legacy_district {
        return Ok(RegionType::District);
    }
    Ok(RegionType::State)
}

fn record_target(record: &RegionImportRecord) -> Result<RegionTarget, String> {
    let region_type = record_region_type(record)?;
    RegionTarget::from_parts(
        region_type,
        record.state_name.as_deref(),
        record.district_name.as_deref(),
        record.pincode.as_deref(),
    )
    .map_err(|err| err.to_string())
}

impl<Z, R> RegionAssignmentService<Z, R>
where
    Z: ZoneRepository,
    R: RegionRepository,
{
    async fn require_zone(&self, id: ZoneId) -> Result<DeliveryZone, DeliveryError> {
        self.zones
            .find_by_id(&id)
            .await?
            .ok_or_else(|| DeliveryError::not_found(format!("zone {id} not found")))
    }

    async fn conflict_for(&self, existing: &ZoneRegion) -> DeliveryError {
        let owner = match self.zones.find_by_id(&existing.zone_id).await {
            Ok(Some(zone)) => format!("zone {}", zone.zone_number),
            _ => format!("zone {}", existing.zone_id),
        };
        DeliveryError::conflict(format!(
            "region {} is already assigned to {owner}",
            existing.key()
        ))
    }

    fn new_region(&self, zone_id: ZoneId, target: RegionTarget) -> ZoneRegion {
        ZoneRegion {
            id: RegionId::random(),
            zone_id,
            target,
            created_at: self.clock.utc(),
        }
    }

    async fn import_record(
        &self,
        index: usize,
        record: &RegionImportRecord,
        zones: &ZoneIndex,
    ) -> Result<(), ImportFailure> {
        let target = record_target(record).map_err(|reason| ImportFailure {
            index,
            key: None,
            reason,
        })?;
        let key = target.key();
        let zone_id = zones.select(record).map_err(|reason| ImportFailure {
            index,
            key: Some(key.to_string()),
            reason,
        })?;

        self.regions
            .upsert_by_key(&self.new_region(zone_id, target))
            .await
            .map(|_| ())
            .map_err(|err| ImportFailure {
                index,
                key: Some(key.to_string()),
                reason: DeliveryError::from(err).to_string(),
            })
    }
}

#[async_trait]
impl<Z, R> RegionAssignment for RegionAssignmentService<Z, R>
where
    Z: ZoneRepository,
    R: RegionRepository,
{
    async fn add_region(&self, region: NewRegion) -> Result<ZoneRegion, DeliveryError> {
        let target = RegionTarget::from_parts(
            region.region_type,
            region.state_name.as_deref(),
            region.district_name.as_deref(),
            region.pincode.as_deref(),
        )
        .map_err(|err| DeliveryError::invalid_input(err.field(), err.to_string()))?;
        self.require_zone(region.zone_id).await?;

        if let Some(existing) = self
            .regions
            .find_by_keys(&[target.key()])
            .await?
            .into_iter()
            .next()
        {
            return Err(self.conflict_for(&existing).await);
        }

        let created = self.new_region(region.zone_id, target);
        self.regions.insert(&created).await?;
        info!(
            region_id = %created.id,
            zone_id = %created.zone_id,
            key = %created.key(),
            "region assigned"
        );
        invalidate_resolutions(self.cache.as_ref(), "region added").await;
        Ok(created)
    }

    async fn remove_region(&self, id: RegionId) -> Result<(), DeliveryError> {
        if !self.regions.delete(&id).await? {
            return Err(DeliveryError::not_found(format!("region {id} not found")));
        }
        info!(region_id = %id, "region removed");
        invalidate_resolutions(self.cache.as_ref(), "region removed").await;
        Ok(())
    }

    async fn list_regions(
        &self,
        zone_id: Option<ZoneId>,
    ) -> Result<Vec<ZoneRegion>, DeliveryError> {
        Ok(self.regions.list(zone_id).await?)
    }

    async fn bulk_import_regions(
        &self,
        records: Vec<RegionImportRecord>,
    ) -> Result<BulkImportReport, DeliveryError> {
        if records.len() > MAX_IMPORT_RECORDS {
            return Err(DeliveryError::invalid_input(
                "records",
                format!("at most {MAX_IMPORT_RECORDS} records may be imported at once"),
            ));
        }
        let zones = ZoneIndex::new(&self.zones.list().await?);

        let mut report = BulkImportReport::default();
        for (index, record) in records.iter().enumerate() {
            match self.import_record(index, record, &zones).await {
                Ok(()) => report.succeeded += 1,
                Err(failure) => {
                    warn!(index, key = ?failure.key, reason = %failure.reason, "import record rejected");
                    report.failed.push(failure);
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "bulk region import finished"
        );
        if report.succeeded > 0 {
            invalidate_resolutions(self.cache.as_ref(), "regions imported").await;
        }
        Ok(report)
    }

    async fn import_from_directory(
        &self,
        request: DirectoryImportRequest,
    ) -> Result<BulkImportReport, DeliveryError> {
        let state = RegionName::parse(&request.state_name)
            .ok_or_else(|| DeliveryError::invalid_input("stateName", "state name is required"))?;
        let district = request
            .district_name
            .as_deref()
            .and_then(RegionName::parse);
        let zone = self.require_zone(request.zone_id).await?;

        let listing = self
            .directory
            .offices_for_region(state.clone(), district.clone())
            .await?;

        let mut report = BulkImportReport {
            truncated: listing.truncated,
            ..BulkImportReport::default()
        };
        for (index, office) in listing.offices.into_iter().enumerate() {
            let target = RegionTarget::Pincode {
                pincode: office.pincode,
                state: Some(office.state),
                district: office.district,
            };
            let key = target.key();
            match self.regions.upsert_by_key(&self.new_region(zone.id, target)).await {
                Ok(_) => report.succeeded += 1,
                Err(err) => report.failed.push(ImportFailure {
                    index,
                    key: Some(key.to_string()),
                    reason: DeliveryError::from(err).to_string(),
                }),
            }
        }

        info!(
            zone_number = %zone.zone_number,
            state = %state,
            district = district.as_ref().map(RegionName::as_str),
            succeeded = report.succeeded,
            failed = report.failed.len(),
            truncated = report.truncated,
            "directory region import finished"
        );
        if report.truncated {
            warn!(
                zone_number = %zone.zone_number,
                state = %state,
                "directory import stopped at the page limit; the region has more pincodes"
            );
        }
        if report.succeeded > 0 {
            invalidate_resolutions(self.cache.as_ref(), "directory import").await;
        }
        Ok(report)
    }
}
