//! PostgreSQL-backed `RegionRepository` implementation using Diesel ORM.
//!
//! Assignments live in one table keyed by the normalised `region_key`, so
//! the idempotent import path is a single `INSERT .. ON CONFLICT` that
//! keeps the original id and creation time.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{RegionRepository, RegionRepositoryError};
use crate::domain::{RegionId, RegionKey, RegionTarget, RegionType, ZoneId, ZoneRegion};

use super::diesel_error_mapping::{DieselFailure, REGION_KEY_CONSTRAINT, classify_diesel_error};
use super::models::{NewZoneRegionRow, ZoneRegionRow};
use super::pool::{DbPool, PoolError};
use super::schema::zone_regions;

/// Diesel-backed region assignment store.
#[derive(Clone)]
pub struct DieselRegionRepository {
    pool: DbPool,
}

impl DieselRegionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RegionRepositoryError {
    RegionRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> RegionRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection => RegionRepositoryError::connection("database connection error"),
        DieselFailure::UniqueViolation { .. } => {
            RegionRepositoryError::query("unique constraint violation")
        }
        DieselFailure::ForeignKeyViolation { .. } => {
            RegionRepositoryError::query("foreign key violation")
        }
        DieselFailure::Query { message } => RegionRepositoryError::query(message),
    }
}

/// Map a failed write of `region`, naming its key or zone where relevant.
fn map_write_error(error: diesel::result::Error, region: &ZoneRegion) -> RegionRepositoryError {
    match classify_diesel_error(error) {
        failure if failure.violates_unique(REGION_KEY_CONSTRAINT) => {
            RegionRepositoryError::duplicate_key(region.key().as_str())
        }
        DieselFailure::ForeignKeyViolation { .. } => {
            RegionRepositoryError::unknown_zone(region.zone_id)
        }
        DieselFailure::Connection => RegionRepositoryError::connection("database connection error"),
        DieselFailure::UniqueViolation { .. } => {
            RegionRepositoryError::query("unique constraint violation")
        }
        DieselFailure::Query { message } => RegionRepositoryError::query(message),
    }
}

fn row_to_region(row: ZoneRegionRow) -> Result<ZoneRegion, RegionRepositoryError> {
    let invalid = |detail: String| {
        warn!(region_id = %row.id, %detail, "stored zone region failed validation");
        RegionRepositoryError::query(format!("stored region {} is invalid: {detail}", row.id))
    };
    let region_type = row
        .region_type
        .parse::<RegionType>()
        .map_err(|err| invalid(err.to_string()))?;
    let target = RegionTarget::from_parts(
        region_type,
        row.state_name.as_deref(),
        row.district_name.as_deref(),
        row.pincode.as_deref(),
    )
    .map_err(|err| invalid(err.to_string()))?;

    Ok(ZoneRegion {
        id: RegionId::from_uuid(row.id),
        zone_id: ZoneId::from_uuid(row.delivery_zone_id),
        target,
        created_at: row.created_at,
    })
}

fn rows_to_regions(rows: Vec<ZoneRegionRow>) -> Result<Vec<ZoneRegion>, RegionRepositoryError> {
    rows.into_iter().map(row_to_region).collect()
}

/// Owned column values for a region write.
struct RegionColumns {
    key: RegionKey,
    state_name: Option<String>,
    district_name: Option<String>,
    pincode: Option<String>,
}

impl RegionColumns {
    fn of(region: &ZoneRegion) -> Self {
        let target = &region.target;
        Self {
            key: target.key(),
            state_name: target.state_name().map(|name| name.as_str().to_owned()),
            district_name: target.district_name().map(|name| name.as_str().to_owned()),
            pincode: target.pincode().map(|pincode| pincode.as_str().to_owned()),
        }
    }

    fn row<'a>(&'a self, region: &'a ZoneRegion) -> NewZoneRegionRow<'a> {
        NewZoneRegionRow {
            id: *region.id.as_uuid(),
            delivery_zone_id: *region.zone_id.as_uuid(),
            region_type: region.target.region_type().as_str(),
            region_key: self.key.as_str(),
            state_name: self.state_name.as_deref(),
            district_name: self.district_name.as_deref(),
            pincode: self.pincode.as_deref(),
            created_at: region.created_at,
            updated_at: region.created_at,
        }
    }
}

#[async_trait]
impl RegionRepository for DieselRegionRepository {
    async fn list(
        &self,
        zone_id: Option<ZoneId>,
    ) -> Result<Vec<ZoneRegion>, RegionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = zone_regions::table
            .select(ZoneRegionRow::as_select())
            .order((zone_regions::created_at.asc(), zone_regions::id.asc()))
            .into_boxed();
        if let Some(zone_id) = zone_id {
            query = query.filter(zone_regions::delivery_zone_id.eq(*zone_id.as_uuid()));
        }

        let rows: Vec<ZoneRegionRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows_to_regions(rows)
    }

    async fn find_by_keys(
        &self,
        keys: &[RegionKey],
    ) -> Result<Vec<ZoneRegion>, RegionRepositoryError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<&str> = keys.iter().map(RegionKey::as_str).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ZoneRegionRow> = zone_regions::table
            .filter(zone_regions::region_key.eq_any(keys))
            .select(ZoneRegionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_regions(rows)
    }

    async fn count_for_zone(&self, zone_id: &ZoneId) -> Result<u64, RegionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = zone_regions::table
            .filter(zone_regions::delivery_zone_id.eq(zone_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert(&self, region: &ZoneRegion) -> Result<(), RegionRepositoryError> {
        let columns = RegionColumns::of(region);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(zone_regions::table)
            .values(&columns.row(region))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, region))
    }

    async fn upsert_by_key(
        &self,
        region: &ZoneRegion,
    ) -> Result<ZoneRegion, RegionRepositoryError> {
        let columns = RegionColumns::of(region);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: ZoneRegionRow = diesel::insert_into(zone_regions::table)
            .values(&columns.row(region))
            .on_conflict(zone_regions::region_key)
            .do_update()
            .set((
                zone_regions::delivery_zone_id.eq(excluded(zone_regions::delivery_zone_id)),
                zone_regions::region_type.eq(excluded(zone_regions::region_type)),
                zone_regions::state_name.eq(excluded(zone_regions::state_name)),
                zone_regions::district_name.eq(excluded(zone_regions::district_name)),
                zone_regions::pincode.eq(excluded(zone_regions::pincode)),
                zone_regions::updated_at.eq(diesel::dsl::now),
            ))
            .returning(ZoneRegionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_write_error(err, region))?;

        row_to_region(row)
    }

    async fn delete(&self, id: &RegionId) -> Result<bool, RegionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(zone_regions::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
