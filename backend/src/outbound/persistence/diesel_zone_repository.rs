//! PostgreSQL-backed `ZoneRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{ZoneRepository, ZoneRepositoryError};
use crate::domain::{
    DeliveryCharge, DeliveryZone, TransitDays, ZoneId, ZoneNumber, ZoneValidationError,
};

use super::diesel_error_mapping::{DieselFailure, ZONE_NUMBER_CONSTRAINT, classify_diesel_error};
use super::models::{DeliveryZoneRow, DeliveryZoneUpdate, NewDeliveryZoneRow};
use super::pool::{DbPool, PoolError};
use super::schema::delivery_zones;

/// Diesel-backed zone store.
#[derive(Clone)]
pub struct DieselZoneRepository {
    pool: DbPool,
}

impl DieselZoneRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ZoneRepositoryError {
    ZoneRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> ZoneRepositoryError {
    map_failure(classify_diesel_error(error), None, None)
}

/// Attach write context to a classified failure.
fn map_failure(
    failure: DieselFailure,
    zone_number: Option<ZoneNumber>,
    zone_id: Option<ZoneId>,
) -> ZoneRepositoryError {
    match (failure, zone_number, zone_id) {
        (DieselFailure::Connection, _, _) => {
            ZoneRepositoryError::connection("database connection error")
        }
        (failure, Some(number), _) if failure.violates_unique(ZONE_NUMBER_CONSTRAINT) => {
            ZoneRepositoryError::duplicate_zone_number(number.get())
        }
        (DieselFailure::ForeignKeyViolation { .. }, _, Some(id)) => {
            ZoneRepositoryError::still_referenced(id)
        }
        (DieselFailure::UniqueViolation { .. }, _, _) => {
            ZoneRepositoryError::query("unique constraint violation")
        }
        (DieselFailure::ForeignKeyViolation { .. }, _, _) => {
            ZoneRepositoryError::query("foreign key violation")
        }
        (DieselFailure::Query { message }, _, _) => ZoneRepositoryError::query(message),
    }
}

fn invalid_row(id: uuid::Uuid, error: &ZoneValidationError) -> ZoneRepositoryError {
    warn!(zone_id = %id, %error, "stored delivery zone failed validation");
    ZoneRepositoryError::query(format!("stored zone {id} is invalid: {error}"))
}

fn row_to_zone(row: DeliveryZoneRow) -> Result<DeliveryZone, ZoneRepositoryError> {
    let id = row.id;
    let zone_number =
        ZoneNumber::new(i64::from(row.zone_number)).map_err(|err| invalid_row(id, &err))?;
    let transit_days = TransitDays::new(
        i64::from(row.delivery_days_min),
        i64::from(row.delivery_days_max),
    )
    .map_err(|err| invalid_row(id, &err))?;
    let delivery_charge =
        DeliveryCharge::new(row.delivery_charge).map_err(|err| invalid_row(id, &err))?;

    Ok(DeliveryZone {
        id: ZoneId::from_uuid(row.id),
        zone_number,
        zone_name: row.zone_name,
        transit_days,
        delivery_charge,
        description: row.description,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Column values shared by inserts and updates.
struct ZoneColumns {
    zone_number: i32,
    delivery_days_min: i16,
    delivery_days_max: i16,
}

fn zone_columns(zone: &DeliveryZone) -> Result<ZoneColumns, ZoneRepositoryError> {
    let zone_number = i32::try_from(zone.zone_number.get())
        .map_err(|_| ZoneRepositoryError::query("zone number exceeds column range"))?;
    let delivery_days_min = i16::try_from(zone.transit_days.min())
        .map_err(|_| ZoneRepositoryError::query("delivery days exceed column range"))?;
    let delivery_days_max = i16::try_from(zone.transit_days.max())
        .map_err(|_| ZoneRepositoryError::query("delivery days exceed column range"))?;
    Ok(ZoneColumns {
        zone_number,
        delivery_days_min,
        delivery_days_max,
    })
}

fn rows_to_zones(rows: Vec<DeliveryZoneRow>) -> Result<Vec<DeliveryZone>, ZoneRepositoryError> {
    rows.into_iter().map(row_to_zone).collect()
}

#[async_trait]
impl ZoneRepository for DieselZoneRepository {
    async fn list(&self) -> Result<Vec<DeliveryZone>, ZoneRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DeliveryZoneRow> = delivery_zones::table
            .order(delivery_zones::zone_number.asc())
            .select(DeliveryZoneRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_zones(rows)
    }

    async fn find_by_id(&self, id: &ZoneId) -> Result<Option<DeliveryZone>, ZoneRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DeliveryZoneRow> = delivery_zones::table
            .find(id.as_uuid())
            .select(DeliveryZoneRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_zone).transpose()
    }

    async fn find_by_number(
        &self,
        zone_number: ZoneNumber,
    ) -> Result<Option<DeliveryZone>, ZoneRepositoryError> {
        let Ok(number) = i32::try_from(zone_number.get()) else {
            return Ok(None);
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DeliveryZoneRow> = delivery_zones::table
            .filter(delivery_zones::zone_number.eq(number))
            .select(DeliveryZoneRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_zone).transpose()
    }

    async fn insert(&self, zone: &DeliveryZone) -> Result<(), ZoneRepositoryError> {
        let columns = zone_columns(zone)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewDeliveryZoneRow {
            id: *zone.id.as_uuid(),
            zone_number: columns.zone_number,
            zone_name: &zone.zone_name,
            delivery_days_min: columns.delivery_days_min,
            delivery_days_max: columns.delivery_days_max,
            delivery_charge: zone.delivery_charge.amount(),
            description: zone.description.as_deref(),
            is_active: zone.is_active,
            created_at: zone.created_at,
            updated_at: zone.updated_at,
        };

        diesel::insert_into(delivery_zones::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                map_failure(classify_diesel_error(err), Some(zone.zone_number), None)
            })
    }

    async fn update(&self, zone: &DeliveryZone) -> Result<(), ZoneRepositoryError> {
        let columns = zone_columns(zone)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = DeliveryZoneUpdate {
            zone_number: columns.zone_number,
            zone_name: &zone.zone_name,
            delivery_days_min: columns.delivery_days_min,
            delivery_days_max: columns.delivery_days_max,
            delivery_charge: zone.delivery_charge.amount(),
            description: zone.description.as_deref(),
            is_active: zone.is_active,
            updated_at: zone.updated_at,
        };

        let updated = diesel::update(delivery_zones::table.find(zone.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(|err| {
                map_failure(classify_diesel_error(err), Some(zone.zone_number), None)
            })?;

        if updated == 0 {
            return Err(ZoneRepositoryError::not_found(zone.id));
        }
        Ok(())
    }

    async fn delete(&self, id: &ZoneId) -> Result<bool, ZoneRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(delivery_zones::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(|err| map_failure(classify_diesel_error(err), None, Some(*id)))?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn row() -> DeliveryZoneRow {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().expect("timestamp");
        DeliveryZoneRow {
            id: uuid::Uuid::from_u128(7),
            zone_number: 4,
            zone_name: "South".to_owned(),
            delivery_days_min: 2,
            delivery_days_max: 5,
            delivery_charge: Decimal::new(9_900, 2),
            description: Some("Southern states".to_owned()),
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[rstest]
    fn converts_valid_row() {
        let zone = row_to_zone(row()).expect("valid row");

        assert_eq!(zone.zone_number.get(), 4);
        assert_eq!(zone.transit_days.max(), 5);
        assert_eq!(zone.delivery_charge.amount(), Decimal::new(9_900, 2));
    }

    #[rstest]
    fn inverted_days_in_storage_become_query_errors() {
        let mut stored = row();
        stored.delivery_days_min = 9;

        let error = row_to_zone(stored).expect_err("invalid row");

        assert!(matches!(error, ZoneRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unique_violation_on_insert_reports_the_number() {
        let number = ZoneNumber::new(4).expect("number");
        let failure = DieselFailure::UniqueViolation {
            constraint: Some(ZONE_NUMBER_CONSTRAINT.to_owned()),
        };

        assert_eq!(
            map_failure(failure, Some(number), None),
            ZoneRepositoryError::duplicate_zone_number(4_u32)
        );
    }

    #[rstest]
    fn foreign_key_violation_on_delete_reports_reference() {
        let id = ZoneId::random();
        let failure = DieselFailure::ForeignKeyViolation { constraint: None };

        assert_eq!(
            map_failure(failure, None, Some(id)),
            ZoneRepositoryError::still_referenced(id)
        );
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        assert!(matches!(
            map_failure(DieselFailure::Connection, None, None),
            ZoneRepositoryError::Connection { .. }
        ));
    }
}
