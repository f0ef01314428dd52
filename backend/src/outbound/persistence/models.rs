//! Internal Diesel row structs.
//!
//! Rows mirror `schema.rs` and never leave the persistence module; the
//! repositories convert them to and from domain types.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{delivery_zones, zone_regions};

/// Row read from `delivery_zones`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = delivery_zones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeliveryZoneRow {
    pub id: Uuid,
    pub zone_number: i32,
    pub zone_name: String,
    pub delivery_days_min: i16,
    pub delivery_days_max: i16,
    pub delivery_charge: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `delivery_zones`.
#[derive(Debug, Insertable)]
#[diesel(table_name = delivery_zones)]
pub(crate) struct NewDeliveryZoneRow<'a> {
    pub id: Uuid,
    pub zone_number: i32,
    pub zone_name: &'a str,
    pub delivery_days_min: i16,
    pub delivery_days_max: i16,
    pub delivery_charge: Decimal,
    pub description: Option<&'a str>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied when a zone is edited.
///
/// `description` is written even when `None` so a cleared description is
/// persisted as `NULL`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = delivery_zones)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DeliveryZoneUpdate<'a> {
    pub zone_number: i32,
    pub zone_name: &'a str,
    pub delivery_days_min: i16,
    pub delivery_days_max: i16,
    pub delivery_charge: Decimal,
    pub description: Option<&'a str>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Row read from `zone_regions`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = zone_regions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ZoneRegionRow {
    pub id: Uuid,
    pub delivery_zone_id: Uuid,
    pub region_type: String,
    pub region_key: String,
    pub state_name: Option<String>,
    pub district_name: Option<String>,
    pub pincode: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `zone_regions`.
#[derive(Debug, Insertable)]
#[diesel(table_name = zone_regions)]
pub(crate) struct NewZoneRegionRow<'a> {
    pub id: Uuid,
    pub delivery_zone_id: Uuid,
    pub region_type: &'a str,
    pub region_key: &'a str,
    pub state_name: Option<&'a str>,
    pub district_name: Option<&'a str>,
    pub pincode: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
