//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Delivery zones with their transit window and flat charge.
    delivery_zones (id) {
        id -> Uuid,
        /// Unique, positive business identifier.
        zone_number -> Int4,
        zone_name -> Varchar,
        delivery_days_min -> Int2,
        delivery_days_max -> Int2,
        /// `NUMERIC(10, 2)` amount in rupees.
        delivery_charge -> Numeric,
        description -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// State, district, and pincode assignments to delivery zones.
    zone_regions (id) {
        id -> Uuid,
        delivery_zone_id -> Uuid,
        region_type -> Varchar,
        /// Normalised natural key, unique across all region types.
        region_key -> Varchar,
        state_name -> Nullable<Varchar>,
        district_name -> Nullable<Varchar>,
        pincode -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(zone_regions -> delivery_zones (delivery_zone_id));

diesel::allow_tables_to_appear_in_same_query!(delivery_zones, zone_regions);
