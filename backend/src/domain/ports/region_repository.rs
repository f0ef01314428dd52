//! Port for region assignment persistence.
//!
//! State, district, and pincode assignments share one table keyed by
//! [`RegionKey`], so uniqueness of the natural key is enforced in a single
//! place.

use async_trait::async_trait;

use crate::domain::{RegionId, RegionKey, ZoneId, ZoneRegion};

use super::define_port_error;

define_port_error! {
    /// Errors raised by region repository adapters.
    pub enum RegionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "region repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "region repository query failed: {message}",
        /// The natural key is already assigned.
        DuplicateKey { key: String } =>
            "region key {key} is already assigned",
        /// The owning zone does not exist.
        UnknownZone { zone_id: ZoneId } =>
            "zone {zone_id} does not exist",
    }
}

/// Storage for [`ZoneRegion`] rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionRepository: Send + Sync {
    /// Regions ordered by creation time then id, optionally for one zone.
    async fn list(&self, zone_id: Option<ZoneId>)
    -> Result<Vec<ZoneRegion>, RegionRepositoryError>;

    /// Regions whose natural key is one of `keys`.
    async fn find_by_keys(
        &self,
        keys: &[RegionKey],
    ) -> Result<Vec<ZoneRegion>, RegionRepositoryError>;

    async fn count_for_zone(&self, zone_id: &ZoneId) -> Result<u64, RegionRepositoryError>;

    /// Insert a new region; an existing key is a
    /// [`RegionRepositoryError::DuplicateKey`].
    async fn insert(&self, region: &ZoneRegion) -> Result<(), RegionRepositoryError>;

    /// Insert, or move an existing region with the same key to the new
    /// zone and names.
    ///
    /// The stored row keeps its original id and `created_at`; the row as
    /// persisted is returned.
    async fn upsert_by_key(&self, region: &ZoneRegion)
    -> Result<ZoneRegion, RegionRepositoryError>;

    /// Delete a region, returning `false` when it did not exist.
    async fn delete(&self, id: &RegionId) -> Result<bool, RegionRepositoryError>;
}
