//! Port for delivery zone persistence.

use async_trait::async_trait;

use crate::domain::{DeliveryZone, ZoneId, ZoneNumber};

use super::define_port_error;

define_port_error! {
    /// Errors raised by zone repository adapters.
    pub enum ZoneRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "zone repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "zone repository query failed: {message}",
        /// Another zone already uses this number.
        DuplicateZoneNumber { zone_number: u32 } =>
            "zone number {zone_number} is already in use",
        /// The zone to update does not exist.
        NotFound { zone_id: ZoneId } =>
            "zone {zone_id} not found",
        /// Regions still reference the zone being deleted.
        StillReferenced { zone_id: ZoneId } =>
            "zone {zone_id} is still referenced by regions",
    }
}

/// Storage for [`DeliveryZone`] rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneRepository: Send + Sync {
    /// All zones ordered by zone number.
    async fn list(&self) -> Result<Vec<DeliveryZone>, ZoneRepositoryError>;

    async fn find_by_id(&self, id: &ZoneId) -> Result<Option<DeliveryZone>, ZoneRepositoryError>;

    async fn find_by_number(
        &self,
        zone_number: ZoneNumber,
    ) -> Result<Option<DeliveryZone>, ZoneRepositoryError>;

    /// Insert a new zone.
    ///
    /// Fails with [`ZoneRepositoryError::DuplicateZoneNumber`] when the
    /// number is taken.
    async fn insert(&self, zone: &DeliveryZone) -> Result<(), ZoneRepositoryError>;

    /// Overwrite every mutable column of an existing zone.
    async fn update(&self, zone: &DeliveryZone) -> Result<(), ZoneRepositoryError>;

    /// Delete a zone, returning `false` when it did not exist.
    ///
    /// Fails with [`ZoneRepositoryError::StillReferenced`] while regions
    /// point at the zone.
    async fn delete(&self, id: &ZoneId) -> Result<bool, ZoneRepositoryError>;
}
