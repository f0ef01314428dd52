//! Driving port for administering delivery zones.

use async_trait::async_trait;

use crate::domain::{DeliveryError, DeliveryZone, ZoneDraft, ZoneId};

/// Administrative operations over the zone registry.
///
/// Every successful mutation invalidates cached resolutions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneRegistry: Send + Sync {
    /// All zones ordered by zone number.
    async fn list_zones(&self) -> Result<Vec<DeliveryZone>, DeliveryError>;

    async fn get_zone(&self, id: ZoneId) -> Result<DeliveryZone, DeliveryError>;

    /// Insert when `draft.id` is absent, otherwise update that zone.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when a field fails validation.
    /// - `NotFound` when updating a zone that does not exist.
    /// - `Conflict` when another zone already uses the number.
    async fn upsert_zone(&self, draft: ZoneDraft) -> Result<DeliveryZone, DeliveryError>;

    /// # Errors
    ///
    /// `Referential` while regions still point at the zone.
    async fn delete_zone(&self, id: ZoneId) -> Result<(), DeliveryError>;
}
