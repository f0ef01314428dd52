//! Zone registry domain service.
//!
//! Implements the [`ZoneRegistry`] driving port over the zone and region
//! repositories. Successful writes clear the resolution cache so customers
//! never see a stale charge or a deactivated zone.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{RegionRepository, ResolutionCache, ZoneRegistry, ZoneRepository};
use crate::domain::{DeliveryError, DeliveryZone, ZoneDraft, ZoneId, ZoneNumber};

/// Clear cached resolutions after a write.
///
/// A cache failure is logged and swallowed: the write already happened and
/// entries expire on their own.
pub(crate) async fn invalidate_resolutions(cache: &dyn ResolutionCache, cause: &'static str) {
    if let Err(error) = cache.invalidate_all().await {
        warn!(%error, cause, "failed to invalidate resolution cache");
    }
}

/// Zone registry service implementing the driving port.
#[derive(Clone)]
pub struct ZoneRegistryService<Z, R> {
    zones: Arc<Z>,
    regions: Arc<R>,
    cache: Arc<dyn ResolutionCache>,
    clock: Arc<dyn Clock>,
}

impl<Z, R> ZoneRegistryService<Z, R> {
    pub fn new(
        zones: Arc<Z>,
        regions: Arc<R>,
        cache: Arc<dyn ResolutionCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            zones,
            regions,
            cache,
            clock,
        }
    }
}

impl<Z, R> ZoneRegistryService<Z, R>
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

    async fn ensure_number_free(
        &self,
        zone_number: ZoneNumber,
        owner: Option<ZoneId>,
    ) -> Result<(), DeliveryError> {
        match self.zones.find_by_number(zone_number).await? {
            Some(existing) if Some(existing.id) != owner => Err(DeliveryError::conflict(format!(
                "zone number {zone_number} is already used by zone {}",
                existing.id
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<Z, R> ZoneRegistry for ZoneRegistryService<Z, R>
where
    Z: ZoneRepository,
    R: RegionRepository,
{
    async fn list_zones(&self) -> Result<Vec<DeliveryZone>, DeliveryError> {
        Ok(self.zones.list().await?)
    }

    async fn get_zone(&self, id: ZoneId) -> Result<DeliveryZone, DeliveryError> {
        self.require_zone(id).await
    }

    async fn upsert_zone(&self, draft: ZoneDraft) -> Result<DeliveryZone, DeliveryError> {
        let validated = draft
            .validate()
            .map_err(|err| DeliveryError::invalid_input(err.field(), err.to_string()))?;
        let now = self.clock.utc();

        let zone = match validated.id {
            Some(id) => {
                let existing = self.require_zone(id).await?;
                self.ensure_number_free(validated.zone_number, Some(id))
                    .await?;
                let zone = validated.into_zone(id, existing.created_at, now);
                self.zones.update(&zone).await?;
                info!(zone_id = %zone.id, zone_number = %zone.zone_number, "delivery zone updated");
                zone
            }
            None => {
                self.ensure_number_free(validated.zone_number, None).await?;
                let zone = validated.into_zone(ZoneId::random(), now, now);
                self.zones.insert(&zone).await?;
                info!(zone_id = %zone.id, zone_number = %zone.zone_number, "delivery zone created");
                zone
            }
        };

        invalidate_resolutions(self.cache.as_ref(), "zone upserted").await;
        Ok(zone)
    }

    async fn delete_zone(&self, id: ZoneId) -> Result<(), DeliveryError> {
        let zone = self.require_zone(id).await?;
        let region_count = self.regions.count_for_zone(&id).await?;
        if region_count > 0 {
            return Err(DeliveryError::referential(format!(
                "zone {} still has {region_count} region(s) assigned",
                zone.zone_number
            )));
        }
        if !self.zones.delete(&id).await? {
            return Err(DeliveryError::not_found(format!("zone {id} not found")));
        }
        info!(zone_id = %id, zone_number = %zone.zone_number, "delivery zone deleted");
        invalidate_resolutions(self.cache.as_ref(), "zone deleted").await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockRegionRepository, MockResolutionCache, MockZoneRepository, ResolutionCacheError,
        ZoneRepositoryError,
    };
    use crate::test_support::{MutableClock, sample_zone};
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    fn draft(id: Option<ZoneId>, zone_number: i64) -> ZoneDraft {
        ZoneDraft {
            id,
            zone_number,
            zone_name: "Metro".to_owned(),
            delivery_days_min: 1,
            delivery_days_max: 2,
            delivery_charge: Decimal::new(4_900, 2),
            description: None,
            is_active: true,
        }
    }

    #[fixture]
    fn invalidating_cache() -> MockResolutionCache {
        let mut cache = MockResolutionCache::new();
        cache.expect_invalidate_all().times(1).return_once(|| Ok(()));
        cache
    }

    fn service(
        zones: MockZoneRepository,
        regions: MockRegionRepository,
        cache: MockResolutionCache,
    ) -> ZoneRegistryService<MockZoneRepository, MockRegionRepository> {
        ZoneRegistryService::new(
            Arc::new(zones),
            Arc::new(regions),
            Arc::new(cache),
            Arc::new(MutableClock::default()),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn inserts_new_zone_and_invalidates_cache(invalidating_cache: MockResolutionCache) {
        let mut zones = MockZoneRepository::new();
        zones
            .expect_find_by_number()
            .times(1)
            .return_once(|_| Ok(None));
        zones
            .expect_insert()
            .withf(|zone| zone.zone_number.get() == 3 && zone.created_at == zone.updated_at)
            .times(1)
            .return_once(|_| Ok(()));

        let zone = service(zones, MockRegionRepository::new(), invalidating_cache)
            .upsert_zone(draft(None, 3))
            .await
            .expect("zone created");

        assert_eq!(zone.delivery_charge.amount(), Decimal::new(4_900, 2));
    }

    #[tokio::test]
    async fn rejects_number_owned_by_another_zone() {
        let mut zones = MockZoneRepository::new();
        zones
            .expect_find_by_number()
            .times(1)
            .return_once(|_| Ok(Some(sample_zone(3, true))));
        zones.expect_insert().never();
        let mut cache = MockResolutionCache::new();
        cache.expect_invalidate_all().never();

        let error = service(zones, MockRegionRepository::new(), cache)
            .upsert_zone(draft(None, 3))
            .await
            .expect_err("duplicate number");

        assert!(matches!(error, DeliveryError::Conflict { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn update_keeps_creation_time(invalidating_cache: MockResolutionCache) {
        let existing = sample_zone(5, true);
        let id = existing.id;
        let created_at = existing.created_at;
        let mut zones = MockZoneRepository::new();
        let lookup = existing.clone();
        zones
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(lookup)));
        zones
            .expect_find_by_number()
            .times(1)
            .return_once(move |_| Ok(Some(existing)));
        zones
            .expect_update()
            .withf(move |zone| zone.id == id && zone.created_at == created_at)
            .times(1)
            .return_once(|_| Ok(()));

        let zone = service(zones, MockRegionRepository::new(), invalidating_cache)
            .upsert_zone(draft(Some(id), 5))
            .await
            .expect("zone updated");

        assert_eq!(zone.zone_name, "Metro");
    }

    #[tokio::test]
    async fn update_of_missing_zone_is_not_found() {
        let mut zones = MockZoneRepository::new();
        zones.expect_find_by_id().times(1).return_once(|_| Ok(None));

        let error = service(zones, MockRegionRepository::new(), MockResolutionCache::new())
            .upsert_zone(draft(Some(ZoneId::random()), 5))
            .await
            .expect_err("missing zone");

        assert!(matches!(error, DeliveryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn validation_failure_names_the_field() {
        let error = service(
            MockZoneRepository::new(),
            MockRegionRepository::new(),
            MockResolutionCache::new(),
        )
        .upsert_zone(draft(None, 0))
        .await
        .expect_err("invalid number");

        assert!(matches!(
            error,
            DeliveryError::InvalidInput {
                field: "zoneNumber",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn delete_is_blocked_while_regions_reference_the_zone() {
        let zone = sample_zone(1, true);
        let mut zones = MockZoneRepository::new();
        zones
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(zone)));
        zones.expect_delete().never();
        let mut regions = MockRegionRepository::new();
        regions
            .expect_count_for_zone()
            .times(1)
            .return_once(|_| Ok(4));

        let error = service(zones, regions, MockResolutionCache::new())
            .delete_zone(ZoneId::random())
            .await
            .expect_err("blocked");

        assert_eq!(
            error,
            DeliveryError::referential("zone 1 still has 4 region(s) assigned")
        );
    }

    #[tokio::test]
    async fn cache_failures_do_not_fail_the_write() {
        let zone = sample_zone(2, true);
        let mut zones = MockZoneRepository::new();
        zones
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(zone)));
        zones.expect_delete().times(1).return_once(|_| Ok(true));
        let mut regions = MockRegionRepository::new();
        regions
            .expect_count_for_zone()
            .times(1)
            .return_once(|_| Ok(0));
        let mut cache = MockResolutionCache::new();
        cache
            .expect_invalidate_all()
            .times(1)
            .return_once(|| Err(ResolutionCacheError::backend("unreachable")));

        service(zones, regions, cache)
            .delete_zone(ZoneId::random())
            .await
            .expect("delete succeeds");
    }

    #[tokio::test]
    async fn connection_errors_surface_as_upstream_unavailable() {
        let mut zones = MockZoneRepository::new();
        zones
            .expect_list()
            .times(1)
            .return_once(|| Err(ZoneRepositoryError::connection("pool exhausted")));

        let error = service(zones, MockRegionRepository::new(), MockResolutionCache::new())
            .list_zones()
            .await
            .expect_err("outage");

        assert!(matches!(error, DeliveryError::UpstreamUnavailable { .. }));
    }
}
