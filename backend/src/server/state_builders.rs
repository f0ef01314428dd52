//! Builders wiring repositories, adapters, and services into HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use delivery_zones::domain::ports::ResolutionCache;
use delivery_zones::domain::{
    DeliveryResolver, DirectoryLookup, RegionAssignmentService, ZoneRegistryService,
};
use delivery_zones::inbound::http::state::HttpState;
use delivery_zones::outbound::cache::{CacheTtl, InMemoryResolutionCache, NoOpResolutionCache};
use delivery_zones::outbound::persistence::{DieselRegionRepository, DieselZoneRepository};

use super::ServerConfig;

fn build_cache(clock: Arc<dyn Clock>, policy: CacheTtl) -> Arc<dyn ResolutionCache> {
    if policy.ttl.is_zero() {
        info!("resolution cache disabled");
        Arc::new(NoOpResolutionCache)
    } else {
        info!(ttl_secs = policy.ttl.as_secs(), "resolution cache enabled");
        Arc::new(InMemoryResolutionCache::new(clock, policy))
    }
}

/// Build the shared HTTP state from the server configuration.
///
/// All three services share one cache so that admin writes invalidate the
/// answers the resolver hands to customers.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let zones = Arc::new(DieselZoneRepository::new(config.db_pool.clone()));
    let regions = Arc::new(DieselRegionRepository::new(config.db_pool.clone()));
    let cache = build_cache(clock.clone(), config.cache_ttl);
    let directory = DirectoryLookup::new(
        config.directory.clone(),
        clock.clone(),
        config.lookup.clone(),
    );

    let registry = ZoneRegistryService::new(
        zones.clone(),
        regions.clone(),
        cache.clone(),
        clock.clone(),
    );
    let assignment = RegionAssignmentService::new(
        zones.clone(),
        regions.clone(),
        directory.clone(),
        cache.clone(),
        clock,
    );
    let resolver = DeliveryResolver::new(zones, regions, directory, cache);

    web::Data::new(HttpState::new(
        Arc::new(registry),
        Arc::new(assignment),
        Arc::new(resolver),
        config.admin.clone(),
    ))
}
