//! Pincode resolver.
//!
//! Resolution order:
//! 1. validate the pincode and consult the cache;
//! 2. look for a pincode-level region;
//! 3. otherwise ask the directory which state/district the pincode is in and
//!    look for district and state regions;
//! 4. pick the winner with [`compare_precedence`] and check its zone is
//!    active.
//!
//! Both positive and negative outcomes are cached. Directory outages are
//! not.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CachedResolution, DeliveryResolutionQuery, RegionRepository, ResolutionCache, ZoneRepository,
};
use crate::domain::{
    DeliveryError, DeliveryQuote, DeliveryResolution, DirectoryLookup, Locality,
    NotServiceableReason, Pincode, RegionKey, RegionTarget, Serviceability, ZoneRegion,
    compare_precedence,
};

/// Pincode resolver implementing the customer-facing driving port.
#[derive(Clone)]
pub struct DeliveryResolver<Z, R> {
    zones: Arc<Z>,
    regions: Arc<R>,
    directory: DirectoryLookup,
    cache: Arc<dyn ResolutionCache>,
}

impl<Z, R> DeliveryResolver<Z, R> {
    pub fn new(
        zones: Arc<Z>,
        regions: Arc<R>,
        directory: DirectoryLookup,
        cache: Arc<dyn ResolutionCache>,
    ) -> Self {
        Self {
            zones,
            regions,
            directory,
            cache,
        }
    }
}

fn parse_pincode(raw: &str) -> Result<Pincode, DeliveryError> {
    Pincode::parse(raw).map_err(|err| DeliveryError::invalid_input("pincode", err.to_string()))
}

/// Largest accepted order subtotal, 999,999,999,999.99.
const SUBTOTAL_MAX: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

fn validate_subtotal(subtotal: Decimal) -> Result<Decimal, DeliveryError> {
    if subtotal.is_sign_negative() && !subtotal.is_zero() {
        return Err(DeliveryError::invalid_input(
            "subtotal",
            "subtotal must not be negative",
        ));
    }
    if subtotal > SUBTOTAL_MAX {
        return Err(DeliveryError::invalid_input(
            "subtotal",
            format!("subtotal must not exceed {SUBTOTAL_MAX}"),
        ));
    }
    if subtotal.normalize().scale() > 2 {
        return Err(DeliveryError::invalid_input(
            "subtotal",
            "subtotal must have at most two decimal places",
        ));
    }
    Ok(subtotal.abs())
}

/// Directory locality that produced a district or state match.
fn locality_for<'a>(region: &ZoneRegion, localities: &'a [Locality]) -> Option<&'a Locality> {
    match &region.target {
        RegionTarget::State { state } => localities.iter().find(|found| &found.state == state),
        RegionTarget::District { state, district } => localities
            .iter()
            .find(|found| &found.state == state && found.district.as_ref() == Some(district)),
        RegionTarget::Pincode { .. } => None,
    }
}

fn localities_to_keys(localities: &[Locality]) -> Vec<RegionKey> {
    let mut keys = Vec::new();
    for locality in localities {
        if let Some(district) = &locality.district {
            keys.push(RegionKey::district(&locality.state, district));
        }
        keys.push(RegionKey::state(&locality.state));
    }
    keys.sort();
    keys.dedup();
    keys
}

fn into_result(
    pincode: &Pincode,
    outcome: CachedResolution,
) -> Result<DeliveryResolution, DeliveryError> {
    match outcome {
        CachedResolution::Resolved(resolution) => Ok(resolution),
        CachedResolution::NoCoverage => Err(DeliveryError::NoCoverage {
            pincode: pincode.clone(),
        }),
        CachedResolution::ZoneInactive { zone_number } => Err(DeliveryError::ZoneInactive {
            pincode: pincode.clone(),
            zone_number,
        }),
    }
}

impl<Z, R> DeliveryResolver<Z, R>
where
    Z: ZoneRepository,
    R: RegionRepository,
{
    async fn resolve_uncached(&self, pincode: &Pincode) -> Result<CachedResolution, DeliveryError> {
        let mut candidates = self
            .regions
            .find_by_keys(&[RegionKey::pincode(pincode)])
            .await?;
        let mut localities = Vec::new();

        if candidates.is_empty() {
            localities = self.directory.localities_for_pincode(pincode).await?;
            if localities.is_empty() {
                debug!(%pincode, "pincode not listed in directory");
                return Ok(CachedResolution::NoCoverage);
            }
            candidates = self
                .regions
                .find_by_keys(&localities_to_keys(&localities))
                .await?;
        }

        candidates.sort_by(compare_precedence);
        let Some(winner) = candidates.first() else {
            return Ok(CachedResolution::NoCoverage);
        };

        let Some(zone) = self.zones.find_by_id(&winner.zone_id).await? else {
            warn!(
                %pincode,
                region_id = %winner.id,
                zone_id = %winner.zone_id,
                "winning region points at a missing zone"
            );
            return Ok(CachedResolution::NoCoverage);
        };

        if !zone.is_active {
            return Ok(CachedResolution::ZoneInactive {
                zone_number: zone.zone_number,
            });
        }

        Ok(CachedResolution::Resolved(DeliveryResolution::from_match(
            &zone,
            winner,
            pincode,
            locality_for(winner, &localities),
        )))
    }

    async fn cached(&self, pincode: &Pincode) -> Option<CachedResolution> {
        match self.cache.get(pincode).await {
            Ok(hit) => hit,
            Err(error) => {
                warn!(%error, %pincode, "resolution cache read failed");
                None
            }
        }
    }

    async fn remember(&self, pincode: &Pincode, outcome: CachedResolution) {
        if let Err(error) = self.cache.put(pincode, outcome).await {
            warn!(%error, %pincode, "resolution cache write failed");
        }
    }
}

#[async_trait]
impl<Z, R> DeliveryResolutionQuery for DeliveryResolver<Z, R>
where
    Z: ZoneRepository,
    R: RegionRepository,
{
    async fn resolve(&self, pincode: &str) -> Result<DeliveryResolution, DeliveryError> {
        let pincode = parse_pincode(pincode)?;

        if let Some(outcome) = self.cached(&pincode).await {
            debug!(%pincode, "resolution served from cache");
            return into_result(&pincode, outcome);
        }

        let outcome = self.resolve_uncached(&pincode).await?;
        match &outcome {
            CachedResolution::Resolved(resolution) => debug!(
                %pincode,
                zone_number = %resolution.zone_number,
                matched_by = %resolution.matched_by,
                "pincode resolved"
            ),
            CachedResolution::NoCoverage => info!(%pincode, "no delivery zone covers pincode"),
            CachedResolution::ZoneInactive { zone_number } => {
                warn!(%pincode, %zone_number, "pincode maps to an inactive zone");
            }
        }
        self.remember(&pincode, outcome.clone()).await;
        into_result(&pincode, outcome)
    }

    async fn check_serviceability(&self, pincode: &str) -> Result<Serviceability, DeliveryError> {
        match self.resolve(pincode).await {
            Ok(resolution) => Ok(Serviceability::Available(resolution)),
            Err(DeliveryError::NoCoverage { .. }) => Ok(Serviceability::NotAvailable(
                NotServiceableReason::NoCoverage,
            )),
            Err(DeliveryError::ZoneInactive { .. }) => Ok(Serviceability::NotAvailable(
                NotServiceableReason::ZoneInactive,
            )),
            Err(other) => Err(other),
        }
    }

    async fn quote_delivery(
        &self,
        pincode: &str,
        subtotal: Decimal,
    ) -> Result<DeliveryQuote, DeliveryError> {
        let subtotal = validate_subtotal(subtotal)?;
        let resolution = self.resolve(pincode).await?;
        DeliveryQuote::new(resolution, subtotal).ok_or_else(|| {
            DeliveryError::invalid_input("subtotal", "order total is out of range")
        })
    }
}
