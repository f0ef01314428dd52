//! Resolution cache adapters.
//!
//! [`InMemoryResolutionCache`] keeps outcomes per pincode in a `DashMap`
//! with a jittered TTL so entries written together do not all expire in the
//! same instant. [`NoOpResolutionCache`] never stores anything and suits
//! tests and deployments that want every lookup to hit the database.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mockable::Clock;
use rand::Rng;
use tracing::debug;

use crate::domain::Pincode;
use crate::domain::ports::{CachedResolution, ResolutionCache, ResolutionCacheError};

/// Expiry policy for cached outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    /// Base lifetime of an entry.
    pub ttl: Duration,
    /// Upper bound of the random extension added to `ttl`.
    pub jitter: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            jitter: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    outcome: CachedResolution,
    expires_at: DateTime<Utc>,
}

/// Process-local TTL cache keyed by pincode.
pub struct InMemoryResolutionCache {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
    policy: CacheTtl,
}

impl InMemoryResolutionCache {
    pub fn new(clock: Arc<dyn Clock>, policy: CacheTtl) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            policy,
        }
    }

    /// Number of stored entries, expired ones included until next read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lifetime(&self) -> Duration {
        let jitter_ms = u64::try_from(self.policy.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.policy.ttl;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.policy.ttl.saturating_add(Duration::from_millis(extra))
    }

    /// Remove the entry for `key` only if the stored entry has expired at
    /// `now`, so a concurrent `put` is never evicted.
    fn evict_expired(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= now)
            .is_some()
    }
}

#[async_trait]
impl ResolutionCache for InMemoryResolutionCache {
    async fn get(
        &self,
        pincode: &Pincode,
    ) -> Result<Option<CachedResolution>, ResolutionCacheError> {
        let now = self.clock.utc();
        let Some(entry) = self.entries.get(pincode.as_str()) else {
            return Ok(None);
        };
        if entry.expires_at <= now {
            drop(entry);
            if self.evict_expired(pincode.as_str(), now) {
                debug!(%pincode, "resolution cache entry expired");
            }
            return Ok(None);
        }
        Ok(Some(entry.outcome.clone()))
    }

    async fn put(
        &self,
        pincode: &Pincode,
        outcome: CachedResolution,
    ) -> Result<(), ResolutionCacheError> {
        let lifetime = chrono::Duration::from_std(self.lifetime())
            .map_err(|err| ResolutionCacheError::backend(err.to_string()))?;
        let expires_at = self.clock.utc() + lifetime;
        self.entries.insert(
            pincode.as_str().to_owned(),
            Entry {
                outcome,
                expires_at,
            },
        );
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), ResolutionCacheError> {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(dropped, "resolution cache cleared");
        Ok(())
    }
}

/// Cache that never stores; every read misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolutionCache;

#[async_trait]
impl ResolutionCache for NoOpResolutionCache {
    async fn get(
        &self,
        _pincode: &Pincode,
    ) -> Result<Option<CachedResolution>, ResolutionCacheError> {
        Ok(None)
    }

    async fn put(
        &self,
        _pincode: &Pincode,
        _outcome: CachedResolution,
    ) -> Result<(), ResolutionCacheError> {
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), ResolutionCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZoneNumber;
    use crate::test_support::MutableClock;
    use rstest::{fixture, rstest};

    fn pincode(raw: &str) -> Pincode {
        Pincode::parse(raw).expect("valid pincode")
    }

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::default())
    }

    fn cache(clock: &Arc<MutableClock>, jitter: Duration) -> InMemoryResolutionCache {
        InMemoryResolutionCache::new(
            clock.clone(),
            CacheTtl {
                ttl: Duration::from_secs(60),
                jitter,
            },
        )
    }

    #[rstest]
    #[tokio::test]
    async fn returns_fresh_entries(clock: Arc<MutableClock>) {
        let cache = cache(&clock, Duration::ZERO);
        cache
            .put(&pincode("632001"), CachedResolution::NoCoverage)
            .await
            .expect("put");

        clock.advance(Duration::from_secs(59));

        assert_eq!(
            cache.get(&pincode("632001")).await.expect("get"),
            Some(CachedResolution::NoCoverage)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn expired_entries_miss_and_are_evicted(clock: Arc<MutableClock>) {
        let cache = cache(&clock, Duration::ZERO);
        let zone_number = ZoneNumber::new(2).expect("zone number");
        cache
            .put(
                &pincode("632001"),
                CachedResolution::ZoneInactive { zone_number },
            )
            .await
            .expect("put");

        clock.advance(Duration::from_secs(60));

        assert_eq!(cache.get(&pincode("632001")).await.expect("get"), None);
        assert!(cache.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn stale_expiry_check_keeps_a_refreshed_entry(clock: Arc<MutableClock>) {
        let cache = cache(&clock, Duration::ZERO);
        let key = pincode("632001");
        cache
            .put(&key, CachedResolution::NoCoverage)
            .await
            .expect("put");
        clock.advance(Duration::from_secs(60));
        let observed_expiry_at = clock.utc();

        // A writer refreshes the entry after a reader saw it expire.
        cache
            .put(&key, CachedResolution::NoCoverage)
            .await
            .expect("refresh");

        assert!(!cache.evict_expired(key.as_str(), observed_expiry_at));
        assert_eq!(
            cache.get(&key).await.expect("get"),
            Some(CachedResolution::NoCoverage)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn jitter_never_shortens_the_ttl(clock: Arc<MutableClock>) {
        let cache = cache(&clock, Duration::from_secs(10));
        cache
            .put(&pincode("600001"), CachedResolution::NoCoverage)
            .await
            .expect("put");

        clock.advance(Duration::from_secs(60) - Duration::from_millis(1));
        assert!(cache.get(&pincode("600001")).await.expect("get").is_some());

        clock.advance(Duration::from_secs(11));
        assert!(cache.get(&pincode("600001")).await.expect("get").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn invalidate_all_drops_everything(clock: Arc<MutableClock>) {
        let cache = cache(&clock, Duration::ZERO);
        for raw in ["600001", "632001", "695001"] {
            cache
                .put(&pincode(raw), CachedResolution::NoCoverage)
                .await
                .expect("put");
        }

        cache.invalidate_all().await.expect("invalidate");

        assert_eq!(cache.len(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn no_op_cache_always_misses() {
        let cache = NoOpResolutionCache;
        cache
            .put(&pincode("632001"), CachedResolution::NoCoverage)
            .await
            .expect("put");

        assert_eq!(cache.get(&pincode("632001")).await.expect("get"), None);
    }
}
