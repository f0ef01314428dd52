//! Paged, retrying access to the pincode directory.
//!
//! Each page request is retried on transport, timeout, and rate-limit
//! failures with capped exponential backoff plus jitter. Rejected requests
//! and undecodable responses fail immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rand::Rng;
use tracing::{debug, warn};

use super::ports::{
    DirectoryFilter, DirectoryPage, DirectoryPostOffice, DirectoryQuery, PincodeDirectory,
    PincodeDirectoryError,
};
use super::{Locality, Pincode, RegionName};

/// Retry and paging limits for directory calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLookupConfig {
    /// Maximum attempts per page, including the first call.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single retry delay.
    pub max_backoff: Duration,
    /// Records requested per page.
    pub page_size: u32,
    /// Pages fetched before a listing is cut short.
    pub max_pages: u32,
}

impl Default for DirectoryLookupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            page_size: 100,
            max_pages: 200,
        }
    }
}

/// Async sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, drawn uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformJitter;

impl BackoffJitter for UniformJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::thread_rng().gen_range(0..=base_ms / 4);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// Sleeping and jitter strategies used between retries.
#[derive(Clone)]
pub struct DirectoryLookupRuntime {
    pub sleeper: Arc<dyn RetrySleeper>,
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for DirectoryLookupRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(UniformJitter),
        }
    }
}

/// Post offices listed for a state or district.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryListing {
    /// One office per distinct pincode, in directory order.
    pub offices: Vec<DirectoryPostOffice>,
    /// Set when paging stopped at the page limit before the listing ended.
    pub truncated: bool,
}

/// Domain service wrapping the [`PincodeDirectory`] port.

#[derive(Clone)]
pub struct DirectoryLookup {
    directory: Arc<dyn PincodeDirectory>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: DirectoryLookupConfig,
}

impl DirectoryLookup {
    pub fn new(
        directory: Arc<dyn PincodeDirectory>,
        clock: Arc<dyn Clock>,
        config: DirectoryLookupConfig,
    ) -> Self {
        Self::with_runtime(directory, clock, DirectoryLookupRuntime::default(), config)
    }

    /// Build a lookup with injected sleeping and jitter.
    pub fn with_runtime(
        directory: Arc<dyn PincodeDirectory>,
        clock: Arc<dyn Clock>,
        runtime: DirectoryLookupRuntime,
        config: DirectoryLookupConfig,
    ) -> Self {
        Self {
            directory,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    /// Distinct state/district pairs served by the post offices of a pincode,
    /// in directory order.
    pub async fn localities_for_pincode(
        &self,
        pincode: &Pincode,
    ) -> Result<Vec<Locality>, PincodeDirectoryError> {
        let (offices, truncated) = self
            .collect(DirectoryFilter::Pincode(pincode.clone()))
            .await?;
        if truncated {
            warn!(%pincode, "post offices of pincode exceed the directory page limit");
        }
        let mut localities: Vec<Locality> = Vec::new();
        for office in offices {
            let locality = Locality {
                state: office.state,
                district: office.district,
            };
            if !localities.contains(&locality) {
                localities.push(locality);
            }
        }
        Ok(localities)
    }

    /// Post offices of a state or district, one per distinct pincode.
    pub async fn offices_for_region(
        &self,
        state: RegionName,
        district: Option<RegionName>,
    ) -> Result<DirectoryListing, PincodeDirectoryError> {
        let (offices, truncated) = self
            .collect(DirectoryFilter::Region { state, district })
            .await?;
        let mut seen = std::collections::HashSet::new();
        Ok(DirectoryListing {
            offices: offices
                .into_iter()
                .filter(|office| seen.insert(office.pincode.clone()))
                .collect(),
            truncated,
        })
    }

    /// Page through a listing. The flag reports a listing cut short at
    /// `max_pages`.
    async fn collect(
        &self,
        filter: DirectoryFilter,
    ) -> Result<(Vec<DirectoryPostOffice>, bool), PincodeDirectoryError> {
        let limit = self.config.page_size.max(1);
        let mut query = DirectoryQuery {
            filter,
            offset: 0,
            limit,
        };
        let mut offices = Vec::new();

        for _ in 0..self.config.max_pages.max(1) {
            let page = self.fetch_page_with_retry(&query).await?;
            let DirectoryPage {
                records,
                total,
                fetched,
            } = page;
            offices.extend(records);
            query.offset = query
                .offset
                .saturating_add(u64::try_from(fetched).unwrap_or(u64::MAX));

            let short_page = fetched < usize::try_from(limit).unwrap_or(usize::MAX);
            let reached_total = total.is_some_and(|total| query.offset >= total);
            if fetched == 0 || short_page || reached_total {
                return Ok((offices, false));
            }
        }

        warn!(
            filter = ?query.filter,
            max_pages = self.config.max_pages,
            "pincode directory listing truncated at page limit"
        );
        Ok((offices, true))
    }

    /// Fetch one page, retrying retryable failures.
    pub async fn fetch_page_with_retry(
        &self,
        query: &DirectoryQuery,
    ) -> Result<DirectoryPage, PincodeDirectoryError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.directory.fetch_page(query).await {
                Ok(page) => return Ok(page),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.jitter.jittered_delay(
                        self.retry_base_delay(attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    debug!(%error, attempt, delay_ms = delay.as_millis(), "retrying pincode directory call");
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(%error, attempt, offset = query.offset, "pincode directory call failed");
                    return Err(error);
                }
            }
        }
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockPincodeDirectory;
    use crate::test_support::{ImmediateSleeper, MutableClock, NoJitter};
    use mockall::Sequence;
    use rstest::rstest;

    fn office(pincode: &str, district: &str, state: &str) -> DirectoryPostOffice {
        DirectoryPostOffice {
            pincode: Pincode::parse(pincode).expect("pincode"),
            office_name: format!("{district} H.O"),
            district: RegionName::parse(district),
            state: RegionName::parse(state).expect("state"),
        }
    }

    fn lookup(
        directory: MockPincodeDirectory,
        sleeper: Arc<ImmediateSleeper>,
        config: DirectoryLookupConfig,
    ) -> DirectoryLookup {
        DirectoryLookup::with_runtime(
            Arc::new(directory),
            Arc::new(MutableClock::default()),
            DirectoryLookupRuntime {
                sleeper,
                jitter: Arc::new(NoJitter),
            },
            config,
        )
    }

    #[rstest]
    #[case(1, 200)]
    #[case(2, 400)]
    #[case(3, 800)]
    #[case(6, 5_000)]
    fn base_delay_doubles_until_capped(#[case] attempt: u32, #[case] expected_ms: u64) {
        let lookup = lookup(
            MockPincodeDirectory::new(),
            Arc::new(ImmediateSleeper::default()),
            DirectoryLookupConfig::default(),
        );
        assert_eq!(
            lookup.retry_base_delay(attempt),
            Duration::from_millis(expected_ms)
        );
    }

    #[tokio::test]
    async fn retries_timeouts_then_succeeds() {
        let mut directory = MockPincodeDirectory::new();
        let mut seq = Sequence::new();
        directory
            .expect_fetch_page()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(PincodeDirectoryError::timeout("5s elapsed")));
        directory
            .expect_fetch_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(DirectoryPage {
                    records: vec![office("632001", "VELLORE", "TAMIL NADU")],
                    total: Some(1),
                    fetched: 1,
                })
            });
        let sleeper = Arc::new(ImmediateSleeper::default());
        let lookup = lookup(directory, sleeper.clone(), DirectoryLookupConfig::default());

        let localities = lookup
            .localities_for_pincode(&Pincode::parse("632001").expect("pincode"))
            .await
            .expect("third attempt succeeds");

        assert_eq!(localities.len(), 1);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(200), Duration::from_millis(400)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mut directory = MockPincodeDirectory::new();
        directory
            .expect_fetch_page()
            .times(3)
            .returning(|_| Err(PincodeDirectoryError::rate_limited("429")));
        let lookup = lookup(
            directory,
            Arc::new(ImmediateSleeper::default()),
            DirectoryLookupConfig::default(),
        );

        let error = lookup
            .localities_for_pincode(&Pincode::parse("110001").expect("pincode"))
            .await
            .expect_err("exhausted");

        assert!(matches!(error, PincodeDirectoryError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn does_not_retry_rejected_requests() {
        let mut directory = MockPincodeDirectory::new();
        directory
            .expect_fetch_page()
            .times(1)
            .return_once(|_| Err(PincodeDirectoryError::invalid_request("403 forbidden")));
        let sleeper = Arc::new(ImmediateSleeper::default());
        let lookup = lookup(directory, sleeper.clone(), DirectoryLookupConfig::default());

        let result = lookup
            .localities_for_pincode(&Pincode::parse("110001").expect("pincode"))
            .await;

        assert!(result.is_err());
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn pages_until_short_page_and_dedupes_pincodes() {
        let mut directory = MockPincodeDirectory::new();
        directory
            .expect_fetch_page()
            .withf(|query| query.offset == 0 && query.limit == 2)
            .times(1)
            .returning(|_| {
                Ok(DirectoryPage {
                    records: vec![
                        office("632001", "VELLORE", "TAMIL NADU"),
                        office("632001", "VELLORE", "TAMIL NADU"),
                    ],
                    total: None,
                    fetched: 2,
                })
            });
        directory
            .expect_fetch_page()
            .withf(|query| query.offset == 2)
            .times(1)
            .returning(|_| {
                Ok(DirectoryPage {
                    records: vec![office("632002", "VELLORE", "TAMIL NADU")],
                    total: None,
                    fetched: 1,
                })
            });
        let config = DirectoryLookupConfig {
            page_size: 2,
            ..DirectoryLookupConfig::default()
        };
        let lookup = lookup(directory, Arc::new(ImmediateSleeper::default()), config);

        let listing = lookup
            .offices_for_region(
                RegionName::parse("Tamil Nadu").expect("state"),
                RegionName::parse("Vellore"),
            )
            .await
            .expect("listing succeeds");

        let pincodes: Vec<_> = listing.offices.iter().map(|o| o.pincode.as_str()).collect();
        assert_eq!(pincodes, vec!["632001", "632002"]);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn page_limit_marks_listing_truncated() {
        let mut directory = MockPincodeDirectory::new();
        directory.expect_fetch_page().times(2).returning(|query| {
            let pincode = format!("{:06}", 600_000 + query.offset);
            Ok(DirectoryPage {
                records: vec![office(&pincode, "CHENNAI", "TAMIL NADU")],
                total: Some(10_000),
                fetched: 1,
            })
        });
        let config = DirectoryLookupConfig {
            page_size: 1,
            max_pages: 2,
            ..DirectoryLookupConfig::default()
        };
        let lookup = lookup(directory, Arc::new(ImmediateSleeper::default()), config);

        let listing = lookup
            .offices_for_region(RegionName::parse("Tamil Nadu").expect("state"), None)
            .await
            .expect("truncated listing");

        assert_eq!(listing.offices.len(), 2);
        assert!(listing.truncated);
    }
}
