//! Service configuration loaded via OrthoConfig.
//!
//! Every value can come from the command line, a configuration file, or a
//! `DELIVERY_*` environment variable. Unset values fall back to the
//! defaults exposed by the accessor methods.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::DirectoryLookupConfig;
use crate::outbound::cache::CacheTtl;

const DEFAULT_DIRECTORY_URL: &str =
    "https://api.data.gov.in/resource/5c2f62fe-5afa-4119-a499-fec9d604d5bd";
const DEFAULT_DIRECTORY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_JITTER_SECS: u64 = 30;

/// Runtime settings for the delivery zones service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DELIVERY")]
pub struct DeliverySettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<SocketAddr>,
    /// Base URL of the pincode directory resource.
    pub directory_url: Option<String>,
    /// API key sent to the pincode directory.
    pub directory_api_key: Option<String>,
    /// Per-request timeout for directory calls, in milliseconds.
    pub directory_timeout_ms: Option<u64>,
    /// Records requested per directory page.
    pub directory_page_size: Option<u32>,
    /// Attempts per directory page, including the first.
    pub directory_max_attempts: Option<u32>,
    /// Delay before the first directory retry, in milliseconds.
    pub directory_initial_backoff_ms: Option<u64>,
    /// Upper bound for any directory retry delay, in milliseconds.
    pub directory_max_backoff_ms: Option<u64>,
    /// Lifetime of cached serviceability answers, in seconds.
    pub cache_ttl_secs: Option<u64>,
    /// Random extension added to each cache entry, in seconds.
    pub cache_jitter_secs: Option<u64>,
    /// Bearer token for the admin endpoints. Admin access is disabled when
    /// unset.
    pub admin_token: Option<String>,
}

impl DeliverySettings {
    /// Return the configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Return the bind address, falling back to all interfaces on 8080.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)))
    }

    /// Parse the directory endpoint.
    ///
    /// # Errors
    /// Returns [`url::ParseError`] when the configured URL is malformed.
    pub fn directory_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.directory_url
                .as_deref()
                .unwrap_or(DEFAULT_DIRECTORY_URL),
        )
    }

    pub fn directory_api_key(&self) -> Option<&str> {
        self.directory_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(
            self.directory_timeout_ms
                .unwrap_or(DEFAULT_DIRECTORY_TIMEOUT_MS),
        )
    }

    /// Retry and paging limits, keeping the defaults for unset values.
    pub fn directory_lookup(&self) -> DirectoryLookupConfig {
        let defaults = DirectoryLookupConfig::default();
        DirectoryLookupConfig {
            max_attempts: self
                .directory_max_attempts
                .unwrap_or(defaults.max_attempts)
                .max(1),
            initial_backoff: self
                .directory_initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .directory_max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
            page_size: self
                .directory_page_size
                .unwrap_or(defaults.page_size)
                .max(1),
            max_pages: defaults.max_pages,
        }
    }

    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            ttl: Duration::from_secs(self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)),
            jitter: Duration::from_secs(
                self.cache_jitter_secs
                    .unwrap_or(DEFAULT_CACHE_JITTER_SECS),
            ),
        }
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}
