//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use delivery_zones::domain::DirectoryLookupConfig;
use delivery_zones::domain::ports::PincodeDirectory;
use delivery_zones::inbound::http::admin_auth::AdminCredentials;
use delivery_zones::outbound::cache::CacheTtl;
use delivery_zones::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) directory: Arc<dyn PincodeDirectory>,
    pub(crate) lookup: DirectoryLookupConfig,
    pub(crate) cache_ttl: CacheTtl,
    pub(crate) admin: AdminCredentials,
}

impl ServerConfig {
    /// Construct a configuration with default retry, cache, and admin
    /// settings. Admin endpoints stay closed until a token is attached.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        db_pool: DbPool,
        directory: Arc<dyn PincodeDirectory>,
    ) -> Self {
        Self {
            bind_addr,
            db_pool,
            directory,
            lookup: DirectoryLookupConfig::default(),
            cache_ttl: CacheTtl::default(),
            admin: AdminCredentials::default(),
        }
    }

    #[must_use]
    pub fn with_lookup(mut self, lookup: DirectoryLookupConfig) -> Self {
        self.lookup = lookup;
        self
    }

    /// A zero TTL disables resolution caching.
    #[must_use]
    pub fn with_cache_ttl(mut self, cache_ttl: CacheTtl) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    #[must_use]
    pub fn with_admin(mut self, admin: AdminCredentials) -> Self {
        self.admin = admin;
        self
    }
}
