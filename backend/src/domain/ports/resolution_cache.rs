//! Port interface for caching pincode resolution outcomes.
use async_trait::async_trait;

use crate::domain::{DeliveryResolution, Pincode, ZoneNumber};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum ResolutionCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "resolution cache backend failure: {message}",
    }
}

/// Outcome stored per pincode.
///
/// Negative outcomes are cached too so repeated lookups for uncovered
/// pincodes do not hit the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedResolution {
    Resolved(DeliveryResolution),
    NoCoverage,
    ZoneInactive { zone_number: ZoneNumber },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResolutionCache: Send + Sync {
    /// Read a fresh cached outcome for the pincode.
    async fn get(&self, pincode: &Pincode)
    -> Result<Option<CachedResolution>, ResolutionCacheError>;

    /// Store an outcome for the pincode.
    async fn put(
        &self,
        pincode: &Pincode,
        outcome: CachedResolution,
    ) -> Result<(), ResolutionCacheError>;

    /// Drop every cached outcome after zones or regions change.
    async fn invalidate_all(&self) -> Result<(), ResolutionCacheError>;
}
