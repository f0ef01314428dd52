//! Driving port consumed by checkout and product pages.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{DeliveryError, DeliveryQuote, DeliveryResolution, Serviceability};

/// Pincode lookups for customers.
///
/// Pincodes arrive as raw strings so validation failures surface as
/// `InvalidInput` from a single place.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryResolutionQuery: Send + Sync {
    /// # Errors
    ///
    /// `InvalidInput`, `NoCoverage`, `ZoneInactive`, or
    /// `UpstreamUnavailable`.
    async fn resolve(&self, pincode: &str) -> Result<DeliveryResolution, DeliveryError>;

    /// Like [`Self::resolve`] with "cannot deliver" folded into the value.
    async fn check_serviceability(&self, pincode: &str) -> Result<Serviceability, DeliveryError>;

    /// Resolve and add the zone charge to an order subtotal.
    async fn quote_delivery(
        &self,
        pincode: &str,
        subtotal: Decimal,
    ) -> Result<DeliveryQuote, DeliveryError>;
}
