//! Outcomes of resolving a pincode to a delivery zone.

use rust_decimal::Decimal;

use super::{
    DeliveryCharge, DeliveryZone, Pincode, RegionName, RegionType, ZoneId, ZoneNumber, ZoneRegion,
};

/// State and district a pincode belongs to, as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locality {
    pub state: RegionName,
    pub district: Option<RegionName>,
}

/// Zone that serves a pincode and how it was matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResolution {
    pub zone_id: ZoneId,
    pub zone_number: ZoneNumber,
    pub zone_name: String,
    pub delivery_days_min: u16,
    pub delivery_days_max: u16,
    pub delivery_charge: DeliveryCharge,
    pub matched_state: Option<String>,
    pub matched_city: Option<String>,
    pub matched_pincode: Pincode,
    pub matched_by: RegionType,
}

impl DeliveryResolution {
    /// Combine the winning region with its zone.
    ///
    /// Names the region does not carry are filled in from the directory
    /// locality that led to the match, when there is one.
    pub fn from_match(
        zone: &DeliveryZone,
        region: &ZoneRegion,
        pincode: &Pincode,
        locality: Option<&Locality>,
    ) -> Self {
        let matched_state = region
            .target
            .state_name()
            .or_else(|| locality.map(|found| &found.state))
            .map(|name| name.as_str().to_owned());
        let matched_city = region
            .target
            .district_name()
            .or_else(|| locality.and_then(|found| found.district.as_ref()))
            .map(|name| name.as_str().to_owned());

        Self {
            zone_id: zone.id,
            zone_number: zone.zone_number,
            zone_name: zone.zone_name.clone(),
            delivery_days_min: zone.transit_days.min(),
            delivery_days_max: zone.transit_days.max(),
            delivery_charge: zone.delivery_charge,
            matched_state,
            matched_city,
            matched_pincode: pincode.clone(),
            matched_by: region.target.region_type(),
        }
    }
}

/// Why a pincode cannot be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotServiceableReason {
    /// No region covers the pincode.
    NoCoverage,
    /// The covering zone is switched off.
    ZoneInactive,
}

/// Customer-facing serviceability verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Serviceability {
    Available(DeliveryResolution),
    NotAvailable(NotServiceableReason),
}

/// Checkout totals for an order shipped to a resolved pincode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryQuote {
    pub resolution: DeliveryResolution,
    pub subtotal: Decimal,
    pub delivery_charge: Decimal,
    pub total: Decimal,
}

impl DeliveryQuote {
    /// `None` when the total overflows the decimal range.
    pub fn new(resolution: DeliveryResolution, subtotal: Decimal) -> Option<Self> {
        let delivery_charge = resolution.delivery_charge.amount();
        let total = subtotal.checked_add(delivery_charge)?;
        Some(Self {
            total,
            subtotal,
            delivery_charge,
            resolution,
        })
    }
}
