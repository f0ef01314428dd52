//! Delivery zone aggregate and its validated value types.
//!
//! A zone is the single source of truth for the flat delivery charge and the
//! transit-day window. Region assignments only point at zones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted zone display name, in characters.
pub const ZONE_NAME_MAX: usize = 100;
/// Longest accepted transit window, in days.
pub const TRANSIT_DAYS_MAX: u16 = 365;
/// Largest charge representable by the `NUMERIC(10, 2)` column.
pub const DELIVERY_CHARGE_MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Stable identifier of a delivery zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(Uuid);

impl ZoneId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ZoneId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Failures raised while validating a [`ZoneDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneValidationError {
    #[error("zone number must be a positive integer, got {value}")]
    InvalidZoneNumber { value: i64 },
    #[error("zone name must not be blank")]
    BlankZoneName,
    #[error("zone name must be at most {ZONE_NAME_MAX} characters")]
    ZoneNameTooLong,
    #[error("delivery days must be between 0 and {TRANSIT_DAYS_MAX}, got {value}")]
    TransitDaysOutOfRange { value: i64 },
    #[error("minimum delivery days ({min}) must not exceed maximum ({max})")]
    TransitDaysInverted { min: u16, max: u16 },
    #[error("delivery charge must not be negative")]
    NegativeCharge,
    #[error("delivery charge must have at most two decimal places")]
    ChargePrecision,
    #[error("delivery charge must not exceed {DELIVERY_CHARGE_MAX}")]
    ChargeTooLarge,
}

impl ZoneValidationError {
    /// Name of the request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidZoneNumber { .. } => "zoneNumber",
            Self::BlankZoneName | Self::ZoneNameTooLong => "zoneName",
            Self::TransitDaysOutOfRange { .. } | Self::TransitDaysInverted { .. } => {
                "deliveryDays"
            }
            Self::NegativeCharge | Self::ChargePrecision | Self::ChargeTooLarge => {
                "deliveryCharge"
            }
        }
    }
}

/// Positive, unique administrative zone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneNumber(u32);

impl ZoneNumber {
    pub fn new(value: i64) -> Result<Self, ZoneValidationError> {
        // Stored as a PostgreSQL INTEGER.
        i32::try_from(value)
            .ok()
            .filter(|number| *number > 0)
            .and_then(|number| u32::try_from(number).ok())
            .map(Self)
            .ok_or(ZoneValidationError::InvalidZoneNumber { value })
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ZoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Inclusive transit window in days.
///
/// # Examples
/// ```
/// use delivery_zones::domain::TransitDays;
///
/// let days = TransitDays::new(2, 5).expect("valid window");
/// assert_eq!((days.min(), days.max()), (2, 5));
/// assert!(TransitDays::new(5, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitDays {
    min: u16,
    max: u16,
}

impl TransitDays {
    pub fn new(min: i64, max: i64) -> Result<Self, ZoneValidationError> {
        let min = Self::bounded(min)?;
        let max = Self::bounded(max)?;
        if min > max {
            return Err(ZoneValidationError::TransitDaysInverted { min, max });
        }
        Ok(Self { min, max })
    }

    fn bounded(value: i64) -> Result<u16, ZoneValidationError> {
        u16::try_from(value)
            .ok()
            .filter(|days| *days <= TRANSIT_DAYS_MAX)
            .ok_or(ZoneValidationError::TransitDaysOutOfRange { value })
    }

    pub fn min(self) -> u16 {
        self.min
    }

    pub fn max(self) -> u16 {
        self.max
    }
}

/// Flat delivery charge in rupees, scaled to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryCharge(Decimal);

impl DeliveryCharge {
    /// Validate a charge and rescale it to exactly two decimal places.
    ///
    /// # Examples
    /// ```
    /// use delivery_zones::domain::DeliveryCharge;
    /// use rust_decimal::Decimal;
    ///
    /// let charge = DeliveryCharge::new(Decimal::new(495, 1)).expect("valid charge");
    /// assert_eq!(charge.amount().to_string(), "49.50");
    /// assert!(DeliveryCharge::new(Decimal::new(4_995, 3)).is_err());
    /// ```
    pub fn new(amount: Decimal) -> Result<Self, ZoneValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ZoneValidationError::NegativeCharge);
        }
        if amount.normalize().scale() > 2 {
            return Err(ZoneValidationError::ChargePrecision);
        }
        if amount > DELIVERY_CHARGE_MAX {
            return Err(ZoneValidationError::ChargeTooLarge);
        }
        let mut scaled = amount.abs();
        scaled.rescale(2);
        Ok(Self(scaled))
    }

    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for DeliveryCharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Persisted delivery zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryZone {
    pub id: ZoneId,
    pub zone_number: ZoneNumber,
    pub zone_name: String,
    pub transit_days: TransitDays,
    pub delivery_charge: DeliveryCharge,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated zone input from an administrator.
///
/// `id` selects between update (present) and insert (absent).
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDraft {
    pub id: Option<ZoneId>,
    pub zone_number: i64,
    pub zone_name: String,
    pub delivery_days_min: i64,
    pub delivery_days_max: i64,
    pub delivery_charge: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
}

impl ZoneDraft {
    /// Check every field, normalising the name and description.
    pub fn validate(self) -> Result<ValidatedZone, ZoneValidationError> {
        let zone_number = ZoneNumber::new(self.zone_number)?;
        let zone_name = self.zone_name.trim();
        if zone_name.is_empty() {
            return Err(ZoneValidationError::BlankZoneName);
        }
        if zone_name.chars().count() > ZONE_NAME_MAX {
            return Err(ZoneValidationError::ZoneNameTooLong);
        }
        let transit_days = TransitDays::new(self.delivery_days_min, self.delivery_days_max)?;
        let delivery_charge = DeliveryCharge::new(self.delivery_charge)?;
        let description = self
            .description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        Ok(ValidatedZone {
            id: self.id,
            zone_number,
            zone_name: zone_name.to_owned(),
            transit_days,
            delivery_charge,
            description,
            is_active: self.is_active,
        })
    }
}

/// Zone input that passed validation but has no timestamps yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedZone {
    pub id: Option<ZoneId>,
    pub zone_number: ZoneNumber,
    pub zone_name: String,
    pub transit_days: TransitDays,
    pub delivery_charge: DeliveryCharge,
    pub description: Option<String>,
    pub is_active: bool,
}

impl ValidatedZone {
    pub fn into_zone(
        self,
        id: ZoneId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> DeliveryZone {
        DeliveryZone {
            id,
            zone_number: self.zone_number,
            zone_name: self.zone_name,
            transit_days: self.transit_days,
            delivery_charge: self.delivery_charge,
            description: self.description,
            is_active: self.is_active,
            created_at,
            updated_at,
        }
    }
}
