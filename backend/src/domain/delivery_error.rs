//! Failure taxonomy shared by the zone registry, region assignment, and the
//! pincode resolver.

use serde_json::json;

use super::ports::{PincodeDirectoryError, RegionRepositoryError, ZoneRepositoryError};
use super::{Error, Pincode, ZoneNumber};

/// Reason reported to customers for every "cannot deliver here" outcome.
pub const NOT_SERVICEABLE_REASON: &str = "not_serviceable";

/// Domain failures raised by delivery operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Caller input failed validation; nothing was looked up or written.
    #[error("{message}")]
    InvalidInput { field: &'static str, message: String },
    /// No region assignment covers the pincode.
    #[error("no delivery zone covers pincode {pincode}")]
    NoCoverage { pincode: Pincode },
    /// The winning region belongs to a zone that is switched off.
    #[error("pincode {pincode} maps to inactive zone {zone_number}")]
    ZoneInactive {
        pincode: Pincode,
        zone_number: ZoneNumber,
    },
    /// The pincode directory or the database could not be reached.
    #[error("{message}")]
    UpstreamUnavailable { message: String },
    /// A delete was blocked by rows still pointing at the target.
    #[error("{message}")]
    Referential { message: String },
    /// The write collides with an existing unique value.
    #[error("{message}")]
    Conflict { message: String },
    #[error("{message}")]
    NotFound { message: String },
    /// Unexpected persistence failure.
    #[error("{message}")]
    Storage { message: String },
}

impl DeliveryError {
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    pub fn referential(message: impl Into<String>) -> Self {
        Self::Referential {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// `true` for outcomes customers see as "not serviceable".
    pub fn is_not_serviceable(&self) -> bool {
        matches!(self, Self::NoCoverage { .. } | Self::ZoneInactive { .. })
    }
}

impl From<ZoneRepositoryError> for DeliveryError {
    fn from(error: ZoneRepositoryError) -> Self {
        match error {
            ZoneRepositoryError::Connection { message } => Self::upstream_unavailable(format!(
                "zone store unavailable: {message}"
            )),
            ZoneRepositoryError::Query { message } => Self::storage(message),
            ZoneRepositoryError::DuplicateZoneNumber { zone_number } => {
                Self::conflict(format!("zone number {zone_number} is already in use"))
            }
            ZoneRepositoryError::NotFound { zone_id } => {
                Self::not_found(format!("zone {zone_id} not found"))
            }
            ZoneRepositoryError::StillReferenced { zone_id } => Self::referential(format!(
                "zone {zone_id} still has regions assigned"
            )),
        }
    }
}

impl From<RegionRepositoryError> for DeliveryError {
    fn from(error: RegionRepositoryError) -> Self {
        match error {
            RegionRepositoryError::Connection { message } => Self::upstream_unavailable(format!(
                "region store unavailable: {message}"
            )),
            RegionRepositoryError::Query { message } => Self::storage(message),
            RegionRepositoryError::DuplicateKey { key } => {
                Self::conflict(format!("region {key} is already assigned"))
            }
            RegionRepositoryError::UnknownZone { zone_id } => {
                Self::not_found(format!("zone {zone_id} not found"))
            }
        }
    }
}

impl From<PincodeDirectoryError> for DeliveryError {
    fn from(error: PincodeDirectoryError) -> Self {
        Self::upstream_unavailable(format!("pincode directory unavailable: {error}"))
    }
}

impl From<DeliveryError> for Error {
    fn from(error: DeliveryError) -> Self {
        match error {
            DeliveryError::InvalidInput { field, message } => {
                Self::invalid_request(message).with_details(json!({ "field": field }))
            }
            DeliveryError::NoCoverage { .. } | DeliveryError::ZoneInactive { .. } => {
                Self::not_found("delivery is not available for this pincode")
                    .with_details(json!({ "reason": NOT_SERVICEABLE_REASON }))
            }
            DeliveryError::UpstreamUnavailable { message } => Self::service_unavailable(message),
            DeliveryError::Referential { message } | DeliveryError::Conflict { message } => {
                Self::conflict(message)
            }
            DeliveryError::NotFound { message } => Self::not_found(message),
            DeliveryError::Storage { message } => Self::internal(message),
        }
    }
}
