//! Domain primitives, services, and ports.
//!
//! Purpose: model delivery zones, the regions assigned to them, and the
//! resolution of a customer's pincode to a zone, independently of HTTP or
//! the database.
//!
//! Public surface:
//! - Value types: [`Pincode`], [`RegionName`], [`RegionTarget`],
//!   [`DeliveryZone`], [`ZoneRegion`], [`DeliveryResolution`].
//! - Services: [`ZoneRegistryService`], [`RegionAssignmentService`],
//!   [`DeliveryResolver`], [`DirectoryLookup`].
//! - Errors: [`DeliveryError`] for domain failures and [`Error`] for the
//!   transport payload.

pub mod delivery_error;
pub mod delivery_resolver;
pub mod directory_lookup;
pub mod error;
pub mod pincode;
pub mod ports;
pub mod region;
pub mod region_assignment_service;
pub mod resolution;
pub mod trace_id;
pub mod zone;
pub mod zone_registry_service;

pub use self::delivery_error::{DeliveryError, NOT_SERVICEABLE_REASON};
pub use self::delivery_resolver::DeliveryResolver;
pub use self::directory_lookup::{
    BackoffJitter, DirectoryListing, DirectoryLookup, DirectoryLookupConfig,
    DirectoryLookupRuntime, RetrySleeper, TokioSleeper, UniformJitter,
};
pub use self::error::{Error, ErrorCode};
pub use self::pincode::{PINCODE_LENGTH, Pincode, PincodeValidationError};
pub use self::region::{
    LEGACY_DISTRICT_SEPARATOR, REGION_NAME_MAX, RegionId, RegionKey, RegionName, RegionTarget,
    RegionType, RegionValidationError, ZoneRegion, compare_precedence,
};
pub use self::region_assignment_service::{MAX_IMPORT_RECORDS, RegionAssignmentService};
pub use self::resolution::{
    DeliveryQuote, DeliveryResolution, Locality, NotServiceableReason, Serviceability,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::zone::{
    DELIVERY_CHARGE_MAX, DeliveryCharge, DeliveryZone, TRANSIT_DAYS_MAX, TransitDays, ZONE_NAME_MAX,
    ValidatedZone, ZoneDraft, ZoneId, ZoneNumber, ZoneValidationError,
};
pub use self::zone_registry_service::ZoneRegistryService;

/// Convenient result alias for inbound adapters.
pub type ApiResult<T> = Result<T, Error>;
