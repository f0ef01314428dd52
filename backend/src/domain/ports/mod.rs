//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the pincode directory, the resolution cache)
//! expose strongly typed errors built with `define_port_error!`. Driving
//! ports return [`crate::domain::DeliveryError`].

mod macros;
pub(crate) use macros::define_port_error;

mod delivery_resolution;
mod pincode_directory;
mod region_assignment;
mod region_repository;
mod resolution_cache;
mod zone_registry;
mod zone_repository;

#[cfg(test)]
pub use delivery_resolution::MockDeliveryResolutionQuery;
pub use delivery_resolution::DeliveryResolutionQuery;
#[cfg(test)]
pub use pincode_directory::MockPincodeDirectory;
pub use pincode_directory::{
    DirectoryFilter, DirectoryPage, DirectoryPostOffice, DirectoryQuery, PincodeDirectory,
    PincodeDirectoryError,
};
#[cfg(test)]
pub use region_assignment::MockRegionAssignment;
pub use region_assignment::{
    BulkImportReport, DirectoryImportRequest, ImportFailure, NewRegion, RegionAssignment,
    RegionImportRecord,
};
#[cfg(test)]
pub use region_repository::MockRegionRepository;
pub use region_repository::{RegionRepository, RegionRepositoryError};
#[cfg(test)]
pub use resolution_cache::MockResolutionCache;
pub use resolution_cache::{CachedResolution, ResolutionCache, ResolutionCacheError};
#[cfg(test)]
pub use zone_registry::MockZoneRegistry;
pub use zone_registry::ZoneRegistry;
#[cfg(test)]
pub use zone_repository::MockZoneRepository;
pub use zone_repository::{ZoneRepository, ZoneRepositoryError};
