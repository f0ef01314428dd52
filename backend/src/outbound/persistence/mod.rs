//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin: they translate between the internal row structs
//! (`models.rs`, `schema.rs`) and domain types and map database failures to
//! port errors. Validation and precedence rules stay in the domain.
//!
//! ```ignore
//! use delivery_zones::outbound::persistence::{DbPool, DieselZoneRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/delivery")).await?;
//! let zones = DieselZoneRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_region_repository;
mod diesel_zone_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_region_repository::DieselRegionRepository;
pub use diesel_zone_repository::DieselZoneRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
