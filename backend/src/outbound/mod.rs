//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel.
//! - **directory**: HTTP client for the external pincode directory.
//! - **cache**: in-memory and no-op resolution caches.
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod cache;
pub mod directory;
pub mod persistence;
