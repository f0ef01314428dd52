//! Pincode directory outbound adapters.
//!
//! A thin HTTP implementation of the `PincodeDirectory` port.

mod dto;
mod http_directory;

pub use http_directory::HttpPincodeDirectory;
