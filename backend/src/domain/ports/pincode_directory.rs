//! Driven port for the external pincode directory.
//!
//! The directory lists post offices with the pincode, district, and state
//! each one serves. The resolver uses it to translate a pincode into a
//! locality; the directory import uses it to enumerate the pincodes of a
//! state or district.

use async_trait::async_trait;

use crate::domain::{Pincode, RegionName};

use super::define_port_error;

/// One post office record returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPostOffice {
    pub pincode: Pincode,
    pub office_name: String,
    pub district: Option<RegionName>,
    pub state: RegionName,
}

/// Records to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryFilter {
    /// Post offices serving one pincode.
    Pincode(Pincode),
    /// Post offices in a state, optionally narrowed to a district.
    Region {
        state: RegionName,
        district: Option<RegionName>,
    },
}

/// One page request against the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuery {
    pub filter: DirectoryFilter,
    pub offset: u64,
    pub limit: u32,
}

/// One page of directory results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryPage {
    /// Records that decoded into valid post offices.
    pub records: Vec<DirectoryPostOffice>,
    /// Total matching records when the directory reports it.
    pub total: Option<u64>,
    /// Raw records on the page, including any that failed to decode.
    pub fetched: usize,
}

define_port_error! {
    /// Errors surfaced while calling the pincode directory.
    pub enum PincodeDirectoryError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "pincode directory transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "pincode directory timeout: {message}",
        /// The directory rate-limited the request.
        RateLimited { message: String } =>
            "pincode directory rate limited request: {message}",
        /// The response could not be decoded.
        Decode { message: String } =>
            "pincode directory response decode failed: {message}",
        /// The directory rejected the request.
        InvalidRequest { message: String } =>
            "pincode directory request invalid: {message}",
    }
}

impl PincodeDirectoryError {
    /// Return whether retrying this error is expected to help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

/// Port for paging through directory records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PincodeDirectory: Send + Sync {
    async fn fetch_page(
        &self,
        query: &DirectoryQuery,
    ) -> Result<DirectoryPage, PincodeDirectoryError>;
}
