//! DTOs for the pincode directory's JSON payload.
//!
//! The directory serves the data.gov.in "All India Pincode Directory"
//! resource. Numeric fields arrive as numbers or strings depending on the
//! resource version, and individual records are occasionally malformed, so
//! records are decoded one at a time and bad ones are skipped.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::{DirectoryPage, DirectoryPostOffice};
use crate::domain::{Pincode, RegionName};

/// Placeholder the directory uses for unknown districts.
const UNKNOWN_DISTRICT: &str = "NA";

#[derive(Debug, Deserialize)]
pub(super) struct DirectoryResponseDto {
    #[serde(default)]
    total: Option<FlexibleNumber>,
    #[serde(default)]
    records: Vec<Value>,
}

/// A number the directory may encode as a JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FlexibleNumber {
    Number(u64),
    Text(String),
}

impl FlexibleNumber {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    fn into_text(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostOfficeRecordDto {
    pincode: FlexibleNumber,
    #[serde(default)]
    officename: Option<String>,
    #[serde(default, alias = "districtname")]
    district: Option<String>,
    statename: String,
}

impl PostOfficeRecordDto {
    fn into_domain(self) -> Result<DirectoryPostOffice, String> {
        let raw_pincode = self.pincode.into_text();
        let pincode =
            Pincode::parse(&raw_pincode).map_err(|err| format!("pincode {raw_pincode:?}: {err}"))?;
        let state = RegionName::parse(&self.statename)
            .ok_or_else(|| format!("pincode {pincode} has a blank state"))?;
        let district = self
            .district
            .as_deref()
            .filter(|name| !name.trim().eq_ignore_ascii_case(UNKNOWN_DISTRICT))
            .and_then(RegionName::parse);

        Ok(DirectoryPostOffice {
            pincode,
            office_name: self.officename.unwrap_or_default().trim().to_owned(),
            district,
            state,
        })
    }
}

impl DirectoryResponseDto {
    /// Decode valid records into a page, skipping the rest.
    pub(super) fn into_page(self) -> DirectoryPage {
        let fetched = self.records.len();
        let records = self
            .records
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                serde_json::from_value::<PostOfficeRecordDto>(raw)
                    .map_err(|err| err.to_string())
                    .and_then(PostOfficeRecordDto::into_domain)
                    .map_err(|reason| {
                        debug!(index, %reason, "skipping malformed directory record");
                    })
                    .ok()
            })
            .collect();

        DirectoryPage {
            records,
            total: self.total.as_ref().and_then(FlexibleNumber::as_u64),
            fetched,
        }
    }
}
