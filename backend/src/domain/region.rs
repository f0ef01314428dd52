//! Region assignments: a state, a state + district pair, or a single pincode
//! mapped to exactly one delivery zone.
//!
//! Every region has a natural [`RegionKey`]; two regions with the same key
//! can never coexist. Names are compared case-insensitively after collapsing
//! runs of whitespace.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Pincode, PincodeValidationError, ZoneId};

/// Separator used by legacy records that packed `"<State> - <District>"`
/// into a single field.
pub const LEGACY_DISTRICT_SEPARATOR: &str = " - ";
/// Longest accepted state or district name, in characters.
pub const REGION_NAME_MAX: usize = 100;
/// Joins state and district in a district [`RegionKey`].
const KEY_SEPARATOR: char = '/';

/// Stable identifier of a region assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(Uuid);

impl RegionId {
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

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RegionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Failures raised while building a [`RegionTarget`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionValidationError {
    #[error("state name is required for {region_type} regions")]
    MissingState { region_type: RegionType },
    #[error("district name is required for district regions")]
    MissingDistrict,
    #[error("district name is not allowed for state regions")]
    UnexpectedDistrict,
    #[error("pincode is required for pincode regions")]
    MissingPincode,
    #[error("pincode is not allowed for {region_type} regions")]
    UnexpectedPincode { region_type: RegionType },
    #[error(transparent)]
    InvalidPincode(#[from] PincodeValidationError),
    #[error("region names must be at most {REGION_NAME_MAX} characters")]
    NameTooLong,
    #[error("region names must not contain `{KEY_SEPARATOR}`")]
    ReservedCharacter { field: &'static str },
    #[error("unknown region type `{value}`")]
    UnknownRegionType { value: String },
}

impl RegionValidationError {
    /// Name of the request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingState { .. } | Self::NameTooLong => "stateName",
            Self::MissingDistrict | Self::UnexpectedDistrict => "districtName",
            Self::MissingPincode | Self::UnexpectedPincode { .. } | Self::InvalidPincode(_) => {
                "pincode"
            }
            Self::UnknownRegionType { .. } => "regionType",
            Self::ReservedCharacter { field } => field,
        }
    }
}

/// Kind of region a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionType {
    State,
    District,
    Pincode,
}

impl RegionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::District => "district",
            Self::Pincode => "pincode",
        }
    }

    /// Rank used by the resolver: higher wins.
    pub fn specificity(self) -> u8 {
        match self {
            Self::State => 1,
            Self::District => 2,
            Self::Pincode => 3,
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionType {
    type Err = RegionValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(Self::State),
            "district" | "city" => Ok(Self::District),
            "pincode" => Ok(Self::Pincode),
            _ => Err(RegionValidationError::UnknownRegionType {
                value: s.to_owned(),
            }),
        }
    }
}

/// State or district name with a display form and a comparison form.
///
/// # Examples
/// ```
/// use delivery_zones::domain::RegionName;
///
/// let a = RegionName::parse("  Tamil   Nadu ").expect("name");
/// let b = RegionName::parse("TAMIL NADU").expect("name");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "Tamil Nadu");
/// assert_eq!(b.normalised(), "tamil nadu");
/// ```
#[derive(Debug, Clone)]
pub struct RegionName {
    display: String,
    normalised: String,
}

impl RegionName {
    /// Collapse whitespace; `None` when nothing but whitespace remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if display.is_empty() {
            return None;
        }
        let normalised = display.to_lowercase();
        Some(Self {
            display,
            normalised,
        })
    }

    /// Parse a name that may become part of a [`RegionKey`].
    fn parse_bounded(
        raw: &str,
        field: &'static str,
    ) -> Result<Option<Self>, RegionValidationError> {
        match Self::parse(raw) {
            Some(name) if name.display.chars().count() > REGION_NAME_MAX => {
                Err(RegionValidationError::NameTooLong)
            }
            Some(name) if name.display.contains(KEY_SEPARATOR) => {
                Err(RegionValidationError::ReservedCharacter { field })
            }
            other => Ok(other),
        }
    }

    pub fn as_str(&self) -> &str {
        self.display.as_str()
    }

    pub fn normalised(&self) -> &str {
        self.normalised.as_str()
    }
}

impl PartialEq for RegionName {
    fn eq(&self, other: &Self) -> bool {
        self.normalised == other.normalised
    }
}

impl Eq for RegionName {}

impl Hash for RegionName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalised.hash(state);
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RegionName> for String {
    fn from(value: RegionName) -> Self {
        value.display
    }
}

/// Natural key of a region, unique across the region table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn state(state: &RegionName) -> Self {
        Self(format!("state:{}", state.normalised()))
    }

    pub fn district(state: &RegionName, district: &RegionName) -> Self {
        Self(format!(
            "district:{}{KEY_SEPARATOR}{}",
            state.normalised(),
            district.normalised()
        ))
    }

    pub fn pincode(pincode: &Pincode) -> Self {
        Self(format!("pincode:{pincode}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic target of a region assignment.
///
/// Pincode regions may carry the state and district they belong to for
/// display purposes; they do not take part in the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionTarget {
    State {
        state: RegionName,
    },
    District {
        state: RegionName,
        district: RegionName,
    },
    Pincode {
        pincode: Pincode,
        state: Option<RegionName>,
        district: Option<RegionName>,
    },
}

impl RegionTarget {
    /// Build a target from loosely structured fields.
    ///
    /// A district region given only a `"<State> - <District>"` state field is
    /// split into its two parts.
    ///
    /// # Examples
    /// ```
    /// use delivery_zones::domain::{RegionTarget, RegionType};
    ///
    /// let target = RegionTarget::from_parts(
    ///     RegionType::District,
    ///     Some("Tamil Nadu - Vellore"),
    ///     None,
    ///     None,
    /// )
    /// .expect("legacy district");
    /// assert_eq!(target.key().as_str(), "district:tamil nadu/vellore");
    /// ```
    pub fn from_parts(
        region_type: RegionType,
        state: Option<&str>,
        district: Option<&str>,
        pincode: Option<&str>,
    ) -> Result<Self, RegionValidationError> {
        let state_name = state
            .map(|raw| RegionName::parse_bounded(raw, "stateName"))
            .transpose()?
            .flatten();
        let district_name = district
            .map(|raw| RegionName::parse_bounded(raw, "districtName"))
            .transpose()?
            .flatten();
        let has_pincode = pincode.is_some_and(|raw| !raw.trim().is_empty());

        match region_type {
            RegionType::State => {
                if has_pincode {
                    return Err(RegionValidationError::UnexpectedPincode { region_type });
                }
                if district_name.is_some() {
                    return Err(RegionValidationError::UnexpectedDistrict);
                }
                let state = state_name.ok_or(RegionValidationError::MissingState { region_type })?;
                Ok(Self::State { state })
            }
            RegionType::District => {
                if has_pincode {
                    return Err(RegionValidationError::UnexpectedPincode { region_type });
                }
                let state = state_name.ok_or(RegionValidationError::MissingState { region_type })?;
                match district_name {
                    Some(district) => Ok(Self::District { state, district }),
                    None => split_legacy_district(&state),
                }
            }
            RegionType::Pincode => {
                let raw = pincode.ok_or(RegionValidationError::MissingPincode)?;
                let pincode = Pincode::parse(raw).map_err(|err| match err {
                    PincodeValidationError::Empty => RegionValidationError::MissingPincode,
                    other => RegionValidationError::InvalidPincode(other),
                })?;
                Ok(Self::Pincode {
                    pincode,
                    state: state_name,
                    district: district_name,
                })
            }
        }
    }

    pub fn region_type(&self) -> RegionType {
        match self {
            Self::State { .. } => RegionType::State,
            Self::District { .. } => RegionType::District,
            Self::Pincode { .. } => RegionType::Pincode,
        }
    }

    pub fn specificity(&self) -> u8 {
        self.region_type().specificity()
    }

    pub fn key(&self) -> RegionKey {
        match self {
            Self::State { state } => RegionKey::state(state),
            Self::District { state, district } => RegionKey::district(state, district),
            Self::Pincode { pincode, .. } => RegionKey::pincode(pincode),
        }
    }

    pub fn state_name(&self) -> Option<&RegionName> {
        match self {
            Self::State { state } | Self::District { state, .. } => Some(state),
            Self::Pincode { state, .. } => state.as_ref(),
        }
    }

    pub fn district_name(&self) -> Option<&RegionName> {
        match self {
            Self::State { .. } => None,
            Self::District { district, .. } => Some(district),
            Self::Pincode { district, .. } => district.as_ref(),
        }
    }

    pub fn pincode(&self) -> Option<&Pincode> {
        match self {
            Self::Pincode { pincode, .. } => Some(pincode),
            Self::State { .. } | Self::District { .. } => None,
        }
    }
}

fn split_legacy_district(combined: &RegionName) -> Result<RegionTarget, RegionValidationError> {
    let (state, district) = combined
        .as_str()
        .split_once(LEGACY_DISTRICT_SEPARATOR)
        .ok_or(RegionValidationError::MissingDistrict)?;
    let state = RegionName::parse(state).ok_or(RegionValidationError::MissingState {
        region_type: RegionType::District,
    })?;
    let district = RegionName::parse(district).ok_or(RegionValidationError::MissingDistrict)?;
    Ok(RegionTarget::District { state, district })
}

/// Persisted region assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRegion {
    pub id: RegionId,
    pub zone_id: ZoneId,
    pub target: RegionTarget,
    pub created_at: DateTime<Utc>,
}

impl ZoneRegion {
    pub fn key(&self) -> RegionKey {
        self.target.key()
    }
}

/// Order region candidates so the winning assignment sorts first.
///
/// Pincode beats district beats state; ties go to the earliest
/// `created_at`, then to the lowest id so the order is total.
pub fn compare_precedence(left: &ZoneRegion, right: &ZoneRegion) -> Ordering {
    right
        .target
        .specificity()
        .cmp(&left.target.specificity())
        .then_with(|| left.created_at.cmp(&right.created_at))
        .then_with(|| left.id.cmp(&right.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn region(target: RegionTarget, created_second: u32, id: u128) -> ZoneRegion {
        ZoneRegion {
            id: RegionId::from_uuid(Uuid::from_u128(id)),
            zone_id: ZoneId::from_uuid(Uuid::from_u128(1)),
            target,
            created_at: Utc
                .with_ymd_and_hms(2025, 1, 1, 0, 0, created_second)
                .single()
                .expect("valid timestamp"),
        }
    }

    fn state(name: &str) -> RegionTarget {
        RegionTarget::from_parts(RegionType::State, Some(name), None, None).expect("state")
    }

    fn district(state: &str, district: &str) -> RegionTarget {
        RegionTarget::from_parts(RegionType::District, Some(state), Some(district), None)
            .expect("district")
    }

    #[rstest]
    #[case(Some("Tamil Nadu"), Some("Vellore"), "district:tamil nadu/vellore")]
    #[case(Some("tamil  nadu - VELLORE"), None, "district:tamil nadu/vellore")]
    #[case(Some(" Tamil Nadu "), Some(" vellore"), "district:tamil nadu/vellore")]
    fn district_keys_are_normalised(
        #[case] state: Option<&str>,
        #[case] district: Option<&str>,
        #[case] expected: &str,
    ) {
        let target = RegionTarget::from_parts(RegionType::District, state, district, None)
            .expect("district target");
        assert_eq!(target.key().as_str(), expected);
    }

    #[rstest]
    #[case(RegionType::State, None, None, None, RegionValidationError::MissingState { region_type: RegionType::State })]
    #[case(RegionType::State, Some("Kerala"), Some("Idukki"), None, RegionValidationError::UnexpectedDistrict)]
    #[case(RegionType::District, Some("Kerala"), None, None, RegionValidationError::MissingDistrict)]
    #[case(RegionType::District, Some("Kerala"), Some("   "), None, RegionValidationError::MissingDistrict)]
    #[case(RegionType::District, Some("Kerala"), Some("Idukki"), Some("685501"), RegionValidationError::UnexpectedPincode { region_type: RegionType::District })]
    #[case(RegionType::Pincode, Some("Kerala"), None, None, RegionValidationError::MissingPincode)]
    #[case(RegionType::Pincode, None, None, Some("68550"), RegionValidationError::InvalidPincode(PincodeValidationError::WrongLength { length: 5 }))]
    #[case(RegionType::District, Some("Daman/Diu"), Some("Daman"), None, RegionValidationError::ReservedCharacter { field: "stateName" })]
    #[case(RegionType::District, Some("Daman"), Some("Diu/Daman"), None, RegionValidationError::ReservedCharacter { field: "districtName" })]
    fn rejects_incomplete_targets(
        #[case] region_type: RegionType,
        #[case] state: Option<&str>,
        #[case] district: Option<&str>,
        #[case] pincode: Option<&str>,
        #[case] expected: RegionValidationError,
    ) {
        assert_eq!(
            RegionTarget::from_parts(region_type, state, district, pincode),
            Err(expected)
        );
    }

    #[test]
    fn pincode_target_keeps_optional_names_out_of_the_key() {
        let target = RegionTarget::from_parts(
            RegionType::Pincode,
            Some("Kerala"),
            Some("Idukki"),
            Some(" 685501 "),
        )
        .expect("pincode target");
        assert_eq!(target.key().as_str(), "pincode:685501");
        assert_eq!(target.district_name().map(RegionName::as_str), Some("Idukki"));
    }

    #[rstest]
    #[case("State", RegionType::State)]
    #[case("city", RegionType::District)]
    #[case(" PINCODE ", RegionType::Pincode)]
    fn parses_region_type_aliases(#[case] raw: &str, #[case] expected: RegionType) {
        assert_eq!(raw.parse::<RegionType>(), Ok(expected));
    }

    #[test]
    fn precedence_prefers_specificity_then_age_then_id() {
        let pincode = region(
            RegionTarget::from_parts(RegionType::Pincode, None, None, Some("632001"))
                .expect("pincode"),
            30,
            9,
        );
        let newer_district = region(district("Tamil Nadu", "Vellore"), 20, 1);
        let older_district = region(district("Tamil Nadu", "Vellore"), 10, 8);
        let twin_district = region(district("Tamil Nadu", "Vellore"), 10, 2);
        let state = region(state("Tamil Nadu"), 0, 0);

        let mut candidates = vec![
            state.clone(),
            newer_district.clone(),
            older_district.clone(),
            pincode.clone(),
            twin_district.clone(),
        ];
        candidates.sort_by(compare_precedence);

        assert_eq!(
            candidates,
            vec![pincode, twin_district, older_district, newer_district, state]
        );
    }
}
