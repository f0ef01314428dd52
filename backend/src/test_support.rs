//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`).
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ports::{
    DirectoryFilter, DirectoryPage, DirectoryPostOffice, DirectoryQuery, PincodeDirectory,
    PincodeDirectoryError, RegionRepository, RegionRepositoryError, ZoneRepository,
    ZoneRepositoryError,
};
use crate::domain::{
    BackoffJitter, DeliveryCharge, DeliveryZone, Pincode, RegionId, RegionKey, RegionName,
    RegionTarget, RetrySleeper, TransitDays, ZoneId, ZoneNumber, ZoneRegion,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

/// Fixed instant used by [`MutableClock::default`] and the sample builders.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixed timestamp is valid"),
    }
}

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0, "clock") = now;
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("failed to convert {delta:?} to TimeDelta: {error}"),
        };
        *lock(&self.0, "clock") += delta;
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(fixed_now())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Sleeper that returns at once and remembers every requested delay.
#[derive(Debug, Default)]
pub struct ImmediateSleeper(Mutex<Vec<Duration>>);

impl ImmediateSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0, "sleeper").clone()
    }
}

#[async_trait]
impl RetrySleeper for ImmediateSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0, "sleeper").push(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

/// Zone with a two-to-four day window and a charge of 40 plus the number.
///
/// The identifier is derived from `number` so repeated calls agree.
pub fn sample_zone(number: u32, is_active: bool) -> DeliveryZone {
    let zone_number = match ZoneNumber::new(i64::from(number)) {
        Ok(zone_number) => zone_number,
        Err(error) => panic!("sample zone number: {error}"),
    };
    let transit_days = match TransitDays::new(2, 4) {
        Ok(days) => days,
        Err(error) => panic!("sample transit days: {error}"),
    };
    let delivery_charge = match DeliveryCharge::new(Decimal::from(40 + number)) {
        Ok(charge) => charge,
        Err(error) => panic!("sample charge: {error}"),
    };
    DeliveryZone {
        id: ZoneId::from_uuid(Uuid::from_u128(u128::from(number))),
        zone_number,
        zone_name: format!("Zone {number}"),
        transit_days,
        delivery_charge,
        description: None,
        is_active,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

/// Region assignment with a fresh identifier.
pub fn sample_region(zone_id: ZoneId, target: RegionTarget) -> ZoneRegion {
    ZoneRegion {
        id: RegionId::random(),
        zone_id,
        target,
        created_at: fixed_now(),
    }
}

#[derive(Default)]
struct StoreState {
    zones: Vec<DeliveryZone>,
    regions: Vec<ZoneRegion>,
    unavailable: bool,
}

/// In-memory zone and region tables.
///
/// Enforces the same uniqueness and foreign-key rules as the PostgreSQL
/// schema so services can be exercised end to end without a database.
#[derive(Clone, Default)]
pub struct InMemoryDeliveryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a connection error until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    pub fn zones(&self) -> Vec<DeliveryZone> {
        self.state().zones.clone()
    }

    pub fn regions(&self) -> Vec<ZoneRegion> {
        self.state().regions.clone()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        lock(&self.state, "store")
    }

    fn zones_available(&self) -> Result<MutexGuard<'_, StoreState>, ZoneRepositoryError> {
        let state = self.state();
        if state.unavailable {
            return Err(ZoneRepositoryError::connection("store unavailable"));
        }
        Ok(state)
    }

    fn regions_available(&self) -> Result<MutexGuard<'_, StoreState>, RegionRepositoryError> {
        let state = self.state();
        if state.unavailable {
            return Err(RegionRepositoryError::connection("store unavailable"));
        }
        Ok(state)
    }
}

impl StoreState {
    fn number_taken(&self, zone: &DeliveryZone) -> bool {
        self.zones
            .iter()
            .any(|existing| existing.zone_number == zone.zone_number && existing.id != zone.id)
    }

    fn zone_exists(&self, id: &ZoneId) -> bool {
        self.zones.iter().any(|zone| zone.id == *id)
    }
}

#[async_trait]
impl ZoneRepository for InMemoryDeliveryStore {
    async fn list(&self) -> Result<Vec<DeliveryZone>, ZoneRepositoryError> {
        let mut zones = self.zones_available()?.zones.clone();
        zones.sort_by_key(|zone| zone.zone_number);
        Ok(zones)
    }

    async fn find_by_id(&self, id: &ZoneId) -> Result<Option<DeliveryZone>, ZoneRepositoryError> {
        let state = self.zones_available()?;
        Ok(state.zones.iter().find(|zone| zone.id == *id).cloned())
    }

    async fn find_by_number(
        &self,
        zone_number: ZoneNumber,
    ) -> Result<Option<DeliveryZone>, ZoneRepositoryError> {
        let state = self.zones_available()?;
        Ok(state
            .zones
            .iter()
            .find(|zone| zone.zone_number == zone_number)
            .cloned())
    }

    async fn insert(&self, zone: &DeliveryZone) -> Result<(), ZoneRepositoryError> {
        let mut state = self.zones_available()?;
        if state.number_taken(zone) {
            return Err(ZoneRepositoryError::duplicate_zone_number(
                zone.zone_number.get(),
            ));
        }
        state.zones.push(zone.clone());
        Ok(())
    }

    async fn update(&self, zone: &DeliveryZone) -> Result<(), ZoneRepositoryError> {
        let mut state = self.zones_available()?;
        if state.number_taken(zone) {
            return Err(ZoneRepositoryError::duplicate_zone_number(
                zone.zone_number.get(),
            ));
        }
        match state.zones.iter_mut().find(|existing| existing.id == zone.id) {
            Some(existing) => {
                *existing = zone.clone();
                Ok(())
            }
            None => Err(ZoneRepositoryError::not_found(zone.id)),
        }
    }

    async fn delete(&self, id: &ZoneId) -> Result<bool, ZoneRepositoryError> {
        let mut state = self.zones_available()?;
        if state.regions.iter().any(|region| region.zone_id == *id) {
            return Err(ZoneRepositoryError::still_referenced(*id));
        }
        let before = state.zones.len();
        state.zones.retain(|zone| zone.id != *id);
        Ok(state.zones.len() < before)
    }
}

#[async_trait]
impl RegionRepository for InMemoryDeliveryStore {
    async fn list(
        &self,
        zone_id: Option<ZoneId>,
    ) -> Result<Vec<ZoneRegion>, RegionRepositoryError> {
        let state = self.regions_available()?;
        Ok(state
            .regions
            .iter()
            .filter(|region| zone_id.is_none_or(|id| region.zone_id == id))
            .cloned()
            .collect())
    }

    async fn find_by_keys(
        &self,
        keys: &[RegionKey],
    ) -> Result<Vec<ZoneRegion>, RegionRepositoryError> {
        let state = self.regions_available()?;
        Ok(state
            .regions
            .iter()
            .filter(|region| keys.contains(&region.key()))
            .cloned()
            .collect())
    }

    async fn count_for_zone(&self, zone_id: &ZoneId) -> Result<u64, RegionRepositoryError> {
        let state = self.regions_available()?;
        let count = state
            .regions
            .iter()
            .filter(|region| region.zone_id == *zone_id)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn insert(&self, region: &ZoneRegion) -> Result<(), RegionRepositoryError> {
        let mut state = self.regions_available()?;
        if !state.zone_exists(&region.zone_id) {
            return Err(RegionRepositoryError::unknown_zone(region.zone_id));
        }
        let key = region.key();
        if state.regions.iter().any(|existing| existing.key() == key) {
            return Err(RegionRepositoryError::duplicate_key(key.to_string()));
        }
        state.regions.push(region.clone());
        Ok(())
    }

    async fn upsert_by_key(
        &self,
        region: &ZoneRegion,
    ) -> Result<ZoneRegion, RegionRepositoryError> {
        let mut state = self.regions_available()?;
        if !state.zone_exists(&region.zone_id) {
            return Err(RegionRepositoryError::unknown_zone(region.zone_id));
        }
        let key = region.key();
        if let Some(existing) = state
            .regions
            .iter_mut()
            .find(|existing| existing.key() == key)
        {
            existing.zone_id = region.zone_id;
            existing.target = region.target.clone();
            return Ok(existing.clone());
        }
        state.regions.push(region.clone());
        Ok(region.clone())
    }

    async fn delete(&self, id: &RegionId) -> Result<bool, RegionRepositoryError> {
        let mut state = self.regions_available()?;
        let before = state.regions.len();
        state.regions.retain(|region| region.id != *id);
        Ok(state.regions.len() < before)
    }
}

/// Build a post office record for the scripted directory.
pub fn post_office(pincode: &str, office: &str, district: &str, state: &str) -> DirectoryPostOffice {
    let pincode = match Pincode::parse(pincode) {
        Ok(pincode) => pincode,
        Err(error) => panic!("sample pincode: {error}"),
    };
    let Some(state) = RegionName::parse(state) else {
        panic!("sample state must not be blank");
    };
    DirectoryPostOffice {
        pincode,
        office_name: office.to_owned(),
        district: RegionName::parse(district),
        state,
    }
}

/// Pincode directory serving a fixed set of post offices.
///
/// Queued failures are returned, one per call, before any data is served.
#[derive(Default)]
pub struct ScriptedPincodeDirectory {
    offices: Vec<DirectoryPostOffice>,
    failures: Mutex<VecDeque<PincodeDirectoryError>>,
    queries: Mutex<Vec<DirectoryQuery>>,
}

impl ScriptedPincodeDirectory {
    pub fn new(offices: Vec<DirectoryPostOffice>) -> Self {
        Self {
            offices,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_with(self, failures: impl IntoIterator<Item = PincodeDirectoryError>) -> Self {
        lock(&self.failures, "failures").extend(failures);
        self
    }

    pub fn push_failure(&self, failure: PincodeDirectoryError) {
        lock(&self.failures, "failures").push_back(failure);
    }

    pub fn queries(&self) -> Vec<DirectoryQuery> {
        lock(&self.queries, "queries").clone()
    }

    fn matches(office: &DirectoryPostOffice, filter: &DirectoryFilter) -> bool {
        match filter {
            DirectoryFilter::Pincode(pincode) => office.pincode == *pincode,
            DirectoryFilter::Region { state, district } => {
                office.state == *state
                    && district
                        .as_ref()
                        .is_none_or(|wanted| office.district.as_ref() == Some(wanted))
            }
        }
    }
}

#[async_trait]
impl PincodeDirectory for ScriptedPincodeDirectory {
    async fn fetch_page(
        &self,
        query: &DirectoryQuery,
    ) -> Result<DirectoryPage, PincodeDirectoryError> {
        lock(&self.queries, "queries").push(query.clone());
        if let Some(failure) = lock(&self.failures, "failures").pop_front() {
            return Err(failure);
        }

        let matching: Vec<_> = self
            .offices
            .iter()
            .filter(|office| Self::matches(office, &query.filter))
            .cloned()
            .collect();
        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let records: Vec<_> = matching.into_iter().skip(offset).take(limit).collect();
        Ok(DirectoryPage {
            fetched: records.len(),
            records,
            total: Some(total),
        })
    }
}
