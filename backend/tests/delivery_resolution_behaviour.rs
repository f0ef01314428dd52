//! Behaviour tests for zone administration and pincode resolution.
//!
//! Services run over the in-memory store, the scripted directory, and the
//! real in-process resolution cache.

use std::sync::Arc;

use delivery_zones::domain::ports::{
    DeliveryResolutionQuery, DirectoryImportRequest, NewRegion, PincodeDirectory,
    PincodeDirectoryError, RegionAssignment, RegionImportRecord, ZoneRegistry,
};
use delivery_zones::domain::{
    DeliveryError, DeliveryResolver, DeliveryZone, DirectoryLookup, DirectoryLookupConfig,
    DirectoryLookupRuntime, NotServiceableReason, RegionAssignmentService, RegionType,
    Serviceability, ZoneDraft, ZoneRegistryService,
};
use delivery_zones::outbound::cache::{CacheTtl, InMemoryResolutionCache};
use delivery_zones::test_support::{
    ImmediateSleeper, InMemoryDeliveryStore, MutableClock, NoJitter, ScriptedPincodeDirectory,
    post_office,
};
use rstest::{fixture, rstest};
use rust_decimal::Decimal;

struct World {
    store: InMemoryDeliveryStore,
    directory: Arc<ScriptedPincodeDirectory>,
    registry: ZoneRegistryService<InMemoryDeliveryStore, InMemoryDeliveryStore>,
    assignment: RegionAssignmentService<InMemoryDeliveryStore, InMemoryDeliveryStore>,
    resolver: DeliveryResolver<InMemoryDeliveryStore, InMemoryDeliveryStore>,
}

impl World {
    fn new(directory: ScriptedPincodeDirectory) -> Self {
        Self::with_lookup_config(directory, DirectoryLookupConfig::default())
    }

    fn with_lookup_config(
        directory: ScriptedPincodeDirectory,
        config: DirectoryLookupConfig,
    ) -> Self {
        let store = InMemoryDeliveryStore::new();
        let directory = Arc::new(directory);
        let clock = Arc::new(MutableClock::default());
        let cache = Arc::new(InMemoryResolutionCache::new(clock.clone(), CacheTtl::default()));
        let lookup = DirectoryLookup::with_runtime(
            directory.clone() as Arc<dyn PincodeDirectory>,
            clock.clone(),
            DirectoryLookupRuntime {
                sleeper: Arc::new(ImmediateSleeper::default()),
                jitter: Arc::new(NoJitter),
            },
            config,
        );
        let shared = Arc::new(store.clone());

        Self {
            registry: ZoneRegistryService::new(
                shared.clone(),
                shared.clone(),
                cache.clone(),
                clock.clone(),
            ),
            assignment: RegionAssignmentService::new(
                shared.clone(),
                shared.clone(),
                lookup.clone(),
                cache.clone(),
                clock,
            ),
            resolver: DeliveryResolver::new(shared.clone(), shared, lookup, cache),
            store,
            directory,
        }
    }

    async fn zone(&self, zone_number: i64, charge: Decimal, days: (i64, i64)) -> DeliveryZone {
        self.registry
            .upsert_zone(ZoneDraft {
                id: None,
                zone_number,
                zone_name: format!("Zone {zone_number}"),
                delivery_days_min: days.0,
                delivery_days_max: days.1,
                delivery_charge: charge,
                description: None,
                is_active: true,
            })
            .await
            .expect("zone created")
    }

    async fn assign(&self, zone: &DeliveryZone, region_type: RegionType, parts: [Option<&str>; 3]) {
        let [state, district, pincode] = parts;
        self.assignment
            .add_region(NewRegion {
                zone_id: zone.id,
                region_type,
                state_name: state.map(str::to_owned),
                district_name: district.map(str::to_owned),
                pincode: pincode.map(str::to_owned),
            })
            .await
            .expect("region assigned");
    }
}

#[fixture]
fn tamil_nadu_directory() -> ScriptedPincodeDirectory {
    ScriptedPincodeDirectory::new(vec![
        post_office("632001", "Vellore HO", "VELLORE", "TAMIL NADU"),
        post_office("632002", "Sathuvachari", "VELLORE", "TAMIL NADU"),
        post_office("600001", "Chennai GPO", "CHENNAI", "TAMIL NADU"),
        post_office("110001", "Connaught Place", "NEW DELHI", "DELHI"),
    ])
}

#[rstest]
#[tokio::test]
async fn active_zone_pincode_gets_its_exact_terms(tamil_nadu_directory: ScriptedPincodeDirectory) {
    let world = World::new(tamil_nadu_directory);
    let zone = world.zone(3, Decimal::new(7_950, 2), (3, 6)).await;
    world
        .assign(&zone, RegionType::Pincode, [None, None, Some("632001")])
        .await;

    let quote = world
        .resolver
        .quote_delivery("632001", Decimal::new(50_000, 2))
        .await
        .expect("quote");

    assert_eq!(quote.delivery_charge, Decimal::new(7_950, 2));
    assert_eq!(quote.total, Decimal::new(57_950, 2));
    assert_eq!(quote.resolution.delivery_days_min, 3);
    assert_eq!(quote.resolution.delivery_days_max, 6);
    assert_eq!(quote.resolution.matched_by, RegionType::Pincode);
    assert!(
        world.directory.queries().is_empty(),
        "pincode match needs no directory call"
    );
}

#[rstest]
#[tokio::test]
async fn unassigned_pincode_has_no_coverage(tamil_nadu_directory: ScriptedPincodeDirectory) {
    let world = World::new(tamil_nadu_directory);
    let zone = world.zone(1, Decimal::new(40, 0), (1, 2)).await;
    world
        .assign(&zone, RegionType::State, [Some("Kerala"), None, None])
        .await;

    let verdict = world
        .resolver
        .check_serviceability("110001")
        .await
        .expect("verdict");

    assert_eq!(
        verdict,
        Serviceability::NotAvailable(NotServiceableReason::NoCoverage)
    );
}

#[rstest]
#[tokio::test]
async fn district_beats_state_for_vellore(tamil_nadu_directory: ScriptedPincodeDirectory) {
    let world = World::new(tamil_nadu_directory);
    let state_zone = world.zone(1, Decimal::new(60, 0), (4, 7)).await;
    let district_zone = world.zone(2, Decimal::new(45, 0), (2, 3)).await;
    world
        .assign(&state_zone, RegionType::State, [Some("Tamil Nadu"), None, None])
        .await;
    world
        .assign(
            &district_zone,
            RegionType::District,
            [Some("Tamil Nadu"), Some("Vellore"), None],
        )
        .await;

    let vellore = world.resolver.resolve("632002").await.expect("vellore");
    let chennai = world.resolver.resolve("600001").await.expect("chennai");

    assert_eq!(vellore.zone_id, district_zone.id);
    assert_eq!(vellore.matched_by, RegionType::District);
    assert_eq!(vellore.matched_city.as_deref(), Some("Vellore"));
    assert_eq!(chennai.zone_id, state_zone.id);
    assert_eq!(chennai.matched_by, RegionType::State);
    assert_eq!(chennai.matched_city.as_deref(), Some("CHENNAI"));
}

#[rstest]
#[tokio::test]
async fn deactivating_a_zone_makes_its_pincodes_unserviceable(
    tamil_nadu_directory: ScriptedPincodeDirectory,
) {
    let world = World::new(tamil_nadu_directory);
    let zone = world.zone(4, Decimal::new(55, 0), (2, 5)).await;
    world
        .assign(&zone, RegionType::Pincode, [None, None, Some("632001")])
        .await;
    // Warm the cache so the deactivation has to invalidate it.
    world.resolver.resolve("632001").await.expect("active");

    world
        .registry
        .upsert_zone(ZoneDraft {
            id: Some(zone.id),
            zone_number: 4,
            zone_name: zone.zone_name.clone(),
            delivery_days_min: 2,
            delivery_days_max: 5,
            delivery_charge: Decimal::new(55, 0),
            description: None,
            is_active: false,
        })
        .await
        .expect("deactivated");

    let verdict = world
        .resolver
        .check_serviceability("632001")
        .await
        .expect("verdict");
    assert_eq!(
        verdict,
        Serviceability::NotAvailable(NotServiceableReason::ZoneInactive)
    );
    let error = world
        .resolver
        .quote_delivery("632001", Decimal::new(100, 0))
        .await
        .expect_err("inactive zone");
    assert!(error.is_not_serviceable());
}

#[rstest]
#[tokio::test]
async fn repeated_bulk_import_changes_nothing(tamil_nadu_directory: ScriptedPincodeDirectory) {
    let world = World::new(tamil_nadu_directory);
    world.zone(1, Decimal::new(40, 0), (1, 2)).await;
    world.zone(2, Decimal::new(60, 0), (3, 5)).await;
    let records = vec![
        RegionImportRecord {
            zone_number: Some(1),
            state_name: Some("Karnataka".to_owned()),
            ..RegionImportRecord::default()
        },
        RegionImportRecord {
            zone_number: Some(2),
            state_name: Some("Tamil Nadu - Vellore".to_owned()),
            ..RegionImportRecord::default()
        },
        RegionImportRecord {
            zone_number: Some(2),
            pincode: Some("632001".to_owned()),
            ..RegionImportRecord::default()
        },
    ];

    let first = world
        .assignment
        .bulk_import_regions(records.clone())
        .await
        .expect("first import");
    let after_first = world.store.regions();
    let second = world
        .assignment
        .bulk_import_regions(records)
        .await
        .expect("second import");

    assert_eq!(first.succeeded, 3);
    assert_eq!(second.succeeded, 3);
    assert!(second.failed.is_empty());
    assert_eq!(world.store.regions(), after_first);
}

#[rstest]
#[tokio::test]
async fn bulk_import_reports_bad_records_and_keeps_good_ones(
    tamil_nadu_directory: ScriptedPincodeDirectory,
) {
    let world = World::new(tamil_nadu_directory);
    world.zone(1, Decimal::new(40, 0), (1, 2)).await;
    let records = vec![
        RegionImportRecord {
            zone_number: Some(1),
            state_name: Some("Goa".to_owned()),
            ..RegionImportRecord::default()
        },
        RegionImportRecord {
            zone_number: Some(9),
            state_name: Some("Assam".to_owned()),
            ..RegionImportRecord::default()
        },
        RegionImportRecord {
            zone_number: Some(1),
            pincode: Some("12AB56".to_owned()),
            ..RegionImportRecord::default()
        },
    ];

    let report = world
        .assignment
        .bulk_import_regions(records)
        .await
        .expect("import");

    assert_eq!(report.succeeded, 1);
    let failed: Vec<_> = report.failed.iter().map(|failure| failure.index).collect();
    assert_eq!(failed, vec![1, 2]);
    assert_eq!(world.store.regions().len(), 1);
}

#[rstest]
#[tokio::test]
async fn deleting_a_zone_with_regions_is_refused(tamil_nadu_directory: ScriptedPincodeDirectory) {
    let world = World::new(tamil_nadu_directory);
    let zone = world.zone(5, Decimal::new(40, 0), (1, 2)).await;
    world
        .assign(&zone, RegionType::State, [Some("Goa"), None, None])
        .await;

    let error = world
        .registry
        .delete_zone(zone.id)
        .await
        .expect_err("still referenced");

    assert!(matches!(error, DeliveryError::Referential { .. }));
    assert_eq!(world.store.zones().len(), 1);
}

#[rstest]
#[tokio::test]
async fn directory_timeouts_surface_as_upstream_unavailable(
    tamil_nadu_directory: ScriptedPincodeDirectory,
) {
    let directory = tamil_nadu_directory.failing_with([
        PincodeDirectoryError::timeout("5s elapsed"),
        PincodeDirectoryError::timeout("5s elapsed"),
        PincodeDirectoryError::timeout("5s elapsed"),
    ]);
    let world = World::new(directory);
    let zone = world.zone(1, Decimal::new(40, 0), (1, 2)).await;
    world
        .assign(&zone, RegionType::State, [Some("Tamil Nadu"), None, None])
        .await;

    let error = world
        .resolver
        .check_serviceability("632001")
        .await
        .expect_err("directory down");

    assert!(matches!(error, DeliveryError::UpstreamUnavailable { .. }));
    assert_eq!(world.directory.queries().len(), 3);
}

#[rstest]
#[tokio::test]
async fn directory_import_assigns_every_listed_pincode(
    tamil_nadu_directory: ScriptedPincodeDirectory,
) {
    let world = World::new(tamil_nadu_directory);
    let zone = world.zone(2, Decimal::new(45, 0), (2, 3)).await;

    let report = world
        .assignment
        .import_from_directory(DirectoryImportRequest {
            zone_id: zone.id,
            state_name: "Tamil Nadu".to_owned(),
            district_name: Some("Vellore".to_owned()),
        })
        .await
        .expect("import");

    assert_eq!(report.succeeded, 2);
    assert!(!report.truncated);
    let resolution = world.resolver.resolve("632002").await.expect("resolved");
    assert_eq!(resolution.zone_id, zone.id);
    assert_eq!(resolution.matched_by, RegionType::Pincode);
}

#[rstest]
#[tokio::test]
async fn directory_import_cut_short_by_page_limit_is_reported(
    tamil_nadu_directory: ScriptedPincodeDirectory,
) {
    let world = World::with_lookup_config(
        tamil_nadu_directory,
        DirectoryLookupConfig {
            page_size: 1,
            max_pages: 2,
            ..DirectoryLookupConfig::default()
        },
    );
    let zone = world.zone(4, Decimal::new(60, 0), (3, 5)).await;

    let report = world
        .assignment
        .import_from_directory(DirectoryImportRequest {
            zone_id: zone.id,
            state_name: "Tamil Nadu".to_owned(),
            district_name: None,
        })
        .await
        .expect("import");

    assert_eq!(report.succeeded, 2);
    assert!(report.truncated);
    assert_eq!(world.directory.queries().len(), 2);
}
