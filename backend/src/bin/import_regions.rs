//! Import region assignments from a JSON file or from the pincode directory.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use delivery_zones::domain::ports::{
    BulkImportReport, DirectoryImportRequest, RegionAssignment, ZoneRegistry,
};
use delivery_zones::domain::{
    DirectoryLookup, RegionAssignmentService, ZoneNumber, ZoneRegistryService,
};
use delivery_zones::inbound::import_file::read_import_records;
use delivery_zones::outbound::cache::NoOpResolutionCache;
use delivery_zones::outbound::directory::HttpPincodeDirectory;
use delivery_zones::outbound::persistence::{
    DbPool, DieselRegionRepository, DieselZoneRepository, PoolConfig,
};
use delivery_zones::settings::DeliverySettings;
use ortho_config::OrthoConfig;
use mockable::DefaultClock;
use tokio::runtime::Builder;

/// `import-regions` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "import-regions",
    about = "Assign states, districts, and pincodes to delivery zones in bulk",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `DELIVERY_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    source: ImportSource,
}

#[derive(Debug, Clone, Subcommand)]
enum ImportSource {
    /// Upsert the records of a JSON array file.
    File {
        #[arg(long = "input", value_name = "path")]
        input: PathBuf,
    },
    /// Upsert every pincode the directory lists for a state or district.
    Directory {
        #[arg(long = "zone-number", value_name = "n")]
        zone_number: i64,
        #[arg(long = "state", value_name = "name")]
        state: String,
        #[arg(long = "district", value_name = "name")]
        district: Option<String>,
    },
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    // Settings come from the environment and config files only; the
    // command line belongs to this tool.
    let settings = DeliverySettings::load_from_iter([OsString::from("import-regions")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let database_url = resolve_database_url(args.database_url, settings.database_url())?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let endpoint = settings
        .directory_url()
        .map_err(|error| io::Error::other(format!("invalid directory URL: {error}")))?;
    let directory = HttpPincodeDirectory::new(
        endpoint,
        settings.directory_api_key().map(str::to_owned),
        settings.directory_timeout(),
    )
    .map_err(|error| io::Error::other(format!("create directory client: {error}")))?;

    let clock = Arc::new(DefaultClock);
    // The server's cache lives in another process and expires on its own.
    let cache = Arc::new(NoOpResolutionCache);
    let zones = Arc::new(DieselZoneRepository::new(pool.clone()));
    let regions = Arc::new(DieselRegionRepository::new(pool));
    let lookup = DirectoryLookup::new(
        Arc::new(directory),
        clock.clone(),
        settings.directory_lookup(),
    );
    let registry =
        ZoneRegistryService::new(zones.clone(), regions.clone(), cache.clone(), clock.clone());
    let assignment = RegionAssignmentService::new(zones, regions, lookup, cache, clock);

    let report = match args.source {
        ImportSource::File { input } => {
            let records = read_import_records(&input).map_err(io::Error::other)?;
            assignment
                .bulk_import_regions(records)
                .await
                .map_err(|error| io::Error::other(format!("bulk import failed: {error}")))?
        }
        ImportSource::Directory {
            zone_number,
            state,
            district,
        } => {
            let zone_id = find_zone(&registry, zone_number).await?;
            assignment
                .import_from_directory(DirectoryImportRequest {
                    zone_id,
                    state_name: state,
                    district_name: district,
                })
                .await
                .map_err(|error| io::Error::other(format!("directory import failed: {error}")))?
        }
    };

    print_report(&report)
}

async fn find_zone(
    registry: &dyn ZoneRegistry,
    raw_number: i64,
) -> io::Result<delivery_zones::domain::ZoneId> {
    let zone_number = ZoneNumber::new(raw_number)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error.to_string()))?;
    let zones = registry
        .list_zones()
        .await
        .map_err(|error| io::Error::other(format!("list zones: {error}")))?;
    zones
        .into_iter()
        .find(|zone| zone.zone_number == zone_number)
        .map(|zone| zone.id)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("zone number {zone_number} does not exist"),
            )
        })
}

fn print_report(report: &BulkImportReport) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(report)
        .map_err(|error| io::Error::other(format!("render report: {error}")))?;
    println!("{rendered}");
    Ok(())
}

fn resolve_database_url(explicit: Option<String>, configured: Option<&str>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    configured.map(str::to_owned).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or DELIVERY_DATABASE_URL",
        )
    })
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn explicit_database_url_wins() {
        let url = resolve_database_url(Some("postgres://cli".to_owned()), Some("postgres://env"))
            .expect("url");
        assert_eq!(url, "postgres://cli");
    }

    #[rstest]
    fn blank_explicit_database_url_is_rejected() {
        let error = resolve_database_url(Some("  ".to_owned()), Some("postgres://env"))
            .expect_err("blank url");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn missing_database_url_is_reported() {
        let error = resolve_database_url(None, None).expect_err("missing url");
        assert!(error.to_string().contains("DELIVERY_DATABASE_URL"));
    }

    #[rstest]
    fn parses_directory_subcommand() {
        let args = CliArgs::try_parse_from([
            "import-regions",
            "directory",
            "--zone-number",
            "2",
            "--state",
            "Tamil Nadu",
            "--district",
            "Vellore",
        ])
        .expect("args parse");

        match args.source {
            ImportSource::Directory {
                zone_number,
                state,
                district,
            } => {
                assert_eq!(zone_number, 2);
                assert_eq!(state, "Tamil Nadu");
                assert_eq!(district.as_deref(), Some("Vellore"));
            }
            ImportSource::File { .. } => panic!("expected directory subcommand"),
        }
    }

    #[rstest]
    fn file_subcommand_requires_input() {
        assert!(CliArgs::try_parse_from(["import-regions", "file"]).is_err());
    }
}
