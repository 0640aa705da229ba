//! Command-line entry point for scheduled import/sync runs.

use clap::{Parser, Subcommand};
use log::warn;
use residentsync_core::db::open_db;
use residentsync_core::{
    default_log_level, init_logging, load_config, register_builtin_providers, AppConfig,
    CollectReport, LogNotifier, Property, PropertyRepository, ProviderRegistry, Reconciler,
    SqlitePropertyRepository, SqliteStagingRepository, StagingImporter, StagingRepository,
    SyncReport,
};
use rusqlite::Connection;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "residentsync")]
#[command(about = "Import resident snapshots from backend providers and reconcile them")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Register a property so its residents get reconciled
    AddProperty {
        /// External id used by the backend providers
        id: String,
    },
    /// Run every configured provider into the staging table
    Collect,
    /// Reconcile residents against today's staged rows and send welcomes
    Sync,
    /// `collect`, then `sync` only when every provider succeeded
    Run,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("residentsync: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<bool, Box<dyn Error>> {
    let config = load_config(&cli.config)?;
    if let Some(dir) = &config.logging.dir {
        let level = config
            .logging
            .level
            .as_deref()
            .unwrap_or_else(|| default_log_level());
        if let Err(err) = init_logging(level, dir) {
            eprintln!("residentsync: logging disabled: {err}");
        }
    }

    let conn = open_db(&config.database_path)?;
    match &cli.command {
        Command::AddProperty { id } => {
            let property = Property::new(id.as_str());
            SqlitePropertyRepository::try_new(&conn)?.create_property(&property)?;
            println!("added {property} ({})", property.uuid);
            Ok(true)
        }
        Command::Collect => collect(&conn, &config),
        Command::Sync => sync(&conn, &config),
        Command::Run => {
            if !collect(&conn, &config)? {
                // A failed provider staged nothing; syncing now would depart its residents.
                eprintln!("residentsync: collect failed, sync skipped");
                return Ok(false);
            }
            sync(&conn, &config)
        }
    }
}

fn collect(conn: &Connection, config: &AppConfig) -> Result<bool, Box<dyn Error>> {
    let mut registry = ProviderRegistry::new();
    register_builtin_providers(&mut registry, &config.providers)?;
    let importer = StagingImporter::new(&registry, SqliteStagingRepository::try_new(conn)?);
    let report = importer.collect_data();
    print_collect_report(&report);
    Ok(report.is_success())
}

fn sync(conn: &Connection, config: &AppConfig) -> Result<bool, Box<dyn Error>> {
    let report = Reconciler::try_new(conn, LogNotifier)?.sync()?;
    print_sync_report(&report);
    purge_staging(conn, config, &report)?;
    Ok(report.is_success())
}

fn purge_staging(
    conn: &Connection,
    config: &AppConfig,
    report: &SyncReport,
) -> Result<(), Box<dyn Error>> {
    let Some(days) = config.staging.retention_days else {
        return Ok(());
    };
    let Some(cutoff) = report
        .observed_on
        .checked_sub_days(chrono::Days::new(u64::from(days)))
    else {
        warn!("event=staging_purge module=cli status=skipped reason=date_out_of_range");
        return Ok(());
    };
    let purged = SqliteStagingRepository::try_new(conn)?.purge_before(cutoff)?;
    println!("staging: purged {purged} rows observed before {cutoff}");
    Ok(())
}

fn print_collect_report(report: &CollectReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(stats) => println!(
                "collect {}: fetched={} staged={}",
                outcome.provider_id, stats.fetched, stats.staged
            ),
            Err(err) => println!("collect {}: FAILED [{}] {err}", outcome.provider_id, err.code()),
        }
    }
}

fn print_sync_report(report: &SyncReport) {
    println!("sync {}:", report.observed_on);
    for outcome in &report.properties {
        match &outcome.result {
            Ok(changes) => println!(
                "  {}: deactivated={} retained={} updated={} reactivated={} created={}",
                outcome.property_external_id,
                changes.deactivated,
                changes.retained,
                changes.updated,
                changes.reactivated,
                changes.created
            ),
            Err(err) => println!(
                "  {}: FAILED [{}] {err}",
                outcome.property_external_id,
                err.code()
            ),
        }
    }
    println!(
        "  notifications: sent={} failed={}",
        report.notifications.sent,
        report.notifications.failures.len()
    );
    for failure in &report.notifications.failures {
        println!("    [{}] {failure}", failure.code());
    }
}
