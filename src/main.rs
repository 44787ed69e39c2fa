//! Command line driver for the photo catalog.

use std::path::PathBuf;

use photocat::config::{self, CatalogSettings};
use photocat::creation::AssetCreationService;
use photocat::logging;
use photocat::repository::{CatalogRepository, capture_local_offset, format_date, parse_date};
use photocat::sync::{CatalogAssetsService, CatalogChange, CatalogReason};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    capture_local_offset();
    if let Err(err) = logging::init("info") {
        eprintln!("Logging disabled: {err}");
    }
    let mut settings = match &options.config {
        Some(path) => config::load_from_path(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(batch_size) = options.batch_size {
        settings.catalog_batch_size = batch_size;
    }

    match options.command {
        Command::Sync => sync(&settings),
        Command::Backups => list_backups(&settings),
        Command::Restore(date) => restore(&settings, &date),
    }
}

fn open_repository(settings: &CatalogSettings) -> Result<CatalogRepository, String> {
    let catalog_dir = settings
        .catalog_directory()
        .map_err(|err| err.to_string())?;
    CatalogRepository::open(&catalog_dir).map_err(|err| err.to_string())
}

fn sync(settings: &CatalogSettings) -> Result<(), String> {
    let repository = open_repository(settings)?;
    let creation = AssetCreationService::from_settings(settings);
    let mut service =
        CatalogAssetsService::new(repository, creation, settings).map_err(|err| err.to_string())?;
    let mut report = |change: &CatalogChange| match change.reason {
        CatalogReason::AssetNotCreated | CatalogReason::FolderFailed => {
            tracing::warn!("{}", change.message)
        }
        CatalogReason::FolderInspecting
        | CatalogReason::AssetCreated
        | CatalogReason::AssetUpdated
        | CatalogReason::AssetDeleted => tracing::debug!("{}", change.message),
        _ => tracing::info!("{}", change.message),
    };
    let stats = service
        .catalog_assets(Some(&mut report), None)
        .map_err(|err| err.to_string())?;
    println!(
        "Created {}, updated {}, deleted {}, skipped {} in {} folder(s){}",
        stats.created,
        stats.updated,
        stats.deleted,
        stats.not_created,
        stats.folders_inspected,
        if stats.deferred {
            "; more work remains for the next run"
        } else {
            ""
        }
    );
    Ok(())
}

fn list_backups(settings: &CatalogSettings) -> Result<(), String> {
    let repository = open_repository(settings)?;
    let dates = repository
        .backup_dates()
        .map_err(|err| err.to_string())?;
    if dates.is_empty() {
        println!("No backups in {}", repository.backups().dir().display());
        return Ok(());
    }
    for date in dates {
        println!("{}", format_date(date).map_err(|err| err.to_string())?);
    }
    Ok(())
}

fn restore(settings: &CatalogSettings, date: &str) -> Result<(), String> {
    let date = parse_date(date).map_err(|err| err.to_string())?;
    let mut repository = open_repository(settings)?;
    repository
        .restore_backup(date)
        .map_err(|err| err.to_string())?;
    println!(
        "Restored catalog revision {} from {}",
        repository.revision(),
        repository.catalog_dir().display()
    );
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Sync,
    Backups,
    Restore(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config: Option<PathBuf>,
    batch_size: Option<usize>,
    command: Command,
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut config: Option<PathBuf> = None;
    let mut batch_size: Option<usize> = None;
    let mut command: Option<Command> = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--batch-size" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--batch-size requires a value".to_string())?;
                let parsed = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --batch-size value: {value}"))?;
                batch_size = Some(parsed);
            }
            "sync" if command.is_none() => command = Some(Command::Sync),
            "backups" if command.is_none() => command = Some(Command::Backups),
            "restore" if command.is_none() => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "restore requires a YYYYMMDD date".to_string())?;
                command = Some(Command::Restore(value.clone()));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(CliOptions {
        config,
        batch_size,
        command: command.unwrap_or(Command::Sync),
    }))
}

fn help_text() -> String {
    [
        "photocat",
        "",
        "Usage:",
        "  photocat [--config <file>] [--batch-size <n>] [sync]",
        "  photocat [--config <file>] backups",
        "  photocat [--config <file>] restore <YYYYMMDD>",
    ]
    .join("\n")
}
