mod support;

use support::{images::write_test_image, photocat_env::PhotocatEnvGuard};

use photocat::{
    config::{self, CatalogSettings},
    creation::AssetCreationService,
    repository::{CatalogRepository, Repository, today},
    sync::{CatalogAssetsService, CatalogChange, CatalogReason, catalog_in_background},
};
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tempfile::TempDir;

struct SyncHarness {
    _config: PhotocatEnvGuard,
    _temp: TempDir,
    assets: PathBuf,
    settings: CatalogSettings,
}

impl SyncHarness {
    fn new(names: &[&str]) -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        let config_home = temp.path().join("config");
        std::fs::create_dir_all(&config_home).expect("create config dir");
        let env = PhotocatEnvGuard::set_config_home(config_home);

        let assets = temp.path().join("photos");
        for (index, name) in names.iter().enumerate() {
            write_test_image(&assets.join(name), index as u8 * 30);
        }
        let settings = CatalogSettings {
            catalog_batch_size: 50,
            ..CatalogSettings::for_assets(&assets)
        };
        config::save(&settings).expect("save config");
        let settings = config::load_or_default().expect("load config");

        Self {
            _config: env,
            _temp: temp,
            assets,
            settings,
        }
    }

    fn repository(&self) -> CatalogRepository {
        let dir = self
            .settings
            .catalog_directory()
            .expect("resolve catalog dir");
        CatalogRepository::open(dir).expect("open catalog")
    }

    fn service(&self) -> CatalogAssetsService<CatalogRepository> {
        CatalogAssetsService::new(
            self.repository(),
            AssetCreationService::from_settings(&self.settings),
            &self.settings,
        )
        .expect("build service")
    }
}

#[test]
fn catalog_lands_under_the_configured_app_directory() {
    let harness = SyncHarness::new(&["a.png", "b.png", "nested/c.png"]);
    assert_eq!(harness.settings.catalog_batch_size, 50);

    let mut service = harness.service();
    let stats = service.catalog_assets(None, None).expect("sync");
    assert_eq!(stats.created, 3);
    assert!(stats.saved);

    let reopened = harness.repository();
    assert_eq!(reopened.cataloged_assets().len(), 3);
    assert_eq!(
        reopened
            .cataloged_assets_by_path(&harness.assets.join("nested"))
            .len(),
        1
    );
    assert!(reopened.backups().exists_for(today()).expect("check backup"));
}

#[test]
fn restoring_an_older_backup_rewinds_the_catalog() {
    let harness = SyncHarness::new(&["a.png", "b.png"]);
    let mut service = harness.service();
    service.catalog_assets(None, None).expect("first sync");

    let yesterday = today().previous_day().expect("yesterday");
    let backups = service.repository().backups().clone();
    std::fs::copy(
        backups.archive_path(today()).expect("today path"),
        backups.archive_path(yesterday).expect("yesterday path"),
    )
    .expect("copy backup");

    write_test_image(&harness.assets.join("c.png"), 99);
    service.catalog_assets(None, None).expect("second sync");
    assert_eq!(service.repository().cataloged_assets().len(), 3);
    drop(service);

    let mut repository = harness.repository();
    assert_eq!(repository.revision(), 2);
    repository.restore_backup(yesterday).expect("restore");
    assert_eq!(repository.cataloged_assets().len(), 2);
    assert_eq!(repository.revision(), 3);
    assert!(repository.backup_is_out_of_date(today()));

    let mut service = CatalogAssetsService::new(
        repository,
        AssetCreationService::from_settings(&harness.settings),
        &harness.settings,
    )
    .expect("build service");
    let mut reasons = Vec::new();
    let mut listener = |change: &CatalogChange| reasons.push(change.reason);
    let stats = service
        .catalog_assets(Some(&mut listener), None)
        .expect("third sync");
    assert_eq!(stats.created, 1);
    assert!(reasons.contains(&CatalogReason::BackupUpdated));
    assert_eq!(
        backups.list_dates().expect("list backups"),
        vec![yesterday, today()]
    );
}

#[test]
fn background_sync_stops_at_the_next_asset_after_cancel() {
    let harness = SyncHarness::new(&["a.png", "b.png", "c.png", "d.png"]);
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    let running = catalog_in_background(
        harness.service(),
        move |change: &CatalogChange| {
            if change.reason == CatalogReason::AssetCreated {
                flag.store(true, Ordering::SeqCst);
            }
        },
        Arc::clone(&cancel),
    );
    let (service, result) = running.join();
    let stats = result.expect("cancelled sync still returns stats");
    let service = service.expect("worker returns the service");

    assert!(stats.cancelled);
    assert_eq!(stats.created, 1);
    assert!(!stats.saved);
    assert!(service.repository().has_changes());
    assert!(harness.repository().cataloged_assets().is_empty());
}
