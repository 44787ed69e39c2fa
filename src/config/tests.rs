use std::path::PathBuf;

use tempfile::tempdir;

use super::defaults::MAX_THUMBNAIL_EDGE;
use super::{CatalogSettings, ConfigError, HashAlgorithm, load_from_path, save_to_path};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let loaded = load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded.catalog_batch_size, 10_000);
    assert_eq!(loaded.hash_algorithms, vec![HashAlgorithm::Content]);
    assert!(!loaded.analyse_videos);
}

#[test]
fn partial_file_fills_remaining_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
assets_directory = "/photos"
catalog_batch_size = 25
hash_algorithms = ["difference", "perceptual"]
analyse_videos = true
"#,
    )
    .unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded.assets_directory, PathBuf::from("/photos"));
    assert_eq!(loaded.catalog_batch_size, 25);
    assert_eq!(
        loaded.hash_algorithms,
        vec![HashAlgorithm::Difference, HashAlgorithm::Perceptual]
    );
    assert!(loaded.analyse_videos);
    assert_eq!(loaded.thumbnail_max_width, 200);
    assert_eq!(loaded.ffmpeg_program, PathBuf::from("ffmpeg"));
}

#[test]
fn normalizes_hash_set_and_thumbnail_bounds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
hash_algorithms = []
thumbnail_max_width = 0
thumbnail_max_height = 100000
"#,
    )
    .unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded.hash_algorithms, vec![HashAlgorithm::Content]);
    assert_eq!(loaded.thumbnail_max_width, 1);
    assert_eq!(loaded.thumbnail_max_height, MAX_THUMBNAIL_EDGE);

    std::fs::write(&path, "hash_algorithms = [\"content\", \"content\"]").unwrap();
    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded.hash_algorithms, vec![HashAlgorithm::Content]);
}

#[test]
fn rejects_unknown_hash_algorithm() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "hash_algorithms = [\"md5\"]").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
}

#[test]
fn save_then_load_preserves_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let settings = CatalogSettings {
        catalog_batch_size: 3,
        analyse_videos: true,
        first_frame_directory: Some(dir.path().join("frames")),
        excluded_directories: vec![dir.path().join("skip")],
        catalog_directory: Some(dir.path().join("catalog")),
        ..CatalogSettings::for_assets(dir.path().join("photos"))
    };

    save_to_path(&settings, &path).unwrap();
    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded, settings);

    let leftovers = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
        .count();
    assert_eq!(leftovers, 0);
}

