use super::*;
use crate::catalog::{Dimensions, Rotation};
use crate::config::HashAlgorithm;
use image::{Rgb, RgbImage};
use tempfile::tempdir;

fn write_gradient(path: &Path, width: u32, height: u32) {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    image.save(path).unwrap();
}

fn service(hashes: &[HashAlgorithm]) -> AssetCreationService {
    AssetCreationService::new(
        Arc::new(ImageMetadataExtractor::new(200, 150)),
        Arc::new(ConfiguredHashCalculator::new(hashes)),
    )
}

#[test]
fn creates_asset_with_dimensions_thumbnail_and_hash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wide.png");
    write_gradient(&path, 400, 100);
    let folder = Folder::new(dir.path());

    let created = service(&[HashAlgorithm::Content])
        .create_asset(&path, &folder)
        .unwrap();
    let asset = &created.asset;

    assert_eq!(asset.file_name, "wide.png");
    assert_eq!(asset.folder_id, folder.id);
    assert_eq!(asset.file_size, std::fs::metadata(&path).unwrap().len());
    assert_eq!(asset.pixels, Dimensions::new(400, 100));
    assert_eq!(asset.thumbnail_pixels, Dimensions::new(200, 50));
    assert_eq!(asset.rotation, Rotation::None);
    assert!(!asset.rotated.is_set);
    assert!(!asset.corrupted.is_set);
    assert_eq!(asset.hashes.content, Some(content_hash(&path).unwrap()));
    assert!(asset.hashes.difference.is_none());
    assert!(asset.thumbnail_created_at > 0);
    assert!(image::load_from_memory(&created.thumbnail).is_ok());
}

#[test]
fn garbage_bytes_are_reported_as_corrupted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"definitely not a jpeg").unwrap();
    let folder = Folder::new(dir.path());

    let err = service(&[HashAlgorithm::Content])
        .create_asset(&path, &folder)
        .unwrap_err();
    assert!(matches!(err, CreationError::Corrupted { .. }), "{err:?}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let folder = Folder::new(dir.path());
    let err = service(&[HashAlgorithm::Content])
        .create_asset(&dir.path().join("nope.png"), &folder)
        .unwrap_err();
    assert!(matches!(err, CreationError::Io { .. }), "{err:?}");
}

#[test]
fn all_configured_hashes_are_recorded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.png");
    write_gradient(&path, 64, 64);
    let folder = Folder::new(dir.path());

    let created = service(&[
        HashAlgorithm::Content,
        HashAlgorithm::Difference,
        HashAlgorithm::Perceptual,
    ])
    .create_asset(&path, &folder)
    .unwrap();
    let hashes = created.asset.hashes;
    assert_eq!(hashes.content.as_deref().map(str::len), Some(64));
    assert_eq!(hashes.difference.as_deref().map(str::len), Some(16));
    assert_eq!(hashes.perceptual.as_deref().map(str::len), Some(16));
}

#[test]
fn visual_hashes_survive_re_encoding_but_content_hash_does_not() {
    let dir = tempdir().unwrap();
    let png = dir.path().join("a.png");
    let bmp = dir.path().join("a.bmp");
    write_gradient(&png, 128, 96);
    image::open(&png).unwrap().save(&bmp).unwrap();

    let first = image::open(&png).unwrap();
    let second = image::open(&bmp).unwrap();
    assert_eq!(difference_hash(&first), difference_hash(&second));
    assert_eq!(perceptual_hash(&first), perceptual_hash(&second));
    assert_ne!(content_hash(&png).unwrap(), content_hash(&bmp).unwrap());
}

#[test]
fn empty_algorithm_set_is_rejected() {
    let image = image::DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
    let err = ConfiguredHashCalculator::new(&[])
        .calculate(Path::new("unused"), &image)
        .unwrap_err();
    assert!(matches!(err, HashError::NoAlgorithm));
}

#[test]
fn missing_ffmpeg_program_fails_to_spawn() {
    let dir = tempdir().unwrap();
    let extractor = FfmpegFrameExtractor::new(dir.path().join("no-such-ffmpeg"));
    let err = extractor
        .extract_first_frame(&dir.path().join("clip.mp4"), &dir.path().join("out/clip.jpg"))
        .unwrap_err();
    assert!(matches!(err, FrameError::Spawn { .. }), "{err:?}");
    assert!(dir.path().join("out").is_dir());
}
