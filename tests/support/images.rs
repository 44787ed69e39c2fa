use std::path::Path;

use image::{Rgb, RgbImage};

pub fn write_test_image(path: &Path, seed: u8) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create image parent dirs");
    }
    let image = RgbImage::from_fn(32, 24, |x, y| {
        Rgb([seed, (x * 8) as u8, (y * 10) as u8])
    });
    image.save(path).expect("write test image");
}
