use image::{GenericImageView, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use photo_index::config::Config;
use photo_index::image_backend::{font_candidates, ImageBackend};
use photo_index::index_generator::generate;
use photo_index::layout::LayoutParams;
use photo_index::reporter::LogReporter;

fn write_png(path: &Path, width: u32, height: u32, color: Rgb<u8>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, color).save(path).unwrap();
}

fn backend() -> ImageBackend {
    ImageBackend::from_font_candidates(&font_candidates(&[]), 14.0)
}

#[test]
fn test_renders_real_sheet_to_jpeg() {
    // GIVEN: Two solid-colour photos in one month
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_png(&root.join("2024-04/red.png"), 80, 40, Rgb([220, 0, 0]));
    write_png(&root.join("2024-04/blue.png"), 40, 80, Rgb([0, 0, 220]));

    let mut config = Config::for_root(root);
    config.layout = LayoutParams::new(2, 60, 60, 200, Rgb([255, 255, 255])).unwrap();

    // WHEN: Generating with the pixel backend
    let summary = generate(&config, &backend(), &LogReporter).unwrap();

    // THEN: One JPEG sheet with two cells side by side
    let output = root.join("2024/index_2024-04.jpg");
    assert_eq!(summary.outputs, vec![output.clone()]);
    assert_eq!(summary.cells_skipped, 0);

    let sheet = image::open(&output).unwrap();
    assert_eq!(sheet.dimensions(), (160, 120));

    // Files are placed in path order: blue.png first
    let first_cell = sheet.get_pixel(30, 20);
    assert!(first_cell[2] > 150 && first_cell[0] < 80, "{:?}", first_cell);
    let second_cell = sheet.get_pixel(110, 20);
    assert!(second_cell[0] > 150 && second_cell[2] < 80, "{:?}", second_cell);

    // Background stays white outside the thumbnails
    let corner = sheet.get_pixel(2, 2);
    assert!(corner[0] > 230 && corner[1] > 230 && corner[2] > 230, "{:?}", corner);
}

#[test]
fn test_corrupt_file_is_skipped_in_real_render() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_png(&root.join("2019-08/a.png"), 30, 30, Rgb([0, 200, 0]));
    fs::write(root.join("2019-08/b.jpg"), b"definitely not a jpeg").unwrap();

    let mut config = Config::for_root(root);
    config.layout = LayoutParams::new(4, 50, 50, 200, Rgb([255, 255, 255])).unwrap();

    let summary = generate(&config, &backend(), &LogReporter).unwrap();

    assert_eq!(summary.pages_written, 1);
    assert_eq!(summary.cells_skipped, 1);
    let sheet = image::open(root.join("2019/index_2019-08.jpg")).unwrap();
    assert_eq!(sheet.dimensions(), (140, 110));
}
