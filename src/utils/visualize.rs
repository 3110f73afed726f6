//! Sample grid rendering
//!
//! Tiles a batch of display images into one square-ish grid and writes it
//! as PNG under `<log_dir>/<dataset>/<model>/`.

use std::path::{Path, PathBuf};

use image::{imageops, GrayImage, Luma};

use crate::data::ImageBatch;
use crate::error::{Error, Result};

/// Gap between tiles, in pixels
const PADDING: u32 = 2;
/// Gray level of the gaps
const BACKGROUND: u8 = 64;

/// Directory holding all snapshots of one dataset/model run
pub fn run_dir(log_dir: &Path, dataset: &str, model: &str) -> PathBuf {
    log_dir.join(dataset).join(model)
}

/// File of snapshot number `index` inside a run directory
pub fn snapshot_path(run_dir: &Path, index: usize) -> PathBuf {
    run_dir.join(format!("{index}.png"))
}

/// Tile `batch` into a grid with `ceil(sqrt(n))` columns
pub fn render_grid(batch: &ImageBatch) -> Result<GrayImage> {
    if batch.is_empty() {
        return Err(Error::InvalidConfig("cannot render an empty image batch".to_string()));
    }

    let n = batch.len() as u32;
    let cols = (n as f64).sqrt().ceil() as u32;
    let rows = n.div_ceil(cols);
    let tile_w = batch.images.iter().map(|img| img.width()).max().unwrap_or(0);
    let tile_h = batch.images.iter().map(|img| img.height()).max().unwrap_or(0);

    let width = cols * tile_w + (cols + 1) * PADDING;
    let height = rows * tile_h + (rows + 1) * PADDING;
    let mut grid = GrayImage::from_pixel(width, height, Luma([BACKGROUND]));

    for (i, img) in batch.images.iter().enumerate() {
        let (r, c) = (i as u32 / cols, i as u32 % cols);
        let x = PADDING + c * (tile_w + PADDING);
        let y = PADDING + r * (tile_h + PADDING);
        imageops::replace(&mut grid, img, x as i64, y as i64);
    }

    Ok(grid)
}

/// Render `batch` and write it to `path`, creating parent directories
pub fn save_grid(batch: &ImageBatch, path: &Path) -> Result<()> {
    let grid = render_grid(batch)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    grid.save(path)?;
    tracing::debug!("Saved sample grid to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize, w: u32, h: u32) -> ImageBatch {
        ImageBatch::new((0..n).map(|_| GrayImage::from_pixel(w, h, Luma([255]))).collect())
    }

    #[test]
    fn test_grid_dimensions() {
        // 5 tiles -> 3 columns, 2 rows
        let grid = render_grid(&batch(5, 4, 3)).unwrap();
        assert_eq!(grid.width(), 3 * 4 + 4 * PADDING);
        assert_eq!(grid.height(), 2 * 3 + 3 * PADDING);

        // First tile starts after the padding
        assert_eq!(grid.get_pixel(PADDING, PADDING)[0], 255);
        assert_eq!(grid.get_pixel(0, 0)[0], BACKGROUND);
    }

    #[test]
    fn test_single_tile() {
        let grid = render_grid(&batch(1, 28, 28)).unwrap();
        assert_eq!(grid.dimensions(), (28 + 2 * PADDING, 28 + 2 * PADDING));
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(render_grid(&ImageBatch::default()).is_err());
    }

    #[test]
    fn test_snapshot_path() {
        let dir = run_dir(Path::new("logs"), "mnist", "mlp");
        assert_eq!(dir, PathBuf::from("logs/mnist/mlp"));
        assert_eq!(snapshot_path(&dir, 7), PathBuf::from("logs/mnist/mlp/7.png"));
    }

    #[test]
    fn test_save_grid_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(&run_dir(dir.path(), "toy", "mlp"), 0);

        save_grid(&batch(4, 8, 8), &path).unwrap();

        assert!(path.exists());
        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), (2 * 8 + 3 * PADDING, 2 * 8 + 3 * PADDING));
    }
}
