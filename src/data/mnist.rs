//! MNIST handwritten digits
//!
//! Reads the four IDX files (`train-images-idx3-ubyte`, ...) from a local
//! directory via `tch::vision::mnist`. Pixels are scaled to `[0, 1]`.

use std::path::Path;

use ndarray::Array2;
use tracing::info;

use super::display::DisplayMode;
use super::sampler::{tensor_to_vec, ImageShape};
use super::table::TableSampler;
use crate::error::Result;

/// Layout of one MNIST digit
pub const MNIST_SHAPE: ImageShape = ImageShape {
    channels: 1,
    height: 28,
    width: 28,
};

/// Load the MNIST training images from `dir`
pub fn load_mnist<P: AsRef<Path>>(dir: P) -> Result<TableSampler> {
    let dir = dir.as_ref();
    info!("Loading MNIST from {}", dir.display());

    let dataset = tch::vision::mnist::load_dir(dir)?;
    let images = dataset.train_images;
    let rows = images.size()[0] as usize;
    let values = tensor_to_vec(&images)?;
    let table = Array2::from_shape_vec((rows, MNIST_SHAPE.numel() as usize), values)?;

    info!("Loaded {} MNIST training images", rows);
    TableSampler::new(table, DisplayMode::Images(MNIST_SHAPE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_mnist(dir.path().join("does-not-exist"));
        assert!(result.is_err());
    }

    #[test]
    fn test_mnist_shape() {
        assert_eq!(MNIST_SHAPE.numel(), 784);
    }
}
