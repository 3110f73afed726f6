//! In-memory dataset sampled row by row
//!
//! Holds the full dataset as an `(num_samples, x_dim)` table and draws
//! random rows with replacement, so any batch size works even for tiny
//! datasets.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::Rng;
use tch::Tensor;

use super::display::DisplayMode;
use super::sampler::{DataSampler, ImageBatch, ImageShape};
use crate::error::{Error, Result};

/// Dataset backed by a dense table of samples
pub struct TableSampler {
    /// Full dataset of shape (num_samples, x_dim)
    data: Array2<f32>,
    /// How samples are rendered for visualization
    display: DisplayMode,
}

impl TableSampler {
    /// Create a sampler over `data`
    ///
    /// # Arguments
    ///
    /// * `data` - 2D array of shape (num_samples, x_dim)
    /// * `display` - Conversion used by `to_display`
    pub fn new(data: Array2<f32>, display: DisplayMode) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(Error::InvalidConfig(format!(
                "dataset must be non-empty, got shape {:?}",
                data.shape()
            )));
        }
        if let DisplayMode::Images(shape) = display {
            if shape.numel() != data.ncols() as i64 {
                return Err(Error::DimensionMismatch {
                    what: "image size".to_string(),
                    expected: data.ncols() as i64,
                    actual: shape.numel(),
                });
            }
        }
        Ok(Self { data, display })
    }

    /// Get total number of samples
    pub fn num_samples(&self) -> usize {
        self.data.nrows()
    }

    /// Draw `batch_size` row indices uniformly with replacement
    fn draw_indices(&self, batch_size: usize, rng: &mut StdRng) -> Vec<usize> {
        let n = self.num_samples();
        (0..batch_size).map(|_| rng.gen_range(0..n)).collect()
    }
}

impl DataSampler for TableSampler {
    fn x_dim(&self) -> i64 {
        self.data.ncols() as i64
    }

    fn image_shape(&self) -> Option<ImageShape> {
        match self.display {
            DisplayMode::Images(shape) => Some(shape),
            DisplayMode::Points { .. } => None,
        }
    }

    fn sample(&self, batch_size: usize, rng: &mut StdRng) -> Result<Tensor> {
        let indices = self.draw_indices(batch_size, rng);
        let batch = self.data.select(Axis(0), &indices);
        let values: Vec<f32> = batch.iter().copied().collect();
        Ok(Tensor::from_slice(&values).view([batch_size as i64, self.x_dim()]))
    }

    fn to_display(&self, samples: &Tensor) -> Result<ImageBatch> {
        self.display.render(samples)
    }
}
