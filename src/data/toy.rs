//! Low-dimensional toy distributions
//!
//! Useful for smoke tests and for watching the generator cover modes in a
//! scatter plot.

use std::f32::consts::PI;

use ndarray::array;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::Normal;
use tch::Tensor;

use super::display::DisplayMode;
use super::sampler::{DataSampler, ImageBatch};
use super::table::TableSampler;
use crate::error::{Error, Result};

/// Two fixed points on the diagonal
pub fn two_point_dataset() -> Result<TableSampler> {
    let data = array![[0.5f32, 0.5], [-0.5, -0.5]];
    TableSampler::new(data, DisplayMode::Points { extent: 1.0, size: 128 })
}

/// Mixture of isotropic Gaussians placed evenly on a circle
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    /// Number of modes
    pub modes: usize,
    /// Radius of the circle the modes sit on
    pub radius: f32,
    /// Standard deviation of each mode
    pub std: f32,
}

impl Default for GaussianMixture {
    fn default() -> Self {
        Self {
            modes: 8,
            radius: 2.0,
            std: 0.02,
        }
    }
}

impl GaussianMixture {
    /// Center of mode `k`
    pub fn center(&self, k: usize) -> (f32, f32) {
        let angle = 2.0 * PI * k as f32 / self.modes as f32;
        (self.radius * angle.cos(), self.radius * angle.sin())
    }

    fn display(&self) -> DisplayMode {
        DisplayMode::Points {
            extent: self.radius * 1.5,
            size: 256,
        }
    }
}

impl DataSampler for GaussianMixture {
    fn x_dim(&self) -> i64 {
        2
    }

    fn sample(&self, batch_size: usize, rng: &mut StdRng) -> Result<Tensor> {
        if self.modes == 0 {
            return Err(Error::InvalidConfig("gaussian mixture needs at least one mode".to_string()));
        }
        let noise = Normal::new(0.0f32, self.std)
            .map_err(|e| Error::InvalidConfig(format!("gaussian mixture std: {e}")))?;

        let mut values = Vec::with_capacity(batch_size * 2);
        for _ in 0..batch_size {
            let (cx, cy) = self.center(rng.gen_range(0..self.modes));
            values.push(cx + rng.sample(noise));
            values.push(cy + rng.sample(noise));
        }
        Ok(Tensor::from_slice(&values).view([batch_size as i64, 2]))
    }

    fn to_display(&self, samples: &Tensor) -> Result<ImageBatch> {
        self.display().render(samples)
    }
}
