//! Sampler interfaces consumed by the trainer
//!
//! Real data and latent noise both come through these traits. Every draw
//! takes the caller's random source so that a run seeded once is fully
//! reproducible.

use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{StandardNormal, Uniform};
use tch::{Device, Tensor};

use crate::error::Result;

/// Create the random source shared by both samplers
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Layout of an image sample before flattening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub channels: i64,
    pub height: i64,
    pub width: i64,
}

impl ImageShape {
    /// Number of values in one flattened sample
    pub fn numel(&self) -> i64 {
        self.channels * self.height * self.width
    }
}

/// Samples converted to something that can be drawn on screen
#[derive(Debug, Clone, Default)]
pub struct ImageBatch {
    pub images: Vec<GrayImage>,
}

impl ImageBatch {
    pub fn new(images: Vec<GrayImage>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Source of real training samples
pub trait DataSampler {
    /// Size of one flattened sample
    fn x_dim(&self) -> i64;

    /// Image layout of a sample, if the data are images
    fn image_shape(&self) -> Option<ImageShape> {
        None
    }

    /// Draw `batch_size` samples as a `[batch_size, x_dim]` float tensor on the CPU
    fn sample(&self, batch_size: usize, rng: &mut StdRng) -> Result<Tensor>;

    /// Convert raw samples (real or generated) into displayable images
    fn to_display(&self, samples: &Tensor) -> Result<ImageBatch>;
}

/// Source of latent noise vectors
pub trait NoiseSampler {
    /// Draw a `[batch_size, z_dim]` float tensor on the CPU
    fn sample(&self, batch_size: usize, z_dim: i64, rng: &mut StdRng) -> Tensor;
}

/// Noise drawn uniformly from `[low, high)`
#[derive(Debug, Clone)]
pub struct UniformNoise {
    pub low: f32,
    pub high: f32,
}

impl Default for UniformNoise {
    fn default() -> Self {
        Self {
            low: -1.0,
            high: 1.0,
        }
    }
}

impl NoiseSampler for UniformNoise {
    fn sample(&self, batch_size: usize, z_dim: i64, rng: &mut StdRng) -> Tensor {
        let dist = Uniform::new(self.low, self.high);
        let values: Vec<f32> = (0..batch_size * z_dim as usize)
            .map(|_| rng.sample(dist))
            .collect();
        Tensor::from_slice(&values).view([batch_size as i64, z_dim])
    }
}

/// Standard normal noise
#[derive(Debug, Clone, Default)]
pub struct GaussianNoise;

impl NoiseSampler for GaussianNoise {
    fn sample(&self, batch_size: usize, z_dim: i64, rng: &mut StdRng) -> Tensor {
        let values: Vec<f32> = (0..batch_size * z_dim as usize)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();
        Tensor::from_slice(&values).view([batch_size as i64, z_dim])
    }
}

/// Copy a float tensor into a flat host vector
pub(crate) fn tensor_to_vec(samples: &Tensor) -> Result<Vec<f32>> {
    let flat = samples
        .to_device(Device::Cpu)
        .to_kind(tch::Kind::Float)
        .flatten(0, -1);
    Ok(Vec::<f32>::try_from(&flat)?)
}
