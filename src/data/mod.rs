//! Data module providing real-data and noise samplers
//!
//! This module provides:
//! - Sampler traits and the seedable random source
//! - Table-backed datasets (MNIST, toy points)
//! - Parametric toy distributions
//! - Conversion of samples into displayable images

mod display;
mod mnist;
mod sampler;
mod table;
mod toy;

pub use display::{images_from_rows, scatter_points, DisplayMode};
pub use mnist::{load_mnist, MNIST_SHAPE};
pub use sampler::{
    seeded_rng, DataSampler, GaussianNoise, ImageBatch, ImageShape, NoiseSampler, UniformNoise,
};
pub use table::TableSampler;
pub use toy::{two_point_dataset, GaussianMixture};
