//! # Wasserstein GAN with weight clipping
//!
//! Trains a generator against a weight-clipped critic on a named dataset,
//! periodically writing grids of generated samples.
//!
//! ## Modules
//!
//! - `data`: Real-data and noise samplers, sample display
//! - `model`: Generator/critic architectures and the `GanPair`
//! - `registry`: Dataset and model lookup by identifier
//! - `training`: Batch assembly, clipping, losses and the training loop
//! - `utils`: Configuration and sample grids

pub mod data;
pub mod error;
pub mod model;
pub mod registry;
pub mod training;
pub mod utils;

pub use data::{DataSampler, NoiseSampler};
pub use error::{Error, Result};
pub use model::{GanPair, ModelDims};
pub use training::{Trainer, TrainingConfig, TrainingMetrics};
pub use utils::Config;
