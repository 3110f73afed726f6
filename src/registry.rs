//! Identifier registry for datasets and models
//!
//! The CLI selects collaborators by name. Names are resolved once at startup
//! and unknown names fail immediately with the list of valid ones.

use std::path::PathBuf;

use crate::data::{self, DataSampler, GaussianMixture, GaussianNoise, NoiseSampler, UniformNoise};
use crate::error::{Error, Result};
use crate::model::{conv, mlp, OutputActivation, PairFactory};

/// Everything a dataset contributes to a run
pub struct DatasetBundle {
    /// Real-data sampler
    pub data: Box<dyn DataSampler>,
    /// Noise sampler paired with this dataset
    pub noise: Box<dyn NoiseSampler>,
    /// Generator output activation matching the data range
    pub output: OutputActivation,
    /// Latent size used when the configuration does not set one
    pub default_z_dim: i64,
}

/// Options available to dataset builders
#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    /// Directory holding on-disk datasets
    pub data_dir: PathBuf,
}

/// Registered dataset
pub struct DatasetEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(&DatasetOptions) -> Result<DatasetBundle>,
}

/// Registered model architecture
pub struct ModelEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub factory: PairFactory,
}

/// All known datasets
pub const DATASETS: &[DatasetEntry] = &[
    DatasetEntry {
        name: "mnist",
        description: "MNIST digits read from <data_dir>/mnist",
        build: build_mnist,
    },
    DatasetEntry {
        name: "toy",
        description: "two fixed 2-D points",
        build: build_toy,
    },
    DatasetEntry {
        name: "gaussian_mixture",
        description: "eight 2-D Gaussians on a ring",
        build: build_gaussian_mixture,
    },
];

/// All known models
pub const MODELS: &[ModelEntry] = &[
    ModelEntry {
        name: "mlp",
        description: "fully connected generator and critic",
        factory: mlp::build_pair,
    },
    ModelEntry {
        name: "conv",
        description: "DCGAN-style convolutional pair (image datasets only)",
        factory: conv::build_pair,
    },
];

/// Look up a dataset by identifier
pub fn dataset(name: &str) -> Result<&'static DatasetEntry> {
    DATASETS
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| Error::UnknownDataset {
            name: name.to_string(),
            known: dataset_names().join(", "),
        })
}

/// Look up a model by identifier
pub fn model(name: &str) -> Result<&'static ModelEntry> {
    MODELS
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| Error::UnknownModel {
            name: name.to_string(),
            known: model_names().join(", "),
        })
}

pub fn dataset_names() -> Vec<&'static str> {
    DATASETS.iter().map(|entry| entry.name).collect()
}

pub fn model_names() -> Vec<&'static str> {
    MODELS.iter().map(|entry| entry.name).collect()
}

fn build_mnist(options: &DatasetOptions) -> Result<DatasetBundle> {
    let sampler = data::load_mnist(options.data_dir.join("mnist"))?;
    Ok(DatasetBundle {
        data: Box::new(sampler),
        noise: Box::new(UniformNoise::default()),
        output: OutputActivation::Sigmoid,
        default_z_dim: 100,
    })
}

fn build_toy(_options: &DatasetOptions) -> Result<DatasetBundle> {
    Ok(DatasetBundle {
        data: Box::new(data::two_point_dataset()?),
        noise: Box::new(UniformNoise::default()),
        output: OutputActivation::Linear,
        default_z_dim: 1,
    })
}

fn build_gaussian_mixture(_options: &DatasetOptions) -> Result<DatasetBundle> {
    Ok(DatasetBundle {
        data: Box::new(GaussianMixture::default()),
        noise: Box::new(GaussianNoise),
        output: OutputActivation::Linear,
        default_z_dim: 2,
    })
}
