//! Assembly of labeled training batches
//!
//! Labels are positional: a critic batch is always real rows first, then
//! fake rows, and the label matrix follows the same order.

use std::fmt;

use rand::rngs::StdRng;
use tch::{Device, Tensor};

use crate::data::{DataSampler, NoiseSampler};
use crate::error::{Error, Result};
use crate::model::{GanPair, NUM_CLASSES};

/// One-hot row marking a real sample (`[fake, real]` layout)
pub const REAL_LABEL: [f32; 2] = [0.0, 1.0];
/// One-hot row marking a generated sample
pub const FAKE_LABEL: [f32; 2] = [1.0, 0.0];

/// Which network an update trains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Critic alone, on real and generated samples
    Critic,
    /// Generator through the frozen critic
    Generator,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Critic => write!(f, "critic"),
            Phase::Generator => write!(f, "generator"),
        }
    }
}

/// Inputs and one-hot labels for a single update
#[derive(Debug)]
pub struct TrainPair {
    pub inputs: Tensor,
    pub labels: Tensor,
}

/// Builds `TrainPair`s from the samplers and the current generator
pub struct PairAssembler {
    data: Box<dyn DataSampler>,
    noise: Box<dyn NoiseSampler>,
    rng: StdRng,
    z_dim: i64,
    device: Device,
}

impl PairAssembler {
    pub fn new(
        data: Box<dyn DataSampler>,
        noise: Box<dyn NoiseSampler>,
        rng: StdRng,
        z_dim: i64,
        device: Device,
    ) -> Self {
        Self {
            data,
            noise,
            rng,
            z_dim,
            device,
        }
    }

    /// Real-data sampler, also used for display conversion
    pub fn data(&self) -> &dyn DataSampler {
        self.data.as_ref()
    }

    /// Draw a bare noise batch on the training device
    pub fn noise(&mut self, batch_size: usize) -> Tensor {
        self.noise
            .sample(batch_size, self.z_dim, &mut self.rng)
            .to_device(self.device)
    }

    /// Build the batch for one update of `phase`
    ///
    /// * `Phase::Critic`: `2 * batch_size` inputs, real then fake, generated
    ///   with the current generator in inference mode
    /// * `Phase::Generator`: `batch_size` noise vectors, all labeled real
    pub fn build(&mut self, phase: Phase, batch_size: usize, pair: &GanPair) -> Result<TrainPair> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be > 0".to_string()));
        }

        match phase {
            Phase::Critic => {
                let real = self
                    .data
                    .sample(batch_size, &mut self.rng)?
                    .to_device(self.device);
                let noise = self.noise(batch_size);
                let fake = pair.generate(&noise);

                let inputs = Tensor::cat(&[real, fake], 0);
                let labels = label_rows(&[(REAL_LABEL, batch_size), (FAKE_LABEL, batch_size)])
                    .to_device(self.device);
                Ok(TrainPair { inputs, labels })
            }
            Phase::Generator => {
                let inputs = self.noise(batch_size);
                let labels = label_rows(&[(REAL_LABEL, batch_size)]).to_device(self.device);
                Ok(TrainPair { inputs, labels })
            }
        }
    }
}

/// Stack runs of identical one-hot rows into a `[rows, 2]` matrix
fn label_rows(runs: &[([f32; 2], usize)]) -> Tensor {
    let total: usize = runs.iter().map(|(_, n)| n).sum();
    let mut values = Vec::with_capacity(total * NUM_CLASSES as usize);
    for (row, n) in runs {
        for _ in 0..*n {
            values.extend_from_slice(row);
        }
    }
    Tensor::from_slice(&values).view([total as i64, NUM_CLASSES])
}
