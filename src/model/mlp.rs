//! Fully connected generator and critic
//!
//! Works for any flattened sample size, so it is the default model for both
//! toy points and MNIST digits.

use tch::{nn, nn::Module, nn::ModuleT, Tensor};

use super::gan::{CriticNet, GeneratorNet, ModelDims, OutputActivation, NUM_CLASSES};
use crate::error::{Error, Result};

/// Generator: stack of ReLU linear layers followed by the output activation
#[derive(Debug)]
pub struct MlpGenerator {
    hidden: Vec<nn::Linear>,
    out: nn::Linear,
    z_dim: i64,
    x_dim: i64,
    activation: OutputActivation,
}

impl MlpGenerator {
    pub fn new(vs: &nn::Path, dims: &ModelDims) -> Self {
        let mut hidden = Vec::with_capacity(dims.hidden_layers);
        let mut in_dim = dims.z_dim;
        for i in 0..dims.hidden_layers {
            hidden.push(nn::linear(vs / format!("fc{i}"), in_dim, dims.hidden_dim, Default::default()));
            in_dim = dims.hidden_dim;
        }
        let out = nn::linear(vs / "out", in_dim, dims.x_dim, Default::default());

        Self {
            hidden,
            out,
            z_dim: dims.z_dim,
            x_dim: dims.x_dim,
            activation: dims.output,
        }
    }
}

impl ModuleT for MlpGenerator {
    fn forward_t(&self, xs: &Tensor, _train: bool) -> Tensor {
        let x = self
            .hidden
            .iter()
            .fold(xs.shallow_clone(), |x, layer| layer.forward(&x).relu());
        self.activation.apply(self.out.forward(&x))
    }
}

impl GeneratorNet for MlpGenerator {
    fn z_dim(&self) -> i64 {
        self.z_dim
    }

    fn x_dim(&self) -> i64 {
        self.x_dim
    }
}

/// Critic: stack of LeakyReLU linear layers ending in two class logits
#[derive(Debug)]
pub struct MlpCritic {
    hidden: Vec<nn::Linear>,
    out: nn::Linear,
    x_dim: i64,
}

impl MlpCritic {
    pub fn new(vs: &nn::Path, dims: &ModelDims) -> Self {
        let mut hidden = Vec::with_capacity(dims.hidden_layers);
        let mut in_dim = dims.x_dim;
        for i in 0..dims.hidden_layers {
            hidden.push(nn::linear(vs / format!("fc{i}"), in_dim, dims.hidden_dim, Default::default()));
            in_dim = dims.hidden_dim;
        }
        let out = nn::linear(vs / "out", in_dim, NUM_CLASSES, Default::default());

        Self {
            hidden,
            out,
            x_dim: dims.x_dim,
        }
    }
}

impl ModuleT for MlpCritic {
    fn forward_t(&self, xs: &Tensor, _train: bool) -> Tensor {
        let x = self
            .hidden
            .iter()
            .fold(xs.shallow_clone(), |x, layer| layer.forward(&x).leaky_relu());
        self.out.forward(&x)
    }
}

impl CriticNet for MlpCritic {
    fn x_dim(&self) -> i64 {
        self.x_dim
    }
}

/// Registry factory for the `mlp` model
pub fn build_pair(
    gen_vs: &nn::Path,
    critic_vs: &nn::Path,
    dims: &ModelDims,
) -> Result<(Box<dyn GeneratorNet>, Box<dyn CriticNet>)> {
    if dims.z_dim <= 0 || dims.x_dim <= 0 || dims.hidden_dim <= 0 {
        return Err(Error::InvalidConfig(format!(
            "mlp needs positive sizes, got z_dim={} x_dim={} hidden_dim={}",
            dims.z_dim, dims.x_dim, dims.hidden_dim
        )));
    }
    Ok((
        Box::new(MlpGenerator::new(gen_vs, dims)),
        Box::new(MlpCritic::new(critic_vs, dims)),
    ))
}
