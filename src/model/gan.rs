//! Generator/critic pair
//!
//! Each network owns its own `VarStore`, so an optimizer built on one store
//! can only ever move that network's parameters. The stacked model
//! `critic(generator(z))` is evaluated on the fly and owns nothing.

use serde::{Deserialize, Serialize};
use tch::nn::{self, ModuleT, OptimizerConfig, VarStore};
use tch::{Device, Kind, Tensor};

use crate::data::ImageShape;
use crate::error::{Error, Result};
use crate::training::clip_weights;

/// Number of critic output classes (`[fake, real]`)
pub const NUM_CLASSES: i64 = 2;

/// Final activation of a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputActivation {
    /// Values in `(0, 1)`, e.g. pixel intensities
    Sigmoid,
    /// Values in `(-1, 1)`
    Tanh,
    /// Unbounded values, e.g. point coordinates
    Linear,
}

impl OutputActivation {
    pub fn apply(&self, xs: Tensor) -> Tensor {
        match self {
            OutputActivation::Sigmoid => xs.sigmoid(),
            OutputActivation::Tanh => xs.tanh(),
            OutputActivation::Linear => xs,
        }
    }
}

/// Shapes and sizes a model factory needs to build both networks
#[derive(Debug, Clone)]
pub struct ModelDims {
    /// Latent vector size
    pub z_dim: i64,
    /// Flattened sample size
    pub x_dim: i64,
    /// Image layout of a sample, when the data are images
    pub image_shape: Option<ImageShape>,
    /// Generator output activation
    pub output: OutputActivation,
    /// Width of hidden layers
    pub hidden_dim: i64,
    /// Number of hidden layers
    pub hidden_layers: usize,
}

/// Network mapping noise `[batch, z_dim]` to samples `[batch, x_dim]`
pub trait GeneratorNet: ModuleT {
    fn z_dim(&self) -> i64;
    fn x_dim(&self) -> i64;
}

/// Network mapping samples `[batch, x_dim]` to `[batch, 2]` class logits
pub trait CriticNet: ModuleT {
    fn x_dim(&self) -> i64;
}

/// RMSProp hyperparameters (Keras defaults)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmsPropConfig {
    pub learning_rate: f64,
    pub alpha: f64,
    pub eps: f64,
}

impl Default for RmsPropConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            alpha: 0.9,
            eps: 1e-7,
        }
    }
}

impl RmsPropConfig {
    /// Build an optimizer scoped to the trainable variables of `vs`
    pub fn build(&self, vs: &VarStore) -> Result<nn::Optimizer> {
        let opt = nn::RmsProp {
            alpha: self.alpha,
            eps: self.eps,
            wd: 0.0,
            momentum: 0.0,
            centered: false,
        }
        .build(vs, self.learning_rate)?;
        Ok(opt)
    }
}

/// Complete WGAN model
pub struct GanPair {
    /// Generator network
    pub generator: Box<dyn GeneratorNet>,
    /// Critic network
    pub critic: Box<dyn CriticNet>,
    /// Variable store for generator
    pub gen_vs: VarStore,
    /// Variable store for critic
    pub critic_vs: VarStore,
    /// Device (CPU/GPU)
    pub device: Device,
}

/// Factory building both networks under their variable-store roots
pub type PairFactory =
    fn(&nn::Path, &nn::Path, &ModelDims) -> Result<(Box<dyn GeneratorNet>, Box<dyn CriticNet>)>;

impl GanPair {
    /// Create a new pair and check that the two networks fit together
    pub fn new(factory: PairFactory, dims: &ModelDims, device: Device) -> Result<Self> {
        let gen_vs = VarStore::new(device);
        let critic_vs = VarStore::new(device);

        let (generator, critic) = factory(&gen_vs.root(), &critic_vs.root(), dims)?;

        let pair = Self {
            generator,
            critic,
            gen_vs,
            critic_vs,
            device,
        };
        pair.check_dims(dims)?;
        Ok(pair)
    }

    /// Get latent dimension
    pub fn z_dim(&self) -> i64 {
        self.generator.z_dim()
    }

    /// Get flattened sample size
    pub fn x_dim(&self) -> i64 {
        self.generator.x_dim()
    }

    /// Run one probe batch through the stack and compare every shape
    fn check_dims(&self, dims: &ModelDims) -> Result<()> {
        let mismatch = |what: &str, expected: i64, actual: i64| Error::DimensionMismatch {
            what: what.to_string(),
            expected,
            actual,
        };

        if self.generator.z_dim() != dims.z_dim {
            return Err(mismatch("generator input", dims.z_dim, self.generator.z_dim()));
        }
        if self.generator.x_dim() != dims.x_dim {
            return Err(mismatch("generator output", dims.x_dim, self.generator.x_dim()));
        }
        if self.critic.x_dim() != dims.x_dim {
            return Err(mismatch("critic input", dims.x_dim, self.critic.x_dim()));
        }

        let noise = Tensor::zeros([2, dims.z_dim], (Kind::Float, self.device));
        let samples = self.generate(&noise);
        let produced = samples.size().last().copied().unwrap_or(0);
        if produced != dims.x_dim {
            return Err(mismatch("generated sample", dims.x_dim, produced));
        }
        let scores = self.classify(&samples);
        let classes = scores.size().last().copied().unwrap_or(0);
        if classes != NUM_CLASSES {
            return Err(mismatch("critic classes", NUM_CLASSES, classes));
        }
        Ok(())
    }

    /// Generate samples from noise (inference mode, no gradient)
    pub fn generate(&self, noise: &Tensor) -> Tensor {
        let noise = noise.to_device(self.device);
        tch::no_grad(|| self.generator.forward_t(&noise, false))
    }

    /// Class scores `[p_fake, p_real]` per sample (inference mode, no gradient)
    pub fn classify(&self, samples: &Tensor) -> Tensor {
        let samples = samples.to_device(self.device);
        tch::no_grad(|| self.critic.forward_t(&samples, false).softmax(-1, Kind::Float))
    }

    /// Critic logits with gradient tracking
    pub fn critic_logits(&self, samples: &Tensor) -> Tensor {
        self.critic.forward_t(samples, true)
    }

    /// Logits of the stacked model `critic(generator(noise))` with gradient tracking
    pub fn stacked_logits(&self, noise: &Tensor) -> Tensor {
        let fake = self.generator.forward_t(noise, true);
        self.critic.forward_t(&fake, true)
    }

    /// RMSProp optimizer over the critic parameters only
    pub fn critic_optimizer(&self, config: &RmsPropConfig) -> Result<nn::Optimizer> {
        config.build(&self.critic_vs)
    }

    /// RMSProp optimizer over the generator parameters only
    pub fn generator_optimizer(&self, config: &RmsPropConfig) -> Result<nn::Optimizer> {
        config.build(&self.gen_vs)
    }

    /// Deep copy of every critic variable, sorted by name
    pub fn critic_parameters(&self) -> Vec<(String, Tensor)> {
        snapshot(&self.critic_vs)
    }

    /// Deep copy of every generator variable, sorted by name
    pub fn generator_parameters(&self) -> Vec<(String, Tensor)> {
        snapshot(&self.gen_vs)
    }

    /// Clamp every critic weight into `[-limit, limit]`
    pub fn clip_critic(&self, limit: f64) {
        clip_weights(&self.critic_vs, limit);
    }

    /// Overwrite critic variables by name
    pub fn set_critic_parameters(&mut self, params: &[(String, Tensor)]) -> Result<()> {
        let variables = self.critic_vs.variables();
        tch::no_grad(|| -> Result<()> {
            for (name, value) in params {
                let mut var = variables.get(name).map(|t| t.shallow_clone()).ok_or_else(|| {
                    Error::InvalidConfig(format!("critic has no parameter named '{name}'"))
                })?;
                var.f_copy_(value)?;
            }
            Ok(())
        })
    }

    /// Number of trainable scalars in (generator, critic)
    pub fn parameter_counts(&self) -> (i64, i64) {
        (count(&self.gen_vs), count(&self.critic_vs))
    }
}

fn snapshot(vs: &VarStore) -> Vec<(String, Tensor)> {
    let mut params: Vec<(String, Tensor)> = vs
        .variables()
        .into_iter()
        .map(|(name, var)| (name, var.detach().copy()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

fn count(vs: &VarStore) -> i64 {
    vs.trainable_variables().iter().map(|t| t.numel() as i64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mlp;

    fn dims() -> ModelDims {
        ModelDims {
            z_dim: 3,
            x_dim: 2,
            image_shape: None,
            output: OutputActivation::Linear,
            hidden_dim: 8,
            hidden_layers: 1,
        }
    }

    #[test]
    fn test_pair_creation() {
        let pair = GanPair::new(mlp::build_pair, &dims(), Device::Cpu).unwrap();

        assert_eq!(pair.z_dim(), 3);
        assert_eq!(pair.x_dim(), 2);
        let (g, c) = pair.parameter_counts();
        // 3*8+8 + 8*2+2 and 2*8+8 + 8*2+2
        assert_eq!(g, 50);
        assert_eq!(c, 42);
    }

    #[test]
    fn test_pair_generate_and_classify() {
        let pair = GanPair::new(mlp::build_pair, &dims(), Device::Cpu).unwrap();

        let noise = Tensor::randn([4, 3], (Kind::Float, Device::Cpu));
        let samples = pair.generate(&noise);
        assert_eq!(samples.size(), vec![4, 2]);
        assert!(!samples.requires_grad());

        let scores = pair.classify(&samples);
        assert_eq!(scores.size(), vec![4, 2]);
        let row_sums = scores.sum_dim_intlist([-1i64].as_slice(), false, Kind::Float);
        assert!(row_sums.allclose(&Tensor::ones([4], (Kind::Float, Device::Cpu)), 1e-5, 1e-6, false));
    }

    #[test]
    fn test_set_critic_parameters() {
        let mut pair = GanPair::new(mlp::build_pair, &dims(), Device::Cpu).unwrap();

        let zeroed: Vec<(String, Tensor)> = pair
            .critic_parameters()
            .into_iter()
            .map(|(name, t)| (name, t.zeros_like()))
            .collect();
        pair.set_critic_parameters(&zeroed).unwrap();

        for (_, t) in pair.critic_parameters() {
            assert_eq!(t.abs().sum(Kind::Float).double_value(&[]), 0.0);
        }

        let bogus = vec![("nope".to_string(), Tensor::zeros([1], (Kind::Float, Device::Cpu)))];
        assert!(pair.set_critic_parameters(&bogus).is_err());
    }

    #[test]
    fn test_clip_critic_leaves_generator() {
        let pair = GanPair::new(mlp::build_pair, &dims(), Device::Cpu).unwrap();
        let gen_before = pair.generator_parameters();

        pair.clip_critic(0.001);

        for (_, t) in pair.critic_parameters() {
            assert!(t.abs().max().double_value(&[]) <= 0.001 + 1e-9);
        }
        for ((_, a), (_, b)) in gen_before.iter().zip(pair.generator_parameters().iter()) {
            assert!(a.equal(b));
        }
    }

    #[test]
    fn test_dimension_mismatch_detected() {
        let mut bad = dims();
        bad.x_dim = 0;
        assert!(GanPair::new(mlp::build_pair, &bad, Device::Cpu).is_err());
    }
}
