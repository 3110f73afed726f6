//! Convolutional generator and critic for image datasets
//!
//! DCGAN-style layout: the generator projects noise to a small feature map
//! and upsamples twice with transposed convolutions, the critic downsamples
//! twice with strided convolutions. Image height and width must be
//! divisible by 4.

use tch::{nn, nn::Module, nn::ModuleT, Tensor};

use super::gan::{CriticNet, GeneratorNet, ModelDims, OutputActivation, NUM_CLASSES};
use crate::data::ImageShape;
use crate::error::{Error, Result};

/// Generator network
///
/// Architecture:
/// 1. Dense projection with BatchNorm and ReLU
/// 2. ConvTranspose2d with BatchNorm and ReLU
/// 3. ConvTranspose2d with the output activation
#[derive(Debug)]
pub struct ConvGenerator {
    shape: ImageShape,
    base_filters: i64,
    z_dim: i64,
    activation: OutputActivation,
    fc: nn::Linear,
    bn0: nn::BatchNorm,
    deconv1: nn::ConvTranspose2D,
    bn1: nn::BatchNorm,
    deconv2: nn::ConvTranspose2D,
}

impl ConvGenerator {
    pub fn new(vs: &nn::Path, dims: &ModelDims, shape: ImageShape) -> Self {
        let base = dims.hidden_dim;
        let init_size = base * 2 * (shape.height / 4) * (shape.width / 4);

        let fc = nn::linear(vs / "fc", dims.z_dim, init_size, Default::default());
        let bn0 = nn::batch_norm1d(vs / "bn0", init_size, Default::default());

        let deconv_config = nn::ConvTransposeConfig {
            stride: 2,
            padding: 1,
            ..Default::default()
        };
        let deconv1 = nn::conv_transpose2d(vs / "deconv1", base * 2, base, 4, deconv_config);
        let bn1 = nn::batch_norm2d(vs / "bn1", base, Default::default());
        let deconv2 = nn::conv_transpose2d(vs / "deconv2", base, shape.channels, 4, deconv_config);

        Self {
            shape,
            base_filters: base,
            z_dim: dims.z_dim,
            activation: dims.output,
            fc,
            bn0,
            deconv1,
            bn1,
            deconv2,
        }
    }
}

impl ModuleT for ConvGenerator {
    fn forward_t(&self, noise: &Tensor, train: bool) -> Tensor {
        let batch_size = noise.size()[0];

        // Project and reshape: (batch, z) -> (batch, 2*base, h/4, w/4)
        let x = self.fc.forward(noise);
        let x = self.bn0.forward_t(&x, train).relu();
        let x = x.view([
            batch_size,
            self.base_filters * 2,
            self.shape.height / 4,
            self.shape.width / 4,
        ]);

        let x = self.deconv1.forward(&x);
        let x = self.bn1.forward_t(&x, train).relu();

        let x = self.activation.apply(self.deconv2.forward(&x));
        x.view([batch_size, self.shape.numel()])
    }
}

impl GeneratorNet for ConvGenerator {
    fn z_dim(&self) -> i64 {
        self.z_dim
    }

    fn x_dim(&self) -> i64 {
        self.shape.numel()
    }
}

/// Critic network
///
/// Architecture:
/// 1. Two strided Conv2d layers with LeakyReLU
/// 2. Flatten and Dense layer producing two class logits
///
/// No normalization layers: every parameter is subject to weight clipping.
#[derive(Debug)]
pub struct ConvCritic {
    shape: ImageShape,
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    fc: nn::Linear,
}

impl ConvCritic {
    pub fn new(vs: &nn::Path, dims: &ModelDims, shape: ImageShape) -> Self {
        let base = dims.hidden_dim;
        let conv_config = nn::ConvConfig {
            stride: 2,
            padding: 1,
            ..Default::default()
        };

        let conv1 = nn::conv2d(vs / "conv1", shape.channels, base, 4, conv_config);
        let conv2 = nn::conv2d(vs / "conv2", base, base * 2, 4, conv_config);
        let flat_size = base * 2 * (shape.height / 4) * (shape.width / 4);
        let fc = nn::linear(vs / "fc", flat_size, NUM_CLASSES, Default::default());

        Self {
            shape,
            conv1,
            conv2,
            fc,
        }
    }
}

impl ModuleT for ConvCritic {
    fn forward_t(&self, input: &Tensor, _train: bool) -> Tensor {
        let batch_size = input.size()[0];
        let x = input.view([
            batch_size,
            self.shape.channels,
            self.shape.height,
            self.shape.width,
        ]);

        let x = self.conv1.forward(&x).leaky_relu();
        let x = self.conv2.forward(&x).leaky_relu();

        let x = x.view([batch_size, -1]);
        self.fc.forward(&x)
    }
}

impl CriticNet for ConvCritic {
    fn x_dim(&self) -> i64 {
        self.shape.numel()
    }
}

/// Registry factory for the `conv` model
pub fn build_pair(
    gen_vs: &nn::Path,
    critic_vs: &nn::Path,
    dims: &ModelDims,
) -> Result<(Box<dyn GeneratorNet>, Box<dyn CriticNet>)> {
    let shape = dims
        .image_shape
        .ok_or_else(|| Error::InvalidConfig("conv model needs image data".to_string()))?;
    if shape.height % 4 != 0 || shape.width % 4 != 0 || shape.height == 0 || shape.width == 0 {
        return Err(Error::InvalidConfig(format!(
            "conv model needs height and width divisible by 4, got {}x{}",
            shape.height, shape.width
        )));
    }
    if dims.z_dim <= 0 || dims.hidden_dim <= 0 {
        return Err(Error::InvalidConfig(format!(
            "conv model needs positive sizes, got z_dim={} hidden_dim={}",
            dims.z_dim, dims.hidden_dim
        )));
    }
    Ok((
        Box::new(ConvGenerator::new(gen_vs, dims, shape)),
        Box::new(ConvCritic::new(critic_vs, dims, shape)),
    ))
}
