//! Model module containing the generator/critic pair
//!
//! This module provides:
//! - Network traits and the `GanPair` holding both networks
//! - Fully connected architecture (`mlp`)
//! - Convolutional architecture for images (`conv`)

pub mod conv;
mod gan;
pub mod mlp;

pub use gan::{
    CriticNet, GanPair, GeneratorNet, ModelDims, OutputActivation, PairFactory, RmsPropConfig,
    NUM_CLASSES,
};
