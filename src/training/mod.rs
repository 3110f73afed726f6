//! Training module for the WGAN
//!
//! This module provides:
//! - Assembly of labelled critic and generator batches
//! - Critic weight clipping
//! - Categorical cross-entropy losses
//! - The critic-step schedule
//! - Training loop and metrics

mod assembler;
mod clip;
mod losses;
mod metrics;
mod schedule;
mod trainer;

pub use assembler::{PairAssembler, Phase, TrainPair, FAKE_LABEL, REAL_LABEL};
pub use clip::{clip_weights, max_abs_weight, DEFAULT_CLIP_VALUE};
pub use losses::{categorical_cross_entropy, critic_loss, generator_loss};
pub use metrics::{LossRecord, TrainingMetrics};
pub use schedule::Schedule;
pub use trainer::{StepCounts, Trainer, TrainingConfig};
