//! Loss functions for WGAN training
//!
//! Both the critic and the stacked model are trained with categorical
//! cross-entropy against one-hot `[fake, real]` labels.

use tch::{Kind, Tensor};

/// Categorical cross-entropy: `mean(-sum(labels * log_softmax(logits)))`
///
/// # Arguments
///
/// * `logits` - Raw critic output of shape (batch_size, 2)
/// * `labels` - One-hot targets of the same shape
///
/// # Returns
///
/// Scalar loss tensor
pub fn categorical_cross_entropy(logits: &Tensor, labels: &Tensor) -> Tensor {
    let log_probs = logits.log_softmax(-1, Kind::Float);
    let per_row = -(labels * &log_probs).sum_dim_intlist([-1i64].as_slice(), false, Kind::Float);
    per_row.mean(Kind::Float)
}

/// Critic loss on an assembled critic batch
pub fn critic_loss(logits: &Tensor, labels: &Tensor) -> Tensor {
    categorical_cross_entropy(logits, labels)
}

/// Generator loss: cross-entropy of the stacked model against "real" targets
pub fn generator_loss(stacked_logits: &Tensor, real_labels: &Tensor) -> Tensor {
    categorical_cross_entropy(stacked_logits, real_labels)
}
