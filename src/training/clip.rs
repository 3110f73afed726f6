//! Weight clipping for the critic
//!
//! Clamping every critic parameter into `[-c, c]` bounds the critic's
//! Lipschitz constant.

use tch::nn::VarStore;

/// Default clipping range
pub const DEFAULT_CLIP_VALUE: f64 = 0.01;

/// Clamp every trainable tensor in `vs` into `[-limit, limit]`, in place
pub fn clip_weights(vs: &VarStore, limit: f64) {
    tch::no_grad(|| {
        for mut var in vs.trainable_variables() {
            let _ = var.clamp_(-limit, limit);
        }
    });
}

/// Largest absolute value over all trainable tensors in `vs`
pub fn max_abs_weight(vs: &VarStore) -> f64 {
    vs.trainable_variables()
        .iter()
        .map(|t| t.abs().max().double_value(&[]))
        .fold(0.0, f64::max)
}
