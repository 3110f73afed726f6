//! Training metrics for monitoring WGAN progress
//!
//! Records the losses reported at each logging iteration.

use std::path::Path;

use crate::error::Result;

/// One logged point
#[derive(Debug, Clone, PartialEq)]
pub struct LossRecord {
    /// Outer iteration, 1-based as printed
    pub iteration: usize,
    /// Wall-clock seconds since training started
    pub elapsed_secs: f64,
    /// Critic loss from the fresh critic step
    pub critic_loss: f64,
    /// Generator loss from the fresh generator step
    pub generator_loss: f64,
}

impl LossRecord {
    /// `critic_loss - generator_loss`
    ///
    /// Diagnostic only: the two losses are taken against different label
    /// distributions and are not directly comparable.
    pub fn loss_gap(&self) -> f64 {
        self.critic_loss - self.generator_loss
    }
}

/// Metrics collected during training
#[derive(Debug, Clone, Default)]
pub struct TrainingMetrics {
    pub records: Vec<LossRecord>,
}

impl TrainingMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a logged iteration
    pub fn record(&mut self, record: LossRecord) {
        self.records.push(record);
    }

    /// Get number of recorded points
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get latest generator loss
    pub fn latest_gen_loss(&self) -> Option<f64> {
        self.records.last().map(|r| r.generator_loss)
    }

    /// Get latest critic loss
    pub fn latest_critic_loss(&self) -> Option<f64> {
        self.records.last().map(|r| r.critic_loss)
    }

    /// Calculate moving average of generator loss
    pub fn gen_loss_ma(&self, window: usize) -> f64 {
        let values: Vec<f64> = self.records.iter().map(|r| r.generator_loss).collect();
        moving_average(&values, window)
    }

    /// Calculate moving average of critic loss
    pub fn critic_loss_ma(&self, window: usize) -> f64 {
        let values: Vec<f64> = self.records.iter().map(|r| r.critic_loss).collect();
        moving_average(&values, window)
    }

    /// Save metrics to CSV file
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["iteration", "elapsed_secs", "critic_loss", "generator_loss", "loss_gap"])?;

        for r in &self.records {
            writer.write_record([
                r.iteration.to_string(),
                r.elapsed_secs.to_string(),
                r.critic_loss.to_string(),
                r.generator_loss.to_string(),
                r.loss_gap().to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Calculate moving average of last `window` values
fn moving_average(values: &[f64], window: usize) -> f64 {
    if values.is_empty() || window == 0 {
        return 0.0;
    }

    let n = window.min(values.len());
    let sum: f64 = values.iter().rev().take(n).sum();
    sum / n as f64
}
