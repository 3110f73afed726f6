//! Adversarial training loop
//!
//! Per outer iteration: `critic_iters(t)` critic updates (each preceded by
//! weight clipping), then one generator update through the critic. Each
//! update steps exactly one optimizer, and each optimizer is scoped to one
//! network's `VarStore`, so gradients reach only the network being trained.

use std::path::PathBuf;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tch::nn;
use tracing::{debug, info};

use super::assembler::{PairAssembler, Phase};
use super::clip::DEFAULT_CLIP_VALUE;
use super::losses::{critic_loss, generator_loss};
use super::metrics::{LossRecord, TrainingMetrics};
use super::schedule::Schedule;
use crate::data::seeded_rng;
use crate::error::{Error, Result};
use crate::model::{GanPair, ModelDims, RmsPropConfig};
use crate::registry::{self, DatasetOptions};
use crate::utils::{run_dir, save_grid, snapshot_path, Config};

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of outer iterations
    pub iterations: usize,
    /// Samples per half-batch
    pub batch_size: usize,
    /// Critic weight clipping range
    pub clip_value: f64,
    /// Optimizer settings for both networks
    pub optimizer: RmsPropConfig,
    /// Critic-step schedule and cadences
    pub schedule: Schedule,
    /// Where sample grids and metrics go; nothing is written when unset
    pub output_dir: Option<PathBuf>,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iterations: 5000,
            batch_size: 64,
            clip_value: DEFAULT_CLIP_VALUE,
            optimizer: RmsPropConfig::default(),
            schedule: Schedule::default(),
            output_dir: None,
            progress: true,
        }
    }
}

/// Optimizer steps taken so far, per network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCounts {
    pub critic: usize,
    pub generator: usize,
}

/// WGAN Trainer
pub struct Trainer {
    config: TrainingConfig,
    pair: GanPair,
    assembler: PairAssembler,
    critic_opt: nn::Optimizer,
    gen_opt: nn::Optimizer,
    metrics: TrainingMetrics,
    steps: StepCounts,
    /// Outer iteration currently running
    iteration: usize,
}

impl Trainer {
    /// Create a new trainer with one RMSProp optimizer per network
    pub fn new(config: TrainingConfig, pair: GanPair, assembler: PairAssembler) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be > 0".to_string()));
        }
        let critic_opt = pair.critic_optimizer(&config.optimizer)?;
        let gen_opt = pair.generator_optimizer(&config.optimizer)?;

        Ok(Self {
            config,
            pair,
            assembler,
            critic_opt,
            gen_opt,
            metrics: TrainingMetrics::new(),
            steps: StepCounts::default(),
            iteration: 0,
        })
    }

    /// Resolve dataset and model identifiers and wire up a trainer
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let dataset = registry::dataset(&config.data.dataset)?;
        let model = registry::model(&config.model.name)?;
        let device = config.get_device()?;
        info!("Using device: {:?}", device);

        let seed = config.training.seed;
        tch::manual_seed(seed as i64);

        let bundle = (dataset.build)(&DatasetOptions {
            data_dir: config.data.data_dir.clone(),
        })?;

        let dims = ModelDims {
            z_dim: config.model.z_dim.unwrap_or(bundle.default_z_dim),
            x_dim: bundle.data.x_dim(),
            image_shape: bundle.data.image_shape(),
            output: bundle.output,
            hidden_dim: config.model.hidden_dim,
            hidden_layers: config.model.hidden_layers,
        };

        let pair = GanPair::new(model.factory, &dims, device).map_err(|e| match e {
            Error::InvalidConfig(reason) => Error::IncompatibleModel {
                model: model.name.to_string(),
                dataset: dataset.name.to_string(),
                reason,
            },
            other => other,
        })?;

        let (gen_params, critic_params) = pair.parameter_counts();
        info!(
            "Created {} on {}: z_dim={}, x_dim={}, generator params={}, critic params={}",
            model.name, dataset.name, dims.z_dim, dims.x_dim, gen_params, critic_params
        );

        let assembler = PairAssembler::new(
            bundle.data,
            bundle.noise,
            seeded_rng(seed),
            dims.z_dim,
            device,
        );

        let training = TrainingConfig {
            iterations: config.training.iterations,
            batch_size: config.training.batch_size,
            clip_value: config.training.clip_value,
            optimizer: config.training.optimizer.clone(),
            schedule: config.training.schedule.clone(),
            output_dir: Some(run_dir(&config.training.log_dir, dataset.name, model.name)),
            progress: config.training.progress,
        };

        Self::new(training, pair, assembler)
    }

    /// Clip the critic, then take one critic gradient step
    ///
    /// Returns the loss measured before the step.
    pub fn critic_step(&mut self) -> Result<f64> {
        self.pair.clip_critic(self.config.clip_value);

        let batch = self
            .assembler
            .build(Phase::Critic, self.config.batch_size, &self.pair)?;
        let logits = self.pair.critic_logits(&batch.inputs);
        let loss = critic_loss(&logits, &batch.labels);
        let value = self.check_finite(Phase::Critic, f64::try_from(&loss)?)?;

        self.critic_opt.backward_step(&loss);
        self.steps.critic += 1;
        Ok(value)
    }

    /// Take one generator gradient step through the critic
    ///
    /// Only the generator optimizer steps; critic parameters do not move.
    pub fn generator_step(&mut self) -> Result<f64> {
        let batch = self
            .assembler
            .build(Phase::Generator, self.config.batch_size, &self.pair)?;
        let logits = self.pair.stacked_logits(&batch.inputs);
        let loss = generator_loss(&logits, &batch.labels);
        let value = self.check_finite(Phase::Generator, f64::try_from(&loss)?)?;

        self.gen_opt.backward_step(&loss);
        self.steps.generator += 1;
        Ok(value)
    }

    fn check_finite(&self, phase: Phase, value: f64) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::NonFiniteLoss {
                phase,
                iteration: self.iteration,
                value,
            })
        }
    }

    /// Run one outer iteration
    ///
    /// Returns the fresh losses when `t` is a logging iteration.
    pub fn train_iteration(&mut self, t: usize, start: Instant) -> Result<Option<LossRecord>> {
        self.iteration = t;

        for _ in 0..self.config.schedule.critic_iters(t) {
            self.critic_step()?;
        }
        self.generator_step()?;

        if !self.config.schedule.should_log(t) {
            return Ok(None);
        }

        let critic_loss = self.critic_step()?;
        let generator_loss = self.generator_step()?;
        let record = LossRecord {
            iteration: t + 1,
            elapsed_secs: start.elapsed().as_secs_f64(),
            critic_loss,
            generator_loss,
        };
        self.metrics.record(record.clone());
        Ok(Some(record))
    }

    /// Generate a fresh batch and save it as a grid for iteration `t`
    pub fn snapshot(&mut self, t: usize) -> Result<Option<PathBuf>> {
        let Some(dir) = self.config.output_dir.clone() else {
            return Ok(None);
        };

        let noise = self.assembler.noise(self.config.batch_size);
        let samples = self.pair.generate(&noise);
        let images = self.assembler.data().to_display(&samples)?;

        let path = snapshot_path(&dir, self.config.schedule.snapshot_index(t));
        save_grid(&images, &path)?;
        Ok(Some(path))
    }

    /// Train the WGAN
    ///
    /// # Returns
    ///
    /// Training metrics
    pub fn train(&mut self) -> Result<&TrainingMetrics> {
        let iterations = self.config.iterations;
        info!(
            "Starting training for {} iterations, batch size {}",
            iterations, self.config.batch_size
        );

        let pb = if self.config.progress {
            let pb = ProgressBar::new(iterations as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let start = Instant::now();
        for t in 0..iterations {
            if let Some(record) = self.train_iteration(t, start)? {
                pb.suspend(|| {
                    info!(
                        "Iter [{:8}] Time [{:5.4}] d_loss [{:.4}] g_loss [{:.4}]",
                        record.iteration,
                        record.elapsed_secs,
                        record.loss_gap(),
                        record.generator_loss
                    )
                });
                pb.set_message(format!("g_loss {:.4}", record.generator_loss));
            }

            if self.config.schedule.should_eval(t) {
                if let Some(path) = self.snapshot(t)? {
                    pb.suspend(|| debug!("Saved samples for iteration {} to {}", t + 1, path.display()));
                }
            }

            pb.inc(1);
        }
        pb.finish_with_message("done");

        if let Some(dir) = &self.config.output_dir {
            std::fs::create_dir_all(dir)?;
            let metrics_path = dir.join("metrics.csv");
            self.metrics.save_csv(&metrics_path)?;
            info!("Saved metrics to {}", metrics_path.display());
        }

        info!(
            "Training complete in {:.1}s",
            start.elapsed().as_secs_f64()
        );
        Ok(&self.metrics)
    }

    /// Get training metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Get optimizer step counts
    pub fn steps(&self) -> StepCounts {
        self.steps
    }

    /// Get configuration
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Get the model pair
    pub fn pair(&self) -> &GanPair {
        &self.pair
    }

    /// Get the model pair mutably
    pub fn pair_mut(&mut self) -> &mut GanPair {
        &mut self.pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::max_abs_weight;
    use tch::Tensor;

    fn toy_config(log_dir: PathBuf) -> Config {
        let mut config = Config::default();
        config.data.dataset = "toy".to_string();
        config.model.hidden_dim = 8;
        config.model.hidden_layers = 1;
        config.training.iterations = 1;
        config.training.batch_size = 2;
        config.training.device = "cpu".to_string();
        config.training.log_dir = log_dir;
        config.training.progress = false;
        config
    }

    fn toy_trainer() -> (Trainer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::from_config(&toy_config(dir.path().to_path_buf())).unwrap();
        (trainer, dir)
    }

    fn identical(a: &[(String, Tensor)], b: &[(String, Tensor)]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|((na, ta), (nb, tb))| na == nb && ta.equal(tb))
    }

    #[test]
    fn test_training_config_default() {
        let config = TrainingConfig::default();
        assert_eq!(config.iterations, 5000);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.clip_value, 0.01);
    }

    #[test]
    fn test_generator_step_freezes_critic() {
        let (mut trainer, _dir) = toy_trainer();
        trainer.critic_step().unwrap();

        let critic_before = trainer.pair().critic_parameters();
        let gen_before = trainer.pair().generator_parameters();

        trainer.generator_step().unwrap();

        assert!(identical(&critic_before, &trainer.pair().critic_parameters()));
        assert!(!identical(&gen_before, &trainer.pair().generator_parameters()));
    }

    #[test]
    fn test_critic_step_freezes_generator() {
        let (mut trainer, _dir) = toy_trainer();

        // Clip first so the step's own clipping is a no-op and only the update remains
        trainer.pair().clip_critic(0.01);
        let critic_before = trainer.pair().critic_parameters();
        let gen_before = trainer.pair().generator_parameters();

        trainer.critic_step().unwrap();

        assert!(!identical(&critic_before, &trainer.pair().critic_parameters()));
        assert!(identical(&gen_before, &trainer.pair().generator_parameters()));
    }

    #[test]
    fn test_iteration_step_counts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = toy_config(dir.path().to_path_buf());
        config.training.schedule = Schedule {
            warmup_iters: 0,
            anchor_every: 2,
            heavy_critic_iters: 3,
            critic_iters: 1,
            log_every: 2,
            log_warmup: 0,
            eval_every: 0,
        };
        let mut trainer = Trainer::from_config(&config).unwrap();
        let start = Instant::now();

        // Heavy critic phase plus one fresh critic/generator pair for the log line
        let logged = trainer.train_iteration(0, start).unwrap();
        assert!(logged.is_some());
        assert_eq!(trainer.steps(), StepCounts { critic: 4, generator: 2 });

        // Light iteration, not logged: no extra steps
        let logged = trainer.train_iteration(1, start).unwrap();
        assert!(logged.is_none());
        assert_eq!(trainer.steps(), StepCounts { critic: 5, generator: 3 });
        assert_eq!(trainer.metrics().len(), 1);
    }

    #[test]
    fn test_generator_step_does_not_clip() {
        let (mut trainer, _dir) = toy_trainer();

        let large: Vec<(String, Tensor)> = trainer
            .pair()
            .critic_parameters()
            .into_iter()
            .map(|(name, t)| (name, t.ones_like() * 5.0))
            .collect();
        trainer.pair_mut().set_critic_parameters(&large).unwrap();

        trainer.generator_step().unwrap();

        assert!(max_abs_weight(&trainer.pair().critic_vs) > 4.9);
        assert_eq!(trainer.steps(), StepCounts { critic: 0, generator: 1 });
    }

    #[test]
    fn test_critic_clipped_before_step() {
        let (mut trainer, _dir) = toy_trainer();

        let large: Vec<(String, Tensor)> = trainer
            .pair()
            .critic_parameters()
            .into_iter()
            .map(|(name, t)| (name, t.ones_like() * 5.0))
            .collect();
        trainer.pair_mut().set_critic_parameters(&large).unwrap();
        assert!(max_abs_weight(&trainer.pair().critic_vs) > 4.9);

        trainer.critic_step().unwrap();

        // One RMSProp step from clipped weights moves each value by at most
        // lr / sqrt(1 - alpha) ~= 0.0032
        assert!(max_abs_weight(&trainer.pair().critic_vs) < 0.01 + 0.004);
    }

    #[test]
    fn test_non_finite_loss_is_surfaced() {
        let (mut trainer, _dir) = toy_trainer();
        tch::no_grad(|| {
            for mut var in trainer.pair().gen_vs.trainable_variables() {
                let _ = var.fill_(f64::NAN);
            }
        });

        match trainer.generator_step() {
            Err(Error::NonFiniteLoss { phase, .. }) => assert_eq!(phase, Phase::Generator),
            other => panic!("expected NonFiniteLoss, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_one_iteration_end_to_end() {
        let (mut trainer, dir) = toy_trainer();
        assert_eq!(trainer.pair().z_dim(), 1);

        let metrics = trainer.train().unwrap();

        assert_eq!(metrics.len(), 1);
        let record = &metrics.records[0];
        assert_eq!(record.iteration, 1);
        assert!(record.critic_loss.is_finite());
        assert!(record.generator_loss.is_finite());

        let run = dir.path().join("toy").join("mlp");
        assert!(run.join("0.png").exists());
        assert!(run.join("metrics.csv").exists());
    }

    #[test]
    fn test_unknown_identifiers_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = toy_config(dir.path().to_path_buf());
        config.data.dataset = "imagenet".to_string();
        assert!(matches!(Trainer::from_config(&config), Err(Error::UnknownDataset { .. })));

        let mut config = toy_config(dir.path().to_path_buf());
        config.model.name = "transformer".to_string();
        assert!(matches!(Trainer::from_config(&config), Err(Error::UnknownModel { .. })));
    }

    #[test]
    fn test_conv_model_rejected_for_points() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = toy_config(dir.path().to_path_buf());
        config.model.name = "conv".to_string();

        assert!(matches!(
            Trainer::from_config(&config),
            Err(Error::IncompatibleModel { .. })
        ));
    }
}
