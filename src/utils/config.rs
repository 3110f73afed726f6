//! Configuration management
//!
//! Provides unified configuration for a training run. Values come from an
//! optional JSON or TOML file and can be overridden from the command line.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::RmsPropConfig;
use crate::training::{Schedule, DEFAULT_CLIP_VALUE};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data configuration
    pub data: DataConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Training configuration
    pub training: TrainingConfigFile,
}

/// Data-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset identifier (see `registry::DATASETS`)
    pub dataset: String,
    /// Directory holding on-disk datasets
    pub data_dir: PathBuf,
}

/// Model-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (see `registry::MODELS`)
    pub name: String,
    /// Latent dimension; the dataset default is used when unset
    pub z_dim: Option<i64>,
    /// Hidden width (mlp) or base filters (conv)
    pub hidden_dim: i64,
    /// Number of hidden layers (mlp)
    pub hidden_layers: usize,
}

/// Training-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfigFile {
    /// Number of outer iterations
    pub iterations: usize,
    /// Samples per half-batch
    pub batch_size: usize,
    /// Critic weight clipping range
    pub clip_value: f64,
    /// Optimizer settings shared by both networks
    pub optimizer: RmsPropConfig,
    /// Critic-step schedule and cadences
    pub schedule: Schedule,
    /// Seed for samplers and weight initialization
    pub seed: u64,
    /// Device: "cpu", "cuda", "cuda:N" or a GPU index
    pub device: String,
    /// Root directory for sample grids and metrics
    pub log_dir: PathBuf,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                dataset: "mnist".to_string(),
                data_dir: PathBuf::from("data"),
            },
            model: ModelConfig {
                name: "mlp".to_string(),
                z_dim: None,
                hidden_dim: 256,
                hidden_layers: 2,
            },
            training: TrainingConfigFile {
                iterations: 5000,
                batch_size: 64,
                clip_value: DEFAULT_CLIP_VALUE,
                optimizer: RmsPropConfig::default(),
                schedule: Schedule::default(),
                seed: 0,
                device: "0".to_string(),
                log_dir: PathBuf::from("logs"),
                progress: true,
            },
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from file, picking the format from the extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if is_toml(path) {
            Self::from_toml(path)
        } else {
            Self::from_json(path)
        }
    }

    /// Save to file, picking the format from the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if is_toml(path) {
            self.save_toml(path)
        } else {
            self.save_json(path)
        }
    }

    /// Get device from configuration
    pub fn get_device(&self) -> Result<tch::Device> {
        parse_device(&self.training.device)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if self.training.batch_size == 0 {
            return invalid("batch size must be > 0");
        }
        if self.training.iterations == 0 {
            return invalid("number of iterations must be > 0");
        }
        if !(self.training.clip_value.is_finite() && self.training.clip_value > 0.0) {
            return invalid("clip value must be a positive finite number");
        }
        if !(self.training.optimizer.learning_rate.is_finite()
            && self.training.optimizer.learning_rate > 0.0)
        {
            return invalid("learning rate must be a positive finite number");
        }
        if self.training.schedule.critic_iters == 0 || self.training.schedule.heavy_critic_iters == 0 {
            return invalid("critic iterations must be > 0");
        }
        if matches!(self.model.z_dim, Some(z) if z <= 0) {
            return invalid("latent dimension must be > 0");
        }
        if self.model.hidden_dim <= 0 {
            return invalid("hidden dimension must be > 0");
        }
        parse_device(&self.training.device)?;
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

/// Parse a device selector
///
/// Accepts `cpu`, `cuda`/`gpu` (first GPU), `cuda:N`, or a bare GPU index
/// `N`. CUDA selections fall back to the CPU when no GPU is available.
pub fn parse_device(selector: &str) -> Result<tch::Device> {
    let selector = selector.trim().to_lowercase();
    let index = match selector.as_str() {
        "cpu" => return Ok(tch::Device::Cpu),
        "cuda" | "gpu" => 0,
        other => {
            let digits = other.strip_prefix("cuda:").unwrap_or(other);
            digits
                .parse::<usize>()
                .map_err(|_| Error::InvalidConfig(format!("unknown device '{selector}'")))?
        }
    };

    if tch::Cuda::is_available() && index < tch::Cuda::device_count() as usize {
        Ok(tch::Device::Cuda(index))
    } else {
        tracing::warn!("CUDA device {} requested but not available, falling back to CPU", index);
        Ok(tch::Device::Cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.data.dataset, "mnist");
        assert_eq!(config.model.name, "mlp");
        assert_eq!(config.training.batch_size, 64);
        assert_eq!(config.training.iterations, 5000);
        assert_eq!(config.training.clip_value, 0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.model.z_dim = Some(8);
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.data.dataset, config.data.dataset);
        assert_eq!(loaded.model.z_dim, Some(8));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.data.dataset = "toy".to_string();
        config.training.schedule.critic_iters = 3;
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[training.schedule]"));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.data.dataset, "toy");
        assert_eq!(loaded.training.schedule.critic_iters, 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.training.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.training.clip_value = -0.01;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.z_dim = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.training.device = "tpu".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_device() {
        assert_eq!(parse_device("cpu").unwrap(), tch::Device::Cpu);
        assert_eq!(parse_device(" CPU ").unwrap(), tch::Device::Cpu);
        assert!(parse_device("cuda:x").is_err());

        let expected = if tch::Cuda::is_available() {
            tch::Device::Cuda(0)
        } else {
            tch::Device::Cpu
        };
        assert_eq!(parse_device("0").unwrap(), expected);
        assert_eq!(parse_device("cuda:0").unwrap(), expected);
    }
}
