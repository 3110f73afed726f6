//! WGAN training entry point
//!
//! Command line interface for:
//! - Training a generator/critic pair on a named dataset
//! - Writing a default configuration file
//! - Listing available datasets and models

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_wgan::{registry, Config, Trainer};

/// Number of logged points averaged in the final summary
const SUMMARY_WINDOW: usize = 10;

/// Wasserstein GAN with weight clipping
#[derive(Parser)]
#[command(name = "rust_wgan")]
#[command(version = "0.1.0")]
#[command(about = "Train a WGAN on a named dataset and save generated samples")]
struct Cli {
    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a generator/critic pair
    Train(TrainArgs),

    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// List registered datasets and models
    List,
}

/// Command line overrides for the configuration
#[derive(clap::Args)]
struct TrainArgs {
    /// Dataset identifier
    #[arg(long)]
    data: Option<String>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Device: cpu, cuda, cuda:N or a GPU index
    #[arg(long, visible_alias = "gpus")]
    device: Option<String>,

    /// Samples per half-batch
    #[arg(long, visible_alias = "batch_size")]
    batch_size: Option<usize>,

    /// Number of outer iterations
    #[arg(long, visible_aliases = ["nb-epoch", "nb_epoch"])]
    iterations: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for sample grids and metrics
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Directory holding on-disk datasets
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Latent dimension (dataset default when unset)
    #[arg(long)]
    z_dim: Option<i64>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl TrainArgs {
    fn apply(self, config: &mut Config) {
        if let Some(data) = self.data {
            config.data.dataset = data;
        }
        if let Some(model) = self.model {
            config.model.name = model;
        }
        if let Some(device) = self.device {
            config.training.device = device;
        }
        if let Some(batch_size) = self.batch_size {
            config.training.batch_size = batch_size;
        }
        if let Some(iterations) = self.iterations {
            config.training.iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }
        if let Some(log_dir) = self.log_dir {
            config.training.log_dir = log_dir;
        }
        if let Some(data_dir) = self.data_dir {
            config.data.data_dir = data_dir;
        }
        if self.z_dim.is_some() {
            config.model.z_dim = self.z_dim;
        }
        if self.no_progress {
            config.training.progress = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train(args) => {
            train(cli.config.as_deref(), args)?;
        }
        Commands::Init { output } => {
            init_config(&output)?;
        }
        Commands::List => {
            list_registry();
        }
    }

    Ok(())
}

/// Train a WGAN
fn train(config_path: Option<&Path>, args: TrainArgs) -> Result<()> {
    let mut config = match config_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };
    args.apply(&mut config);

    info!(
        "Training {} on {} for {} iterations",
        config.model.name, config.data.dataset, config.training.iterations
    );

    let mut trainer = Trainer::from_config(&config).inspect_err(|e| {
        if e.is_config_error() {
            error!("Run `rust_wgan list` to see the available datasets and models");
        }
    })?;
    trainer.train()?;

    let metrics = trainer.metrics();
    if let (Some(d_loss), Some(g_loss)) = (metrics.latest_critic_loss(), metrics.latest_gen_loss()) {
        info!("Final losses: critic {:.4}, generator {:.4}", d_loss, g_loss);
        info!(
            "Last {} logged points: critic {:.4}, generator {:.4} (mean)",
            SUMMARY_WINDOW.min(metrics.len()),
            metrics.critic_loss_ma(SUMMARY_WINDOW),
            metrics.gen_loss_ma(SUMMARY_WINDOW)
        );
    }
    if let Some(dir) = &trainer.config().output_dir {
        info!("Samples written to {}", dir.display());
    }

    Ok(())
}

/// Write the default configuration
fn init_config(output_path: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output_path)?;

    info!("Created default configuration at {}", output_path.display());
    Ok(())
}

/// Print the dataset and model registries
fn list_registry() {
    println!("Datasets:");
    for entry in registry::DATASETS {
        println!("  {:<18} {}", entry.name, entry.description);
    }
    println!("Models:");
    for entry in registry::MODELS {
        println!("  {:<18} {}", entry.name, entry.description);
    }
}
