//! Command-line interface for dnstally.
//!
//! Just run `dnstally` to serve the stats API with sensible defaults.

use crate::application::Application;
use crate::core::config::ConfigBuilder;
use crate::core::{Config, Result, StatsError};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

/// DNS filtering statistics over four time resolutions
#[derive(Parser, Debug)]
#[command(name = "dnstally")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Port for the stats API
    #[arg(short, long, env = "DNSTALLY_PORT")]
    pub port: Option<u16>,

    /// Address to bind the stats API to
    #[arg(short, long, env = "DNSTALLY_BIND")]
    pub bind: Option<IpAddr>,

    /// Exporter metric namespace
    #[arg(long, env = "DNSTALLY_NAMESPACE")]
    pub namespace: Option<String>,

    /// Configuration file path (default: ~/.config/dnstally/config.yaml)
    #[arg(short, long, env = "DNSTALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "DNSTALLY_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,

    /// Show version information
    #[arg(short = 'V', long = "show-version")]
    pub version: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Config file to read, if any.
    ///
    /// An explicit `--config` always wins; otherwise the default location
    /// is used only when it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join("dnstally").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = self.config_path() {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                StatsError::config(format!("Failed to read config file {:?}: {}", path, e))
            })?;
            builder = builder.from_yaml(&content)?;
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(address) = self.bind {
            builder = builder.bind_address(address);
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.namespace(namespace.as_str());
        }

        builder.debug(self.debug).build()
    }
}

/// Initialize logging based on configuration.
pub fn init_logging(config: &Config) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level().as_str()));

    let fmt_layer = if config.logging.structured {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .compact()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| StatsError::config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Execute dnstally.
pub async fn execute(cli: Cli) -> Result<()> {
    if cli.version {
        println!("dnstally {}", env!("CARGO_PKG_VERSION"));
        println!("DNS filtering statistics");
        return Ok(());
    }

    let config = cli.load_config().await?;

    if cli.check_config {
        let rendered = serde_yaml::to_string(&config)
            .map_err(|e| StatsError::config(format!("Failed to render config: {}", e)))?;
        println!("Configuration is valid!");
        print!("{}", rendered);
        return Ok(());
    }

    init_logging(&config)?;
    if let Some(path) = cli.config_path() {
        tracing::info!("Loaded configuration from: {:?}", path);
    }

    Application::new(config)?.run().await
}
