use super::ServiceConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "sourcebot")]
#[command(about = "Supplier workflow orchestrator and notification service")]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    /// Orchestrator port
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub notification_port: Option<u16>,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Print the resolved configuration and exit")]
    pub dry_run: bool,
}

impl CliArgs {
    /// defaults → TOML → 環境變數 → CLI 旗標
    pub fn resolve(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📋 Loading configuration from {}", path.display());
                ServiceConfig::from_file(path)?
            }
            None => ServiceConfig::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(port) = self.notification_port {
            config.server.notification_port = port;
        }
    }
}
