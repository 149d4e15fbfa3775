use std::path::{Path, PathBuf};

use clap::Subcommand;

use vpcwright_core::builder::build_network;
use vpcwright_core::config::NetworkConfig;
use vpcwright_core::provider::Provider;
use vpcwright_core::teardown::teardown;

use super::heading;
use crate::output;

#[derive(Subcommand)]
pub enum NetworkCommands {
    /// Build the network described by a configuration file (seven steps)
    Up {
        /// Path to the JSON network configuration
        #[arg(long, short, default_value = "network.json")]
        config: PathBuf,
    },
    /// Tear down the network described by a configuration file (seven steps)
    Down {
        /// Path to the JSON network configuration
        #[arg(long, short, default_value = "network.json")]
        config: PathBuf,
    },
}

impl NetworkCommands {
    pub fn config_path(&self) -> &Path {
        match self {
            NetworkCommands::Up { config } | NetworkCommands::Down { config } => config,
        }
    }
}

pub fn load_config(path: &Path) -> Result<NetworkConfig, String> {
    NetworkConfig::load(path).map_err(|e| e.to_string())
}

pub async fn run(
    provider: &dyn Provider,
    command: &NetworkCommands,
    config: &NetworkConfig,
) -> Result<(), String> {
    match command {
        NetworkCommands::Up { .. } => run_up(provider, config).await,
        NetworkCommands::Down { .. } => run_down(provider, config).await,
    }
}

async fn run_up(provider: &dyn Provider, config: &NetworkConfig) -> Result<(), String> {
    heading(&format!(
        "Building network {} ({}, {})...",
        config.tag_vpc_name, config.cidr_block, config.tag_env
    ));
    println!();

    let report = build_network(provider, config).await;
    output::print_build_report(&report);
    match report.failed {
        None => Ok(()),
        Some((step, _)) => Err(format!("network build failed at step {}", step.number())),
    }
}

async fn run_down(provider: &dyn Provider, config: &NetworkConfig) -> Result<(), String> {
    heading(&format!(
        "Tearing down network {} ({}, {})...",
        config.tag_vpc_name, config.cidr_block, config.tag_env
    ));
    println!();

    let report = teardown(provider, config).await;
    output::print_teardown_report(&report);
    match report.failed {
        None => Ok(()),
        Some((step, _)) => Err(format!("network teardown failed at step {}", step.number())),
    }
}
