use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;

mod backend;
mod commands;
mod output;

use backend::{Backend, ProviderChoice};
use commands::compute::{ImageCommands, InstanceCommands, InstanceTypeCommands, KeyPairCommands};
use commands::network::NetworkCommands;
use commands::security_group::SecurityGroupCommands;
use commands::vpc::{
    GatewayCommands, RouteCommands, RouteTableCommands, SubnetCommands, VpcCommands,
};

#[derive(Parser)]
#[command(name = "vpcwright")]
#[command(about = "Existence-gated provisioning of VPC networking resources", long_about = None)]
struct Cli {
    /// Where requests go
    #[arg(long, value_enum, default_value_t = ProviderChoice::Aws, global = true)]
    provider: ProviderChoice,

    /// AWS region (defaults to the SDK's region chain, or REGION in a network config)
    #[arg(long, global = true)]
    region: Option<String>,

    /// State file of the local provider
    #[arg(long, default_value = ".vpcwright/state.json", global = true)]
    state: PathBuf,

    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or tear down a whole public network from a configuration file
    Network {
        #[command(subcommand)]
        command: NetworkCommands,
    },
    /// Networks (VPCs)
    Vpc {
        #[command(subcommand)]
        command: VpcCommands,
    },
    /// Subnets
    Subnet {
        #[command(subcommand)]
        command: SubnetCommands,
    },
    /// Route tables and their subnet associations
    RouteTable {
        #[command(subcommand)]
        command: RouteTableCommands,
    },
    /// Internet gateways and their attachments
    Gateway {
        #[command(subcommand)]
        command: GatewayCommands,
    },
    /// Routes
    Route {
        #[command(subcommand)]
        command: RouteCommands,
    },
    /// Security groups and rules
    SecurityGroup {
        #[command(subcommand)]
        command: SecurityGroupCommands,
    },
    /// Key pairs
    KeyPair {
        #[command(subcommand)]
        command: KeyPairCommands,
    },
    /// Compute instances
    Instance {
        #[command(subcommand)]
        command: InstanceCommands,
    },
    /// Machine images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },
    /// Instance types
    InstanceType {
        #[command(subcommand)]
        command: InstanceTypeCommands,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let level = if verbose > 0 { "debug" } else { "warn" };
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level),
    );
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "vpcwright", &mut io::stdout());
        return Ok(());
    }

    // A network configuration is read before the provider so its REGION can apply
    let config = match &cli.command {
        Commands::Network { command } => {
            Some(commands::network::load_config(command.config_path())?)
        }
        _ => None,
    };
    let region = cli
        .region
        .as_deref()
        .or_else(|| config.as_ref().and_then(|c| c.region.as_deref()));

    let backend = Backend::open(cli.provider, region, &cli.state).await?;
    let provider = backend.provider();

    let result = match cli.command {
        Commands::Network { command } => match &config {
            Some(config) => commands::network::run(provider, &command, config).await,
            None => Err("network configuration was not loaded".to_string()),
        },
        Commands::Vpc { command } => commands::vpc::run_vpc(provider, command).await,
        Commands::Subnet { command } => commands::vpc::run_subnet(provider, command).await,
        Commands::RouteTable { command } => {
            commands::vpc::run_route_table(provider, command).await
        }
        Commands::Gateway { command } => commands::vpc::run_gateway(provider, command).await,
        Commands::Route { command } => commands::vpc::run_route(provider, command).await,
        Commands::SecurityGroup { command } => {
            commands::security_group::run(provider, command).await
        }
        Commands::KeyPair { command } => commands::compute::run_key_pair(provider, command).await,
        Commands::Instance { command } => {
            commands::compute::run_instance(provider, command).await
        }
        Commands::Image { command } => commands::compute::run_image(provider, command).await,
        Commands::InstanceType { command } => {
            commands::compute::run_instance_type(provider, command).await
        }
        Commands::Completions { .. } => Ok(()),
    };

    // Partial work is persisted even when a command fails
    backend.persist()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vpcwright",
            "vpc",
            "list",
            "--provider",
            "local",
            "--state",
            "/tmp/state.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.provider, ProviderChoice::Local);
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Commands::Vpc {
                command: VpcCommands::List { name: None }
            }
        ));
    }

    #[test]
    fn rules_are_repeatable() {
        let cli = Cli::try_parse_from([
            "vpcwright",
            "security-group",
            "create",
            "--vpc-id",
            "vpc-1",
            "--name",
            "web",
            "--env",
            "Dev",
            "--ingress",
            "tcp:22:0.0.0.0/0",
            "--ingress",
            "tcp:443:0.0.0.0/0",
            "--egress",
            "all:*:0.0.0.0/0",
        ])
        .unwrap();
        match cli.command {
            Commands::SecurityGroup {
                command: SecurityGroupCommands::Create { rules, .. },
            } => {
                assert_eq!(rules.ingress.len(), 2);
                assert_eq!(rules.egress.len(), 1);
            }
            _ => panic!("expected security-group create"),
        }
    }

    #[test]
    fn vpc_delete_needs_name_and_env_with_cidr() {
        let result = Cli::try_parse_from([
            "vpcwright",
            "vpc",
            "delete",
            "--cidr",
            "10.0.0.0/16",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn local_network_up_persists_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("network.json");
        std::fs::write(
            &config,
            r#"{
                "CIDR_BLOCK": "10.0.0.0/16",
                "TAG_VPC_NAME": "Test",
                "TAG_ENV": "Dev",
                "CIDR_PUBLIC_SUBNETS": ["10.0.1.0/24"],
                "AVAILABILITY_ZONES": ["local-1a"],
                "TAG_SUBNETS": ["Public-1"],
                "TAG_RTB": "Test-rtb",
                "TAG_IGW_NAME": "Test-igw"
            }"#,
        )
        .unwrap();
        let state = dir.path().join("state.json");

        let cli = Cli::try_parse_from([
            "vpcwright",
            "--provider",
            "local",
            "--state",
            state.to_str().unwrap(),
            "network",
            "up",
            "--config",
            config.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).await.unwrap();

        let saved = std::fs::read_to_string(&state).unwrap();
        assert!(saved.contains("10.0.1.0/24"));
    }
}
