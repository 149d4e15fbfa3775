//! Network, subnet, route table, gateway and route commands

use clap::Subcommand;

use vpcwright_core::filter::Filters;
use vpcwright_core::provider::Provider;
use vpcwright_core::provision::{find_by_id, resolve};
use vpcwright_core::resource::{
    Resource, ResourceKind, ResourceSpec, attachment_identifier, attr, route_identifier,
};
use vpcwright_core::tags::Tags;

use super::{
    delete_and_print, delete_by_id, delete_matching, ensure_and_print, list_and_print,
    optional_filters,
};

#[derive(Subcommand)]
pub enum VpcCommands {
    /// Create a network unless one with the same CIDR, Name and Environment exists
    Create {
        #[arg(long)]
        cidr: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        env: String,
        /// Enable DNS support and DNS hostnames
        #[arg(long)]
        enable_dns: bool,
    },
    /// Delete a network by ID, or by CIDR, Name and Environment
    Delete {
        #[arg(long, conflicts_with_all = ["cidr", "name", "env"])]
        id: Option<String>,
        #[arg(long, requires_all = ["name", "env"])]
        cidr: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        env: Option<String>,
    },
    /// List networks
    List {
        /// Case-insensitive glob on the Name tag
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SubnetCommands {
    /// Create a subnet unless one with the same CIDR, zone and Name exists in the network
    Create {
        #[arg(long)]
        vpc_id: String,
        #[arg(long)]
        cidr: String,
        #[arg(long)]
        az: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        env: String,
    },
    /// Delete a subnet by ID
    Delete {
        #[arg(long)]
        id: String,
    },
    /// List subnets
    List {
        #[arg(long)]
        vpc_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RouteTableCommands {
    /// Create a route table unless one with the same Name exists in the network
    Create {
        #[arg(long)]
        vpc_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        env: String,
    },
    /// Delete a route table by ID
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Associate a route table with a subnet
    Associate {
        #[arg(long)]
        route_table_id: String,
        #[arg(long)]
        subnet_id: String,
    },
    /// Remove a (non-main) route table association
    Disassociate {
        #[arg(long, required_unless_present = "subnet_id")]
        association_id: Option<String>,
        /// Disassociate whatever table the subnet is associated with
        #[arg(long, conflicts_with = "association_id")]
        subnet_id: Option<String>,
    },
    /// List route tables
    List {
        #[arg(long)]
        vpc_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum GatewayCommands {
    /// Create an internet gateway unless one with the same Name and Environment exists
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        env: String,
    },
    /// Delete an internet gateway by ID
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Attach a gateway to a network
    Attach {
        #[arg(long)]
        gateway_id: String,
        #[arg(long)]
        vpc_id: String,
    },
    /// Detach a gateway from a network
    Detach {
        #[arg(long)]
        gateway_id: String,
        #[arg(long)]
        vpc_id: String,
    },
    /// List internet gateways
    List {
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RouteCommands {
    /// Add a route through an internet gateway unless the destination is already routed
    Create {
        #[arg(long)]
        route_table_id: String,
        #[arg(long, default_value = "0.0.0.0/0")]
        destination: String,
        #[arg(long)]
        gateway_id: String,
    },
    /// Remove a route
    Delete {
        #[arg(long)]
        route_table_id: String,
        #[arg(long, default_value = "0.0.0.0/0")]
        destination: String,
    },
    /// List the routes of a route table
    List {
        #[arg(long)]
        route_table_id: String,
    },
}

pub async fn run_vpc(provider: &dyn Provider, command: VpcCommands) -> Result<(), String> {
    match command {
        VpcCommands::Create {
            cidr,
            name,
            env,
            enable_dns,
        } => {
            let network = Resource::new(ResourceSpec::Network {
                cidr_block: cidr,
                enable_dns,
            })
            .with_tags(Tags::named(name, env));
            ensure_and_print(provider, &network).await.map(|_| ())
        }
        VpcCommands::Delete {
            id,
            cidr,
            name,
            env,
        } => match (id, name, env) {
            (Some(id), _, _) => delete_by_id(provider, ResourceKind::Network, &id).await,
            (None, Some(name), Some(env)) => {
                let mut filters = Filters::new().tag("Name", name).tag("Environment", env);
                if let Some(cidr) = cidr {
                    filters = filters.attribute(attr::CIDR_BLOCK, cidr);
                }
                delete_matching(provider, ResourceKind::Network, &filters).await
            }
            _ => Err("pass --id, or --name and --env (optionally --cidr)".to_string()),
        },
        VpcCommands::List { name } => {
            list_and_print(provider, ResourceKind::Network, &Filters::new(), name.as_deref()).await
        }
    }
}

pub async fn run_subnet(provider: &dyn Provider, command: SubnetCommands) -> Result<(), String> {
    match command {
        SubnetCommands::Create {
            vpc_id,
            cidr,
            az,
            name,
            env,
        } => {
            // The network must exist before anything is created in it
            resolve(
                provider,
                ResourceKind::Network,
                &Filters::new().attribute(attr::ID, &vpc_id),
            )
            .await
            .map_err(|e| e.to_string())?;
            let subnet = Resource::new(ResourceSpec::Subnet {
                vpc_id,
                cidr_block: cidr,
                availability_zone: az,
            })
            .with_tags(Tags::named(name, env));
            ensure_and_print(provider, &subnet).await.map(|_| ())
        }
        SubnetCommands::Delete { id } => delete_by_id(provider, ResourceKind::Subnet, &id).await,
        SubnetCommands::List { vpc_id, name } => {
            let filters = optional_filters([(attr::VPC_ID, vpc_id.as_ref())]);
            list_and_print(provider, ResourceKind::Subnet, &filters, name.as_deref()).await
        }
    }
}

pub async fn run_route_table(
    provider: &dyn Provider,
    command: RouteTableCommands,
) -> Result<(), String> {
    match command {
        RouteTableCommands::Create { vpc_id, name, env } => {
            resolve(
                provider,
                ResourceKind::Network,
                &Filters::new().attribute(attr::ID, &vpc_id),
            )
            .await
            .map_err(|e| e.to_string())?;
            let table = Resource::new(ResourceSpec::RouteTable { vpc_id })
                .with_tags(Tags::named(name, env));
            ensure_and_print(provider, &table).await.map(|_| ())
        }
        RouteTableCommands::Delete { id } => {
            delete_by_id(provider, ResourceKind::RouteTable, &id).await
        }
        RouteTableCommands::Associate {
            route_table_id,
            subnet_id,
        } => {
            let association = Resource::new(ResourceSpec::RouteTableAssociation {
                route_table_id,
                subnet_id,
            });
            ensure_and_print(provider, &association).await.map(|_| ())
        }
        RouteTableCommands::Disassociate {
            association_id,
            subnet_id,
        } => match (association_id, subnet_id) {
            (Some(id), _) => {
                delete_by_id(provider, ResourceKind::RouteTableAssociation, &id).await
            }
            (None, Some(subnet_id)) => {
                let filters = Filters::new().attribute(attr::SUBNET_ID, subnet_id);
                delete_matching(provider, ResourceKind::RouteTableAssociation, &filters).await
            }
            (None, None) => Err("pass --association-id or --subnet-id".to_string()),
        },
        RouteTableCommands::List { vpc_id, name } => {
            let filters = optional_filters([(attr::VPC_ID, vpc_id.as_ref())]);
            list_and_print(provider, ResourceKind::RouteTable, &filters, name.as_deref()).await
        }
    }
}

pub async fn run_gateway(provider: &dyn Provider, command: GatewayCommands) -> Result<(), String> {
    match command {
        GatewayCommands::Create { name, env } => {
            let gateway =
                Resource::new(ResourceSpec::InternetGateway).with_tags(Tags::named(name, env));
            ensure_and_print(provider, &gateway).await.map(|_| ())
        }
        GatewayCommands::Delete { id } => {
            delete_by_id(provider, ResourceKind::InternetGateway, &id).await
        }
        GatewayCommands::Attach { gateway_id, vpc_id } => {
            let attachment = Resource::new(ResourceSpec::GatewayAttachment { gateway_id, vpc_id });
            ensure_and_print(provider, &attachment).await.map(|_| ())
        }
        GatewayCommands::Detach { gateway_id, vpc_id } => {
            let target = find_by_id(
                provider,
                ResourceKind::GatewayAttachment,
                &attachment_identifier(&gateway_id, &vpc_id),
            )
            .await
            .map_err(|e| e.to_string())?;
            delete_and_print(provider, &target).await
        }
        GatewayCommands::List { name } => {
            list_and_print(
                provider,
                ResourceKind::InternetGateway,
                &Filters::new(),
                name.as_deref(),
            )
            .await
        }
    }
}

pub async fn run_route(provider: &dyn Provider, command: RouteCommands) -> Result<(), String> {
    match command {
        RouteCommands::Create {
            route_table_id,
            destination,
            gateway_id,
        } => {
            let route = Resource::new(ResourceSpec::Route {
                route_table_id,
                destination_cidr_block: destination,
                gateway_id,
            });
            ensure_and_print(provider, &route).await.map(|_| ())
        }
        RouteCommands::Delete {
            route_table_id,
            destination,
        } => {
            let filters = Filters::new()
                .attribute(attr::ROUTE_TABLE_ID, &route_table_id)
                .attribute(attr::ID, route_identifier(&route_table_id, &destination));
            delete_matching(provider, ResourceKind::Route, &filters).await
        }
        RouteCommands::List { route_table_id } => {
            let filters = Filters::new().attribute(attr::ROUTE_TABLE_ID, route_table_id);
            list_and_print(provider, ResourceKind::Route, &filters, None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpcwright_core::memory::MemoryProvider;
    use vpcwright_core::paginate::describe_all;

    async fn states(provider: &MemoryProvider, kind: ResourceKind) -> Vec<String> {
        describe_all(provider, kind, &Filters::new())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.identifier)
            .collect()
    }

    async fn create_network(provider: &MemoryProvider) -> String {
        run_vpc(
            provider,
            VpcCommands::Create {
                cidr: "10.0.0.0/16".into(),
                name: "Test".into(),
                env: "Dev".into(),
                enable_dns: false,
            },
        )
        .await
        .unwrap();
        states(provider, ResourceKind::Network).await.remove(0)
    }

    #[tokio::test]
    async fn vpc_create_is_idempotent_and_deletable_by_name() {
        let provider = MemoryProvider::new();
        create_network(&provider).await;
        create_network(&provider).await;
        assert_eq!(states(&provider, ResourceKind::Network).await.len(), 1);

        run_vpc(
            &provider,
            VpcCommands::Delete {
                id: None,
                cidr: Some("10.0.0.0/16".into()),
                name: Some("Test".into()),
                env: Some("Dev".into()),
            },
        )
        .await
        .unwrap();
        assert!(states(&provider, ResourceKind::Network).await.is_empty());
    }

    #[tokio::test]
    async fn subnet_in_unknown_network_is_a_missing_dependency() {
        let provider = MemoryProvider::new();
        let err = run_subnet(
            &provider,
            SubnetCommands::Create {
                vpc_id: "vpc-absent".into(),
                cidr: "10.0.1.0/24".into(),
                az: None,
                name: "Public-1".into(),
                env: "Dev".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.contains("Missing dependency"));
    }

    #[tokio::test]
    async fn gateway_attach_detach_and_route() {
        let provider = MemoryProvider::new();
        let vpc_id = create_network(&provider).await;

        run_gateway(
            &provider,
            GatewayCommands::Create {
                name: "Test-igw".into(),
                env: "Dev".into(),
            },
        )
        .await
        .unwrap();
        let gateway_id = states(&provider, ResourceKind::InternetGateway).await.remove(0);

        run_gateway(
            &provider,
            GatewayCommands::Attach {
                gateway_id: gateway_id.clone(),
                vpc_id: vpc_id.clone(),
            },
        )
        .await
        .unwrap();

        run_route_table(
            &provider,
            RouteTableCommands::Create {
                vpc_id: vpc_id.clone(),
                name: "Test-rtb".into(),
                env: "Dev".into(),
            },
        )
        .await
        .unwrap();
        let table_id = describe_all(
            &provider,
            ResourceKind::RouteTable,
            &Filters::new().tag("Name", "Test-rtb"),
        )
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.tags.name() == Some("Test-rtb"))
        .unwrap()
        .identifier;

        run_route(
            &provider,
            RouteCommands::Create {
                route_table_id: table_id.clone(),
                destination: "0.0.0.0/0".into(),
                gateway_id: gateway_id.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(states(&provider, ResourceKind::Route).await.len(), 1);

        run_route(
            &provider,
            RouteCommands::Delete {
                route_table_id: table_id,
                destination: "0.0.0.0/0".into(),
            },
        )
        .await
        .unwrap();
        assert!(states(&provider, ResourceKind::Route).await.is_empty());

        run_gateway(&provider, GatewayCommands::Detach { gateway_id, vpc_id })
            .await
            .unwrap();
        assert!(states(&provider, ResourceKind::GatewayAttachment).await.is_empty());
    }

    #[tokio::test]
    async fn main_association_cannot_be_disassociated() {
        let provider = MemoryProvider::new();
        create_network(&provider).await;
        let main = describe_all(&provider, ResourceKind::RouteTableAssociation, &Filters::new())
            .await
            .unwrap()
            .remove(0);

        let err = run_route_table(
            &provider,
            RouteTableCommands::Disassociate {
                association_id: Some(main.identifier),
                subnet_id: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.contains("main route table association"));
    }
}
