//! Human-readable output

use colored::Colorize;

use vpcwright_core::builder::BuildReport;
use vpcwright_core::provision::Provisioned;
use vpcwright_core::resource::{ResourceKind, State, attr};
use vpcwright_core::teardown::{StepOutcome, TeardownReport};

/// Attributes worth a column when listing `kind`
fn columns(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::Network => &[attr::CIDR_BLOCK, attr::STATE],
        ResourceKind::Subnet => &[attr::VPC_ID, attr::CIDR_BLOCK, attr::AVAILABILITY_ZONE],
        ResourceKind::RouteTable => &[attr::VPC_ID, attr::MAIN],
        ResourceKind::RouteTableAssociation => &[attr::ROUTE_TABLE_ID, attr::SUBNET_ID, attr::MAIN],
        ResourceKind::InternetGateway => &[attr::VPC_ID],
        ResourceKind::GatewayAttachment => &[attr::GATEWAY_ID, attr::VPC_ID],
        ResourceKind::Route => &[attr::DESTINATION_CIDR_BLOCK, attr::GATEWAY_ID],
        ResourceKind::SecurityGroup => &[attr::VPC_ID, attr::DESCRIPTION],
        ResourceKind::SecurityGroupRule => &[
            attr::DIRECTION,
            attr::PROTOCOL,
            attr::FROM_PORT,
            attr::TO_PORT,
            attr::SOURCE_CIDR,
            attr::SOURCE_GROUP_ID,
        ],
        ResourceKind::KeyPair => &[attr::KEY_FINGERPRINT],
        ResourceKind::Instance => &[
            attr::STATE,
            attr::INSTANCE_TYPE,
            attr::PRIVATE_IP,
            attr::PUBLIC_IP,
        ],
        ResourceKind::Image => &[attr::STATE],
        ResourceKind::InstanceType => &[attr::VCPUS, attr::MEMORY_MIB],
    }
}

/// One-line summary: identifier, name, then the kind's columns
pub fn summary(state: &State) -> String {
    let mut parts = vec![state.identifier.clone()];
    if let Some(name) = state.display_name()
        && name != state.identifier
    {
        parts.push(format!("\"{}\"", name));
    }
    for key in columns(state.kind) {
        if let Some(value) = state.attribute(key) {
            parts.push(format!("{}={}", key, value));
        }
    }
    if let Some(env) = state.tags.environment() {
        parts.push(format!("env={}", env));
    }
    parts.join("  ")
}

pub fn print_list(kind: ResourceKind, states: &[State]) {
    if states.is_empty() {
        println!("{}", format!("No {} resources found.", kind).yellow());
        return;
    }
    for state in states {
        println!("  {}", summary(state));
    }
    println!();
    println!("{}", format!("{} {} resource(s)", states.len(), kind).bold());
}

pub fn print_provisioned(provisioned: &Provisioned) {
    let state = provisioned.state();
    match provisioned {
        Provisioned::Created(_) => {
            println!("  {} Created {} {}", "✓".green(), state.kind, summary(state))
        }
        Provisioned::Existing(_) => {
            println!("  {} Exists  {} {}", "•".yellow(), state.kind, summary(state))
        }
    }
}

pub fn print_deleted(state: &State) {
    println!("  {} Deleted {} {}", "✓".green(), state.kind, state.identifier);
}

/// Instances that reached `running`, with the addresses they came up with
pub fn print_running(states: &[State]) {
    for state in states {
        println!("  {} Running {}", "✓".green(), summary(state));
    }
}

/// Key material is only ever returned by the create call
pub fn print_key_material(state: &State) {
    if let Some(material) = state.attribute(attr::KEY_MATERIAL) {
        println!();
        println!(
            "{}",
            "Private key (shown once, it cannot be retrieved again):"
                .yellow()
                .bold()
        );
        println!("{}", material);
    }
}

pub fn print_build_report(report: &BuildReport) {
    for outcome in &report.completed {
        println!("{}", outcome.step.to_string().cyan().bold());
        for provisioned in &outcome.resources {
            print_provisioned(provisioned);
        }
    }

    println!();
    match &report.failed {
        None => println!(
            "{}",
            format!("Network ready! {} resource(s) created.", report.created())
                .green()
                .bold()
        ),
        Some((step, err)) => {
            println!("  {} {} - {}", "✗".red(), step, err);
            println!();
            println!(
                "{}",
                format!(
                    "Build stopped at step {}. {} step(s) completed, nothing was rolled back.",
                    step.number(),
                    report.completed.len()
                )
                .red()
                .bold()
            );
        }
    }
}

pub fn print_teardown_report(report: &TeardownReport) {
    for (step, outcome) in &report.steps {
        match outcome {
            StepOutcome::Done(ids) => {
                println!("  {} {} ({})", "✓".green(), step, ids.join(", "))
            }
            StepOutcome::Skipped(reason) => {
                println!("  {} {} - skipped: {}", "-".dimmed(), step, reason)
            }
        }
    }

    println!();
    match &report.failed {
        None => println!("{}", "Teardown complete!".green().bold()),
        Some((step, err)) => {
            println!("  {} {} - {}", "✗".red(), step, err);
            println!();
            println!(
                "{}",
                format!(
                    "Teardown stopped at step {}. Remaining steps were not attempted.",
                    step.number()
                )
                .red()
                .bold()
            );
        }
    }
}
