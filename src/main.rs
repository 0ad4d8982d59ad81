use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clean_cloud::azure::{self, AzureClient};
use clean_cloud::error::required_env;
use clean_cloud::gcp::{self, GcpClient};
use clean_cloud::logging::setup_logging;
use std::path::PathBuf;

const PROJECT_ID_ENV: &str = "PROJECT_ID";
const SUBSCRIPTION_ID_ENV: &str = "AZURE_SUBSCRIPTION_ID";

/// Enumerate and delete leftover cloud resources
#[derive(Parser, Debug)]
#[command(name = "clean-cloud", version, about, long_about = None)]
struct Args {
    /// Enable debug mode
    #[arg(long, global = true)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GCP commands (requires PROJECT_ID)
    Gcp {
        #[command(subcommand)]
        action: Action,
    },
    /// Azure commands (requires AZURE_SUBSCRIPTION_ID)
    Azure {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Action {
    /// List elements to clean
    List,
    /// Clean elements
    Clean {
        /// Actually delete; without it only the inventory is printed
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard =
        setup_logging(args.debug, args.log_file.as_deref()).context("Failed to set up logging")?;

    match args.command {
        Command::Gcp { action } => {
            let project_id = require(PROJECT_ID_ENV)?;
            tracing::debug!("Using project: {}", project_id);
            let client = GcpClient::new(&project_id)
                .await
                .context("Failed to create GCP client")?;
            match action {
                Action::List => gcp_list(&client).await,
                Action::Clean { yes } => gcp_clean(&client, yes).await,
            }
        }
        Command::Azure { action } => {
            let subscription_id = require(SUBSCRIPTION_ID_ENV)?;
            tracing::debug!("Using subscription: {}", subscription_id);
            let client =
                AzureClient::new(&subscription_id).context("Failed to create Azure client")?;
            match action {
                Action::List => azure_list(&client).await,
                Action::Clean { yes } => azure_clean(&client, yes).await,
            }
        }
    }
}

/// Fail before any credential or network work when `name` is unset
fn require(name: &'static str) -> Result<String> {
    required_env(name).map_err(|e| {
        tracing::error!("{}", e);
        e.into()
    })
}

async fn gcp_list(client: &GcpClient) -> Result<()> {
    let zones = gcp::list_instances(client)
        .await
        .context("Failed to list instances")?;

    if zones.is_empty() {
        println!("No instances");
        return Ok(());
    }

    println!("Instances:");
    for group in &zones {
        println!("zones/{}", group.zone);
        for instance in &group.instances {
            println!(
                "- {} {} {}",
                instance.name,
                instance.machine_type_short(),
                instance.status
            );
        }
    }
    Ok(())
}

async fn gcp_clean(client: &GcpClient, yes: bool) -> Result<()> {
    if !yes {
        let zones = gcp::list_instances(client)
            .await
            .context("Failed to list instances")?;
        let items: Vec<_> = zones.iter().flat_map(|z| z.inventory()).collect();
        return print_dry_run(&items);
    }

    let deleted = gcp::delete_all_instances(client)
        .await
        .context("Instance cleanup stopped")?;
    println!("Deleted {} instances", deleted);
    Ok(())
}

async fn azure_list(client: &AzureClient) -> Result<()> {
    let groups = azure::list_resource_groups(client)
        .await
        .context("Failed to list resource groups")?;

    if groups.is_empty() {
        println!("No Resource groups");
        return Ok(());
    }

    println!("Resource groups:");
    for group in &groups {
        println!(
            "- {} {} {}",
            group.name,
            group.location,
            group.provisioning_state()
        );
    }
    Ok(())
}

async fn azure_clean(client: &AzureClient, yes: bool) -> Result<()> {
    if !yes {
        let groups = azure::list_resource_groups(client)
            .await
            .context("Failed to list resource groups")?;
        let items: Vec<_> = groups.iter().map(|g| g.to_inventory_item()).collect();
        return print_dry_run(&items);
    }

    let deleted = azure::delete_all_resource_groups(client)
        .await
        .context("Resource group cleanup stopped")?;
    println!("Deleted {} resource groups", deleted);
    Ok(())
}

fn print_dry_run(items: &[clean_cloud::InventoryItem]) -> Result<()> {
    if items.is_empty() {
        println!("Nothing to delete");
        return Ok(());
    }

    println!("Would delete:");
    for item in items {
        println!("- {}", item);
    }
    println!("Re-run with --yes to delete {} resources", items.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gcp_list() {
        let args = Args::try_parse_from(["clean-cloud", "gcp", "list"]).unwrap();
        assert!(!args.debug);
        assert!(matches!(
            args.command,
            Command::Gcp {
                action: Action::List
            }
        ));
    }

    #[test]
    fn test_parse_azure_clean_with_global_debug() {
        let args =
            Args::try_parse_from(["clean-cloud", "azure", "clean", "--yes", "--debug"]).unwrap();
        assert!(args.debug);
        assert!(matches!(
            args.command,
            Command::Azure {
                action: Action::Clean { yes: true }
            }
        ));
    }

    #[test]
    fn test_clean_defaults_to_dry_run() {
        let args = Args::try_parse_from(["clean-cloud", "gcp", "clean"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Gcp {
                action: Action::Clean { yes: false }
            }
        ));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Args::try_parse_from(["clean-cloud", "aws", "list"]).is_err());
    }
}
