//! Deletes every Compute Engine instance of the project named in
//! `$HOME/.config/clean_cloud.json`.

use anyhow::{Context, Result};
use clean_cloud::config::Config;
use clean_cloud::gcp::{self, GcpClient};
use clean_cloud::logging::setup_logging;
use clean_cloud::CleanError;

/// Small pages, matching the historical behaviour of this entry point
const PAGE_SIZE: u32 = 3;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _log_guard = setup_logging(false, None).context("Failed to set up logging")?;

    let config = Config::load();
    if !config.has_project() {
        tracing::error!("No project_id in configuration, refusing to clean");
        return Err(CleanError::EmptyProject.into());
    }
    tracing::info!("Cleaning project {}", config.project_id);

    let client = GcpClient::new(&config.project_id)
        .await
        .context("Failed to create GCP client")?
        .with_page_size(PAGE_SIZE);

    let deleted = gcp::delete_all_instances(&client)
        .await
        .context("Instance cleanup stopped")?;
    tracing::info!("Deleted {} instances", deleted);
    Ok(())
}
