//! Enumerate and delete leftover cloud resources.
//!
//! Two provider adapters share one flow: list the inventory, then delete
//! each item in order, waiting for every long-running delete and stopping
//! at the first failure.
//!
//! - [`gcp`] - Compute Engine instances across all zones
//! - [`azure`] - Resource groups of a subscription
//! - [`config`] - `clean_cloud.json` for the `clean-gcp` entry point

pub mod azure;
pub mod config;
pub mod error;
pub mod gcp;
pub mod http;
pub mod inventory;
pub mod logging;

pub use error::{CleanError, Result};
pub use inventory::{InventoryItem, ResourceKind};
