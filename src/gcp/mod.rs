//! GCP adapter
//!
//! Lists Compute Engine instances across all zones and deletes them.
//!
//! - [`auth`] - Application Default Credentials
//! - [`client`] - Project-scoped Compute API client
//! - [`instances`] - Aggregated listing and deletion

pub mod auth;
pub mod client;
pub mod instances;

pub use client::GcpClient;
pub use instances::{
    delete_all_instances, delete_instance, list_instances, AggregatedInstances, Instance,
    ZoneInstances,
};
