//! Azure adapter
//!
//! Lists the resource groups of a subscription and deletes them.
//!
//! - [`auth`] - Default credential chain (token, service principal, Azure CLI)
//! - [`client`] - Subscription-scoped Resource Manager client
//! - [`resource_groups`] - Listing, deletion and operation polling

pub mod auth;
pub mod client;
pub mod resource_groups;

pub use client::AzureClient;
pub use resource_groups::{
    delete_all_resource_groups, delete_resource_group, list_resource_groups, ResourceGroup,
};
