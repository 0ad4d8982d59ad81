//! Provider-neutral description of a listed resource

use std::fmt;

/// Kind of cloud resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// GCP Compute Engine instance
    Instance,
    /// Azure resource group
    ResourceGroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Instance => write!(f, "instance"),
            ResourceKind::ResourceGroup => write!(f, "resource-group"),
        }
    }
}

/// One resource returned by a list operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub name: String,
    pub kind: ResourceKind,
    /// Zone for GCP instances, region for Azure resource groups
    pub location: String,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, kind: ResourceKind, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            location: location.into(),
        }
    }
}

impl fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.name, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let item = InventoryItem::new("vm-1", ResourceKind::Instance, "us-central1-a");
        assert_eq!(item.to_string(), "instance vm-1 (us-central1-a)");
    }
}
