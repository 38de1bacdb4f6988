//! Resource model.
//!
//! Resources are owned by the resource provider. The engine only reads their
//! attributes and asks the provider to mutate them; it never constructs or
//! destroys them itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of resource kinds the engine knows how to govern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[serde(alias = "azure.vm")]
    Vm,
    #[serde(alias = "azure.disk")]
    Disk,
    #[serde(alias = "azure.resourcegroup")]
    ResourceGroup,
    #[serde(alias = "azure.storage")]
    StorageAccount,
    #[serde(alias = "azure.publicip")]
    PublicIp,
    #[serde(alias = "azure.nic")]
    NetworkInterface,
    #[serde(alias = "azure.sql")]
    SqlDatabase,
    #[serde(alias = "azure.applicationgateway")]
    ApplicationGateway,
}

/// Something an action needs the resource kind to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Stop,
    Delete,
    AdjustSku,
    ScaleCapacity,
    Downgrade,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Vm,
        ResourceKind::Disk,
        ResourceKind::ResourceGroup,
        ResourceKind::StorageAccount,
        ResourceKind::PublicIp,
        ResourceKind::NetworkInterface,
        ResourceKind::SqlDatabase,
        ResourceKind::ApplicationGateway,
    ];

    /// Capabilities implemented by this kind.
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            ResourceKind::Vm => &[
                Capability::Stop,
                Capability::Delete,
                Capability::Downgrade,
            ],
            ResourceKind::Disk => &[
                Capability::Delete,
                Capability::AdjustSku,
                Capability::Downgrade,
            ],
            ResourceKind::ResourceGroup => &[Capability::Delete],
            ResourceKind::StorageAccount => &[Capability::AdjustSku],
            ResourceKind::PublicIp => &[Capability::Delete],
            ResourceKind::NetworkInterface => &[Capability::Delete],
            ResourceKind::SqlDatabase => &[Capability::ScaleCapacity],
            ResourceKind::ApplicationGateway => &[Capability::Delete],
        }
    }

    pub fn supports(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Human-readable name used in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            ResourceKind::Vm => "VM",
            ResourceKind::Disk => "Disk",
            ResourceKind::ResourceGroup => "Resource Group",
            ResourceKind::StorageAccount => "Storage Account",
            ResourceKind::PublicIp => "Public IP",
            ResourceKind::NetworkInterface => "Network Interface",
            ResourceKind::SqlDatabase => "SQL Database",
            ResourceKind::ApplicationGateway => "Application Gateway",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Pricing SKU of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,

    /// Service tier, e.g. `Standard` for a database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    /// Provisioned capacity, e.g. DTUs for a database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// Kind-specific attachment state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    #[default]
    None,
    PublicIp {
        /// Active IP configuration using this address.
        #[serde(default)]
        ip_configuration: Option<String>,
    },
    NetworkInterface {
        /// Compute instance the interface is attached to.
        #[serde(default)]
        virtual_machine: Option<String>,
        /// Private endpoint the interface is bound to.
        #[serde(default)]
        private_endpoint: Option<String>,
    },
    ApplicationGateway {
        #[serde(default)]
        backend_pools: Vec<BackendPool>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPool {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// A live cloud resource as reported by the resource provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub kind: ResourceKind,

    /// Parent grouping (e.g. resource group) as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// `None` means the resource kind carries no tags at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,

    /// Identifier of the resource that manages this one, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,

    #[serde(default)]
    pub attachment: Attachment,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            group: None,
            location: None,
            tags: None,
            sku: None,
            managed_by: None,
            attachment: Attachment::None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_sku(mut self, sku: Sku) -> Self {
        self.sku = Some(sku);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn with_managed_by(mut self, managed_by: impl Into<String>) -> Self {
        self.managed_by = Some(managed_by.into());
        self
    }

    pub fn sku_name(&self) -> Option<&str> {
        self.sku.as_ref().map(|s| s.name.as_str())
    }

    pub fn sku_tier(&self) -> Option<&str> {
        self.sku.as_ref().and_then(|s| s.tier.as_deref())
    }

    pub fn sku_capacity(&self) -> Option<u32> {
        self.sku.as_ref().and_then(|s| s.capacity)
    }

    pub fn is_managed_by_other_resource(&self) -> bool {
        self.managed_by.is_some()
    }
}

/// Power state reported by the provider for compute resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    Running,
    Starting,
    Stopping,
    /// Stopped but still allocated (and billed).
    Stopped,
    Deallocating,
    Deallocated,
    Unknown,
}

impl PowerState {
    /// Parse a provider status code such as `PowerState/deallocated`.
    pub fn from_code(code: &str) -> Self {
        let state = code.strip_prefix("PowerState/").unwrap_or(code);
        match state.to_ascii_lowercase().as_str() {
            "running" => PowerState::Running,
            "starting" => PowerState::Starting,
            "stopping" => PowerState::Stopping,
            "stopped" => PowerState::Stopped,
            "deallocating" => PowerState::Deallocating,
            "deallocated" => PowerState::Deallocated,
            _ => PowerState::Unknown,
        }
    }

    /// Only a deallocated resource has stopped accruing compute cost.
    pub fn is_stopped(self) -> bool {
        matches!(self, PowerState::Deallocated)
    }
}

/// A single point of a utilization time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}
