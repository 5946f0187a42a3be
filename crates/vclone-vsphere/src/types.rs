//! Shared wire types for the vSphere REST API.
//!
//! Field names follow the API's own snake_case JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Connection / Config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything needed to open a session against a vCenter.
#[derive(Clone)]
pub struct VsphereConfig {
    /// vCenter hostname / IP (e.g. "vcenter.lab.local")
    pub host: String,
    /// Port (default 443)
    pub port: u16,
    /// Username (e.g. "administrator@vsphere.local")
    pub username: String,
    /// Password
    pub password: String,
    /// Skip TLS certificate verification (self-signed labs)
    pub insecure: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VsphereConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 443,
            username: String::new(),
            password: String::new(),
            insecure: false,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for VsphereConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VsphereConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Named inventory objects
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An inventory object that has a display name and a managed-object id.
pub trait Named {
    fn name(&self) -> &str;
    fn id(&self) -> &str;
}

macro_rules! impl_named {
    ($ty:ty, $id:ident) => {
        impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn id(&self) -> &str {
                &self.$id
            }
        }
    };
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VM Power State
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmPowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
    #[default]
    #[serde(other)]
    Unknown,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VM Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Concise VM summary (from list endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmSummary {
    /// vSphere managed-object ID (e.g. "vm-42")
    pub vm: String,
    pub name: String,
    #[serde(default)]
    pub power_state: VmPowerState,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    #[serde(default, rename = "memory_size_MiB")]
    pub memory_size_mib: Option<u64>,
}

impl_named!(VmSummary, vm);

/// VM detail (from GET /api/vcenter/vm/{vm}); only the parts we read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmInfo {
    pub name: String,
    #[serde(default)]
    pub power_state: VmPowerState,
    #[serde(default)]
    pub guest_os: Option<String>,
    /// Virtual disks keyed by device id ("2000", "2001", ...).
    #[serde(default)]
    pub disks: BTreeMap<String, VmDiskInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmDiskInfo {
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub disk_type: Option<String>,
    #[serde(default)]
    pub capacity: Option<u64>,
    #[serde(default)]
    pub backing: Option<VmDiskBacking>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmDiskBacking {
    #[serde(default, rename = "type")]
    pub backing_type: String,
    /// Datastore path, e.g. "[datastore1] web/web.vmdk"
    #[serde(default)]
    pub vmdk_file: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Datastore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreSummary {
    pub datastore: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub ds_type: Option<String>,
    #[serde(default)]
    pub free_space: Option<u64>,
    #[serde(default)]
    pub capacity: Option<u64>,
}

impl_named!(DatastoreSummary, datastore);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Network
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub network: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub network_type: Option<String>,
}

impl_named!(NetworkSummary, network);

/// Network type reported for NSX-T segments.
pub const OPAQUE_NETWORK: &str = "OPAQUE_NETWORK";

/// Spec to create a NIC on a VM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicCreateSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub nic_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing: Option<NicBackingSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_guest_control: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicBackingSpec {
    #[serde(rename = "type")]
    pub backing_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Cluster / Datacenter / Folder / Resource Pool
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: String,
    pub name: String,
    #[serde(default)]
    pub ha_enabled: Option<bool>,
    #[serde(default)]
    pub drs_enabled: Option<bool>,
}

impl_named!(ClusterSummary, cluster);

/// GET /api/vcenter/cluster/{cluster}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub name: String,
    /// Root resource pool of the cluster.
    pub resource_pool: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatacenterSummary {
    pub datacenter: String,
    pub name: String,
}

impl_named!(DatacenterSummary, datacenter);

/// GET /api/vcenter/datacenter/{datacenter}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatacenterInfo {
    pub name: String,
    pub vm_folder: String,
    #[serde(default)]
    pub datastore_folder: Option<String>,
    #[serde(default)]
    pub host_folder: Option<String>,
    #[serde(default)]
    pub network_folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSummary {
    pub folder: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub folder_type: Option<String>,
}

impl_named!(FolderSummary, folder);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePoolSummary {
    pub resource_pool: String,
    pub name: String,
}

impl_named!(ResourcePoolSummary, resource_pool);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Task
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Blocked,
    Succeeded,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// GET /api/cis/tasks/{task}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl TaskInfo {
    /// Best-effort human message from the task's error structure.
    ///
    /// vCenter reports `{ "error_type": ..., "messages": [{ "default_message": ... }] }`.
    pub fn error_message(&self) -> String {
        let Some(err) = &self.error else {
            return "task failed without an error description".to_string();
        };
        let messages: Vec<&str> = err
            .get("messages")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m.get("default_message").and_then(|d| d.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        if !messages.is_empty() {
            return messages.join("; ");
        }
        match err.get("error_type").and_then(|t| t.as_str()) {
            Some(kind) => kind.to_string(),
            None => err.to_string(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VM Clone
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmCloneSpec {
    pub name: String,
    /// Identifier of the template / source VM.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<ClonePlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_on: Option<bool>,
}

/// Where the clone lands. Absent fields inherit from the source VM.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClonePlacement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_debug_redacts_password() {
        let cfg = VsphereConfig {
            host: "vc".into(),
            username: "admin".into(),
            password: "hunter2".into(),
            ..Default::default()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn vm_info_disks_are_ordered_by_key() {
        let info: VmInfo = serde_json::from_value(json!({
            "name": "tmpl",
            "power_state": "POWERED_OFF",
            "disks": {
                "2001": { "label": "Hard disk 2", "backing": { "type": "VMDK_FILE", "vmdk_file": "[ds2] tmpl/tmpl_1.vmdk" } },
                "2000": { "label": "Hard disk 1", "backing": { "type": "VMDK_FILE", "vmdk_file": "[ds1] tmpl/tmpl.vmdk" } }
            }
        }))
        .unwrap();
        let first = info.disks.values().next().unwrap();
        assert_eq!(first.label, "Hard disk 1");
    }

    #[test]
    fn unknown_power_state_maps_to_unknown() {
        let vm: VmSummary =
            serde_json::from_value(json!({ "vm": "vm-1", "name": "a", "power_state": "WEIRD" }))
                .unwrap();
        assert_eq!(vm.power_state, VmPowerState::Unknown);
    }

    #[test]
    fn clone_spec_omits_absent_placement_fields() {
        let spec = VmCloneSpec {
            name: "web-01".into(),
            source: "vm-10".into(),
            placement: Some(ClonePlacement {
                folder: Some("group-v3".into()),
                resource_pool: Some("resgroup-8".into()),
                ..Default::default()
            }),
            power_on: Some(true),
        };
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            v,
            json!({
                "name": "web-01",
                "source": "vm-10",
                "placement": { "folder": "group-v3", "resource_pool": "resgroup-8" },
                "power_on": true
            })
        );
    }

    #[test]
    fn task_error_message_prefers_default_messages() {
        let task: TaskInfo = serde_json::from_value(json!({
            "status": "FAILED",
            "error": {
                "error_type": "RESOURCE_IN_USE",
                "messages": [
                    { "id": "a", "default_message": "The name 'web-01' already exists." }
                ]
            }
        }))
        .unwrap();
        assert_eq!(task.error_message(), "The name 'web-01' already exists.");
    }

    #[test]
    fn task_error_message_falls_back_to_error_type() {
        let task: TaskInfo = serde_json::from_value(json!({
            "status": "FAILED",
            "error": { "error_type": "NOT_ALLOWED_IN_CURRENT_STATE", "messages": [] }
        }))
        .unwrap();
        assert_eq!(task.error_message(), "NOT_ALLOWED_IN_CURRENT_STATE");
    }

    #[test]
    fn nic_spec_serializes_backing_type() {
        let spec = NicCreateSpec {
            nic_type: Some("VMXNET3".into()),
            backing: Some(NicBackingSpec {
                backing_type: OPAQUE_NETWORK.into(),
                network: Some("network-o12".into()),
            }),
            start_connected: Some(true),
            allow_guest_control: None,
        };
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["type"], "VMXNET3");
        assert_eq!(v["backing"]["type"], "OPAQUE_NETWORK");
        assert!(v.get("allow_guest_control").is_none());
    }
}
