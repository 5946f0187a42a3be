//! VM listing and cloning via the vSphere REST API.

use crate::error::VsphereResult;
use crate::inventory::require_by_name;
use crate::types::*;
use crate::vsphere::VsphereClient;

/// VM operations backed by `VsphereClient`.
pub struct VmManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> VmManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    // ── List / Get ──────────────────────────────────────────────────

    /// List all VMs visible to the session.
    pub async fn list_vms(&self) -> VsphereResult<Vec<VmSummary>> {
        self.client.get("/api/vcenter/vm").await
    }

    /// Get details for a single VM.
    pub async fn get_vm(&self, vm_id: &str) -> VsphereResult<VmInfo> {
        let path = format!("/api/vcenter/vm/{vm_id}");
        self.client.get(&path).await
    }

    /// Find a VM by exact name (first match).
    pub async fn find_vm(&self, name: &str) -> VsphereResult<VmSummary> {
        let vms = self.list_vms().await?;
        require_by_name(vms, Some(name), "VM")
    }

    // ── Clone ───────────────────────────────────────────────────────

    /// Start a clone as a vCenter task. Returns the task identifier;
    /// the task result is the new VM's identifier.
    pub async fn clone_vm(&self, spec: &VmCloneSpec) -> VsphereResult<String> {
        tracing::debug!(name = %spec.name, source = %spec.source, placement = ?spec.placement, "submitting clone");
        self.client
            .post_task("/api/vcenter/vm?action=clone", spec)
            .await
    }
}

/// Datastore holding the VM's first disk, from its `"[datastore] path"` backing.
pub fn template_datastore_name(info: &VmInfo) -> Option<String> {
    info.disks
        .values()
        .find_map(|disk| disk.backing.as_ref()?.vmdk_file.as_deref())
        .and_then(datastore_from_path)
}

/// Extract `datastore1` from `"[datastore1] dir/file.vmdk"`.
pub fn datastore_from_path(path: &str) -> Option<String> {
    let rest = path.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    let name = &rest[..end];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn datastore_from_vmdk_path() {
        assert_eq!(
            datastore_from_path("[datastore1] web/web.vmdk").as_deref(),
            Some("datastore1")
        );
        assert_eq!(
            datastore_from_path("[vsan Datastore] 5f3e/tmpl.vmdk").as_deref(),
            Some("vsan Datastore")
        );
    }

    #[test]
    fn malformed_paths_have_no_datastore() {
        assert_eq!(datastore_from_path("web/web.vmdk"), None);
        assert_eq!(datastore_from_path("[] web.vmdk"), None);
        assert_eq!(datastore_from_path("[unterminated web.vmdk"), None);
    }

    #[test]
    fn template_datastore_uses_first_disk_with_a_file() {
        let info: VmInfo = serde_json::from_value(json!({
            "name": "tmpl",
            "disks": {
                "2000": { "label": "Hard disk 1", "backing": { "type": "VMDK_FILE", "vmdk_file": "[fast-ssd] tmpl/tmpl.vmdk" } },
                "2001": { "label": "Hard disk 2", "backing": { "type": "VMDK_FILE", "vmdk_file": "[bulk] tmpl/tmpl_1.vmdk" } }
            }
        }))
        .unwrap();
        assert_eq!(template_datastore_name(&info).as_deref(), Some("fast-ssd"));
    }

    #[test]
    fn template_without_disks_has_no_datastore() {
        let info: VmInfo = serde_json::from_value(json!({ "name": "empty" })).unwrap();
        assert_eq!(template_datastore_name(&info), None);
    }
}
