//! Inventory lookup: datacenters, folders, clusters and resource pools.
//!
//! Every `find_*` helper lists the whole collection and walks it in order.
//! With a name the first exact match wins; without one the first object
//! returned by vCenter is used.

use crate::error::{VsphereError, VsphereResult};
use crate::types::*;
use crate::vsphere::VsphereClient;

/// Linear search over inventory objects.
///
/// `Some(name)` returns the first object whose name equals `name`;
/// `None` returns the first object.
pub fn find_by_name<T: Named>(items: Vec<T>, name: Option<&str>) -> Option<T> {
    match name {
        Some(wanted) => items.into_iter().find(|item| item.name() == wanted),
        None => items.into_iter().next(),
    }
}

/// Like [`find_by_name`] but turns a miss into a `NotFound` error naming `kind`.
pub fn require_by_name<T: Named>(items: Vec<T>, name: Option<&str>, kind: &str) -> VsphereResult<T> {
    find_by_name(items, name).ok_or_else(|| match name {
        Some(n) => VsphereError::not_found(format!("No {kind} named '{n}'")),
        None => VsphereError::not_found(format!("No {kind} found")),
    })
}

/// Folder type filter values understood by `/api/vcenter/folder`.
pub const FOLDER_TYPE_VM: &str = "VIRTUAL_MACHINE";
pub const FOLDER_TYPE_DATASTORE: &str = "DATASTORE";

/// Datacenter / folder / cluster / resource-pool operations.
pub struct InventoryManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> InventoryManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    // ── Datacenters ─────────────────────────────────────────────────

    pub async fn list_datacenters(&self) -> VsphereResult<Vec<DatacenterSummary>> {
        self.client.get("/api/vcenter/datacenter").await
    }

    pub async fn get_datacenter(&self, datacenter_id: &str) -> VsphereResult<DatacenterInfo> {
        let path = format!("/api/vcenter/datacenter/{datacenter_id}");
        self.client.get(&path).await
    }

    pub async fn find_datacenter(&self, name: Option<&str>) -> VsphereResult<DatacenterSummary> {
        let all = self.list_datacenters().await?;
        require_by_name(all, name, "datacenter")
    }

    // ── Folders ─────────────────────────────────────────────────────

    pub async fn list_folders(&self, folder_type: &str) -> VsphereResult<Vec<FolderSummary>> {
        self.client
            .get_with_params(
                "/api/vcenter/folder",
                &[("type".into(), folder_type.to_string())],
            )
            .await
    }

    /// Find a VM folder by name.
    pub async fn find_vm_folder(&self, name: &str) -> VsphereResult<FolderSummary> {
        let all = self.list_folders(FOLDER_TYPE_VM).await?;
        require_by_name(all, Some(name), "VM folder")
    }

    // ── Clusters ────────────────────────────────────────────────────

    pub async fn list_clusters(&self) -> VsphereResult<Vec<ClusterSummary>> {
        self.client.get("/api/vcenter/cluster").await
    }

    pub async fn get_cluster(&self, cluster_id: &str) -> VsphereResult<ClusterInfo> {
        let path = format!("/api/vcenter/cluster/{cluster_id}");
        self.client.get(&path).await
    }

    pub async fn find_cluster(&self, name: Option<&str>) -> VsphereResult<ClusterSummary> {
        let all = self.list_clusters().await?;
        require_by_name(all, name, "cluster")
    }

    // ── Resource pools ──────────────────────────────────────────────

    pub async fn list_resource_pools(&self) -> VsphereResult<Vec<ResourcePoolSummary>> {
        self.client.get("/api/vcenter/resource-pool").await
    }

    pub async fn find_resource_pool(&self, name: &str) -> VsphereResult<ResourcePoolSummary> {
        let all = self.list_resource_pools().await?;
        require_by_name(all, Some(name), "resource pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools() -> Vec<ResourcePoolSummary> {
        ["Resources", "dev", "prod", "dev"]
            .iter()
            .enumerate()
            .map(|(i, n)| ResourcePoolSummary {
                resource_pool: format!("resgroup-{i}"),
                name: n.to_string(),
            })
            .collect()
    }

    #[test]
    fn no_name_returns_first() {
        let found = find_by_name(pools(), None).unwrap();
        assert_eq!(found.resource_pool, "resgroup-0");
    }

    #[test]
    fn name_returns_first_exact_match() {
        let found = find_by_name(pools(), Some("dev")).unwrap();
        assert_eq!(found.resource_pool, "resgroup-1");
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(find_by_name(pools(), Some("PROD")).is_none());
    }

    #[test]
    fn empty_collection_has_no_default() {
        let empty: Vec<ResourcePoolSummary> = Vec::new();
        assert!(find_by_name(empty, None).is_none());
    }

    #[test]
    fn require_reports_kind_and_name() {
        let err = require_by_name(pools(), Some("qa"), "resource pool").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.message.contains("resource pool named 'qa'"));
    }
}
