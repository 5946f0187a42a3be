//! Datastore lookup and datastore-cluster placement.

use crate::error::{VsphereError, VsphereResult};
use crate::inventory::{require_by_name, InventoryManager, FOLDER_TYPE_DATASTORE};
use crate::types::*;
use crate::vsphere::VsphereClient;

/// Datastore operations.
pub struct StorageManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> StorageManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    /// List all datastores.
    pub async fn list_datastores(&self) -> VsphereResult<Vec<DatastoreSummary>> {
        self.client.get("/api/vcenter/datastore").await
    }

    /// List datastores contained in a folder or datastore cluster.
    pub async fn list_datastores_in_folder(
        &self,
        folder: &str,
    ) -> VsphereResult<Vec<DatastoreSummary>> {
        self.client
            .get_with_params(
                "/api/vcenter/datastore",
                &[("folders".into(), folder.to_string())],
            )
            .await
    }

    /// Find a datastore by exact name.
    pub async fn find_datastore(&self, name: &str) -> VsphereResult<DatastoreSummary> {
        let all = self.list_datastores().await?;
        require_by_name(all, Some(name), "datastore")
    }

    /// Pick a datastore for a new VM inside the named datastore cluster.
    ///
    /// The REST API has no Storage DRS recommendation call, so the member
    /// with the most free space is chosen, which is what SDRS initial
    /// placement favours for a "create" operation.
    pub async fn recommend_datastore(&self, pod_name: &str) -> VsphereResult<DatastoreSummary> {
        let pods = InventoryManager::new(self.client)
            .list_folders(FOLDER_TYPE_DATASTORE)
            .await?;
        let pod = require_by_name(pods, Some(pod_name), "datastore cluster")
            .map_err(|e| VsphereError::placement(e.message))?;

        let members = self.list_datastores_in_folder(&pod.folder).await?;
        pick_most_free(members).ok_or_else(|| {
            VsphereError::placement(format!("Datastore cluster '{pod_name}' has no datastores"))
        })
    }
}

/// Datastore with the largest free space. Ties keep the earlier entry.
pub fn pick_most_free(datastores: Vec<DatastoreSummary>) -> Option<DatastoreSummary> {
    datastores.into_iter().fold(None, |best, ds| match best {
        Some(b) if b.free_space.unwrap_or(0) >= ds.free_space.unwrap_or(0) => Some(b),
        _ => Some(ds),
    })
}
