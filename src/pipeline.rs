//! The clone run: login, resolve placement, clone each VM, attach NICs,
//! logout.

use crate::config::{CloneConfig, Placement};

use vclone_vsphere::inventory::InventoryManager;
use vclone_vsphere::network::NetworkManager;
use vclone_vsphere::storage::StorageManager;
use vclone_vsphere::task::{result_id, TaskManager};
use vclone_vsphere::types::{ClonePlacement, NetworkSummary, VmCloneSpec, VmInfo, VmSummary};
use vclone_vsphere::vm::{template_datastore_name, VmManager};
use vclone_vsphere::{VsphereClient, VsphereError, VsphereResult};

/// One successfully created clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedVm {
    pub name: String,
    /// New VM identifier when vCenter reported or we looked it up.
    pub vm: Option<String>,
    /// Identifier of the attached NIC, when a network was requested.
    pub nic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneReport {
    pub created: Vec<CreatedVm>,
}

/// Placement resolved to managed-object identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlacement {
    pub folder: String,
    pub resource_pool: String,
    /// `None` leaves the datastore choice to vCenter (the source's).
    pub datastore: Option<String>,
}

impl ResolvedPlacement {
    fn to_spec(&self) -> ClonePlacement {
        ClonePlacement {
            folder: Some(self.folder.clone()),
            resource_pool: Some(self.resource_pool.clone()),
            datastore: self.datastore.clone(),
            ..Default::default()
        }
    }
}

/// Connect to the configured vCenter and run the whole job.
pub async fn run(config: &CloneConfig) -> VsphereResult<CloneReport> {
    let client = VsphereClient::new(&config.connection())?;
    run_with_client(client, config).await
}

/// Run the job on a prepared (not yet logged-in) client.
///
/// The session is closed whether or not the job succeeds.
pub async fn run_with_client(
    mut client: VsphereClient,
    config: &CloneConfig,
) -> VsphereResult<CloneReport> {
    client.login().await?;
    tracing::info!(host = %config.host, user = %config.user, "connected to vCenter");

    let outcome = clone_all(&client, config).await;

    client.logout().await;
    outcome
}

async fn clone_all(client: &VsphereClient, config: &CloneConfig) -> VsphereResult<CloneReport> {
    let vms = VmManager::new(client);

    let template = vms.find_vm(&config.template).await.map_err(|e| {
        if e.is_not_found() {
            VsphereError::not_found(format!("template '{}' not found", config.template))
        } else {
            e
        }
    })?;
    tracing::debug!(?template, "found template");
    let template_info = vms.get_vm(&template.vm).await?;

    let placement = resolve_placement(client, &config.placement, &template_info).await?;
    tracing::debug!(?placement, "resolved placement");

    let network = match &config.opaque_network {
        Some(name) => Some(NetworkManager::new(client).find_network(name).await?),
        None => None,
    };

    let mut report = CloneReport::default();
    for name in &config.vms {
        let vm = match clone_and_wait(client, config, &template, &placement, name).await {
            Ok(vm) => vm,
            Err(e) => return Err(stop(&report, name, None, e)),
        };
        let created = match network.as_ref() {
            Some(net) => match attach(client, name, vm, net).await {
                Ok(created) => created,
                Err(e) => return Err(stop(&report, name, Some(name.as_str()), e)),
            },
            None => CreatedVm {
                name: name.clone(),
                vm,
                nic: None,
            },
        };
        tracing::info!(vm = %name, id = created.vm.as_deref().unwrap_or("?"), "clone complete");
        report.created.push(created);
    }
    Ok(report)
}

/// Log a failure that ends the run and hand the error back.
///
/// `cloned` names a VM that exists although its own step failed.
fn stop(report: &CloneReport, name: &str, cloned: Option<&str>, e: VsphereError) -> VsphereError {
    tracing::error!(vm = %name, error = %e, "clone failed, stopping");
    let done = left_in_place(&report.created, cloned);
    if !done.is_empty() {
        tracing::warn!(created = ?done, "VMs already created are left in place");
    }
    e
}

/// Names of VMs that exist on vCenter when a run stops early.
pub fn left_in_place<'a>(created: &'a [CreatedVm], cloned: Option<&'a str>) -> Vec<&'a str> {
    created
        .iter()
        .map(|c| c.name.as_str())
        .chain(cloned)
        .collect()
}

/// Turn placement names into identifiers, applying the defaults.
pub async fn resolve_placement(
    client: &VsphereClient,
    wanted: &Placement,
    template: &VmInfo,
) -> VsphereResult<ResolvedPlacement> {
    let inventory = InventoryManager::new(client);
    let storage = StorageManager::new(client);

    let datacenter = inventory.find_datacenter(wanted.datacenter.as_deref()).await?;

    let folder = match &wanted.vm_folder {
        Some(name) => inventory.find_vm_folder(name).await?.folder,
        None => inventory.get_datacenter(&datacenter.datacenter).await?.vm_folder,
    };

    let template_datastore = template_datastore_name(template);

    // The cluster only supplies the default pool.
    let resource_pool = match &wanted.resource_pool {
        Some(name) => inventory.find_resource_pool(name).await?.resource_pool,
        None => {
            if wanted.cluster.is_none() {
                tracing::warn!("No cluster passed. Using the first one found, which may not be what you want");
            }
            let cluster = inventory.find_cluster(wanted.cluster.as_deref()).await?;
            inventory.get_cluster(&cluster.cluster).await?.resource_pool
        }
    };

    // A datastore cluster overrides an explicit datastore.
    let datastore = if let Some(pod) = &wanted.datastore_cluster {
        match storage.recommend_datastore(pod).await {
            Ok(ds) => {
                tracing::info!(datastore_cluster = %pod, datastore = %ds.name, "datastore chosen from cluster");
                Some(ds.datastore)
            }
            Err(e) => {
                tracing::warn!(datastore_cluster = %pod, error = %e, "no datastore recommendation, using the template's datastore");
                template_datastore_id(&storage, template_datastore.as_deref()).await
            }
        }
    } else if let Some(name) = &wanted.datastore {
        Some(storage.find_datastore(name).await?.datastore)
    } else {
        template_datastore_id(&storage, template_datastore.as_deref()).await
    };

    Ok(ResolvedPlacement {
        folder,
        resource_pool,
        datastore,
    })
}

async fn template_datastore_id(storage: &StorageManager<'_>, name: Option<&str>) -> Option<String> {
    let name = name?;
    match storage.find_datastore(name).await {
        Ok(ds) => Some(ds.datastore),
        Err(e) => {
            tracing::warn!(datastore = %name, error = %e, "template datastore not resolvable, leaving placement to vCenter");
            None
        }
    }
}

/// Submit one clone and wait for it; returns the new VM id when the task
/// reported one.
async fn clone_and_wait(
    client: &VsphereClient,
    config: &CloneConfig,
    template: &VmSummary,
    placement: &ResolvedPlacement,
    name: &str,
) -> VsphereResult<Option<String>> {
    tracing::info!("Cloning VM {name}...");

    let spec = VmCloneSpec {
        name: name.to_string(),
        source: template.vm.clone(),
        placement: Some(placement.to_spec()),
        power_on: Some(config.power_on),
    };
    let task = VmManager::new(client).clone_vm(&spec).await?;
    let result = TaskManager::new(client)
        .wait_for_task(&task, config.wait_options())
        .await?;
    Ok(result_id(&result))
}

async fn attach(
    client: &VsphereClient,
    name: &str,
    vm: Option<String>,
    net: &NetworkSummary,
) -> VsphereResult<CreatedVm> {
    let vm_id = match vm {
        Some(id) => id,
        None => VmManager::new(client).find_vm(name).await?.vm,
    };
    let nic_id = NetworkManager::new(client).attach_network(&vm_id, net).await?;
    tracing::info!(vm = %name, network = %net.name, nic = %nic_id, "attached network adapter");
    Ok(CreatedVm {
        name: name.to_string(),
        vm: Some(vm_id),
        nic: Some(nic_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(name: &str) -> CreatedVm {
        CreatedVm {
            name: name.to_string(),
            vm: None,
            nic: None,
        }
    }

    #[test]
    fn left_in_place_lists_earlier_clones() {
        let done = [created("web-01"), created("web-02")];
        assert_eq!(left_in_place(&done, None), vec!["web-01", "web-02"]);
        assert!(left_in_place(&[], None).is_empty());
    }

    #[test]
    fn left_in_place_includes_clone_whose_nic_failed() {
        let done = [created("web-01")];
        assert_eq!(left_in_place(&done, Some("web-02")), vec!["web-01", "web-02"]);
        assert_eq!(left_in_place(&[], Some("solo")), vec!["solo"]);
    }

    #[test]
    fn placement_spec_carries_folder_pool_and_datastore() {
        let placement = ResolvedPlacement {
            folder: "group-v3".into(),
            resource_pool: "resgroup-8".into(),
            datastore: None,
        };
        let spec = placement.to_spec();
        assert_eq!(spec.folder.as_deref(), Some("group-v3"));
        assert_eq!(spec.resource_pool.as_deref(), Some("resgroup-8"));
        assert!(spec.datastore.is_none() && spec.cluster.is_none() && spec.host.is_none());
    }
}
