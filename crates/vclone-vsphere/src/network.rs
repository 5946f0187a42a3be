//! Network lookup and VM NIC attach via the vSphere REST API.

use crate::error::{VsphereError, VsphereResult};
use crate::types::*;
use crate::vsphere::VsphereClient;

/// Adapter model used for attached NICs.
pub const DEFAULT_NIC_TYPE: &str = "VMXNET3";

/// Network / NIC operations.
pub struct NetworkManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> NetworkManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    /// List all networks visible to the connected vCenter.
    pub async fn list_networks(&self) -> VsphereResult<Vec<NetworkSummary>> {
        self.client.get("/api/vcenter/network").await
    }

    /// Find a network by exact name. An opaque (NSX) network wins over a
    /// port group carrying the same name.
    pub async fn find_network(&self, name: &str) -> VsphereResult<NetworkSummary> {
        let nets = self.list_networks().await?;
        pick_network(nets, name)
            .ok_or_else(|| VsphereError::not_found(format!("No network named '{name}'")))
    }

    /// Add a NIC to a VM. Returns the NIC identifier.
    pub async fn add_vm_nic(&self, vm_id: &str, spec: &NicCreateSpec) -> VsphereResult<String> {
        let path = format!("/api/vcenter/vm/{vm_id}/hardware/ethernet");
        let nic: Option<String> = self.client.post(&path, spec).await?;
        Ok(nic.unwrap_or_default())
    }

    /// Attach a connected VMXNET3 adapter backed by `network`.
    pub async fn attach_network(&self, vm_id: &str, network: &NetworkSummary) -> VsphereResult<String> {
        let spec = nic_spec_for(network);
        tracing::debug!(vm = %vm_id, network = %network.network, ?spec, "adding NIC");
        self.add_vm_nic(vm_id, &spec).await
    }
}

fn pick_network(nets: Vec<NetworkSummary>, name: &str) -> Option<NetworkSummary> {
    let mut matches = nets.into_iter().filter(|n| n.name == name);
    let first = matches.next()?;
    if first.network_type.as_deref() == Some(OPAQUE_NETWORK) {
        return Some(first);
    }
    matches
        .find(|n| n.network_type.as_deref() == Some(OPAQUE_NETWORK))
        .or(Some(first))
}

/// NIC spec whose backing type matches the network's type.
pub fn nic_spec_for(network: &NetworkSummary) -> NicCreateSpec {
    let backing_type = network
        .network_type
        .clone()
        .unwrap_or_else(|| OPAQUE_NETWORK.to_string());
    NicCreateSpec {
        nic_type: Some(DEFAULT_NIC_TYPE.to_string()),
        backing: Some(NicBackingSpec {
            backing_type,
            network: Some(network.network.clone()),
        }),
        start_connected: Some(true),
        allow_guest_control: Some(true),
    }
}
