//! # vclone – vSphere REST client
//!
//! The slice of the vSphere Automation REST API needed to clone virtual
//! machines from a template and wire them to a network.
//!
//! ## Modules
//!
//! - **types** — Wire types (inventory summaries, clone spec, tasks, NICs)
//! - **error** — Crate-specific error types
//! - **vsphere** — HTTP client with session-based auth
//! - **inventory** — Datacenter / folder / cluster / resource-pool lookup
//! - **vm** — VM listing and clone requests
//! - **task** — Asynchronous task polling
//! - **storage** — Datastores and datastore-cluster placement
//! - **network** — Network lookup and NIC attach

pub mod types;
pub mod error;
pub mod vsphere;
pub mod inventory;
pub mod vm;
pub mod task;
pub mod storage;
pub mod network;

pub use error::{VsphereError, VsphereErrorKind, VsphereResult};
pub use vsphere::VsphereClient;
