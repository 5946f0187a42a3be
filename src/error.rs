//! Top-level error for the `vclone` binary.

use crate::config::ConfigError;
use vclone_vsphere::VsphereError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Vsphere(#[from] VsphereError),
}

impl AppError {
    /// Process exit code: 2 for usage / configuration problems, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Vsphere(_) => 1,
        }
    }
}
