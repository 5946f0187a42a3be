//! # vclone
//!
//! Clone virtual machines from a vCenter template, optionally attaching
//! a network adapter to each clone.
//!
//! - **cli** — clap argument definitions
//! - **config** — flag / YAML resolution and validation
//! - **logging** — tracing subscriber
//! - **pipeline** — the login → clone → logout run
//! - **error** — binary-level error and exit codes

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
