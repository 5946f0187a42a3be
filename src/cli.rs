//! Command-line surface.

use clap::Parser;
use std::path::PathBuf;

/// Clone one or more VMs from a vCenter template.
///
/// Placement overrides are optional: without them the first datacenter and
/// cluster found are used, the clone goes to the datacenter's VM folder and
/// the template's datastore.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// YAML file with the configuration to run with. When given, all other
    /// command-line options are disregarded.
    #[arg(short = 'y', long = "yaml", value_name = "YAML_CONFIG_FILE")]
    pub yaml: Option<PathBuf>,

    /// vCenter service to connect to
    #[arg(short = 's', long)]
    pub host: Option<String>,

    /// Port to connect on
    #[arg(short = 'o', long, default_value_t = 443)]
    pub port: u16,

    /// Username to use
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Password to use (prompted for when absent)
    #[arg(short = 'p', long, env = "VSPHERE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Name of the template/VM you are cloning from
    #[arg(short = 't', long)]
    pub template: Option<String>,

    /// Datacenter to use. If omitted, the first datacenter is used.
    #[arg(long)]
    pub datacenter_name: Option<String>,

    /// VM folder the clones go in. If omitted, the datacenter's VM folder is used.
    #[arg(long)]
    pub vm_folder: Option<String>,

    /// Datastore the clones end up on. If omitted, the template's datastore is used.
    #[arg(long)]
    pub datastore_name: Option<String>,

    /// Datastore cluster (Storage DRS pod) the clones end up on.
    /// Overrides --datastore-name.
    #[arg(long)]
    pub datastorecluster_name: Option<String>,

    /// Cluster the clones end up on. If omitted, the first cluster found is used.
    #[arg(long)]
    pub cluster_name: Option<String>,

    /// Resource pool to use. If omitted, the cluster's root pool is used.
    #[arg(long)]
    pub resource_pool: Option<String>,

    /// Name of the opaque network to attach to each clone
    #[arg(long)]
    pub opaque_network: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub no_ssl: bool,

    /// Power on the VMs after creation
    #[arg(long)]
    pub power_on: bool,

    /// Log verbosely
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Name of a VM to create. Repeat to create several.
    #[arg(long = "vms", value_name = "NAME")]
    pub vms: Vec<String>,

    /// Seconds between clone-task status polls
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    pub poll_interval: u64,

    /// Give up on a clone task after this many seconds
    #[arg(long, value_name = "SECS")]
    pub task_timeout: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_full_flag_surface() {
        let args = Args::try_parse_from([
            "vclone",
            "-s", "vc.lab",
            "-u", "admin",
            "-p", "pw",
            "-t", "ubuntu-tmpl",
            "--datacenter-name", "DC1",
            "--vm-folder", "web",
            "--datastorecluster-name", "pod1",
            "--cluster-name", "c1",
            "--resource-pool", "rp",
            "--opaque-network", "seg-a",
            "--no-ssl",
            "--power-on",
            "-v",
            "--vms", "web-01",
            "--vms", "web-02",
        ])
        .unwrap();
        assert_eq!(args.host.as_deref(), Some("vc.lab"));
        assert_eq!(args.port, 443);
        assert_eq!(args.datacenter_name.as_deref(), Some("DC1"));
        assert_eq!(args.datastorecluster_name.as_deref(), Some("pod1"));
        assert!(args.no_ssl && args.power_on && args.verbose);
        assert_eq!(args.vms, vec!["web-01", "web-02"]);
        assert_eq!(args.poll_interval, 2);
        assert_eq!(args.timeout, 30);
    }

    #[test]
    fn port_must_be_numeric() {
        assert!(Args::try_parse_from(["vclone", "-o", "https"]).is_err());
    }
}
