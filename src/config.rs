//! Run configuration, from command-line flags or a YAML document.
//!
//! The YAML form uses the long flag names as keys:
//!
//! ```yaml
//! host: vcenter.lab.local
//! user: administrator@vsphere.local
//! template: ubuntu-22.04-tmpl
//! cluster-name: Compute
//! vms:
//!   - web-01
//!   - web-02
//! options:
//!   - no-ssl
//!   - power-on
//! ```

use crate::cli::Args;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vclone_vsphere::task::WaitOptions;
use vclone_vsphere::types::VsphereConfig;

const DEFAULT_PORT: u16 = 443;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("required options missing from CLI or YAML: {}", .0.join(", "))]
    MissingRequired(Vec<&'static str>),
    #[error("password prompt failed: {0}")]
    Prompt(String),
}

/// Optional placement overrides. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub datacenter: Option<String>,
    pub vm_folder: Option<String>,
    pub datastore: Option<String>,
    pub datastore_cluster: Option<String>,
    pub cluster: Option<String>,
    pub resource_pool: Option<String>,
}

/// Fully resolved configuration for one run.
#[derive(Clone)]
pub struct CloneConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub template: String,
    pub vms: Vec<String>,
    pub placement: Placement,
    pub opaque_network: Option<String>,
    pub no_ssl: bool,
    pub power_on: bool,
    pub verbose: bool,
    pub poll_interval: Duration,
    pub task_timeout: Option<Duration>,
    pub timeout_secs: u64,
}

impl CloneConfig {
    /// Supply the password obtained after resolution (e.g. from a prompt).
    pub fn with_password(self, password: String) -> Self {
        Self {
            password: Some(password),
            ..self
        }
    }

    /// Connection settings for the vSphere client.
    pub fn connection(&self) -> VsphereConfig {
        VsphereConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.user.clone(),
            password: self.password.clone().unwrap_or_default(),
            insecure: self.no_ssl,
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            poll_interval: self.poll_interval,
            timeout: self.task_timeout,
        }
    }
}

impl fmt::Debug for CloneConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloneConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("template", &self.template)
            .field("vms", &self.vms)
            .field("placement", &self.placement)
            .field("opaque_network", &self.opaque_network)
            .field("no_ssl", &self.no_ssl)
            .field("power_on", &self.power_on)
            .field("verbose", &self.verbose)
            .field("poll_interval", &self.poll_interval)
            .field("task_timeout", &self.task_timeout)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ── YAML document ───────────────────────────────────────────────────

/// Switches that take no value, listed under `options:`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Switch {
    #[serde(alias = "no_ssl")]
    NoSsl,
    #[serde(alias = "power_on")]
    PowerOn,
    Verbose,
}

/// `vms:` as a single name or a list. Scalars of any kind are names, so
/// `vms: [101, web]` yields `["101", "web"]`.
fn deserialize_vms<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => return Ok(None),
        serde_yaml::Value::Sequence(items) => items,
        scalar => vec![scalar],
    };
    items
        .into_iter()
        .map(vm_name)
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
        .map_err(D::Error::custom)
}

fn vm_name(value: serde_yaml::Value) -> Result<String, String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("VM names must be scalars, found {other:?}")),
    }
}

/// The YAML config document, keyed like the long flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    template: Option<String>,
    #[serde(alias = "datacenter_name")]
    datacenter_name: Option<String>,
    #[serde(alias = "vm_folder")]
    vm_folder: Option<String>,
    #[serde(alias = "datastore_name")]
    datastore_name: Option<String>,
    #[serde(alias = "datastorecluster_name")]
    datastorecluster_name: Option<String>,
    #[serde(alias = "cluster_name")]
    cluster_name: Option<String>,
    #[serde(alias = "resource_pool")]
    resource_pool: Option<String>,
    #[serde(alias = "opaque_network")]
    opaque_network: Option<String>,
    #[serde(alias = "poll_interval")]
    poll_interval: Option<u64>,
    #[serde(alias = "task_timeout")]
    task_timeout: Option<u64>,
    timeout: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_vms")]
    vms: Option<Vec<String>>,
    #[serde(default)]
    options: Vec<Switch>,
}

impl FileConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document is an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn has(&self, switch: Switch) -> bool {
        self.options.contains(&switch)
    }
}

// ── Resolution ──────────────────────────────────────────────────────

/// Unvalidated settings, whichever source they came from.
struct Draft {
    host: Option<String>,
    port: u16,
    user: Option<String>,
    password: Option<String>,
    template: Option<String>,
    vms: Vec<String>,
    placement: Placement,
    opaque_network: Option<String>,
    no_ssl: bool,
    power_on: bool,
    verbose: bool,
    poll_interval: u64,
    task_timeout: Option<u64>,
    timeout: u64,
}

impl From<&Args> for Draft {
    fn from(a: &Args) -> Self {
        Self {
            host: a.host.clone(),
            port: a.port,
            user: a.user.clone(),
            password: a.password.clone(),
            template: a.template.clone(),
            vms: a.vms.clone(),
            placement: Placement {
                datacenter: a.datacenter_name.clone(),
                vm_folder: a.vm_folder.clone(),
                datastore: a.datastore_name.clone(),
                datastore_cluster: a.datastorecluster_name.clone(),
                cluster: a.cluster_name.clone(),
                resource_pool: a.resource_pool.clone(),
            },
            opaque_network: a.opaque_network.clone(),
            no_ssl: a.no_ssl,
            power_on: a.power_on,
            verbose: a.verbose,
            poll_interval: a.poll_interval,
            task_timeout: a.task_timeout,
            timeout: a.timeout,
        }
    }
}

impl From<FileConfig> for Draft {
    fn from(f: FileConfig) -> Self {
        let no_ssl = f.has(Switch::NoSsl);
        let power_on = f.has(Switch::PowerOn);
        let verbose = f.has(Switch::Verbose);
        Self {
            host: f.host,
            port: f.port.unwrap_or(DEFAULT_PORT),
            user: f.user,
            password: f.password,
            template: f.template,
            vms: f.vms.unwrap_or_default(),
            placement: Placement {
                datacenter: f.datacenter_name,
                vm_folder: f.vm_folder,
                datastore: f.datastore_name,
                datastore_cluster: f.datastorecluster_name,
                cluster: f.cluster_name,
                resource_pool: f.resource_pool,
            },
            opaque_network: f.opaque_network,
            no_ssl,
            power_on,
            verbose,
            poll_interval: f.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            task_timeout: f.task_timeout,
            timeout: f.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl Draft {
    fn validate(self) -> Result<CloneConfig, ConfigError> {
        let host = non_empty(self.host);
        let user = non_empty(self.user);
        let template = non_empty(self.template);
        let vms: Vec<String> = self
            .vms
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();

        let mut missing = Vec::new();
        if host.is_none() {
            missing.push("-s/--host");
        }
        if user.is_none() {
            missing.push("-u/--user");
        }
        if template.is_none() {
            missing.push("-t/--template");
        }
        if vms.is_empty() {
            missing.push("--vms");
        }

        match (host, user, template) {
            (Some(host), Some(user), Some(template)) if missing.is_empty() => Ok(CloneConfig {
                host,
                port: self.port,
                user,
                password: self.password.filter(|p| !p.is_empty()),
                template,
                vms,
                placement: self.placement,
                opaque_network: non_empty(self.opaque_network),
                no_ssl: self.no_ssl,
                power_on: self.power_on,
                verbose: self.verbose,
                poll_interval: Duration::from_secs(self.poll_interval.max(1)),
                task_timeout: self.task_timeout.map(Duration::from_secs),
                timeout_secs: self.timeout,
            }),
            _ => Err(ConfigError::MissingRequired(missing)),
        }
    }
}

/// Resolve the run configuration. With `--yaml` every other flag is ignored.
pub fn resolve(args: &Args) -> Result<CloneConfig, ConfigError> {
    let draft = match &args.yaml {
        Some(path) => Draft::from(FileConfig::load(path)?),
        None => Draft::from(args),
    };
    draft.validate()
}

/// Resolve from an in-memory YAML document.
pub fn resolve_yaml(text: &str) -> Result<CloneConfig, ConfigError> {
    let file = FileConfig::from_yaml(text).map_err(|source| ConfigError::Yaml {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    Draft::from(file).validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["vclone"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_resolve() {
        let cfg = resolve(&args(&[
            "-s", "vc", "-u", "admin", "-t", "tmpl", "--vms", "a", "--vms", "b",
            "--cluster-name", "c1", "--power-on",
        ]))
        .unwrap();
        assert_eq!(cfg.host, "vc");
        assert_eq!(cfg.port, 443);
        assert_eq!(cfg.vms, vec!["a", "b"]);
        assert_eq!(cfg.placement.cluster.as_deref(), Some("c1"));
        assert!(cfg.power_on);
        assert!(!cfg.no_ssl);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert!(cfg.task_timeout.is_none());
    }

    #[test]
    fn missing_required_lists_every_field() {
        let err = resolve(&args(&["-s", "vc"])).unwrap_err();
        match err {
            ConfigError::MissingRequired(missing) => {
                assert_eq!(missing, vec!["-u/--user", "-t/--template", "--vms"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = resolve_yaml("host: ' '\nuser: u\ntemplate: t\nvms: [x]\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref m) if m == &vec!["-s/--host"]));
    }

    #[test]
    fn yaml_uses_flag_names_and_options() {
        let cfg = resolve_yaml(
            r#"
host: vcenter.lab
port: 8443
user: administrator@vsphere.local
password: s3cret
template: ubuntu-tmpl
datacenter-name: DC1
vm-folder: web
datastore-name: ds1
datastorecluster-name: pod1
cluster-name: Compute
resource-pool: rp1
opaque-network: seg-a
task-timeout: 600
vms:
  - web-01
  - web-02
options:
  - no-ssl
  - power-on
  - verbose
"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 8443);
        assert_eq!(cfg.password.as_deref(), Some("s3cret"));
        assert_eq!(
            cfg.placement,
            Placement {
                datacenter: Some("DC1".into()),
                vm_folder: Some("web".into()),
                datastore: Some("ds1".into()),
                datastore_cluster: Some("pod1".into()),
                cluster: Some("Compute".into()),
                resource_pool: Some("rp1".into()),
            }
        );
        assert_eq!(cfg.opaque_network.as_deref(), Some("seg-a"));
        assert_eq!(cfg.vms, vec!["web-01", "web-02"]);
        assert!(cfg.no_ssl && cfg.power_on && cfg.verbose);
        assert_eq!(cfg.task_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn yaml_accepts_single_vm_and_snake_case_keys() {
        let cfg = resolve_yaml(
            "host: vc\nuser: u\ntemplate: t\ncluster_name: c\nvms: only-one\noptions: [power_on]\n",
        )
        .unwrap();
        assert_eq!(cfg.vms, vec!["only-one"]);
        assert_eq!(cfg.placement.cluster.as_deref(), Some("c"));
        assert!(cfg.power_on);
    }

    #[test]
    fn yaml_numeric_vm_names_become_strings() {
        let cfg = resolve_yaml("host: vc\nuser: u\ntemplate: t\nvms: 1234\n").unwrap();
        assert_eq!(cfg.vms, vec!["1234"]);

        let cfg = resolve_yaml("host: vc\nuser: u\ntemplate: t\nvms: [101, web, 2.5]\n").unwrap();
        assert_eq!(cfg.vms, vec!["101", "web", "2.5"]);
    }

    #[test]
    fn yaml_rejects_nested_vm_entries() {
        assert!(matches!(
            resolve_yaml("host: vc\nuser: u\ntemplate: t\nvms: [[a, b]]\n"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn yaml_rejects_unknown_keys_and_options() {
        assert!(matches!(
            resolve_yaml("host: vc\nflavour: large\n"),
            Err(ConfigError::Yaml { .. })
        ));
        assert!(matches!(
            resolve_yaml("host: vc\noptions: [turbo]\n"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn empty_yaml_is_missing_everything() {
        let err = resolve_yaml("").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref m) if m.len() == 4));
    }

    #[test]
    fn yaml_file_overrides_all_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host: from-yaml\nuser: u\ntemplate: t\nvms: [v1]").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cfg = resolve(&args(&[
            "-y", &path, "-s", "from-flag", "--power-on", "--vms", "ignored",
        ]))
        .unwrap();
        assert_eq!(cfg.host, "from-yaml");
        assert_eq!(cfg.vms, vec!["v1"]);
        assert!(!cfg.power_on);
    }

    #[test]
    fn unreadable_yaml_file() {
        let err = resolve(&args(&["-y", "/nonexistent/vclone.yaml"])).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = resolve_yaml("host: vc\nuser: u\npassword: hunter2\ntemplate: t\nvms: [a]\n")
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn connection_maps_no_ssl_to_insecure() {
        let cfg = resolve_yaml("host: vc\nuser: u\ntemplate: t\nvms: [a]\noptions: [no-ssl]\n")
            .unwrap()
            .with_password("pw".into());
        let conn = cfg.connection();
        assert!(conn.insecure);
        assert_eq!(conn.password, "pw");
        assert_eq!(conn.username, "u");
        assert_eq!(conn.timeout_secs, 30);
    }
}
