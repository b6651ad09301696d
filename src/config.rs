use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{OutpostError, Result};

const CONFIG_FILE: &str = "outpost.toml";

/// Environment variable holding the control-plane API token.
pub const TOKEN_ENV: &str = "OUTPOST_API_TOKEN";

/// Top-level outpost.toml.
///
/// All ambient configuration (target user, port, endpoints) lives here and
/// is threaded explicitly through the provisioning components; leaf
/// functions never read the process environment themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ssh: SshConfig,
    pub cloud: CloudConfig,
    pub service: ServiceConfig,
    #[serde(default)]
    pub extras: ExtrasConfig,
    #[serde(default)]
    pub audit: Option<AuditConfig>,
    #[serde(default)]
    pub tmpclean: Option<TmpcleanConfig>,
}

/// Instance shape submitted to the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Instance name; a random-suffixed name is generated when absent.
    #[serde(default)]
    pub name: Option<String>,
    pub size_class: String,
    pub location: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Unprivileged account created during bootstrap.
    pub user: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Override for the dedicated key path; defaults to ~/.outpost/id_ed25519.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Control-plane API base, e.g. https://api.cloud.example/v1
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Packages that make up the long-running service.
    pub packages: Vec<String>,
    /// Remote path of the write-once environment file the service reads.
    pub env_file: String,
    /// Interactive onboarding program run once via terminal handoff.
    #[serde(default)]
    pub setup_command: Option<String>,
    /// Remote command that succeeds once onboarding has been completed.
    #[serde(default)]
    pub setup_check: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtrasConfig {
    /// Convenience tools; failures here never abort a run.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Extra language runtime package, e.g. "golang".
    #[serde(default)]
    pub runtime: Option<String>,
}

/// Wrap a sensitive remote command so every invocation is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Absolute path of the installed command to intercept.
    pub command: String,
    #[serde(default = "default_audit_log")]
    pub log: String,
}

/// Install the temp-directory reclamation utility and schedule it daily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmpcleanConfig {
    /// Local path of the utility binary to upload.
    pub source: PathBuf,
    #[serde(default = "default_tmpclean_path")]
    pub install_path: String,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_audit_log() -> String {
    "/var/log/outpost-audit.log".to_string()
}

fn default_tmpclean_path() -> String {
    "/usr/local/bin/tmpclean".to_string()
}

fn default_max_age_days() -> u32 {
    7
}

impl Config {
    pub fn config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    pub fn exists() -> bool {
        Self::config_path().exists()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(OutpostError::NotInitialized);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.ssh.user == "root" {
            return Err(OutpostError::Config(
                "ssh.user must be an unprivileged account, not root".to_string(),
            ));
        }
        if self.service.packages.is_empty() {
            return Err(OutpostError::Config(
                "service.packages must list at least one package".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the API token from the environment.
    ///
    /// The only environment read in the crate; happens at the config layer
    /// so everything below stays testable without a real environment.
    pub fn api_token(&self) -> Result<String> {
        std::env::var(TOKEN_ENV).map_err(|_| OutpostError::MissingToken(TOKEN_ENV))
    }
}

/// Commented template written by `outpost init`.
pub fn template() -> String {
    format!(
        r#"# outpost configuration

[server]
# name = "my-outpost"        # omit to auto-generate a collision-free name
size_class = "cpx31"
location = "fsn1"
image = "debian-12"

[ssh]
user = "service"
port = 22
# key_path = "/path/to/key"  # defaults to ~/.outpost/id_ed25519

[cloud]
endpoint = "https://api.cloud.example/v1"
# token read from ${TOKEN_ENV}

[service]
packages = ["myservice"]
env_file = "/etc/myservice.env"
# setup_command = "myservice setup"
# setup_check = "test -f /home/service/.config/myservice/config.toml"

[extras]
tools = ["htop", "ripgrep"]
# runtime = "golang"

# [audit]
# command = "/usr/local/bin/myservice-admin"
# log = "/var/log/outpost-audit.log"

# [tmpclean]
# source = "./tmpclean"
# install_path = "/usr/local/bin/tmpclean"
# max_age_days = 7
"#,
        TOKEN_ENV = TOKEN_ENV
    )
}
