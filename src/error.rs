use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutpostError {
    #[error("not initialized: run `outpost init` first")]
    NotInitialized,

    #[error("already initialized: outpost.toml exists")]
    AlreadyInitialized,

    #[error("control plane rejected the request (status {status}): {body}")]
    Provision { status: u16, body: String },

    #[error("control plane response has no public address: {body}")]
    MissingAddress { body: String },

    #[error("server did not become reachable after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("required step '{step}' failed: {detail}")]
    RequiredStep { step: String, detail: String },

    #[error("key generation failed: {0}")]
    Keygen(String),

    #[error("api token missing: set {0}")]
    MissingToken(&'static str),

    #[error("config error: {0}")]
    Config(String),

    #[error("remote command failed: {0}")]
    Remote(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("prompt error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, OutpostError>;
