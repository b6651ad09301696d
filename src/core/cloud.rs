//! Control-plane HTTP client.
//!
//! Only the three calls the orchestrator needs: register a public key, list
//! keys (for duplicate recovery), create an instance. Blocking reqwest; the
//! whole pipeline is deliberately sequential.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OutpostError, Result};

/// A registered public key as the control plane sees it.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRef {
    pub id: u64,
    pub fingerprint: String,
}

/// Result of a key registration attempt.
#[derive(Debug)]
pub enum KeyCreate {
    Created(KeyRef),
    /// The control plane rejected the key as already registered. There is
    /// no dedicated error code for this; it is detected from the response
    /// body shape and resolved by fingerprint lookup.
    Duplicate,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceRequest {
    pub name: String,
    pub size_class: String,
    pub location: String,
    pub image: String,
    pub key_id: u64,
}

/// Raw-ish instance creation response. The address is optional here so the
/// provisioner can fail hard with the body preserved when it is missing.
#[derive(Debug, Clone)]
pub struct InstanceResponse {
    pub id: u64,
    pub public_address: Option<String>,
    pub raw: String,
}

/// The three control-plane operations the orchestrator needs.
pub trait ControlPlane {
    fn create_key(&self, name: &str, public_key: &str) -> Result<KeyCreate>;
    fn list_keys(&self) -> Result<Vec<KeyRef>>;
    fn create_instance(&self, request: &InstanceRequest) -> Result<InstanceResponse>;
}

/// Duplicate rejections are recognized by shape: providers phrase it as a
/// uniqueness or already-exists violation in the error body.
pub fn looks_like_duplicate(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    body.contains("uniqueness")
        || body.contains("duplicate")
        || body.contains("already exists")
        || body.contains("already in use")
}

pub struct HttpControlPlane {
    endpoint: String,
    token: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct CreateKeyBody<'a> {
    name: &'a str,
    public_key: &'a str,
}

#[derive(Deserialize)]
struct InstanceBody {
    id: u64,
    #[serde(default)]
    public_address: Option<String>,
}

impl HttpControlPlane {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }
}

impl ControlPlane for HttpControlPlane {
    fn create_key(&self, name: &str, public_key: &str) -> Result<KeyCreate> {
        debug!("POST /keys name={}", name);
        let response = self
            .client
            .post(self.url("keys"))
            .bearer_auth(&self.token)
            .json(&CreateKeyBody { name, public_key })
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(KeyCreate::Created(response.json()?));
        }

        let body = response.text()?;
        if looks_like_duplicate(&body) {
            debug!("key rejected as duplicate, will resolve by fingerprint");
            return Ok(KeyCreate::Duplicate);
        }
        Err(OutpostError::Provision {
            status: status.as_u16(),
            body,
        })
    }

    fn list_keys(&self) -> Result<Vec<KeyRef>> {
        debug!("GET /keys");
        let response = self
            .client
            .get(self.url("keys"))
            .bearer_auth(&self.token)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutpostError::Provision {
                status: status.as_u16(),
                body: response.text()?,
            });
        }
        Ok(response.json()?)
    }

    fn create_instance(&self, request: &InstanceRequest) -> Result<InstanceResponse> {
        debug!("POST /instances name={}", request.name);
        let response = self
            .client
            .post(self.url("instances"))
            .bearer_auth(&self.token)
            .json(request)
            .send()?;
        let status = response.status();
        let raw = response.text()?;
        if !status.is_success() {
            return Err(OutpostError::Provision {
                status: status.as_u16(),
                body: raw,
            });
        }
        let body: InstanceBody = serde_json::from_str(&raw).map_err(|e| {
            OutpostError::Provision {
                status: status.as_u16(),
                body: format!("unparseable response ({}): {}", e, raw),
            }
        })?;
        Ok(InstanceResponse {
            id: body.id,
            public_address: body.public_address,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_duplicate_shapes() {
        assert!(looks_like_duplicate(
            r#"{"error":{"code":"uniqueness_error","message":"SSH key with the same fingerprint already exists"}}"#
        ));
        assert!(looks_like_duplicate("fingerprint already in use"));
        assert!(looks_like_duplicate("Duplicate key"));
    }

    #[test]
    fn other_rejections_are_not_duplicates() {
        assert!(!looks_like_duplicate(
            r#"{"error":{"code":"invalid_input","message":"key is not a valid public key"}}"#
        ));
        assert!(!looks_like_duplicate("rate limit exceeded"));
    }

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let plane = HttpControlPlane::new("https://api.example/v1/", "tok");
        assert_eq!(plane.url("keys"), "https://api.example/v1/keys");
    }
}
