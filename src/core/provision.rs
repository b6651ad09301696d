//! Key registration and instance creation.

use tracing::{debug, info};

use crate::core::cloud::{ControlPlane, InstanceRequest, KeyCreate};
use crate::core::identity::KeyMaterial;
use crate::error::{OutpostError, Result};

/// Instance shape, immutable once submitted to the control plane.
#[derive(Debug, Clone)]
pub struct ServerSpec {
    pub name: Option<String>,
    pub size_class: String,
    pub location: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Creating,
    /// Control plane acknowledged creation; the machine is not yet
    /// accepting sessions.
    Booting,
    Reachable,
    /// Readiness polling exhausted its budget.
    Failed,
}

#[derive(Debug, Clone)]
pub struct ProvisionedServer {
    pub id: u64,
    pub address: String,
    pub state: ServerState,
}

/// Register the key and create the instance.
///
/// Key registration has no idempotent upsert on the provider side, so it is
/// two-path: create, and on a duplicate-shaped rejection fall back to
/// listing registrations and resolving by fingerprint. A partial failure
/// (key registered, instance creation failed) deliberately leaves the key
/// in place for the next attempt to pick up through that same fallback.
pub fn provision(
    plane: &dyn ControlPlane,
    spec: &ServerSpec,
    key: &KeyMaterial,
) -> Result<ProvisionedServer> {
    let key_id = resolve_key(plane, key)?;

    let name = spec.name.clone().unwrap_or_else(generated_name);
    info!("creating instance '{}' ({})", name, spec.size_class);

    let response = plane.create_instance(&InstanceRequest {
        name,
        size_class: spec.size_class.clone(),
        location: spec.location.clone(),
        image: spec.image.clone(),
        key_id,
    })?;

    // Nothing downstream can work without an address.
    let address = response
        .public_address
        .ok_or(OutpostError::MissingAddress { body: response.raw })?;

    info!("instance {} acknowledged at {}", response.id, address);
    Ok(ProvisionedServer {
        id: response.id,
        address,
        state: ServerState::Booting,
    })
}

fn resolve_key(plane: &dyn ControlPlane, key: &KeyMaterial) -> Result<u64> {
    match plane.create_key("outpost", &key.public_key)? {
        KeyCreate::Created(created) => {
            debug!("registered key {} ({})", created.id, created.fingerprint);
            Ok(created.id)
        }
        KeyCreate::Duplicate => {
            let existing = plane
                .list_keys()?
                .into_iter()
                .find(|k| k.fingerprint == key.fingerprint)
                .ok_or_else(|| OutpostError::Provision {
                    status: 0,
                    body: format!(
                        "key rejected as duplicate but fingerprint {} not found in listing",
                        key.fingerprint
                    ),
                })?;
            debug!("reusing registered key {} ({})", existing.id, existing.fingerprint);
            Ok(existing.id)
        }
    }
}

/// Random suffix avoids collisions across repeated runs.
fn generated_name() -> String {
    format!("outpost-{:06x}", fastrand::u32(..0x1000000))
}
