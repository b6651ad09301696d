//! Remote fact gathering.
//!
//! A single pass over the freshly reachable machine, run before the step
//! plan is built, so steps that depend on hardware (swap sizing) are plain
//! data by the time the orchestrator sees them.

use crate::core::remote::Remote;
use crate::error::{OutpostError, Result};

#[derive(Debug, Clone, Copy)]
pub struct HostFacts {
    pub total_memory_mb: u64,
}

pub fn gather(remote: &mut dyn Remote) -> Result<HostFacts> {
    let out = remote.exec("grep MemTotal /proc/meminfo")?;
    if !out.success() {
        return Err(OutpostError::Remote(
            "could not read /proc/meminfo".to_string(),
        ));
    }
    Ok(HostFacts {
        total_memory_mb: parse_mem_total_mb(&out.stdout)?,
    })
}

/// Parse `MemTotal:       16326164 kB` into whole megabytes.
fn parse_mem_total_mb(line: &str) -> Result<u64> {
    let kb: u64 = line
        .split_whitespace()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| OutpostError::Remote(format!("unexpected MemTotal line: {}", line)))?;
    Ok(kb / 1024)
}
