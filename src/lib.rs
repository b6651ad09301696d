//! Outpost - provision a cloud server and bootstrap it into a hardened,
//! service-running state.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Write an outpost.toml template
//! │   ├── key           # Ensure/show the dedicated SSH key
//! │   ├── up            # Provision + bootstrap end to end
//! │   ├── bootstrap     # Re-run the step sequence on an existing server
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── identity      # Dedicated SSH key management
//!     ├── cloud         # Control-plane HTTP client
//!     ├── provision     # Key registration + instance creation
//!     ├── remote        # Remote execution over ssh
//!     ├── readiness     # Bounded reachability polling
//!     ├── facts         # Remote fact gathering
//!     ├── swap          # Swap sizing
//!     ├── secrets       # Write-once service env file
//!     ├── audit         # Command auditing interceptor
//!     ├── step          # Step model and run report
//!     ├── orchestrator  # Sequential step runner with failure policy
//!     └── steps         # The standard bootstrap plan
//! ```
//!
//! # Features
//!
//! - Dedicated per-operator SSH identity, never the personal key
//! - Idempotent key registration against the cloud control plane
//! - Bounded readiness polling with per-attempt connect timeouts
//! - Ordered bootstrap steps with required/optional failure policy
//! - Safe re-runs through per-step idempotency checks

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
