//! Core provisioning components.

pub mod audit;
pub mod cloud;
pub mod facts;
pub mod identity;
pub mod orchestrator;
pub mod provision;
pub mod readiness;
pub mod remote;
pub mod secrets;
pub mod step;
pub mod steps;
pub mod swap;
