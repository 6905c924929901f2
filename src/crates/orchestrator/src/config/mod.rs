//! Configuration module for orchestrator
//!
//! Environment-driven settings only (spec §6): static config-file loading,
//! routing/pattern definitions, and workflow DSLs belong to the external
//! collaborators the core consumes, not to this crate.

pub mod server;

pub use server::{ServerConfig, ServerConfigError};
