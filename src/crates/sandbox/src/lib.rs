//! Sandbox lifecycle controller.
//!
//! Manages per-user compute sandboxes across a pluggable [`provider`]
//! abstraction: session-sticky reuse, a Redis-backed [`queue`] for
//! pause/delete timeouts, and a keyed single-flight barrier so concurrent
//! `get_or_create` calls for the same session coalesce into one create.
//! See [`controller::SandboxController`] and the state machine in
//! [`model`].

pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod queue;

pub use controller::{SandboxController, SandboxControllerConfig, DEFAULT_CODE_SERVER_PORT, DEFAULT_MCP_PORT};
pub use error::{Result, SandboxError};
pub use model::{transition, Sandbox, SandboxStatus, SnapshotKey};
pub use provider::{HttpSandboxProvider, ProviderSandboxHandle, SandboxProvider};
pub use queue::{is_stale, DelayQueue, TimeoutAction, TimeoutMessage};
