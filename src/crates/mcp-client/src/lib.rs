//! MCP (Model Context Protocol) tool client and registry.
//!
//! Wraps a sandbox's MCP endpoint: credential + tool-server-url
//! registration, draft-7 schema-validated tool listing, and tool
//! invocation with a configurable timeout. See [`client::McpClient`] for
//! the full protocol sequence and [`registry`] for confirmation-policy
//! routing into human-in-the-loop review.

pub mod client;
pub mod error;
pub mod registry;

pub use client::{Credential, CustomMcpConfig, CustomMcpTransport, McpClient, ToolResult};
pub use error::{McpError, Result};
pub use registry::{requires_confirmation, ConfirmationPolicy, ToolDescriptor, ToolRegistry};
