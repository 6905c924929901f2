//! Sandbox entity and state machine (spec §3, §4.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxStatus {
    /// Pseudo-state: no row exists yet.
    None,
    Initializing,
    Running,
    Paused,
    /// Fast-path intermediate state reached via `restart` from `Paused`;
    /// `connect` brings it back to `Running` skipping file/tool reinstall.
    Stopped,
    Deleted,
    Failed,
}

impl SandboxStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SandboxStatus::Deleted | SandboxStatus::Failed)
    }
}

/// Validates a state transition against the machine in spec §4.3. Returns
/// the target status on success.
pub fn transition(from: SandboxStatus, to: SandboxStatus) -> Result<SandboxStatus, SandboxError> {
    use SandboxStatus::*;
    let allowed = matches!(
        (from, to),
        (None, Initializing)
            | (Initializing, Running)
            | (Initializing, Failed)
            | (Running, Paused)
            | (Running, Deleted)
            | (Paused, Running)
            | (Paused, Stopped)
            | (Paused, Deleted)
            | (Stopped, Running)
            | (Stopped, Deleted)
    );
    if allowed {
        Ok(to)
    } else {
        Err(SandboxError::InvalidTransition { from, to })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sandbox {
    pub sandbox_id: String,
    pub provider_sandbox_id: Option<String>,
    pub user_id: String,
    pub session_id: String,
    pub status: SandboxStatus,
    pub mcp_url: Option<String>,
    pub vscode_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Sandbox {
    pub fn new(sandbox_id: String, user_id: String, session_id: String) -> Self {
        let now = Utc::now();
        Self {
            sandbox_id,
            provider_sandbox_id: None,
            user_id,
            session_id,
            status: SandboxStatus::Initializing,
            mcp_url: None,
            vscode_url: None,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}

/// Identity of a pinned snapshot: a hash of `(base image version, pinned
/// dependency list, preinstalled MCP packages)`. If the hash changes, the
/// caller is responsible for building a new snapshot once; the controller
/// only selects and reuses it (spec §4.3 Snapshot acceleration).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey(pub String);

impl SnapshotKey {
    pub fn compute(base_image_version: &str, pinned_deps: &[String], mcp_packages: &[String]) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        base_image_version.hash(&mut hasher);
        pinned_deps.hash(&mut hasher);
        mcp_packages.hash(&mut hasher);
        SnapshotKey(format!("{:016x}", hasher.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SandboxStatus::*;

    #[test]
    fn create_then_ready_then_pause_then_delete_is_valid() {
        assert_eq!(transition(None, Initializing).unwrap(), Initializing);
        assert_eq!(transition(Initializing, Running).unwrap(), Running);
        assert_eq!(transition(Running, Paused).unwrap(), Paused);
        assert_eq!(transition(Paused, Deleted).unwrap(), Deleted);
    }

    #[test]
    fn deleted_is_terminal_and_rejects_all_transitions() {
        assert!(Deleted.is_terminal());
        assert!(transition(Deleted, Running).is_err());
        assert!(transition(Deleted, Initializing).is_err());
    }

    #[test]
    fn stopped_restart_path_skips_back_to_running_via_connect() {
        assert_eq!(transition(Paused, Stopped).unwrap(), Stopped);
        assert_eq!(transition(Stopped, Running).unwrap(), Running);
    }

    #[test]
    fn snapshot_key_is_stable_for_same_inputs() {
        let a = SnapshotKey::compute("v1", &["a".into()], &["mcp-core".into()]);
        let b = SnapshotKey::compute("v1", &["a".into()], &["mcp-core".into()]);
        assert_eq!(a, b);
        let c = SnapshotKey::compute("v2", &["a".into()], &["mcp-core".into()]);
        assert_ne!(a, c);
    }
}
