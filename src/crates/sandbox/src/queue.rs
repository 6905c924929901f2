//! Redis-backed delay queue for sandbox pause/delete timeouts (spec §4.3,
//! §6 Delay-queue contract). Implemented as a single Redis sorted set
//! keyed by `(sandbox_id, action)`: the score is the Unix delivery
//! timestamp, so re-scheduling a message for the same key simply
//! overwrites its score (`ZADD` is idempotent per member), which gives "at
//! most one scheduled pause and one scheduled delete per sandbox at any
//! instant" for free.
//!
//! Delivery is at-least-once: a consumer claims a due message by `ZREM`ing
//! it after reading it, and only proceeds if the removal actually removed
//! something (competing consumers will lose the race harmlessly).

use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

const QUEUE_KEY: &str = "sandbox:timeout_queue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutAction {
    Pause,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutMessage {
    pub sandbox_id: String,
    pub action: TimeoutAction,
    pub deliver_at: DateTime<Utc>,
}

impl TimeoutMessage {
    fn member_key(sandbox_id: &str, action: TimeoutAction) -> String {
        format!("{sandbox_id}:{action:?}")
    }
}

pub struct DelayQueue {
    conn: ConnectionManager,
}

impl DelayQueue {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// Schedules (or reschedules, canceling any prior message for the same
    /// `(sandbox_id, action)`) a delayed message.
    pub async fn schedule(
        &self,
        sandbox_id: &str,
        action: TimeoutAction,
        deliver_at: DateTime<Utc>,
    ) -> Result<()> {
        let member = TimeoutMessage {
            sandbox_id: sandbox_id.to_string(),
            action,
            deliver_at,
        };
        let payload = serde_json::to_string(&member)?;
        let score = deliver_at.timestamp() as f64;

        // Remove any stale entry for this key (its payload embeds the old
        // deliver_at, so it won't collide as a ZSET member with the new one).
        self.cancel(sandbox_id, action).await?;

        let mut conn = self.conn.clone();
        let _: () = conn.zadd(QUEUE_KEY, payload, score).await?;
        debug!(sandbox_id, ?action, %deliver_at, "scheduled sandbox timeout message");
        Ok(())
    }

    pub async fn cancel(&self, sandbox_id: &str, action: TimeoutAction) -> Result<()> {
        let prefix = TimeoutMessage::member_key(sandbox_id, action);
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.zrange(QUEUE_KEY, 0, -1).await?;
        for m in members {
            if let Ok(parsed) = serde_json::from_str::<TimeoutMessage>(&m) {
                if TimeoutMessage::member_key(&parsed.sandbox_id, parsed.action) == prefix {
                    let _: () = conn.zrem(QUEUE_KEY, m).await?;
                }
            }
        }
        Ok(())
    }

    /// Pops due messages (score <= now), claiming each via `ZREM` so
    /// competing consumers do not double-process it.
    pub async fn poll_due(&self, now: DateTime<Utc>, limit: isize) -> Result<Vec<TimeoutMessage>> {
        let mut conn = self.conn.clone();
        let due: Vec<String> = conn
            .zrangebyscore_limit(QUEUE_KEY, "-inf", now.timestamp(), 0, limit)
            .await?;

        let mut claimed = Vec::new();
        for payload in due {
            let removed: i64 = conn.zrem(QUEUE_KEY, &payload).await?;
            if removed == 1 {
                if let Ok(msg) = serde_json::from_str::<TimeoutMessage>(&payload) {
                    claimed.push(msg);
                }
            }
        }
        Ok(claimed)
    }
}

/// Consumer-side dedup rule from spec §6: ignore messages whose delivery
/// time predates the sandbox's most recent recorded activity (it has been
/// superseded by a reschedule that lost the cancel race, or activity
/// happened after the message was claimed but before it was processed).
pub fn is_stale(msg: &TimeoutMessage, last_activity_at: DateTime<Utc>) -> bool {
    msg.deliver_at < last_activity_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_older_than_last_activity_is_stale() {
        let now = Utc::now();
        let msg = TimeoutMessage {
            sandbox_id: "sb1".into(),
            action: TimeoutAction::Pause,
            deliver_at: now - chrono::Duration::seconds(10),
        };
        assert!(is_stale(&msg, now));
        assert!(!is_stale(&msg, now - chrono::Duration::seconds(20)));
    }
}
