//! Idempotent webhook event tracking (spec §4.5, §8 S6).
//!
//! Mirrors `webhook_lock.py`'s state machine: a `processing` row younger
//! than five minutes means another worker owns the event and this call
//! should back off; older than five minutes is treated as stuck and taken
//! over; `completed` short-circuits to success; `failed` allows retry.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sqlx::{PgPool, Row};
use tracing::warn;

use crate::error::Result;

const STUCK_PROCESSING_WINDOW: ChronoDuration = ChronoDuration::seconds(300);
const ERROR_MAX_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Caller should process the event now (fresh, retried, or taken over).
    Proceed,
    /// Already completed; skip with success.
    AlreadyCompleted,
    /// Another worker owns it and hasn't been idle long enough to steal.
    InProgress,
}

pub struct WebhookStore {
    pool: PgPool,
}

impl WebhookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically checks and claims an event id for processing. Returns
    /// `Proceed` when the caller should go ahead and call
    /// `mark_completed`/`mark_failed` afterwards.
    pub async fn check_and_mark_processing(
        &self,
        event_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookOutcome> {
        let existing = sqlx::query(
            "SELECT status, created_at FROM webhook_events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = existing {
            let status: String = row.get("status");
            let created_at: DateTime<Utc> = row.get("created_at");

            match status.as_str() {
                "completed" => return Ok(WebhookOutcome::AlreadyCompleted),
                "processing" => {
                    let age = Utc::now() - created_at;
                    if age < STUCK_PROCESSING_WINDOW {
                        return Ok(WebhookOutcome::InProgress);
                    }
                    warn!(event_id, age_secs = age.num_seconds(), "webhook event stuck in processing, taking over");
                }
                "failed" => {} // allow retry
                other => warn!(event_id, status = other, "unexpected webhook status"),
            }
        }

        sqlx::query(
            r#"INSERT INTO webhook_events (id, event_type, status, payload, created_at)
               VALUES ($1, $2, 'processing', $3, $4)
               ON CONFLICT (id) DO UPDATE SET status = 'processing', created_at = $4, error = NULL"#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(WebhookOutcome::Proceed)
    }

    pub async fn mark_completed(&self, event_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE webhook_events SET status = 'completed', completed_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, event_id: &str, error: &str) -> Result<()> {
        let truncated: String = error.chars().take(ERROR_MAX_LEN).collect();
        sqlx::query("UPDATE webhook_events SET status = 'failed', error = $1 WHERE id = $2")
            .bind(truncated)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn event_status(&self, event_id: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT status FROM webhook_events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("status")))
    }

    pub async fn cleanup_old_events(&self, older_than_days: i64) -> Result<u64> {
        let cutoff = Utc::now() - ChronoDuration::days(older_than_days);
        let result = sqlx::query("DELETE FROM webhook_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_truncated() {
        let long = "x".repeat(5000);
        let truncated: String = long.chars().take(ERROR_MAX_LEN).collect();
        assert_eq!(truncated.len(), ERROR_MAX_LEN);
    }
}
