//! PostgreSQL-backed [`CheckpointSaver`].
//!
//! Generalizes the doc-comment-only `PostgresCheckpointer` example in
//! [`crate::traits`] into a real implementation matching the logical
//! checkpoint layout: `checkpoints(thread_id, ns, checkpoint_id)` holds the
//! checkpoint's versions/metadata envelope; `checkpoint_blobs(thread_id,
//! ns, channel, version)` holds each channel's value so that unchanged
//! channels are not rewritten every superstep; `checkpoint_writes` is the
//! write-ahead log of pending per-task channel updates.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream;
use sqlx::{PgPool, Row};

use crate::checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointId, CheckpointMetadata, CheckpointTuple, ChannelVersion,
    ChannelVersions,
};
use crate::error::{CheckpointError, Result};
use crate::traits::{CheckpointSaver, CheckpointStream};

pub struct PostgresCheckpointSaver {
    pool: PgPool,
}

impl PostgresCheckpointSaver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))
    }

    fn version_key(v: &ChannelVersion) -> String {
        match v {
            ChannelVersion::Int(i) => i.to_string(),
            ChannelVersion::Float(f) => f.to_string(),
            ChannelVersion::String(s) => s.clone(),
        }
    }

    async fn load_channel_values(
        &self,
        thread_id: &str,
        ns: &str,
        versions: &ChannelVersions,
    ) -> Result<HashMap<String, serde_json::Value>> {
        let mut values = HashMap::new();
        for (channel, version) in versions {
            let row = sqlx::query(
                "SELECT blob FROM checkpoint_blobs WHERE thread_id = $1 AND ns = $2 AND channel = $3 AND version = $4",
            )
            .bind(thread_id)
            .bind(ns)
            .bind(channel)
            .bind(Self::version_key(version))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

            if let Some(row) = row {
                let bytes: Vec<u8> = row.get("blob");
                let value: serde_json::Value = serde_json::from_slice(&bytes)?;
                values.insert(channel.clone(), value);
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl CheckpointSaver for PostgresCheckpointSaver {
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".into()))?;
        let ns = config.checkpoint_ns.clone().unwrap_or_default();

        let row = if let Some(checkpoint_id) = &config.checkpoint_id {
            sqlx::query(
                r#"SELECT checkpoint_id, parent_id, state_json, metadata_json
                   FROM checkpoints WHERE thread_id = $1 AND ns = $2 AND checkpoint_id = $3"#,
            )
            .bind(&thread_id)
            .bind(&ns)
            .bind(checkpoint_id)
            .fetch_optional(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"SELECT checkpoint_id, parent_id, state_json, metadata_json
                   FROM checkpoints WHERE thread_id = $1 AND ns = $2
                   ORDER BY created_at DESC LIMIT 1"#,
            )
            .bind(&thread_id)
            .bind(&ns)
            .fetch_optional(&self.pool)
            .await
        }
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        let Some(row) = row else { return Ok(None) };

        let checkpoint_id: CheckpointId = row.get("checkpoint_id");
        let parent_id: Option<String> = row.get("parent_id");
        let state_json: serde_json::Value = row.get("state_json");
        let metadata_json: serde_json::Value = row.get("metadata_json");

        let mut checkpoint: Checkpoint = serde_json::from_value(state_json)?;
        checkpoint.channel_values = self
            .load_channel_values(&thread_id, &ns, &checkpoint.channel_versions)
            .await?;
        let metadata: CheckpointMetadata = serde_json::from_value(metadata_json)?;

        let result_config = CheckpointConfig::new()
            .with_thread_id(thread_id.clone())
            .with_checkpoint_ns(ns.clone())
            .with_checkpoint_id(checkpoint_id);

        let parent_config = parent_id.map(|pid| {
            CheckpointConfig::new()
                .with_thread_id(thread_id.clone())
                .with_checkpoint_ns(ns.clone())
                .with_checkpoint_id(pid)
        });

        Ok(Some(CheckpointTuple {
            config: result_config,
            checkpoint,
            metadata,
            parent_config,
        }))
    }

    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        filter: Option<HashMap<String, serde_json::Value>>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream> {
        let thread_id = config
            .and_then(|c| c.thread_id.clone())
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".into()))?;
        let ns = config.and_then(|c| c.checkpoint_ns.clone()).unwrap_or_default();
        let before_id = before.and_then(|c| c.checkpoint_id.clone());

        let rows = sqlx::query(
            r#"SELECT checkpoint_id, parent_id, state_json, metadata_json, created_at
               FROM checkpoints WHERE thread_id = $1 AND ns = $2
               ORDER BY created_at DESC"#,
        )
        .bind(&thread_id)
        .bind(&ns)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        let mut tuples = Vec::new();
        let mut skipping = before_id.is_some();
        for row in rows {
            let checkpoint_id: CheckpointId = row.get("checkpoint_id");
            if skipping {
                if Some(&checkpoint_id) == before_id.as_ref() {
                    skipping = false;
                }
                continue;
            }

            let metadata_json: serde_json::Value = row.get("metadata_json");
            if let Some(f) = &filter {
                let metadata: CheckpointMetadata = serde_json::from_value(metadata_json.clone())?;
                let matches = f.iter().all(|(k, v)| metadata.extra.get(k) == Some(v));
                if !matches {
                    continue;
                }
            }

            let state_json: serde_json::Value = row.get("state_json");
            let mut checkpoint: Checkpoint = serde_json::from_value(state_json)?;
            checkpoint.channel_values = self
                .load_channel_values(&thread_id, &ns, &checkpoint.channel_versions)
                .await?;
            let metadata: CheckpointMetadata = serde_json::from_value(metadata_json)?;
            let parent_id: Option<String> = row.get("parent_id");

            let result_config = CheckpointConfig::new()
                .with_thread_id(thread_id.clone())
                .with_checkpoint_ns(ns.clone())
                .with_checkpoint_id(checkpoint_id);
            let parent_config = parent_id.map(|pid| {
                CheckpointConfig::new()
                    .with_thread_id(thread_id.clone())
                    .with_checkpoint_ns(ns.clone())
                    .with_checkpoint_id(pid)
            });

            tuples.push(Ok(CheckpointTuple {
                config: result_config,
                checkpoint,
                metadata,
                parent_config,
            }));

            if let Some(limit) = limit {
                if tuples.len() >= limit {
                    break;
                }
            }
        }

        let boxed: Pin<Box<dyn futures::Stream<Item = Result<CheckpointTuple>> + Send>> =
            Box::pin(stream::iter(tuples));
        Ok(boxed)
    }

    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
        new_versions: ChannelVersions,
    ) -> Result<CheckpointConfig> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".into()))?;
        let ns = config.checkpoint_ns.clone().unwrap_or_default();
        let parent_id = config.checkpoint_id.clone();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        for (channel, version) in &new_versions {
            if let Some(value) = checkpoint.channel_values.get(channel) {
                let blob = serde_json::to_vec(value)?;
                sqlx::query(
                    r#"INSERT INTO checkpoint_blobs (thread_id, ns, channel, version, blob)
                       VALUES ($1, $2, $3, $4, $5)
                       ON CONFLICT (thread_id, ns, channel, version) DO UPDATE SET blob = EXCLUDED.blob"#,
                )
                .bind(&thread_id)
                .bind(&ns)
                .bind(channel)
                .bind(Self::version_key(version))
                .bind(blob)
                .execute(&mut *tx)
                .await
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            }
        }

        let mut envelope = checkpoint.clone();
        envelope.channel_values = HashMap::new(); // values live in checkpoint_blobs
        let state_json = serde_json::to_value(&envelope)?;
        let metadata_json = serde_json::to_value(&metadata)?;

        sqlx::query(
            r#"INSERT INTO checkpoints (thread_id, ns, checkpoint_id, parent_id, checkpoint_type, state_json, metadata_json, created_at)
               VALUES ($1, $2, $3, $4, 'checkpoint', $5, $6, $7)
               ON CONFLICT (thread_id, ns, checkpoint_id) DO UPDATE SET
                 state_json = EXCLUDED.state_json, metadata_json = EXCLUDED.metadata_json"#,
        )
        .bind(&thread_id)
        .bind(&ns)
        .bind(&checkpoint.id)
        .bind(&parent_id)
        .bind(state_json)
        .bind(metadata_json)
        .bind(checkpoint.ts)
        .execute(&mut *tx)
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        Ok(CheckpointConfig::new()
            .with_thread_id(thread_id)
            .with_checkpoint_ns(ns)
            .with_checkpoint_id(checkpoint.id))
    }

    async fn put_writes(
        &self,
        config: &CheckpointConfig,
        writes: Vec<(String, serde_json::Value)>,
        task_id: String,
    ) -> Result<()> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".into()))?;
        let ns = config.checkpoint_ns.clone().unwrap_or_default();
        let checkpoint_id = config
            .checkpoint_id
            .clone()
            .ok_or_else(|| CheckpointError::Invalid("checkpoint_id is required".into()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        for (idx, (channel, value)) in writes.into_iter().enumerate() {
            let blob = serde_json::to_vec(&value)?;
            sqlx::query(
                r#"INSERT INTO checkpoint_writes (thread_id, ns, checkpoint_id, task_id, idx, channel, write_type, blob)
                   VALUES ($1, $2, $3, $4, $5, $6, 'value', $7)
                   ON CONFLICT (thread_id, ns, checkpoint_id, task_id, idx) DO UPDATE SET blob = EXCLUDED.blob"#,
            )
            .bind(&thread_id)
            .bind(&ns)
            .bind(&checkpoint_id)
            .bind(&task_id)
            .bind(idx as i32)
            .bind(&channel)
            .bind(blob)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        sqlx::query("DELETE FROM checkpoint_writes WHERE thread_id = $1")
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        sqlx::query("DELETE FROM checkpoint_blobs WHERE thread_id = $1")
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        sqlx::query("DELETE FROM checkpoints WHERE thread_id = $1")
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(())
    }
}
