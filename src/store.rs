//! Request log storage - PostgreSQL `sentiment_requests` table

use crate::types::record::SentimentRecord;
use anyhow::Result;
use futures::future::BoxFuture;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sentiment_requests (
    id BIGSERIAL PRIMARY KEY,
    record_id VARCHAR(36) NOT NULL UNIQUE,
    text TEXT NOT NULL,
    label VARCHAR(64) NOT NULL,
    confidence DOUBLE PRECISION NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const INSERT_SQL: &str = r#"
INSERT INTO sentiment_requests (record_id, text, label, confidence, timestamp)
VALUES ($1, $2, $3, $4, $5)
"#;

/// Somewhere classification records are kept
pub trait RecordStore: Send + Sync {
    fn save<'a>(&'a self, record: &'a SentimentRecord) -> BoxFuture<'a, Result<()>>;
}

/// Record store backed by a PostgreSQL pool
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Connect and make sure the table exists
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        info!("Request log table ready");

        Ok(Self { pool })
    }

    /// Wait for in-flight inserts and close every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl RecordStore for PgRecordStore {
    fn save<'a>(&'a self, record: &'a SentimentRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            sqlx::query(INSERT_SQL)
                .bind(&record.record_id)
                .bind(&record.text)
                .bind(&record.label)
                .bind(record.confidence)
                .bind(record.timestamp)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
    }
}
