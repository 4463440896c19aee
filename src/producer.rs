//! NATS publisher for classification records and request replies

use crate::types::record::SentimentRecord;
use anyhow::Result;
use async_nats::{Client, Subject};
use serde::Serialize;
use tracing::debug;

/// Publishes a record of every successful classification.
///
/// Whatever subscribes to the subject owns persistence; the service only
/// hands the record over.
#[derive(Clone)]
pub struct RecordProducer {
    client: Client,
    subject: String,
}

impl RecordProducer {
    /// Create a new record producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a classification record
    pub async fn publish(&self, record: &SentimentRecord) -> Result<()> {
        let payload = serde_json::to_vec(record)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            record_id = %record.record_id,
            label = %record.label,
            confidence = record.confidence,
            "Published sentiment record"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Send a JSON reply to a request-reply message
pub async fn reply<T: Serialize>(client: &Client, subject: Subject, body: &T) -> Result<()> {
    let payload = serde_json::to_vec(body)?;
    client.publish(subject, payload.into()).await?;
    Ok(())
}
