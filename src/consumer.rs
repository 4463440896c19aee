//! NATS consumer for request-reply classification

use crate::producer::reply;
use crate::service::SentimentService;
use crate::types::request::{AnalyzeRequest, AnalyzeResponse, ErrorResponse};
use anyhow::Result;
use async_nats::{Client, Message, Subject, Subscriber};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Body sent back on the reply subject
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Analyzed(AnalyzeResponse),
    Failed(ErrorResponse),
}

/// Consumer for classification requests arriving over NATS
pub struct RequestConsumer {
    client: Client,
    subject: String,
    workers: usize,
}

impl RequestConsumer {
    /// Create a new request consumer handling up to `workers` messages at once
    pub fn new(client: Client, subject: &str, workers: usize) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            workers: workers.max(1),
        }
    }

    /// Subscribe to the request subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, workers = self.workers, "Subscribed to request subject");
        Ok(subscriber)
    }

    /// Answer requests until `shutdown` flips or the subscription ends.
    ///
    /// Returns only after every in-flight request has been answered.
    pub async fn run(
        self,
        service: SentimentService,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut subscription = self.subscribe().await?;
        let client = self.client.clone();

        dispatch(&mut subscription, self.workers, shutdown, move |message| {
            let client = client.clone();
            let service = service.clone();
            async move { handle_message(&client, &service, message).await }
        })
        .await?;

        if let Err(e) = subscription.unsubscribe().await {
            warn!(error = %e, "Failed to unsubscribe from request subject");
        }
        info!(subject = %self.subject, "Request subscription closed");

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Spawn `handle` for each message with at most `workers` running at once.
///
/// Stops taking messages when `shutdown` flips or the stream ends, then waits
/// for every spawned handler.
async fn dispatch<S, T, F, Fut>(
    mut messages: S,
    workers: usize,
    mut shutdown: watch::Receiver<bool>,
    handle: F,
) -> Result<()>
where
    S: Stream<Item = T> + Unpin,
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handlers = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
            message = messages.next() => {
                let Some(message) = message else { break };
                let permit = semaphore.clone().acquire_owned().await?;
                let task = handle(message);

                handlers.spawn(async move {
                    task.await;
                    drop(permit);
                });
            }
        }
    }

    debug!(in_flight = handlers.len(), "Draining request handlers");
    while handlers.join_next().await.is_some() {}

    Ok(())
}

/// Classify one request payload, or `None` when nobody is waiting for the answer
pub async fn respond(
    service: &SentimentService,
    reply_subject: Option<Subject>,
    payload: &[u8],
) -> Option<(Subject, ReplyBody)> {
    let Some(reply_subject) = reply_subject else {
        warn!("Request without reply subject, dropping");
        return None;
    };

    let body = match serde_json::from_slice::<AnalyzeRequest>(payload) {
        Ok(request) => match service.analyze(request).await {
            Ok(response) => ReplyBody::Analyzed(response),
            Err(e) => ReplyBody::Failed(ErrorResponse {
                error: e.to_string(),
            }),
        },
        Err(e) => {
            warn!(error = %e, "Failed to deserialize request");
            ReplyBody::Failed(ErrorResponse {
                error: format!("invalid request: {}", e),
            })
        }
    };

    Some((reply_subject, body))
}

async fn handle_message(client: &Client, service: &SentimentService, message: Message) {
    let Some((reply_subject, body)) = respond(service, message.reply, &message.payload).await
    else {
        return;
    };

    if let Err(e) = reply(client, reply_subject, &body).await {
        error!(error = %e, "Failed to send reply");
    }
}
