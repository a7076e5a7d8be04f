use crate::channel::EventChannel;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{CompletionEvent, ProgressEvent};
use anyhow::Context;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;

/// One frame of the newline-delimited JSON event stream
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum EventFrame {
    EvaluationProgress(ProgressEvent),
    EvaluationComplete(CompletionEvent),
}

/// Reader for the backend's real-time event stream.
///
/// The stream is one long-lived HTTP response carrying one JSON object per
/// line. Frames are decoded and republished onto the in-process
/// [`EventChannel`]; any other transport can feed the same channel.
#[derive(Debug, Clone)]
pub struct EventStream {
    http: reqwest::Client,
    url: String,
}

impl EventStream {
    /// Build a stream reader from the loaded configuration.
    ///
    /// Uses its own HTTP client: the stream stays open for the whole run, so
    /// only the connect phase is bounded, not the response body.
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build event stream client")?;

        Ok(Self {
            http,
            url: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.events_path
            ),
        })
    }

    /// Consume frames and republish them until a completion frame arrives or
    /// the stream ends.
    ///
    /// Malformed lines are skipped with a warning; the stream itself decides
    /// what to deliver and in what order.
    pub async fn pump(&self, channel: &EventChannel) -> Result<()> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|source| Error::Fetch {
                what: "event stream",
                source,
            })?
            .error_for_status()
            .map_err(|source| Error::Fetch {
                what: "event stream",
                source,
            })?;

        let mut body = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| Error::Fetch {
                what: "event stream",
                source,
            })?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                if dispatch_line(&line, channel) == Dispatch::Completed {
                    return Ok(());
                }
            }
        }

        // Stream ended without a completion frame; flush a trailing
        // unterminated line if the server left one.
        if !buffer.is_empty() {
            dispatch_line(&buffer, channel);
        }

        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Dispatch {
    Continue,
    Completed,
}

/// Decode one line and publish the frame it carries
fn dispatch_line(line: &[u8], channel: &EventChannel) -> Dispatch {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Dispatch::Continue;
    }

    match serde_json::from_str::<EventFrame>(text) {
        Ok(EventFrame::EvaluationProgress(event)) => {
            channel.publish_progress(event);
            Dispatch::Continue
        }
        Ok(EventFrame::EvaluationComplete(event)) => {
            channel.publish_completion(event);
            Dispatch::Completed
        }
        Err(error) => {
            tracing::warn!(%error, "skipping malformed event frame");
            Dispatch::Continue
        }
    }
}
