use thiserror::Error;

/// Failures the evaluation workflow can surface.
///
/// None of these are fatal to the process: validation and submission errors
/// leave the coordinator ready for a retry, fetch errors are retried by
/// re-running the command, and log-fetch failures degrade to a missing log
/// on a single result.
#[derive(Debug, Error)]
pub enum Error {
    /// The selection was rejected before any request was sent.
    #[error("invalid selection: {0}")]
    Validation(String),

    /// The run-start request failed or the backend answered with an error.
    #[error("failed to start evaluation run: {0}")]
    Submission(String),

    /// A read from the backend (models, scenarios, history) failed.
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// A single result's log could not be retrieved. Never fails finalization.
    #[error("failed to fetch log {path:?}: {reason}")]
    LogFetch { path: String, reason: String },

    /// The event channel closed before the completion signal arrived.
    #[error("event channel closed before the run completed")]
    ChannelClosed,

    /// No event arrived within the configured window while a run was tracked.
    #[error("no progress event received for {0} seconds")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
