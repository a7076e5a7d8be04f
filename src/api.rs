use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{EvaluationRecord, ModelInfo, RunAccepted, RunRequest, ScenarioInfo};
use anyhow::Context;
use std::time::Duration;

/// HTTP client for the evaluations backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from the loaded configuration
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the model catalog for the picker
    pub async fn fetch_models(&self) -> Result<Vec<ModelInfo>> {
        self.get_json("/api/evaluations/models", "models").await
    }

    /// Fetch the scenario catalog for the picker
    pub async fn fetch_scenarios(&self) -> Result<Vec<ScenarioInfo>> {
        self.get_json("/api/evaluations/scenarios", "scenarios").await
    }

    /// Fetch the full historical evaluation list (records carry no log text)
    pub async fn fetch_evaluations(&self) -> Result<Vec<EvaluationRecord>> {
        self.get_json("/api/evaluations", "evaluations").await
    }

    /// Fetch the full log text of one evaluation by its server-side path.
    ///
    /// An empty path is rejected without a request; the backend has no log
    /// recorded for that result.
    pub async fn fetch_log(&self, path: &str) -> Result<String> {
        if path.is_empty() {
            return Err(Error::LogFetch {
                path: path.to_string(),
                reason: "no log path recorded".to_string(),
            });
        }

        let log_error = |reason: String| Error::LogFetch {
            path: path.to_string(),
            reason,
        };

        let response = self
            .http
            .get(self.url("/api/evaluations/logs"))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| log_error(e.to_string()))?
            .error_for_status()
            .map_err(|e| log_error(e.to_string()))?;

        response.text().await.map_err(|e| log_error(e.to_string()))
    }

    /// Submit a run covering the cross product of the selected ids.
    ///
    /// The backend sometimes reports failures through an `error` field on an
    /// otherwise successful response, so the body is checked either way. The
    /// server-provided message wins over the transport message when both are
    /// available.
    pub async fn submit_run(&self, request: &RunRequest) -> Result<RunAccepted> {
        let response = self
            .http
            .post(self.url("/api/evaluations/run"))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;

        let status = response.status();
        let body: Option<RunAccepted> = response.json().await.ok();

        if let Some(error) = body.as_ref().and_then(|b| b.error.clone()) {
            return Err(Error::Submission(error));
        }
        if !status.is_success() {
            return Err(Error::Submission(format!("backend answered {}", status)));
        }

        body.ok_or_else(|| Error::Submission("backend answered with an empty body".to_string()))
    }

    async fn get_json<T>(&self, path: &str, what: &'static str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| Error::Fetch { what, source })?
            .error_for_status()
            .map_err(|source| Error::Fetch { what, source })?;

        response
            .json()
            .await
            .map_err(|source| Error::Fetch { what, source })
    }
}
