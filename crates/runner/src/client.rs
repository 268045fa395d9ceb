//! HTTP client for the runner endpoints of the API, using [`reqwest`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use predictcr_core::results::ResultTier;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

/// Timeout applied to every request, including file transfers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// A sample claimed from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DispatchedJob {
    pub job_id: i64,
    pub sample_id: i64,
}

/// The two input files of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFile {
    H5,
    Csv,
}

impl InputFile {
    pub const ALL: [InputFile; 2] = [InputFile::H5, InputFile::Csv];

    /// Name the script expects the file under in its working directory.
    pub fn file_name(self) -> &'static str {
        match self {
            InputFile::H5 => "input.h5",
            InputFile::Csv => "input.csv",
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            InputFile::H5 => "input_h5_file",
            InputFile::Csv => "input_csv_file",
        }
    }
}

/// Errors from the runner's API layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operations a runner performs against the server.
#[async_trait]
pub trait RunnerApi: Send + Sync {
    /// Hostname reported with every dispatch and result.
    fn hostname(&self) -> &str;

    /// Claim the next queued sample. `None` when the queue is empty.
    async fn request_job(&self) -> Result<Option<DispatchedJob>, ClientError>;

    /// Download one input file of `sample_id` to `dest`.
    async fn download_input(
        &self,
        sample_id: i64,
        input: InputFile,
        dest: &Path,
    ) -> Result<(), ClientError>;

    /// Upload a successful result with one archive per tier.
    async fn upload_result(
        &self,
        job: &DispatchedJob,
        archives: &[(ResultTier, PathBuf)],
    ) -> Result<(), ClientError>;

    /// Report a failed job.
    async fn report_failure(&self, job: &DispatchedJob, message: &str) -> Result<(), ClientError>;
}

/// [`RunnerApi`] over HTTP with a bearer token.
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    hostname: String,
}

impl ApiClient {
    /// Create a client.
    ///
    /// * `api_url` - Base URL including the API prefix, e.g.
    ///   `https://predictcr.example.org/api/v1`.
    pub fn new(api_url: &str, token: String, hostname: String) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            hostname,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_url)
    }

    fn base_form(&self, job: &DispatchedJob, success: bool) -> Form {
        Form::new()
            .text("job_id", job.job_id.to_string())
            .text("sample_id", job.sample_id.to_string())
            .text("success", success.to_string())
            .text("runner_hostname", self.hostname.clone())
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn post_result(&self, form: Form) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("runner/result"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RunnerApi for ApiClient {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn request_job(&self) -> Result<Option<DispatchedJob>, ClientError> {
        let response = self
            .client
            .post(self.url("runner/request_job"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "runner_hostname": self.hostname }))
            .send()
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let job = Self::ensure_success(response).await?.json().await?;
        Ok(Some(job))
    }

    async fn download_input(
        &self,
        sample_id: i64,
        input: InputFile,
        dest: &Path,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(input.endpoint()))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "sample_id": sample_id }))
            .send()
            .await?;
        let mut response = Self::ensure_success(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn upload_result(
        &self,
        job: &DispatchedJob,
        archives: &[(ResultTier, PathBuf)],
    ) -> Result<(), ClientError> {
        let mut form = self.base_form(job, true);
        for (tier, path) in archives {
            let data = tokio::fs::read(path).await?;
            let part = Part::bytes(data).file_name(tier.file_name());
            form = form.part(tier.field_name(), part);
        }
        self.post_result(form).await
    }

    async fn report_failure(&self, job: &DispatchedJob, message: &str) -> Result<(), ClientError> {
        let form = self
            .base_form(job, false)
            .text("error_message", message.to_string());
        self.post_result(form).await
    }
}
