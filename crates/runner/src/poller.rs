//! The polling loop: claim a job, run it, report the outcome.

use std::path::PathBuf;

use predictcr_core::results::ResultTier;
use tokio_util::sync::CancellationToken;

use crate::backoff::{next_delay, PollConfig};
use crate::client::{ClientError, DispatchedJob, InputFile, RunnerApi};
use crate::executor::ScriptExecutor;

/// What a single poll of the server did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A job was claimed and its outcome reported.
    Processed(DispatchedJob),
    /// The queue was empty or the server could not be reached.
    Idle,
}

pub struct Runner<A> {
    api: A,
    executor: ScriptExecutor,
    poll: PollConfig,
}

impl<A: RunnerApi> Runner<A> {
    pub fn new(api: A, executor: ScriptExecutor, poll: PollConfig) -> Self {
        Self {
            api,
            executor,
            poll,
        }
    }

    /// Poll until `cancel` fires.
    ///
    /// Empty polls back off exponentially; after a processed job the next
    /// poll happens immediately and the delay starts over. Cancellation is
    /// only observed between jobs.
    pub async fn run(&self, cancel: &CancellationToken) {
        let mut delay = self.poll.initial_delay;
        tracing::info!(hostname = self.api.hostname(), "Polling for jobs");

        while !cancel.is_cancelled() {
            match self.poll_once().await {
                PollOutcome::Processed(_) => {
                    delay = self.poll.initial_delay;
                }
                PollOutcome::Idle => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    delay = next_delay(delay, &self.poll);
                }
            }
        }
        tracing::info!("Runner stopped");
    }

    /// Request one job and, if one is dispatched, process it.
    pub async fn poll_once(&self) -> PollOutcome {
        let job = match self.api.request_job().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::debug!("No job available");
                return PollOutcome::Idle;
            }
            Err(e) => {
                tracing::error!(error = %e, "request_job failed");
                return PollOutcome::Idle;
            }
        };

        tracing::info!(job_id = job.job_id, sample_id = job.sample_id, "Starting job");
        if let Err(e) = self.process(&job).await {
            // The server requeues the sample once the job times out.
            tracing::error!(job_id = job.job_id, error = %e, "Failed to report job outcome");
        }
        PollOutcome::Processed(job)
    }

    async fn process(&self, job: &DispatchedJob) -> Result<(), ClientError> {
        let work_dir = tempfile::tempdir()?;
        match self.execute(job, work_dir.path().to_path_buf()).await {
            Ok(archives) => {
                self.api.upload_result(job, &archives).await?;
                tracing::info!(job_id = job.job_id, sample_id = job.sample_id, "Job finished, results uploaded");
            }
            Err(message) => {
                tracing::warn!(job_id = job.job_id, sample_id = job.sample_id, %message, "Job failed");
                self.api.report_failure(job, &message).await?;
            }
        }
        Ok(())
    }

    /// Download inputs and run the script. `Err` carries the failure report.
    async fn execute(
        &self,
        job: &DispatchedJob,
        work_dir: PathBuf,
    ) -> Result<Vec<(ResultTier, PathBuf)>, String> {
        let hostname = self.api.hostname();
        for input in InputFile::ALL {
            let dest = work_dir.join(input.file_name());
            if let Err(e) = self.api.download_input(job.sample_id, input, &dest).await {
                return Err(format!(
                    "Failed to download {} on {hostname}: {e}",
                    input.file_name()
                ));
            }
        }
        self.executor
            .run(&work_dir)
            .await
            .map_err(|e| format!("Error during job execution on {hostname}: {e}"))
    }
}
