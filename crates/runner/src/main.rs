//! `predictcr-runner` -- polls the API for queued samples and runs the
//! analysis script on them.
//!
//! Every option can also be set through the environment variable shown in
//! `--help`; a `.env` file in the working directory is loaded first.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use predictcr_runner::backoff::PollConfig;
use predictcr_runner::client::ApiClient;
use predictcr_runner::executor::{ScriptExecutor, SCRIPT_NAME};
use predictcr_runner::poller::Runner;

#[derive(Parser, Debug)]
#[command(name = "predictcr-runner")]
#[command(version)]
#[command(about = "Runs queued samples through the analysis script")]
struct Args {
    /// Base API URL, including the /api/v1 prefix
    #[arg(long, env = "PREDICTCR_API_URL")]
    api_url: String,

    /// Runner token issued by an admin
    #[arg(long, env = "PREDICTCR_JWT_TOKEN", hide_env_values = true)]
    jwt_token: String,

    /// Maximum seconds between polls of an empty queue
    #[arg(long, env = "PREDICTCR_MAX_POLL_INTERVAL", default_value_t = 60)]
    max_poll_interval: u64,

    /// Directory whose contents are copied next to the inputs of every job
    #[arg(long, env = "PREDICTCR_SCRIPT_DIR", default_value = "scripts")]
    script_dir: PathBuf,

    /// Minutes a script may run before it is killed
    #[arg(long, env = "PREDICTCR_JOB_TIMEOUT_MINS", default_value_t = 60)]
    job_timeout_mins: u64,

    /// Hostname reported to the server
    #[arg(long, env = "HOSTNAME", default_value = "unknown")]
    runner_hostname: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "predictcr_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let script = args.script_dir.join(SCRIPT_NAME);
    anyhow::ensure!(
        script.is_file(),
        "{} not found, set --script-dir or PREDICTCR_SCRIPT_DIR",
        script.display()
    );

    tracing::info!(
        api_url = %args.api_url,
        hostname = %args.runner_hostname,
        max_poll_interval = args.max_poll_interval,
        script_dir = %args.script_dir.display(),
        job_timeout_mins = args.job_timeout_mins,
        "Starting predictcr-runner",
    );

    let client = ApiClient::new(&args.api_url, args.jwt_token, args.runner_hostname)
        .context("failed to build HTTP client")?;
    let executor = ScriptExecutor::new(
        args.script_dir,
        Duration::from_secs(args.job_timeout_mins * 60),
    );
    let runner = Runner::new(client, executor, PollConfig::with_max_secs(args.max_poll_interval));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping after the current job");
            ctrl_c.cancel();
        }
    });

    runner.run(&cancel).await;
    Ok(())
}
