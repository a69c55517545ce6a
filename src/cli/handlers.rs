//! Subcommand handlers. Each returns the process exit code.

use super::commands::{FormatArgs, LoginArgs, VerifyArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::PuresignConfig;
use crate::history::HistoryCache;
use crate::ondevice::OnDeviceDetector;
use crate::pipeline::{PipelineOrchestrator, RunOutcome, VerificationStatus};
use crate::progress::LoggingHandler;
use crate::remote::{ApiClient, RemoteVerifier};
use crate::session::{IdentityStore, Session, UserId};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Exit code when the user interrupts a run
const EXIT_CANCELLED: i32 = 130;

fn load_config() -> Result<PuresignConfig> {
    let config = PuresignConfig::default();
    config.validate().context("Invalid configuration")?;
    debug!("Configuration loaded: {:?}", config);
    Ok(config)
}

fn resolve_session(config: &PuresignConfig, user: Option<&str>) -> Session {
    Session::resolve(user, config.user_id.as_deref(), &IdentityStore::default())
}

fn report<F>(name: &str, f: F) -> i32
where
    F: FnOnce() -> Result<i32>,
{
    match f() {
        Ok(code) => code,
        Err(e) => {
            error!("{} failed: {:#}", name, e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn report_async<Fut>(name: &str, fut: Fut) -> i32
where
    Fut: std::future::Future<Output = Result<i32>>,
{
    let result = fut.await;
    report(name, || result)
}

pub async fn handle_verify(args: &VerifyArgs, user: Option<&str>) -> i32 {
    report_async("verify", run_verify(args, user)).await
}

async fn run_verify(args: &VerifyArgs, user: Option<&str>) -> Result<i32> {
    let config = load_config()?;
    let session = resolve_session(&config, user);

    let artifact = match config.stager().stage_path(&args.file) {
        Ok(artifact) => artifact,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(1);
        }
    };

    let client = Arc::new(ApiClient::from_config(&config)?);
    let orchestrator =
        PipelineOrchestrator::new(Arc::new(RemoteVerifier::new(client.clone())), session.clone())
            .with_on_device(OnDeviceDetector::default())
            .with_progress(Arc::new(LoggingHandler))
            .with_local_processing(args.local || config.local_processing);

    orchestrator.stage(artifact)?;
    let handle = orchestrator.run()?;

    let outcome = tokio::select! {
        outcome = handle.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            orchestrator.cancel();
            eprintln!("Verification cancelled");
            return Ok(EXIT_CANCELLED);
        }
    };

    let result = match outcome {
        RunOutcome::Finished(result) => result,
        RunOutcome::Abandoned => bail!("Verification run was abandoned"),
    };

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    println!("{}", formatter.format_verification(&result)?);

    let history = HistoryCache::new(client, session);
    match history.on_verification_complete(&result).await {
        Ok(entries) => debug!(count = entries.len(), "History refreshed"),
        Err(e) => warn!("Could not refresh history: {}", e),
    }

    Ok(if result.status() == VerificationStatus::Success {
        0
    } else {
        1
    })
}

pub async fn handle_history(args: &FormatArgs, user: Option<&str>) -> i32 {
    report_async("history", async {
        let config = load_config()?;
        let session = resolve_session(&config, user);
        let client = Arc::new(ApiClient::from_config(&config)?);

        let history = HistoryCache::new(client, session.clone());
        let entries = history.load(session.user_id()).await?;

        let formatter = OutputFormatter::new(OutputFormat::from(args.format));
        println!("{}", formatter.format_history(&entries)?);
        Ok(0)
    })
    .await
}

pub async fn handle_profile(args: &FormatArgs, user: Option<&str>) -> i32 {
    report_async("profile", async {
        let config = load_config()?;
        let session = resolve_session(&config, user);
        let client = ApiClient::from_config(&config)?;

        let profile = client.profile(session.user_id()).await?;

        let formatter = OutputFormatter::new(OutputFormat::from(args.format));
        println!("{}", formatter.format_profile(&profile)?);
        Ok(0)
    })
    .await
}

pub fn handle_login(args: &LoginArgs) -> i32 {
    report("login", || {
        let user_id = UserId::parse(&args.user_id).context("User ID must not be blank")?;
        let store = IdentityStore::default();
        store
            .save(&user_id)
            .context("Failed to save identity")?;

        match store.path() {
            Some(path) => println!("Saved identity '{}' to {}", user_id, path.display()),
            None => println!("Saved identity '{}'", user_id),
        }
        Ok(0)
    })
}

pub async fn handle_health(args: &FormatArgs) -> i32 {
    report_async("health", async {
        let config = load_config()?;
        let client = ApiClient::from_config(&config)?;

        let health = client
            .health()
            .await
            .with_context(|| format!("Service at {} is unavailable", client.base_url()))?;

        let formatter = OutputFormatter::new(OutputFormat::from(args.format));
        println!("{}", formatter.format_health(client.base_url(), &health)?);
        Ok(0)
    })
    .await
}
