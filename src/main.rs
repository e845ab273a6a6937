//! # Workpull Demo
//!
//! Starts a dispatcher, a UUID feeder and a pool of hello workers, then submits a
//! fresh UUID every few milliseconds until the run ends.
//!
//! ## Usage
//!
//! ```bash
//! # Run until Ctrl-C with settings from the config file
//! workpull
//!
//! # Ten workers, a small queue, stop after five seconds
//! workpull --workers 10 --capacity 100 --duration-secs 5
//! ```
//!
//! Settings live in `config.yaml` in the platform config directory and are created
//! with defaults on first run.

use std::time::Duration;

use clap::Parser;
use ractor::{
    ActorRef,
    rpc::{CallResult, call}
};
use tracing::{Level, event};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use workpull::{
    DispatchError, Supervisor, SupervisorMessage, SystemHealth,
    adapter::metrics::InMemoryMetrics,
    cli::Cli,
    config::{load_settings, load_settings_from},
    domain::constant::supervisor
};

#[tokio::main]
async fn main() -> Result<(), DispatchError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    let settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings()?
    };
    let settings = cli.apply(settings);
    settings.validate()?;

    let metrics = InMemoryMetrics::new();
    let supervisor_ref = Supervisor::spawn_system(settings.clone(), metrics).await?;

    let mut producer = tokio::time::interval(Duration::from_millis(settings.submit_interval_ms.max(1)));
    let deadline = async {
        match cli.duration_secs {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => std::future::pending::<()>().await
        }
    };
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(deadline, interrupted);

    loop {
        tokio::select! {
            _ = producer.tick() => {
                let payload = Uuid::new_v4().to_string();
                if let Err(e) = supervisor_ref.cast(SupervisorMessage::Submit { payload }) {
                    event!(Level::ERROR, event = supervisor::WORK_SUBMITTED, error = %e);
                    break;
                }
            }
            _ = &mut deadline => break,
            _ = &mut interrupted => break
        }
    }

    let result = report(&supervisor_ref).await;

    if let Err(e) = supervisor_ref.cast(SupervisorMessage::Shutdown) {
        eprintln!("Failed to shut down actor system: {}", e);
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    result
}

/// Print the final health report as JSON
async fn report(supervisor_ref: &ActorRef<SupervisorMessage>) -> Result<(), DispatchError> {
    let health: SystemHealth =
        match call(supervisor_ref, |reply| SupervisorMessage::HealthCheck { reply }, Some(Duration::from_secs(5)))
            .await
        {
            Ok(CallResult::Success(health)) => health,
            Ok(CallResult::Timeout) => return Err(DispatchError::Timeout("Health check timed out".to_string())),
            Ok(_) => return Err(DispatchError::Messaging("Health check was dropped".to_string())),
            Err(e) => return Err(DispatchError::from(e))
        };

    let json = serde_json::to_string_pretty(&health).map_err(|e| DispatchError::Generic(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
