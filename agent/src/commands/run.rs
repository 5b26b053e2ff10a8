//! `pma run` and `pma once`: drive reconciliation steps.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::{AgentContext, Controller};
use crate::application::services::{PeriodicDriver, TickOutcome};

/// Tick every heartbeat until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the Device-Manager channel cannot be configured.
pub async fn run(app: &AgentContext) -> Result<ExitCode> {
    let controller = app.controller()?;
    tracing::info!(
        host_id = %app.config.host_id,
        rps_address = %app.config.rps_address,
        device_manager = %app.config.device_manager.url,
        heartbeat_secs = app.config.heartbeat_interval_secs,
        "pma agent starting"
    );

    let driver = PeriodicDriver::new(
        app.tick(std::sync::Arc::clone(&controller)),
        app.config.heartbeat_interval(),
    );
    driver.run(shutdown_signal()).await;

    drain(app, &controller).await;
    Ok(ExitCode::SUCCESS)
}

/// Run exactly one step and wait for any worker it spawned.
///
/// # Errors
///
/// Returns an error if the Device-Manager channel cannot be configured.
pub async fn once(app: &AgentContext) -> Result<ExitCode> {
    let controller = app.controller()?;
    let driver = PeriodicDriver::new(
        app.tick(std::sync::Arc::clone(&controller)),
        app.config.heartbeat_interval(),
    );
    let outcome = driver.tick().await;
    drain(app, &controller).await;

    Ok(match outcome {
        TickOutcome::Completed | TickOutcome::NotRequested => ExitCode::SUCCESS,
        TickOutcome::Failed | TickOutcome::TimedOut => ExitCode::FAILURE,
    })
}

async fn drain(app: &AgentContext, controller: &Controller) {
    let grace = app.deactivation_grace();
    if tokio::time::timeout(grace, controller.wait_for_deactivation())
        .await
        .is_err()
    {
        tracing::warn!(
            grace_secs = grace.as_secs(),
            "deactivation still running at exit; abandoning it"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
