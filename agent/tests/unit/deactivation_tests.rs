//! Deactivation worker behaviour, observed through the controller.

#![allow(clippy::expect_used)]

use std::time::Duration;

use pma_agent::application::services::ActivationController;
use pma_agent::domain::{ActivationStatus, Backoff, RasRemoteStatus};

use crate::helpers::Harness;
use crate::mocks::{FakeTools, ToolCall, exited, ras};

#[tokio::test(start_paused = true)]
async fn successful_worker_resets_to_not_connected() {
    let h = Harness::new(FakeTools::new(ras("connecting")));
    h.step().await.expect("spawn");
    h.controller.wait_for_deactivation().await;

    let state = h.state();
    assert_eq!(state.previous_ras, Some(RasRemoteStatus::NotConnected));
    assert_eq!(state.connecting_since, None);
    assert!(!state.deactivation_in_progress);
    assert_eq!(state.generation, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_deactivate_clears_flag_and_leaves_state_for_retry() {
    let tools = FakeTools::new(ras("connecting"));
    tools.set_deactivate(exited(1, "Error: RPS rejected the request\n"));
    let h = Harness::new(tools);

    h.step().await.expect("spawn");
    h.controller.wait_for_deactivation().await;

    let state = h.state();
    assert!(!state.deactivation_in_progress);
    assert_eq!(state.previous_ras, None);
    assert_eq!(state.generation, 0);
    // No polling after a failed deactivate.
    assert_eq!(
        h.tools.calls().last(),
        Some(&ToolCall::Deactivate {
            url: crate::mocks::RPS_URL.to_string()
        })
    );

    h.step().await.expect("retry");
    h.controller.wait_for_deactivation().await;
    assert_eq!(h.tools.deactivations(), 2);
    assert_eq!(
        h.dm.results(),
        [ActivationStatus::ActivationFailed, ActivationStatus::ActivationFailed]
    );
}

#[tokio::test(start_paused = true)]
async fn deactivate_tool_error_clears_flag() {
    let tools = FakeTools::new(ras("connecting"));
    tools.set_deactivate(Err("rpc timed out after 180s".to_string()));
    let h = Harness::new(tools);

    h.step().await.expect("spawn");
    h.controller.wait_for_deactivation().await;
    assert!(!h.state().deactivation_in_progress);
    assert_eq!(h.state().generation, 0);
}

#[tokio::test(start_paused = true)]
async fn worker_resets_anyway_once_the_schedule_is_spent() {
    let schedule = Backoff {
        initial: Duration::from_secs(1),
        max_delay: Duration::from_secs(1),
        multiplier: 1,
        budget: Duration::from_secs(3),
    };
    let mut h = Harness::new(FakeTools::new(ras("connecting")).link_survives_deactivation());
    h.controller = ActivationController::new(
        std::sync::Arc::clone(&h.tools),
        std::sync::Arc::clone(&h.dm),
        h.clock.clone(),
    )
    .with_deactivation_schedule(schedule);

    let started = tokio::time::Instant::now();
    h.step().await.expect("spawn");
    h.controller.wait_for_deactivation().await;

    assert!(started.elapsed() >= Duration::from_secs(3));
    let polls = h
        .tools
        .calls()
        .iter()
        .skip_while(|c| !matches!(c, ToolCall::Deactivate { .. }))
        .filter(|c| matches!(c, ToolCall::Amtinfo(_)))
        .count();
    assert_eq!(polls, 3);
    assert_eq!(h.state().previous_ras, Some(RasRemoteStatus::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn wait_without_worker_returns_immediately() {
    let h = Harness::new(FakeTools::new(ras("connected")));
    h.controller.wait_for_deactivation().await;
    h.step().await.expect("step");
    h.controller.wait_for_deactivation().await;
    assert_eq!(h.tools.deactivations(), 0);
}
