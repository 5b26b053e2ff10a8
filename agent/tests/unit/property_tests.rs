//! Property-based tests for the controller invariants.
//!
//! Each case drives a fresh controller through a random trace of ticks on a
//! paused current-thread runtime, so backoff sleeps complete instantly and
//! the gated deactivation worker only finishes when the trace says so.

#![allow(clippy::expect_used)]

use std::time::Duration;

use proptest::prelude::*;

use pma_agent::application::services::STUCK_CONNECTING_TIMEOUT;
use pma_agent::domain::{ActivationStatus, RasRemoteStatus};

use crate::helpers::Harness;
use crate::mocks::{AUTH_FAILED, CIRA_OK, FakeTools, ToolCall, ToolReply, ok, ras};

#[derive(Debug, Clone, Copy)]
enum Link {
    NotConnected,
    Connecting,
    Connected,
    Garbage,
}

impl Link {
    fn reply(self) -> ToolReply {
        ras(match self {
            Self::NotConnected => "not connected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Garbage => "disabled",
        })
    }

    fn status(self) -> RasRemoteStatus {
        match self {
            Self::NotConnected => RasRemoteStatus::NotConnected,
            Self::Connecting => RasRemoteStatus::Connecting,
            Self::Connected => RasRemoteStatus::Connected,
            Self::Garbage => RasRemoteStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ToolResult {
    Cira,
    AuthFailed,
    Interrupted,
    Other,
}

impl ToolResult {
    fn reply(self) -> ToolReply {
        ok(match self {
            Self::Cira => CIRA_OK,
            Self::AuthFailed => AUTH_FAILED,
            Self::Interrupted => "read: interrupted system call\n",
            Self::Other => "unexpected failure\n",
        })
    }
}

#[derive(Debug, Clone)]
struct Tick {
    observed: Link,
    activation: ToolResult,
    /// What post-CIRA polls see.
    poll: Link,
    advance_secs: u64,
    finish_worker: bool,
}

fn link() -> impl Strategy<Value = Link> {
    prop_oneof![
        3 => Just(Link::NotConnected),
        3 => Just(Link::Connecting),
        2 => Just(Link::Connected),
        1 => Just(Link::Garbage),
    ]
}

fn tool_result() -> impl Strategy<Value = ToolResult> {
    prop_oneof![
        3 => Just(ToolResult::Cira),
        1 => Just(ToolResult::AuthFailed),
        1 => Just(ToolResult::Interrupted),
        1 => Just(ToolResult::Other),
    ]
}

fn tick() -> impl Strategy<Value = Tick> {
    (link(), tool_result(), link(), 0u64..=240, any::<bool>()).prop_map(
        |(observed, activation, poll, advance_secs, finish_worker)| Tick {
            observed,
            activation,
            poll,
            advance_secs,
            finish_worker,
        },
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime")
}

/// Between two `activate` calls some `amtinfo` must have read `not connected`.
fn no_silent_activation_loop(calls: &[ToolCall]) -> bool {
    let mut armed = true;
    for call in calls {
        match call {
            ToolCall::Amtinfo(RasRemoteStatus::NotConnected) => armed = true,
            ToolCall::Activate { .. } if !armed => return false,
            ToolCall::Activate { .. } => armed = false,
            _ => {}
        }
    }
    true
}

async fn run_trace(ticks: Vec<Tick>) -> Result<(), TestCaseError> {
    let h = Harness::new(FakeTools::new(ras("not connected")).gated());

    for t in ticks {
        if t.finish_worker && h.state().deactivation_in_progress {
            h.finish_deactivation().await;
        }

        h.tools.clear_amtinfo_queue();
        h.tools.queue_amtinfo([t.observed.reply()]);
        h.tools.set_amtinfo(t.poll.reply());
        h.tools.set_activate(t.activation.reply());
        h.clock.advance(Duration::from_secs(t.advance_secs));

        let before = h.state();
        let calls_before = h.tools.calls().len();
        let now = pma_agent::application::ports::Clock::now(&h.clock);

        h.step().await.map_err(|e| TestCaseError::fail(format!("{e:#}")))?;
        let after = h.state();

        // Never two workers.
        prop_assert!(h.tools.max_concurrent_deactivations() <= 1);

        // `connecting_since` is set iff previous_ras is connecting.
        prop_assert_eq!(
            after.connecting_since.is_some(),
            after.previous_ras == Some(RasRemoteStatus::Connecting),
            "state after step: {:?}",
            after
        );

        // Stuck connecting always ends in a worker.
        if let (Some(RasRemoteStatus::Connecting), Some(since)) =
            (before.previous_ras, before.connecting_since)
        {
            let stuck = (now - since).to_std().unwrap_or_default() > STUCK_CONNECTING_TIMEOUT;
            if stuck && matches!(t.observed, Link::Connecting) {
                prop_assert!(after.deactivation_in_progress);
            }
        }

        // Connected is terminal and cheap.
        if before.previous_ras == Some(RasRemoteStatus::Connected)
            && t.observed.status() == RasRemoteStatus::Connected
        {
            prop_assert_eq!(h.dm.last_result(), Some(ActivationStatus::Activated));
            let calls = h.tools.calls();
            prop_assert!(
                calls[calls_before..]
                    .iter()
                    .all(|c| matches!(c, ToolCall::Amtinfo(_))),
                "unexpected calls: {:?}",
                &calls[calls_before..]
            );
        }
    }

    // No activation without a fresh `not connected`.
    prop_assert!(no_silent_activation_loop(&h.tools.calls()));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_controller_invariants_hold(ticks in prop::collection::vec(tick(), 1..24)) {
        runtime().block_on(run_trace(ticks))?;
    }
}

#[test]
fn silent_activation_loop_is_detected() {
    let activate = ToolCall::Activate {
        url: String::new(),
        profile: String::new(),
    };
    assert!(!no_silent_activation_loop(&[
        ToolCall::Amtinfo(RasRemoteStatus::NotConnected),
        activate.clone(),
        ToolCall::Amtinfo(RasRemoteStatus::Connecting),
        activate.clone(),
    ]));
    assert!(no_silent_activation_loop(&[
        ToolCall::Amtinfo(RasRemoteStatus::NotConnected),
        activate.clone(),
        ToolCall::Amtinfo(RasRemoteStatus::NotConnected),
        activate,
    ]));
}
