//! Poll `amtinfo` until the remote-management link reaches a wanted state.

use tokio::time::Instant;

use crate::application::ports::ToolExecutor;
use crate::domain::{AmtSnapshot, Backoff, RasRemoteStatus};

/// Sleep-then-poll along `schedule` until `accept` holds for the observed
/// `RAS Remote Status`.
///
/// Returns the accepted status, or `None` once the schedule is spent or the
/// next sleep would cross `deadline`. Failed `amtinfo` runs count as misses.
pub async fn wait_for_ras<T, F>(
    tools: &T,
    schedule: Backoff,
    deadline: Option<Instant>,
    accept: F,
) -> Option<RasRemoteStatus>
where
    T: ToolExecutor + ?Sized,
    F: Fn(RasRemoteStatus) -> bool,
{
    for delay in schedule.delays() {
        if deadline.is_some_and(|d| Instant::now() + delay >= d) {
            tracing::debug!("AMT poll stopped at step deadline");
            break;
        }
        tokio::time::sleep(delay).await;
        match tools.amtinfo().await {
            Ok(out) => {
                let ras = AmtSnapshot::parse(&out.output).ras_remote_status;
                tracing::debug!(%ras, "polled AMT");
                if accept(ras) {
                    return Some(ras);
                }
            }
            Err(e) => tracing::debug!(error = %format!("{e:#}"), "amtinfo poll failed"),
        }
    }
    None
}
