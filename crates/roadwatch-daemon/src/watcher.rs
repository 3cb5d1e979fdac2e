use crate::pipeline::{self, PipelineDeps};
use anyhow::Result;
use roadwatch_core::now_ms;
use std::time::Duration;
use tokio::time::interval;
use tracing::warn;

/// Periodically re-trigger verification for records stuck in pending.
///
/// This is the at-least-once backstop behind the submit/retry triggers;
/// the pipeline's status guard makes duplicate triggers a no-op. The
/// grace period keeps freshly submitted records from being double-run
/// while their first invocation is still in flight.
pub fn spawn_watcher(deps: PipelineDeps, tick_seconds: u64, grace_seconds: u64) {
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(tick_seconds));
        loop {
            tick.tick().await;
            if let Err(e) = watcher_tick(&deps, grace_seconds).await {
                warn!("watcher tick error: {e:?}");
            }
        }
    });
}

async fn watcher_tick(deps: &PipelineDeps, grace_seconds: u64) -> Result<()> {
    let cutoff = now_ms() - (grace_seconds as i64) * 1000;
    let stale = deps.db.list_pending_before(cutoff).await?;
    for record in stale {
        let deps = deps.clone();
        tokio::spawn(async move {
            pipeline::verify_hazard(&deps, &record.id, None).await;
        });
    }
    Ok(())
}
