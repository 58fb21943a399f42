use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::ledger::JobLedger;
use crate::queue::DispatchPolicy;

/// One pruning pass. Errors are logged and the sweeper keeps running.
pub async fn sweep_once(ledger: &dyn JobLedger, queue: &str, policy: DispatchPolicy) -> u64 {
    match ledger.prune_finished(queue, policy).await {
        Ok(0) => 0,
        Ok(removed) => {
            info!(queue, removed, "Pruned finished queue jobs");
            removed
        }
        Err(e) => {
            error!(queue, "Retention sweep failed: {e}");
            0
        }
    }
}

/// Prunes finished ledger rows every `every` until `shutdown` flips to true.
pub fn spawn_retention_sweeper(
    ledger: Arc<dyn JobLedger>,
    queue: String,
    policy: DispatchPolicy,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep_once(ledger.as_ref(), &queue, policy).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(queue = %queue, "Retention sweeper stopped");
    })
}
