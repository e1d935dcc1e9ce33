use crate::reconciler::Reconciler;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// Runs one reconciliation and logs how it went.
pub async fn run_once(reconciler: &Reconciler) {
    match reconciler.reconcile().await {
        Ok(report) => match report.outcome() {
            Ok(()) => info!(mutations = report.mutations(), "Sync completed"),
            Err(e) => warn!(error = %e, "Sync completed with failures"),
        },
        Err(e) => error!(error = %e, "Sync failed"),
    }
}

/// Reconciles every `period` until `shutdown` flips to true. A pass that has
/// already started always runs to the end; shutdown is only observed between
/// passes.
pub async fn run_periodic(
    reconciler: Arc<Reconciler>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = interval.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        info!("Running scheduled sync");
        run_once(&reconciler).await;
        info!("Scheduled sync finished, sleeping for {} seconds", period.as_secs());
    }

    info!("Scheduled sync stopped");
}
