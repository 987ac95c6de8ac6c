//! Background job: the notification delivery sweep.
//!
//! Promotes due `pending` notifications to `sent` on a fixed interval,
//! decoupled from any user-facing request. The status-guarded UPDATE in the
//! store makes each promotion at-most-once even when a per-request sweep
//! (`GET /api/v1/notifications/due`) runs concurrently.

use std::time::Duration;

use chrono::Utc;
use tokio::time;

use crate::store::postgres::PgStore;

/// Spawn the periodic delivery sweep. Call this once at startup.
pub fn spawn(db: PgStore, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match db.sweep_all_due_notifications(Utc::now()).await {
                Ok(0) => {}
                Ok(rows) => {
                    tracing::info!(rows, "delivery sweep: promoted due notifications to sent")
                }
                Err(e) => tracing::error!("delivery sweep failed: {}", e),
            }
        }
    });
}

/// Run a single sweep, for the `sweep` CLI subcommand. Returns the number of
/// notifications promoted.
pub async fn run_once(db: &PgStore) -> anyhow::Result<u64> {
    db.sweep_all_due_notifications(Utc::now()).await
}
