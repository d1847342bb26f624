use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::use_cases::digest::{DigestOutcome, DigestUseCases};

/// Runs the digest dispatcher every `poll_secs` seconds. Each run sends at
/// most one pending item.
pub async fn run_digest_loop(digest_use_cases: Arc<DigestUseCases>, poll_secs: u64) {
    let mut ticker = interval(Duration::from_secs(poll_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Digest dispatcher started (polling every {}s)", poll_secs);

    loop {
        ticker.tick().await;

        match digest_use_cases.dispatch_pending().await {
            Ok(DigestOutcome::Sent(summary)) => {
                info!(
                    content_id = summary.content_id,
                    delivered = summary.delivered,
                    failed = summary.failed,
                    "Scheduled digest sent"
                );
            }
            Ok(_) => {}
            Err(e) => error!(error = ?e, "Scheduled digest run failed"),
        }
    }
}
