//! Background task behind one subscription generation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use cc_core::ports::SnapshotStream;
use cc_core::{Generation, UserId};

use super::Shared;

enum StreamEnd {
    /// A newer generation took over; stop without touching shared state.
    Superseded,
    Faulted(String),
}

/// Keep a live query open for `owner` until the generation is superseded.
///
/// Transport faults are retried with exponential backoff; the attempt
/// counter resets as soon as a snapshot gets through.
pub(super) async fn run(shared: Arc<Shared>, generation: Generation, owner: UserId) {
    let mut failures: u32 = 0;

    loop {
        if !shared.mark_subscribing(generation, &owner) {
            return;
        }

        let reason = match shared.store.subscribe(&owner).await {
            Ok(stream) => match pump(&shared, generation, &owner, stream, &mut failures).await {
                StreamEnd::Superseded => return,
                StreamEnd::Faulted(reason) => reason,
            },
            Err(err) => err.to_string(),
        };

        failures = failures.saturating_add(1);
        warn!(%generation, owner = %owner, attempt = failures, %reason, "Live query failed");
        if !shared.record_failure(generation, &owner, failures, reason) {
            return;
        }

        let delay = shared.policy.backoff(failures);
        debug!(%generation, delay_ms = delay.as_millis() as u64, "Retrying live query");
        tokio::time::sleep(delay).await;
    }
}

async fn pump(
    shared: &Shared,
    generation: Generation,
    owner: &UserId,
    mut stream: SnapshotStream,
    failures: &mut u32,
) -> StreamEnd {
    while let Some(result) = stream.recv().await {
        match result {
            Ok(entries) => {
                let count = entries.len();
                if !shared.apply_snapshot(generation, owner, entries) {
                    return StreamEnd::Superseded;
                }
                if *failures > 0 {
                    info!(%generation, after = *failures, "Live query re-established");
                }
                *failures = 0;
                debug!(%generation, count, "Applied snapshot");
            }
            Err(err) => return StreamEnd::Faulted(err.to_string()),
        }
    }

    if shared.is_current(generation) {
        StreamEnd::Faulted("live query closed by store".to_string())
    } else {
        StreamEnd::Superseded
    }
}
