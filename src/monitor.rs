//! The gas monitor (component F): a periodic background task that watches
//! the upstream gas price and broadcasts every eligible stored
//! transaction.
//!
//! Shape: a `tokio::select!` racing an `interval` timer against a shared
//! cancellation signal, generalized from a fixed set of timers to a single
//! tick driving the broadcast sweep, plus cancellation racing the tick
//! itself so the loop can also exit mid-wait rather than only between
//! ticks.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::time::interval;

use crate::context::CancellationToken;
use crate::status::Status;
use crate::store::Store;
use crate::upstream::{BroadcastOutcome, UpstreamClient};

/// Drives the periodic broadcast sweep: query gas price, snapshot
/// stored candidates, broadcast each eligible one, and apply the result.
pub struct GasMonitor {
    store: Arc<Store>,
    client: Arc<UpstreamClient>,
    period: Duration,
}

impl GasMonitor {
    pub fn new(store: Arc<Store>, client: Arc<UpstreamClient>, period: Duration) -> Self {
        Self {
            store,
            client,
            period,
        }
    }

    /// Runs until `ctx` is canceled. Each tick:
    /// - queries the current gas price (on failure, logs and continues to
    ///   the next tick);
    /// - takes one snapshot of STORED candidates;
    /// - for each whose fee caps clear the price, broadcasts and applies
    ///   the resulting status transition.
    ///
    /// The store's lock is never held across `get_gas_price` or
    /// `send_raw` — see [`Store::snapshot_stored`].
    pub async fn run(&self, ctx: CancellationToken) {
        // `interval`'s own first tick fires immediately, so the loop below
        // sweeps right away rather than waiting a full period — a
        // transaction ingested just before startup isn't left waiting a
        // full period for its first chance at broadcast.
        let mut ticker = interval(self.period);

        loop {
            tokio::select! {
                biased;
                _ = ctx.canceled() => {
                    debug!("gas monitor stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.sweep(&ctx).await;
                }
            }
        }
    }

    async fn sweep(&self, ctx: &CancellationToken) {
        let gas_price = match self.client.get_gas_price(ctx).await {
            Ok(price) => price,
            Err(e) => {
                warn!("gas monitor: failed to fetch gas price: {e}");
                return;
            }
        };

        let candidates = self.store.snapshot_stored().await;
        for candidate in candidates {
            if candidate.total_cap < gas_price {
                continue;
            }

            match self.client.send_raw(ctx, &candidate.raw_hex).await {
                BroadcastOutcome::Accepted => {
                    if let Err(e) = self
                        .store
                        .change_status(&candidate.hash, Status::Broadcasted)
                        .await
                    {
                        // Only reachable if another writer changed the
                        // status concurrently between the snapshot and
                        // this call.
                        debug!(
                            "gas monitor: could not mark {} BROADCASTED: {e}",
                            candidate.hash
                        );
                    }
                }
                BroadcastOutcome::Rejected(message) => {
                    error!(
                        "gas monitor: upstream rejected {}: {message}",
                        candidate.hash
                    );
                    if let Err(e) = self
                        .store
                        .change_status(&candidate.hash, Status::Failed)
                        .await
                    {
                        debug!("gas monitor: could not mark {} FAILED: {e}", candidate.hash);
                    }
                }
                BroadcastOutcome::Transient(e) => {
                    warn!(
                        "gas monitor: transient failure broadcasting {}: {e}",
                        candidate.hash
                    );
                    // Left STORED; retried on a future tick.
                }
            }
        }
    }
}
