//! Per-slot health watcher.
//!
//! Every slot gets its own watcher task. A cycle looks at the slot and:
//!
//! 1. reconnects an empty slot,
//! 2. skips a slot that is checked out,
//! 3. otherwise takes the connection out of circulation, sends a heartbeat
//!    and either hands the connection back or replaces it in place.
//!
//! Cycles are separated by the configured health-check interval. The sleep
//! holds no lock. Watchers stop when the pool's cancellation token fires:
//! a heartbeat in flight is abandoned and its connection closed, while a
//! reconnect in flight runs to completion (it is bounded by the connect
//! timeout) so that the new connection lands in the slot and is closed by
//! shutdown.

use std::sync::Arc;

use ldap_proto::{Connector, DirectoryClient};
use tokio_util::sync::CancellationToken;

use crate::lifecycle::HealthCheckResult;
use crate::pool::PoolInner;
use crate::registry::Inspection;

pub(crate) struct HealthWatcher<C: Connector> {
    index: usize,
    pool: Arc<PoolInner<C>>,
    cancel: CancellationToken,
}

impl<C: Connector> HealthWatcher<C> {
    pub(crate) fn new(index: usize, pool: Arc<PoolInner<C>>, cancel: CancellationToken) -> Self {
        Self {
            index,
            pool,
            cancel,
        }
    }

    pub(crate) async fn run(self) {
        let interval = self.pool.config().health_check_interval;
        tracing::trace!(slot = self.index, "health watcher started");

        // A slot that is already populated was just connected; give it one
        // interval before the first probe.
        let populated = self
            .pool
            .registry()
            .slot(self.index)
            .is_some_and(|slot| slot.is_open());
        if !populated && !self.step().await {
            return;
        }

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
            if !self.step().await {
                break;
            }
        }

        tracing::trace!(slot = self.index, "health watcher stopped");
    }

    /// Run one cycle unless cancelled. Returns `false` once cancelled.
    async fn step(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.cycle().await;
        !self.cancel.is_cancelled()
    }

    async fn cycle(&self) {
        let Some(slot) = self.pool.registry().slot(self.index) else {
            return;
        };

        match slot.inspect() {
            Inspection::Busy => {
                tracing::trace!(slot = self.index, "slot in use; skipping health check");
            }
            Inspection::Empty => {
                if let Some(mut leftover) = slot.clear() {
                    leftover.close().await;
                }
                self.reconnect().await;
            }
            Inspection::Check(mut client, metadata) => {
                let probed = tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => None,
                    result = self.pool.heartbeat(&mut client) => Some(result),
                };
                let Some(result) = probed else {
                    tracing::debug!(
                        slot = self.index,
                        connection_id = metadata.id,
                        "pool closing; abandoning heartbeat"
                    );
                    client.close().await;
                    self.pool.record_connection_closed();
                    return;
                };
                self.pool.record_health_check(result.is_healthy());

                match result {
                    HealthCheckResult::Healthy => {
                        let outcome = slot.restore(client);
                        self.pool.registry().settle(self.index, outcome);
                    }
                    HealthCheckResult::Closing => {
                        tracing::warn!(
                            slot = self.index,
                            connection_id = metadata.id,
                            "connection is closing; replacing it"
                        );
                        self.replace(slot.clear(), client).await;
                    }
                    HealthCheckResult::Failed(error) => {
                        tracing::warn!(
                            slot = self.index,
                            connection_id = metadata.id,
                            error = %error,
                            "heartbeat failed; replacing connection"
                        );
                        self.replace(slot.clear(), client).await;
                    }
                }
            }
        }
    }

    /// Close a dead connection and reconnect the same slot.
    async fn replace(&self, parked: Option<C::Client>, mut dead: C::Client) {
        if let Some(mut parked) = parked {
            parked.close().await;
        }
        dead.close().await;
        self.pool.record_connection_closed();
        self.pool.record_reconnect();
        self.reconnect().await;
    }

    async fn reconnect(&self) {
        let Some(slot) = self.pool.registry().slot(self.index) else {
            return;
        };

        match self.pool.open_connection(self.index).await {
            Ok((client, metadata)) => {
                let connection_id = metadata.id;
                let outcome = slot.make_available(client, metadata);
                self.pool.registry().settle(self.index, outcome);
                tracing::info!(slot = self.index, connection_id, "slot connected");
            }
            Err(error) => {
                tracing::warn!(
                    slot = self.index,
                    error = %error,
                    "connect failed; retrying after the next interval"
                );
            }
        }
    }
}
