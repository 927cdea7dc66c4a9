// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Worker pool pulling keys off the work queue and running the reconciler.

use super::ingress::{IngressReconciler, SyncOutcome};
use crate::error::{ControllerError, Result};
use crate::queue::{InFlight, WorkQueue};
use crate::report::ErrorReporter;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Keys that fail more than `max_retries` times are reported and dropped until
/// the next change to their Service enqueues them again.
pub struct Controller {
    queue: Arc<WorkQueue<String>>,
    reconciler: Arc<IngressReconciler>,
    reporter: Arc<dyn ErrorReporter>,
    max_retries: u32,
}

impl Controller {
    pub fn new(
        queue: Arc<WorkQueue<String>>,
        reconciler: Arc<IngressReconciler>,
        reporter: Arc<dyn ErrorReporter>,
        max_retries: u32,
    ) -> Self {
        Self {
            queue,
            reconciler,
            reporter,
            max_retries,
        }
    }

    /// Run `workers` workers until `shutdown` is cancelled, then shut the queue
    /// down and wait for in-flight reconciles to finish.
    pub async fn run(self: Arc<Self>, workers: usize, shutdown: CancellationToken) {
        info!("Starting {} workers", workers);

        let mut pool = JoinSet::new();
        for id in 0..workers {
            let controller = Arc::clone(&self);
            let shutdown = shutdown.clone();
            pool.spawn(async move { controller.worker(id, shutdown).await });
        }

        shutdown.cancelled().await;
        info!("Shutdown requested, waiting for workers to finish");
        self.queue.shut_down();

        while let Some(res) = pool.join_next().await {
            if let Err(e) = res {
                error!("Worker exited abnormally: {}", e);
            }
        }
        info!("All workers stopped");
    }

    async fn worker(&self, id: usize, shutdown: CancellationToken) {
        debug!(worker = id, "Worker started");
        while !shutdown.is_cancelled() && self.process_next_item().await {}
        debug!(worker = id, "Worker stopped");
    }

    /// Take one key, reconcile it and settle its queue state. Returns false
    /// once the queue is shut down.
    pub async fn process_next_item(&self) -> bool {
        let Some(key) = self.queue.get().await else {
            return false;
        };
        let in_flight = InFlight::new(&self.queue, key);
        let key = in_flight.key();

        match self.sync_isolated(key).await {
            Ok(outcome) => {
                debug!(%key, ?outcome, "Reconciled");
                self.queue.forget(key);
            }
            Err(err) => self.handle_error(key, err),
        }
        true
    }

    /// Run the reconcile on its own task so a panic only fails this key.
    async fn sync_isolated(&self, key: &str) -> Result<SyncOutcome> {
        let reconciler = Arc::clone(&self.reconciler);
        let key = key.to_string();
        tokio::spawn(async move { reconciler.sync(&key).await })
            .await
            .unwrap_or_else(|join_err| Err(ControllerError::TaskAborted(join_err.to_string())))
    }

    fn handle_error(&self, key: &String, err: ControllerError) {
        if err.is_retryable() {
            let requeues = self.queue.num_requeues(key);
            if requeues < self.max_retries {
                warn!(%key, attempt = requeues + 1, error = %err, "Reconcile failed, requeueing");
                self.queue.add_rate_limited(key.clone());
                return;
            }
        }

        self.reporter.report(key, &err);
        self.queue.forget(key);
    }
}
