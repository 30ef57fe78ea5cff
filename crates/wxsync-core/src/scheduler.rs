// ── Sync scheduler ──
//
// Owns the engine inside one background task. Sleep-after-pass: the next
// pass starts one interval after the previous one finished. Cancellation
// only interrupts the wait between passes.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::bootstrap::StartMode;
use crate::engine::SyncEngine;

struct Armed {
    cancel: CancellationToken,
    handle: JoinHandle<SyncEngine>,
}

/// Holds at most one running timer task.
#[derive(Default)]
pub struct SyncScheduler {
    armed: Option<Armed>,
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Start polling with `engine`. Any previous timer is cancelled and
    /// awaited first; its engine is returned.
    pub async fn arm(&mut self, engine: SyncEngine, mode: StartMode) -> Option<SyncEngine> {
        let previous = self.disarm().await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sync_task(engine, mode, cancel.clone()));
        self.armed = Some(Armed { cancel, handle });
        info!(?mode, "sync scheduler armed");
        previous
    }

    /// Stop the timer and take the engine back, waiting for a pass in
    /// flight to finish. `None` if nothing was armed or the task panicked.
    pub async fn disarm(&mut self) -> Option<SyncEngine> {
        let Armed { cancel, handle } = self.armed.take()?;
        cancel.cancel();
        match handle.await {
            Ok(engine) => {
                debug!("sync scheduler disarmed");
                Some(engine)
            }
            Err(e) => {
                error!(error = %e, "sync task did not shut down cleanly");
                None
            }
        }
    }

    /// Cancel the current timer and start a fresh one on the same engine.
    pub async fn rearm(&mut self, mode: StartMode) -> bool {
        match self.disarm().await {
            Some(engine) => {
                self.arm(engine, mode).await;
                true
            }
            None => false,
        }
    }
}

async fn sync_task(mut engine: SyncEngine, mode: StartMode, cancel: CancellationToken) -> SyncEngine {
    let period = engine.config().sync_interval;

    if mode == StartMode::Created {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return engine,
            () = tokio::time::sleep(period) => {}
        }
    }

    loop {
        // A started pass runs to completion; only the wait is cancellable.
        let _ = engine.run_tick().await;
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {}
        }
    }
    engine
}
