use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::*;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, sleep, MissedTickBehavior},
};

use crate::{
    db::traits::LedgerDatabase,
    settlement::{gateway::AccrualGateway, reconciler::SettlementReconciler},
};

/// Owns a running settlement worker. Dropping the handle without calling [`ReconcilerHandle::shutdown`] also stops the
/// worker at the end of its current tick, since the shutdown channel closes.
pub struct ReconcilerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Asks the worker to stop. It finishes the tick it is on, if any, and schedules no more.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stops the worker and waits for it to finish.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.join.await {
            error!("🔄️ The settlement worker did not shut down cleanly. {e}");
        }
        info!("🔄️ Settlement worker stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Starts the settlement loop on the tokio runtime and returns a handle to it.
///
/// The first tick runs straight away. The loop runs under a supervisor: if a tick panics, the supervisor logs it,
/// waits for an exponentially growing delay, and starts the loop again. The delay goes back to its initial value once
/// a restarted loop completes a tick.
pub fn start_settlement_worker<B, G>(reconciler: SettlementReconciler<B, G>) -> ReconcilerHandle
where
    B: LedgerDatabase,
    G: AccrualGateway,
{
    let (shutdown, rx) = watch::channel(false);
    info!(
        "🔄️ Starting settlement worker. Interval: {:?}, batch size: {}, mode: {}",
        reconciler.config().interval,
        reconciler.config().batch_size,
        reconciler.config().mode
    );
    let join = tokio::spawn(supervise(Arc::new(reconciler), rx));
    ReconcilerHandle { shutdown, join }
}

async fn supervise<B, G>(reconciler: Arc<SettlementReconciler<B, G>>, mut shutdown: watch::Receiver<bool>)
where
    B: LedgerDatabase,
    G: AccrualGateway,
{
    let mut backoff = reconciler.config().initial_backoff;
    loop {
        let healthy = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_loop(Arc::clone(&reconciler), shutdown.clone(), Arc::clone(&healthy)));
        match task.await {
            Ok(()) => return,
            Err(e) if e.is_panic() => {
                if healthy.load(Ordering::SeqCst) {
                    backoff = reconciler.config().initial_backoff;
                }
                error!("🔄️ The settlement loop panicked. Restarting it in {backoff:?}.");
            },
            Err(e) => {
                error!("🔄️ The settlement loop was cancelled. {e}");
                return;
            },
        }
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                info!("🔄️ Shutdown requested while waiting to restart the settlement loop");
                return;
            },
            _ = sleep(backoff) => {},
        }
        backoff = reconciler.config().next_backoff(backoff);
    }
}

async fn run_loop<B, G>(
    reconciler: Arc<SettlementReconciler<B, G>>,
    mut shutdown: watch::Receiver<bool>,
    healthy: Arc<AtomicBool>,
) where
    B: LedgerDatabase,
    G: AccrualGateway,
{
    let mut ticker = interval(reconciler.config().interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => break,
            _ = ticker.tick() => {},
        }
        // A tick in progress always runs to completion. Shutdown is only checked between ticks.
        match reconciler.run_tick().await {
            Ok(report) => {
                healthy.store(true, Ordering::SeqCst);
                if report.polled > 0 {
                    info!("🔄️ Settlement tick complete: {report}");
                }
            },
            Err(e) => {
                warn!("🔄️ Settlement tick failed. It will be retried on the next tick. {e}");
                if let Some(delay) = e.retry_after() {
                    if !pause(delay, &mut shutdown).await {
                        break;
                    }
                    ticker.reset();
                }
            },
        }
    }
    debug!("🔄️ Settlement loop exiting");
}

/// Waits for `delay`. Returns `false` if shutdown was requested in the meantime.
async fn pause(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    info!("🔄️ The accrual service asked us to back off. Pausing settlement for {delay:?}.");
    tokio::select! {
        biased;
        _ = shutdown_requested(shutdown) => false,
        _ = sleep(delay) => true,
    }
}

/// Resolves once shutdown has been requested, or once the handle that could request it is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
