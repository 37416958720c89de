use std::fmt::{Debug, Display};

use log::*;
use loyalty_common::Points;

use crate::{
    db::traits::{LedgerDatabase, SettlementOutcome},
    db_types::{Order, OrderUpdate},
    errors::LedgerError,
    settlement::{
        config::{ReconcilerConfig, SettlementMode},
        gateway::{AccrualGateway, AccrualResponse},
    },
};

/// A summary of one reconciliation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Pending orders the accrual service was asked about.
    pub polled: usize,
    /// Orders whose status changed.
    pub updated: usize,
    /// Orders that moved to `PROCESSED` and credited their owner.
    pub credited: usize,
    pub credited_total: Points,
    /// Orders with nothing new to report.
    pub skipped: usize,
    /// Orders whose update could not be written. They are retried next tick.
    pub failed: usize,
}

impl Display for TickReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} polled, {} updated, {} credited ({} points), {} unchanged, {} failed",
            self.polled, self.updated, self.credited, self.credited_total, self.skipped, self.failed
        )
    }
}

impl TickReport {
    fn tally(&mut self, outcome: &SettlementOutcome) {
        match outcome {
            SettlementOutcome::Credited { amount, .. } => {
                self.updated += 1;
                self.credited += 1;
                self.credited_total += *amount;
            },
            SettlementOutcome::StatusUpdated { .. } => self.updated += 1,
            SettlementOutcome::AlreadySettled { .. } => self.skipped += 1,
        }
    }
}

/// Drives pending orders to a terminal status and credits balances exactly once per accrual.
///
/// A tick runs in two phases:
/// 1. **Poll.** Every pending order is looked up with the accrual service, oldest first. The first gateway error ends
///    the tick before anything is written, so no order is ever changed on the strength of a failed call.
/// 2. **Apply.** The collected updates are written according to the configured [`SettlementMode`]. Either way, an
///    order's move to `PROCESSED` and the credit to its owner commit together.
///
/// Orders that are already terminal are never polled again, so rerunning a tick cannot credit anyone twice.
pub struct SettlementReconciler<B, G> {
    db: B,
    gateway: G,
    config: ReconcilerConfig,
}

impl<B: Debug, G> Debug for SettlementReconciler<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementReconciler ({:?}, {:?})", self.db, self.config)
    }
}

impl<B, G> SettlementReconciler<B, G>
where
    B: LedgerDatabase,
    G: AccrualGateway,
{
    pub fn new(db: B, gateway: G, config: ReconcilerConfig) -> Self {
        Self { db, gateway, config }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Runs a single reconciliation tick.
    ///
    /// Errors are returned only when the tick was abandoned as a whole: pending orders could not be listed, the accrual
    /// service failed, or (in batch mode) the batch could not be committed. Per-order write failures in per-order mode
    /// are counted in [`TickReport::failed`] instead.
    pub async fn run_tick(&self) -> Result<TickReport, LedgerError> {
        let pending = self.db.fetch_unprocessed_orders(self.config.batch_size).await?;
        if pending.is_empty() {
            trace!("🔄️ No orders are awaiting settlement");
            return Ok(TickReport::default());
        }
        let mut report = TickReport { polled: pending.len(), ..Default::default() };
        debug!("🔄️ Polling the accrual service for {} orders", pending.len());
        let updates = self.poll(&pending, &mut report).await?;
        if updates.is_empty() {
            return Ok(report);
        }
        match self.config.mode {
            SettlementMode::PerOrder => self.apply_per_order(updates, &mut report).await,
            SettlementMode::Batch => self.apply_batch(updates, &mut report).await?,
        }
        Ok(report)
    }

    async fn poll(&self, pending: &[Order], report: &mut TickReport) -> Result<Vec<OrderUpdate>, LedgerError> {
        let mut updates = Vec::with_capacity(pending.len());
        for order in pending {
            let response = self.gateway.fetch_accrual(&order.number).await.map_err(|e| {
                warn!("🔄️ Could not fetch the accrual for order {}. Abandoning this tick. {e}", order.number);
                e
            })?;
            let update = match response {
                AccrualResponse::NotRegistered => {
                    trace!("🔄️ Order {} is not registered with the accrual service yet", order.number);
                    report.skipped += 1;
                    continue;
                },
                AccrualResponse::Update(update) => update.into_order_update(order)?,
            };
            if update.status == order.status {
                report.skipped += 1;
                continue;
            }
            if !order.status.can_transition_to(update.status) {
                warn!(
                    "🔄️ The accrual service reports order {} as {}, but it is already {}. Ignoring.",
                    order.number, update.status, order.status
                );
                report.skipped += 1;
                continue;
            }
            updates.push(update);
        }
        Ok(updates)
    }

    async fn apply_per_order(&self, updates: Vec<OrderUpdate>, report: &mut TickReport) {
        for update in updates {
            let number = update.number.clone();
            match self.db.settle_order(update).await {
                Ok(outcome) => report.tally(&outcome),
                Err(e) => {
                    warn!("🔄️ Could not settle order {number}. It will be retried on the next tick. {e}");
                    report.failed += 1;
                },
            }
        }
    }

    async fn apply_batch(&self, updates: Vec<OrderUpdate>, report: &mut TickReport) -> Result<(), LedgerError> {
        let count = updates.len();
        let outcomes = self.db.settle_batch(updates).await.map_err(|e| {
            warn!("🔄️ Could not settle a batch of {count} orders. The batch was rolled back. {e}");
            e
        })?;
        outcomes.iter().for_each(|o| report.tally(o));
        Ok(())
    }
}
