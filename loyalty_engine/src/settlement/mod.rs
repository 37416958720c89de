//! # Order settlement
//!
//! Orders are submitted in status `NEW` and settled in the background. The [`SettlementReconciler`] periodically asks
//! an [`AccrualGateway`] about every pending order, and writes the answers to the ledger. When an order is reported as
//! `PROCESSED`, its accrual is credited to the owner's balance in the same transaction as the status change.
//!
//! The reconciler is started with [`start_settlement_worker`], which returns a [`ReconcilerHandle`] that the owner of
//! the service keeps for its lifetime and uses to stop the worker on shutdown.
mod config;
mod gateway;
mod reconciler;
mod worker;

pub use config::{ReconcilerConfig, SettlementMode};
pub use gateway::{AccrualGateway, AccrualResponse, AccrualStatus, AccrualUpdate};
pub use reconciler::{SettlementReconciler, TickReport};
pub use worker::{start_settlement_worker, ReconcilerHandle};
