//! HTTP client for the external accrual service.
//!
//! The accrual service answers `GET {base}/api/orders/{number}` with the current status of an order and, once the
//! order is processed, the number of points it earned. [`AccrualApi`] wraps that endpoint and implements
//! [`loyalty_engine::settlement::AccrualGateway`], so it can be handed straight to the settlement reconciler.
mod api;
mod config;
mod error;

pub use api::AccrualApi;
pub use config::AccrualConfig;
pub use error::AccrualApiError;
