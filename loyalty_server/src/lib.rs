//! # Loyalty server
//! This crate hosts the HTTP front end of the loyalty ledger. It is responsible for:
//! * Authenticating users from the bearer token on every request.
//! * Accepting order numbers and withdrawal requests, and passing them on to the ledger engine.
//! * Reporting balances, orders and withdrawals.
//! * Running the settlement worker that polls the accrual service for pending orders, for as long as the server runs.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/user/orders`: Submit an order number.
//! * `GET /api/user/orders`: The user's orders, oldest first.
//! * `GET /api/user/balance`: The user's current balance and the total withdrawn.
//! * `POST /api/user/balance/withdraw`: Spend points against an order number.
//! * `GET /api/user/withdrawals`: The user's withdrawals, oldest first.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod routes;
pub mod server;
