use loyalty_common::Points;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/user/balance/withdraw`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// The order the points are spent on. It must pass the Luhn check but need not be known to the ledger.
    pub order: String,
    pub sum: Points,
}
