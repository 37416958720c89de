use loyalty_common::Points;

use crate::db_types::{Order, OrderNumber, OrderStatus, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(Order),
    /// The same user submitted this order number before. Submitting it again is harmless.
    ExistsForThisUser(Order),
    /// The order number belongs to someone else.
    ExistsForOtherUser,
}

/// What happened when a single accrual result was written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The order moved to `Processed` and its owner was credited.
    Credited { number: OrderNumber, user_id: UserId, amount: Points },
    /// The order's status changed, with no credit attached.
    StatusUpdated { number: OrderNumber, status: OrderStatus },
    /// The order had already reached a terminal status. Nothing was written.
    AlreadySettled { number: OrderNumber },
}

impl SettlementOutcome {
    pub fn credited(&self) -> Option<Points> {
        match self {
            SettlementOutcome::Credited { amount, .. } => Some(*amount),
            _ => None,
        }
    }
}
