use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        UserId         ---------------------------------------------------------
/// An opaque user identifier. Users are registered elsewhere; the ledger only ever sees their id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The externally assigned order number. It is the natural key of an order and is unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConversionError(format!("'{s}' is not a valid order number. Only digits are allowed.")));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      OrderStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// The order has been submitted, but the accrual service has not started working on it yet.
    New,
    /// The accrual service is calculating the reward for the order.
    Processing,
    /// The accrual has been calculated and credited to the owner's balance. Terminal.
    Processed,
    /// The accrual service rejected the order. No points are awarded. Terminal.
    Invalid,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Invalid)
    }

    /// Orders only ever move forward: `New -> Processing -> {Processed, Invalid}`. `New` may skip straight to a
    /// terminal status. Nothing leaves a terminal status.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!((self, next), (New, Processing | Processed | Invalid) | (Processing, Processed | Invalid))
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::Processing => write!(f, "PROCESSING"),
            OrderStatus::Processed => write!(f, "PROCESSED"),
            OrderStatus::Invalid => write!(f, "INVALID"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "PROCESSED" => Ok(Self::Processed),
            "INVALID" => Ok(Self::Invalid),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    #[sqlx(rename = "order_number")]
    pub number: OrderNumber,
    #[sqlx(rename = "order_status")]
    pub status: OrderStatus,
    #[serde(skip)]
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: UserId,
    pub uploaded_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: UserId) -> Self {
        Self { number, user_id, uploaded_at: Utc::now() }
    }
}

/// The only mutable fields of an order are its status and accrual. `user_id` is carried along so that the owner's
/// balance can be credited in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub accrual: Option<Points>,
}

impl OrderUpdate {
    /// The credit this update earns the order's owner, if any. Only `Processed` updates carry a credit.
    pub fn credit(&self) -> Option<Points> {
        match (self.status, self.accrual) {
            (OrderStatus::Processed, Some(amount)) => Some(amount),
            _ => None,
        }
    }
}

//--------------------------------------       Balance         ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct Balance {
    #[serde(skip)]
    pub user_id: UserId,
    #[sqlx(rename = "current_balance")]
    pub current: Points,
    pub withdrawn: Points,
}

impl Balance {
    pub fn empty(user_id: UserId) -> Self {
        Self { user_id, current: Points::zero(), withdrawn: Points::zero() }
    }
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    #[serde(rename = "order")]
    pub order_number: OrderNumber,
    #[serde(skip)]
    pub user_id: UserId,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub sum: Points,
}

impl NewWithdrawal {
    pub fn new(user_id: UserId, order_number: OrderNumber, sum: Points) -> Self {
        Self { order_number, user_id, sum }
    }
}
