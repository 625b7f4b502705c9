//! Payment outcomes and idempotency records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ordering::OrderStatus;
use crate::domain::shared::{IdempotencyKey, OrderId, Timestamp};

/// Outcome reported by the payment gateway for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// The charge went through.
    Success,
    /// The charge was declined or abandoned.
    Failed,
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The stored, replayable result of resolving one payment delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Terminal order status this delivery resolved to.
    pub status: OrderStatus,
}

impl PaymentReceipt {
    /// Receipt for a successful payment.
    #[must_use]
    pub const fn paid() -> Self {
        Self {
            status: OrderStatus::Paid,
        }
    }

    /// Receipt for a failed payment.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            status: OrderStatus::Cancelled,
        }
    }

    /// Receipt mirroring an order that is already terminal.
    ///
    /// Returns `None` for a pending order; a receipt always names a
    /// terminal status.
    #[must_use]
    pub const fn from_terminal(status: OrderStatus) -> Option<Self> {
        if status.is_terminal() {
            Some(Self { status })
        } else {
            None
        }
    }
}

/// One idempotency key's claim and, once resolved, its stored result.
///
/// Created on first delivery of a key; `response` is populated exactly once
/// in the same unit of work that produced it and never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    key: IdempotencyKey,
    order_id: OrderId,
    created_at: Timestamp,
    response: Option<PaymentReceipt>,
}

impl IdempotencyRecord {
    /// Create a pending claim for a key.
    #[must_use]
    pub fn claim(key: IdempotencyKey, order_id: OrderId, now: Timestamp) -> Self {
        Self {
            key,
            order_id,
            created_at: now,
            response: None,
        }
    }

    /// The deduplication key.
    #[must_use]
    pub fn key(&self) -> &IdempotencyKey {
        &self.key
    }

    /// The order this delivery targeted.
    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Claim time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// The stored result, if the claim has been resolved.
    #[must_use]
    pub const fn response(&self) -> Option<PaymentReceipt> {
        self.response
    }

    /// Store the result. Called exactly once per record.
    pub fn resolve(&mut self, receipt: PaymentReceipt) {
        self.response = Some(receipt);
    }
}
