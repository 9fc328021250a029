use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::booking::{BookingError, PaymentStatus};
use crate::domain::pricing::validate_amount;

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    #[default]
    None,
    PartialRefund,
    Refunded,
}

/// Cumulative refund bookkeeping carried by a booking.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefundState {
    pub status: RefundStatus,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Payment,
    Refund,
    Deposit,
    Withdrawal,
}

impl TransactionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Payment => "payment",
            TransactionType::Refund => "refund",
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

/// Append-only ledger record. Created by a refund, never changed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub payment_method: String,
    pub status: String,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

/// The outcome of validating a refund request against a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundPlan {
    pub amount: Decimal,
    pub cumulative_amount: Decimal,
    pub status: RefundStatus,
}

/// Validates a refund of `requested` (or everything still refundable when
/// `None`) against the booking's totals.
///
/// # Errors
///
/// `AlreadyRefunded` once the booking is fully refunded, `NotPaid` unless
/// payment was recorded, `Validation` for non-positive amounts or amounts the
/// ledger cannot store, and `ExceedsBookingTotal` when the cumulative refund
/// would pass the total.
pub fn plan_refund(
    payment_status: PaymentStatus,
    refund: &RefundState,
    total_price: Decimal,
    requested: Option<Decimal>,
) -> Result<RefundPlan, BookingError> {
    if refund.status == RefundStatus::Refunded {
        return Err(BookingError::AlreadyRefunded);
    }
    if payment_status != PaymentStatus::Paid {
        return Err(BookingError::NotPaid);
    }

    let remaining = total_price - refund.amount;
    let amount = requested.unwrap_or(remaining);
    if amount <= Decimal::ZERO {
        return Err(BookingError::Validation(
            "refund amount must be greater than zero".to_string(),
        ));
    }
    // Compared before adding so oversized requests cannot overflow.
    if amount > remaining {
        return Err(BookingError::ExceedsBookingTotal {
            requested: amount,
            refunded: refund.amount,
            total: total_price,
        });
    }
    validate_amount(amount, "refund amount")?;

    let cumulative_amount = refund.amount + amount;

    let status = if cumulative_amount >= total_price {
        RefundStatus::Refunded
    } else {
        RefundStatus::PartialRefund
    };
    Ok(RefundPlan {
        amount,
        cumulative_amount,
        status,
    })
}

/// Read model returned by refund operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefundSummary {
    pub booking_id: Uuid,
    pub status: RefundStatus,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub total_price: Decimal,
    pub remaining_amount: Decimal,
}

impl RefundSummary {
    #[must_use]
    pub fn new(booking_id: Uuid, refund: &RefundState, total_price: Decimal) -> Self {
        Self {
            booking_id,
            status: refund.status,
            amount: refund.amount,
            reason: refund.reason.clone(),
            date: refund.date,
            total_price,
            remaining_amount: total_price - refund.amount,
        }
    }
}
