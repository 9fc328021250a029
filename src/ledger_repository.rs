use async_trait::async_trait;
use cqrs_es::{EventEnvelope, Query};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};
use tracing::error;
use uuid::Uuid;

use crate::domain::booking::Booking;
use crate::domain::events::BookingEvent;
use crate::domain::refund::{Transaction, TransactionType};

/// Append-only projection of ledger entries into the `transactions` table.
/// Rows are only ever inserted; a replayed event hits the primary key and is
/// skipped.
#[derive(Clone)]
pub struct TransactionLedger {
    pool: Pool<Postgres>,
}

impl TransactionLedger {
    #[must_use]
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Ledger entries recorded against a booking, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row carries an
    /// unknown transaction type.
    pub async fn load_for_booking(&self, booking_id: &Uuid) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, booking_id, amount, transaction_type, payment_method,
                   status, reference, created_at
            FROM transactions
            WHERE booking_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let kind: String = row.get("transaction_type");
                Ok(Transaction {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    booking_id: row.get("booking_id"),
                    amount: row.get::<Decimal, _>("amount"),
                    transaction_type: parse_type(&kind)?,
                    payment_method: row.get("payment_method"),
                    status: row.get("status"),
                    reference: row.get("reference"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    async fn record(&self, transaction: &Transaction) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            INSERT INTO transactions (id, user_id, booking_id, amount, transaction_type,
                                      payment_method, status, reference, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(transaction.id)
        .bind(&transaction.user_id)
        .bind(transaction.booking_id)
        .bind(transaction.amount)
        .bind(transaction.transaction_type.as_str())
        .bind(&transaction.payment_method)
        .bind(&transaction.status)
        .bind(&transaction.reference)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_type(raw: &str) -> Result<TransactionType, sqlx::Error> {
    match raw {
        "payment" => Ok(TransactionType::Payment),
        "refund" => Ok(TransactionType::Refund),
        "deposit" => Ok(TransactionType::Deposit),
        "withdrawal" => Ok(TransactionType::Withdrawal),
        other => Err(sqlx::Error::Decode(
            format!("unknown transaction type `{other}`").into(),
        )),
    }
}

#[async_trait]
impl Query<Booking> for TransactionLedger {
    async fn dispatch(&self, booking_id: &str, events: &[EventEnvelope<Booking>]) {
        for event in events {
            if let BookingEvent::RefundIssued { transaction, .. } = &event.payload {
                if let Err(e) = self.record(transaction).await {
                    error!(booking_id, transaction_id = %transaction.id, error = %e, "ledger write failed");
                }
            }
        }
    }
}
