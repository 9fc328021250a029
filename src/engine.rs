//! Command execution against the event store.
//!
//! The store's per-aggregate sequence number is the concurrency token: a
//! commit built on a stale load fails with `AggregateConflict`, and the command
//! is then re-evaluated from a fresh load. Guards therefore always run against
//! the state the events are appended to.

use std::collections::HashMap;

use cqrs_es::{Aggregate, AggregateContext, AggregateError, EventStore, Query};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::authorization::Actor;
use crate::domain::booking::{Booking, BookingError, BookingServices, PassengerDetail};
use crate::domain::commands::{BookingCommand, NewBooking};
use crate::domain::events::BookingEvent;
use crate::domain::fields::MutableField;
use crate::domain::pricing::{Addon, AddonSelection};
use crate::domain::refund::{RefundSummary, Transaction};

pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] BookingError),
    #[error("booking was changed by another request")]
    Conflict,
    #[error("event store unavailable: {0}")]
    Store(String),
}

impl From<AggregateError<BookingError>> for EngineError {
    fn from(err: AggregateError<BookingError>) -> Self {
        match err {
            AggregateError::UserError(err) => EngineError::Domain(err),
            AggregateError::AggregateConflict => EngineError::Conflict,
            other => EngineError::Store(other.to_string()),
        }
    }
}

/// The state of a booking after a command, with the events that produced it.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub booking: Booking,
    pub events: Vec<BookingEvent>,
}

impl Outcome {
    /// Fields whose stored value changed, in event order without repeats.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<MutableField> {
        let mut fields = Vec::new();
        let mut push = |field: MutableField| {
            if !fields.contains(&field) {
                fields.push(field);
            }
        };
        for event in &self.events {
            match event {
                BookingEvent::DetailsUpdated { changes, .. } => {
                    changes.iter().for_each(|c| push(c.field()));
                }
                BookingEvent::PassengerDetailsCompleted { .. } => {
                    push(MutableField::PassengerDetails);
                }
                BookingEvent::AddonsSelected { .. } => push(MutableField::SelectedAddons),
                BookingEvent::PriceRecomputed { .. } => {
                    push(MutableField::AddonTotalPrice);
                    push(MutableField::TotalPrice);
                }
                BookingEvent::StatusChanged { .. } => push(MutableField::Status),
                BookingEvent::Created { .. }
                | BookingEvent::RefundIssued { .. }
                | BookingEvent::Deleted { .. } => {}
            }
        }
        fields
    }
}

pub struct BookingEngine<ES>
where
    ES: EventStore<Booking>,
{
    store: ES,
    queries: Vec<Box<dyn Query<Booking>>>,
    services: BookingServices,
    conflict_retries: u32,
}

impl<ES> BookingEngine<ES>
where
    ES: EventStore<Booking>,
{
    pub fn new(
        store: ES,
        queries: Vec<Box<dyn Query<Booking>>>,
        services: BookingServices,
    ) -> Self {
        Self {
            store,
            queries,
            services,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    #[must_use]
    pub fn with_conflict_retries(mut self, conflict_retries: u32) -> Self {
        self.conflict_retries = conflict_retries;
        self
    }

    /// Creates a booking owned by the calling client.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-clients, `Validation` for bad schedules, routes or
    /// passenger counts, `NotFound` for unknown experiences.
    #[instrument(skip_all, fields(user = %actor.user_id))]
    pub async fn create_booking(
        &self,
        actor: &Actor,
        booking: NewBooking,
    ) -> Result<Booking, EngineError> {
        let id = Uuid::new_v4();
        let outcome = self
            .execute(
                id,
                BookingCommand::Create {
                    id,
                    actor: actor.clone(),
                    booking,
                },
            )
            .await?;
        info!(booking_id = %id, "booking created");
        Ok(outcome.booking)
    }

    /// # Errors
    ///
    /// `NotFound` for unknown or deleted bookings, `Forbidden` unless the actor
    /// owns, flies or administers the booking.
    pub async fn get_booking(&self, actor: &Actor, id: Uuid) -> Result<Booking, EngineError> {
        let booking = self.load(id).await?;
        booking.authorize_read(actor)?;
        Ok(booking)
    }

    /// Applies a partial update and reports which fields actually changed.
    ///
    /// # Errors
    ///
    /// Any disallowed field rejects the request whole with `InvalidField`.
    #[instrument(skip_all, fields(user = %actor.user_id, role = %actor.role, booking_id = %id))]
    pub async fn update_booking(
        &self,
        actor: &Actor,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<(Booking, Vec<MutableField>), EngineError> {
        let outcome = self
            .execute(
                id,
                BookingCommand::Update {
                    actor: actor.clone(),
                    fields,
                },
            )
            .await?;
        let changed = outcome.changed_fields();
        Ok((outcome.booking, changed))
    }

    /// Finalizes passengers and add-ons. The total is recomputed from the
    /// stored base price.
    ///
    /// # Errors
    ///
    /// `Forbidden` for anyone but the owning client, `Validation` when the
    /// passenger list does not match the passenger count.
    #[instrument(skip_all, fields(user = %actor.user_id, booking_id = %id))]
    pub async fn complete_passenger_details(
        &self,
        actor: &Actor,
        id: Uuid,
        passenger_details: Vec<PassengerDetail>,
        selected_addons: Vec<AddonSelection>,
    ) -> Result<Booking, EngineError> {
        let outcome = self
            .execute(
                id,
                BookingCommand::CompletePassengerDetails {
                    actor: actor.clone(),
                    passenger_details,
                    selected_addons,
                },
            )
            .await?;
        Ok(outcome.booking)
    }

    /// Soft cancel. Clients may only cancel pending bookings.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the lifecycle forbids the cancellation.
    #[instrument(skip_all, fields(user = %actor.user_id, role = %actor.role, booking_id = %id))]
    pub async fn cancel_booking(&self, actor: &Actor, id: Uuid) -> Result<Booking, EngineError> {
        let outcome = self
            .execute(
                id,
                BookingCommand::Cancel {
                    actor: actor.clone(),
                },
            )
            .await?;
        Ok(outcome.booking)
    }

    /// Hard delete, admins only. The booking is unreadable afterwards.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins.
    #[instrument(skip_all, fields(user = %actor.user_id, role = %actor.role, booking_id = %id))]
    pub async fn delete_booking(&self, actor: &Actor, id: Uuid) -> Result<(), EngineError> {
        self.execute(
            id,
            BookingCommand::Delete {
                actor: actor.clone(),
            },
        )
        .await?;
        info!(booking_id = %id, "booking deleted");
        Ok(())
    }

    /// Issues a refund and returns the updated refund summary with the
    /// ledger entry it appended.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, then `AlreadyRefunded`, `NotPaid`,
    /// `Validation` or `ExceedsBookingTotal` from the refund checks.
    #[instrument(skip_all, fields(user = %actor.user_id, booking_id = %id))]
    pub async fn issue_refund(
        &self,
        actor: &Actor,
        id: Uuid,
        amount: Option<Decimal>,
        reason: Option<String>,
        payment_method: String,
    ) -> Result<(RefundSummary, Transaction), EngineError> {
        let outcome = self
            .execute(
                id,
                BookingCommand::IssueRefund {
                    actor: actor.clone(),
                    transaction_id: Uuid::new_v4(),
                    amount,
                    reason,
                    payment_method,
                },
            )
            .await?;
        let transaction = outcome
            .events
            .iter()
            .find_map(|event| match event {
                BookingEvent::RefundIssued { transaction, .. } => Some(transaction.clone()),
                _ => None,
            })
            .ok_or_else(|| EngineError::Store("refund produced no ledger entry".to_string()))?;
        let summary = outcome.booking.refund_summary(actor)?;
        info!(
            booking_id = %id,
            amount = %transaction.amount,
            refund_status = ?summary.status,
            "refund issued"
        );
        Ok((summary, transaction))
    }

    /// # Errors
    ///
    /// `Forbidden` for pilots and for clients who do not own the booking.
    pub async fn refund_status(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<RefundSummary, EngineError> {
        let booking = self.load(id).await?;
        Ok(booking.refund_summary(actor)?)
    }

    /// The add-on catalog as it stands now.
    ///
    /// # Errors
    ///
    /// `CatalogUnavailable` when the catalog cannot be read.
    pub async fn list_addons(&self) -> Result<Vec<Addon>, EngineError> {
        Ok(self
            .services
            .catalog()
            .list_addons()
            .await
            .map_err(BookingError::from)?)
    }

    async fn load(&self, id: Uuid) -> Result<Booking, EngineError> {
        let context = self
            .store
            .load_aggregate(&id.to_string())
            .await
            .map_err(|err| store_failure(id, err))?;
        let booking = context.aggregate().clone();
        if !booking.is_live() {
            return Err(BookingError::NotFound("booking".to_string()).into());
        }
        Ok(booking)
    }

    /// Loads, handles, and commits. A commit that loses the race against a
    /// concurrent writer is retried from a fresh load; every other error is
    /// returned as-is.
    async fn execute(&self, id: Uuid, command: BookingCommand) -> Result<Outcome, EngineError> {
        let aggregate_id = id.to_string();
        let actor = command.actor();
        let metadata = HashMap::from([
            ("actor_id".to_string(), actor.user_id.clone()),
            ("role".to_string(), actor.role.to_string()),
            ("command".to_string(), command.name().to_string()),
        ]);

        let mut attempt = 0;
        loop {
            let context = self
                .store
                .load_aggregate(&aggregate_id)
                .await
                .map_err(|err| store_failure(id, err))?;
            let mut booking = context.aggregate().clone();
            let events = match booking.handle(command.clone(), &self.services).await {
                Ok(events) => events,
                Err(err) => {
                    debug!(booking_id = %id, command = command.name(), error = %err, "command rejected");
                    return Err(err.into());
                }
            };
            if events.is_empty() {
                return Ok(Outcome { booking, events });
            }
            for event in events.clone() {
                booking.apply(event);
            }

            match self
                .store
                .commit(events.clone(), context, metadata.clone())
                .await
            {
                Ok(committed) => {
                    for query in &self.queries {
                        query.dispatch(&aggregate_id, &committed).await;
                    }
                    return Ok(Outcome { booking, events });
                }
                Err(AggregateError::AggregateConflict) if attempt < self.conflict_retries => {
                    attempt += 1;
                    warn!(booking_id = %id, attempt, "concurrent modification, retrying");
                }
                Err(err) => return Err(store_failure(id, err)),
            }
        }
    }
}

fn store_failure(id: Uuid, err: AggregateError<BookingError>) -> EngineError {
    let err = EngineError::from(err);
    if let EngineError::Store(reason) = &err {
        error!(booking_id = %id, %reason, "event store failure");
    }
    err
}
