use cqrs_es::persist::GenericQuery;
use cqrs_es::{Aggregate, EventEnvelope, View};
use postgres_es::PostgresViewRepository;
use serde::{Deserialize, Serialize};

use crate::domain::authorization::Actor;
use crate::domain::booking::{Booking, BookingError};

// Persisted after every commit by `GenericQuery` into `booking_query`, and
// loaded back to serve reads without replaying the event stream.
pub type BookingQuery =
    GenericQuery<PostgresViewRepository<BookingView, Booking>, BookingView, Booking>;

/// The booking document as clients see it. The view replays the same events
/// as the aggregate, so both always agree on every field.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    booking: Booking,
    version: usize,
}

impl View<Booking> for BookingView {
    fn update(&mut self, event: &EventEnvelope<Booking>) {
        self.booking.apply(event.payload.clone());
        self.version = event.sequence;
    }
}

impl BookingView {
    #[must_use]
    pub fn version(&self) -> usize {
        self.version
    }

    /// The booking, if it still exists and `actor` may read it.
    ///
    /// # Errors
    ///
    /// `NotFound` for deleted bookings, `Forbidden` for unrelated actors.
    pub fn readable_by(&self, actor: &Actor) -> Result<&Booking, BookingError> {
        if !self.booking.is_live() {
            return Err(BookingError::NotFound("booking".to_string()));
        }
        self.booking.authorize_read(actor)?;
        Ok(&self.booking)
    }
}
