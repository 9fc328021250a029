use std::sync::Arc;

use postgres_es::PostgresViewRepository;
use sqlx::{Pool, Postgres};

use crate::auth::{IdentityVerifier, JwtVerifier};
use crate::config::{PostgresBookingEngine, Settings, booking_engine};
use crate::domain::booking::Booking;
use crate::ledger_repository::TransactionLedger;
use crate::queries::BookingView;

#[derive(Clone)]
pub struct ApplicationState {
    pub engine: Arc<PostgresBookingEngine>,
    pub booking_views: Arc<PostgresViewRepository<BookingView, Booking>>,
    pub ledger: Arc<TransactionLedger>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

#[must_use]
pub fn new_application_state(pool: Pool<Postgres>, settings: &Settings) -> ApplicationState {
    let (engine, booking_views, ledger) = booking_engine(pool, settings);
    ApplicationState {
        engine,
        booking_views,
        ledger,
        verifier: Arc::new(JwtVerifier::new(&settings.jwt_secret)),
    }
}
