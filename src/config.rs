use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use cqrs_es::Query;
use cqrs_es::persist::PersistedEventStore;
use postgres_es::{PostgresEventRepository, PostgresViewRepository};
use sqlx::{Pool, Postgres};
use thiserror::Error;

use crate::AuditLogQuery;
use crate::domain::booking::{Booking, BookingServices};
use crate::engine::{BookingEngine, DEFAULT_CONFLICT_RETRIES};
use crate::ledger_repository::TransactionLedger;
use crate::queries::{BookingQuery, BookingView};
use crate::services::catalog::PostgresCatalog;
use crate::services::clock::SystemClock;

pub type PostgresBookingEngine =
    BookingEngine<PersistedEventStore<PostgresEventRepository, Booking>>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub conflict_retries: u32,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing required keys or unparsable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_opt)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                reason: "expected a postgres:// url".to_string(),
            });
        }

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3030".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < 16 {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "must be at least 16 characters".to_string(),
            });
        }

        let conflict_retries = match lookup("CONFLICT_RETRIES") {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "CONFLICT_RETRIES",
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_CONFLICT_RETRIES,
        };

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            conflict_retries,
        })
    }
}

#[must_use]
pub fn booking_engine(
    pool: Pool<Postgres>,
    settings: &Settings,
) -> (
    Arc<PostgresBookingEngine>,
    Arc<PostgresViewRepository<BookingView, Booking>>,
    Arc<TransactionLedger>,
) {
    // Logs every committed event with the acting user.
    let audit_query = AuditLogQuery {};

    // Stores the latest booking document for reads.
    let booking_view_repo = Arc::new(PostgresViewRepository::new("booking_query", pool.clone()));
    let mut booking_query = BookingQuery::new(booking_view_repo.clone());
    booking_query.use_error_handler(Box::new(
        |e| tracing::error!(error = %e, "booking view update failed"),
    ));

    // Appends refunds to the transaction ledger.
    let ledger = Arc::new(TransactionLedger::new(pool.clone()));

    let queries: Vec<Box<dyn Query<Booking>>> = vec![
        Box::new(audit_query),
        Box::new(booking_query),
        Box::new((*ledger).clone()),
    ];
    let services = BookingServices::new(
        Arc::new(PostgresCatalog::new(pool.clone())),
        Arc::new(SystemClock),
    );
    let store = PersistedEventStore::new_event_store(PostgresEventRepository::new(pool));

    (
        Arc::new(
            BookingEngine::new(store, queries, services)
                .with_conflict_retries(settings.conflict_retries),
        ),
        booking_view_repo,
        ledger,
    )
}
