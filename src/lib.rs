pub mod auth;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger_repository;
pub mod queries;
pub mod route_handler;
pub mod services;
pub mod state;

use async_trait::async_trait;
use cqrs_es::{Aggregate, DomainEvent, EventEnvelope, Query};
use tracing::info;

/// Writes one audit line per committed event. The acting user and role come
/// from the metadata the engine attaches to every commit.
pub struct AuditLogQuery {}

#[async_trait]
impl<A> Query<A> for AuditLogQuery
where
    A: Aggregate,
{
    async fn dispatch(&self, aggregate_id: &str, events: &[EventEnvelope<A>]) {
        for event in events {
            info!(
                target: "audit",
                aggregate_type = %A::aggregate_type(),
                aggregate_id,
                sequence = event.sequence,
                event_type = %event.payload.event_type(),
                actor_id = event.metadata.get("actor_id").map_or("", String::as_str),
                role = event.metadata.get("role").map_or("", String::as_str),
                "event committed"
            );
        }
    }
}
