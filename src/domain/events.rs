use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::authorization::Role;
use crate::domain::booking::{BookingType, PassengerDetail, RouteRef, Schedule};
use crate::domain::fields::FieldUpdate;
use crate::domain::pricing::{PriceBreakdown, SelectedAddon};
use crate::domain::refund::{RefundStatus, Transaction};
use crate::domain::status::{BookingStatus, TransitionReason};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BookingEvent {
    Created {
        id: Uuid,
        client_id: String,
        booking_type: BookingType,
        route: RouteRef,
        schedule: Schedule,
        passenger_count: u32,
        notes: Option<String>,
        base_price: Decimal,
        created_at: DateTime<Utc>,
    },
    /// Plain field writes. Status, add-ons and prices travel in their own
    /// events.
    DetailsUpdated {
        updated_by: String,
        changes: Vec<FieldUpdate>,
    },
    PassengerDetailsCompleted {
        passenger_details: Vec<PassengerDetail>,
        completed_at: DateTime<Utc>,
    },
    AddonsSelected {
        addons: Vec<SelectedAddon>,
    },
    PriceRecomputed {
        price: PriceBreakdown,
    },
    StatusChanged {
        from: BookingStatus,
        to: BookingStatus,
        changed_by: String,
        role: Role,
        reason: TransitionReason,
        at: DateTime<Utc>,
    },
    RefundIssued {
        transaction: Transaction,
        refund_status: RefundStatus,
        cumulative_amount: Decimal,
        reason: Option<String>,
        refunded_at: DateTime<Utc>,
    },
    Deleted {
        deleted_by: String,
        at: DateTime<Utc>,
    },
}

impl DomainEvent for BookingEvent {
    fn event_type(&self) -> String {
        let event_type: &str = match self {
            BookingEvent::Created { .. } => "BookingCreated",
            BookingEvent::DetailsUpdated { .. } => "BookingDetailsUpdated",
            BookingEvent::PassengerDetailsCompleted { .. } => "PassengerDetailsCompleted",
            BookingEvent::AddonsSelected { .. } => "AddonsSelected",
            BookingEvent::PriceRecomputed { .. } => "PriceRecomputed",
            BookingEvent::StatusChanged { .. } => "BookingStatusChanged",
            BookingEvent::RefundIssued { .. } => "RefundIssued",
            BookingEvent::Deleted { .. } => "BookingDeleted",
        };
        event_type.to_string()
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
