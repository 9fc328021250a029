use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::authorization::Actor;
use crate::domain::booking::{BookingType, PassengerDetail};
use crate::domain::pricing::AddonSelection;

#[derive(Debug, Clone, Deserialize)]
pub enum BookingCommand {
    Create {
        id: Uuid,
        actor: Actor,
        booking: NewBooking,
    },
    /// A raw field map; keys are resolved and authorized by the aggregate so
    /// that ownership is checked before field names.
    Update {
        actor: Actor,
        fields: Map<String, Value>,
    },
    CompletePassengerDetails {
        actor: Actor,
        passenger_details: Vec<PassengerDetail>,
        selected_addons: Vec<AddonSelection>,
    },
    Cancel {
        actor: Actor,
    },
    Delete {
        actor: Actor,
    },
    IssueRefund {
        actor: Actor,
        transaction_id: Uuid,
        amount: Option<Decimal>,
        reason: Option<String>,
        payment_method: String,
    },
}

impl BookingCommand {
    #[must_use]
    pub fn actor(&self) -> &Actor {
        match self {
            BookingCommand::Create { actor, .. }
            | BookingCommand::Update { actor, .. }
            | BookingCommand::CompletePassengerDetails { actor, .. }
            | BookingCommand::Cancel { actor }
            | BookingCommand::Delete { actor }
            | BookingCommand::IssueRefund { actor, .. } => actor,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            BookingCommand::Create { .. } => "create",
            BookingCommand::Update { .. } => "update",
            BookingCommand::CompletePassengerDetails { .. } => "complete_passenger_details",
            BookingCommand::Cancel { .. } => "cancel",
            BookingCommand::Delete { .. } => "delete",
            BookingCommand::IssueRefund { .. } => "issue_refund",
        }
    }
}

/// Request body for creating a booking. Accepts camelCase and snake_case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    #[serde(alias = "booking_type")]
    pub booking_type: BookingType,
    #[serde(default, alias = "from_location")]
    pub from_location: Option<String>,
    #[serde(default, alias = "to_location")]
    pub to_location: Option<String>,
    #[serde(default, alias = "experience_id")]
    pub experience_id: Option<String>,
    #[serde(default, alias = "destination_id")]
    pub destination_id: Option<String>,
    #[serde(alias = "scheduled_date")]
    pub scheduled_date: NaiveDate,
    #[serde(alias = "scheduled_time")]
    pub scheduled_time: String,
    #[serde(default, alias = "is_round_trip")]
    pub is_round_trip: bool,
    #[serde(default, alias = "return_date")]
    pub return_date: Option<NaiveDate>,
    #[serde(default, alias = "return_time")]
    pub return_time: Option<String>,
    #[serde(alias = "passenger_count")]
    pub passenger_count: i64,
    #[serde(default)]
    pub notes: Option<String>,
}
