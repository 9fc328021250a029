use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::booking::BookingError;
use crate::domain::fields::MutableField;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Pilot,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Pilot => "pilot",
            Role::Admin => "admin",
        }
    }

    /// Field-level write permission.
    ///
    /// The match is on the field so that every new [`MutableField`] needs an
    /// explicit decision for each role.
    #[must_use]
    pub fn permits(self, field: MutableField) -> bool {
        use MutableField as F;
        match field {
            F::Status => true,
            F::Notes | F::PassengerDetails | F::SelectedAddons | F::AddonTotalPrice => {
                self == Role::Client
            }
            F::AdminNotes => matches!(self, Role::Pilot | Role::Admin),
            F::PilotId
            | F::HelicopterId
            | F::TotalPrice
            | F::PaymentStatus
            | F::FromLocation
            | F::ToLocation
            | F::ScheduledDate
            | F::ScheduledTime
            | F::IsRoundTrip
            | F::ReturnDate
            | F::ReturnTime
            | F::RevisionRequested
            | F::RevisionNotes
            | F::RevisionData => self == Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller of an operation, as resolved by the identity verifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// How an actor relates to a particular booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Owner,
    AssignedPilot,
    Administrator,
}

/// Resolves the actor's relationship to a booking from the stored owner and
/// pilot references.
///
/// # Errors
///
/// [`BookingError::Forbidden`] when the actor is neither the owning client,
/// the assigned pilot, nor an admin.
pub fn relationship(
    actor: &Actor,
    client_id: &str,
    pilot_id: Option<&str>,
) -> Result<Relationship, BookingError> {
    match actor.role {
        Role::Admin => Ok(Relationship::Administrator),
        Role::Client if actor.user_id == client_id => Ok(Relationship::Owner),
        Role::Pilot if pilot_id == Some(actor.user_id.as_str()) => {
            Ok(Relationship::AssignedPilot)
        }
        _ => Err(BookingError::Forbidden),
    }
}

/// Checks every proposed field against the actor's allow-list. A single
/// disallowed field rejects the whole request.
///
/// # Errors
///
/// [`BookingError::InvalidField`] naming the first disallowed field.
pub fn authorize_fields(
    actor: &Actor,
    fields: impl IntoIterator<Item = MutableField>,
) -> Result<(), BookingError> {
    for field in fields {
        if !actor.role.permits(field) {
            return Err(BookingError::InvalidField {
                field: field.wire_name().to_string(),
                role: actor.role,
            });
        }
    }
    Ok(())
}

/// Refund details are visible to the owning client and admins, not to pilots.
///
/// # Errors
///
/// [`BookingError::Forbidden`] for anyone else.
pub fn authorize_refund_read(
    actor: &Actor,
    client_id: &str,
    pilot_id: Option<&str>,
) -> Result<(), BookingError> {
    match relationship(actor, client_id, pilot_id)? {
        Relationship::Owner | Relationship::Administrator => Ok(()),
        Relationship::AssignedPilot => Err(BookingError::Forbidden),
    }
}
