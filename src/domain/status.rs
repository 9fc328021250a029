use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::authorization::Role;
use crate::domain::booking::BookingError;

/// Lifecycle state of a booking.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Approved,
    Assigned,
    Accepted,
    Completed,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// States directly reachable from `self` through the lifecycle graph.
    #[must_use]
    pub fn successors(self) -> &'static [BookingStatus] {
        use BookingStatus::{Accepted, Approved, Assigned, Cancelled, Completed};
        match self {
            BookingStatus::Pending => &[Approved, Assigned, Cancelled],
            BookingStatus::Approved => &[Assigned, Cancelled],
            BookingStatus::Assigned => &[Accepted, Cancelled],
            BookingStatus::Accepted => &[Completed, Cancelled],
            BookingStatus::Completed | BookingStatus::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_move_to(self, next: BookingStatus) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a status change was accepted. Recorded on every `StatusChanged` event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// An edge of the lifecycle graph whose guard held for the actor.
    Standard,
    /// An administrator cancelling a booking that is still in flight.
    AdminOverride,
    /// Cancellation forced by an issued refund.
    RefundOverride,
}

/// Decides whether `role` may move a booking from `from` to `to`.
///
/// Ownership (client owns the booking, pilot is the assigned pilot) is checked
/// by the authorization policy before this runs. `pilot_assigned` reflects the
/// booking as it will be once the surrounding update is applied, so an admin
/// can set `pilotId` and `status = assigned` in one request.
///
/// Returns `Ok(None)` when the request re-asks for the terminal state the
/// booking is already in.
///
/// # Errors
///
/// Returns [`BookingError::InvalidTransition`] when the edge does not exist or
/// its guard fails.
pub fn evaluate(
    role: Role,
    from: BookingStatus,
    to: BookingStatus,
    pilot_assigned: bool,
) -> Result<Option<TransitionReason>, BookingError> {
    let reject = |reason: &'static str| BookingError::InvalidTransition { from, to, reason };

    if from == to {
        return if from.is_terminal() {
            Ok(None)
        } else {
            Err(reject("booking is already in this state"))
        };
    }
    if !from.can_move_to(to) {
        return Err(reject("not a valid lifecycle step"));
    }

    match (role, from, to) {
        (Role::Client, BookingStatus::Pending, BookingStatus::Cancelled) => {
            Ok(Some(TransitionReason::Standard))
        }
        (Role::Client, _, BookingStatus::Cancelled) => Err(reject(
            "clients may only cancel pending bookings; contact an administrator",
        )),
        (Role::Client, _, _) => Err(reject("clients may only cancel")),

        (Role::Pilot, BookingStatus::Assigned, BookingStatus::Accepted)
        | (Role::Pilot, BookingStatus::Accepted, BookingStatus::Completed) => {
            Ok(Some(TransitionReason::Standard))
        }
        (Role::Pilot, _, _) => Err(reject("pilots may only accept or complete their flights")),

        (Role::Admin, _, BookingStatus::Cancelled) => Ok(Some(TransitionReason::AdminOverride)),
        (Role::Admin, _, BookingStatus::Assigned) if !pilot_assigned => {
            Err(reject("a pilot must be assigned first"))
        }
        (Role::Admin, _, BookingStatus::Accepted) => {
            Err(reject("only the assigned pilot may accept"))
        }
        (Role::Admin, _, _) => Ok(Some(TransitionReason::Standard)),
    }
}
