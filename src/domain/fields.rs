//! Typed mapping between the wire representation of a booking update and the
//! domain fields it may touch.
//!
//! Clients historically send either `camelCase` or `snake_case` keys. Both are
//! resolved here, once, so the authorization allow-lists and the storage
//! mapping cannot drift apart.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::authorization::{Actor, authorize_fields};
use crate::domain::booking::{BookingError, PassengerDetail, PaymentStatus};
use crate::domain::pricing::AddonSelection;
use crate::domain::status::BookingStatus;

/// Every booking field that some role may write through an update request.
/// Identity, ownership, booking type and refund bookkeeping are absent on
/// purpose: no update request may write them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MutableField {
    Notes,
    Status,
    PassengerDetails,
    SelectedAddons,
    AddonTotalPrice,
    AdminNotes,
    PilotId,
    HelicopterId,
    TotalPrice,
    PaymentStatus,
    FromLocation,
    ToLocation,
    ScheduledDate,
    ScheduledTime,
    IsRoundTrip,
    ReturnDate,
    ReturnTime,
    RevisionRequested,
    RevisionNotes,
    RevisionData,
}

impl MutableField {
    pub const ALL: [MutableField; 20] = [
        MutableField::Notes,
        MutableField::Status,
        MutableField::PassengerDetails,
        MutableField::SelectedAddons,
        MutableField::AddonTotalPrice,
        MutableField::AdminNotes,
        MutableField::PilotId,
        MutableField::HelicopterId,
        MutableField::TotalPrice,
        MutableField::PaymentStatus,
        MutableField::FromLocation,
        MutableField::ToLocation,
        MutableField::ScheduledDate,
        MutableField::ScheduledTime,
        MutableField::IsRoundTrip,
        MutableField::ReturnDate,
        MutableField::ReturnTime,
        MutableField::RevisionRequested,
        MutableField::RevisionNotes,
        MutableField::RevisionData,
    ];

    /// `(camelCase, snake_case)` names.
    fn names(self) -> (&'static str, &'static str) {
        match self {
            MutableField::Notes => ("notes", "notes"),
            MutableField::Status => ("status", "status"),
            MutableField::PassengerDetails => ("passengerDetails", "passenger_details"),
            MutableField::SelectedAddons => ("selectedAddons", "selected_addons"),
            MutableField::AddonTotalPrice => ("addonTotalPrice", "addon_total_price"),
            MutableField::AdminNotes => ("adminNotes", "admin_notes"),
            MutableField::PilotId => ("pilotId", "pilot_id"),
            MutableField::HelicopterId => ("helicopterId", "helicopter_id"),
            MutableField::TotalPrice => ("totalPrice", "total_price"),
            MutableField::PaymentStatus => ("paymentStatus", "payment_status"),
            MutableField::FromLocation => ("fromLocation", "from_location"),
            MutableField::ToLocation => ("toLocation", "to_location"),
            MutableField::ScheduledDate => ("scheduledDate", "scheduled_date"),
            MutableField::ScheduledTime => ("scheduledTime", "scheduled_time"),
            MutableField::IsRoundTrip => ("isRoundTrip", "is_round_trip"),
            MutableField::ReturnDate => ("returnDate", "return_date"),
            MutableField::ReturnTime => ("returnTime", "return_time"),
            MutableField::RevisionRequested => ("revisionRequested", "revision_requested"),
            MutableField::RevisionNotes => ("revisionNotes", "revision_notes"),
            MutableField::RevisionData => ("revisionData", "revision_data"),
        }
    }

    #[must_use]
    pub fn wire_name(self) -> &'static str {
        self.names().0
    }

    #[must_use]
    pub fn storage_name(self) -> &'static str {
        self.names().1
    }

    #[must_use]
    pub fn from_wire(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.wire_name() == key || f.storage_name() == key)
    }

    /// Fields whose change alters the booking's price.
    #[must_use]
    pub fn affects_price(self) -> bool {
        matches!(
            self,
            MutableField::SelectedAddons | MutableField::AddonTotalPrice | MutableField::TotalPrice
        )
    }

    #[must_use]
    pub fn is_schedule(self) -> bool {
        matches!(
            self,
            MutableField::ScheduledDate
                | MutableField::ScheduledTime
                | MutableField::IsRoundTrip
                | MutableField::ReturnDate
                | MutableField::ReturnTime
        )
    }
}

/// A single typed write. The serde tag is the camelCase field name so that
/// decoding goes through the same table as [`MutableField::wire_name`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldUpdate {
    Notes(Option<String>),
    Status(BookingStatus),
    PassengerDetails(Vec<PassengerDetail>),
    SelectedAddons(Vec<AddonSelection>),
    /// Accepted from clients but never trusted; its presence only triggers a
    /// server-side recomputation.
    AddonTotalPrice(Option<Decimal>),
    AdminNotes(Option<String>),
    PilotId(Option<String>),
    HelicopterId(Option<String>),
    TotalPrice(Decimal),
    PaymentStatus(PaymentStatus),
    FromLocation(Option<String>),
    ToLocation(Option<String>),
    ScheduledDate(NaiveDate),
    ScheduledTime(String),
    IsRoundTrip(bool),
    ReturnDate(Option<NaiveDate>),
    ReturnTime(Option<String>),
    RevisionRequested(bool),
    RevisionNotes(Option<String>),
    RevisionData(Option<Value>),
}

impl FieldUpdate {
    #[must_use]
    pub fn field(&self) -> MutableField {
        match self {
            FieldUpdate::Notes(_) => MutableField::Notes,
            FieldUpdate::Status(_) => MutableField::Status,
            FieldUpdate::PassengerDetails(_) => MutableField::PassengerDetails,
            FieldUpdate::SelectedAddons(_) => MutableField::SelectedAddons,
            FieldUpdate::AddonTotalPrice(_) => MutableField::AddonTotalPrice,
            FieldUpdate::AdminNotes(_) => MutableField::AdminNotes,
            FieldUpdate::PilotId(_) => MutableField::PilotId,
            FieldUpdate::HelicopterId(_) => MutableField::HelicopterId,
            FieldUpdate::TotalPrice(_) => MutableField::TotalPrice,
            FieldUpdate::PaymentStatus(_) => MutableField::PaymentStatus,
            FieldUpdate::FromLocation(_) => MutableField::FromLocation,
            FieldUpdate::ToLocation(_) => MutableField::ToLocation,
            FieldUpdate::ScheduledDate(_) => MutableField::ScheduledDate,
            FieldUpdate::ScheduledTime(_) => MutableField::ScheduledTime,
            FieldUpdate::IsRoundTrip(_) => MutableField::IsRoundTrip,
            FieldUpdate::ReturnDate(_) => MutableField::ReturnDate,
            FieldUpdate::ReturnTime(_) => MutableField::ReturnTime,
            FieldUpdate::RevisionRequested(_) => MutableField::RevisionRequested,
            FieldUpdate::RevisionNotes(_) => MutableField::RevisionNotes,
            FieldUpdate::RevisionData(_) => MutableField::RevisionData,
        }
    }

    fn decode(field: MutableField, value: Value) -> Result<Self, BookingError> {
        serde_json::from_value(json!({ "field": field.wire_name(), "value": value })).map_err(
            |e| BookingError::Validation(format!("{}: {e}", field.wire_name())),
        )
    }
}

/// A resolved update request: at most one write per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    updates: Vec<FieldUpdate>,
}

impl BookingPatch {
    /// Resolves every key of a raw update body, checks the keys against the
    /// actor's allow-list, and only then decodes the values.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidField`] for keys that are unknown, name an
    /// immutable field, or are outside the actor's allow-list;
    /// [`BookingError::Validation`] for values of the wrong shape or a field
    /// given twice under both spellings.
    pub fn from_wire(body: Map<String, Value>, actor: &Actor) -> Result<Self, BookingError> {
        let mut resolved: Vec<(MutableField, Value)> = Vec::with_capacity(body.len());
        for (key, value) in body {
            let field = MutableField::from_wire(&key).ok_or_else(|| BookingError::InvalidField {
                field: key.clone(),
                role: actor.role,
            })?;
            if resolved.iter().any(|(f, _)| *f == field) {
                return Err(BookingError::Validation(format!(
                    "{} given more than once",
                    field.wire_name()
                )));
            }
            resolved.push((field, value));
        }
        authorize_fields(actor, resolved.iter().map(|(f, _)| *f))?;

        let updates = resolved
            .into_iter()
            .map(|(field, value)| FieldUpdate::decode(field, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { updates })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = MutableField> + '_ {
        self.updates.iter().map(FieldUpdate::field)
    }

    #[must_use]
    pub fn get(&self, field: MutableField) -> Option<&FieldUpdate> {
        self.updates.iter().find(|u| u.field() == field)
    }

    #[must_use]
    pub fn contains(&self, field: MutableField) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldUpdate> {
        self.updates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authorization::Role;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    #[test]
    fn every_field_has_unique_names() {
        for field in MutableField::ALL {
            assert_eq!(MutableField::from_wire(field.wire_name()), Some(field));
            assert_eq!(MutableField::from_wire(field.storage_name()), Some(field));
        }
    }

    #[test]
    fn wire_name_matches_serde_tag() {
        for field in MutableField::ALL {
            let tag = serde_json::to_value(field).unwrap();
            assert_eq!(tag, json!(field.wire_name()));
        }
    }

    #[test]
    fn accepts_both_spellings() {
        let patch = BookingPatch::from_wire(
            body(json!({ "admin_notes": "fuel stop", "pilotId": "pilot-7" })),
            &admin(),
        )
        .unwrap();
        assert_eq!(
            patch.get(MutableField::AdminNotes),
            Some(&FieldUpdate::AdminNotes(Some("fuel stop".to_string())))
        );
        assert_eq!(
            patch.get(MutableField::PilotId),
            Some(&FieldUpdate::PilotId(Some("pilot-7".to_string())))
        );
    }

    #[test]
    fn immutable_fields_are_rejected() {
        for key in ["clientId", "client_id", "bookingType", "refundAmount", "id"] {
            let err = BookingPatch::from_wire(body(json!({ key: "x" })), &admin()).unwrap_err();
            assert_eq!(
                err,
                BookingError::InvalidField {
                    field: key.to_string(),
                    role: Role::Admin,
                }
            );
        }
    }

    #[test]
    fn both_spellings_of_one_field_is_ambiguous() {
        let err = BookingPatch::from_wire(
            body(json!({ "adminNotes": "b", "admin_notes": "c" })),
            &admin(),
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn malformed_value_is_a_validation_error() {
        let pilot = Actor::new("pilot-1", Role::Pilot);
        let err = BookingPatch::from_wire(body(json!({ "status": "flying" })), &pilot).unwrap_err();
        assert!(matches!(err, BookingError::Validation(msg) if msg.starts_with("status")));
    }

    #[test]
    fn prices_decode_from_numbers() {
        let patch =
            BookingPatch::from_wire(body(json!({ "total_price": 450 })), &admin()).unwrap();
        assert_eq!(
            patch.get(MutableField::TotalPrice),
            Some(&FieldUpdate::TotalPrice(Decimal::from(450)))
        );
    }

    #[test]
    fn disallowed_fields_win_over_malformed_values() {
        let client = Actor::new("client-1", Role::Client);
        let err = BookingPatch::from_wire(body(json!({ "totalPrice": null })), &client)
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidField {
                field: "totalPrice".to_string(),
                role: Role::Client,
            }
        );
    }
}
