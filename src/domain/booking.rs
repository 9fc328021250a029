use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cqrs_es::Aggregate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::authorization::{self, Actor, Relationship, Role, authorize_refund_read};
use crate::domain::commands::{BookingCommand, NewBooking};
use crate::domain::events::BookingEvent;
use crate::domain::fields::{BookingPatch, FieldUpdate, MutableField};
use crate::domain::pricing::{
    AddonSelection, PriceBreakdown, SelectedAddon, addon_total, compute_total, freeze_selection,
    validate_amount,
};
use crate::domain::refund::{
    RefundState, RefundSummary, Transaction, TransactionType, plan_refund,
};
use crate::domain::status::{self, BookingStatus, TransitionReason};
use crate::services::catalog::{Catalog, CatalogError};
use crate::services::clock::Clock;

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    #[default]
    Transport,
    Experience,
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

/// Where the booking goes: a transport leg, an experience package, or a
/// destination.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteRef {
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub experience_id: Option<String>,
    pub destination_id: Option<String>,
}

impl RouteRef {
    fn validate(&self, booking_type: BookingType) -> Result<(), BookingError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        match booking_type {
            BookingType::Transport => {
                if !present(&self.from_location) || !present(&self.to_location) {
                    return Err(BookingError::Validation(
                        "transport bookings need a from and to location".to_string(),
                    ));
                }
                if self.experience_id.is_some() || self.destination_id.is_some() {
                    return Err(BookingError::Validation(
                        "transport bookings cannot reference an experience or destination"
                            .to_string(),
                    ));
                }
            }
            BookingType::Experience => {
                if present(&self.experience_id) == present(&self.destination_id) {
                    return Err(BookingError::Validation(
                        "experience bookings reference exactly one experience or destination"
                            .to_string(),
                    ));
                }
                if self.from_location.is_some() || self.to_location.is_some() {
                    return Err(BookingError::Validation(
                        "experience bookings cannot carry transport locations".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub is_round_trip: bool,
    pub return_date: Option<NaiveDate>,
    pub return_time: Option<String>,
}

impl Schedule {
    fn validate(&self, today: NaiveDate, check_past: bool) -> Result<(), BookingError> {
        if check_past && self.scheduled_date < today {
            return Err(BookingError::Validation(
                "scheduled date is in the past".to_string(),
            ));
        }
        parse_time(&self.scheduled_time)?;
        if let Some(return_time) = &self.return_time {
            parse_time(return_time)?;
        }
        if self.is_round_trip {
            let (Some(return_date), Some(_)) = (self.return_date, &self.return_time) else {
                return Err(BookingError::Validation(
                    "round trips need a return date and time".to_string(),
                ));
            };
            if return_date < self.scheduled_date {
                return Err(BookingError::Validation(
                    "return date precedes departure".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, BookingError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| BookingError::Validation(format!("`{raw}` is not a valid time")))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PassengerDetail {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, alias = "passport_number")]
    pub passport_number: Option<String>,
    #[serde(default, alias = "emergency_contact")]
    pub emergency_contact: Option<String>,
    #[serde(default, alias = "dietary_requirements")]
    pub dietary_requirements: Option<String>,
    #[serde(default, alias = "special_requests")]
    pub special_requests: Option<String>,
}

fn validate_passengers(details: &[PassengerDetail]) -> Result<(), BookingError> {
    if let Some(position) = details.iter().position(|p| p.name.trim().is_empty()) {
        return Err(BookingError::Validation(format!(
            "passenger {} has no name",
            position + 1
        )));
    }
    Ok(())
}

/// One accepted status change, kept for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub changed_by: String,
    pub reason: TransitionReason,
    pub at: DateTime<Utc>,
}

/// The booking record. Every field is written only by applying events, and
/// events are only produced by [`Booking::handle`] after the authorization
/// policy, the lifecycle guards and the pricing rules have passed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    id: Uuid,
    client_id: String,
    booking_type: BookingType,
    #[serde(flatten)]
    route: RouteRef,
    #[serde(flatten)]
    schedule: Schedule,
    passenger_count: u32,
    passenger_details: Vec<PassengerDetail>,
    details_completed_at: Option<DateTime<Utc>>,
    base_price: Decimal,
    selected_addons: Vec<SelectedAddon>,
    addon_total_price: Decimal,
    total_price: Decimal,
    status: BookingStatus,
    payment_status: PaymentStatus,
    refund: RefundState,
    pilot_id: Option<String>,
    helicopter_id: Option<String>,
    revision_requested: bool,
    revision_notes: Option<String>,
    revision_data: Option<Value>,
    admin_notes: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    transactions: Vec<Transaction>,
    status_history: Vec<StatusChange>,
    deleted: bool,
}

#[async_trait]
impl Aggregate for Booking {
    type Command = BookingCommand;
    type Event = BookingEvent;
    type Error = BookingError;
    type Services = BookingServices;

    fn aggregate_type() -> String {
        "Booking".to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        if let BookingCommand::Create { id, actor, booking } = command {
            return self.create(id, &actor, booking, services).await;
        }
        if !self.is_live() {
            return Err(BookingError::NotFound("booking".to_string()));
        }
        match command {
            BookingCommand::Create { .. } => Err(BookingError::AlreadyExists),
            BookingCommand::Update { actor, fields } => {
                self.update(&actor, fields, services).await
            }
            BookingCommand::CompletePassengerDetails {
                actor,
                passenger_details,
                selected_addons,
            } => {
                self.complete_passenger_details(
                    &actor,
                    passenger_details,
                    &selected_addons,
                    services,
                )
                .await
            }
            BookingCommand::Cancel { actor } => self.cancel(&actor, services),
            BookingCommand::Delete { actor } => {
                if !actor.is_admin() {
                    return Err(BookingError::Forbidden);
                }
                Ok(vec![BookingEvent::Deleted {
                    deleted_by: actor.user_id,
                    at: services.clock().now(),
                }])
            }
            BookingCommand::IssueRefund {
                actor,
                transaction_id,
                amount,
                reason,
                payment_method,
            } => self.issue_refund(
                &actor,
                transaction_id,
                amount,
                reason,
                payment_method,
                services,
            ),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            BookingEvent::Created {
                id,
                client_id,
                booking_type,
                route,
                schedule,
                passenger_count,
                notes,
                base_price,
                created_at,
            } => {
                self.id = id;
                self.client_id = client_id;
                self.booking_type = booking_type;
                self.route = route;
                self.schedule = schedule;
                self.passenger_count = passenger_count;
                self.notes = notes;
                self.base_price = base_price;
                self.addon_total_price = Decimal::ZERO;
                self.total_price = base_price;
                self.status = BookingStatus::Pending;
                self.payment_status = PaymentStatus::Pending;
                self.created_at = created_at;
            }
            BookingEvent::DetailsUpdated { changes, .. } => {
                for change in changes {
                    self.apply_field(change);
                }
            }
            BookingEvent::PassengerDetailsCompleted {
                passenger_details,
                completed_at,
            } => {
                self.passenger_details = passenger_details;
                self.details_completed_at = Some(completed_at);
            }
            BookingEvent::AddonsSelected { addons } => {
                self.selected_addons = addons;
            }
            BookingEvent::PriceRecomputed { price } => {
                self.base_price = price.base_price;
                self.addon_total_price = price.addon_total_price;
                self.total_price = price.total_price;
            }
            BookingEvent::StatusChanged {
                from,
                to,
                changed_by,
                reason,
                at,
                ..
            } => {
                self.status = to;
                self.status_history.push(StatusChange {
                    from,
                    to,
                    changed_by,
                    reason,
                    at,
                });
            }
            BookingEvent::RefundIssued {
                transaction,
                refund_status,
                cumulative_amount,
                reason,
                refunded_at,
            } => {
                self.refund.status = refund_status;
                self.refund.amount = cumulative_amount;
                self.refund.reason = reason;
                self.refund.date = Some(refunded_at);
                self.transactions.push(transaction);
            }
            BookingEvent::Deleted { .. } => {
                self.deleted = true;
            }
        }
    }
}

impl Booking {
    async fn create(
        &self,
        id: Uuid,
        actor: &Actor,
        request: NewBooking,
        services: &BookingServices,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        if self.exists() {
            return Err(BookingError::AlreadyExists);
        }
        if actor.role != Role::Client {
            return Err(BookingError::Forbidden);
        }
        if request.passenger_count < 1 {
            return Err(BookingError::Validation(
                "passenger count must be at least one".to_string(),
            ));
        }
        let passenger_count = u32::try_from(request.passenger_count)
            .map_err(|_| BookingError::Validation("passenger count is too large".to_string()))?;

        let route = RouteRef {
            from_location: request.from_location,
            to_location: request.to_location,
            experience_id: request.experience_id,
            destination_id: request.destination_id,
        };
        route.validate(request.booking_type)?;

        let schedule = Schedule {
            scheduled_date: request.scheduled_date,
            scheduled_time: request.scheduled_time,
            is_round_trip: request.is_round_trip,
            return_date: request.return_date,
            return_time: request.return_time,
        };
        let now = services.clock().now();
        schedule.validate(now.date_naive(), true)?;

        // Transport legs are priced by an administrator later.
        let base_price = match &route.experience_id {
            Some(experience_id) => services
                .catalog()
                .experience_price(experience_id)
                .await
                .map_err(BookingError::from)?
                .ok_or_else(|| BookingError::NotFound(format!("experience `{experience_id}`")))?,
            None => Decimal::ZERO,
        };

        Ok(vec![BookingEvent::Created {
            id,
            client_id: actor.user_id.clone(),
            booking_type: request.booking_type,
            route,
            schedule,
            passenger_count,
            notes: request.notes,
            base_price,
            created_at: now,
        }])
    }

    async fn update(
        &self,
        actor: &Actor,
        fields: Map<String, Value>,
        services: &BookingServices,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        authorization::relationship(actor, &self.client_id, self.pilot_id.as_deref())?;
        let patch = BookingPatch::from_wire(fields, actor)?;

        let changes: Vec<FieldUpdate> = patch
            .iter()
            .filter(|u| !u.field().affects_price() && u.field() != MutableField::Status)
            .filter(|u| self.differs(u))
            .cloned()
            .collect();

        // Validate the document as it would look after the plain writes.
        let mut preview = self.clone();
        for change in &changes {
            preview.apply_field(change.clone());
        }
        if patch.fields().any(|f| {
            f.is_schedule() || matches!(f, MutableField::FromLocation | MutableField::ToLocation)
        }) {
            preview.route.validate(preview.booking_type)?;
            preview.schedule.validate(
                services.clock().now().date_naive(),
                patch.contains(MutableField::ScheduledDate),
            )?;
        }
        if let Some(FieldUpdate::PassengerDetails(details)) =
            patch.get(MutableField::PassengerDetails)
        {
            self.ensure_open_for_price_changes()?;
            // Once finalized the list must keep covering every passenger.
            let expected = self.passenger_count as usize;
            let finalized = self.details_completed_at.is_some();
            if details.len() > expected || (finalized && details.len() != expected) {
                return Err(BookingError::Validation(format!(
                    "booking is for {} passengers, {} given",
                    self.passenger_count,
                    details.len()
                )));
            }
            validate_passengers(details)?;
        }
        if let Some(FieldUpdate::PilotId(Some(pilot))) = patch.get(MutableField::PilotId) {
            if pilot.trim().is_empty() {
                return Err(BookingError::Validation("pilot id is empty".to_string()));
            }
        }

        let mut events = Vec::new();
        let price_events = self.reprice(&patch, services).await?;

        let mut status_event = None;
        let target_status = match patch.get(MutableField::Status) {
            Some(FieldUpdate::Status(to)) => {
                let reason = status::evaluate(
                    actor.role,
                    self.status,
                    *to,
                    preview.pilot_id.is_some(),
                )?;
                if let Some(reason) = reason {
                    status_event = Some(self.status_changed(actor, *to, reason, services));
                }
                *to
            }
            _ => self.status,
        };
        if preview.pilot_id.is_none()
            && matches!(
                target_status,
                BookingStatus::Assigned | BookingStatus::Accepted
            )
        {
            return Err(BookingError::Validation(
                "an assigned or accepted booking must keep its pilot".to_string(),
            ));
        }

        if !changes.is_empty() {
            events.push(BookingEvent::DetailsUpdated {
                updated_by: actor.user_id.clone(),
                changes,
            });
        }
        events.extend(price_events);
        events.extend(status_event);
        Ok(events)
    }

    /// Handles the price-affecting fields of an update. The submitted
    /// `addonTotalPrice` is never read; only the stored base price and the
    /// frozen add-ons feed the calculator.
    async fn reprice(
        &self,
        patch: &BookingPatch,
        services: &BookingServices,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        if !patch.fields().any(MutableField::affects_price) {
            return Ok(Vec::new());
        }

        self.ensure_open_for_price_changes()?;
        let mut events = Vec::new();
        let mut addons = self.selected_addons.clone();
        if let Some(FieldUpdate::SelectedAddons(selections)) =
            patch.get(MutableField::SelectedAddons)
        {
            addons = self.freeze(selections, services).await?;
            if addons != self.selected_addons {
                events.push(BookingEvent::AddonsSelected {
                    addons: addons.clone(),
                });
            }
        }

        let mut base_price = self.base_price;
        if let Some(FieldUpdate::TotalPrice(total)) = patch.get(MutableField::TotalPrice) {
            validate_amount(*total, "total price")?;
            base_price = total
                .checked_sub(addon_total(&addons))
                .filter(|base| *base >= Decimal::ZERO)
                .ok_or_else(|| {
                    BookingError::Validation(
                        "total price is lower than the selected add-ons".to_string(),
                    )
                })?;
        }

        let price = compute_total(base_price, &addons);
        if price != self.price() {
            events.push(BookingEvent::PriceRecomputed { price });
        }
        Ok(events)
    }

    async fn complete_passenger_details(
        &self,
        actor: &Actor,
        passenger_details: Vec<PassengerDetail>,
        selections: &[AddonSelection],
        services: &BookingServices,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        let relationship =
            authorization::relationship(actor, &self.client_id, self.pilot_id.as_deref())?;
        if relationship != Relationship::Owner {
            return Err(BookingError::Forbidden);
        }
        self.ensure_open_for_price_changes()?;
        if passenger_details.len() != self.passenger_count as usize {
            return Err(BookingError::Validation(format!(
                "booking is for {} passengers, {} given",
                self.passenger_count,
                passenger_details.len()
            )));
        }
        validate_passengers(&passenger_details)?;

        let addons = self.freeze(selections, services).await?;
        let price = compute_total(self.base_price, &addons);

        let mut events = vec![BookingEvent::PassengerDetailsCompleted {
            passenger_details,
            completed_at: services.clock().now(),
        }];
        if addons != self.selected_addons {
            events.push(BookingEvent::AddonsSelected { addons });
        }
        events.push(BookingEvent::PriceRecomputed { price });
        Ok(events)
    }

    fn cancel(
        &self,
        actor: &Actor,
        services: &BookingServices,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        authorization::relationship(actor, &self.client_id, self.pilot_id.as_deref())?;
        let reason = status::evaluate(
            actor.role,
            self.status,
            BookingStatus::Cancelled,
            self.pilot_id.is_some(),
        )?;
        Ok(reason
            .map(|reason| self.status_changed(actor, BookingStatus::Cancelled, reason, services))
            .into_iter()
            .collect())
    }

    fn issue_refund(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        amount: Option<Decimal>,
        reason: Option<String>,
        payment_method: String,
        services: &BookingServices,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        if !actor.is_admin() {
            return Err(BookingError::Forbidden);
        }
        let plan = plan_refund(self.payment_status, &self.refund, self.total_price, amount)?;
        let now = services.clock().now();
        let payment_method = if payment_method.trim().is_empty() {
            "manual".to_string()
        } else {
            payment_method
        };

        let transaction = Transaction {
            id: transaction_id,
            user_id: self.client_id.clone(),
            booking_id: self.id,
            amount: plan.amount,
            transaction_type: TransactionType::Refund,
            payment_method,
            status: "completed".to_string(),
            reference: match &reason {
                Some(reason) => format!("Refund for booking {}: {reason}", self.id),
                None => format!("Refund for booking {}", self.id),
            },
            created_at: now,
        };

        let mut events = vec![BookingEvent::RefundIssued {
            transaction,
            refund_status: plan.status,
            cumulative_amount: plan.cumulative_amount,
            reason,
            refunded_at: now,
        }];
        if self.status != BookingStatus::Cancelled {
            events.push(self.status_changed(
                actor,
                BookingStatus::Cancelled,
                TransitionReason::RefundOverride,
                services,
            ));
        }
        Ok(events)
    }

    fn status_changed(
        &self,
        actor: &Actor,
        to: BookingStatus,
        reason: TransitionReason,
        services: &BookingServices,
    ) -> BookingEvent {
        BookingEvent::StatusChanged {
            from: self.status,
            to,
            changed_by: actor.user_id.clone(),
            role: actor.role,
            reason,
            at: services.clock().now(),
        }
    }

    async fn freeze(
        &self,
        selections: &[AddonSelection],
        services: &BookingServices,
    ) -> Result<Vec<SelectedAddon>, BookingError> {
        if selections.is_empty() {
            return Ok(Vec::new());
        }
        let catalog = services.catalog().list_addons().await?;
        freeze_selection(selections, &catalog)
    }

    /// Passengers and prices are fixed once a booking is terminal or has been
    /// refunded, which keeps refunds within the total they were issued against.
    fn ensure_open_for_price_changes(&self) -> Result<(), BookingError> {
        if self.status.is_terminal() || self.refund.amount > Decimal::ZERO {
            return Err(BookingError::Validation(format!(
                "a {} booking can no longer be changed",
                self.status
            )));
        }
        Ok(())
    }

    fn differs(&self, update: &FieldUpdate) -> bool {
        match update {
            FieldUpdate::Notes(v) => &self.notes != v,
            FieldUpdate::PassengerDetails(v) => &self.passenger_details != v,
            FieldUpdate::AdminNotes(v) => &self.admin_notes != v,
            FieldUpdate::PilotId(v) => &self.pilot_id != v,
            FieldUpdate::HelicopterId(v) => &self.helicopter_id != v,
            FieldUpdate::PaymentStatus(v) => &self.payment_status != v,
            FieldUpdate::FromLocation(v) => &self.route.from_location != v,
            FieldUpdate::ToLocation(v) => &self.route.to_location != v,
            FieldUpdate::ScheduledDate(v) => &self.schedule.scheduled_date != v,
            FieldUpdate::ScheduledTime(v) => &self.schedule.scheduled_time != v,
            FieldUpdate::IsRoundTrip(v) => &self.schedule.is_round_trip != v,
            FieldUpdate::ReturnDate(v) => &self.schedule.return_date != v,
            FieldUpdate::ReturnTime(v) => &self.schedule.return_time != v,
            FieldUpdate::RevisionRequested(v) => &self.revision_requested != v,
            FieldUpdate::RevisionNotes(v) => &self.revision_notes != v,
            FieldUpdate::RevisionData(v) => &self.revision_data != v,
            FieldUpdate::Status(_)
            | FieldUpdate::SelectedAddons(_)
            | FieldUpdate::AddonTotalPrice(_)
            | FieldUpdate::TotalPrice(_) => false,
        }
    }

    fn apply_field(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Notes(v) => self.notes = v,
            FieldUpdate::PassengerDetails(v) => self.passenger_details = v,
            FieldUpdate::AdminNotes(v) => self.admin_notes = v,
            FieldUpdate::PilotId(v) => self.pilot_id = v,
            FieldUpdate::HelicopterId(v) => self.helicopter_id = v,
            FieldUpdate::PaymentStatus(v) => self.payment_status = v,
            FieldUpdate::FromLocation(v) => self.route.from_location = v,
            FieldUpdate::ToLocation(v) => self.route.to_location = v,
            FieldUpdate::ScheduledDate(v) => self.schedule.scheduled_date = v,
            FieldUpdate::ScheduledTime(v) => self.schedule.scheduled_time = v,
            FieldUpdate::IsRoundTrip(v) => self.schedule.is_round_trip = v,
            FieldUpdate::ReturnDate(v) => self.schedule.return_date = v,
            FieldUpdate::ReturnTime(v) => self.schedule.return_time = v,
            FieldUpdate::RevisionRequested(v) => self.revision_requested = v,
            FieldUpdate::RevisionNotes(v) => self.revision_notes = v,
            FieldUpdate::RevisionData(v) => self.revision_data = v,
            // Carried by StatusChanged, AddonsSelected and PriceRecomputed.
            FieldUpdate::Status(_)
            | FieldUpdate::SelectedAddons(_)
            | FieldUpdate::AddonTotalPrice(_)
            | FieldUpdate::TotalPrice(_) => {}
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("booking already exists")]
    AlreadyExists,
    #[error("not permitted to act on this booking")]
    Forbidden,
    #[error("field `{field}` may not be written by a {role}")]
    InvalidField { field: String, role: Role },
    #[error("cannot move booking from {from} to {to}: {reason}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
        reason: &'static str,
    },
    #[error("invalid booking data: {0}")]
    Validation(String),
    #[error("booking has not been paid")]
    NotPaid,
    #[error("booking has already been fully refunded")]
    AlreadyRefunded,
    #[error(
        "refund of {requested} exceeds the booking total of {total} ({refunded} already refunded)"
    )]
    ExceedsBookingTotal {
        requested: Decimal,
        refunded: Decimal,
        total: Decimal,
    },
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl From<CatalogError> for BookingError {
    fn from(err: CatalogError) -> Self {
        BookingError::CatalogUnavailable(err.to_string())
    }
}

pub struct BookingServices {
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
}

impl BookingServices {
    pub fn new(catalog: Arc<dyn Catalog>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl Booking {
    /// Whether a `Created` event has been applied, deleted or not.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.id.is_nil()
    }

    /// Created and not hard-deleted.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.exists() && !self.deleted
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn booking_type(&self) -> BookingType {
        self.booking_type
    }

    #[must_use]
    pub fn route(&self) -> &RouteRef {
        &self.route
    }

    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    #[must_use]
    pub fn passenger_count(&self) -> u32 {
        self.passenger_count
    }

    #[must_use]
    pub fn passenger_details(&self) -> &[PassengerDetail] {
        &self.passenger_details
    }

    #[must_use]
    pub fn selected_addons(&self) -> &[SelectedAddon] {
        &self.selected_addons
    }

    #[must_use]
    pub fn price(&self) -> PriceBreakdown {
        PriceBreakdown {
            base_price: self.base_price,
            addon_total_price: self.addon_total_price,
            total_price: self.total_price,
        }
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    #[must_use]
    pub fn status(&self) -> BookingStatus {
        self.status
    }

    #[must_use]
    pub fn status_history(&self) -> &[StatusChange] {
        &self.status_history
    }

    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    #[must_use]
    pub fn refund(&self) -> &RefundState {
        &self.refund
    }

    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[must_use]
    pub fn pilot_id(&self) -> Option<&str> {
        self.pilot_id.as_deref()
    }

    #[must_use]
    pub fn helicopter_id(&self) -> Option<&str> {
        self.helicopter_id.as_deref()
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    #[must_use]
    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    #[must_use]
    pub fn revision_requested(&self) -> bool {
        self.revision_requested
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// # Errors
    ///
    /// `Forbidden` unless the actor owns the booking, flies it, or is an admin.
    pub fn authorize_read(&self, actor: &Actor) -> Result<(), BookingError> {
        authorization::relationship(actor, &self.client_id, self.pilot_id.as_deref()).map(|_| ())
    }

    /// # Errors
    ///
    /// `Forbidden` unless the actor owns the booking or is an admin.
    pub fn refund_summary(&self, actor: &Actor) -> Result<RefundSummary, BookingError> {
        authorize_refund_read(actor, &self.client_id, self.pilot_id.as_deref())?;
        Ok(RefundSummary::new(self.id, &self.refund, self.total_price))
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::too_many_lines)]
    use chrono::TimeZone;
    use cqrs_es::test::TestFramework;
    use serde_json::json;

    use super::*;
    use crate::domain::pricing::Addon;
    use crate::services::catalog::StaticCatalog;
    use crate::services::clock::FixedClock;

    type BookingTester = TestFramework<Booking>;

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    pub(super) fn tomorrow() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    pub(super) fn services() -> BookingServices {
        let catalog = StaticCatalog::new(vec![
            Addon {
                id: "champagne".to_string(),
                name: "Champagne toast".to_string(),
                unit_price: Decimal::from(75),
                category: "food".to_string(),
            },
            Addon {
                id: "photos".to_string(),
                name: "Aerial photos".to_string(),
                unit_price: Decimal::from(40),
                category: "media".to_string(),
            },
        ])
        .with_experience("sunset-tour", Decimal::from(450));
        BookingServices::new(Arc::new(catalog), Arc::new(FixedClock(now())))
    }

    pub(super) fn client() -> Actor {
        Actor::new("client-1", Role::Client)
    }

    pub(super) fn pilot() -> Actor {
        Actor::new("pilot-1", Role::Pilot)
    }

    pub(super) fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    pub(super) fn transport_request() -> NewBooking {
        NewBooking {
            booking_type: BookingType::Transport,
            from_location: Some("Heliport A".to_string()),
            to_location: Some("Island Pad".to_string()),
            experience_id: None,
            destination_id: None,
            scheduled_date: tomorrow(),
            scheduled_time: "10:30".to_string(),
            is_round_trip: false,
            return_date: None,
            return_time: None,
            passenger_count: 2,
            notes: None,
        }
    }

    pub(super) fn created(id: Uuid, base_price: Decimal) -> BookingEvent {
        BookingEvent::Created {
            id,
            client_id: "client-1".to_string(),
            booking_type: BookingType::Transport,
            route: RouteRef {
                from_location: Some("Heliport A".to_string()),
                to_location: Some("Island Pad".to_string()),
                experience_id: None,
                destination_id: None,
            },
            schedule: Schedule {
                scheduled_date: tomorrow(),
                scheduled_time: "10:30".to_string(),
                is_round_trip: false,
                return_date: None,
                return_time: None,
            },
            passenger_count: 2,
            notes: None,
            base_price,
            created_at: now(),
        }
    }

    pub(super) fn status_changed(
        from: BookingStatus,
        to: BookingStatus,
        actor: &Actor,
        reason: TransitionReason,
    ) -> BookingEvent {
        BookingEvent::StatusChanged {
            from,
            to,
            changed_by: actor.user_id.clone(),
            role: actor.role,
            reason,
            at: now(),
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_a_transport_booking() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Create {
                id,
                actor: client(),
                booking: transport_request(),
            })
            .then_expect_events(vec![created(id, Decimal::ZERO)]);
    }

    #[test]
    fn create_an_experience_booking_takes_the_catalog_price() {
        let id = Uuid::new_v4();
        let mut request = transport_request();
        request.booking_type = BookingType::Experience;
        request.from_location = None;
        request.to_location = None;
        request.experience_id = Some("sunset-tour".to_string());

        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Create {
                id,
                actor: client(),
                booking: request,
            })
            .then_expect_events(vec![BookingEvent::Created {
                id,
                client_id: "client-1".to_string(),
                booking_type: BookingType::Experience,
                route: RouteRef {
                    from_location: None,
                    to_location: None,
                    experience_id: Some("sunset-tour".to_string()),
                    destination_id: None,
                },
                schedule: Schedule {
                    scheduled_date: tomorrow(),
                    scheduled_time: "10:30".to_string(),
                    is_round_trip: false,
                    return_date: None,
                    return_time: None,
                },
                passenger_count: 2,
                notes: None,
                base_price: Decimal::from(450),
                created_at: now(),
            }]);
    }

    #[test]
    fn create_in_the_past() {
        let mut request = transport_request();
        request.scheduled_date = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();

        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Create {
                id: Uuid::new_v4(),
                actor: client(),
                booking: request,
            })
            .then_expect_error(BookingError::Validation(
                "scheduled date is in the past".to_string(),
            ));
    }

    #[test]
    fn create_round_trip_returning_before_departure() {
        let mut request = transport_request();
        request.is_round_trip = true;
        request.return_date = Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        request.return_time = Some("18:00".to_string());

        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Create {
                id: Uuid::new_v4(),
                actor: client(),
                booking: request,
            })
            .then_expect_error(BookingError::Validation(
                "return date precedes departure".to_string(),
            ));
    }

    #[test]
    fn create_round_trip_without_return() {
        let mut request = transport_request();
        request.is_round_trip = true;

        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Create {
                id: Uuid::new_v4(),
                actor: client(),
                booking: request,
            })
            .then_expect_error(BookingError::Validation(
                "round trips need a return date and time".to_string(),
            ));
    }

    #[test]
    fn create_without_passengers() {
        let mut request = transport_request();
        request.passenger_count = 0;

        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Create {
                id: Uuid::new_v4(),
                actor: client(),
                booking: request,
            })
            .then_expect_error(BookingError::Validation(
                "passenger count must be at least one".to_string(),
            ));
    }

    #[test]
    fn only_clients_create_bookings() {
        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Create {
                id: Uuid::new_v4(),
                actor: pilot(),
                booking: transport_request(),
            })
            .then_expect_error(BookingError::Forbidden);
    }

    #[test]
    fn create_twice() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Create {
                id,
                actor: client(),
                booking: transport_request(),
            })
            .then_expect_error(BookingError::AlreadyExists);
    }

    #[test]
    fn update_missing_booking() {
        BookingTester::with(services())
            .given_no_previous_events()
            .when(BookingCommand::Update {
                actor: client(),
                fields: fields(json!({ "notes": "window seat" })),
            })
            .then_expect_error(BookingError::NotFound("booking".to_string()));
    }

    #[test]
    fn client_updates_notes() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: client(),
                fields: fields(json!({ "notes": "window seat" })),
            })
            .then_expect_events(vec![BookingEvent::DetailsUpdated {
                updated_by: "client-1".to_string(),
                changes: vec![FieldUpdate::Notes(Some("window seat".to_string()))],
            }]);
    }

    #[test]
    fn unchanged_values_produce_no_events() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![
                created(id, Decimal::ZERO),
                BookingEvent::DetailsUpdated {
                    updated_by: "client-1".to_string(),
                    changes: vec![FieldUpdate::Notes(Some("window seat".to_string()))],
                },
            ])
            .when(BookingCommand::Update {
                actor: client(),
                fields: fields(json!({ "notes": "window seat" })),
            })
            .then_expect_events(vec![]);
    }

    #[test]
    fn stranger_cannot_update() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: Actor::new("client-2", Role::Client),
                fields: fields(json!({ "notes": "mine now" })),
            })
            .then_expect_error(BookingError::Forbidden);
    }

    #[test]
    fn mixed_valid_and_invalid_fields_are_rejected_whole() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: client(),
                fields: fields(json!({ "notes": "hello", "total_price": 1 })),
            })
            .then_expect_error(BookingError::InvalidField {
                field: "totalPrice".to_string(),
                role: Role::Client,
            });
    }

    #[test]
    fn client_cannot_write_immutable_fields() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: client(),
                fields: fields(json!({ "bookingType": "experience" })),
            })
            .then_expect_error(BookingError::InvalidField {
                field: "bookingType".to_string(),
                role: Role::Client,
            });
    }

    #[test]
    fn unassigned_pilot_cannot_update() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: pilot(),
                fields: fields(json!({ "adminNotes": "weather looks fine" })),
            })
            .then_expect_error(BookingError::Forbidden);
    }

    #[test]
    fn admin_assigns_pilot_and_status_together() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "pilotId": "pilot-1", "status": "assigned" })),
            })
            .then_expect_events(vec![
                BookingEvent::DetailsUpdated {
                    updated_by: "admin-1".to_string(),
                    changes: vec![FieldUpdate::PilotId(Some("pilot-1".to_string()))],
                },
                status_changed(
                    BookingStatus::Pending,
                    BookingStatus::Assigned,
                    &admin(),
                    TransitionReason::Standard,
                ),
            ]);
    }

    #[test]
    fn admin_assigns_without_pilot() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "status": "assigned" })),
            })
            .then_expect_error(BookingError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Assigned,
                reason: "a pilot must be assigned first",
            });
    }

    #[test]
    fn admin_sets_the_price() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "totalPrice": 500 })),
            })
            .then_expect_events(vec![BookingEvent::PriceRecomputed {
                price: PriceBreakdown {
                    base_price: Decimal::from(500),
                    addon_total_price: Decimal::ZERO,
                    total_price: Decimal::from(500),
                },
            }]);
    }

    #[test]
    fn admin_price_keeps_frozen_addons() {
        let id = Uuid::new_v4();
        let champagne = SelectedAddon {
            addon_id: "champagne".to_string(),
            name: "Champagne toast".to_string(),
            quantity: 1,
            unit_price: Decimal::from(75),
        };

        BookingTester::with(services())
            .given(vec![
                created(id, Decimal::from(400)),
                BookingEvent::AddonsSelected {
                    addons: vec![champagne],
                },
                BookingEvent::PriceRecomputed {
                    price: PriceBreakdown {
                        base_price: Decimal::from(400),
                        addon_total_price: Decimal::from(75),
                        total_price: Decimal::from(475),
                    },
                },
            ])
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "totalPrice": 575 })),
            })
            .then_expect_events(vec![BookingEvent::PriceRecomputed {
                price: PriceBreakdown {
                    base_price: Decimal::from(500),
                    addon_total_price: Decimal::from(75),
                    total_price: Decimal::from(575),
                },
            }]);
    }

    fn with_champagne(id: Uuid) -> Vec<BookingEvent> {
        vec![
            created(id, Decimal::from(400)),
            BookingEvent::AddonsSelected {
                addons: vec![SelectedAddon {
                    addon_id: "champagne".to_string(),
                    name: "Champagne toast".to_string(),
                    quantity: 1,
                    unit_price: Decimal::from(75),
                }],
            },
            BookingEvent::PriceRecomputed {
                price: PriceBreakdown {
                    base_price: Decimal::from(400),
                    addon_total_price: Decimal::from(75),
                    total_price: Decimal::from(475),
                },
            },
        ]
    }

    #[test]
    fn admin_price_far_below_zero_is_rejected() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(with_champagne(id))
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "totalPrice": Decimal::MIN.to_string() })),
            })
            .then_expect_error(BookingError::Validation(
                "total price is out of range".to_string(),
            ));
    }

    #[test]
    fn admin_price_below_the_addons_is_rejected() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(with_champagne(id))
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "totalPrice": 50 })),
            })
            .then_expect_error(BookingError::Validation(
                "total price is lower than the selected add-ons".to_string(),
            ));
    }

    #[test]
    fn admin_price_with_fractional_cents_is_rejected() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(with_champagne(id))
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "totalPrice": "500.005" })),
            })
            .then_expect_error(BookingError::Validation(
                "total price has more than two decimal places".to_string(),
            ));
    }

    #[test]
    fn admin_reschedules_into_the_past() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "scheduledDate": "2026-02-01" })),
            })
            .then_expect_error(BookingError::Validation(
                "scheduled date is in the past".to_string(),
            ));
    }

    #[test]
    fn client_selects_addons_and_submitted_total_is_ignored() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::from(450))])
            .when(BookingCommand::Update {
                actor: client(),
                fields: fields(json!({
                    "selectedAddons": [{ "addonId": "photos", "quantity": 2 }],
                    "addonTotalPrice": 1
                })),
            })
            .then_expect_events(vec![
                BookingEvent::AddonsSelected {
                    addons: vec![SelectedAddon {
                        addon_id: "photos".to_string(),
                        name: "Aerial photos".to_string(),
                        quantity: 2,
                        unit_price: Decimal::from(40),
                    }],
                },
                BookingEvent::PriceRecomputed {
                    price: PriceBreakdown {
                        base_price: Decimal::from(450),
                        addon_total_price: Decimal::from(80),
                        total_price: Decimal::from(530),
                    },
                },
            ]);
    }

    #[test]
    fn client_selects_negative_quantity() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::from(450))])
            .when(BookingCommand::Update {
                actor: client(),
                fields: fields(json!({
                    "selected_addons": [{ "addon_id": "photos", "quantity": -2 }]
                })),
            })
            .then_expect_error(BookingError::Validation(
                "add-on `photos` has a negative quantity".to_string(),
            ));
    }

    #[test]
    fn pilot_cannot_accept_unassigned_booking_even_if_named_later() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![
                created(id, Decimal::ZERO),
                BookingEvent::DetailsUpdated {
                    updated_by: "admin-1".to_string(),
                    changes: vec![FieldUpdate::PilotId(Some("pilot-1".to_string()))],
                },
            ])
            .when(BookingCommand::Update {
                actor: pilot(),
                fields: fields(json!({ "status": "accepted" })),
            })
            .then_expect_error(BookingError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Accepted,
                reason: "not a valid lifecycle step",
            });
    }

    #[test]
    fn admin_cannot_unassign_pilot_from_assigned_booking() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![
                created(id, Decimal::ZERO),
                BookingEvent::DetailsUpdated {
                    updated_by: "admin-1".to_string(),
                    changes: vec![FieldUpdate::PilotId(Some("pilot-1".to_string()))],
                },
                status_changed(
                    BookingStatus::Pending,
                    BookingStatus::Assigned,
                    &admin(),
                    TransitionReason::Standard,
                ),
            ])
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "pilotId": null })),
            })
            .then_expect_error(BookingError::Validation(
                "an assigned or accepted booking must keep its pilot".to_string(),
            ));
    }

    #[test]
    fn client_cancels_pending_booking() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Cancel { actor: client() })
            .then_expect_events(vec![status_changed(
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                &client(),
                TransitionReason::Standard,
            )]);
    }

    #[test]
    fn cancelling_a_cancelled_booking_is_a_no_op() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![
                created(id, Decimal::ZERO),
                status_changed(
                    BookingStatus::Pending,
                    BookingStatus::Cancelled,
                    &client(),
                    TransitionReason::Standard,
                ),
            ])
            .when(BookingCommand::Cancel { actor: client() })
            .then_expect_events(vec![]);
    }

    #[test]
    fn only_admins_delete() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::ZERO)])
            .when(BookingCommand::Delete { actor: client() })
            .then_expect_error(BookingError::Forbidden);
    }

    #[test]
    fn admin_deletes_from_any_state() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![
                created(id, Decimal::ZERO),
                BookingEvent::DetailsUpdated {
                    updated_by: "admin-1".to_string(),
                    changes: vec![FieldUpdate::PilotId(Some("pilot-1".to_string()))],
                },
                status_changed(
                    BookingStatus::Pending,
                    BookingStatus::Assigned,
                    &admin(),
                    TransitionReason::Standard,
                ),
            ])
            .when(BookingCommand::Delete { actor: admin() })
            .then_expect_events(vec![BookingEvent::Deleted {
                deleted_by: "admin-1".to_string(),
                at: now(),
            }]);
    }

    #[test]
    fn deleted_bookings_are_gone() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![
                created(id, Decimal::ZERO),
                BookingEvent::Deleted {
                    deleted_by: "admin-1".to_string(),
                    at: now(),
                },
            ])
            .when(BookingCommand::Update {
                actor: admin(),
                fields: fields(json!({ "adminNotes": "restore?" })),
            })
            .then_expect_error(BookingError::NotFound("booking".to_string()));
    }

    #[test]
    fn only_admins_refund() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::from(500))])
            .when(BookingCommand::IssueRefund {
                actor: client(),
                transaction_id: Uuid::new_v4(),
                amount: None,
                reason: None,
                payment_method: "manual".to_string(),
            })
            .then_expect_error(BookingError::Forbidden);
    }

    #[test]
    fn refund_requires_payment() {
        let id = Uuid::new_v4();

        BookingTester::with(services())
            .given(vec![created(id, Decimal::from(500))])
            .when(BookingCommand::IssueRefund {
                actor: admin(),
                transaction_id: Uuid::new_v4(),
                amount: Some(Decimal::from(100)),
                reason: None,
                payment_method: "manual".to_string(),
            })
            .then_expect_error(BookingError::NotPaid);
    }
}
