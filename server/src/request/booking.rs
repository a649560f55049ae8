use error_stack::Report;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use application::transfer::{
    CancelBookingDto, ConfirmBookingDto, CreateBookingDto, GetBookingDto, SearchBookingDto,
    UpdateBookingDto,
};
use kernel::prelude::entity::{BookingStatus, PaymentStatus, SelectLimit, SelectOffset};
use kernel::prelude::search::{BookingFilter, BookingOrdering};
use kernel::prelude::validation::REQUIRED;
use kernel::{KernelError, ValidationErrors};

use crate::controller::{Intake, TryIntake};
use crate::principal::Principal;

const INVALID_DATETIME: &str = "Datetime has wrong format. Use RFC 3339, e.g. 2030-01-31T10:00:00Z.";

#[derive(Debug, Default, Deserialize)]
pub struct ListBookingsRequest {
    status: Option<String>,
    payment_status: Option<String>,
    search: Option<String>,
    ordering: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Listing plus a `YYYY-MM-DD` window.
#[derive(Debug, Default, Deserialize)]
pub struct SearchBookingsRequest {
    status: Option<String>,
    payment_status: Option<String>,
    search: Option<String>,
    from: Option<String>,
    to: Option<String>,
    ordering: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingRequest {
    vehicle_id: Option<Uuid>,
    start_date: Option<String>,
    end_date: Option<String>,
    pickup_location: Option<String>,
    return_location: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookingRequest {
    start_date: Option<String>,
    end_date: Option<String>,
    pickup_location: Option<String>,
    return_location: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBookingRequest {
    cancellation_reason: Option<String>,
}

#[derive(Debug)]
pub struct GetBookingRequest {
    id: Uuid,
}

impl GetBookingRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

#[derive(Debug)]
pub struct ConfirmBookingRequest {
    id: Uuid,
}

impl ConfirmBookingRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

fn parse_instant(
    field: &str,
    raw: Option<String>,
    errors: &mut ValidationErrors,
) -> Option<OffsetDateTime> {
    let raw = raw?;
    match OffsetDateTime::parse(raw.trim(), &Rfc3339) {
        Ok(instant) => Some(instant),
        Err(_) => {
            errors.push(field, INVALID_DATETIME);
            None
        }
    }
}

fn parse_choice<T>(
    field: &str,
    raw: Option<String>,
    parse: fn(&str) -> Option<T>,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = raw.filter(|raw| !raw.trim().is_empty())?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        errors.push(
            field,
            format!("Select a valid choice. {raw} is not one of the available choices."),
        );
    }
    parsed
}

struct Narrowing {
    status: Option<String>,
    payment_status: Option<String>,
    search: Option<String>,
    from: Option<String>,
    to: Option<String>,
    ordering: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Narrowing {
    fn into_filter(self) -> Result<BookingFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let status = parse_choice("status", self.status, BookingStatus::parse, &mut errors);
        let payment_status = parse_choice(
            "payment_status",
            self.payment_status,
            PaymentStatus::parse,
            &mut errors,
        );
        let ordering = self
            .ordering
            .as_deref()
            .map(BookingOrdering::parse)
            .unwrap_or_default();
        let filter = BookingFilter::new()
            .with_status(status)
            .with_payment_status(payment_status)
            .with_search(self.search.as_deref())
            .with_from_day(self.from.as_deref())
            .with_to_day(self.to.as_deref())
            .with_ordering(ordering)
            .with_window(
                self.limit.map(SelectLimit::new).unwrap_or_default(),
                self.offset.map(SelectOffset::new).unwrap_or_default(),
            );
        errors.into_result(filter)
    }
}

pub struct BookingTransformer;

impl TryIntake<(Principal, ListBookingsRequest)> for BookingTransformer {
    type To = SearchBookingDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: (Principal, ListBookingsRequest)) -> Result<Self::To, Self::Error> {
        let (principal, req) = input;
        let filter = Narrowing {
            status: req.status,
            payment_status: req.payment_status,
            search: req.search,
            from: None,
            to: None,
            ordering: req.ordering,
            limit: req.limit,
            offset: req.offset,
        }
        .into_filter()
        .map_err(ValidationErrors::into_report)?;
        Ok(SearchBookingDto {
            customer_id: principal.customer_id(),
            filter,
        })
    }
}

impl TryIntake<(Principal, SearchBookingsRequest)> for BookingTransformer {
    type To = SearchBookingDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: (Principal, SearchBookingsRequest)) -> Result<Self::To, Self::Error> {
        let (principal, req) = input;
        let filter = Narrowing {
            status: req.status,
            payment_status: req.payment_status,
            search: req.search,
            from: req.from,
            to: req.to,
            ordering: req.ordering,
            limit: req.limit,
            offset: req.offset,
        }
        .into_filter()
        .map_err(ValidationErrors::into_report)?;
        Ok(SearchBookingDto {
            customer_id: principal.customer_id(),
            filter,
        })
    }
}

impl TryIntake<(Principal, CreateBookingRequest)> for BookingTransformer {
    type To = CreateBookingDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: (Principal, CreateBookingRequest)) -> Result<Self::To, Self::Error> {
        let (principal, req) = input;
        let mut errors = ValidationErrors::new();
        if req.vehicle_id.is_none() {
            errors.push("vehicle_id", REQUIRED);
        }
        let missing_start = req.start_date.is_none();
        let missing_end = req.end_date.is_none();
        let start_date = parse_instant("start_date", req.start_date, &mut errors);
        let end_date = parse_instant("end_date", req.end_date, &mut errors);
        let Some(vehicle_id) = req.vehicle_id.filter(|_| errors.is_empty()) else {
            // The period rules run later, so absent dates are reported here too.
            if missing_start {
                errors.push("start_date", REQUIRED);
            }
            if missing_end {
                errors.push("end_date", REQUIRED);
            }
            return Err(errors.into_report());
        };
        Ok(CreateBookingDto {
            customer_id: principal.customer_id(),
            vehicle_id,
            start_date,
            end_date,
            pickup_location: req.pickup_location,
            return_location: req.return_location,
            notes: req.notes,
        })
    }
}

impl TryIntake<(Principal, Uuid, UpdateBookingRequest)> for BookingTransformer {
    type To = UpdateBookingDto;
    type Error = Report<KernelError>;
    fn emit(
        &self,
        input: (Principal, Uuid, UpdateBookingRequest),
    ) -> Result<Self::To, Self::Error> {
        let (principal, id, req) = input;
        let mut errors = ValidationErrors::new();
        let start_date = parse_instant("start_date", req.start_date, &mut errors);
        let end_date = parse_instant("end_date", req.end_date, &mut errors);
        errors
            .into_result(())
            .map_err(ValidationErrors::into_report)?;
        Ok(UpdateBookingDto {
            customer_id: principal.customer_id(),
            booking_id: id,
            start_date,
            end_date,
            pickup_location: req.pickup_location,
            return_location: req.return_location,
            notes: req.notes,
        })
    }
}

impl Intake<(Principal, GetBookingRequest)> for BookingTransformer {
    type To = GetBookingDto;
    fn emit(&self, input: (Principal, GetBookingRequest)) -> Self::To {
        let (principal, req) = input;
        GetBookingDto {
            customer_id: principal.customer_id(),
            booking_id: req.id,
        }
    }
}

impl Intake<(Principal, ConfirmBookingRequest)> for BookingTransformer {
    type To = ConfirmBookingDto;
    fn emit(&self, input: (Principal, ConfirmBookingRequest)) -> Self::To {
        let (principal, req) = input;
        ConfirmBookingDto {
            customer_id: principal.customer_id(),
            booking_id: req.id,
        }
    }
}

impl Intake<(Principal, Uuid, CancelBookingRequest)> for BookingTransformer {
    type To = CancelBookingDto;
    fn emit(&self, input: (Principal, Uuid, CancelBookingRequest)) -> Self::To {
        let (principal, id, req) = input;
        CancelBookingDto {
            customer_id: principal.customer_id(),
            booking_id: id,
            cancellation_reason: req.cancellation_reason,
        }
    }
}
