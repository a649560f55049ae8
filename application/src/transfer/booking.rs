use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::prelude::entity::{Booking, BookingStatus, DestructBooking, PaymentStatus};
use kernel::prelude::search::BookingFilter;

/// Read model of a booking, with the time-dependent flags evaluated at `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDto {
    pub id: Uuid,
    pub booking_number: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub pickup_location: Option<String>,
    pub return_location: Option<String>,
    pub daily_rate: Decimal,
    pub total_amount: Decimal,
    pub deposit_amount: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub duration_days: Decimal,
    pub is_active: bool,
    pub is_upcoming: bool,
    pub is_completed: bool,
    pub is_cancelled: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl BookingDto {
    pub fn new(booking: Booking, now: OffsetDateTime) -> Self {
        let duration_days = booking.duration_days();
        let is_active = booking.is_active(&now);
        let is_upcoming = booking.is_upcoming(&now);
        let is_completed = booking.is_completed();
        let is_cancelled = booking.is_cancelled();
        let DestructBooking {
            id,
            reference,
            customer_id,
            vehicle_id,
            period,
            pickup_location,
            return_location,
            daily_rate,
            total_amount,
            deposit_amount,
            status,
            payment_status,
            notes,
            cancellation_reason,
            created_at,
            updated_at,
        } = booking.into_destruct();
        Self {
            id: id.into(),
            booking_number: reference.into(),
            customer_id: customer_id.into(),
            vehicle_id: vehicle_id.into(),
            start_date: *period.start(),
            end_date: *period.end(),
            pickup_location: pickup_location.map(Into::into),
            return_location: return_location.map(Into::into),
            daily_rate: daily_rate.into(),
            total_amount: total_amount.into(),
            deposit_amount: deposit_amount.into(),
            status,
            payment_status,
            notes: notes.map(Into::into),
            cancellation_reason: cancellation_reason.map(Into::into),
            duration_days,
            is_active,
            is_upcoming,
            is_completed,
            is_cancelled,
            created_at: *created_at.as_ref(),
            updated_at: *updated_at.as_ref(),
        }
    }
}

pub struct GetBookingDto {
    pub customer_id: Uuid,
    pub booking_id: Uuid,
}

#[derive(Debug)]
pub struct SearchBookingDto {
    pub customer_id: Uuid,
    pub filter: BookingFilter,
}

#[derive(Debug)]
pub struct CreateBookingDto {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub pickup_location: Option<String>,
    pub return_location: Option<String>,
    pub notes: Option<String>,
}

/// Fields left `None` keep their current value.
#[derive(Debug)]
pub struct UpdateBookingDto {
    pub customer_id: Uuid,
    pub booking_id: Uuid,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub pickup_location: Option<String>,
    pub return_location: Option<String>,
    pub notes: Option<String>,
}

pub struct ConfirmBookingDto {
    pub customer_id: Uuid,
    pub booking_id: Uuid,
}

pub struct CancelBookingDto {
    pub customer_id: Uuid,
    pub booking_id: Uuid,
    pub cancellation_reason: Option<String>,
}
