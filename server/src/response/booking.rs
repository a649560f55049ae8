use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use application::transfer::BookingDto;
use kernel::prelude::entity::{BookingStatus, PaymentStatus};

use crate::controller::Exhaust;
use crate::response::Envelope;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    id: Uuid,
    booking_number: String,
    customer_id: Uuid,
    vehicle_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end_date: OffsetDateTime,
    pickup_location: Option<String>,
    return_location: Option<String>,
    daily_rate: Decimal,
    total_amount: Decimal,
    deposit_amount: Decimal,
    status: BookingStatus,
    payment_status: PaymentStatus,
    notes: Option<String>,
    cancellation_reason: Option<String>,
    duration_days: Decimal,
    is_active: bool,
    is_upcoming: bool,
    is_completed: bool,
    is_cancelled: bool,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<BookingDto> for BookingResponse {
    fn from(dto: BookingDto) -> Self {
        let BookingDto {
            id,
            booking_number,
            customer_id,
            vehicle_id,
            start_date,
            end_date,
            pickup_location,
            return_location,
            daily_rate,
            total_amount,
            deposit_amount,
            status,
            payment_status,
            notes,
            cancellation_reason,
            duration_days,
            is_active,
            is_upcoming,
            is_completed,
            is_cancelled,
            created_at,
            updated_at,
        } = dto;
        Self {
            id,
            booking_number,
            customer_id,
            vehicle_id,
            start_date,
            end_date,
            pickup_location,
            return_location,
            daily_rate,
            total_amount,
            deposit_amount,
            status,
            payment_status,
            notes,
            cancellation_reason,
            duration_days,
            is_active,
            is_upcoming,
            is_completed,
            is_cancelled,
            created_at,
            updated_at,
        }
    }
}

/// Status code and message depend on which operation produced the booking.
pub struct BookingPresenter {
    status: StatusCode,
    message: Option<&'static str>,
}

impl BookingPresenter {
    pub fn found() -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
        }
    }

    pub fn created() -> Self {
        Self {
            status: StatusCode::CREATED,
            message: Some("Booking created successfully"),
        }
    }

    pub fn updated() -> Self {
        Self {
            status: StatusCode::OK,
            message: Some("Booking updated successfully"),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: StatusCode::OK,
            message: Some("Booking cancelled successfully"),
        }
    }

    pub fn confirmed() -> Self {
        Self {
            status: StatusCode::OK,
            message: Some("Booking confirmed successfully"),
        }
    }
}

impl Exhaust<BookingDto> for BookingPresenter {
    type To = (StatusCode, Json<Envelope<BookingResponse>>);
    fn emit(&self, input: BookingDto) -> Self::To {
        let envelope = Envelope::success(self.message, BookingResponse::from(input));
        (self.status, Json(envelope))
    }
}

impl Exhaust<Vec<BookingDto>> for BookingPresenter {
    type To = (StatusCode, Json<Envelope<Vec<BookingResponse>>>);
    fn emit(&self, input: Vec<BookingDto>) -> Self::To {
        let bookings = input.into_iter().map(BookingResponse::from).collect();
        (self.status, Json(Envelope::success(self.message, bookings)))
    }
}
