use time::OffsetDateTime;

use crate::entity::{BookingPeriod, CancellationReason};
use crate::ValidationErrors;

pub const REQUIRED: &str = "This field is required.";
pub const START_IN_PAST: &str = "Start date must be in the future.";
pub const END_BEFORE_START: &str = "End date must be after start date.";
pub const VEHICLE_ALREADY_BOOKED: &str = "This vehicle is already booked for the selected dates.";

/// Checks a requested rental window against `now`, reporting every problem at once.
pub fn validate_period(
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Result<BookingPeriod, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match start {
        None => errors.push("start_date", REQUIRED),
        Some(start) if start <= now => errors.push("start_date", START_IN_PAST),
        Some(_) => {}
    }
    match (start, end) {
        (_, None) => errors.push("end_date", REQUIRED),
        (Some(start), Some(end)) if end <= start => errors.push("end_date", END_BEFORE_START),
        _ => {}
    }

    let period = start
        .zip(end)
        .and_then(|(start, end)| BookingPeriod::new(start, end));
    match period {
        Some(period) => errors.into_result(period),
        None => Err(errors),
    }
}

pub fn validate_cancellation_reason(
    reason: Option<String>,
) -> Result<Option<CancellationReason>, ValidationErrors> {
    let Some(reason) = reason else {
        return Ok(None);
    };
    let mut errors = ValidationErrors::new();
    if reason.chars().count() > CancellationReason::MAX_LENGTH {
        errors.push(
            "cancellation_reason",
            format!(
                "Ensure this field has no more than {} characters.",
                CancellationReason::MAX_LENGTH
            ),
        );
    }
    errors.into_result(Some(CancellationReason::new(reason)))
}
