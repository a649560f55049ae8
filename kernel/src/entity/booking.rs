mod amount;
mod detail;
mod id;
mod period;
mod reference;
mod revision;
mod status;

pub use self::{amount::*, detail::*, id::*, period::*, reference::*, revision::*, status::*};
use crate::entity::{CreatedAt, DailyRate, UpdatedAt, UserId, Vehicle, VehicleId};
use crate::validation::validate_period;
use crate::{pricing, reject, KernelError, ValidationErrors};
use destructure::{Destructure, Mutation};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Booking {
    id: BookingId,
    reference: BookingReference,
    customer_id: UserId,
    vehicle_id: VehicleId,
    period: BookingPeriod,
    pickup_location: Option<PickupLocation>,
    return_location: Option<ReturnLocation>,
    daily_rate: DailyRate,
    total_amount: TotalAmount,
    deposit_amount: DepositAmount,
    status: BookingStatus,
    payment_status: PaymentStatus,
    notes: Option<BookingNotes>,
    cancellation_reason: Option<CancellationReason>,
    created_at: CreatedAt<Booking>,
    updated_at: UpdatedAt<Booking>,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BookingId,
        reference: BookingReference,
        customer_id: UserId,
        vehicle_id: VehicleId,
        period: BookingPeriod,
        pickup_location: Option<PickupLocation>,
        return_location: Option<ReturnLocation>,
        daily_rate: DailyRate,
        total_amount: TotalAmount,
        deposit_amount: DepositAmount,
        status: BookingStatus,
        payment_status: PaymentStatus,
        notes: Option<BookingNotes>,
        cancellation_reason: Option<CancellationReason>,
        created_at: CreatedAt<Booking>,
        updated_at: UpdatedAt<Booking>,
    ) -> Self {
        Self {
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
        }
    }

    /// A fresh `pending` booking. The vehicle's current rate is copied so later
    /// price changes on the listing do not leak into this booking.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        id: BookingId,
        reference: BookingReference,
        customer_id: UserId,
        vehicle: &Vehicle,
        period: BookingPeriod,
        pickup_location: Option<PickupLocation>,
        return_location: Option<ReturnLocation>,
        notes: Option<BookingNotes>,
        now: OffsetDateTime,
    ) -> Self {
        let daily_rate = *vehicle.daily_rate();
        let (total_amount, deposit_amount) = price(&daily_rate, &period);
        Self {
            id,
            reference,
            customer_id,
            vehicle_id: vehicle.id().clone(),
            period,
            pickup_location,
            return_location,
            daily_rate,
            total_amount,
            deposit_amount,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes,
            cancellation_reason: None,
            created_at: CreatedAt::new(now),
            updated_at: UpdatedAt::new(now),
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.customer_id == *user
    }

    pub fn duration_days(&self) -> Decimal {
        self.period.duration_days()
    }

    pub fn is_active(&self, now: &OffsetDateTime) -> bool {
        self.status == BookingStatus::Active && self.period.contains(now)
    }

    pub fn is_upcoming(&self, now: &OffsetDateTime) -> bool {
        matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) && self.period.start() > now
    }

    pub fn is_completed(&self) -> bool {
        self.status == BookingStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    pub fn can_cancel(&self, now: &OffsetDateTime) -> bool {
        self.status.can_transition_to(&BookingStatus::Cancelled) && self.period.start() > now
    }

    pub fn confirm(self, now: OffsetDateTime) -> error_stack::Result<Self, KernelError> {
        if !self.status.can_transition_to(&BookingStatus::Confirmed) {
            return Err(reject(KernelError::Conflict, "Booking cannot be confirmed"));
        }
        Ok(self.reconstruct(|booking| {
            booking.status = BookingStatus::Confirmed;
            booking.updated_at = UpdatedAt::new(now);
        }))
    }

    pub fn cancel(
        self,
        reason: Option<CancellationReason>,
        now: OffsetDateTime,
    ) -> error_stack::Result<Self, KernelError> {
        if !self.can_cancel(&now) {
            return Err(reject(
                KernelError::Conflict,
                "This booking cannot be cancelled",
            ));
        }
        Ok(self.reconstruct(|booking| {
            booking.status = BookingStatus::Cancelled;
            booking.cancellation_reason = reason;
            booking.updated_at = UpdatedAt::new(now);
        }))
    }

    /// Applies customer edits. A new period must still start in the future, and
    /// it re-prices the booking from the rate captured at creation.
    pub fn revise(
        self,
        revision: BookingRevision,
        now: OffsetDateTime,
    ) -> error_stack::Result<Self, KernelError> {
        if !self.status.is_modifiable() {
            return Err(reject(
                KernelError::Conflict,
                "Cannot modify completed or cancelled bookings.",
            ));
        }
        let period = if revision.reschedules() {
            validate_period(
                Some(revision.start_date.unwrap_or(*self.period.start())),
                Some(revision.end_date.unwrap_or(*self.period.end())),
                now,
            )
            .map_err(ValidationErrors::into_report)?
        } else {
            self.period
        };
        let BookingRevision {
            pickup_location,
            return_location,
            notes,
            ..
        } = revision;

        Ok(self.reconstruct(|booking| {
            if booking.period != period {
                let (total_amount, deposit_amount) = price(&booking.daily_rate, &period);
                booking.period = period;
                booking.total_amount = total_amount;
                booking.deposit_amount = deposit_amount;
            }
            if pickup_location.is_some() {
                booking.pickup_location = pickup_location;
            }
            if return_location.is_some() {
                booking.return_location = return_location;
            }
            if notes.is_some() {
                booking.notes = notes;
            }
            booking.updated_at = UpdatedAt::new(now);
        }))
    }
}

fn price(rate: &DailyRate, period: &BookingPeriod) -> (TotalAmount, DepositAmount) {
    let total = pricing::total_amount(Some(*rate.as_ref()), *period.start(), *period.end());
    (
        TotalAmount::new(total),
        DepositAmount::new(pricing::deposit_amount(total)),
    )
}
