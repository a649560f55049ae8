use time::OffsetDateTime;

use crate::entity::BookingReference;

/// Source of "now". Every time-dependent rule reads the current instant from here.
pub trait Clock: 'static + Sync + Send {
    fn now(&self) -> OffsetDateTime;
}

pub trait DependOnClock: 'static + Sync + Send {
    type Clock: Clock;
    fn clock(&self) -> &Self::Clock;
}

/// Produces candidate booking references. Candidates are not required to be
/// unique; callers check them against the store.
pub trait BookingReferenceGenerator: 'static + Sync + Send {
    fn generate(&self) -> BookingReference;
}

pub trait DependOnBookingReferenceGenerator: 'static + Sync + Send {
    type BookingReferenceGenerator: BookingReferenceGenerator;
    fn booking_reference_generator(&self) -> &Self::BookingReferenceGenerator;
}
