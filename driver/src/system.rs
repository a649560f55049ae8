use rand::Rng;
use time::OffsetDateTime;

use kernel::interface::system::{BookingReferenceGenerator, Clock};
use kernel::prelude::entity::BookingReference;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Draws each character uniformly from `A-Z0-9`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBookingReferenceGenerator;

impl BookingReferenceGenerator for RandomBookingReferenceGenerator {
    fn generate(&self) -> BookingReference {
        let mut rng = rand::thread_rng();
        let reference = (0..BookingReference::LENGTH)
            .map(|_| {
                let index = rng.gen_range(0..BookingReference::ALPHABET.len());
                char::from(BookingReference::ALPHABET[index])
            })
            .collect::<String>();
        BookingReference::new(reference)
    }
}
