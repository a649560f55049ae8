use rust_decimal::Decimal;
use time::OffsetDateTime;
use vodca::References;

use crate::pricing;

/// Half-open rental interval `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, References)]
pub struct BookingPeriod {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl BookingPeriod {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Shared boundaries do not count: `[t0, t1)` and `[t1, t2)` never overlap.
    pub fn overlaps(&self, other: &BookingPeriod) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: &OffsetDateTime) -> bool {
        self.start <= *instant && *instant <= self.end
    }

    pub fn duration_days(&self) -> Decimal {
        pricing::duration_days(self.start, self.end)
    }
}
