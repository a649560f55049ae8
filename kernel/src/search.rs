use std::cmp::Ordering;

use time::macros::format_description;
use time::{Date, OffsetDateTime};
use vodca::References;

use crate::entity::{Booking, BookingStatus, PaymentStatus, SelectLimit, SelectOffset, Vehicle};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OrderingKey {
    CreatedAt,
    StartDate,
    TotalAmount,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, References)]
pub struct BookingOrdering {
    key: OrderingKey,
    descending: bool,
}

impl BookingOrdering {
    pub fn new(key: OrderingKey, descending: bool) -> Self {
        Self { key, descending }
    }

    /// Accepts `created_at`, `start_date` or `total_amount`, optionally prefixed by `-`.
    /// Anything else falls back to newest first.
    pub fn parse(raw: &str) -> Self {
        let (descending, field) = match raw.trim().strip_prefix('-') {
            Some(field) => (true, field),
            None => (false, raw.trim()),
        };
        let key = match field {
            "created_at" => OrderingKey::CreatedAt,
            "start_date" => OrderingKey::StartDate,
            "total_amount" => OrderingKey::TotalAmount,
            _ => return Self::default(),
        };
        Self::new(key, descending)
    }

    /// Total order; equal keys fall back to the booking id in the same direction.
    pub fn compare(&self, a: &Booking, b: &Booking) -> Ordering {
        let by_key = match self.key {
            OrderingKey::CreatedAt => a.created_at().as_ref().cmp(b.created_at().as_ref()),
            OrderingKey::StartDate => a.period().start().cmp(b.period().start()),
            OrderingKey::TotalAmount => a.total_amount().as_ref().cmp(b.total_amount().as_ref()),
        };
        let ordering = by_key.then_with(|| a.id().cmp(b.id()));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

impl Default for BookingOrdering {
    fn default() -> Self {
        Self::new(OrderingKey::CreatedAt, true)
    }
}

/// Lenient `YYYY-MM-DD`; anything unparseable is treated as no bound at all.
pub fn parse_day(raw: &str) -> Option<OffsetDateTime> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Narrowing applied to one customer's bookings.
#[derive(Debug, Clone, Default, Eq, PartialEq, References)]
pub struct BookingFilter {
    status: Option<BookingStatus>,
    payment_status: Option<PaymentStatus>,
    terms: Vec<String>,
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
    ordering: BookingOrdering,
    limit: SelectLimit,
    offset: SelectOffset,
}

impl BookingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Option<BookingStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_payment_status(mut self, payment_status: Option<PaymentStatus>) -> Self {
        self.payment_status = payment_status;
        self
    }

    pub fn with_search(mut self, text: Option<&str>) -> Self {
        self.terms = text
            .map(|text| text.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();
        self
    }

    pub fn with_from_day(mut self, raw: Option<&str>) -> Self {
        self.from = raw.and_then(parse_day);
        self
    }

    pub fn with_to_day(mut self, raw: Option<&str>) -> Self {
        self.to = raw.and_then(parse_day);
        self
    }

    pub fn with_ordering(mut self, ordering: BookingOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_window(mut self, limit: SelectLimit, offset: SelectOffset) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Evaluates every criterion except the window. `vehicle` is the booked
    /// vehicle, used for the make/model text match.
    pub fn matches(&self, booking: &Booking, vehicle: Option<&Vehicle>) -> bool {
        if self.status.is_some_and(|status| *booking.status() != status) {
            return false;
        }
        if self
            .payment_status
            .is_some_and(|payment| *booking.payment_status() != payment)
        {
            return false;
        }
        if self.from.is_some_and(|from| *booking.period().start() < from) {
            return false;
        }
        if self.to.is_some_and(|to| *booking.period().end() > to) {
            return false;
        }
        let haystack = [
            Some(booking.reference().as_ref().to_lowercase()),
            vehicle.map(|v| v.make().as_ref().to_lowercase()),
            vehicle.map(|v| v.model().as_ref().to_lowercase()),
        ];
        self.terms.iter().all(|term| {
            haystack
                .iter()
                .flatten()
                .any(|field| field.contains(term.as_str()))
        })
    }
}
