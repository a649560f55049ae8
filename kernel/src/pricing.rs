use rust_decimal::{Decimal, RoundingStrategy};
use time::OffsetDateTime;

const SECONDS_PER_DAY: i64 = 86_400;
const MONEY_SCALE: u32 = 2;

/// Interval length as whole days plus the remaining seconds as a fraction of a day.
/// Sub-second parts are dropped. Returns zero unless `end > start`.
pub fn duration_days(start: OffsetDateTime, end: OffsetDateTime) -> Decimal {
    if end <= start {
        return Decimal::ZERO;
    }
    let seconds = (end - start).whole_seconds();
    let days = Decimal::from(seconds / SECONDS_PER_DAY);
    let remainder = Decimal::from(seconds % SECONDS_PER_DAY) / Decimal::from(SECONDS_PER_DAY);
    days + remainder
}

/// `rate × duration_days`, rounded to cents. A missing rate or an empty interval prices at zero.
pub fn total_amount(rate: Option<Decimal>, start: OffsetDateTime, end: OffsetDateTime) -> Decimal {
    let Some(rate) = rate else {
        return round_money(Decimal::ZERO);
    };
    let total = rate
        .checked_mul(duration_days(start, end))
        .unwrap_or(Decimal::ZERO);
    round_money(total)
}

/// Twenty percent of the total, rounded to cents.
pub fn deposit_amount(total: Decimal) -> Decimal {
    round_money(total * Decimal::new(2, 1))
}

pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}
