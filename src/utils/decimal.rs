use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Half-up rounding to a fixed two-decimal scale.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

pub fn clamp_percentage(value: Decimal) -> Decimal {
    round2(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
}

pub fn from_f64(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

/// Arithmetic mean rounded to two decimals; zero for an empty input.
pub fn mean2<'a, I>(values: I) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0u32), |(sum, n), v| (sum + *v, n + 1));
    if count == 0 {
        return round2(Decimal::ZERO);
    }
    round2(sum / Decimal::from(count))
}
