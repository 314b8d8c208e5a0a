// src/utils/precision.rs
use rust_decimal::Decimal;

/// Rounds `quantity` down to a multiple of the exchange LOT_SIZE `step`.
/// A zero step leaves the quantity as is.
pub fn round_down_to_step(quantity: Decimal, step: Decimal) -> Decimal {
    if step.is_zero() {
        return quantity;
    }
    ((quantity / step).floor() * step).normalize()
}
