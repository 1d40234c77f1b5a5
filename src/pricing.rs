//! pricing.rs
//!
//! Расчет стоимости: базовая цена сеанса, процентная наценка категории,
//! количество мест. Чистая функция, без побочных эффектов.
//!
//! Деньги считаем в минорных единицах (центах/тиынах) в целочисленной
//! арифметике: наценка переводится в базисные пункты, итог округляется
//! "half up" до минорной единицы, чтобы счета были воспроизводимы.

use crate::error::{BookingError, Result};

/// `base_price * (1 + premium_percentage / 100) * quantity`, округлено
/// half up до минорной единицы.
///
/// Rejects negative base price, negative or non-finite premium and zero
/// quantity; overflow of the final total is also an invalid request.
pub fn compute_price(base_price: i64, premium_percentage: f64, quantity: u32) -> Result<i64> {
    if base_price < 0 {
        return Err(BookingError::invalid("base price must not be negative"));
    }
    if !premium_percentage.is_finite() || premium_percentage < 0.0 {
        return Err(BookingError::invalid(
            "premium percentage must be a non-negative number",
        ));
    }
    if quantity == 0 {
        return Err(BookingError::invalid("quantity must be greater than zero"));
    }

    // Проценты -> базисные пункты, дальше только целые числа.
    // Сверхбольшая наценка — это мусор на входе, а не паника.
    let premium_bps = (premium_percentage * 100.0).round() as i128;
    let numerator = 10_000i128
        .checked_add(premium_bps)
        .and_then(|factor| factor.checked_mul(base_price as i128))
        .and_then(|subtotal| subtotal.checked_mul(quantity as i128))
        .ok_or_else(|| BookingError::invalid("total price overflows"))?;
    let total = div_round_half_up(numerator, 10_000);

    i64::try_from(total).map_err(|_| BookingError::invalid("total price overflows i64"))
}

// numerator, denominator >= 0
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    (numerator + denominator / 2) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vip_premium_doubles_up() {
        // 100 base * 1.5 premium * 2 seats
        assert_eq!(compute_price(100, 50.0, 2).unwrap(), 300);
    }

    #[test]
    fn zero_premium_is_identity() {
        assert_eq!(compute_price(100, 0.0, 1).unwrap(), 100);
    }

    #[test]
    fn fractional_premium_rounds_half_up() {
        // 150 * 1.01 = 151.5 -> 152
        assert_eq!(compute_price(150, 1.0, 1).unwrap(), 152);
        // 333 * 1.025 = 341.325 -> 341
        assert_eq!(compute_price(333, 2.5, 1).unwrap(), 341);
    }

    #[test]
    fn negative_inputs_rejected() {
        assert!(matches!(
            compute_price(-1, 0.0, 1),
            Err(BookingError::InvalidRequest(_))
        ));
        assert!(matches!(
            compute_price(100, -5.0, 1),
            Err(BookingError::InvalidRequest(_))
        ));
        assert!(matches!(
            compute_price(100, f64::NAN, 1),
            Err(BookingError::InvalidRequest(_))
        ));
    }

    #[test]
    fn huge_premium_is_invalid_request_not_panic() {
        // наценка, переполняющая базисные пункты
        assert!(matches!(
            compute_price(1, 1e40, 1),
            Err(BookingError::InvalidRequest(_))
        ));
        assert!(matches!(
            compute_price(i64::MAX, 100.0, 10),
            Err(BookingError::InvalidRequest(_))
        ));
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(matches!(
            compute_price(100, 0.0, 0),
            Err(BookingError::InvalidRequest(_))
        ));
    }
}
