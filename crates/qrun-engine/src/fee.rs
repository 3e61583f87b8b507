use rust_decimal::Decimal;

/// Computes the transaction fee charged for a fill.
pub trait FeeModel: Send + Sync {
    /// `size` is the signed fill size, `price` the fill price; the returned
    /// fee is always non-negative, in the asset's currency.
    fn fee(&self, size: Decimal, price: Decimal) -> Decimal;
}

/// No transaction fees.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFee;

impl FeeModel for NoFee {
    fn fee(&self, _size: Decimal, _price: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

/// A flat percentage of the notional value of the fill.
#[derive(Debug, Clone, Copy)]
pub struct Percentage {
    pub rate: Decimal,
}

impl Percentage {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }
}

impl FeeModel for Percentage {
    fn fee(&self, size: Decimal, price: Decimal) -> Decimal {
        (size * price).abs() * self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn no_fee_is_always_zero() {
        assert_eq!(NoFee.fee(dec!(10), dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn percentage_fee_scales_with_notional_and_ignores_sign() {
        let model = Percentage::new(dec!(0.001));
        assert_eq!(model.fee(dec!(-10), dec!(100)), dec!(1.000));
    }
}
