use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A signed monetary value.
///
/// Used for agreed prices and every derived total. Differences such as the
/// remaining balance of a job may go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

/// A strictly positive monetary amount, as recorded on a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidArgument(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Validates an agreed price, which may be zero but never negative.
    pub fn non_negative(amount: Decimal) -> Result<Self, LedgerError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(LedgerError::InvalidArgument(
                "Agreed price must not be negative".to_string(),
            ));
        }
        Ok(Self(amount))
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, LedgerError> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(out_of_range)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, LedgerError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or_else(out_of_range)
    }

    /// Adds up `balances`, failing instead of overflowing.
    pub fn try_sum<I: IntoIterator<Item = Self>>(balances: I) -> Result<Self, LedgerError> {
        balances
            .into_iter()
            .try_fold(Self::ZERO, |acc, b| acc.checked_add(b))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.normalize().fmt(f)
    }
}

fn out_of_range() -> LedgerError {
    LedgerError::InvalidArgument("Amount exceeds the supported range".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(15.0));
        assert_eq!(b1.checked_add(b2).unwrap(), Balance::new(dec!(25.0)));
        assert_eq!(b1.checked_sub(b2).unwrap(), Balance::new(dec!(-5.0)));
        assert_eq!(Balance::try_sum([b1, b2, b1]).unwrap(), Balance::new(dec!(35.0)));
    }

    #[test]
    fn test_balance_overflow_is_an_error() {
        let max = Balance::new(Decimal::MAX);
        assert!(matches!(
            max.checked_add(Balance::new(dec!(1))),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            Balance::try_sum([max, max]),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            Balance::new(Decimal::MIN).checked_sub(Balance::new(dec!(1))),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_agreed_price_validation() {
        assert!(Balance::non_negative(dec!(0)).is_ok());
        assert!(Balance::non_negative(dec!(1000)).is_ok());
        assert!(matches!(
            Balance::non_negative(dec!(-0.5)),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(Balance::new(dec!(600.00)).to_string(), "600");
        assert_eq!(Balance::new(dec!(0.2500)).to_string(), "0.25");
    }

    #[test]
    fn test_amount_rejects_non_positive_on_deserialize() {
        assert!(serde_json::from_str::<Amount>("\"5\"").is_ok());
        assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
    }
}
