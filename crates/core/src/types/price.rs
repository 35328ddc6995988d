//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are single-currency (USD) amounts kept as [`Decimal`] with two
//! fractional digits. On the wire they are plain JSON numbers so browser
//! clients can call `toFixed(2)` on them directly.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,

    /// The amount exceeds [`Price::MAX`].
    #[error("price cannot exceed {}", Price::MAX)]
    TooLarge,
}

/// A non-negative monetary amount.
///
/// ```
/// use rust_decimal::Decimal;
/// use cartwheel_core::Price;
///
/// let unit = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(unit.times(3).unwrap().to_string(), "$59.97");
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// assert!(Price::MAX.times(2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Number of fractional digits kept.
    pub const SCALE: u32 = 2;

    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount a `NUMERIC(12, 2)` column holds.
    pub const MAX: Self = Self(Decimal::from_parts(
        0xD4A5_0FFF,
        0xE8,
        0,
        false,
        Self::SCALE,
    ));

    /// Create a price, rounding to cents (half away from zero).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero and
    /// [`PriceError::TooLarge`] if it exceeds [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Self::bounded(amount.round_dp_with_strategy(
            Self::SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), Self::SCALE))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the result exceeds [`Price::MAX`].
    pub fn times(self, quantity: u32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::TooLarge)
            .and_then(Self::bounded)
    }

    /// Sum of two prices.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the result exceeds [`Price::MAX`].
    pub fn checked_add(self, rhs: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(rhs.0)
            .ok_or(PriceError::TooLarge)
            .and_then(Self::bounded)
    }

    /// Sum of `prices`, failing instead of exceeding [`Price::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the running total exceeds
    /// [`Price::MAX`].
    pub fn total<I: IntoIterator<Item = Self>>(prices: I) -> Result<Self, PriceError> {
        prices
            .into_iter()
            .try_fold(Self::ZERO, |acc, price| acc.checked_add(price))
    }

    fn bounded(amount: Decimal) -> Result<Self, PriceError> {
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rounds_to_cents() {
        let price = Price::new(Decimal::new(10_005, 3)).unwrap();
        assert_eq!(price.amount(), Decimal::new(1001, 2));
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_new_rejects_above_max() {
        assert_eq!(Price::MAX.amount(), Decimal::new(999_999_999_999, 2));
        assert!(Price::new(Decimal::new(999_999_999_999, 2)).is_ok());
        assert_eq!(
            Price::new(Decimal::new(1_000_000_000_000, 2)),
            Err(PriceError::TooLarge)
        );
        assert_eq!(
            Price::new(Decimal::from_scientific("7e28").unwrap()),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_times_and_total() {
        let lines = [
            Price::from_cents(1000).times(2).unwrap(),
            Price::from_cents(2499),
        ];
        assert_eq!(Price::total(lines).unwrap(), Price::from_cents(4499));
        assert_eq!(Price::total([]).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_arithmetic_never_exceeds_max() {
        assert_eq!(Price::MAX.times(2), Err(PriceError::TooLarge));
        assert_eq!(Price::MAX.times(u32::MAX), Err(PriceError::TooLarge));
        assert_eq!(Price::MAX.times(1), Ok(Price::MAX));
        assert_eq!(
            Price::MAX.checked_add(Price::from_cents(1)),
            Err(PriceError::TooLarge)
        );
        assert_eq!(
            Price::total([Price::MAX, Price::ZERO, Price::from_cents(1)]),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_deserialize_rejects_above_max() {
        assert!(serde_json::from_str::<Price>("1e12").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(7999).to_string(), "$79.99");
        assert_eq!(Price::from_cents(2000).to_string(), "$20.00");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_value(Price::from_cents(7999)).unwrap();
        assert_eq!(json, serde_json::json!(79.99));
    }

    #[test]
    fn test_deserializes_numbers() {
        let price: Price = serde_json::from_str("129.99").unwrap();
        assert_eq!(price, Price::from_cents(12_999));

        let whole: Price = serde_json::from_str("10").unwrap();
        assert_eq!(whole, Price::from_cents(1000));

        assert!(serde_json::from_str::<Price>("-5").is_err());
    }
}
