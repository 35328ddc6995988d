//! Public order identifiers (`ORD-<millis>-<suffix>`).

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// The input does not start with the `ORD-` prefix.
    #[error("order number must start with {prefix}")]
    MissingPrefix {
        /// Expected prefix.
        prefix: &'static str,
    },
    /// The timestamp component is not a number.
    #[error("order number timestamp is invalid")]
    InvalidTimestamp,
    /// The suffix is empty or not upper-case alphanumeric.
    #[error("order number suffix must be {len} upper-case alphanumeric characters")]
    InvalidSuffix {
        /// Expected suffix length.
        len: usize,
    },
}

/// The customer-facing identifier of an order.
///
/// Format: `ORD-<unix millis>-<9 upper-case alphanumerics>`, e.g.
/// `ORD-1767225600000-7K2QX9ABF`. The random suffix makes collisions unlikely
/// but not impossible; storage enforces uniqueness.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use cartwheel_core::OrderNumber;
///
/// let at = Utc.timestamp_millis_opt(1_767_225_600_000).unwrap();
/// let number = OrderNumber::from_parts(at, "7K2QX9ABF").unwrap();
/// assert_eq!(number.as_str(), "ORD-1767225600000-7K2QX9ABF");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Fixed prefix of every order number.
    pub const PREFIX: &'static str = "ORD-";

    /// Length of the random suffix.
    pub const SUFFIX_LEN: usize = 9;

    /// Build an order number from a timestamp and a random suffix.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError::InvalidSuffix`] if the suffix is not exactly
    /// [`Self::SUFFIX_LEN`] upper-case ASCII alphanumerics.
    pub fn from_parts(at: DateTime<Utc>, suffix: &str) -> Result<Self, OrderNumberError> {
        validate_suffix(suffix)?;
        Ok(Self(format!(
            "{}{}-{suffix}",
            Self::PREFIX,
            at.timestamp_millis()
        )))
    }

    /// Parse an order number received from a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not follow the
    /// `ORD-<millis>-<suffix>` format.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let rest = s
            .trim()
            .strip_prefix(Self::PREFIX)
            .ok_or(OrderNumberError::MissingPrefix {
                prefix: Self::PREFIX,
            })?;

        let (millis, suffix) = rest
            .split_once('-')
            .ok_or(OrderNumberError::InvalidTimestamp)?;

        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::InvalidTimestamp);
        }

        validate_suffix(suffix)?;

        Ok(Self(s.trim().to_owned()))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_suffix(suffix: &str) -> Result<(), OrderNumberError> {
    let valid = suffix.len() == OrderNumber::SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase());

    if valid {
        Ok(())
    } else {
        Err(OrderNumberError::InvalidSuffix {
            len: OrderNumber::SUFFIX_LEN,
        })
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
