//! Money amounts in Toman.
//!
//! Prices are whole Toman (no subunit), so amounts are plain integers rather
//! than decimals. Arithmetic is checked: totals over many line items must not
//! silently wrap.

use serde::{Deserialize, Serialize};

/// A non-negative amount of money in Toman.
///
/// The inner value is `i64` so intermediate arithmetic (quantity × price over
/// a whole order) has headroom; constructors and the database CHECK keep
/// persisted values non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Toman(i64);

impl Toman {
    /// Zero Toman.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw Toman value.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the raw Toman value.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Multiply a unit price by a quantity, `None` on overflow.
    #[must_use]
    pub const fn checked_mul(self, quantity: i64) -> Option<Self> {
        match self.0.checked_mul(quantity) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Add two amounts, `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Sum `quantity × unit_price` over line items, `None` on overflow.
    pub fn total<I>(lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = (Self, i64)>,
    {
        lines
            .into_iter()
            .try_fold(Self::ZERO, |acc, (unit_price, quantity)| {
                acc.checked_add(unit_price.checked_mul(quantity)?)
            })
    }
}

impl core::fmt::Display for Toman {
    /// Formats with thousands separators and the Toman sign, e.g. `12,500 T`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} T", group_thousands(self.0))
    }
}

impl From<i64> for Toman {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Toman> for i64 {
    fn from(amount: Toman) -> Self {
        amount.0
    }
}

/// Render an integer with `,` thousands separators.
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }

    let first = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Toman {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Toman {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Toman {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Toman::new(0).to_string(), "0 T");
        assert_eq!(Toman::new(950).to_string(), "950 T");
        assert_eq!(Toman::new(12_500).to_string(), "12,500 T");
        assert_eq!(Toman::new(1_234_567).to_string(), "1,234,567 T");
    }

    #[test]
    fn test_display_negative() {
        // Negative amounts never reach storage, but Display must not mangle them.
        assert_eq!(Toman::new(-7_000).to_string(), "-7,000 T");
    }

    #[test]
    fn test_checked_mul() {
        assert_eq!(Toman::new(2_500).checked_mul(4), Some(Toman::new(10_000)));
        assert_eq!(Toman::new(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_total_over_lines() {
        let lines = [(Toman::new(1_000), 2), (Toman::new(500), 3)];
        assert_eq!(Toman::total(lines), Some(Toman::new(3_500)));
    }

    #[test]
    fn test_total_overflow_is_none() {
        let lines = [(Toman::new(i64::MAX), 1), (Toman::new(1), 1)];
        assert_eq!(Toman::total(lines), None);
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Toman::new(4_200)).unwrap();
        assert_eq!(json, "4200");
        let back: Toman = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Toman::new(4_200));
    }
}
