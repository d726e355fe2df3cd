//! URL slugs derived from product names.

use serde::{Deserialize, Serialize};

/// A URL-safe slug.
///
/// Lowercase ASCII alphanumerics separated by single dashes. Derived from a
/// display name with [`Slug::from_name`]; the derivation is idempotent, so a
/// slug run through it again is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// Non-alphanumeric characters become separators, runs of separators
    /// collapse into one dash, and leading/trailing dashes are trimmed.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;

        for ch in name.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(ch.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }

        Self(slug)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_derivation() {
        assert_eq!(Slug::from_name("Blood Orange Juice").as_str(), "blood-orange-juice");
    }

    #[test]
    fn test_punctuation_collapses() {
        assert_eq!(Slug::from_name("Saffron  &  Rose (1kg)!").as_str(), "saffron-rose-1kg");
    }

    #[test]
    fn test_leading_trailing_trimmed() {
        assert_eq!(Slug::from_name("  --Dried Figs--  ").as_str(), "dried-figs");
    }

    #[test]
    fn test_idempotent() {
        let once = Slug::from_name("Persian Tea, Loose Leaf");
        let twice = Slug::from_name(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Slug::from_name("!!!").as_str(), "");
    }
}
