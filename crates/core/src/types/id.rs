//! Newtype IDs for portal entities.
//!
//! Every table in the portal uses a `SERIAL` primary key, so IDs wrap `i32`.
//! Wrapping them keeps a user ID from being passed where a program plan ID is
//! expected.

/// Error returned when an ID cannot be parsed from text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// The text is not a base-10 integer.
    #[error("not a number: {0:?}")]
    NotANumber(String),
    /// The number is zero or negative; `SERIAL` keys start at 1.
    #[error("id must be positive (got {0})")]
    NotPositive(i64),
}

/// Define a type-safe ID wrapper around a positive `i32`.
///
/// The generated type derives the usual value traits, serializes
/// transparently, parses from text (rejecting non-positive values) and, with
/// the `postgres` feature, encodes and decodes as `INT4`.
///
/// ```rust
/// # use pengawas_core::define_id;
/// define_id!(SchoolId);
///
/// let id: SchoolId = "42".parse().unwrap();
/// assert_eq!(id.as_i32(), 42);
/// assert!("0".parse::<SchoolId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database key.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw database key.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::ParseIdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let value: i64 = s
                    .parse()
                    .map_err(|_| $crate::types::id::ParseIdError::NotANumber(s.to_owned()))?;
                if value <= 0 {
                    return Err($crate::types::id::ParseIdError::NotPositive(value));
                }
                i32::try_from(value)
                    .map(Self)
                    .map_err(|_| $crate::types::id::ParseIdError::NotANumber(s.to_owned()))
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(ProgramPlanId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive() {
        let id: ProgramPlanId = "42".parse().unwrap();
        assert_eq!(id, ProgramPlanId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            "abc".parse::<UserId>(),
            Err(ParseIdError::NotANumber("abc".to_owned()))
        );
        assert!(matches!(
            "99999999999".parse::<UserId>(),
            Err(ParseIdError::NotANumber(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert_eq!("0".parse::<UserId>(), Err(ParseIdError::NotPositive(0)));
        assert_eq!("-3".parse::<UserId>(), Err(ParseIdError::NotPositive(-3)));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
