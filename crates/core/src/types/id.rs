//! Newtype IDs for rows assigned by the external summary store.
//!
//! The store hands out `bigint` identity keys; wrapping them keeps a summary
//! ID from being confused with a turn count or a page limit.

/// Define a store-assigned ID wrapper around `i64`.
///
/// The generated type is `Copy`, serializes transparently, displays as the
/// bare number and parses from a decimal string (for path segments).
///
/// ```rust
/// # use megami_core::define_id;
/// define_id!(ReceiptId);
///
/// let id: ReceiptId = "42".parse().expect("decimal");
/// assert_eq!(id.as_i64(), 42);
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
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw store identifier.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(SummaryId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_id_parses_path_segment() {
        let id: SummaryId = " 17 ".parse().unwrap();
        assert_eq!(id, SummaryId::new(17));
        assert!("abc".parse::<SummaryId>().is_err());
    }

    #[test]
    fn test_summary_id_serializes_transparently() {
        let json = serde_json::to_string(&SummaryId::new(9)).unwrap();
        assert_eq!(json, "9");
        let parsed: SummaryId = serde_json::from_str("123").unwrap();
        assert_eq!(parsed.as_i64(), 123);
    }
}
