//! Visitor display name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Nickname`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NicknameError {
    /// The input is empty or only whitespace.
    #[error("nickname cannot be empty")]
    Empty,
}

/// The display name a visitor registers with.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed before validation
/// - Must not be empty after trimming
/// - No length limit
///
/// ## Examples
///
/// ```
/// use megami_core::Nickname;
///
/// assert_eq!(Nickname::parse("  Aoi ").expect("valid").as_str(), "Aoi");
/// assert!(Nickname::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Nickname(String);

impl Nickname {
    /// Parse a `Nickname` from raw form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty.
    pub fn parse(s: &str) -> Result<Self, NicknameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(NicknameError::Empty);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the nickname as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Nickname {
    type Err = NicknameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(Nickname::parse("\tAoi\n").unwrap().as_str(), "Aoi");
    }

    #[test]
    fn test_parse_empty_and_whitespace() {
        assert_eq!(Nickname::parse(""), Err(NicknameError::Empty));
        assert_eq!(Nickname::parse(" \u{3000} "), Err(NicknameError::Empty));
    }

    #[test]
    fn test_parse_accepts_long_names() {
        let name = "あ".repeat(200);
        assert_eq!(Nickname::parse(&format!(" {name} ")).unwrap().as_str(), name);
    }

    #[test]
    fn test_serde_is_transparent() {
        let nickname = Nickname::parse("もりえみ").unwrap();
        assert_eq!(serde_json::to_string(&nickname).unwrap(), "\"もりえみ\"");
    }
}
