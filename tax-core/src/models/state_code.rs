use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Two-letter uppercase postal code, e.g. `CA`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateCode(String);

impl StateCode {
    /// Normalises case and rejects anything that is not two ASCII letters.
    pub fn parse(code: &str) -> Result<Self, ConfigError> {
        let trimmed = code.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(ConfigError::InvalidStateCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StateCode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StateCode> for String {
    fn from(code: StateCode) -> Self {
        code.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_uppercases_and_trims() {
        assert_eq!(StateCode::parse(" ca ").unwrap().as_str(), "CA");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            StateCode::parse("CAL"),
            Err(ConfigError::InvalidStateCode("CAL".to_string()))
        );
    }

    #[test]
    fn parse_rejects_digits() {
        assert!(StateCode::parse("C1").is_err());
    }
}
