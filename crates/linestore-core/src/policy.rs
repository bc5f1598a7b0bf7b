use std::fmt;
use std::str::FromStr;

use crate::StoreError;

/// A boolean policy toggle that may have been set from untyped input.
///
/// Assignment never fails. A value that is not recognizably true or false is
/// kept as `Invalid` and only rejected when an operation consults the flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PolicyFlag {
    Enabled,
    #[default]
    Disabled,
    Invalid(String),
}

impl PolicyFlag {
    /// The flag as a strict boolean, or `InvalidPolicyState` naming `flag`.
    pub fn resolve(&self, flag: &'static str) -> Result<bool, StoreError> {
        match self {
            Self::Enabled => Ok(true),
            Self::Disabled => Ok(false),
            Self::Invalid(value) => Err(StoreError::InvalidPolicyState {
                flag,
                value: value.clone(),
            }),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

impl From<bool> for PolicyFlag {
    fn from(value: bool) -> Self {
        if value {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl FromStr for PolicyFlag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flag = match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Self::Enabled,
            "false" | "0" | "no" | "off" => Self::Disabled,
            _ => Self::Invalid(s.to_string()),
        };
        Ok(flag)
    }
}

impl fmt::Display for PolicyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "true"),
            Self::Disabled => write!(f, "false"),
            Self::Invalid(raw) => write!(f, "{raw:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("True".parse::<PolicyFlag>().unwrap(), PolicyFlag::Enabled);
        assert_eq!(" off ".parse::<PolicyFlag>().unwrap(), PolicyFlag::Disabled);
        assert_eq!(
            "maybe".parse::<PolicyFlag>().unwrap(),
            PolicyFlag::Invalid("maybe".into())
        );
    }

    #[test]
    fn resolve_rejects_invalid() {
        let err = PolicyFlag::Invalid("2".into()).resolve("unique").unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidPolicyState { flag: "unique", ref value } if value == "2"
        ));
        assert!(PolicyFlag::from(true).resolve("unique").unwrap());
    }
}
