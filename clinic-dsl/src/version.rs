//! `[from M.N]` version gates

use crate::errors::{DslError, DslResult};
use serde::Serialize;
use std::fmt;

/// A `major.minor` release in which a parameter changes kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn parse(text: &str) -> DslResult<Self> {
        let illegal = || DslError::semantic(format!("Illegal version number: {:?}", text));
        let (major, minor) = text.trim().split_once('.').ok_or_else(illegal)?;
        let major = major.parse::<u32>().map_err(|_| illegal())?;
        let minor = minor.parse::<u32>().map_err(|_| illegal())?;
        Ok(Self { major, minor })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_order() {
        let v314 = Version::parse("3.14").unwrap();
        let v315 = Version::parse(" 3.15 ").unwrap();
        assert_eq!(v314, Version::new(3, 14));
        assert!(v314 < v315);
        assert_eq!(v315.to_string(), "3.15");
    }

    #[test]
    fn test_illegal_versions() {
        for text in ["3", "3.x", "", "3.14.1", "a.b"] {
            assert!(Version::parse(text).is_err(), "{text} should be rejected");
        }
    }
}
