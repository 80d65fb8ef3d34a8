//! Lexicon specifiers of the form `id[:version]`.

use crate::error::{Result, WnEditError};
use std::fmt;
use std::str::FromStr;

/// Identifies a lexicon by id and, optionally, version.
///
/// A missing version (`"oewn"`), an empty one (`"oewn:"`) and the wildcard
/// (`"oewn:*"`) all mean "any installed version".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    pub id: String,
    pub version: Option<String>,
}

impl Specifier {
    pub fn new(id: &str, version: Option<&str>) -> Self {
        Specifier {
            id: id.to_string(),
            version: version.map(String::from),
        }
    }

    pub fn matches(&self, id: &str, version: &str) -> bool {
        self.id == id && self.version.as_deref().is_none_or(|v| v == version)
    }
}

impl FromStr for Specifier {
    type Err = WnEditError;

    fn from_str(s: &str) -> Result<Self> {
        let (id, version) = match s.split_once(':') {
            Some((id, version)) => (id.trim(), Some(version.trim())),
            None => (s.trim(), None),
        };
        if id.is_empty() {
            return Err(WnEditError::InvalidArgument(format!(
                "Invalid lexicon specifier '{}': missing lexicon id",
                s
            )));
        }
        let version = version.filter(|v| !v.is_empty() && *v != "*");
        Ok(Specifier::new(id, version))
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}", self.id, version),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_specifiers() {
        let spec: Specifier = "oewn:2024".parse().unwrap();
        assert_eq!(spec, Specifier::new("oewn", Some("2024")));
        assert_eq!(spec.to_string(), "oewn:2024");

        for any in ["oewn", "oewn:", "oewn:*"] {
            let spec: Specifier = any.parse().unwrap();
            assert_eq!(spec.version, None, "{}", any);
            assert_eq!(spec.to_string(), "oewn");
        }

        assert!(":1.0".parse::<Specifier>().is_err());
        assert!("".parse::<Specifier>().is_err());
    }

    #[test]
    fn test_matches() {
        let any: Specifier = "L:*".parse().unwrap();
        assert!(any.matches("L", "1.0"));
        assert!(any.matches("L", "2.0"));
        assert!(!any.matches("M", "1.0"));

        let exact: Specifier = "L:1.0".parse().unwrap();
        assert!(exact.matches("L", "1.0"));
        assert!(!exact.matches("L", "2.0"));
    }
}
