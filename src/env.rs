use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{GenerateError, Result};

/// An immutable copy of the process environment.
///
/// Entries are kept sorted by name so that two runs over the same
/// environment iterate (and therefore render) identically.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment. Variables whose name or
    /// value is not valid unicode are skipped.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Returns the value only if it is set and not empty.
    pub fn get_nonempty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_nonempty(name).unwrap_or(default)
    }

    /// All variables whose name starts with `prefix`, in name order.
    pub fn prefixed<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.vars
            .iter()
            .filter(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Reads a boolean toggle. Unset or empty falls back to `default`;
    /// anything other than `true`/`false` (any case) is rejected.
    pub fn flag(&self, name: &str, default: bool) -> Result<bool> {
        match self.get_nonempty(name) {
            None => Ok(default),
            Some(v) => parse_bool(v).ok_or_else(|| GenerateError::InvalidEnumValue {
                variable: name.to_string(),
                value: v.to_string(),
                expected: "\"true\" or \"false\"",
            }),
        }
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// URL scheme the server is reachable under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// Where services send their logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    Stdout,
    Files,
}

/// The ungrouped control switches that pick template branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub protocol: Protocol,
    pub log_destination: LogDestination,
    pub enable_ipv6: bool,
}

impl Toggles {
    pub fn from_env(env: &EnvSnapshot) -> Result<Self> {
        let letsencrypt = env.flag("SEAFILE_SERVER_LETSENCRYPT", false)?;
        let force_https = env.flag("FORCE_HTTPS_IN_CONF", false)?;
        let protocol = if letsencrypt || force_https {
            Protocol::Https
        } else {
            Protocol::Http
        };

        let log_destination = if env.flag("SEAFILE_LOG_TO_STDOUT", false)? {
            LogDestination::Stdout
        } else {
            LogDestination::Files
        };

        Ok(Self {
            protocol,
            log_destination,
            enable_ipv6: env.flag("ENABLE_IPV6", true)?,
        })
    }

    pub fn log_to_stdout(&self) -> bool {
        self.log_destination == LogDestination::Stdout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_and_case() {
        let env = EnvSnapshot::from_pairs([("A", "TRUE"), ("B", "False"), ("C", "")]);
        assert!(env.flag("A", false).unwrap());
        assert!(!env.flag("B", true).unwrap());
        assert!(env.flag("C", true).unwrap());
        assert!(!env.flag("MISSING", false).unwrap());
    }

    #[test]
    fn test_flag_rejects_unknown_value() {
        let env = EnvSnapshot::from_pairs([("SEAFILE_LOG_TO_STDOUT", "yes")]);
        let err = env.flag("SEAFILE_LOG_TO_STDOUT", false).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidEnumValue { ref variable, .. } if variable == "SEAFILE_LOG_TO_STDOUT"));
    }

    #[test]
    fn test_toggles() {
        let env = EnvSnapshot::from_pairs([
            ("FORCE_HTTPS_IN_CONF", "true"),
            ("SEAFILE_LOG_TO_STDOUT", "true"),
            ("ENABLE_IPV6", "false"),
        ]);
        let toggles = Toggles::from_env(&env).unwrap();
        assert_eq!(toggles.protocol, Protocol::Https);
        assert!(toggles.log_to_stdout());
        assert!(!toggles.enable_ipv6);

        let toggles = Toggles::from_env(&EnvSnapshot::default()).unwrap();
        assert_eq!(toggles.protocol, Protocol::Http);
        assert_eq!(toggles.log_destination, LogDestination::Files);
        assert!(toggles.enable_ipv6);
    }

    #[test]
    fn test_prefixed_is_sorted() {
        let env = EnvSnapshot::from_pairs([("X__b", "2"), ("Y__a", "0"), ("X__a", "1")]);
        let keys: Vec<_> = env.prefixed("X__").map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["X__a", "X__b"]);
    }
}
