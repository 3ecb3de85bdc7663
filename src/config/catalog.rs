//! The fixed catalog of recognized settings.
//!
//! Every setting the launcher understands is declared here, with its default
//! value and the validator run against overlay values. Names are lowercase;
//! overlay sources are matched case-insensitively against them.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::ConfigError;

/// Log levels accepted by the `loglevel` setting.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A configuration value after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// String-typed setting.
    Str(String),
    /// Integer-typed setting.
    Int(i64),
}

impl Value {
    /// The string content, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// The integer content, if this is an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(_) => None,
        }
    }
}

/// Validation rule applied to a raw overlay value before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// A `host:port` string with a valid port.
    Address,
    /// An integer strictly greater than zero.
    PositiveInt,
    /// An integer greater than or equal to zero.
    NonNegativeInt,
    /// One of [`LOG_LEVELS`], matched case-insensitively and stored lowercase.
    LogLevel,
    /// Any string.
    Str,
}

impl Validator {
    /// Check `raw` and produce the normalized stored value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] naming `key` and the rejected
    /// value when `raw` does not satisfy this rule.
    pub fn check(self, key: &str, raw: &toml::Value) -> Result<Value, ConfigError> {
        match self {
            Self::Address => match raw.as_str() {
                Some(s) if is_address(s) => Ok(Value::Str(s.to_string())),
                _ => Err(ConfigError::invalid(key, raw)),
            },
            Self::PositiveInt => match raw.as_integer() {
                Some(n) if n > 0 => Ok(Value::Int(n)),
                _ => Err(ConfigError::invalid(key, raw)),
            },
            Self::NonNegativeInt => match raw.as_integer() {
                Some(n) if n >= 0 => Ok(Value::Int(n)),
                _ => Err(ConfigError::invalid(key, raw)),
            },
            Self::LogLevel => match raw.as_str() {
                Some(s) if LOG_LEVELS.contains(&s.to_lowercase().as_str()) => {
                    Ok(Value::Str(s.to_lowercase()))
                }
                _ => Err(ConfigError::invalid(key, raw)),
            },
            Self::Str => match raw.as_str() {
                Some(s) => Ok(Value::Str(s.to_string())),
                None => Err(ConfigError::invalid(key, raw)),
            },
        }
    }
}

/// `host:port` where the port parses as a u16 and the host is non-empty.
fn is_address(s: &str) -> bool {
    s.rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
}

/// One recognized setting: the catalog default and the validation rule.
#[derive(Debug, Clone)]
pub struct Setting {
    /// Value every configuration starts from.
    pub default: Value,
    /// Rule overlay values must satisfy.
    pub validator: Validator,
}

impl Setting {
    fn str(default: &str, validator: Validator) -> Self {
        Self {
            default: Value::Str(default.to_string()),
            validator,
        }
    }

    const fn int(default: i64, validator: Validator) -> Self {
        Self {
            default: Value::Int(default),
            validator,
        }
    }
}

/// The recognized setting catalog. Fixed for the lifetime of the process.
#[must_use]
pub fn catalog() -> &'static BTreeMap<&'static str, Setting> {
    static CATALOG: Lazy<BTreeMap<&'static str, Setting>> = Lazy::new(|| {
        BTreeMap::from([
            ("bind", Setting::str("127.0.0.1:8000", Validator::Address)),
            ("backlog", Setting::int(2048, Validator::PositiveInt)),
            ("workers", Setting::int(1, Validator::PositiveInt)),
            (
                "worker_connections",
                Setting::int(1000, Validator::PositiveInt),
            ),
            ("timeout", Setting::int(30, Validator::PositiveInt)),
            ("graceful_timeout", Setting::int(30, Validator::PositiveInt)),
            ("keepalive", Setting::int(2, Validator::NonNegativeInt)),
            ("loglevel", Setting::str("info", Validator::LogLevel)),
            // Empty means "derive from the discovered settings module".
            ("proc_name", Setting::str("", Validator::Str)),
            // Empty disables the pid file.
            ("pidfile", Setting::str("", Validator::Str)),
        ])
    });
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_expected_defaults() {
        let cat = catalog();
        assert_eq!(
            cat["bind"].default,
            Value::Str("127.0.0.1:8000".to_string())
        );
        assert_eq!(cat["workers"].default, Value::Int(1));
        assert_eq!(cat["loglevel"].default, Value::Str("info".to_string()));
    }

    #[test]
    fn test_catalog_keys_are_lowercase() {
        for key in catalog().keys() {
            assert_eq!(*key, key.to_lowercase());
        }
    }

    #[test]
    fn test_address_accepts_host_port() {
        let raw = toml::Value::String("0.0.0.0:9000".to_string());
        let value = Validator::Address.check("bind", &raw).unwrap();
        assert_eq!(value, Value::Str("0.0.0.0:9000".to_string()));
    }

    #[test]
    fn test_address_accepts_hostname_and_ipv6() {
        for addr in ["localhost:8000", "[::1]:8000"] {
            let raw = toml::Value::String(addr.to_string());
            assert!(Validator::Address.check("bind", &raw).is_ok(), "{addr}");
        }
    }

    #[test]
    fn test_address_rejects_missing_or_bad_port() {
        for addr in ["127.0.0.1", "127.0.0.1:", "127.0.0.1:notaport", ":8000"] {
            let raw = toml::Value::String(addr.to_string());
            assert!(Validator::Address.check("bind", &raw).is_err(), "{addr}");
        }
    }

    #[test]
    fn test_address_rejects_non_string() {
        let raw = toml::Value::Integer(8000);
        let err = Validator::Address.check("bind", &raw).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for bind: 8000");
    }

    #[test]
    fn test_positive_int_rejects_string() {
        let raw = toml::Value::String("not-a-number".to_string());
        let err = Validator::PositiveInt.check("workers", &raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for workers: \"not-a-number\""
        );
    }

    #[test]
    fn test_positive_int_rejects_zero_and_negative() {
        for n in [0, -1] {
            let raw = toml::Value::Integer(n);
            assert!(Validator::PositiveInt.check("workers", &raw).is_err());
        }
    }

    #[test]
    fn test_non_negative_int_accepts_zero() {
        let raw = toml::Value::Integer(0);
        let value = Validator::NonNegativeInt.check("keepalive", &raw).unwrap();
        assert_eq!(value, Value::Int(0));
    }

    #[test]
    fn test_log_level_is_case_insensitive_and_normalized() {
        let raw = toml::Value::String("WARN".to_string());
        let value = Validator::LogLevel.check("loglevel", &raw).unwrap();
        assert_eq!(value, Value::Str("warn".to_string()));
    }

    #[test]
    fn test_log_level_rejects_unknown() {
        let raw = toml::Value::String("verbose".to_string());
        assert!(Validator::LogLevel.check("loglevel", &raw).is_err());
    }

    #[test]
    fn test_str_rejects_non_string() {
        let raw = toml::Value::Boolean(true);
        assert!(Validator::Str.check("proc_name", &raw).is_err());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Str("x".to_string()).as_str(), Some("x"));
        assert_eq!(Value::Str("x".to_string()).as_int(), None);
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Int(7).as_str(), None);
    }
}
