//! # Configuration Helpers
//!
//! Value parsing shared by the `from_vars` loaders in every crate. A
//! variable that is present but invalid is always an error; only an absent
//! variable falls back to its default.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::time::Duration;

/// Parse a whole, positive number of seconds
pub fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError(format!("{key} must be a positive number of seconds")))
}

/// Parse a finite number greater than zero (rates, ceilings)
pub fn parse_positive(key: &str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| ConfigError(format!("{key} must be a positive number, got {raw:?}")))
}

/// Key lookup over a fixed set of pairs instead of the process environment
pub fn vars_from_pairs(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("T", " 15 "), Ok(Duration::from_secs(15)));
        for raw in ["0", "-1", "1.5", "soon", ""] {
            assert!(parse_secs("T", raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("RATE", "3.65"), Ok(3.65));
        for raw in ["0", "-3.7", "4.1x", "NaN", "inf", ""] {
            let err = parse_positive("RATE", raw).unwrap_err();
            assert!(err.0.starts_with("RATE"));
        }
    }

    #[test]
    fn test_vars_from_pairs() {
        let get = vars_from_pairs(&[("HOST", "0.0.0.0")]);
        assert_eq!(get("HOST").as_deref(), Some("0.0.0.0"));
        assert_eq!(get("PORT"), None);
    }
}
