//! Small helpers for reading typed settings from the process environment.
//!
//! Unset or unparseable values fall back to the supplied default, which keeps
//! every `Config::load` a flat list of `var = default` pairs.

use std::str::FromStr;

/// Read `key` and parse it, falling back to `default`.
pub fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read `key` as a string, falling back to `default`.
pub fn string_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read `key` as a non-empty string.
pub fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First non-empty value among `keys`, in order.
pub fn first_non_empty(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| non_empty(key))
}
