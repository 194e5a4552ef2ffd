//! Environment variable parsing with type safety.
//!
//! Provides a type-safe parser for relay configuration variables with
//! validation, error collection, and source tracking. Values are looked up
//! in an optional overrides map first (populated from local `.tfvars` /
//! `.env` files) and then in the process environment.

use super::source::{ConfigSource, Sourced};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// Required variable is unset or blank.
    #[error("Missing required environment variable: {var}")]
    Missing { var: String },

    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Value out of valid range.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

impl EnvError {
    /// Name of the variable this error refers to.
    pub fn var(&self) -> &str {
        match self {
            Self::Missing { var }
            | Self::InvalidValue { var, .. }
            | Self::OutOfRange { var, .. }
            | Self::InvalidLogLevel { var, .. } => var,
        }
    }
}

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    overrides: HashMap<String, String>,
    errors: Vec<EnvError>,
}

impl EnvParser {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Consult `overrides` before the process environment.
    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Get all accumulated errors.
    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn lookup(&self, var_name: &str) -> Option<(String, ConfigSource)> {
        if let Some(value) = self.overrides.get(var_name) {
            return Some((value.clone(), ConfigSource::File));
        }
        env::var(var_name)
            .ok()
            .map(|value| (value, ConfigSource::Environment))
    }

    fn found<T>(value: T, var_name: String, source: ConfigSource) -> Sourced<T> {
        match source {
            ConfigSource::File => Sourced::from_file(value, var_name),
            _ => Sourced::from_env(value, var_name),
        }
    }

    /// Get a required, non-blank string. Records `Missing` otherwise.
    pub fn require_string(&mut self, name: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some((value, source)) if !value.trim().is_empty() => {
                Self::found(value, var_name, source)
            }
            _ => {
                self.errors.push(EnvError::Missing { var: var_name });
                Sourced::default_value(String::new())
            }
        }
    }

    /// Get a string value with default.
    pub fn get_string(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some((value, source)) => Self::found(value, var_name, source),
            None => Sourced::default_value(default.to_string()),
        }
    }

    /// Get a boolean value with default.
    ///
    /// Accepts: 1, true, yes, on (for true)
    ///          0, false, no, off, "" (for false)
    pub fn get_bool(&mut self, name: &str, default: bool) -> Sourced<bool> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some((value, source)) => {
                let parsed = match value.to_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => true,
                    "0" | "false" | "no" | "off" | "" => false,
                    _ => {
                        self.errors.push(EnvError::InvalidValue {
                            var: var_name.clone(),
                            expected: "boolean (true/false/1/0/yes/no)".to_string(),
                            value: value.clone(),
                        });
                        default
                    }
                };
                Self::found(parsed, var_name, source)
            }
            None => Sourced::default_value(default),
        }
    }

    fn get_number_range<T>(
        &mut self,
        name: &str,
        default: T,
        min: T,
        max: T,
        expected: &str,
    ) -> Sourced<T>
    where
        T: FromStr + PartialOrd + Copy + ToString,
    {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some((value, source)) => match value.trim().parse::<T>() {
                Ok(n) if n >= min && n <= max => Self::found(n, var_name, source),
                Ok(n) => {
                    self.errors.push(EnvError::OutOfRange {
                        var: var_name.clone(),
                        value: n.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                    Self::found(default, var_name, source)
                }
                Err(_) => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name,
                        expected: expected.to_string(),
                        value,
                    });
                    Sourced::default_value(default)
                }
            },
            None => Sourced::default_value(default),
        }
    }

    /// Get a u16 value with default and range validation.
    pub fn get_u16_range(&mut self, name: &str, default: u16, min: u16, max: u16) -> Sourced<u16> {
        self.get_number_range(name, default, min, max, "unsigned 16-bit integer")
    }

    /// Get a u32 value with default and range validation.
    pub fn get_u32_range(&mut self, name: &str, default: u32, min: u32, max: u32) -> Sourced<u32> {
        self.get_number_range(name, default, min, max, "unsigned 32-bit integer")
    }

    /// Get a u64 value with default and range validation.
    pub fn get_u64_range(&mut self, name: &str, default: u64, min: u64, max: u64) -> Sourced<u64> {
        self.get_number_range(name, default, min, max, "unsigned 64-bit integer")
    }

    /// Get an i32 value with default and range validation.
    pub fn get_i32_range(&mut self, name: &str, default: i32, min: i32, max: i32) -> Sourced<i32> {
        self.get_number_range(name, default, min, max, "signed 32-bit integer")
    }

    /// Get a required u16 (e.g. a port). Records `Missing` when unset.
    pub fn require_u16(&mut self, name: &str) -> Sourced<u16> {
        let var_name = self.var_name(name);
        if self
            .lookup(&var_name)
            .is_none_or(|(value, _)| value.trim().is_empty())
        {
            self.errors.push(EnvError::Missing { var: var_name });
            return Sourced::default_value(0);
        }
        self.get_u16_range(name, 0, 1, u16::MAX)
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some((value, source)) => {
                let lower = value.to_lowercase();
                match lower.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" | "off" => {
                        Self::found(lower, var_name, source)
                    }
                    _ => {
                        self.errors.push(EnvError::InvalidLogLevel {
                            var: var_name.clone(),
                            value: value.clone(),
                        });
                        Self::found(default.to_string(), var_name, source)
                    }
                }
            }
            None => Sourced::default_value(default.to_string()),
        }
    }

    /// Get a comma-separated list of strings.
    pub fn get_string_list(&mut self, name: &str, default: Vec<String>) -> Sourced<Vec<String>> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some((value, source)) => Self::found(split_list(&value), var_name, source),
            None => Sourced::default_value(default),
        }
    }

    /// Get a required, non-empty comma-separated list.
    pub fn require_string_list(&mut self, name: &str) -> Sourced<Vec<String>> {
        let list = self.get_string_list(name, Vec::new());
        if list.value.is_empty() {
            self.errors.push(EnvError::Missing {
                var: self.var_name(name),
            });
        }
        list
    }

    /// Get an optional string (None if not set or empty).
    pub fn get_optional_string(&mut self, name: &str) -> Sourced<Option<String>> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some((value, source)) if value.is_empty() => Self::found(None, var_name, source),
            Some((value, source)) => Self::found(Some(value), var_name, source),
            None => Sourced::default_value(None),
        }
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
