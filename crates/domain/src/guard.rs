//! Precondition checks used by factories before constructing an object.
//!
//! Each check returns the checked value on success so factories can chain
//! them with `?`. Checks on [`serde_json::Value`] validate open-ended props
//! at the boundary; the typed variants cover native arguments.

use serde_json::{Map, Value};
use thiserror::Error;

/// A violated precondition, naming the offending argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("{argument} is null or undefined")]
    Missing { argument: String },

    #[error("{argument} is not a string")]
    NotAString { argument: String },

    #[error("{argument} is an empty string")]
    EmptyString { argument: String },

    #[error("{argument} is not an array")]
    NotAnArray { argument: String },

    #[error("{argument} is an empty array")]
    EmptyArray { argument: String },

    #[error("{argument} is not a number")]
    NotANumber { argument: String },

    #[error("{argument} is not within range {min} to {max}")]
    OutOfRange {
        argument: String,
        min: String,
        max: String,
    },

    #[error("{argument} is not an object")]
    NotAnObject { argument: String },
}

impl GuardError {
    /// Returns the name of the argument that failed the check.
    pub fn argument(&self) -> &str {
        match self {
            GuardError::Missing { argument }
            | GuardError::NotAString { argument }
            | GuardError::EmptyString { argument }
            | GuardError::NotAnArray { argument }
            | GuardError::EmptyArray { argument }
            | GuardError::NotANumber { argument }
            | GuardError::OutOfRange { argument, .. }
            | GuardError::NotAnObject { argument } => argument,
        }
    }
}

/// Result type for guard checks.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Rejects an absent argument.
pub fn against_none<T>(argument: Option<T>, argument_name: &str) -> Result<T> {
    argument.ok_or_else(|| GuardError::Missing {
        argument: argument_name.to_string(),
    })
}

/// Rejects an absent or JSON `null` argument.
pub fn against_null<'a>(argument: Option<&'a Value>, argument_name: &str) -> Result<&'a Value> {
    match argument {
        None | Some(Value::Null) => Err(GuardError::Missing {
            argument: argument_name.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

/// Rejects a string that is empty after trimming.
pub fn against_blank<'a>(argument: &'a str, argument_name: &str) -> Result<&'a str> {
    if argument.trim().is_empty() {
        return Err(GuardError::EmptyString {
            argument: argument_name.to_string(),
        });
    }
    Ok(argument)
}

/// Rejects a value that is not a string or is blank.
pub fn against_empty_string<'a>(argument: &'a Value, argument_name: &str) -> Result<&'a str> {
    let text = argument.as_str().ok_or_else(|| GuardError::NotAString {
        argument: argument_name.to_string(),
    })?;
    against_blank(text, argument_name)
}

/// Rejects an empty slice.
pub fn against_empty<'a, T>(argument: &'a [T], argument_name: &str) -> Result<&'a [T]> {
    if argument.is_empty() {
        return Err(GuardError::EmptyArray {
            argument: argument_name.to_string(),
        });
    }
    Ok(argument)
}

/// Rejects a value that is not an array or has no elements.
pub fn against_empty_array<'a>(argument: &'a Value, argument_name: &str) -> Result<&'a [Value]> {
    let items = argument.as_array().ok_or_else(|| GuardError::NotAnArray {
        argument: argument_name.to_string(),
    })?;
    against_empty(items, argument_name)
}

/// Rejects a value outside the inclusive range `[min, max]`.
///
/// Values that are not comparable with the bounds (e.g. `NaN`) are rejected.
pub fn within<T>(argument: T, min: T, max: T, argument_name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if !(min..=max).contains(&argument) {
        return Err(GuardError::OutOfRange {
            argument: argument_name.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(argument)
}

/// Rejects a value that is not a number or lies outside `[min, max]`.
pub fn in_range(argument: &Value, min: f64, max: f64, argument_name: &str) -> Result<f64> {
    let number = argument.as_f64().ok_or_else(|| GuardError::NotANumber {
        argument: argument_name.to_string(),
    })?;
    within(number, min, max, argument_name)
}

/// Rejects a value that is not a string-keyed map.
pub fn against_non_object<'a>(
    argument: &'a Value,
    argument_name: &str,
) -> Result<&'a Map<String, Value>> {
    argument.as_object().ok_or_else(|| GuardError::NotAnObject {
        argument: argument_name.to_string(),
    })
}
