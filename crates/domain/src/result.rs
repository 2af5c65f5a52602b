//! Two-variant outcome helpers.
//!
//! The outcome type itself is [`std::result::Result`]: a value is either
//! `Ok(T)` or `Err(E)`, never both and never neither. This module adds the
//! checked construction from loose parts, guarded accessors and `combine`.

use thiserror::Error;

/// Contract violations when building or reading a result.
///
/// These signal a caller defect rather than a business failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultContractError {
    /// The parts handed to [`from_parts`] contradict each other.
    #[error("InvalidOperation: {0}")]
    InvalidConstruction(&'static str),

    /// The accessor does not match the variant held.
    #[error("{0}")]
    InvalidAccess(&'static str),
}

/// Creates a successful result.
pub fn ok<T, E>(value: T) -> Result<T, E> {
    Ok(value)
}

/// Creates a failed result.
pub fn fail<T, E>(error: E) -> Result<T, E> {
    Err(error)
}

/// Builds a result from optional parts, rejecting contradictory input.
///
/// Exactly one of `value` and `error` must be present. Use `Some(())` as the
/// value of a success without payload.
pub fn from_parts<T, E>(
    value: Option<T>,
    error: Option<E>,
) -> Result<Result<T, E>, ResultContractError> {
    match (value, error) {
        (Some(value), None) => Ok(Ok(value)),
        (None, Some(error)) => Ok(Err(error)),
        (Some(_), Some(_)) => Err(ResultContractError::InvalidConstruction(
            "A result cannot be successful and contain an error",
        )),
        (None, None) => Err(ResultContractError::InvalidConstruction(
            "A failing result must contain an error",
        )),
    }
}

/// Returns the first failure in iteration order, or `Ok(())` when none fails.
///
/// Iteration stops at the first failure; later results are never pulled from
/// the iterator.
pub fn combine<T, E, I>(results: I) -> Result<(), E>
where
    I: IntoIterator<Item = Result<T, E>>,
{
    for result in results {
        result?;
    }
    Ok(())
}

/// Guarded accessors over a result.
pub trait Outcome<T, E> {
    /// Returns true for a success.
    fn is_success(&self) -> bool;

    /// Returns true for a failure.
    fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Returns the success value, or `InvalidAccess` on a failure.
    fn value(&self) -> Result<&T, ResultContractError>;

    /// Returns the error, or `InvalidAccess` on a success.
    fn error(&self) -> Result<&E, ResultContractError>;
}

impl<T, E> Outcome<T, E> for Result<T, E> {
    fn is_success(&self) -> bool {
        self.is_ok()
    }

    fn value(&self) -> Result<&T, ResultContractError> {
        self.as_ref().map_err(|_| {
            ResultContractError::InvalidAccess(
                "Can't get the value of an error result. Use 'error' instead.",
            )
        })
    }

    fn error(&self) -> Result<&E, ResultContractError> {
        match self {
            Err(error) => Ok(error),
            Ok(_) => Err(ResultContractError::InvalidAccess(
                "Can't get the error of a successful result. Use 'value' instead.",
            )),
        }
    }
}
