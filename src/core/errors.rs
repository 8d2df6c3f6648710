//! Error types for the operator framework.
//!
//! This module defines the error taxonomy used across the pipeline:
//! configuration errors raised at definition/registration time, precondition
//! and parameter-validation errors raised before any transformation runs, and
//! operation errors surfaced from the underlying vision primitives. It also
//! provides utility constructors for creating these errors with appropriate
//! context.

use thiserror::Error;

/// Enum representing the errors that can occur in the operator framework.
///
/// Every variant names the offending parameter, capability, or operator so
/// that callers never see a bare "invalid input" message.
#[derive(Error, Debug)]
pub enum OpixError {
    /// Error indicating a malformed definition: bad parameter spec bounds,
    /// an empty enum choice list, or a duplicate registry identity.
    ///
    /// Raised at definition/registration time, never during a pipeline run.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error indicating that an operator capability setting was violated by
    /// the input image.
    ///
    /// Raised before any transformation; the framework never coerces the
    /// image to satisfy a capability.
    #[error("precondition '{capability}' violated: {message}")]
    Precondition {
        /// The name of the violated capability.
        capability: String,
        /// A message describing the violation.
        message: String,
    },

    /// Error indicating that a parameter's current value fails its spec's
    /// domain check or an operator-level invariant.
    ///
    /// Raised before any transformation.
    #[error("parameter '{parameter}' invalid: {message}")]
    ParameterValidation {
        /// The name of the offending parameter.
        parameter: String,
        /// A message describing why the value is invalid.
        message: String,
    },

    /// Error from the underlying vision primitive.
    ///
    /// Propagated to the caller unchanged, never swallowed or downgraded.
    #[error("operation '{operator}' failed")]
    Operation {
        /// The name of the operator whose primitive failed.
        operator: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while loading or decoding an image fixture.
    #[error("image")]
    Image(#[from] image::ImageError),
}

/// Implementation of OpixError with utility functions for creating errors.
impl OpixError {
    /// Creates a configuration error with the given message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a precondition error naming the violated capability.
    pub fn precondition(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Precondition {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Creates a parameter validation error naming the offending parameter.
    pub fn parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParameterValidation {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Creates an operation error wrapping a vision primitive failure.
    pub fn operation(
        operator: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Operation {
            operator: operator.into(),
            source: Box::new(source),
        }
    }
}

/// Convenient result alias for framework operations.
pub type OpixResult<T> = Result<T, OpixError>;
