//! Parameter specifications and derived test-generation strategies.

pub mod spec;
pub mod strategy;

pub use spec::{ParamKind, ParamValue, ParameterSpec};
pub use strategy::{derive_strategy, derive_value_strategy, ParameterAssignment};
