//! The core module of the operator framework.
//!
//! This module contains the fundamental components of the framework:
//! - Error handling
//! - Capability settings (input preconditions)
//! - The operator contract and parameter storage
//! - The pipeline context side channel
//! - The process-wide operator registry
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod capability;
pub mod context;
pub mod errors;
pub mod operator;
pub mod registry;

pub use capability::Capability;
pub use context::{ContextScope, ContextValue, PipelineContext};
pub use errors::{OpixError, OpixResult};
pub use operator::{Operator, OperatorSpec, OperatorSpecBuilder, ParameterSet};
pub use registry::{OperatorFactory, OperatorRegistry};
