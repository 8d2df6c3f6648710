//! # opix
//!
//! A declarative framework for composing image-processing operators into
//! pipelines. Every operator self-describes its tunable parameters (type,
//! bounds, enumerated choices), so parameter values can be validated,
//! default-initialized, and automatically fuzzed by property-based test
//! strategies derived from the same specifications.
//!
//! ## Components
//!
//! * [`params`] - Parameter specifications and strategy derivation
//! * [`core`] - The operator contract, capabilities, context, and registry
//! * [`operators`] - Built-in operator roster
//! * [`vision`] - Thin primitives over the external vision crates
//! * [`testkit`] - Fixtures and image strategies for property tests
//!
//! ## Quick Start
//!
//! ```rust
//! use opix::prelude::*;
//!
//! # fn main() -> opix::core::OpixResult<()> {
//! let op = GaussianBlur::new();
//! let image = opix::testkit::gray_test_image(32, 32);
//! let mut ctx = PipelineContext::new(image.clone());
//!
//! let blurred = {
//!     let mut scope = ctx.scope("preprocess");
//!     op.run(&image, &mut scope)?
//! };
//! assert_eq!(blurred.color().channel_count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Derived fuzzing
//!
//! ```rust
//! use opix::prelude::*;
//! use opix::params::derive_strategy;
//!
//! let op = SimpleThreshold::new();
//! // One strategy per operator, no per-parameter generators by hand.
//! let _strategy = derive_strategy(op.spec().parameter_specs());
//! ```

pub mod core;
pub mod operators;
pub mod params;
pub mod testkit;
pub mod vision;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::core::{
        Capability, ContextValue, Operator, OperatorFactory, OperatorRegistry, OperatorSpec,
        OpixError, OpixResult, ParameterSet, PipelineContext,
    };
    pub use crate::operators::{
        AdaptiveThreshold, Clahe, ColorSpaceChange, FindContours, GaussianBlur, SimpleThreshold,
    };
    pub use crate::params::{
        derive_strategy, derive_value_strategy, ParamValue, ParameterAssignment, ParameterSpec,
    };
}

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
