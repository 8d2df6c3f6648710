//! Built-in operator roster.
//!
//! Each operator declares its parameters and capabilities through an
//! [`OperatorSpec`](crate::core::OperatorSpec) and registers under its spec
//! name via [`register_builtins`].

pub mod blur;
pub mod clahe;
pub mod color_space;
pub mod contours;
pub mod threshold;

pub use blur::GaussianBlur;
pub use clahe::Clahe;
pub use color_space::ColorSpaceChange;
pub use contours::FindContours;
pub use threshold::{AdaptiveThreshold, SimpleThreshold};

use crate::core::errors::OpixResult;
use crate::core::registry::{self, OperatorFactory};

/// Factories for every built-in operator type.
pub fn builtin_factories() -> Vec<OperatorFactory> {
    vec![
        GaussianBlur::factory(),
        Clahe::factory(),
        SimpleThreshold::factory(),
        AdaptiveThreshold::factory(),
        ColorSpaceChange::factory(),
        FindContours::factory(),
    ]
}

/// Registers every built-in operator in the process-wide registry.
///
/// Call once at startup. A second call is a configuration error, like any
/// other duplicate registration.
pub fn register_builtins() -> OpixResult<()> {
    for factory in builtin_factories() {
        registry::register(factory)?;
    }
    Ok(())
}
