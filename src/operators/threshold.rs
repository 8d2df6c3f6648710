//! Global and adaptive threshold operators.

use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::Lazy;

use crate::core::capability::Capability;
use crate::core::context::PipelineContext;
use crate::core::errors::{OpixError, OpixResult};
use crate::core::operator::{Operator, OperatorSpec, ParameterSet};
use crate::core::registry::OperatorFactory;
use crate::params::spec::ParameterSpec;
use crate::vision::{self, AdaptiveMethod, ThresholdKind};

static SIMPLE_SPEC: Lazy<Arc<OperatorSpec>> = Lazy::new(|| {
    OperatorSpec::builder("SimpleThreshold")
        .parameter(
            "threshold_type",
            ParameterSpec::enumeration(
                ["BINARY", "BINARY_INV", "TRUNC", "TOZERO", "TOZERO_INV"],
                "BINARY",
            ),
        )
        .parameter("otsu", Ok(ParameterSpec::boolean(false)))
        .parameter("threshold_value", ParameterSpec::integer(0, 255, 127))
        .parameter("max_value", ParameterSpec::integer(0, 255, 255))
        .capability(Capability::grayscale_only())
        .build()
        .expect("SimpleThreshold spec is well-formed")
});

/// Applies one global threshold rule to every pixel. With `otsu`, the
/// threshold value is computed from the image instead of the parameter.
pub struct SimpleThreshold {
    params: ParameterSet,
}

impl SimpleThreshold {
    /// Creates an instance with default parameter values.
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(SIMPLE_SPEC.clone()),
        }
    }

    /// Registry factory for this operator type.
    pub fn factory() -> OperatorFactory {
        OperatorFactory::new(SIMPLE_SPEC.clone(), || Box::new(Self::new()))
    }
}

impl Default for SimpleThreshold {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for SimpleThreshold {
    fn spec(&self) -> &Arc<OperatorSpec> {
        self.params.spec()
    }

    fn params(&self) -> &ParameterSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn apply(
        &self,
        image: &DynamicImage,
        _ctx: &mut PipelineContext,
    ) -> OpixResult<DynamicImage> {
        let kind = ThresholdKind::from_name(self.params.choice("threshold_type")?)
            .map_err(|e| OpixError::operation("SimpleThreshold", e))?;
        let otsu = self.params.boolean("otsu")?;
        let value = self.params.integer("threshold_value")? as u8;
        let max_value = self.params.integer("max_value")? as u8;

        let out = vision::threshold(&image.to_luma8(), kind, value, max_value, otsu)
            .map_err(|e| OpixError::operation("SimpleThreshold", e))?;
        Ok(DynamicImage::ImageLuma8(out))
    }
}

static ADAPTIVE_SPEC: Lazy<Arc<OperatorSpec>> = Lazy::new(|| {
    OperatorSpec::builder("AdaptiveThreshold")
        .parameter(
            "adaptive_method",
            ParameterSpec::enumeration(["MEAN", "GAUSSIAN"], "MEAN"),
        )
        .parameter(
            "threshold_type",
            ParameterSpec::enumeration(["BINARY", "BINARY_INV"], "BINARY"),
        )
        .parameter("block_size", ParameterSpec::integer(3, 31, 11))
        .parameter("c", ParameterSpec::integer(-20, 20, 2))
        .parameter("max_value", ParameterSpec::integer(0, 255, 255))
        .capability(Capability::grayscale_only())
        .build()
        .expect("AdaptiveThreshold spec is well-formed")
});

/// Thresholds each pixel against its local neighborhood statistic.
///
/// `block_size` must be odd (an operator-level invariant on top of the
/// spec's integer domain).
pub struct AdaptiveThreshold {
    params: ParameterSet,
}

impl AdaptiveThreshold {
    /// Creates an instance with default parameter values.
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(ADAPTIVE_SPEC.clone()),
        }
    }

    /// Registry factory for this operator type.
    pub fn factory() -> OperatorFactory {
        OperatorFactory::new(ADAPTIVE_SPEC.clone(), || Box::new(Self::new()))
    }
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for AdaptiveThreshold {
    fn spec(&self) -> &Arc<OperatorSpec> {
        self.params.spec()
    }

    fn params(&self) -> &ParameterSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn check_invariants(&self) -> OpixResult<()> {
        let block_size = self.params.integer("block_size")?;
        if block_size % 2 == 0 {
            return Err(OpixError::parameter(
                "block_size",
                format!("must be odd, got {block_size}"),
            ));
        }
        Ok(())
    }

    fn apply(
        &self,
        image: &DynamicImage,
        _ctx: &mut PipelineContext,
    ) -> OpixResult<DynamicImage> {
        let method = AdaptiveMethod::from_name(self.params.choice("adaptive_method")?)
            .map_err(|e| OpixError::operation("AdaptiveThreshold", e))?;
        let kind = ThresholdKind::from_name(self.params.choice("threshold_type")?)
            .map_err(|e| OpixError::operation("AdaptiveThreshold", e))?;
        let block_size = self.params.integer("block_size")? as u32;
        let c = self.params.integer("c")? as i32;
        let max_value = self.params.integer("max_value")? as u8;

        let out = vision::adaptive_threshold(
            &image.to_luma8(),
            method,
            kind,
            block_size,
            c,
            max_value,
        )
        .map_err(|e| OpixError::operation("AdaptiveThreshold", e))?;
        Ok(DynamicImage::ImageLuma8(out))
    }
}
