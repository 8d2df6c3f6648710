//! Color-space conversion operator.

use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::Lazy;

use crate::core::context::PipelineContext;
use crate::core::errors::{OpixError, OpixResult};
use crate::core::operator::{Operator, OperatorSpec, ParameterSet};
use crate::core::registry::OperatorFactory;
use crate::params::spec::ParameterSpec;
use crate::vision::{self, ColorSpace};

static SPEC: Lazy<Arc<OperatorSpec>> = Lazy::new(|| {
    OperatorSpec::builder("ColorSpaceChange")
        .parameter("src", ParameterSpec::enumeration(["RGB", "GRAY"], "RGB"))
        .parameter("target", ParameterSpec::enumeration(["RGB", "GRAY"], "GRAY"))
        .build()
        .expect("ColorSpaceChange spec is well-formed")
});

/// Converts the image between RGB and grayscale.
///
/// This operator's documented purpose is to change the channel layout, so
/// the output shape follows `target` rather than the input. The declared
/// `src` must match the actual input; a mismatch is a validation failure on
/// `src`, never an implicit conversion.
pub struct ColorSpaceChange {
    params: ParameterSet,
}

impl ColorSpaceChange {
    /// Creates an instance with default parameter values.
    pub fn new() -> Self {
        Self {
            params: ParameterSet::new(SPEC.clone()),
        }
    }

    /// Registry factory for this operator type.
    pub fn factory() -> OperatorFactory {
        OperatorFactory::new(SPEC.clone(), || Box::new(Self::new()))
    }
}

impl Default for ColorSpaceChange {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for ColorSpaceChange {
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
        let src = ColorSpace::from_name(self.params.choice("src")?)
            .map_err(|e| OpixError::operation("ColorSpaceChange", e))?;
        let target = ColorSpace::from_name(self.params.choice("target")?)
            .map_err(|e| OpixError::operation("ColorSpaceChange", e))?;

        let actual = image.color().channel_count();
        if actual != src.channels() {
            return Err(OpixError::parameter(
                "src",
                format!(
                    "declared {} ({} channels) but image has {actual} channels",
                    self.params.choice("src")?,
                    src.channels()
                ),
            ));
        }

        vision::convert_color(image, target).map_err(|e| OpixError::operation("ColorSpaceChange", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::spec::ParamValue;
    use crate::testkit;

    #[test]
    fn converts_rgb_to_gray_by_default() {
        let op = ColorSpaceChange::new();
        let img = testkit::rgb_test_image(8, 8);
        let mut ctx = PipelineContext::new(img.clone());
        let out = op.run(&img, &mut ctx).unwrap();
        assert_eq!(out.color().channel_count(), 1);
    }

    #[test]
    fn converts_gray_to_rgb() {
        let mut op = ColorSpaceChange::new();
        op.params_mut()
            .set("src", ParamValue::Enum("GRAY".to_string()))
            .unwrap();
        op.params_mut()
            .set("target", ParamValue::Enum("RGB".to_string()))
            .unwrap();
        let img = testkit::gray_test_image(8, 8);
        let mut ctx = PipelineContext::new(img.clone());
        let out = op.run(&img, &mut ctx).unwrap();
        assert_eq!(out.color().channel_count(), 3);
    }

    #[test]
    fn src_mismatch_names_the_parameter() {
        let mut op = ColorSpaceChange::new();
        op.params_mut()
            .set("src", ParamValue::Enum("GRAY".to_string()))
            .unwrap();
        let img = testkit::rgb_test_image(8, 8);
        let mut ctx = PipelineContext::new(img.clone());
        match op.run(&img, &mut ctx).unwrap_err() {
            OpixError::ParameterValidation { parameter, message } => {
                assert_eq!(parameter, "src");
                assert!(message.contains("3 channels"));
            }
            other => panic!("expected ParameterValidation, got {other:?}"),
        }
    }
}
