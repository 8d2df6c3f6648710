//! Gaussian blur operator.

use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::Lazy;

use crate::core::context::PipelineContext;
use crate::core::errors::{OpixError, OpixResult};
use crate::core::operator::{Operator, OperatorSpec, ParameterSet};
use crate::core::registry::OperatorFactory;
use crate::params::spec::ParameterSpec;
use crate::vision;

static SPEC: Lazy<Arc<OperatorSpec>> = Lazy::new(|| {
    OperatorSpec::builder("GaussianBlur")
        .parameter("kernel_size", ParameterSpec::integer(1, 31, 3))
        .parameter("sigma", ParameterSpec::double(0.0, 10.0, 0.0))
        .build()
        .expect("GaussianBlur spec is well-formed")
});

/// Smooths the image with a Gaussian kernel.
///
/// `kernel_size` must be odd (an operator-level invariant on top of the
/// spec's integer domain). A `sigma` of zero derives the deviation from the
/// kernel size.
pub struct GaussianBlur {
    params: ParameterSet,
}

impl GaussianBlur {
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

impl Default for GaussianBlur {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for GaussianBlur {
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
        let kernel_size = self.params.integer("kernel_size")?;
        if kernel_size % 2 == 0 {
            return Err(OpixError::parameter(
                "kernel_size",
                format!("must be odd, got {kernel_size}"),
            ));
        }
        Ok(())
    }

    fn apply(
        &self,
        image: &DynamicImage,
        _ctx: &mut PipelineContext,
    ) -> OpixResult<DynamicImage> {
        let kernel_size = self.params.integer("kernel_size")?;
        let sigma = self.params.double("sigma")? as f32;
        let sigma = if sigma > 0.0 {
            sigma
        } else {
            vision::sigma_for_kernel(kernel_size)
        };
        vision::gaussian_blur(image, sigma).map_err(|e| OpixError::operation("GaussianBlur", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::spec::ParamValue;
    use crate::testkit;

    #[test]
    fn blurs_with_defaults() {
        let op = GaussianBlur::new();
        let img = testkit::rgb_test_image(16, 16);
        let mut ctx = PipelineContext::new(img.clone());
        let out = op.run(&img, &mut ctx).unwrap();
        assert!(testkit::is_valid_image(&out));
        assert_eq!((out.width(), out.height()), (img.width(), img.height()));
    }

    #[test]
    fn even_kernel_size_fails_the_odd_invariant() {
        // In-domain for the integer spec [1, 31], rejected by the operator.
        let mut op = GaussianBlur::new();
        op.params_mut()
            .set("kernel_size", ParamValue::Integer(4))
            .unwrap();
        let img = testkit::gray_test_image(8, 8);
        let mut ctx = PipelineContext::new(img.clone());
        let err = op.run(&img, &mut ctx).unwrap_err();
        match err {
            OpixError::ParameterValidation { parameter, message } => {
                assert_eq!(parameter, "kernel_size");
                assert!(message.contains("odd"));
            }
            other => panic!("expected ParameterValidation, got {other:?}"),
        }
    }

    #[test]
    fn accepts_gray_and_rgb_inputs() {
        let op = GaussianBlur::new();
        for img in [testkit::gray_test_image(8, 8), testkit::rgb_test_image(8, 8)] {
            let mut ctx = PipelineContext::new(img.clone());
            let out = op.run(&img, &mut ctx).unwrap();
            assert_eq!(
                out.color().channel_count(),
                img.color().channel_count()
            );
        }
    }
}
