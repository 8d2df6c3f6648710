//! Contour extraction operator.

use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::Lazy;

use crate::core::capability::Capability;
use crate::core::context::{ContextValue, PipelineContext};
use crate::core::errors::{OpixError, OpixResult};
use crate::core::operator::{Operator, OperatorSpec, ParameterSet};
use crate::core::registry::OperatorFactory;
use crate::params::spec::ParameterSpec;
use crate::vision::{self, ContourMethod, ContourMode};

static SPEC: Lazy<Arc<OperatorSpec>> = Lazy::new(|| {
    OperatorSpec::builder("FindContours")
        .parameter("visual_feedback", Ok(ParameterSpec::boolean(false)))
        .parameter(
            "mode",
            ParameterSpec::enumeration(["TREE", "LIST", "EXTERNAL", "CCOMP"], "TREE"),
        )
        .parameter(
            "method",
            ParameterSpec::enumeration(["NONE", "SIMPLE"], "SIMPLE"),
        )
        .capability(Capability::grayscale_only())
        .build()
        .expect("FindContours spec is well-formed")
});

/// Extracts contours from a binary-ish grayscale image.
///
/// The detected contours, their hierarchy, and their centroids land in the
/// pipeline context under `contours`, `hierarchy`, and `centroids`; the
/// image passes through unchanged unless `visual_feedback` is set, in which
/// case the contours are drawn in green over an RGB copy.
pub struct FindContours {
    params: ParameterSet,
}

impl FindContours {
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

impl Default for FindContours {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for FindContours {
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
        ctx: &mut PipelineContext,
    ) -> OpixResult<DynamicImage> {
        let mode = ContourMode::from_name(self.params.choice("mode")?)
            .map_err(|e| OpixError::operation("FindContours", e))?;
        let method = ContourMethod::from_name(self.params.choice("method")?)
            .map_err(|e| OpixError::operation("FindContours", e))?;
        let visual_feedback = self.params.boolean("visual_feedback")?;

        let (contours, hierarchy) = vision::find_contours(&image.to_luma8(), mode, method)
            .map_err(|e| OpixError::operation("FindContours", e))?;

        ctx.add_info("contours", ContextValue::Contours(contours.clone()));
        ctx.add_info("hierarchy", ContextValue::IntList(hierarchy));
        ctx.add_info("centroids", ContextValue::Points(centroids(&contours)));

        if visual_feedback {
            Ok(DynamicImage::ImageRgb8(vision::draw_contours(
                image, &contours,
            )))
        } else {
            Ok(image.clone())
        }
    }
}

/// Mean point of each contour, rounded to pixel coordinates.
fn centroids(contours: &[Vec<(u32, u32)>]) -> Vec<(u32, u32)> {
    contours
        .iter()
        .filter(|points| !points.is_empty())
        .map(|points| {
            let n = points.len() as u64;
            let (sx, sy) = points.iter().fold((0u64, 0u64), |(sx, sy), &(x, y)| {
                (sx + u64::from(x), sy + u64::from(y))
            });
            ((sx / n) as u32, (sy / n) as u32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::spec::ParamValue;
    use crate::testkit;

    #[test]
    fn records_contours_and_hierarchy_in_context() {
        let op = FindContours::new();
        let img = testkit::blob_test_image(16, 16);
        let mut ctx = PipelineContext::new(img.clone());
        let out = op.run(&img, &mut ctx).unwrap();
        assert_eq!(out.color().channel_count(), 1);

        match ctx.info("contours") {
            Some(ContextValue::Contours(contours)) => assert!(!contours.is_empty()),
            other => panic!("expected contours entry, got {other:?}"),
        }
        assert!(matches!(
            ctx.info("hierarchy"),
            Some(ContextValue::IntList(_))
        ));
    }

    #[test]
    fn records_one_centroid_per_contour() {
        let op = FindContours::new();
        let img = testkit::blob_test_image(16, 16);
        let mut ctx = PipelineContext::new(img.clone());
        op.run(&img, &mut ctx).unwrap();

        let contour_count = match ctx.info("contours") {
            Some(ContextValue::Contours(contours)) => contours.len(),
            other => panic!("expected contours entry, got {other:?}"),
        };
        match ctx.info("centroids") {
            Some(ContextValue::Points(points)) => {
                assert_eq!(points.len(), contour_count);
                // The blob sits in the middle of the image.
                let (cx, cy) = points[0];
                assert!((4..12).contains(&cx) && (4..12).contains(&cy));
            }
            other => panic!("expected centroids entry, got {other:?}"),
        }
    }

    #[test]
    fn simple_method_yields_fewer_points_than_none() {
        let img = testkit::blob_test_image(16, 16);

        let count_points = |method: &str| {
            let mut op = FindContours::new();
            op.params_mut()
                .set("method", ParamValue::Enum(method.to_string()))
                .unwrap();
            let mut ctx = PipelineContext::new(img.clone());
            op.run(&img, &mut ctx).unwrap();
            match ctx.info("contours") {
                Some(ContextValue::Contours(contours)) => {
                    contours.iter().map(Vec::len).sum::<usize>()
                }
                other => panic!("expected contours entry, got {other:?}"),
            }
        };

        assert!(count_points("SIMPLE") < count_points("NONE"));
    }

    #[test]
    fn ccomp_mode_limits_hierarchy_to_two_levels() {
        let mut op = FindContours::new();
        op.params_mut()
            .set("mode", ParamValue::Enum("CCOMP".to_string()))
            .unwrap();
        let img = testkit::blob_test_image(16, 16);
        let mut ctx = PipelineContext::new(img.clone());
        op.run(&img, &mut ctx).unwrap();

        match ctx.info("hierarchy") {
            Some(ContextValue::IntList(parents)) => {
                // Every parent is a root: no chains deeper than two levels.
                for &p in parents {
                    if p != -1 {
                        assert_eq!(parents[p as usize], -1);
                    }
                }
            }
            other => panic!("expected hierarchy entry, got {other:?}"),
        }
    }

    #[test]
    fn visual_feedback_switches_to_rgb_output() {
        let mut op = FindContours::new();
        op.params_mut()
            .set("visual_feedback", ParamValue::Boolean(true))
            .unwrap();
        let img = testkit::blob_test_image(16, 16);
        let mut ctx = PipelineContext::new(img.clone());
        let out = op.run(&img, &mut ctx).unwrap();
        assert_eq!(out.color().channel_count(), 3);
    }

    #[test]
    fn rejects_color_input_without_touching_context() {
        let op = FindContours::new();
        let img = testkit::rgb_test_image(8, 8);
        let mut ctx = PipelineContext::new(img.clone());
        let err = op.run(&img, &mut ctx).unwrap_err();
        assert!(matches!(err, OpixError::Precondition { .. }));
        assert_eq!(ctx.entries().count(), 0);
    }

    #[test]
    fn scoped_run_prefixes_context_entries() {
        let op = FindContours::new();
        let img = testkit::blob_test_image(16, 16);
        let mut ctx = PipelineContext::new(img.clone());
        {
            let mut scope = ctx.scope("stage1");
            op.run(&img, &mut scope).unwrap();
        }
        assert!(ctx.info("stage1/contours").is_some());
        assert!(ctx.info("contours").is_none());
    }
}
