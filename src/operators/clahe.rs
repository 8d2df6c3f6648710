//! Contrast-limited adaptive histogram equalization operator.

use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::Lazy;

use crate::core::capability::Capability;
use crate::core::context::PipelineContext;
use crate::core::errors::{OpixError, OpixResult};
use crate::core::operator::{Operator, OperatorSpec, ParameterSet};
use crate::core::registry::OperatorFactory;
use crate::params::spec::ParameterSpec;
use crate::vision;

static SPEC: Lazy<Arc<OperatorSpec>> = Lazy::new(|| {
    OperatorSpec::builder("Clahe")
        .parameter("clip_limit", ParameterSpec::double(1.0, 40.0, 2.0))
        .parameter("tile_grid_size", ParameterSpec::integer(1, 16, 8))
        .capability(Capability::grayscale_only())
        .build()
        .expect("Clahe spec is well-formed")
});

/// Equalizes local contrast over a tile grid, clipping each tile's
/// histogram at `clip_limit` to bound noise amplification.
pub struct Clahe {
    params: ParameterSet,
}

impl Clahe {
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

impl Default for Clahe {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Clahe {
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
        let clip_limit = self.params.double("clip_limit")?;
        let tile_grid_size = self.params.integer("tile_grid_size")? as u32;
        let out = vision::clahe(&image.to_luma8(), clip_limit, tile_grid_size)
            .map_err(|e| OpixError::operation("Clahe", e))?;
        Ok(DynamicImage::ImageLuma8(out))
    }
}
