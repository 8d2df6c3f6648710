//! Capability settings: named preconditions on operator input images.
//!
//! A capability is declared once per operator type and evaluated against the
//! input image before `run` executes any transformation. A violated
//! capability fails with a precondition error naming the capability; the
//! framework never coerces the image to satisfy one.

use std::sync::Arc;

use image::DynamicImage;

use crate::core::errors::{OpixError, OpixResult};

/// A named precondition over an input image.
///
/// Capabilities are cheap to clone and shared by all instances of an
/// operator type.
#[derive(Clone)]
pub struct Capability {
    name: String,
    description: String,
    predicate: Arc<dyn Fn(&DynamicImage) -> bool + Send + Sync>,
}

impl Capability {
    /// Creates a capability from a name, a description of what it requires,
    /// and a predicate over the input image.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        predicate: impl Fn(&DynamicImage) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// The built-in "grayscale-only" capability: the input image must be
    /// single-channel.
    pub fn grayscale_only() -> Self {
        Self::new(
            "grayscale_only",
            "input image must be single-channel",
            |image| image.color().channel_count() == 1,
        )
    }

    /// Returns the capability's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the capability's requirement description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluates the capability against `image`.
    ///
    /// # Errors
    ///
    /// Returns a precondition error naming this capability if the predicate
    /// is not satisfied.
    pub fn check(&self, image: &DynamicImage) -> OpixResult<()> {
        if (self.predicate)(image) {
            Ok(())
        } else {
            Err(OpixError::precondition(
                &self.name,
                format!(
                    "{} (image has {} channels)",
                    self.description,
                    image.color().channel_count()
                ),
            ))
        }
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, RgbImage};

    #[test]
    fn grayscale_only_accepts_single_channel() {
        let cap = Capability::grayscale_only();
        let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        assert!(cap.check(&gray).is_ok());
    }

    #[test]
    fn grayscale_only_rejects_three_channels() {
        let cap = Capability::grayscale_only();
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let err = cap.check(&rgb).unwrap_err();
        match err {
            OpixError::Precondition { capability, message } => {
                assert_eq!(capability, "grayscale_only");
                assert!(message.contains("3 channels"));
            }
            other => panic!("expected Precondition error, got {other:?}"),
        }
    }
}
