//! Test harness surface: deterministic fixtures and image strategies.
//!
//! Together with [`derive_strategy`](crate::params::derive_strategy), these
//! helpers are sufficient to fuzz any registered operator without writing
//! per-parameter generators by hand.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;

/// Predicate for the "is a valid image" property: non-empty with a known
/// channel layout.
pub fn is_valid_image(image: &DynamicImage) -> bool {
    image.width() > 0
        && image.height() > 0
        && matches!(image.color().channel_count(), 1 | 2 | 3 | 4)
}

/// Deterministic single-channel gradient fixture.
pub fn gray_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
        Luma([((x * 7 + y * 13) % 256) as u8])
    }))
}

/// Deterministic three-channel gradient fixture.
pub fn rgb_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 5) % 256) as u8,
            ((y * 11) % 256) as u8,
            ((x + y) % 256) as u8,
        ])
    }))
}

/// Single-channel fixture with a solid foreground blob, for contour tests.
pub fn blob_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
        let inside = x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4;
        Luma([if inside { 255 } else { 0 }])
    }))
}

/// Strategy over small gray images of varying dimensions.
pub fn arbitrary_gray_image() -> BoxedStrategy<DynamicImage> {
    (4u32..32, 4u32..32)
        .prop_map(|(w, h)| gray_test_image(w, h))
        .boxed()
}

/// Strategy over small gray or RGB images of varying dimensions.
pub fn arbitrary_image() -> BoxedStrategy<DynamicImage> {
    (4u32..32, 4u32..32, any::<bool>())
        .prop_map(|(w, h, gray)| {
            if gray {
                gray_test_image(w, h)
            } else {
                rgb_test_image(w, h)
            }
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_valid_images() {
        assert!(is_valid_image(&gray_test_image(8, 8)));
        assert!(is_valid_image(&rgb_test_image(8, 8)));
        assert!(is_valid_image(&blob_test_image(8, 8)));
    }

    #[test]
    fn empty_image_is_invalid() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(!is_valid_image(&empty));
    }

    #[test]
    fn fixtures_have_expected_channel_counts() {
        assert_eq!(gray_test_image(4, 4).color().channel_count(), 1);
        assert_eq!(rgb_test_image(4, 4).color().channel_count(), 3);
    }
}
