//! Thin vision primitives over the `image` and `imageproc` crates.
//!
//! Operators never touch pixels directly; they call these primitives after
//! validation has passed, and map any [`VisionError`] into an operation
//! error. The only algorithm supplied locally is CLAHE (tile-based
//! contrast-limited equalization), which `imageproc` does not provide; it
//! sits behind the same seam as the rest.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::contours::BorderType;
use thiserror::Error;

/// Errors surfaced by the vision primitives.
#[derive(Error, Debug)]
pub enum VisionError {
    /// The input image has zero pixels.
    #[error("input image is empty")]
    EmptyImage,
    /// An argument is outside what the primitive can process.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias for vision primitives.
pub type VisionResult<T> = Result<T, VisionError>;

/// Thresholding rule applied per pixel against a threshold `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// `v > t ? max : 0`
    Binary,
    /// `v > t ? 0 : max`
    BinaryInv,
    /// `v > t ? t : v`
    Trunc,
    /// `v > t ? v : 0`
    ToZero,
    /// `v > t ? 0 : v`
    ToZeroInv,
}

impl ThresholdKind {
    /// Parses the wire name used by operator enum parameters.
    pub fn from_name(name: &str) -> VisionResult<Self> {
        match name {
            "BINARY" => Ok(Self::Binary),
            "BINARY_INV" => Ok(Self::BinaryInv),
            "TRUNC" => Ok(Self::Trunc),
            "TOZERO" => Ok(Self::ToZero),
            "TOZERO_INV" => Ok(Self::ToZeroInv),
            other => Err(VisionError::InvalidArgument(format!(
                "unknown threshold type '{other}'"
            ))),
        }
    }

    fn apply(self, v: u8, t: u8, max: u8) -> u8 {
        match self {
            Self::Binary => {
                if v > t {
                    max
                } else {
                    0
                }
            }
            Self::BinaryInv => {
                if v > t {
                    0
                } else {
                    max
                }
            }
            Self::Trunc => v.min(t),
            Self::ToZero => {
                if v > t {
                    v
                } else {
                    0
                }
            }
            Self::ToZeroInv => {
                if v > t {
                    0
                } else {
                    v
                }
            }
        }
    }
}

/// Neighborhood statistic used by adaptive thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    /// Arithmetic mean of the block.
    Mean,
    /// Gaussian-weighted mean of the block.
    Gaussian,
}

impl AdaptiveMethod {
    /// Parses the wire name used by operator enum parameters.
    pub fn from_name(name: &str) -> VisionResult<Self> {
        match name {
            "MEAN" => Ok(Self::Mean),
            "GAUSSIAN" => Ok(Self::Gaussian),
            other => Err(VisionError::InvalidArgument(format!(
                "unknown adaptive method '{other}'"
            ))),
        }
    }
}

/// Contour retrieval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourMode {
    /// All contours with full parent links.
    Tree,
    /// All contours, hierarchy flattened.
    List,
    /// Outer contours only.
    External,
    /// All contours in a two-level hierarchy: outer borders at the top,
    /// their holes directly beneath them.
    Ccomp,
}

impl ContourMode {
    /// Parses the wire name used by operator enum parameters.
    pub fn from_name(name: &str) -> VisionResult<Self> {
        match name {
            "TREE" => Ok(Self::Tree),
            "LIST" => Ok(Self::List),
            "EXTERNAL" => Ok(Self::External),
            "CCOMP" => Ok(Self::Ccomp),
            other => Err(VisionError::InvalidArgument(format!(
                "unknown contour mode '{other}'"
            ))),
        }
    }
}

/// Contour point approximation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourMethod {
    /// Keep every border point.
    None,
    /// Collapse straight runs, keeping only the points where the chain
    /// changes direction.
    Simple,
}

impl ContourMethod {
    /// Parses the wire name used by operator enum parameters.
    pub fn from_name(name: &str) -> VisionResult<Self> {
        match name {
            "NONE" => Ok(Self::None),
            "SIMPLE" => Ok(Self::Simple),
            other => Err(VisionError::InvalidArgument(format!(
                "unknown contour method '{other}'"
            ))),
        }
    }
}

/// Target color space for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Three-channel RGB.
    Rgb,
    /// Single-channel grayscale.
    Gray,
}

impl ColorSpace {
    /// Parses the wire name used by operator enum parameters.
    pub fn from_name(name: &str) -> VisionResult<Self> {
        match name {
            "RGB" => Ok(Self::Rgb),
            "GRAY" => Ok(Self::Gray),
            other => Err(VisionError::InvalidArgument(format!(
                "unknown color space '{other}'"
            ))),
        }
    }

    /// Number of channels in this color space.
    pub fn channels(self) -> u8 {
        match self {
            Self::Rgb => 3,
            Self::Gray => 1,
        }
    }
}

fn ensure_non_empty(image: &DynamicImage) -> VisionResult<()> {
    if image.width() == 0 || image.height() == 0 {
        Err(VisionError::EmptyImage)
    } else {
        Ok(())
    }
}

/// Default sigma for a given odd kernel size, matching the common
/// convention `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
pub fn sigma_for_kernel(kernel_size: i64) -> f32 {
    let k = kernel_size.max(1) as f32;
    (0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8).max(0.1)
}

/// Gaussian blur preserving the input's channel layout.
pub fn gaussian_blur(image: &DynamicImage, sigma: f32) -> VisionResult<DynamicImage> {
    ensure_non_empty(image)?;
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(VisionError::InvalidArgument(format!(
            "sigma must be positive, got {sigma}"
        )));
    }
    // 8-bit layouts keep their channel count, alpha included; anything
    // else (16-bit, float) falls back to RGB8.
    let out = match image {
        DynamicImage::ImageLuma8(gray) => {
            DynamicImage::ImageLuma8(imageproc::filter::gaussian_blur_f32(gray, sigma))
        }
        DynamicImage::ImageLumaA8(gray_alpha) => {
            DynamicImage::ImageLumaA8(imageproc::filter::gaussian_blur_f32(gray_alpha, sigma))
        }
        DynamicImage::ImageRgba8(rgba) => {
            DynamicImage::ImageRgba8(imageproc::filter::gaussian_blur_f32(rgba, sigma))
        }
        other => {
            DynamicImage::ImageRgb8(imageproc::filter::gaussian_blur_f32(&other.to_rgb8(), sigma))
        }
    };
    Ok(out)
}

/// Contrast-limited adaptive histogram equalization over a square tile
/// grid. Each tile's histogram is clipped at `clip_limit` times the uniform
/// bin height before the equalization lookup is built.
pub fn clahe(gray: &GrayImage, clip_limit: f64, tile_grid_size: u32) -> VisionResult<GrayImage> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(VisionError::EmptyImage);
    }
    if tile_grid_size == 0 {
        return Err(VisionError::InvalidArgument(
            "tile grid size must be at least 1".to_string(),
        ));
    }
    if !clip_limit.is_finite() || clip_limit < 1.0 {
        return Err(VisionError::InvalidArgument(format!(
            "clip limit must be >= 1, got {clip_limit}"
        )));
    }

    // Tiles never get smaller than one pixel.
    let tiles = tile_grid_size.min(width).min(height);
    let tile_w = width.div_ceil(tiles);
    let tile_h = height.div_ceil(tiles);

    let mut out = GrayImage::new(width, height);
    for ty in 0..tiles {
        for tx in 0..tiles {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            if x0 >= x1 || y0 >= y1 {
                continue;
            }
            let lut = tile_equalization_lut(gray, x0, y0, x1, y1, clip_limit);
            for y in y0..y1 {
                for x in x0..x1 {
                    out.put_pixel(x, y, image::Luma([lut[gray.get_pixel(x, y)[0] as usize]]));
                }
            }
        }
    }
    Ok(out)
}

fn tile_equalization_lut(
    gray: &GrayImage,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    clip_limit: f64,
) -> [u8; 256] {
    let mut histogram = [0u64; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let total = u64::from(x1 - x0) * u64::from(y1 - y0);

    // Clip and redistribute the excess uniformly.
    let ceiling = ((clip_limit * total as f64 / 256.0).max(1.0)) as u64;
    let mut excess = 0u64;
    for count in histogram.iter_mut() {
        if *count > ceiling {
            excess += *count - ceiling;
            *count = ceiling;
        }
    }
    let redistribute = excess / 256;
    for count in histogram.iter_mut() {
        *count += redistribute;
    }

    let mut lut = [0u8; 256];
    let mut cumulative = 0u64;
    for (level, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[level] = ((cumulative * 255) / total.max(1)).min(255) as u8;
    }
    lut
}

/// Global threshold with the given per-pixel rule. When `otsu` is set, the
/// threshold value is replaced by Otsu's level for the image.
pub fn threshold(
    gray: &GrayImage,
    kind: ThresholdKind,
    value: u8,
    max_value: u8,
    otsu: bool,
) -> VisionResult<GrayImage> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(VisionError::EmptyImage);
    }
    let t = if otsu {
        imageproc::contrast::otsu_level(gray)
    } else {
        value
    };
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = kind.apply(pixel[0], t, max_value);
    }
    Ok(out)
}

/// Adaptive threshold: each pixel is compared against the neighborhood
/// statistic of its `block_size` x `block_size` block minus `c`.
pub fn adaptive_threshold(
    gray: &GrayImage,
    method: AdaptiveMethod,
    kind: ThresholdKind,
    block_size: u32,
    c: i32,
    max_value: u8,
) -> VisionResult<GrayImage> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(VisionError::EmptyImage);
    }
    if block_size < 3 || block_size % 2 == 0 {
        return Err(VisionError::InvalidArgument(format!(
            "block size must be odd and >= 3, got {block_size}"
        )));
    }
    if !matches!(kind, ThresholdKind::Binary | ThresholdKind::BinaryInv) {
        return Err(VisionError::InvalidArgument(
            "adaptive threshold supports BINARY and BINARY_INV only".to_string(),
        ));
    }

    // Keep the window inside the image so tiny inputs stay well-defined.
    let radius = ((block_size - 1) / 2)
        .min(gray.width().saturating_sub(1) / 2)
        .min(gray.height().saturating_sub(1) / 2)
        .max(1);
    let local_mean = match method {
        AdaptiveMethod::Mean => imageproc::filter::box_filter(gray, radius, radius),
        AdaptiveMethod::Gaussian => {
            imageproc::filter::gaussian_blur_f32(gray, sigma_for_kernel(i64::from(block_size)))
        }
    };

    let mut out = gray.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let t = i32::from(local_mean.get_pixel(x, y)[0]) - c;
        let above = i32::from(pixel[0]) > t;
        pixel[0] = match kind {
            ThresholdKind::Binary => {
                if above {
                    max_value
                } else {
                    0
                }
            }
            _ => {
                if above {
                    0
                } else {
                    max_value
                }
            }
        };
    }
    Ok(out)
}

/// Extracts contours from a binary-ish grayscale image (non-zero pixels are
/// foreground). Returns the contours as point lists plus a hierarchy of
/// parent indices (`-1` for roots), filtered per the retrieval mode and
/// approximated per the method.
pub fn find_contours(
    gray: &GrayImage,
    mode: ContourMode,
    method: ContourMethod,
) -> VisionResult<(Vec<Vec<(u32, u32)>>, Vec<i64>)> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(VisionError::EmptyImage);
    }
    let raw = imageproc::contours::find_contours::<u32>(gray);

    let keep: Vec<usize> = match mode {
        ContourMode::Tree | ContourMode::List | ContourMode::Ccomp => (0..raw.len()).collect(),
        ContourMode::External => (0..raw.len())
            .filter(|&i| raw[i].border_type == BorderType::Outer && raw[i].parent.is_none())
            .collect(),
    };

    let mut contours = Vec::with_capacity(keep.len());
    let mut hierarchy = Vec::with_capacity(keep.len());
    for &i in &keep {
        let contour = &raw[i];
        let points: Vec<(u32, u32)> = contour.points.iter().map(|p| (p.x, p.y)).collect();
        contours.push(match method {
            ContourMethod::None => points,
            ContourMethod::Simple => simplify_contour(&points),
        });
        let remapped_parent = contour
            .parent
            .and_then(|p| keep.iter().position(|&k| k == p))
            .map_or(-1, |p| p as i64);
        let parent = match mode {
            ContourMode::Tree => remapped_parent,
            // Two levels only: holes hang off their outer border, every
            // outer border is a root regardless of nesting depth.
            ContourMode::Ccomp => {
                if contour.border_type == BorderType::Hole {
                    remapped_parent
                } else {
                    -1
                }
            }
            ContourMode::List | ContourMode::External => -1,
        };
        hierarchy.push(parent);
    }
    Ok((contours, hierarchy))
}

/// Drops the interior points of straight 8-connected runs, keeping the
/// points where the chain changes direction. Endpoints of a closed chain
/// are treated cyclically.
fn simplify_contour(points: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let step = |a: (u32, u32), b: (u32, u32)| {
        (i64::from(b.0) - i64::from(a.0), i64::from(b.1) - i64::from(a.1))
    };
    let mut out = Vec::new();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        if step(prev, cur) != step(cur, next) {
            out.push(cur);
        }
    }
    if out.is_empty() {
        // Fully collinear chain: keep its extremities.
        out.push(points[0]);
        out.push(points[n - 1]);
    }
    out
}

/// Draws contours in green over an RGB copy of the input.
pub fn draw_contours(image: &DynamicImage, contours: &[Vec<(u32, u32)>]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let green = Rgb([0u8, 255, 0]);
    for contour in contours {
        if contour.len() < 2 {
            for &(x, y) in contour {
                canvas.put_pixel(x, y, green);
            }
            continue;
        }
        for window in contour.windows(2) {
            let (x0, y0) = window[0];
            let (x1, y1) = window[1];
            imageproc::drawing::draw_line_segment_mut(
                &mut canvas,
                (x0 as f32, y0 as f32),
                (x1 as f32, y1 as f32),
                green,
            );
        }
        // Close the loop.
        if let (Some(&first), Some(&last)) = (contour.first(), contour.last()) {
            imageproc::drawing::draw_line_segment_mut(
                &mut canvas,
                (last.0 as f32, last.1 as f32),
                (first.0 as f32, first.1 as f32),
                green,
            );
        }
    }
    canvas
}

/// Converts an image into the target color space.
pub fn convert_color(image: &DynamicImage, target: ColorSpace) -> VisionResult<DynamicImage> {
    ensure_non_empty(image)?;
    let out = match target {
        ColorSpace::Rgb => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorSpace::Gray => DynamicImage::ImageLuma8(image.to_luma8()),
    };
    Ok(out)
}
