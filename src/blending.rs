//! Alpha blending math for watermark removal and insertion.
//!
//! Watermarks are applied by forward alpha blending:
//! `watermarked = alpha * logo + (1 - alpha) * original`
//!
//! This module provides both directions: [`apply_overlay`] composites a
//! watermark onto an image, and [`remove_overlay`] inverts the formula to
//! recover the original pixels.

use crate::error::{Error, Result};

/// Alpha threshold: ignore pixels with negligible watermark effect (noise).
pub const ALPHA_THRESHOLD: f32 = 0.002;

/// Maximum alpha: clamp to avoid division by near-zero in reverse blending.
const MAX_ALPHA: f32 = 0.99;

/// Rectangular region of a target image covered by an alpha map.
///
/// Offsets are signed: a placement may hang off any edge of the image, in
/// which case the compositor clips it, or skips the operation entirely when
/// the overlap is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// X offset of the region's top-left corner, in image coordinates.
    pub x: i64,
    /// Y offset of the region's top-left corner.
    pub y: i64,
    /// Alpha map width in pixels.
    pub width: u32,
    /// Alpha map height in pixels.
    pub height: u32,
}

impl Placement {
    /// Intersect with an `img_w` x `img_h` image, returning the covered
    /// `(x1, y1, x2, y2)` pixel range, or `None` when the placement misses
    /// the image entirely.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn clip(&self, img_w: u32, img_h: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x + i64::from(self.width)).min(i64::from(img_w));
        let y2 = (self.y + i64::from(self.height)).min(i64::from(img_h));
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        // Clipped bounds are non-negative and within u32 image dimensions.
        Some((x1 as u32, y1 as u32, x2 as u32, y2 as u32))
    }
}

/// Derive an alpha map from a raw background-capture buffer.
///
/// The capture shows the logo rendered over a neutral dark background, so
/// the brightest channel approximates how much the logo contributed at each
/// pixel: `alpha = max(R, G, B) / 255.0`. This is a cheap single-pass
/// estimator, accurate enough to round-trip against the matching forward
/// composite.
///
/// # Panics
///
/// Panics if `capture.len() != width * height * 3`; a mismatched buffer is a
/// caller bug, not a runtime condition.
#[must_use]
pub fn alpha_map_from_capture(capture: &[u8], width: u32, height: u32) -> Vec<f32> {
    let pixel_count = (width as usize) * (height as usize);
    assert_eq!(
        capture.len(),
        pixel_count * 3,
        "capture buffer length must be width * height * 3"
    );

    let mut alpha_map = Vec::with_capacity(pixel_count);
    for px in capture.chunks_exact(3) {
        let max_val = px[0].max(px[1]).max(px[2]);
        alpha_map.push(f32::from(max_val) / 255.0);
    }
    alpha_map
}

/// Decode a PNG background capture and derive its alpha map.
///
/// Returns a flat `Vec<f32>` of length `width * height`, plus the capture's
/// `(width, height)`.
///
/// # Errors
///
/// Returns [`Error::AlphaMapDecode`] if the PNG data cannot be decoded.
pub fn calculate_alpha_map(png_bytes: &[u8]) -> Result<(Vec<f32>, u32, u32)> {
    let img = image::load_from_memory(png_bytes)
        .map_err(Error::AlphaMapDecode)?
        .to_rgb8();
    let (width, height) = img.dimensions();
    let map = alpha_map_from_capture(img.as_raw(), width, height);
    Ok((map, width, height))
}

fn check_geometry(buffer: &[u8], img_w: u32, img_h: u32, alpha_map: &[f32], placement: &Placement) {
    assert_eq!(
        buffer.len(),
        (img_w as usize) * (img_h as usize) * 3,
        "image buffer length must be img_w * img_h * 3"
    );
    assert_eq!(
        alpha_map.len(),
        (placement.width as usize) * (placement.height as usize),
        "alpha map length must be placement.width * placement.height"
    );
}

/// Remove a watermark from a raw RGB buffer using reverse alpha blending.
///
/// Applies `original = (watermarked - alpha * logo_value) / (1 - alpha)` to
/// every pixel where the placement overlaps the image, in place. Pixels with
/// alpha below [`ALPHA_THRESHOLD`] are left untouched, and alpha is clamped
/// to 0.99 so the denominator stays bounded away from zero. A placement
/// entirely off-image is a no-op.
///
/// # Panics
///
/// Panics if `buffer.len() != img_w * img_h * 3` or the alpha map length
/// does not match the placement dimensions.
pub fn remove_overlay(
    buffer: &mut [u8],
    img_w: u32,
    img_h: u32,
    alpha_map: &[f32],
    placement: &Placement,
    logo_value: f32,
) {
    check_geometry(buffer, img_w, img_h, alpha_map, placement);
    let Some((x1, y1, x2, y2)) = placement.clip(img_w, img_h) else {
        return;
    };

    for y in y1..y2 {
        // x1 >= placement.x and y1 >= placement.y after clipping.
        #[allow(clippy::cast_sign_loss)]
        let alpha_row = (i64::from(y) - placement.y) as usize * placement.width as usize;
        let img_row = y as usize * img_w as usize;

        for x in x1..x2 {
            #[allow(clippy::cast_sign_loss)]
            let alpha_idx = alpha_row + (i64::from(x) - placement.x) as usize;
            let mut alpha = alpha_map[alpha_idx];

            if alpha < ALPHA_THRESHOLD {
                continue;
            }

            alpha = alpha.min(MAX_ALPHA);
            let inv_alpha = 1.0 - alpha;
            let alpha_times_logo = alpha * logo_value;

            let idx = (img_row + x as usize) * 3;
            for ch in &mut buffer[idx..idx + 3] {
                let watermarked = f32::from(*ch);
                let original = (watermarked - alpha_times_logo) / inv_alpha;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    *ch = original.clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}

/// Composite a watermark onto a raw RGB buffer using forward alpha blending.
///
/// Applies `result = alpha * logo_value + (1 - alpha) * original` to every
/// pixel where the placement overlaps the image, in place. Pixels with alpha
/// below [`ALPHA_THRESHOLD`] are left untouched; no max-alpha clamp is
/// needed on this path. A placement entirely off-image is a no-op.
///
/// # Panics
///
/// Panics if `buffer.len() != img_w * img_h * 3` or the alpha map length
/// does not match the placement dimensions.
pub fn apply_overlay(
    buffer: &mut [u8],
    img_w: u32,
    img_h: u32,
    alpha_map: &[f32],
    placement: &Placement,
    logo_value: f32,
) {
    check_geometry(buffer, img_w, img_h, alpha_map, placement);
    let Some((x1, y1, x2, y2)) = placement.clip(img_w, img_h) else {
        return;
    };

    for y in y1..y2 {
        #[allow(clippy::cast_sign_loss)]
        let alpha_row = (i64::from(y) - placement.y) as usize * placement.width as usize;
        let img_row = y as usize * img_w as usize;

        for x in x1..x2 {
            #[allow(clippy::cast_sign_loss)]
            let alpha_idx = alpha_row + (i64::from(x) - placement.x) as usize;
            let alpha = alpha_map[alpha_idx];

            if alpha < ALPHA_THRESHOLD {
                continue;
            }

            let inv_alpha = 1.0 - alpha;
            let alpha_times_logo = alpha * logo_value;

            let idx = (img_row + x as usize) * 3;
            for ch in &mut buffer[idx..idx + 3] {
                let original = f32::from(*ch);
                let result = alpha_times_logo + inv_alpha * original;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    *ch = result.clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}
