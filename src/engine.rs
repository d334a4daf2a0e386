//! Watermark engine: placement policy, size classes, and file processing.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::assets;
use crate::blending::{self, Placement};
use crate::error::{Error, Result};

/// Watermark size classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkSize {
    /// 48x48 alpha map, 32px right/bottom margin.
    Small,
    /// 96x96 alpha map, 64px right/bottom margin.
    Large,
}

impl WatermarkSize {
    /// Edge length of the square alpha map for this class.
    #[must_use]
    pub fn logo_size(self) -> u32 {
        match self {
            Self::Small => 48,
            Self::Large => 96,
        }
    }

    /// Margin from the right and bottom image edges for this class.
    #[must_use]
    pub fn margin(self) -> u32 {
        match self {
            Self::Small => 32,
            Self::Large => 64,
        }
    }
}

/// Blend direction for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Inverse composite: recover original pixels from a watermarked image.
    Remove,
    /// Forward composite: blend the watermark onto an image.
    Add,
}

/// Explicit blend configuration, replacing defaulted arguments.
#[derive(Debug, Clone, Copy)]
pub struct BlendOptions {
    /// Nominal bright-channel value of the logo at full opacity.
    pub logo_value: f32,
    /// Override the automatically selected size class.
    pub size_override: Option<WatermarkSize>,
}

impl Default for BlendOptions {
    fn default() -> Self {
        Self {
            logo_value: 255.0,
            size_override: None,
        }
    }
}

/// Options controlling file and directory processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Blend direction.
    pub mode: Mode,
    /// Blend configuration (logo value, size override).
    pub blend: BlendOptions,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Remove,
            blend: BlendOptions::default(),
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
}

/// The watermark engine holding pre-computed alpha maps.
///
/// Create once with [`WatermarkEngine::new()`] and reuse for multiple images.
/// The engine decodes the background captures once at construction; the
/// resulting alpha maps are immutable and shared by every operation.
#[derive(Debug)]
pub struct WatermarkEngine {
    alpha_map_small: Vec<f32>,
    alpha_map_large: Vec<f32>,
}

impl WatermarkEngine {
    /// Create a new engine from the embedded background captures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlphaMapDecode`] if the embedded PNGs cannot be
    /// decoded (corrupted binary data).
    pub fn new() -> Result<Self> {
        Self::from_captures(assets::BG_48_PNG, assets::BG_96_PNG)
    }

    /// Create an engine from caller-supplied background capture PNGs.
    ///
    /// The small capture must be 48x48 and the large one 96x96.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlphaMapDecode`] if a PNG cannot be decoded, or
    /// [`Error::BadCaptureDimensions`] if a capture has the wrong size.
    pub fn from_captures(small_png: &[u8], large_png: &[u8]) -> Result<Self> {
        let alpha_map_small = decode_capture(small_png, WatermarkSize::Small.logo_size())?;
        let alpha_map_large = decode_capture(large_png, WatermarkSize::Large.logo_size())?;
        Ok(Self {
            alpha_map_small,
            alpha_map_large,
        })
    }

    /// Determine the watermark size class from image dimensions.
    ///
    /// - **Large** (96x96, 64px margin): both width AND height > 1024
    /// - **Small** (48x48, 32px margin): otherwise (including 1024x1024)
    #[must_use]
    #[allow(clippy::unused_self)] // method on `self` for API consistency
    pub fn watermark_size_for(&self, width: u32, height: u32) -> WatermarkSize {
        if width > 1024 && height > 1024 {
            WatermarkSize::Large
        } else {
            WatermarkSize::Small
        }
    }

    /// Resolve the size class and alpha map for given dimensions.
    fn config(&self, width: u32, height: u32, opts: &BlendOptions) -> (WatermarkSize, &[f32]) {
        let size = opts
            .size_override
            .unwrap_or_else(|| self.watermark_size_for(width, height));
        match size {
            WatermarkSize::Small => (size, &self.alpha_map_small),
            WatermarkSize::Large => (size, &self.alpha_map_large),
        }
    }

    /// Compute the bottom-right anchored placement for a size class.
    ///
    /// `x = W - margin - logo_size`, `y = H - margin - logo_size`. Offsets
    /// are signed: on images smaller than the margin plus logo the placement
    /// goes negative and the compositor clips it.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn placement_for(&self, img_w: u32, img_h: u32, size: WatermarkSize) -> Placement {
        let logo_size = size.logo_size();
        let margin = size.margin();
        Placement {
            x: i64::from(img_w) - i64::from(margin) - i64::from(logo_size),
            y: i64::from(img_h) - i64::from(margin) - i64::from(logo_size),
            width: logo_size,
            height: logo_size,
        }
    }

    /// Remove the watermark from an image in-place.
    ///
    /// Applies reverse alpha blending at the anchored position. Placements
    /// that miss the image entirely leave it untouched.
    pub fn remove(&self, image: &mut RgbImage, opts: &BlendOptions) {
        let (w, h) = image.dimensions();
        let (size, alpha_map) = self.config(w, h, opts);
        let placement = self.placement_for(w, h, size);
        blending::remove_overlay(image, w, h, alpha_map, &placement, opts.logo_value);
    }

    /// Composite the watermark onto an image in-place.
    ///
    /// Applies forward alpha blending at the anchored position.
    pub fn apply(&self, image: &mut RgbImage, opts: &BlendOptions) {
        let (w, h) = image.dimensions();
        let (size, alpha_map) = self.config(w, h, opts);
        let placement = self.placement_for(w, h, size);
        blending::apply_overlay(image, w, h, alpha_map, &placement, opts.logo_value);
    }

    /// Process a single image file: load, composite per mode, save.
    ///
    /// Returns a [`ProcessResult`] rather than an error so batch runs can
    /// report per-file failures without aborting.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            message: String::new(),
        };

        let dyn_img = match image::open(input) {
            Ok(img) => img,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let mut rgb_img = dyn_img.to_rgb8();
        match opts.mode {
            Mode::Remove => self.remove(&mut rgb_img, &opts.blend),
            Mode::Add => self.apply(&mut rgb_img, &opts.blend),
        }

        if let Some(parent) = output.parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&rgb_img, output) {
            Ok(()) => {
                result.success = true;
                result.message = match opts.mode {
                    Mode::Remove => "Watermark removed".to_string(),
                    Mode::Add => "Watermark applied".to_string(),
                };
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns a [`ProcessResult`] for each image found.
    ///
    /// # Panics
    ///
    /// Panics if any directory entry has no filename (should not happen for
    /// regular files).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let entries: Vec<_> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .filter(|e| is_supported_image(e.path().as_path()))
                .collect(),
            Err(e) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    success: false,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult {
                    path: output_dir.to_path_buf(),
                    success: false,
                    message: format!("Failed to create output directory: {e}"),
                }];
            }
        }

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|entry| {
                    let input_path = entry.path();
                    let filename = input_path.file_name().unwrap();
                    let output_path = output_dir.join(filename);
                    self.process_file(&input_path, &output_path, opts)
                })
                .collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries
                .iter()
                .map(|entry| {
                    let input_path = entry.path();
                    let filename = input_path.file_name().unwrap();
                    let output_path = output_dir.join(filename);
                    self.process_file(&input_path, &output_path, opts)
                })
                .collect()
        }
    }
}

/// Decode a background capture PNG and check its expected edge length.
fn decode_capture(png_bytes: &[u8], expected: u32) -> Result<Vec<f32>> {
    let (map, width, height) = blending::calculate_alpha_map(png_bytes)?;
    if width != expected || height != expected {
        return Err(Error::BadCaptureDimensions {
            expected,
            width,
            height,
        });
    }
    Ok(map)
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgb8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path and mode.
///
/// Example: `"photo.jpg"` becomes `"photo_cleaned.jpg"` when removing and
/// `"photo_marked.jpg"` when adding.
#[must_use]
pub fn default_output_path(input: &Path, mode: Mode) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    let suffix = match mode {
        Mode::Remove => "cleaned",
        Mode::Add => "marked",
    };
    parent.join(format!("{stem}_{suffix}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_size_small_when_either_dim_lte_1024() {
        let engine = WatermarkEngine::new().unwrap();
        assert_eq!(engine.watermark_size_for(800, 600), WatermarkSize::Small);
        assert_eq!(engine.watermark_size_for(1024, 1024), WatermarkSize::Small);
        assert_eq!(engine.watermark_size_for(2000, 500), WatermarkSize::Small);
        assert_eq!(engine.watermark_size_for(512, 2048), WatermarkSize::Small);
    }

    #[test]
    fn watermark_size_large_when_both_dims_gt_1024() {
        let engine = WatermarkEngine::new().unwrap();
        assert_eq!(engine.watermark_size_for(1025, 1025), WatermarkSize::Large);
        assert_eq!(engine.watermark_size_for(2048, 2048), WatermarkSize::Large);
    }

    #[test]
    fn placement_anchors_bottom_right() {
        let engine = WatermarkEngine::new().unwrap();
        let p = engine.placement_for(800, 600, WatermarkSize::Small);
        assert_eq!((p.x, p.y), (720, 520));
        assert_eq!((p.width, p.height), (48, 48));

        let p = engine.placement_for(2048, 2048, WatermarkSize::Large);
        assert_eq!((p.x, p.y), (1888, 1888));
        assert_eq!((p.width, p.height), (96, 96));
    }

    #[test]
    fn placement_goes_negative_for_tiny_images() {
        let engine = WatermarkEngine::new().unwrap();
        let p = engine.placement_for(50, 50, WatermarkSize::Small);
        assert_eq!((p.x, p.y), (-30, -30));
    }

    #[test]
    fn size_override_wins_over_auto_selection() {
        let engine = WatermarkEngine::new().unwrap();
        let opts = BlendOptions {
            size_override: Some(WatermarkSize::Large),
            ..BlendOptions::default()
        };
        let (size, map) = engine.config(800, 600, &opts);
        assert_eq!(size, WatermarkSize::Large);
        assert_eq!(map.len(), 96 * 96);
    }

    #[test]
    fn engine_is_debug_formattable() {
        // Keeps `unwrap_err` and friends usable on Result<WatermarkEngine>.
        let engine = WatermarkEngine::new().unwrap();
        assert!(format!("{engine:?}").contains("WatermarkEngine"));
    }

    #[test]
    fn from_captures_rejects_wrong_dimensions() {
        // A 10x10 PNG cannot serve as the 48x48 capture.
        let mut bytes = Vec::new();
        let img = RgbImage::new(10, 10);
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let err = WatermarkEngine::from_captures(&bytes, assets::BG_96_PNG).unwrap_err();
        assert!(matches!(
            err,
            Error::BadCaptureDimensions { expected: 48, .. }
        ));
    }

    #[test]
    fn default_output_path_appends_mode_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"), Mode::Remove);
        assert_eq!(p, PathBuf::from("/tmp/photo_cleaned.jpg"));

        let p = default_output_path(Path::new("image.png"), Mode::Add);
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "image_marked.png");
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("photo.bmp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }
}
