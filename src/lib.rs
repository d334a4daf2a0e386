//! Add or remove semi-transparent logo watermarks via alpha compositing.
//!
//! Watermarks of this kind are applied by forward alpha blending a bright
//! logo over the bottom-right corner of an image. This crate derives a
//! per-pixel alpha map from calibrated 48x48 and 96x96 background captures
//! embedded in the binary, then composites in either direction: forward to
//! insert the watermark, or inverse to recover the original pixels.
//!
//! # Quick Start
//!
//! ```no_run
//! use watermark_compositor::{BlendOptions, WatermarkEngine};
//!
//! let engine = WatermarkEngine::new().expect("failed to init engine");
//! let mut img = image::open("photo.jpg").unwrap().to_rgb8();
//! engine.remove(&mut img, &BlendOptions::default());
//! img.save("cleaned.jpg").unwrap();
//! ```
//!
//! # Adding a watermark
//!
//! The forward direction uses the same alpha map and placement, so adding
//! and then removing round-trips to the original within rounding error:
//!
//! ```no_run
//! use watermark_compositor::{BlendOptions, WatermarkEngine};
//!
//! let engine = WatermarkEngine::new().expect("failed to init engine");
//! let mut img = image::open("photo.jpg").unwrap().to_rgb8();
//! engine.apply(&mut img, &BlendOptions::default());
//! img.save("marked.jpg").unwrap();
//! ```

#![deny(missing_docs)]

mod assets;
pub mod blending;
mod engine;
pub mod error;

pub use engine::{
    default_output_path, is_supported_image, save_image, BlendOptions, Mode, ProcessOptions,
    ProcessResult, WatermarkEngine, WatermarkSize,
};
pub use error::{Error, Result};
