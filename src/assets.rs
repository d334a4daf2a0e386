//! Embedded background-capture assets.
//!
//! Each capture is a PNG of the logo rendered at full brightness over a
//! black background; the alpha map builder derives per-pixel opacity from
//! these at engine construction.

/// 48x48 capture for the small size class.
pub const BG_48_PNG: &[u8] = include_bytes!("assets/bg_48.png");

/// 96x96 capture for the large size class.
pub const BG_96_PNG: &[u8] = include_bytes!("assets/bg_96.png");
