//! A Rust library for generating white-ink underprint separations.
//!
//! This crate ingests a raster image, derives a per-pixel blackness (ink
//! coverage) map, cleans it up, and writes a multi-channel TIFF carrying an
//! alpha mask plus two white-ink spot channels, reusing channel-naming
//! metadata captured verbatim from a donor template file.
//!
//! # Quick Start
//!
//! ```ignore
//! use underprint::{BlacknessMethod, Engine};
//! use std::path::Path;
//!
//! let mut engine = Engine::new();
//! engine.load_template(Path::new("donor_with_white.tif"))?;
//! engine.open_tiff(Path::new("artwork.tif"))?;
//! engine.generate(
//!     Path::new("artwork_white.tif"),
//!     BlacknessMethod::DarkNeutral,
//!     235, // blackness threshold
//!     4,   // minimum speckle area
//! )?;
//! ```
//!
//! # Pipeline
//!
//! - **Decode**: baseline TIFF into the in-memory image model
//! - **Project**: decoded channels into a 3-channel working color
//! - **Score**: per-pixel blackness (three selectable methods)
//! - **Mask**: inverted threshold keeps low-coverage pixels
//! - **Clean**: 8-connected area filter (or morphological closing)
//! - **Compensate**: white-ink density ramp below the threshold
//! - **Inject**: alpha + two spot channels into the sample layout
//! - **Encode**: TIFF with the donor's Photoshop resource blob embedded

// Core modules
pub mod engine;
pub mod export;
pub mod image;
pub mod irb;
pub mod pipeline;
pub mod tiff;
pub mod utils;

// Orchestrator API
pub use engine::{DEFAULT_BLACKNESS_THRESH, DEFAULT_NOISE_AREA, Engine};

// Pipeline stages (for custom workflows)
pub use pipeline::{
    BlacknessMethod, filter_by_area, inject_channels, invert, mask_by_threshold, morph_close,
    score, to_display, white_compensation,
};

// Image types
pub use self::image::{ExtraSample, GrayRaster, Image, ImageMeta, Photometric, PlanarConfig,
    RawRaster, Rgb8, RgbRaster};

// Template and export types
pub use export::write_cmyk_tiff;
pub use irb::template::SpotTemplate;

// Error types
pub use utils::error::{Result, SepError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_engine() {
        let engine = Engine::new();
        assert!(engine.display().is_none());
        assert!(engine.image().is_none());
        assert!(engine.template().is_empty());
    }

    #[test]
    fn test_default_method() {
        assert_eq!(BlacknessMethod::default(), BlacknessMethod::DarkNeutral);
    }
}
