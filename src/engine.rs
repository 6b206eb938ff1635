// src/engine.rs

//! The orchestrator: owns the single working image and sequences the
//! pipeline stages into the end-to-end "generate output file" operation.
//!
//! One engine instance drives one document at a time; callers that need
//! concurrency must route all invocations through a single instance they
//! serialize themselves. There is deliberately no global state.

use crate::image::{GrayRaster, Image, Rgb8, RgbRaster};
use crate::irb::template::SpotTemplate;
use crate::pipeline::{
    BlacknessMethod, filter_by_area, inject_channels, invert, mask_by_threshold, morph_close,
    score, to_display, white_compensation,
};
use crate::tiff;
use crate::utils::error::{Result, SepError};
use crate::utils::file_path::normalize_tiff_extension;
use log::info;
use std::path::Path;

/// Default blackness threshold, matching the interactive control's preset.
pub const DEFAULT_BLACKNESS_THRESH: u8 = 235;
/// Default noise-area floor (a single pixel: nothing removed).
pub const DEFAULT_NOISE_AREA: u32 = 1;

/// The stateful pipeline facade.
///
/// Interactive drivers call the staged operations (`compute_blackness`,
/// `remove_black`, …) to preview intermediates; `generate` always reruns
/// the full pipeline from the working image so previews can never leak
/// stale state into the output.
#[derive(Debug, Default)]
pub struct Engine {
    template: SpotTemplate,
    image: Option<Image>,
    display: Option<RgbRaster>,
    blackness: Option<GrayRaster>,
    mask: Option<GrayRaster>,
    filtered: Option<GrayRaster>,
    white: Option<GrayRaster>,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    /// Creates an engine that embeds the given donor template on output.
    pub fn with_template(template: SpotTemplate) -> Self {
        Engine {
            template,
            ..Engine::default()
        }
    }

    /// Captures the donor template from a TIFF file. Called once at
    /// startup; the template is immutable afterwards.
    pub fn load_template(&mut self, path: &Path) -> Result<()> {
        self.template = SpotTemplate::load(path)?;
        Ok(())
    }

    pub fn template(&self) -> &SpotTemplate {
        &self.template
    }

    /// Decodes a TIFF into the working image and projects the display
    /// color. Replaces any previously loaded document wholesale.
    pub fn open_tiff(&mut self, path: &Path) -> Result<&RgbRaster> {
        let image = tiff::decode(path)?;
        let display = to_display(&image)?;
        self.image = Some(image);
        self.reset_stages();
        Ok(self.display.insert(display))
    }

    /// Loads a generic raster (PNG/JPEG/…) as the working color only.
    /// Without a decoded TIFF there is no channel model, so `generate`
    /// is unavailable until a TIFF is opened.
    pub fn open_raster(&mut self, path: &Path) -> Result<&RgbRaster> {
        let decoded = image::open(path)
            .map_err(|e| SepError::OpenFailed(e.to_string()))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        let pixels: Vec<Rgb8> = bytemuck::cast_slice(decoded.as_raw()).to_vec();

        self.image = None;
        self.reset_stages();
        Ok(self.display.insert(RgbRaster::from_vec(width, height, pixels)))
    }

    /// Installs an externally produced working color raster.
    pub fn set_display(&mut self, rgb: RgbRaster) {
        self.image = None;
        self.reset_stages();
        self.display = Some(rgb);
    }

    /// Scores the working color into the blackness map.
    pub fn compute_blackness(&mut self, method: BlacknessMethod) -> Result<&GrayRaster> {
        let display = self
            .display
            .as_ref()
            .ok_or_else(|| SepError::InvalidInput("no working image is loaded".into()))?;
        let blackness = score(display, method);
        Ok(self.blackness.insert(blackness))
    }

    /// Thresholds the blackness map into the transparency mask.
    pub fn remove_black(&mut self, thresh: u8) -> Result<&GrayRaster> {
        let blackness = self
            .blackness
            .as_ref()
            .ok_or_else(|| SepError::InvalidInput("blackness has not been computed".into()))?;
        let mask = mask_by_threshold(blackness, thresh);
        self.filtered = Some(mask.clone());
        Ok(self.mask.insert(mask))
    }

    /// Removes mask components smaller than `min_area` pixels.
    pub fn filter_small_regions(&mut self, min_area: u32) -> Result<&GrayRaster> {
        let mask = self
            .mask
            .as_ref()
            .ok_or_else(|| SepError::InvalidInput("no transparency mask to filter".into()))?;
        let filtered = filter_by_area(mask, min_area);
        Ok(self.filtered.insert(filtered))
    }

    /// Structural alternative to the area filter: closes pinholes with a
    /// disc of the given radius.
    pub fn close_small_holes(&mut self, radius: u32) -> Result<&GrayRaster> {
        let mask = self
            .mask
            .as_ref()
            .ok_or_else(|| SepError::InvalidInput("no transparency mask to filter".into()))?;
        let filtered = morph_close(mask, radius);
        Ok(self.filtered.insert(filtered))
    }

    /// Synthesizes the white-ink compensation from the current blackness
    /// and (filtered) mask.
    pub fn build_white_compensation(&mut self, thresh: u8) -> Result<&GrayRaster> {
        let blackness = self
            .blackness
            .as_ref()
            .ok_or_else(|| SepError::InvalidInput("blackness has not been computed".into()))?;
        let mask = self
            .filtered
            .as_ref()
            .ok_or_else(|| SepError::InvalidInput("no transparency mask available".into()))?;
        let white = white_compensation(blackness, mask, thresh)?;
        Ok(self.white.insert(white))
    }

    /// Runs the whole pipeline and writes the separation file.
    ///
    /// Projection, scoring, masking, area filtering, compensation, and
    /// injection run in order, aborting on the first failure; the
    /// destination (extension normalized to `.tif`) is only created by the
    /// final encode, so earlier failures never leave a partial file.
    pub fn generate(
        &mut self,
        path: &Path,
        method: BlacknessMethod,
        blackness_thresh: u8,
        noise_area: u32,
    ) -> Result<()> {
        let image = self
            .image
            .as_mut()
            .ok_or_else(|| SepError::InvalidInput("no TIFF document is loaded".into()))?;

        let display = to_display(image)?;
        let blackness = score(&display, method);
        let mask = mask_by_threshold(&blackness, blackness_thresh);
        let cleaned = filter_by_area(&mask, noise_area);
        let compensation = white_compensation(&blackness, &cleaned, blackness_thresh)?;
        let white_ink = invert(&compensation);

        // Both spot channels carry the same inverted compensation.
        inject_channels(image, &cleaned, &white_ink, &white_ink)?;

        let out = normalize_tiff_extension(path);
        tiff::encode(&out, image, &self.template)?;
        info!("wrote separation to {}", out.display());
        Ok(())
    }

    pub fn display(&self) -> Option<&RgbRaster> {
        self.display.as_ref()
    }

    pub fn blackness(&self) -> Option<&GrayRaster> {
        self.blackness.as_ref()
    }

    pub fn transparency_mask(&self) -> Option<&GrayRaster> {
        self.mask.as_ref()
    }

    pub fn filtered_mask(&self) -> Option<&GrayRaster> {
        self.filtered.as_ref()
    }

    pub fn white(&self) -> Option<&GrayRaster> {
        self.white.as_ref()
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    fn reset_stages(&mut self) {
        self.display = None;
        self.blackness = None;
        self.mask = None;
        self.filtered = None;
        self.white = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_operations_require_prerequisites() {
        let mut engine = Engine::new();
        assert!(engine.compute_blackness(BlacknessMethod::Gray).is_err());
        assert!(engine.remove_black(100).is_err());
        assert!(engine.filter_small_regions(4).is_err());
        assert!(engine.build_white_compensation(100).is_err());
    }

    #[test]
    fn test_staged_preview_flow() {
        let mut engine = Engine::new();
        engine.set_display(RgbRaster::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgb8::new(0, 0, 0)
            } else {
                Rgb8::new(255, 255, 255)
            }
        }));

        engine.compute_blackness(BlacknessMethod::MaxChannel).unwrap();
        let mask = engine.remove_black(DEFAULT_BLACKNESS_THRESH).unwrap();
        // Black pixels score 255 > 235 and are removed; white ones kept.
        assert_eq!(mask.get(0, 0), 0);
        assert_eq!(mask.get(3, 0), 255);

        engine.filter_small_regions(DEFAULT_NOISE_AREA).unwrap();
        let white = engine
            .build_white_compensation(DEFAULT_BLACKNESS_THRESH)
            .unwrap();
        // Fully white pixels (blackness 0) get maximal compensation.
        assert_eq!(white.get(3, 0), 255);
        assert_eq!(white.get(0, 0), 0);
    }

    #[test]
    fn test_generate_requires_tiff_document() {
        let mut engine = Engine::new();
        engine.set_display(RgbRaster::new(2, 2));
        let err = engine
            .generate(
                Path::new("/nonexistent/out.tif"),
                BlacknessMethod::DarkNeutral,
                DEFAULT_BLACKNESS_THRESH,
                DEFAULT_NOISE_AREA,
            )
            .unwrap_err();
        assert!(matches!(err, SepError::InvalidInput(_)));
    }
}
