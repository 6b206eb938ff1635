// src/image/meta.rs

//! Decoded raster metadata and its derived channel queries.

/// Color model of the base channels, as carried by the TIFF photometric tag.
///
/// Unknown values are preserved verbatim in `Other` so that re-encoding a
/// file we merely pass through does not rewrite its interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Photometric {
    /// White is zero (gray-like, single base channel).
    MinIsWhite,
    /// Black is zero (gray-like, single base channel).
    MinIsBlack,
    Rgb,
    /// Separated inks, in practice CMYK.
    Separated,
    Other(u16),
}

impl Photometric {
    pub fn from_u16(v: u16) -> Self {
        match v {
            0 => Photometric::MinIsWhite,
            1 => Photometric::MinIsBlack,
            2 => Photometric::Rgb,
            5 => Photometric::Separated,
            other => Photometric::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Photometric::MinIsWhite => 0,
            Photometric::MinIsBlack => 1,
            Photometric::Rgb => 2,
            Photometric::Separated => 5,
            Photometric::Other(v) => v,
        }
    }
}

/// Sample layout of the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanarConfig {
    /// Samples interleaved per pixel: `[S0 S1 S2][S0 S1 S2]...`
    #[default]
    Contiguous,
    /// One full plane per sample: `[plane0][plane1]...`
    Separate,
}

impl PlanarConfig {
    pub fn from_u16(v: u16) -> Self {
        if v == 2 {
            PlanarConfig::Separate
        } else {
            PlanarConfig::Contiguous
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            PlanarConfig::Contiguous => 1,
            PlanarConfig::Separate => 2,
        }
    }
}

/// Role of a sample beyond the base color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraSample {
    /// Unspecified use: spot inks, masks.
    Unspecified,
    /// Premultiplied alpha.
    AssociatedAlpha,
    /// Straight alpha.
    UnassociatedAlpha,
}

impl ExtraSample {
    pub fn from_u16(v: u16) -> Self {
        match v {
            1 => ExtraSample::AssociatedAlpha,
            2 => ExtraSample::UnassociatedAlpha,
            _ => ExtraSample::Unspecified,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            ExtraSample::Unspecified => 0,
            ExtraSample::AssociatedAlpha => 1,
            ExtraSample::UnassociatedAlpha => 2,
        }
    }

    pub fn is_alpha(self) -> bool {
        matches!(
            self,
            ExtraSample::AssociatedAlpha | ExtraSample::UnassociatedAlpha
        )
    }
}

/// Everything read from the source file's tag directory.
///
/// Invariant: `samples_per_pixel == base_color_samples() + extra_samples.len()`.
/// The decoder establishes it and channel injection re-establishes it after
/// rewriting the sample layout.
#[derive(Debug, Clone)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    /// Channel count per pixel (RGB=3, CMYK=4, plus any extras).
    pub samples_per_pixel: u16,
    /// Bit depth per channel. The engine is defined only for 8.
    pub bits_per_sample: u16,
    pub photometric: Photometric,
    pub planar_config: PlanarConfig,
    pub x_resolution: f32,
    pub y_resolution: f32,
    /// Resolution unit tag, passed through (2 = inch).
    pub resolution_unit: u16,
    /// Orientation tag, passed through (1 = top-left).
    pub orientation: u16,
    /// Compression tag, passed through and never reinterpreted.
    pub compression: u16,
    /// Ordered roles of the samples beyond the base color channels.
    pub extra_samples: Vec<ExtraSample>,
}

impl ImageMeta {
    /// Number of base color channels implied by the photometric interpretation.
    pub fn base_color_samples(&self) -> u16 {
        match self.photometric {
            Photometric::Rgb => 3,
            Photometric::Separated => 4,
            Photometric::MinIsBlack | Photometric::MinIsWhite => 1,
            Photometric::Other(_) => self
                .samples_per_pixel
                .saturating_sub(self.extra_samples.len() as u16),
        }
    }

    /// Number of extra (non-color) samples.
    pub fn extra_count(&self) -> u16 {
        self.extra_samples.len() as u16
    }

    /// Whether any extra sample carries an alpha role.
    pub fn has_alpha(&self) -> bool {
        self.extra_samples.iter().any(|s| s.is_alpha())
    }

    /// Index of the alpha role within `extra_samples`, if present.
    pub fn alpha_extra_index(&self) -> Option<usize> {
        self.extra_samples.iter().position(|s| s.is_alpha())
    }

    /// Absolute sample index of the alpha channel, if present.
    pub fn alpha_sample_index(&self) -> Option<usize> {
        self.alpha_extra_index()
            .map(|i| self.base_color_samples() as usize + i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_meta(extras: Vec<ExtraSample>) -> ImageMeta {
        ImageMeta {
            width: 4,
            height: 4,
            samples_per_pixel: 3 + extras.len() as u16,
            bits_per_sample: 8,
            photometric: Photometric::Rgb,
            planar_config: PlanarConfig::Contiguous,
            x_resolution: 300.0,
            y_resolution: 300.0,
            resolution_unit: 2,
            orientation: 1,
            compression: 1,
            extra_samples: extras,
        }
    }

    #[test]
    fn test_channel_accounting() {
        let meta = rgb_meta(vec![
            ExtraSample::Unspecified,
            ExtraSample::UnassociatedAlpha,
        ]);
        assert_eq!(meta.base_color_samples(), 3);
        assert_eq!(meta.extra_count(), 2);
        assert_eq!(
            meta.samples_per_pixel,
            meta.base_color_samples() + meta.extra_count()
        );
    }

    #[test]
    fn test_alpha_lookup() {
        let meta = rgb_meta(vec![
            ExtraSample::Unspecified,
            ExtraSample::UnassociatedAlpha,
        ]);
        assert!(meta.has_alpha());
        assert_eq!(meta.alpha_extra_index(), Some(1));
        assert_eq!(meta.alpha_sample_index(), Some(4));

        let no_alpha = rgb_meta(vec![ExtraSample::Unspecified]);
        assert!(!no_alpha.has_alpha());
        assert_eq!(no_alpha.alpha_sample_index(), None);
    }

    #[test]
    fn test_extra_sample_round_trip() {
        for v in [0u16, 1, 2] {
            assert_eq!(ExtraSample::from_u16(v).as_u16(), v);
        }
        // Unknown roles collapse to Unspecified.
        assert_eq!(ExtraSample::from_u16(9), ExtraSample::Unspecified);
    }
}
