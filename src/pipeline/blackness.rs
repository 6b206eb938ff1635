// src/pipeline/blackness.rs

//! Per-pixel blackness (ink coverage) scoring of the working color.

use crate::image::{GrayRaster, Rgb8, RgbRaster};

/// How a pixel's blackness is estimated from its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlacknessMethod {
    /// Plain luma (0.299 R + 0.587 G + 0.114 B), for debugging/reference.
    Gray,
    /// Darkness weighted by neutrality; bright or saturated pixels score low.
    #[default]
    DarkNeutral,
    /// Approximates K as 255 − max(R, G, B).
    MaxChannel,
}

fn score_pixel(p: Rgb8, method: BlacknessMethod) -> u8 {
    let (r, g, b) = (p.r, p.g, p.b);
    match method {
        BlacknessMethod::Gray => {
            (0.299f32 * r as f32 + 0.587f32 * g as f32 + 0.114f32 * b as f32) as u8
        }
        BlacknessMethod::DarkNeutral => {
            let brightness = (r as f32 + g as f32 + b as f32) / (3.0 * 255.0);
            let dark = 1.0 - brightness;

            let maxv = r.max(g).max(b);
            let minv = r.min(g).min(b);
            let chroma = (maxv - minv) as f32 / 255.0;
            let neutral = 1.0 - chroma;

            ((dark * neutral).clamp(0.0, 1.0) * 255.0).round() as u8
        }
        BlacknessMethod::MaxChannel => 255 - r.max(g).max(b),
    }
}

/// Scores every pixel of the working color, yielding the blackness map.
pub fn score(rgb: &RgbRaster, method: BlacknessMethod) -> GrayRaster {
    let (width, height) = rgb.dimensions();

    #[cfg(feature = "rayon")]
    let values: Vec<u8> = {
        use rayon::prelude::*;
        rgb.pixels()
            .par_iter()
            .map(|&p| score_pixel(p, method))
            .collect()
    };

    #[cfg(not(feature = "rayon"))]
    let values: Vec<u8> = rgb
        .pixels()
        .iter()
        .map(|&p| score_pixel(p, method))
        .collect();

    GrayRaster::from_vec(width, height, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The reference fixture: a 2x1 image with a light neutral pixel and a
    /// saturated green pixel.
    fn fixture() -> RgbRaster {
        RgbRaster::from_vec(
            2,
            1,
            vec![Rgb8::new(200, 200, 200), Rgb8::new(10, 200, 10)],
        )
    }

    #[test]
    fn test_gray_exact_bytes() {
        let out = score(&fixture(), BlacknessMethod::Gray);
        // 0.299*200 + 0.587*200 + 0.114*200 = 200
        // 0.299*10 + 0.587*200 + 0.114*10 = 121.53, truncated
        assert_eq!(out.values(), &[200, 121]);
    }

    #[test]
    fn test_dark_neutral_exact_bytes() {
        let out = score(&fixture(), BlacknessMethod::DarkNeutral);
        // pixel 0: dark = 1 - 200/255, chroma = 0  ->  55/255 exactly
        // pixel 1: dark = 1 - 220/765 = 0.71242, neutral = 1 - 190/255
        //          = 0.25490, product*255 = 46.31 -> 46
        assert_eq!(out.values(), &[55, 46]);
    }

    #[test]
    fn test_max_channel_exact_bytes() {
        let out = score(&fixture(), BlacknessMethod::MaxChannel);
        assert_eq!(out.values(), &[55, 55]);
    }

    #[test]
    fn test_black_and_white_extremes() {
        let rgb = RgbRaster::from_vec(
            2,
            1,
            vec![Rgb8::new(0, 0, 0), Rgb8::new(255, 255, 255)],
        );

        // Gray is a luma, not a blackness: black scores 0, white near 255
        // (the weights sum to 1 only within float error, so truncation may
        // land on 254).
        let gray = score(&rgb, BlacknessMethod::Gray);
        assert_eq!(gray.values()[0], 0);
        assert!(gray.values()[1] >= 254);

        for method in [BlacknessMethod::DarkNeutral, BlacknessMethod::MaxChannel] {
            let out = score(&rgb, method);
            assert_eq!(out.values(), &[255, 0]);
        }
    }
}
