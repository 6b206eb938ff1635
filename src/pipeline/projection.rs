// src/pipeline/projection.rs

//! Projection of decoded channel data into the 3-channel working color.

use crate::image::{Image, Photometric, PlanarConfig, Rgb8, RgbRaster};
use crate::utils::error::{Result, SepError};

fn clamp8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Converts the decoded image into the working RGB raster.
///
/// RGB sources are a pure channel reinterpretation with no arithmetic, so
/// the original channel values are recoverable from the result. Separated
/// sources use the fixed industrial approximation `255 − (ink + K)` per
/// primary, deliberately not color-managed. Anything else is unsupported.
pub fn to_display(image: &Image) -> Result<RgbRaster> {
    let meta = &image.meta;

    if meta.bits_per_sample != 8 {
        return Err(SepError::Unsupported(
            "display projection of non-8-bit data".into(),
        ));
    }
    if meta.planar_config != PlanarConfig::Contiguous {
        return Err(SepError::Unsupported(
            "display projection of separate-plane layouts".into(),
        ));
    }
    if meta.width == 0 || meta.height == 0 || meta.samples_per_pixel < 3 {
        return Err(SepError::InvalidDimensions {
            width: meta.width,
            height: meta.height,
            samples_per_pixel: meta.samples_per_pixel,
        });
    }

    let stride = meta.samples_per_pixel as usize;
    let pixel_count = meta.width as usize * meta.height as usize;
    if image.raw.buffer.len() < pixel_count * stride {
        return Err(SepError::EmptyBuffer);
    }
    let src = &image.raw.buffer;

    let mut pixels = Vec::with_capacity(pixel_count);
    match meta.photometric {
        Photometric::Rgb => {
            for i in 0..pixel_count {
                let p = &src[i * stride..];
                pixels.push(Rgb8::new(p[0], p[1], p[2]));
            }
        }
        Photometric::Separated => {
            if meta.samples_per_pixel < 4 {
                return Err(SepError::Unsupported(
                    "separated data with fewer than 4 channels".into(),
                ));
            }
            for i in 0..pixel_count {
                let p = &src[i * stride..];
                let (c, m, y, k) = (p[0] as i32, p[1] as i32, p[2] as i32, p[3] as i32);
                pixels.push(Rgb8::new(
                    clamp8(255 - (c + k)),
                    clamp8(255 - (m + k)),
                    clamp8(255 - (y + k)),
                ));
            }
        }
        other => {
            return Err(SepError::Unsupported(format!(
                "display projection of photometric {:?}",
                other
            )));
        }
    }

    Ok(RgbRaster::from_vec(meta.width, meta.height, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ExtraSample, ImageMeta, RawRaster};

    fn image(photometric: Photometric, spp: u16, buffer: Vec<u8>) -> Image {
        Image {
            meta: ImageMeta {
                width: 2,
                height: 1,
                samples_per_pixel: spp,
                bits_per_sample: 8,
                photometric,
                planar_config: PlanarConfig::Contiguous,
                x_resolution: 72.0,
                y_resolution: 72.0,
                resolution_unit: 2,
                orientation: 1,
                compression: 1,
                extra_samples: vec![],
            },
            raw: RawRaster {
                bytes_per_row: 2 * spp as u32,
                buffer,
            },
        }
    }

    #[test]
    fn test_rgb_projection_is_a_permutation() {
        let img = image(Photometric::Rgb, 3, vec![10, 20, 30, 40, 50, 60]);
        let rgb = to_display(&img).unwrap();
        assert_eq!(rgb.get_pixel(0, 0), Rgb8::new(10, 20, 30));
        assert_eq!(rgb.get_pixel(1, 0), Rgb8::new(40, 50, 60));
    }

    #[test]
    fn test_rgb_projection_ignores_extra_channels() {
        let mut img = image(Photometric::Rgb, 4, vec![10, 20, 30, 99, 40, 50, 60, 99]);
        img.meta.extra_samples = vec![ExtraSample::UnassociatedAlpha];
        let rgb = to_display(&img).unwrap();
        assert_eq!(rgb.get_pixel(0, 0), Rgb8::new(10, 20, 30));
        assert_eq!(rgb.get_pixel(1, 0), Rgb8::new(40, 50, 60));
    }

    #[test]
    fn test_separated_projection_arithmetic() {
        let img = image(
            Photometric::Separated,
            4,
            vec![0, 0, 0, 0, 100, 50, 200, 100],
        );
        let rgb = to_display(&img).unwrap();
        assert_eq!(rgb.get_pixel(0, 0), Rgb8::new(255, 255, 255));
        // 255-(100+100)=55, 255-(50+100)=105, 255-(200+100)=clamped 0
        assert_eq!(rgb.get_pixel(1, 0), Rgb8::new(55, 105, 0));
    }

    #[test]
    fn test_gray_photometric_unsupported() {
        let img = image(Photometric::MinIsBlack, 3, vec![0; 6]);
        assert!(matches!(
            to_display(&img),
            Err(SepError::Unsupported(_))
        ));
    }
}
