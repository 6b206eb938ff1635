// src/pipeline/inject.rs

//! Rewrites the working image's channel layout to carry the generated
//! alpha and white-ink spot channels.

use crate::image::{ExtraSample, GrayRaster, Image, Photometric, PlanarConfig};
use crate::utils::error::{Result, SepError};
use log::debug;

/// Injects the alpha mask and two spot channels into the image.
///
/// The alpha always lands in the first extra slot (immediately after the
/// base color channels), wherever an alpha role previously lived; other
/// pre-existing extra channels keep their relative order, and the two spot
/// channels are appended last with unspecified roles. The image's role
/// list, sample count, and pixel buffer are replaced in place; the only
/// way back to the old layout is re-decoding the source file.
pub fn inject_channels(
    image: &mut Image,
    alpha: &GrayRaster,
    spot_a: &GrayRaster,
    spot_b: &GrayRaster,
) -> Result<()> {
    let meta = &image.meta;

    if meta.bits_per_sample != 8 || meta.planar_config != PlanarConfig::Contiguous {
        return Err(SepError::Unsupported(
            "channel injection needs 8-bit interleaved data".into(),
        ));
    }
    if alpha.is_empty() || spot_a.is_empty() || spot_b.is_empty() {
        return Err(SepError::InvalidInput(
            "empty raster passed to channel injection".into(),
        ));
    }
    let dims = (meta.width, meta.height);
    for raster in [alpha, spot_a, spot_b] {
        if raster.dimensions() != dims {
            return Err(SepError::DimensionMismatch {
                expected: dims,
                actual: raster.dimensions(),
            });
        }
    }

    let color_channels = match meta.photometric {
        Photometric::Rgb => 3usize,
        Photometric::Separated => 4usize,
        other => {
            return Err(SepError::Unsupported(format!(
                "channel injection into photometric {:?}",
                other
            )));
        }
    };

    let old_alpha_extra = meta.alpha_extra_index();

    // Existing alpha keeps the role list untouched; otherwise a straight
    // alpha role is inserted ahead of the existing extras.
    let mut new_extras: Vec<ExtraSample> = match old_alpha_extra {
        Some(_) => meta.extra_samples.clone(),
        None => {
            let mut v = Vec::with_capacity(meta.extra_samples.len() + 1);
            v.push(ExtraSample::UnassociatedAlpha);
            v.extend_from_slice(&meta.extra_samples);
            v
        }
    };
    new_extras.push(ExtraSample::Unspecified);
    new_extras.push(ExtraSample::Unspecified);

    let old_spp = meta.samples_per_pixel as usize;
    let new_spp = color_channels + new_extras.len();
    let pixel_count = meta.width as usize * meta.height as usize;
    if image.raw.buffer.len() < pixel_count * old_spp {
        return Err(SepError::EmptyBuffer);
    }

    let alpha_values = alpha.values();
    let spot_a_values = spot_a.values();
    let spot_b_values = spot_b.values();

    let mut buffer = vec![0u8; pixel_count * new_spp];
    for i in 0..pixel_count {
        let src = &image.raw.buffer[i * old_spp..i * old_spp + old_spp];
        let dst = &mut buffer[i * new_spp..i * new_spp + new_spp];

        dst[..color_channels].copy_from_slice(&src[..color_channels]);
        dst[color_channels] = alpha_values[i];

        // Carry the remaining old extras forward, skipping the slot the
        // alpha used to occupy.
        let mut to = color_channels + 1;
        for (e, &value) in src[color_channels..].iter().enumerate() {
            if Some(e) == old_alpha_extra {
                continue;
            }
            dst[to] = value;
            to += 1;
        }

        dst[to] = spot_a_values[i];
        dst[to + 1] = spot_b_values[i];
    }

    debug!(
        "injected channels: spp {} -> {}, extras {:?}",
        old_spp, new_spp, new_extras
    );

    image.meta.extra_samples = new_extras;
    image.meta.samples_per_pixel = new_spp as u16;
    image.raw.buffer = buffer;
    image.raw.bytes_per_row = image.meta.width * new_spp as u32;
    Ok(())
}
