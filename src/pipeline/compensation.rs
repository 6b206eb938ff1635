// src/pipeline/compensation.rs

//! White-ink compensation: a density ramp for low-coverage areas.

use crate::image::GrayRaster;
use crate::utils::error::{Result, SepError};

/// Synthesizes the white-ink density map.
///
/// Opaque pixels (mask nonzero) whose blackness lies below `thresh`
/// receive `round((thresh − blackness) × 255 / thresh)`: the lower the
/// coverage, the denser the white underprint. Pixels that are masked out
/// or at/above the threshold receive no white.
pub fn white_compensation(
    blackness: &GrayRaster,
    mask: &GrayRaster,
    thresh: u8,
) -> Result<GrayRaster> {
    if blackness.is_empty() || mask.is_empty() {
        return Err(SepError::InvalidInput(
            "empty raster passed to white compensation".into(),
        ));
    }
    if blackness.dimensions() != mask.dimensions() {
        return Err(SepError::DimensionMismatch {
            expected: blackness.dimensions(),
            actual: mask.dimensions(),
        });
    }
    if thresh == 0 {
        return Err(SepError::InvalidThreshold(0));
    }

    let t = thresh as u32;
    let (width, height) = blackness.dimensions();
    let values = blackness
        .values()
        .iter()
        .zip(mask.values())
        .map(|(&b, &m)| {
            if m == 0 || b >= thresh {
                0
            } else {
                // Round-half-up ramp, clamped into the byte range.
                let v = ((t - b as u32) * 255 + t / 2) / t;
                v.min(255) as u8
            }
        })
        .collect();

    Ok(GrayRaster::from_vec(width, height, values))
}

/// Complements a raster (255 − v); derives the spot-channel densities from
/// the compensation map.
pub fn invert(raster: &GrayRaster) -> GrayRaster {
    let (width, height) = raster.dimensions();
    let values = raster.values().iter().map(|&v| 255 - v).collect();
    GrayRaster::from_vec(width, height, values)
}
