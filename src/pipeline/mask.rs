// src/pipeline/mask.rs

//! Binary mask derivation and structural cleanup.

use crate::image::GrayRaster;

/// Thresholds the blackness map into a keep/remove mask.
///
/// The threshold is inverted: pixels at or below `thresh` (low blackness)
/// become 255 (kept/opaque), pixels above it become 0 (removed). Raising
/// `thresh` can only turn 0-pixels into 255-pixels.
pub fn mask_by_threshold(blackness: &GrayRaster, thresh: u8) -> GrayRaster {
    let (width, height) = blackness.dimensions();
    let values = blackness
        .values()
        .iter()
        .map(|&v| if v > thresh { 0 } else { 255 })
        .collect();
    GrayRaster::from_vec(width, height, values)
}

/// Binary morphological closing (dilate, then erode) with a disc of the
/// given radius. Fills pinholes and hairline gaps up to the disc size.
///
/// This is the structural alternative to the area filter; the orchestrated
/// pipeline uses the latter, but both remain callable.
pub fn morph_close(mask: &GrayRaster, radius: u32) -> GrayRaster {
    if radius == 0 {
        return mask.clone();
    }
    erode(&dilate(mask, radius), radius)
}

fn disc_offsets(radius: u32) -> Vec<(i64, i64)> {
    let r = radius as i64;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

fn dilate(mask: &GrayRaster, radius: u32) -> GrayRaster {
    let (width, height) = mask.dimensions();
    let offsets = disc_offsets(radius);
    GrayRaster::from_fn(width, height, |x, y| {
        let hit = offsets.iter().any(|&(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            nx >= 0
                && ny >= 0
                && nx < width as i64
                && ny < height as i64
                && mask.get(nx as u32, ny as u32) != 0
        });
        if hit { 255 } else { 0 }
    })
}

fn erode(mask: &GrayRaster, radius: u32) -> GrayRaster {
    let (width, height) = mask.dimensions();
    let offsets = disc_offsets(radius);
    GrayRaster::from_fn(width, height, |x, y| {
        let all = offsets.iter().all(|&(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            nx < 0
                || ny < 0
                || nx >= width as i64
                || ny >= height as i64
                || mask.get(nx as u32, ny as u32) != 0
        });
        if all { 255 } else { 0 }
    })
}
