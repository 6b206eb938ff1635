// src/image/model.rs

//! The working image: decoded tag metadata plus the raw sample buffer.

use crate::image::meta::{ImageMeta, PlanarConfig};

/// Raw pixel bytes exactly as read from (or destined for) the file.
///
/// Layout:
/// - `Contiguous`: rows of interleaved samples, `bytes_per_row` each.
/// - `Separate`: `samples_per_pixel` planes, each `bytes_per_row × height`.
#[derive(Debug, Clone, Default)]
pub struct RawRaster {
    pub buffer: Vec<u8>,
    /// Scanline stride as computed by the codec, not derived from meta.
    pub bytes_per_row: u32,
}

/// A decoded image: the only stateful entity the engine owns.
///
/// Created by `tiff::decode`, rewritten wholesale by channel injection,
/// consumed read-only by `tiff::encode`. Single ownership; no stage holds
/// onto it across calls.
#[derive(Debug, Clone)]
pub struct Image {
    pub meta: ImageMeta,
    pub raw: RawRaster,
}

impl Image {
    /// Total channel count per pixel.
    pub fn channel_count(&self) -> u16 {
        self.meta.samples_per_pixel
    }

    /// Buffer length implied by the meta and the recorded scanline stride.
    pub fn expected_buffer_len(&self) -> usize {
        let rows = self.raw.bytes_per_row as usize * self.meta.height as usize;
        match self.meta.planar_config {
            PlanarConfig::Contiguous => rows,
            PlanarConfig::Separate => rows * self.meta.samples_per_pixel as usize,
        }
    }

    /// Whether the buffer length matches the metadata.
    pub fn buffer_consistent(&self) -> bool {
        self.raw.buffer.len() == self.expected_buffer_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::meta::{ExtraSample, Photometric};

    #[test]
    fn test_expected_buffer_len() {
        let meta = ImageMeta {
            width: 10,
            height: 4,
            samples_per_pixel: 4,
            bits_per_sample: 8,
            photometric: Photometric::Rgb,
            planar_config: PlanarConfig::Contiguous,
            x_resolution: 72.0,
            y_resolution: 72.0,
            resolution_unit: 2,
            orientation: 1,
            compression: 1,
            extra_samples: vec![ExtraSample::UnassociatedAlpha],
        };
        let img = Image {
            raw: RawRaster {
                buffer: vec![0; 160],
                bytes_per_row: 40,
            },
            meta,
        };
        assert_eq!(img.expected_buffer_len(), 160);
        assert!(img.buffer_consistent());

        let mut planar = img.clone();
        planar.meta.planar_config = PlanarConfig::Separate;
        planar.raw.bytes_per_row = 10;
        planar.raw.buffer = vec![0; 10 * 4 * 4];
        assert!(planar.buffer_consistent());
    }
}
