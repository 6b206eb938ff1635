// src/export.rs

//! Standalone CMYK(+spot) TIFF export from a caller-supplied pixel buffer.
//!
//! A one-shot encoder for callers that already hold interleaved separated
//! pixels: no image model, no donor template, generic synthesized ink
//! names. The orchestrated pipeline does not use this path.

use crate::tiff::IfdWriter;
use crate::tiff::tags::*;
use crate::utils::error::SepError;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty source buffer or zero dimensions")]
    EmptySource,

    #[error("unsupported bit depth {0} (only 8 bits per channel)")]
    UnsupportedDepth(u16),

    #[error("channel count {0} is below the CMYK minimum of 4")]
    TooFewChannels(u16),

    #[error("stride {stride} holds fewer than {width} pixels of {channels} channels")]
    StrideTooSmall {
        stride: usize,
        width: u32,
        channels: u16,
    },

    #[error("failed to write scanline {0}")]
    ScanlineWrite(u32),
}

impl From<ExportError> for SepError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Io(e) => SepError::Io(e),
            ExportError::ScanlineWrite(row) => SepError::ScanlineWriteFailed { row },
            other => SepError::InvalidInput(format!("CMYK export: {}", other)),
        }
    }
}

/// NUL-separated ink names: the four process inks plus `Spot1…SpotN`.
fn ink_names(spot_count: u16) -> Vec<u8> {
    let mut names = b"Cyan\0Magenta\0Yellow\0Black\0".to_vec();
    for i in 0..spot_count {
        names.extend_from_slice(format!("Spot{}\0", i + 1).as_bytes());
    }
    names
}

/// Writes `data` as a Separated (CMYK + spots) TIFF.
///
/// `data` is interleaved with `bytes_per_line` stride; channels beyond the
/// four process inks are tagged as unspecified extras and named `SpotN`.
/// One strip per row, uncompressed, little-endian.
pub fn write_cmyk_tiff(
    path: &Path,
    data: &[u8],
    width: u32,
    height: u32,
    bits_per_channel: u16,
    bytes_per_line: usize,
    channel_count: u16,
) -> Result<(), ExportError> {
    if data.is_empty() || width == 0 || height == 0 {
        return Err(ExportError::EmptySource);
    }
    if channel_count < 4 {
        return Err(ExportError::TooFewChannels(channel_count));
    }
    if bits_per_channel != 8 {
        return Err(ExportError::UnsupportedDepth(bits_per_channel));
    }

    let row_bytes = width as usize * channel_count as usize;
    if bytes_per_line < row_bytes {
        return Err(ExportError::StrideTooSmall {
            stride: bytes_per_line,
            width,
            channels: channel_count,
        });
    }
    if data.len() < (height as usize - 1) * bytes_per_line + row_bytes {
        return Err(ExportError::EmptySource);
    }

    let spot_count = channel_count - 4;

    let file = File::create(path)?;
    let mut w = IfdWriter::new(BufWriter::new(file)).map_err(io_of)?;

    w.set_long(TAG_IMAGE_WIDTH, width);
    w.set_long(TAG_IMAGE_LENGTH, height);
    w.set_shorts(
        TAG_BITS_PER_SAMPLE,
        &vec![bits_per_channel; channel_count as usize],
    );
    w.set_short(TAG_SAMPLES_PER_PIXEL, channel_count);
    w.set_short(TAG_PLANAR_CONFIG, 1);
    w.set_short(TAG_PHOTOMETRIC, 5); // Separated
    w.set_short(TAG_COMPRESSION, COMPRESSION_NONE);
    w.set_long(TAG_ROWS_PER_STRIP, 1);
    w.set_short(TAG_INK_SET, INKSET_CMYK);

    if spot_count > 0 {
        w.set_shorts(TAG_EXTRA_SAMPLES, &vec![0u16; spot_count as usize]);
        w.set_ascii(TAG_INK_NAMES, &ink_names(spot_count));
    }

    // Repack to the output stride; the caller's rows may carry padding.
    let mut packed = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let start = y * bytes_per_line;
        packed.extend_from_slice(&data[start..start + row_bytes]);
    }

    w.write_strips(&packed, row_bytes, height, 1)
        .map_err(strip_failure)?;
    w.finish().map_err(io_of)?;
    Ok(())
}

fn io_of(err: SepError) -> ExportError {
    ExportError::Io(std::io::Error::other(err.to_string()))
}

fn strip_failure(err: SepError) -> ExportError {
    match err {
        SepError::ScanlineWriteFailed { row } => ExportError::ScanlineWrite(row),
        other => io_of(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_arguments() {
        let out = Path::new("/tmp/unused.tif");
        assert!(matches!(
            write_cmyk_tiff(out, &[], 2, 2, 8, 8, 4),
            Err(ExportError::EmptySource)
        ));
        assert!(matches!(
            write_cmyk_tiff(out, &[0; 16], 2, 2, 8, 8, 3),
            Err(ExportError::TooFewChannels(3))
        ));
        assert!(matches!(
            write_cmyk_tiff(out, &[0; 16], 2, 2, 16, 8, 4),
            Err(ExportError::UnsupportedDepth(16))
        ));
        assert!(matches!(
            write_cmyk_tiff(out, &[0; 16], 2, 2, 8, 4, 4),
            Err(ExportError::StrideTooSmall { .. })
        ));
    }

    #[test]
    fn test_ink_names_layout() {
        let names = ink_names(2);
        let parts: Vec<&[u8]> = names.split(|&b| b == 0).collect();
        // Trailing NUL yields a final empty split.
        assert_eq!(
            parts,
            vec![
                b"Cyan".as_slice(),
                b"Magenta",
                b"Yellow",
                b"Black",
                b"Spot1",
                b"Spot2",
                b"",
            ]
        );
    }
}
