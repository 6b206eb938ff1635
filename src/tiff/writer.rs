// src/tiff/writer.rs

//! Baseline TIFF encoding from the [`Image`] model.
//!
//! `IfdWriter` collects tag entries while pixel strips stream out, then
//! writes the directory at the end of the file and patches the header's
//! directory offset, the same placeholder-then-patch shape the engine uses
//! everywhere it builds container structures.

use crate::image::{Image, PlanarConfig};
use crate::irb::template::SpotTemplate;
use crate::tiff::tags::*;
use crate::utils::error::{Result, SepError};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Strips aim for roughly 8 KiB each, the libtiff default.
const TARGET_STRIP_BYTES: usize = 8 * 1024;

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    /// Value bytes, already little-endian.
    payload: Vec<u8>,
}

/// Little-endian TIFF writer over any `Write + Seek` destination.
pub(crate) struct IfdWriter<W: Write + Seek> {
    w: W,
    entries: Vec<Entry>,
}

impl<W: Write + Seek> IfdWriter<W> {
    /// Writes the file header with a placeholder directory offset.
    pub(crate) fn new(mut w: W) -> Result<Self> {
        w.write_all(b"II")?;
        w.write_u16::<LittleEndian>(42)?;
        w.write_u32::<LittleEndian>(0)?; // patched by finish()
        Ok(IfdWriter {
            w,
            entries: Vec::new(),
        })
    }

    pub(crate) fn set_short(&mut self, tag: u16, value: u16) {
        self.set_shorts(tag, &[value]);
    }

    pub(crate) fn set_shorts(&mut self, tag: u16, values: &[u16]) {
        let mut payload = Vec::with_capacity(values.len() * 2);
        for &v in values {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        self.entries.push(Entry {
            tag,
            kind: TYPE_SHORT,
            count: values.len() as u32,
            payload,
        });
    }

    pub(crate) fn set_long(&mut self, tag: u16, value: u32) {
        self.set_longs(tag, &[value]);
    }

    pub(crate) fn set_longs(&mut self, tag: u16, values: &[u32]) {
        let mut payload = Vec::with_capacity(values.len() * 4);
        for &v in values {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        self.entries.push(Entry {
            tag,
            kind: TYPE_LONG,
            count: values.len() as u32,
            payload,
        });
    }

    /// Stores an f32 as a RATIONAL with a fixed 10000 denominator.
    pub(crate) fn set_rational(&mut self, tag: u16, value: f32) {
        let num = (value * 10_000.0).round().max(0.0) as u32;
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&num.to_le_bytes());
        payload.extend_from_slice(&10_000u32.to_le_bytes());
        self.entries.push(Entry {
            tag,
            kind: TYPE_RATIONAL,
            count: 1,
            payload,
        });
    }

    /// NUL-separated ASCII payload, stored verbatim (count includes NULs).
    pub(crate) fn set_ascii(&mut self, tag: u16, bytes: &[u8]) {
        self.entries.push(Entry {
            tag,
            kind: TYPE_ASCII,
            count: bytes.len() as u32,
            payload: bytes.to_vec(),
        });
    }

    /// Raw BYTE payload (used for the Photoshop resource blob).
    pub(crate) fn set_bytes(&mut self, tag: u16, bytes: &[u8]) {
        self.entries.push(Entry {
            tag,
            kind: TYPE_BYTE,
            count: bytes.len() as u32,
            payload: bytes.to_vec(),
        });
    }

    /// Streams the interleaved pixel buffer out as strips, recording the
    /// strip offset/byte-count tags. `row_bytes` is the writer's stride.
    pub(crate) fn write_strips(
        &mut self,
        buffer: &[u8],
        row_bytes: usize,
        height: u32,
        rows_per_strip: u32,
    ) -> Result<()> {
        let mut offsets = Vec::new();
        let mut counts = Vec::new();

        let mut row = 0u32;
        while row < height {
            let rows = rows_per_strip.min(height - row) as usize;
            let start = row as usize * row_bytes;
            let len = rows * row_bytes;

            let offset = self
                .w
                .stream_position()
                .map_err(|_| SepError::ScanlineWriteFailed { row })?;
            self.w
                .write_all(&buffer[start..start + len])
                .map_err(|_| SepError::ScanlineWriteFailed { row })?;

            offsets.push(offset as u32);
            counts.push(len as u32);
            row += rows as u32;
        }

        self.set_longs(TAG_STRIP_OFFSETS, &offsets);
        self.set_longs(TAG_STRIP_BYTE_COUNTS, &counts);
        Ok(())
    }

    /// Writes out-of-line payloads and the directory, then patches the
    /// header's directory offset.
    pub(crate) fn finish(mut self) -> Result<()> {
        let mut entries = std::mem::take(&mut self.entries);
        entries.sort_by_key(|e| e.tag);

        // Out-of-line values first, word-aligned.
        let mut value_offsets = vec![0u32; entries.len()];
        for (i, entry) in entries.iter().enumerate() {
            if entry.payload.len() > 4 {
                self.align()?;
                value_offsets[i] = self.w.stream_position()? as u32;
                self.w.write_all(&entry.payload)?;
            }
        }

        self.align()?;
        let ifd_offset = self.w.stream_position()? as u32;
        self.w.write_u16::<LittleEndian>(entries.len() as u16)?;
        for (i, entry) in entries.iter().enumerate() {
            self.w.write_u16::<LittleEndian>(entry.tag)?;
            self.w.write_u16::<LittleEndian>(entry.kind)?;
            self.w.write_u32::<LittleEndian>(entry.count)?;
            if entry.payload.len() > 4 {
                self.w.write_u32::<LittleEndian>(value_offsets[i])?;
            } else {
                let mut value = [0u8; 4];
                value[..entry.payload.len()].copy_from_slice(&entry.payload);
                self.w.write_all(&value)?;
            }
        }
        self.w.write_u32::<LittleEndian>(0)?; // no further directories

        self.w.seek(SeekFrom::Start(4))?;
        self.w.write_u32::<LittleEndian>(ifd_offset)?;
        self.w.flush()?;
        Ok(())
    }

    fn align(&mut self) -> Result<()> {
        if self.w.stream_position()? % 2 != 0 {
            self.w.write_all(&[0])?;
        }
        Ok(())
    }
}

/// Encodes the image to `path`, embedding the donor template's resource
/// blob when one is loaded.
///
/// The template gate (sample count and extra count must equal the donor
/// fingerprint) runs before the destination is even created; a row failure
/// later leaves the destination file in an indeterminate state, as no
/// temp-file/rename step is performed.
pub fn encode(path: &Path, image: &Image, template: &SpotTemplate) -> Result<()> {
    let meta = &image.meta;

    if image.raw.buffer.is_empty() {
        return Err(SepError::EmptyBuffer);
    }
    if !template.is_empty()
        && (meta.samples_per_pixel != template.samples_per_pixel
            || meta.extra_count() != template.extra_count)
    {
        return Err(SepError::TemplateMismatch {
            image_samples: meta.samples_per_pixel,
            image_extras: meta.extra_count(),
            template_samples: template.samples_per_pixel,
            template_extras: template.extra_count,
        });
    }
    if meta.planar_config == PlanarConfig::Separate {
        return Err(SepError::Unsupported(
            "encoding separate-plane layouts".into(),
        ));
    }
    if meta.width == 0 || meta.height == 0 || meta.samples_per_pixel == 0 {
        return Err(SepError::InvalidDimensions {
            width: meta.width,
            height: meta.height,
            samples_per_pixel: meta.samples_per_pixel,
        });
    }

    // Stride recomputed from the target tag set; injection changes the
    // sample count, so the stored stride may describe the old layout.
    let row_bytes = meta.width as usize * meta.samples_per_pixel as usize;
    let needed = row_bytes * meta.height as usize;
    if image.raw.buffer.len() < needed {
        return Err(SepError::InvalidInput(format!(
            "raster buffer holds {} bytes, layout needs {}",
            image.raw.buffer.len(),
            needed
        )));
    }
    let rows_per_strip = (TARGET_STRIP_BYTES / row_bytes).clamp(1, meta.height as usize) as u32;

    let file = File::create(path).map_err(|e| SepError::OpenFailed(e.to_string()))?;
    let mut w = IfdWriter::new(BufWriter::new(file))?;

    w.set_long(TAG_IMAGE_WIDTH, meta.width);
    w.set_long(TAG_IMAGE_LENGTH, meta.height);
    w.set_short(TAG_SAMPLES_PER_PIXEL, meta.samples_per_pixel);
    w.set_shorts(
        TAG_BITS_PER_SAMPLE,
        &vec![meta.bits_per_sample; meta.samples_per_pixel as usize],
    );
    w.set_short(TAG_PHOTOMETRIC, meta.photometric.as_u16());
    w.set_short(TAG_PLANAR_CONFIG, meta.planar_config.as_u16());
    w.set_short(TAG_ORIENTATION, meta.orientation);
    w.set_short(TAG_COMPRESSION, meta.compression);
    w.set_rational(TAG_X_RESOLUTION, meta.x_resolution);
    w.set_rational(TAG_Y_RESOLUTION, meta.y_resolution);
    w.set_short(TAG_RESOLUTION_UNIT, meta.resolution_unit);
    w.set_long(TAG_ROWS_PER_STRIP, rows_per_strip);

    if !meta.extra_samples.is_empty() {
        let roles: Vec<u16> = meta.extra_samples.iter().map(|s| s.as_u16()).collect();
        w.set_shorts(TAG_EXTRA_SAMPLES, &roles);
    }
    if !template.is_empty() {
        w.set_bytes(TAG_PHOTOSHOP, template.blob());
    }

    w.write_strips(
        &image.raw.buffer[..needed],
        row_bytes,
        meta.height,
        rows_per_strip,
    )?;
    w.finish()
}
