// src/tiff/reader.rs

//! Baseline TIFF decoding into the [`Image`] model.
//!
//! The parser reads the header and the first tag directory over any
//! `Read + Seek` source, honoring both byte orders, then pulls pixel data
//! strip by strip. Only uncompressed 8-bit data is decoded; the compression
//! tag itself is carried through untouched.

use crate::image::{ExtraSample, Image, ImageMeta, Photometric, PlanarConfig, RawRaster};
use crate::tiff::tags::*;
use crate::utils::error::{Result, SepError};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// One directory entry with its payload already pulled into memory.
struct RawField {
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

/// The first image file directory of a TIFF, with typed accessors that
/// resolve endianness and SHORT/LONG coercions.
pub(crate) struct Directory {
    big_endian: bool,
    fields: HashMap<u16, RawField>,
}

/// Tags whose payloads we load; anything else is skipped unread.
const KNOWN_TAGS: &[u16] = &[
    TAG_IMAGE_WIDTH,
    TAG_IMAGE_LENGTH,
    TAG_BITS_PER_SAMPLE,
    TAG_COMPRESSION,
    TAG_PHOTOMETRIC,
    TAG_STRIP_OFFSETS,
    TAG_ORIENTATION,
    TAG_SAMPLES_PER_PIXEL,
    TAG_ROWS_PER_STRIP,
    TAG_STRIP_BYTE_COUNTS,
    TAG_X_RESOLUTION,
    TAG_Y_RESOLUTION,
    TAG_PLANAR_CONFIG,
    TAG_RESOLUTION_UNIT,
    TAG_EXTRA_SAMPLES,
    TAG_PHOTOSHOP,
];

impl Directory {
    pub(crate) fn read_from<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let mut order = [0u8; 2];
        r.read_exact(&mut order)
            .map_err(|_| SepError::OpenFailed("file too short for TIFF header".into()))?;
        let big_endian = match &order {
            b"II" => false,
            b"MM" => true,
            _ => return Err(SepError::OpenFailed("not a TIFF byte-order mark".into())),
        };

        let magic = read_u16(r, big_endian)
            .map_err(|_| SepError::OpenFailed("truncated TIFF header".into()))?;
        if magic != 42 {
            return Err(SepError::OpenFailed(format!(
                "bad TIFF magic number {}",
                magic
            )));
        }

        let ifd_offset = read_u32(r, big_endian)
            .map_err(|_| SepError::OpenFailed("truncated TIFF header".into()))?;
        r.seek(SeekFrom::Start(ifd_offset as u64))
            .map_err(|_| SepError::OpenFailed("directory offset out of range".into()))?;

        let entry_count = read_u16(r, big_endian)
            .map_err(|_| SepError::OpenFailed("truncated tag directory".into()))?;

        let mut fields = HashMap::new();
        for _ in 0..entry_count {
            let mut entry = [0u8; 12];
            r.read_exact(&mut entry)
                .map_err(|_| SepError::OpenFailed("truncated tag directory".into()))?;

            let tag = scalar_u16(&entry[0..2], big_endian);
            let kind = scalar_u16(&entry[2..4], big_endian);
            let count = scalar_u32(&entry[4..8], big_endian);

            if !KNOWN_TAGS.contains(&tag) {
                continue;
            }
            let unit = type_size(kind);
            if unit == 0 {
                continue;
            }
            let size = unit as u64 * count as u64;
            if size > u32::MAX as u64 {
                return Err(SepError::OpenFailed(format!(
                    "tag {} declares an oversized payload",
                    tag
                )));
            }

            let data = if size <= 4 {
                entry[8..8 + size as usize].to_vec()
            } else {
                let offset = scalar_u32(&entry[8..12], big_endian);
                let here = r
                    .stream_position()
                    .map_err(|e| SepError::OpenFailed(e.to_string()))?;
                r.seek(SeekFrom::Start(offset as u64))
                    .map_err(|_| SepError::OpenFailed("tag payload offset out of range".into()))?;
                let mut data = vec![0u8; size as usize];
                r.read_exact(&mut data)
                    .map_err(|_| SepError::OpenFailed(format!("truncated payload for tag {}", tag)))?;
                r.seek(SeekFrom::Start(here))
                    .map_err(|e| SepError::OpenFailed(e.to_string()))?;
                data
            };

            fields.insert(tag, RawField { kind, count, data });
        }

        Ok(Directory { big_endian, fields })
    }

    /// First value of a SHORT or LONG field, widened to u32.
    pub(crate) fn long(&self, tag: u16) -> Option<u32> {
        self.longs(tag).and_then(|v| v.first().copied())
    }

    /// First value of a SHORT field.
    pub(crate) fn short(&self, tag: u16) -> Option<u16> {
        self.long(tag).map(|v| v as u16)
    }

    /// All values of a SHORT or LONG field, widened to u32.
    pub(crate) fn longs(&self, tag: u16) -> Option<Vec<u32>> {
        let f = self.fields.get(&tag)?;
        let mut out = Vec::with_capacity(f.count as usize);
        match f.kind {
            TYPE_SHORT => {
                for i in 0..f.count as usize {
                    out.push(scalar_u16(&f.data[i * 2..i * 2 + 2], self.big_endian) as u32);
                }
            }
            TYPE_LONG => {
                for i in 0..f.count as usize {
                    out.push(scalar_u32(&f.data[i * 4..i * 4 + 4], self.big_endian));
                }
            }
            _ => return None,
        }
        Some(out)
    }

    /// First value of a RATIONAL field as an f32 (0 denominator yields 0).
    pub(crate) fn rational(&self, tag: u16) -> Option<f32> {
        let f = self.fields.get(&tag)?;
        if f.kind != TYPE_RATIONAL || f.data.len() < 8 {
            return None;
        }
        let num = scalar_u32(&f.data[0..4], self.big_endian);
        let den = scalar_u32(&f.data[4..8], self.big_endian);
        if den == 0 {
            Some(0.0)
        } else {
            Some(num as f32 / den as f32)
        }
    }

    /// Raw payload of a BYTE/UNDEFINED field.
    pub(crate) fn bytes(&self, tag: u16) -> Option<&[u8]> {
        let f = self.fields.get(&tag)?;
        match f.kind {
            TYPE_BYTE | 7 => Some(&f.data),
            _ => None,
        }
    }
}

fn read_u16<R: Read>(r: &mut R, big: bool) -> std::io::Result<u16> {
    if big {
        r.read_u16::<BigEndian>()
    } else {
        r.read_u16::<LittleEndian>()
    }
}

fn read_u32<R: Read>(r: &mut R, big: bool) -> std::io::Result<u32> {
    if big {
        r.read_u32::<BigEndian>()
    } else {
        r.read_u32::<LittleEndian>()
    }
}

fn scalar_u16(b: &[u8], big: bool) -> u16 {
    if big {
        BigEndian::read_u16(b)
    } else {
        LittleEndian::read_u16(b)
    }
}

fn scalar_u32(b: &[u8], big: bool) -> u32 {
    if big {
        BigEndian::read_u32(b)
    } else {
        LittleEndian::read_u32(b)
    }
}

/// Opens a TIFF and parses its first directory without touching pixel data.
/// Used by the template loader to fingerprint the donor file.
pub(crate) fn read_directory(path: &Path) -> Result<Directory> {
    let file = File::open(path).map_err(|e| SepError::OpenFailed(e.to_string()))?;
    let mut reader = BufReader::new(file);
    Directory::read_from(&mut reader)
}

/// Decodes a TIFF file into the in-memory image model.
///
/// Pixel data is read row by row (plane-by-row for planar files) into a
/// freshly allocated buffer sized from the codec's own scanline computation.
/// On any row failure the partial buffer is discarded and
/// `ScanlineReadFailed` is returned.
pub fn decode(path: &Path) -> Result<Image> {
    let file = File::open(path).map_err(|e| SepError::OpenFailed(e.to_string()))?;
    let mut r = BufReader::new(file);
    let dir = Directory::read_from(&mut r)?;

    let width = dir.long(TAG_IMAGE_WIDTH).unwrap_or(0);
    let height = dir.long(TAG_IMAGE_LENGTH).unwrap_or(0);
    let samples_per_pixel = dir.short(TAG_SAMPLES_PER_PIXEL).unwrap_or(0);
    let bits = dir.longs(TAG_BITS_PER_SAMPLE).unwrap_or_default();
    let bits_per_sample = bits.first().copied().unwrap_or(0) as u16;
    let photometric = Photometric::from_u16(dir.short(TAG_PHOTOMETRIC).unwrap_or(0));
    let planar_config = PlanarConfig::from_u16(dir.short(TAG_PLANAR_CONFIG).unwrap_or(1));
    let orientation = dir.short(TAG_ORIENTATION).unwrap_or(ORIENTATION_TOPLEFT);
    let compression = dir.short(TAG_COMPRESSION).unwrap_or(COMPRESSION_NONE);
    let x_resolution = dir.rational(TAG_X_RESOLUTION).unwrap_or(0.0);
    let y_resolution = dir.rational(TAG_Y_RESOLUTION).unwrap_or(0.0);
    let resolution_unit = dir.short(TAG_RESOLUTION_UNIT).unwrap_or(RESUNIT_INCH);
    let extra_samples: Vec<ExtraSample> = dir
        .longs(TAG_EXTRA_SAMPLES)
        .unwrap_or_default()
        .into_iter()
        .map(|v| ExtraSample::from_u16(v as u16))
        .collect();

    if bits_per_sample != 8 || bits.iter().any(|&b| b != 8) {
        return Err(SepError::UnsupportedBitDepth(bits_per_sample));
    }
    if samples_per_pixel == 0 || width == 0 || height == 0 {
        return Err(SepError::InvalidDimensions {
            width,
            height,
            samples_per_pixel,
        });
    }
    if compression != COMPRESSION_NONE {
        return Err(SepError::Unsupported(format!(
            "compressed pixel data (compression {})",
            compression
        )));
    }

    let meta = ImageMeta {
        width,
        height,
        samples_per_pixel,
        bits_per_sample,
        photometric,
        planar_config,
        x_resolution,
        y_resolution,
        resolution_unit,
        orientation,
        compression,
        extra_samples,
    };

    debug!(
        "decoded meta: {}x{} spp={} bits={} photometric={:?} planar={:?} extras={:?}",
        meta.width,
        meta.height,
        meta.samples_per_pixel,
        meta.bits_per_sample,
        meta.photometric,
        meta.planar_config,
        meta.extra_samples
    );

    let offsets = dir
        .longs(TAG_STRIP_OFFSETS)
        .ok_or_else(|| SepError::OpenFailed("missing strip offsets".into()))?;
    let counts = dir
        .longs(TAG_STRIP_BYTE_COUNTS)
        .ok_or_else(|| SepError::OpenFailed("missing strip byte counts".into()))?;
    let rows_per_strip = match dir.long(TAG_ROWS_PER_STRIP) {
        Some(0) | None => meta.height,
        Some(n) => n.min(meta.height),
    };

    // The codec's own scanline stride, independent of anything stored.
    let bytes_per_row = match meta.planar_config {
        PlanarConfig::Contiguous => meta.width as usize * meta.samples_per_pixel as usize,
        PlanarConfig::Separate => meta.width as usize,
    };
    let plane_size = bytes_per_row * meta.height as usize;
    let planes = match meta.planar_config {
        PlanarConfig::Contiguous => 1usize,
        PlanarConfig::Separate => meta.samples_per_pixel as usize,
    };
    let strips_per_plane = meta.height.div_ceil(rows_per_strip) as usize;

    let mut buffer = vec![0u8; plane_size * planes];
    for p in 0..planes {
        for y in 0..meta.height {
            let strip = p * strips_per_plane + (y / rows_per_strip) as usize;
            let row_in_strip = (y % rows_per_strip) as usize;
            let fail = SepError::ScanlineReadFailed { row: y };

            let (Some(&offset), Some(&count)) = (offsets.get(strip), counts.get(strip)) else {
                return Err(fail);
            };
            if (row_in_strip + 1) * bytes_per_row > count as usize {
                return Err(fail);
            }

            let src = offset as u64 + (row_in_strip * bytes_per_row) as u64;
            let dst = p * plane_size + y as usize * bytes_per_row;
            if r.seek(SeekFrom::Start(src)).is_err() {
                return Err(fail);
            }
            if r.read_exact(&mut buffer[dst..dst + bytes_per_row]).is_err() {
                return Err(fail);
            }
        }
    }

    Ok(Image {
        meta,
        raw: RawRaster {
            buffer,
            bytes_per_row: bytes_per_row as u32,
        },
    })
}
