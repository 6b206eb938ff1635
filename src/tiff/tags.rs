// src/tiff/tags.rs

//! Tag and field-type vocabulary for the baseline TIFF codec.

pub const TAG_IMAGE_WIDTH: u16 = 256;
pub const TAG_IMAGE_LENGTH: u16 = 257;
pub const TAG_BITS_PER_SAMPLE: u16 = 258;
pub const TAG_COMPRESSION: u16 = 259;
pub const TAG_PHOTOMETRIC: u16 = 262;
pub const TAG_STRIP_OFFSETS: u16 = 273;
pub const TAG_ORIENTATION: u16 = 274;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 277;
pub const TAG_ROWS_PER_STRIP: u16 = 278;
pub const TAG_STRIP_BYTE_COUNTS: u16 = 279;
pub const TAG_X_RESOLUTION: u16 = 282;
pub const TAG_Y_RESOLUTION: u16 = 283;
pub const TAG_PLANAR_CONFIG: u16 = 284;
pub const TAG_RESOLUTION_UNIT: u16 = 296;
pub const TAG_EXTRA_SAMPLES: u16 = 338;
pub const TAG_INK_SET: u16 = 332;
pub const TAG_INK_NAMES: u16 = 333;
/// Photoshop image-resource blob (the donor template's channel metadata).
pub const TAG_PHOTOSHOP: u16 = 34377;

pub const TYPE_BYTE: u16 = 1;
pub const TYPE_ASCII: u16 = 2;
pub const TYPE_SHORT: u16 = 3;
pub const TYPE_LONG: u16 = 4;
pub const TYPE_RATIONAL: u16 = 5;

pub const COMPRESSION_NONE: u16 = 1;
pub const RESUNIT_INCH: u16 = 2;
pub const ORIENTATION_TOPLEFT: u16 = 1;
pub const INKSET_CMYK: u16 = 1;

/// Byte width of one value of the given field type; 0 for unknown types
/// (their payloads are skipped, not loaded).
pub fn type_size(kind: u16) -> usize {
    match kind {
        TYPE_BYTE | TYPE_ASCII | 6 | 7 => 1,
        TYPE_SHORT | 8 => 2,
        TYPE_LONG | 9 | 11 => 4,
        TYPE_RATIONAL | 10 | 12 => 8,
        _ => 0,
    }
}
