// src/irb/template.rs

//! The donor template: a resource blob and channel fingerprint captured
//! once from a pre-selected TIFF and reused verbatim on every output.

use crate::irb::parse_blocks;
use crate::tiff::{read_directory, tags};
use crate::utils::error::{Result, SepError};
use log::debug;
use std::path::Path;

/// Donor channel metadata, held read-only for the process lifetime.
///
/// The blob's bytes are trusted and copied into outputs verbatim; the
/// recorded sample and extra counts serve purely as a compatibility gate
/// at encode time. Nothing here is ever re-derived from pixel data.
#[derive(Debug, Clone, Default)]
pub struct SpotTemplate {
    blob: Vec<u8>,
    pub samples_per_pixel: u16,
    pub extra_count: u16,
}

impl SpotTemplate {
    /// A template that gates nothing and embeds nothing.
    pub fn empty() -> Self {
        SpotTemplate::default()
    }

    /// Captures the donor's resource blob and channel fingerprint.
    ///
    /// Fails with `OpenFailed` when the donor is unreadable and with
    /// `InvalidInput` when it carries no Photoshop resource blob (a donor
    /// without channel-naming metadata cannot serve as a template).
    pub fn load(path: &Path) -> Result<Self> {
        let dir = read_directory(path)?;

        let samples_per_pixel = dir.short(tags::TAG_SAMPLES_PER_PIXEL).unwrap_or(0);
        let extra_count = dir
            .longs(tags::TAG_EXTRA_SAMPLES)
            .map(|v| v.len() as u16)
            .unwrap_or(0);

        let blob = dir
            .bytes(tags::TAG_PHOTOSHOP)
            .ok_or_else(|| {
                SepError::InvalidInput("donor file carries no Photoshop resource blob".into())
            })?
            .to_vec();

        let template = SpotTemplate {
            blob,
            samples_per_pixel,
            extra_count,
        };
        template.debug_dump();
        Ok(template)
    }

    /// Builds a template directly from captured parts (used by tests and
    /// callers that source the blob elsewhere).
    pub fn from_parts(blob: Vec<u8>, samples_per_pixel: u16, extra_count: u16) -> Self {
        SpotTemplate {
            blob,
            samples_per_pixel,
            extra_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// The donor resource bytes, embedded verbatim at encode time.
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    fn debug_dump(&self) {
        debug!(
            "template: spp={} extras={} blob={} bytes",
            self.samples_per_pixel,
            self.extra_count,
            self.blob.len()
        );
        for block in parse_blocks(&self.blob) {
            debug!(
                "  resource {} at {:#06x}, {} data bytes",
                block.id, block.offset, block.data_len
            );
        }
    }
}
