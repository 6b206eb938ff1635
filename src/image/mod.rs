//! Image model: decoded metadata, raw sample buffers, and working rasters.

pub mod meta;
pub mod model;
pub mod raster;

pub use meta::{ExtraSample, ImageMeta, Photometric, PlanarConfig};
pub use model::{Image, RawRaster};
pub use raster::{GrayRaster, Rgb8, RgbRaster};
