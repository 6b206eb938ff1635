// src/utils/file_path.rs

//! Output path normalization for generated separations.

use std::path::{Path, PathBuf};

/// Returns `path` with its extension normalized to `.tif` unless it already
/// ends in `.tif` or `.tiff` (case-insensitive).
///
/// # Examples
///
/// ```
/// use underprint::utils::file_path::normalize_tiff_extension;
/// use std::path::Path;
///
/// let p = normalize_tiff_extension(Path::new("out/job.png"));
/// assert_eq!(p.to_str().unwrap(), "out/job.tif");
///
/// let p = normalize_tiff_extension(Path::new("out/job.TIFF"));
/// assert_eq!(p.to_str().unwrap(), "out/job.TIFF");
/// ```
pub fn normalize_tiff_extension(path: &Path) -> PathBuf {
    let keep = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            e == "tif" || e == "tiff"
        })
        .unwrap_or(false);

    if keep {
        path.to_path_buf()
    } else {
        path.with_extension("tif")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_tiff_extensions() {
        assert_eq!(
            normalize_tiff_extension(Path::new("a/b.tif")),
            PathBuf::from("a/b.tif")
        );
        assert_eq!(
            normalize_tiff_extension(Path::new("a/b.tiff")),
            PathBuf::from("a/b.tiff")
        );
    }

    #[test]
    fn test_rewrites_other_extensions() {
        assert_eq!(
            normalize_tiff_extension(Path::new("a/b.png")),
            PathBuf::from("a/b.tif")
        );
        assert_eq!(
            normalize_tiff_extension(Path::new("a/b")),
            PathBuf::from("a/b.tif")
        );
    }
}
