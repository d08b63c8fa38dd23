//! Frame path template and fetch backends
//!
//! The template maps a 1-based frame number to a resource path:
//! `{base}/{n}.{ext}`. A fetcher turns that path into a decoded `Frame`.
//! Fetchers run on worker threads, so they must be `Send + Sync`.

use std::path::{Path, PathBuf};

use crate::entities::frame::{Frame, FrameLoadError};

/// Placeholder replaced by the 1-based frame number
const NUMBER_TOKEN: &str = "{n}";

/// Path template keyed by 1-based frame number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTemplate {
    pattern: String,
}

impl FrameTemplate {
    /// `{dir}/{n}.{ext}` layout written by the populate tool
    pub fn new(dir: impl AsRef<Path>, ext: &str) -> Self {
        let ext = ext.trim_start_matches('.');
        let pattern = dir
            .as_ref()
            .join(format!("{}.{}", NUMBER_TOKEN, ext))
            .to_string_lossy()
            .into_owned();
        Self { pattern }
    }

    /// Path of frame `number` (1-based)
    pub fn path(&self, number: usize) -> PathBuf {
        PathBuf::from(self.pattern.replace(NUMBER_TOKEN, &number.to_string()))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Source of decoded frames
///
/// `index` is the 0-based slot the result belongs to; `path` is already
/// expanded from the template.
pub trait FrameFetcher: Send + Sync + 'static {
    fn fetch(&self, index: usize, path: &Path) -> Result<Frame, FrameLoadError>;
}

/// Reads and decodes frames from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFetcher;

impl FrameFetcher for DiskFetcher {
    fn fetch(&self, index: usize, path: &Path) -> Result<Frame, FrameLoadError> {
        Frame::load(index, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: Template expansion
    /// Validates: 1-based numbering and extension handling
    #[test]
    fn test_template_paths() {
        let t = FrameTemplate::new("Family Photos", ".png");
        assert_eq!(t.path(1), Path::new("Family Photos").join("1.png"));
        assert_eq!(t.path(190), Path::new("Family Photos").join("190.png"));
    }

    /// Test: Disk fetcher decodes real files
    /// Validates: PNG written to disk comes back with the right index/size
    #[test]
    fn test_disk_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let frame = DiskFetcher.fetch(0, &path).unwrap();
        assert_eq!(frame.index(), 0);
        assert_eq!(frame.resolution(), (3, 2));
        assert_eq!(&frame.pixels()[0..4], &[1, 2, 3, 255]);

        assert!(DiskFetcher.fetch(1, &dir.path().join("2.png")).is_err());
    }
}
