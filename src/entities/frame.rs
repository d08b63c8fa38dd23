//! Decoded still frames - the image handle shared between store and renderer
//!
//! **Why**: A frame is decoded once on a worker thread and then only read.
//! The store keeps it inside its slot, the renderer clones the handle to
//! upload pixels. Cloning is an `Arc` bump, pixels are never copied.
//!
//! **Used by**: Frame store (slot contents), fetchers (decode), renderer
//! (texture upload), CPU post pass (sampling)
//!
//! # Pixel Layout
//!
//! Always 8-bit RGBA, row-major, first row = top of the image.
//! JPG/PNG sources are converted with `to_rgba8()`.
//!
//! # Sampling Convention
//!
//! `sample()` takes texture coordinates with the origin at the bottom-left
//! (v grows upwards), the same convention the fragment shader uses for its
//! quad. Coordinates outside [0,1] clamp to the edge texels.

use glam::{Vec2, Vec4};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable pixel data behind the handle
struct FrameData {
    index: usize,   // 0-based slot index in the sequence
    width: usize,
    height: usize,
    pixels: Vec<u8>, // RGBA8
}

/// Shared handle to one decoded frame
#[derive(Clone)]
pub struct Frame {
    data: Arc<FrameData>,
}

/// Frame loading errors
#[derive(Debug)]
pub enum FrameLoadError {
    /// File could not be read or decoded
    Image { path: PathBuf, reason: String },
    /// Extension is not a supported still format
    UnsupportedFormat(String),
    /// Raw buffer does not match `width * height * 4`
    BufferSize { expected: usize, actual: usize },
}

impl fmt::Display for FrameLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameLoadError::Image { path, reason } => {
                write!(f, "Image error ({}): {}", path.display(), reason)
            }
            FrameLoadError::UnsupportedFormat(ext) => write!(f, "Unsupported format: {}", ext),
            FrameLoadError::BufferSize { expected, actual } => write!(
                f,
                "Pixel buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for FrameLoadError {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.data.index)
            .field("width", &self.data.width)
            .field("height", &self.data.height)
            .finish()
    }
}

impl Frame {
    /// Wrap an RGBA8 buffer
    pub fn from_rgba(
        index: usize,
        width: usize,
        height: usize,
        pixels: Vec<u8>,
    ) -> Result<Self, FrameLoadError> {
        let expected = width * height * 4;
        if pixels.len() != expected || expected == 0 {
            return Err(FrameLoadError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            data: Arc::new(FrameData {
                index,
                width,
                height,
                pixels,
            }),
        })
    }

    /// Single-color frame (tests, snapshot fallback)
    pub fn solid(index: usize, width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = vec![0u8; width * height * 4];
        for px in pixels.chunks_mut(4) {
            px.copy_from_slice(&rgba);
        }

        Self {
            data: Arc::new(FrameData {
                index,
                width,
                height,
                pixels,
            }),
        }
    }

    /// Decode a still image from disk
    ///
    /// # Errors
    ///
    /// - `FrameLoadError::UnsupportedFormat`: unknown extension
    /// - `FrameLoadError::Image`: file missing or decode failed
    pub fn load(index: usize, path: &Path) -> Result<Self, FrameLoadError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" => {}
            _ => return Err(FrameLoadError::UnsupportedFormat(format!(".{}", ext))),
        }

        debug!("Loading frame {}: {}", index + 1, path.display());

        let img = image::open(path).map_err(|e| FrameLoadError::Image {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let width = img.width() as usize;
        let height = img.height() as usize;
        let rgba = img.to_rgba8();

        Self::from_rgba(index, width, height, rgba.into_raw())
    }

    /// 0-based slot index this frame was loaded for
    pub fn index(&self) -> usize {
        self.data.index
    }

    pub fn width(&self) -> usize {
        self.data.width
    }

    pub fn height(&self) -> usize {
        self.data.height
    }

    pub fn resolution(&self) -> (usize, usize) {
        (self.data.width, self.data.height)
    }

    /// Raw RGBA8 pixels, top row first
    pub fn pixels(&self) -> &[u8] {
        &self.data.pixels
    }

    /// Memory size in bytes
    pub fn mem(&self) -> usize {
        self.data.pixels.len()
    }

    /// True if both handles point at the same decoded image
    pub fn same_image(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Texel at integer coordinates (top-left origin), normalized to 0..1
    pub fn texel(&self, x: usize, y: usize) -> Vec4 {
        let x = x.min(self.data.width - 1);
        let y = y.min(self.data.height - 1);
        let i = (y * self.data.width + x) * 4;
        let p = &self.data.pixels[i..i + 4];
        Vec4::new(p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32) / 255.0
    }

    /// Bilinear sample with clamp-to-edge, bottom-left origin
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let w = self.data.width as f32;
        let h = self.data.height as f32;

        // Texel centers sit at half-integer positions
        let u = uv.x.clamp(0.0, 1.0) * w - 0.5;
        let v = (1.0 - uv.y.clamp(0.0, 1.0)) * h - 0.5;

        let x0 = u.floor();
        let y0 = v.floor();
        let fx = u - x0;
        let fy = v - y0;

        let clamp_x = |x: f32| x.clamp(0.0, w - 1.0) as usize;
        let clamp_y = |y: f32| y.clamp(0.0, h - 1.0) as usize;

        let (xa, xb) = (clamp_x(x0), clamp_x(x0 + 1.0));
        let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));

        let top = self.texel(xa, ya).lerp(self.texel(xb, ya), fx);
        let bottom = self.texel(xa, yb).lerp(self.texel(xb, yb), fx);
        top.lerp(bottom, fy)
    }
}
