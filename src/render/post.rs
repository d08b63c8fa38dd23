//! CPU reference of the tunnel fragment shader
//!
//! Mirrors `shaders::FRAGMENT_SHADER` step by step so the pipeline can be
//! tested without a GL context and so `--snapshot` can render a PNG
//! headless. Output pixel rows are top-first, like the decoded frames.

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use log::debug;

use super::state::{ShaderParams, ShaderState};
use crate::entities::frame::Frame;

const WARM_FILTER: Vec3 = Vec3::new(1.0, 0.95, 0.85);

/// GLSL `smoothstep`, including the reversed-edge form the vignette uses
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Shade one pixel at `uv` (bottom-left origin)
pub fn shade(uv: Vec2, params: &ShaderParams, time: f32, frame: &Frame) -> Vec4 {
    let delta = uv - params.focal;
    let f = params.lens_factor(delta.length_squared(), time);
    let distorted = params.focal + delta / f;

    let sampled = frame.sample(distorted);
    let rgb = sampled.truncate();
    let rgb = rgb.lerp(rgb * WARM_FILTER, params.warmth);

    let d = uv.distance(params.focal);
    let vignette = smoothstep(
        params.vignette_outer,
        params.vignette_inner,
        d * params.vignette_strength,
    );

    (rgb * vignette).extend(sampled.w)
}

/// Render the current state at `width`x`height`
///
/// Without an active frame the output is opaque black, the same as the
/// cleared GL surface.
pub fn render_cpu(state: &ShaderState, width: u32, height: u32) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);

    let Some(frame) = state.active() else {
        debug!("render_cpu: no active frame, returning black");
        return RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    };

    let params = state.params;
    let time = state.elapsed();
    RgbaImage::from_fn(width, height, |x, y| {
        let uv = Vec2::new(
            (x as f32 + 0.5) / width as f32,
            1.0 - (y as f32 + 0.5) / height as f32,
        );
        to_rgba8(shade(uv, &params, time, frame))
    })
}

fn to_rgba8(color: Vec4) -> Rgba<u8> {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    Rgba([c.x as u8, c.y as u8, c.z as u8, c.w as u8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame() -> Frame {
        let (w, h) = (8usize, 8usize);
        let mut pixels = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                pixels.extend_from_slice(&[(x * 30) as u8, (y * 30) as u8, 128, 255]);
            }
        }
        Frame::from_rgba(0, w, h, pixels).unwrap()
    }

    fn neutral() -> ShaderParams {
        ShaderParams {
            distortion: 0.0,
            warmth: 0.0,
            vignette_strength: 0.0,
            ..ShaderParams::default()
        }
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        // Reversed edges: 1 inside the inner radius, 0 beyond the outer
        assert_eq!(smoothstep(1.0, 0.2, 0.0), 1.0);
        assert_eq!(smoothstep(1.0, 0.2, 1.5), 0.0);
    }

    /// Test: Neutral tuning at the focal point
    /// Validates: Output equals the raw texel
    #[test]
    fn test_focal_point_is_identity() {
        let frame = gradient_frame();
        let params = neutral();
        for time in [0.0, 1.3, 10.0] {
            let out = shade(params.focal, &params, time, &frame);
            let raw = frame.sample(params.focal);
            assert!((out - raw).abs().max_element() < 1e-6);
        }
    }

    /// Test: Default tuning
    /// Validates: Corners are darker than the center (vignette)
    #[test]
    fn test_vignette_darkens_edges() {
        let frame = Frame::solid(0, 4, 4, [200, 200, 200, 255]);
        let params = ShaderParams::default();
        let center = shade(params.focal, &params, 0.0, &frame);
        let corner = shade(Vec2::new(0.0, 0.0), &params, 0.0, &frame);
        assert!(corner.x < center.x);
        assert_eq!(corner.w, 1.0);
    }

    /// Test: Warmth 1
    /// Validates: Blue is scaled by 0.85, red untouched
    #[test]
    fn test_warmth_tints() {
        let frame = Frame::solid(0, 2, 2, [255, 255, 255, 255]);
        let params = ShaderParams {
            warmth: 1.0,
            ..neutral()
        };
        let out = shade(params.focal, &params, 0.0, &frame);
        assert!((out.x - 1.0).abs() < 1e-6);
        assert!((out.y - 0.95).abs() < 1e-6);
        assert!((out.z - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_render_cpu_without_frame_is_black() {
        let state = ShaderState::new(ShaderParams::default());
        let img = render_cpu(&state, 4, 3);
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(2, 1), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_render_cpu_neutral_matches_solid() {
        let frame = Frame::solid(0, 2, 2, [40, 80, 120, 255]);
        let mut state = ShaderState::new(neutral());
        state.set_active(Some(&frame));

        let img = render_cpu(&state, 16, 16);
        for pixel in img.pixels() {
            assert_eq!(pixel, &Rgba([40, 80, 120, 255]));
        }
    }
}
