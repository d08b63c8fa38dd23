//! Shader state - everything one tunnel draw depends on
//!
//! A draw is a pure function of `(active frame, elapsed time, viewport size,
//! tuning)`. This struct holds exactly that, so the GL renderer and the CPU
//! reference pass render the same thing from the same input.
//!
//! Single writer (scroll binder sets the frame, app glue advances the clock
//! and size), single reader (renderer).

use glam::Vec2;
use log::debug;

use crate::config::TunnelConfig;
use crate::entities::frame::Frame;

/// Tuning uniforms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParams {
    pub vignette_strength: f32,
    pub warmth: f32,
    pub distortion: f32,
    pub vignette_outer: f32,
    pub vignette_inner: f32,
    /// Lens center in uv space (bottom-left origin)
    pub focal: Vec2,
    /// Amplitude `k` of the breathing term added to the distortion
    pub breath_amount: f32,
    /// Angular speed `ω` of the breathing term, rad/s
    pub breath_speed: f32,
}

impl Default for ShaderParams {
    fn default() -> Self {
        Self {
            vignette_strength: 1.2,
            warmth: 0.1,
            distortion: 0.02,
            vignette_outer: 1.0,
            vignette_inner: 0.2,
            focal: Vec2::new(0.5, 0.52),
            breath_amount: 0.05,
            breath_speed: 0.5,
        }
    }
}

impl ShaderParams {
    pub fn from_config(config: &TunnelConfig) -> Self {
        Self {
            vignette_strength: config.vignette_strength,
            warmth: config.warmth,
            distortion: config.distortion,
            ..Self::default()
        }
    }

    /// Lens factor `f` for a squared radius at time `t`
    pub fn lens_factor(&self, r2: f32, time: f32) -> f32 {
        1.0 + r2 * (self.distortion + self.breath_amount * (time * self.breath_speed).sin())
    }
}

/// Renderer lifecycle: nothing to draw until the first frame is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererPhase {
    #[default]
    Uninitialized,
    Running,
}

/// Current frame, time, size and tuning
#[derive(Debug, Clone)]
pub struct ShaderState {
    pub params: ShaderParams,
    elapsed: f32,
    viewport_size: Vec2,
    active: Option<Frame>,
    revision: u64, // Bumped on every texture change
    phase: RendererPhase,
}

impl ShaderState {
    pub fn new(params: ShaderParams) -> Self {
        Self {
            params,
            elapsed: 0.0,
            viewport_size: Vec2::ONE,
            active: None,
            revision: 0,
            phase: RendererPhase::Uninitialized,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance the animation clock (independent of scroll)
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Absolute clock, used for snapshots at a chosen time
    pub fn set_elapsed(&mut self, seconds: f32) {
        self.elapsed = seconds.max(0.0);
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    /// Store the new surface size; tuning stays as is
    pub fn resize(&mut self, width: f32, height: f32) {
        let size = Vec2::new(width.max(1.0), height.max(1.0));
        if size != self.viewport_size {
            debug!("ShaderState: viewport {}x{}", size.x, size.y);
            self.viewport_size = size;
        }
    }

    pub fn active(&self) -> Option<&Frame> {
        self.active.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn phase(&self) -> RendererPhase {
        self.phase
    }

    /// Make `frame` the active texture
    ///
    /// An absent frame keeps whatever is displayed. Returns true if the
    /// texture changed.
    pub fn set_active(&mut self, frame: Option<&Frame>) -> bool {
        let Some(frame) = frame else {
            return false;
        };
        if let Some(current) = &self.active
            && current.same_image(frame)
        {
            return false;
        }

        self.active = Some(frame.clone());
        self.revision += 1;
        if self.phase == RendererPhase::Uninitialized {
            debug!("ShaderState: first frame {} resolved", frame.index());
            self.phase = RendererPhase::Running;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: Absent frame
    /// Validates: Previously displayed texture is retained, not cleared
    #[test]
    fn test_absent_keeps_previous() {
        let mut state = ShaderState::new(ShaderParams::default());
        assert_eq!(state.phase(), RendererPhase::Uninitialized);
        assert!(!state.set_active(None));
        assert!(state.active().is_none());

        let a = Frame::solid(3, 2, 2, [10, 20, 30, 255]);
        assert!(state.set_active(Some(&a)));
        assert_eq!(state.phase(), RendererPhase::Running);

        assert!(!state.set_active(None));
        assert_eq!(state.active().map(|f| f.index()), Some(3));
    }

    /// Test: Same image twice
    /// Validates: Revision only bumps on an actual change
    #[test]
    fn test_revision_tracks_changes() {
        let mut state = ShaderState::new(ShaderParams::default());
        let a = Frame::solid(0, 1, 1, [0, 0, 0, 255]);
        let b = Frame::solid(1, 1, 1, [255, 255, 255, 255]);

        state.set_active(Some(&a));
        state.set_active(Some(&a.clone()));
        assert_eq!(state.revision(), 1);
        state.set_active(Some(&b));
        assert_eq!(state.revision(), 2);
    }

    /// Test: Resize
    /// Validates: Size changes, tuning untouched
    #[test]
    fn test_resize_keeps_tuning() {
        let mut state = ShaderState::new(ShaderParams::from_config(&TunnelConfig::default()));
        let params = state.params;
        state.resize(1280.0, 720.0);
        assert_eq!(state.viewport_size(), Vec2::new(1280.0, 720.0));
        assert_eq!(state.params, params);
    }

    #[test]
    fn test_lens_factor_without_distortion() {
        let params = ShaderParams {
            distortion: 0.0,
            ..ShaderParams::default()
        };
        // sin(0) = 0, only the static term remains
        assert_eq!(params.lens_factor(0.25, 0.0), 1.0);
        assert!(params.lens_factor(0.25, std::f32::consts::PI) > 1.0);
    }
}
