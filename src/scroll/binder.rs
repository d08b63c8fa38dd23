//! Scroll binder - progress in, active texture and tag fades out
//!
//! **Used by**: App glue. Every progress emission from the pin trigger goes
//! through `on_progress()`; the load completion goes through
//! `on_all_settled()` so the first frame shows without scrolling.
//!
//! The binder is the only writer of `ShaderState`'s active texture. An
//! absent resolve leaves the current texture in place.

use log::{debug, trace};

use super::tags::{TagTimeline, TagTransition};
use crate::core::frame_store::{FrameSequence, PlaybackCursor};
use crate::render::state::ShaderState;

/// What one progress update changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinderUpdate {
    pub texture_changed: bool,
    pub transitions: Vec<TagTransition>,
}

pub struct ScrollBinder {
    tags: TagTimeline,
    progress: f32,
}

impl ScrollBinder {
    pub fn new(tags: TagTimeline) -> Self {
        Self {
            tags,
            progress: 0.0,
        }
    }

    /// Last progress applied, clamped to [0,1]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn tags(&self) -> &TagTimeline {
        &self.tags
    }

    /// Apply one progress emission (last value wins, nothing is queued)
    pub fn on_progress(
        &mut self,
        progress: f32,
        frames: &FrameSequence,
        shader: &mut ShaderState,
    ) -> BinderUpdate {
        self.progress = PlaybackCursor::new(progress).progress();

        let texture_changed = shader.set_active(frames.resolve(self.progress));
        if texture_changed {
            trace!(
                "ScrollBinder: progress {:.4} -> frame {:?}",
                self.progress,
                shader.active().map(|f| f.index())
            );
        }

        let transitions = self.tags.update(self.progress);
        BinderUpdate {
            texture_changed,
            transitions,
        }
    }

    /// Prime the texture once loading completes
    pub fn on_all_settled(&mut self, frames: &FrameSequence, shader: &mut ShaderState) -> bool {
        let changed = shader.set_active(frames.resolve(self.progress));
        debug!(
            "ScrollBinder: load settled, showing frame {:?}",
            shader.active().map(|f| f.index())
        );
        changed
    }

    /// Advance tag fades
    pub fn tick(&mut self, dt: f32) {
        self.tags.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TunnelConfig;
    use crate::core::fetch::{FrameFetcher, FrameTemplate};
    use crate::core::workers::Workers;
    use crate::entities::frame::{Frame, FrameLoadError};
    use crate::render::state::ShaderParams;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    struct OddFails;

    impl FrameFetcher for OddFails {
        fn fetch(&self, index: usize, path: &Path) -> Result<Frame, FrameLoadError> {
            if index % 2 == 1 {
                return Err(FrameLoadError::Image {
                    path: path.to_path_buf(),
                    reason: "odd".into(),
                });
            }
            Ok(Frame::solid(index, 1, 1, [index as u8, 0, 0, 255]))
        }
    }

    fn binder() -> ScrollBinder {
        let config = TunnelConfig::default();
        ScrollBinder::new(TagTimeline::with_seed(&config.tags, config.tag_fade, 5))
    }

    fn loaded(total: usize) -> FrameSequence {
        let workers = Workers::new(2).unwrap();
        let mut seq = FrameSequence::new(total, FrameTemplate::new("frames", "png")).unwrap();
        seq.begin_load(&workers, Arc::new(OddFails), |_| {});
        assert!(seq.wait_settled(Duration::from_secs(10)));
        seq
    }

    /// Test: Progress before anything is loaded
    /// Validates: Texture stays absent, tags still update
    #[test]
    fn test_progress_before_load() {
        let seq = FrameSequence::new(5, FrameTemplate::new("frames", "png")).unwrap();
        let mut shader = ShaderState::new(ShaderParams::default());
        let mut b = binder();

        let update = b.on_progress(0.1, &seq, &mut shader);
        assert!(!update.texture_changed);
        assert!(shader.active().is_none());
        assert_eq!(update.transitions, vec![TagTransition::Shown(0)]);
    }

    /// Test: Failed slot after a good one
    /// Validates: Fallback is slot 0, not the previously shown frame
    #[test]
    fn test_failed_slot_uses_first_frame() {
        let seq = loaded(5); // slots 1 and 3 fail
        let mut shader = ShaderState::new(ShaderParams::default());
        let mut b = binder();

        b.on_progress(0.5, &seq, &mut shader);
        assert_eq!(shader.active().map(|f| f.index()), Some(2));

        b.on_progress(0.75, &seq, &mut shader);
        assert_eq!(shader.active().map(|f| f.index()), Some(0));
    }

    /// Test: Settlement primes the texture
    /// Validates: Current progress is resolved without a scroll event
    #[test]
    fn test_on_all_settled_primes_texture() {
        let seq = loaded(5);
        let mut shader = ShaderState::new(ShaderParams::default());
        let mut b = binder();

        assert!(b.on_all_settled(&seq, &mut shader));
        assert_eq!(shader.active().map(|f| f.index()), Some(0));
    }

    /// Test: Out-of-range progress
    /// Validates: Clamped before resolving
    #[test]
    fn test_progress_clamped() {
        let seq = loaded(5);
        let mut shader = ShaderState::new(ShaderParams::default());
        let mut b = binder();

        b.on_progress(4.0, &seq, &mut shader);
        assert_eq!(b.progress(), 1.0);
        assert_eq!(shader.active().map(|f| f.index()), Some(4));
    }
}
