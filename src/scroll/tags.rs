//! Tag timeline - floating text tags keyed to scroll progress
//!
//! Each tag owns a progress range (inclusive). Entering the range fades the
//! tag in while it rises 20px; leaving fades it out and lets it drop back.
//! Fades only start on visibility *transitions*, so one transition = one fade.
//!
//! A tag gets a random screen position the first time it becomes visible and
//! keeps it for the lifetime of the timeline.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tween::Fade;
use crate::config::TagConfig;

/// Vertical lift of a visible tag, logical px (negative = up)
pub const TAG_RISE: f32 = -20.0;

/// Position as fractions of the viewport (left/top edge of the label)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagPosition {
    pub left: f32,
    pub top: f32,
}

/// Visibility change produced by `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTransition {
    Shown(usize),
    Hidden(usize),
}

/// One floating tag
#[derive(Debug, Clone)]
pub struct Tag {
    label: String,
    start: f32,
    end: f32,
    visible: bool,
    position: Option<TagPosition>,
    fade: Fade,
}

impl Tag {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn range(&self) -> (f32, f32) {
        (self.start, self.end)
    }

    pub fn contains(&self, progress: f32) -> bool {
        progress >= self.start && progress <= self.end
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Option<TagPosition> {
        self.position
    }

    pub fn opacity(&self) -> f32 {
        self.fade.opacity.value()
    }

    pub fn offset_y(&self) -> f32 {
        self.fade.offset_y.value()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_animating()
    }
}

/// All tags with their visibility, placement and fades
pub struct TagTimeline {
    tags: Vec<Tag>,
    fade_duration: f32,
    rng: StdRng,
}

impl TagTimeline {
    pub fn new(tags: &[TagConfig], fade_duration: f32) -> Self {
        Self::with_rng(tags, fade_duration, StdRng::from_os_rng())
    }

    /// Deterministic placement
    pub fn with_seed(tags: &[TagConfig], fade_duration: f32, seed: u64) -> Self {
        Self::with_rng(tags, fade_duration, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tags: &[TagConfig], fade_duration: f32, rng: StdRng) -> Self {
        let tags = tags
            .iter()
            .map(|t| Tag {
                label: t.label.clone(),
                start: t.start,
                end: t.end,
                visible: false,
                position: None,
                fade: Fade::new(0.0, 0.0),
            })
            .collect();

        Self {
            tags,
            fade_duration: fade_duration.max(0.0),
            rng,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Apply a progress value; returns the transitions it caused
    pub fn update(&mut self, progress: f32) -> Vec<TagTransition> {
        let mut transitions = Vec::new();

        for (i, tag) in self.tags.iter_mut().enumerate() {
            let inside = tag.contains(progress);

            if inside && !tag.visible {
                tag.visible = true;
                tag.fade.to(1.0, TAG_RISE, self.fade_duration, 0.0);

                if tag.position.is_none() {
                    let position = TagPosition {
                        left: 0.10 + self.rng.random_range(0.0..0.60),
                        top: 0.20 + self.rng.random_range(0.0..0.40),
                    };
                    debug!("Tag '{}' placed at {:?}", tag.label, position);
                    tag.position = Some(position);
                }
                transitions.push(TagTransition::Shown(i));
            } else if !inside && tag.visible {
                tag.visible = false;
                tag.fade.to(0.0, 0.0, self.fade_duration, 0.0);
                transitions.push(TagTransition::Hidden(i));
            }
        }

        transitions
    }

    /// Advance all fades
    pub fn tick(&mut self, dt: f32) {
        for tag in &mut self.tags {
            tag.fade.tick(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TunnelConfig;

    fn two_tags() -> Vec<TagConfig> {
        vec![
            TagConfig {
                label: "one".into(),
                start: 0.05,
                end: 0.2,
            },
            TagConfig {
                label: "two".into(),
                start: 0.25,
                end: 0.4,
            },
        ]
    }

    /// Test: Sweep 0 -> 0.1 -> 0.3 -> 0.5
    /// Validates: hidden -> visible(1) -> hidden(1)+visible(2) -> hidden(2)
    #[test]
    fn test_sweep_transitions() {
        let mut tl = TagTimeline::with_seed(&two_tags(), 0.5, 7);

        assert!(tl.update(0.0).is_empty());
        assert_eq!(tl.update(0.1), vec![TagTransition::Shown(0)]);
        assert_eq!(
            tl.update(0.3),
            vec![TagTransition::Hidden(0), TagTransition::Shown(1)]
        );
        assert_eq!(tl.update(0.5), vec![TagTransition::Hidden(1)]);
        assert!(tl.tags().iter().all(|t| !t.is_visible()));
    }

    /// Test: Repeated progress inside a range
    /// Validates: No extra fades while visibility is unchanged
    #[test]
    fn test_no_refade_inside_range() {
        let mut tl = TagTimeline::with_seed(&two_tags(), 0.5, 1);
        assert_eq!(tl.update(0.1).len(), 1);
        assert!(tl.update(0.12).is_empty());
        assert!(tl.update(0.2).is_empty()); // inclusive end
    }

    /// Test: Position assigned once
    /// Validates: Re-entering a range keeps the first random position
    #[test]
    fn test_position_persists() {
        let mut tl = TagTimeline::with_seed(&two_tags(), 0.5, 42);
        assert!(tl.tags()[0].position().is_none());

        tl.update(0.1);
        let first = tl.tags()[0].position().unwrap();
        assert!((0.10..0.70).contains(&first.left));
        assert!((0.20..0.60).contains(&first.top));

        tl.update(0.5);
        tl.update(0.15);
        assert_eq!(tl.tags()[0].position(), Some(first));
    }

    /// Test: Fade overrides in-flight fade
    /// Validates: Leaving mid-fade reverses from the current opacity
    #[test]
    fn test_fade_override() {
        let mut tl = TagTimeline::with_seed(&two_tags(), 0.5, 3);
        tl.update(0.1);
        tl.tick(0.25);
        let mid = tl.tags()[0].opacity();
        assert!(mid > 0.0 && mid < 1.0);

        tl.update(0.0);
        assert!((tl.tags()[0].opacity() - mid).abs() < 1e-6);
        tl.tick(0.5);
        assert_eq!(tl.tags()[0].opacity(), 0.0);
        assert_eq!(tl.tags()[0].offset_y(), 0.0);
    }

    /// Test: Full fade-in
    /// Validates: Visible tag ends fully opaque and lifted
    #[test]
    fn test_fade_in_completes() {
        let mut tl = TagTimeline::with_seed(&two_tags(), 0.5, 3);
        tl.update(0.3);
        tl.tick(0.6);
        let tag = &tl.tags()[1];
        assert_eq!(tag.opacity(), 1.0);
        assert_eq!(tag.offset_y(), TAG_RISE);
        assert!(!tag.is_fading());
    }

    /// Test: Default five tags
    /// Validates: Last tag visible at progress 1.0
    #[test]
    fn test_default_tags_cover_end() {
        let config = TunnelConfig::default();
        let mut tl = TagTimeline::with_seed(&config.tags, config.tag_fade, 0);
        assert_eq!(tl.len(), 5);
        assert_eq!(tl.update(1.0), vec![TagTransition::Shown(4)]);
    }
}
