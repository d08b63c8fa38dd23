//! Time-driven property tweens
//!
//! Everything here advances only through `tick(dt)`, with `dt` in seconds,
//! so overlays are deterministic under test and follow the app's frame clock.
//!
//! A new `to()` on a property overrides its in-flight tween and starts from
//! the current value. Tweens are never queued.

/// Easing curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    /// Quadratic ease-out, the default for UI fades
    #[default]
    OutQuad,
    OutCubic,
    InOutQuad,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// One scalar transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: f32,
    delay: f32,
    elapsed: f32,
    ease: Ease,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            delay: 0.0,
            elapsed: 0.0,
            ease,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    pub fn value(&self) -> f32 {
        let active = self.elapsed - self.delay;
        if active <= 0.0 {
            return self.from;
        }
        if self.duration <= 0.0 || active >= self.duration {
            return self.to;
        }
        let t = self.ease.apply(active / self.duration);
        self.from + (self.to - self.from) * t
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

/// Scalar with an optional running tween
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animated {
    value: f32,
    tween: Option<Tween>,
}

impl Animated {
    pub fn new(value: f32) -> Self {
        Self { value, tween: None }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Value this property is heading to
    pub fn target(&self) -> f32 {
        self.tween.map(|t| t.target()).unwrap_or(self.value)
    }

    /// Start a tween from the current value; replaces any running tween
    pub fn to(&mut self, target: f32, duration: f32, delay: f32, ease: Ease) {
        let tween = Tween::new(self.value, target, duration, ease).with_delay(delay);
        self.tween = Some(tween);
        if tween.is_finished() {
            self.value = target;
            self.tween = None;
        }
    }

    /// Jump without animating
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.tween = None;
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(tween) = self.tween.as_mut() {
            tween.tick(dt);
            self.value = tween.value();
            if tween.is_finished() {
                self.tween = None;
            }
        }
    }
}

/// Opacity plus vertical offset, the pair every overlay animates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub opacity: Animated,
    pub offset_y: Animated,
}

impl Fade {
    pub fn new(opacity: f32, offset_y: f32) -> Self {
        Self {
            opacity: Animated::new(opacity),
            offset_y: Animated::new(offset_y),
        }
    }

    /// Animate both channels together, overriding in-flight motion
    pub fn to(&mut self, opacity: f32, offset_y: f32, duration: f32, delay: f32) {
        self.opacity.to(opacity, duration, delay, Ease::OutQuad);
        self.offset_y.to(offset_y, duration, delay, Ease::OutQuad);
    }

    pub fn tick(&mut self, dt: f32) {
        self.opacity.tick(dt);
        self.offset_y.tick(dt);
    }

    pub fn is_animating(&self) -> bool {
        self.opacity.is_animating() || self.offset_y.is_animating()
    }
}
