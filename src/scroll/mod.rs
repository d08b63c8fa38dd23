//! Scroll-driven animation: pin trigger, tweens, tag timeline, card reveal
//! and the binder that feeds progress into the renderer.

pub mod binder;
pub mod reveal;
pub mod tags;
pub mod trigger;
pub mod tween;

pub use binder::{BinderUpdate, ScrollBinder};
pub use reveal::CardReveal;
pub use tags::{TagTimeline, TagTransition};
pub use trigger::{LineTrigger, PinPhase, PinTrigger, TriggerEvent};
pub use tween::{Animated, Ease, Fade};
