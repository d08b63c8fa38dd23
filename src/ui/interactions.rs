//! Candle and music interactions
//!
//! Both are small state machines advanced by `tick(dt)` from the app's frame
//! clock; clicks come in as method calls. Each owns its own flags (music
//! playing, button revealed) and is passed by reference to whoever needs it.

use log::{debug, warn};

use super::audio::{AudioOut, BELL_VOLUME, MUSIC_VOLUME};
use crate::scroll::tween::{Animated, Ease};

const CANDLE_FADE_IN: f32 = 1.0;
const CANDLE_HOLD: f32 = 4.0; // From click to the start of the fade-out
const CANDLE_FADE_OUT: f32 = 1.0;
const MUSIC_BUTTON_FADE: f32 = 1.0;

/// Visible stage of the candle overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandlePhase {
    Hidden,
    FadingIn,
    Lit,
    FadingOut,
}

/// Full-screen candle overlay shown after "Light a candle"
#[derive(Debug, Clone)]
pub struct CandleOverlay {
    opacity: Animated,
    since_click: Option<f32>,
    fading_out: bool,
}

impl Default for CandleOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleOverlay {
    pub fn new() -> Self {
        Self {
            opacity: Animated::new(0.0),
            since_click: None,
            fading_out: false,
        }
    }

    /// Show the overlay and ring the bell; a second click restarts it
    pub fn light(&mut self, audio: &mut dyn AudioOut) {
        self.opacity.set(0.0);
        self.opacity.to(1.0, CANDLE_FADE_IN, 0.0, Ease::OutQuad);
        self.since_click = Some(0.0);
        self.fading_out = false;

        if let Err(e) = audio.play_bell(BELL_VOLUME) {
            warn!("Audio play failed: {}", e);
        }
        debug!("Candle lit");
    }

    pub fn tick(&mut self, dt: f32) {
        let Some(elapsed) = self.since_click else {
            return;
        };
        let dt = dt.max(0.0);
        let next = elapsed + dt;

        if !self.fading_out && next >= CANDLE_HOLD {
            // Split the step at the hold mark so the fade starts on time
            self.opacity.tick(CANDLE_HOLD - elapsed);
            self.opacity.to(0.0, CANDLE_FADE_OUT, 0.0, Ease::OutQuad);
            self.fading_out = true;
            self.opacity.tick(next - CANDLE_HOLD);
        } else {
            self.opacity.tick(dt);
        }
        self.since_click = Some(next);

        if self.fading_out && !self.opacity.is_animating() {
            self.since_click = None;
            self.fading_out = false;
            debug!("Candle overlay hidden");
        }
    }

    pub fn is_visible(&self) -> bool {
        self.since_click.is_some()
    }

    pub fn opacity(&self) -> f32 {
        if self.is_visible() { self.opacity.value() } else { 0.0 }
    }

    pub fn phase(&self) -> CandlePhase {
        match self.since_click {
            None => CandlePhase::Hidden,
            Some(_) if self.fading_out => CandlePhase::FadingOut,
            Some(_) if self.opacity.is_animating() => CandlePhase::FadingIn,
            Some(_) => CandlePhase::Lit,
        }
    }
}

/// Background music button
#[derive(Debug, Clone)]
pub struct MusicToggle {
    revealed: bool,
    button_opacity: Animated,
    playing: bool,
}

impl Default for MusicToggle {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicToggle {
    pub fn new() -> Self {
        Self {
            revealed: false,
            button_opacity: Animated::new(0.0),
            playing: false,
        }
    }

    /// First click anywhere reveals the button; later clicks do nothing
    pub fn on_any_click(&mut self) -> bool {
        if self.revealed {
            return false;
        }
        self.revealed = true;
        self.button_opacity
            .to(1.0, MUSIC_BUTTON_FADE, 0.0, Ease::OutQuad);
        debug!("Music toggle revealed");
        true
    }

    /// Route one pointer click; `on_button` is true when it hit the toggle.
    ///
    /// The button is hidden while the revealing click happens, so that click
    /// never toggles playback. Returns true if playback was toggled.
    pub fn on_click(&mut self, on_button: bool, audio: &mut dyn AudioOut) -> bool {
        if self.on_any_click() || !on_button {
            return false;
        }
        self.toggle(audio);
        true
    }

    /// Flip playback; a failed start is logged and still counts as playing
    pub fn toggle(&mut self, audio: &mut dyn AudioOut) -> bool {
        if self.playing {
            audio.pause_music();
        } else if let Err(e) = audio.play_music(MUSIC_VOLUME) {
            warn!("Music play failed: {}", e);
        }
        self.playing = !self.playing;
        self.playing
    }

    pub fn tick(&mut self, dt: f32) {
        self.button_opacity.tick(dt);
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn button_opacity(&self) -> f32 {
        self.button_opacity.value()
    }

    pub fn icon(&self) -> &'static str {
        if self.playing { "🎵" } else { "🔇" }
    }
}
