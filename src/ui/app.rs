//! Tunnel window - eframe::App wiring scroll, frames, renderer and overlays
//!
//! The page is virtual: one scroll offset in logical px over a stack of
//! sections (pinned hero, memory cards, letter). Per frame:
//! 1. Apply settled frame loads (`pump`)
//! 2. Read wheel / keyboard scroll, move the pin trigger
//! 3. Feed smoothed progress to the binder (texture + tags)
//! 4. Advance clocks: shader time, fades, typewriter, candle, music
//! 5. Paint: GL tunnel callback first, egui overlays on top
//!
//! Repaints continuously; the shader animates even without scrolling.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Vec2};
use eframe::glow;
use log::{debug, info, trace};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::audio::AudioOut;
use super::interactions::{CandleOverlay, MusicToggle};
use super::typewriter::Typewriter;
use crate::config::{ConfigError, TunnelConfig};
use crate::core::fetch::{DiskFetcher, FrameTemplate};
use crate::core::frame_store::FrameSequence;
use crate::core::workers::Workers;
use crate::render::{RenderTargetError, ShaderParams, ShaderState, TunnelRenderer, TunnelShaders};
use crate::scroll::{BinderUpdate, CardReveal, LineTrigger, PinTrigger, ScrollBinder, TagTimeline, TriggerEvent};

/// Letter typing starts when its top crosses 60% of the viewport
const LETTER_LINE: f32 = 0.6;

const SECTION_PADDING: f32 = 80.0;
const HEADER_HEIGHT: f32 = 80.0;
const CARD_HEIGHT: f32 = 200.0;
const CARD_GAP: f32 = 24.0;
const CONTENT_MAX_WIDTH: f32 = 1000.0;
const LETTER_FONT: f32 = 20.0;
const CANDLE_BUTTON: Vec2 = Vec2::new(220.0, 52.0);
const MUSIC_BUTTON: f32 = 48.0;
const ARROW_STEP: f32 = 60.0;

// Clamp frame time so a stalled window does not jump animations
const MAX_DT: f32 = 0.1;

const GOLD: Color32 = Color32::from_rgb(232, 196, 120);
const CARD_FILL: Color32 = Color32::from_rgb(34, 28, 24);
const PAPER: Color32 = Color32::from_rgb(245, 236, 220);

/// Section positions in page coordinates (logical px, 0 = page top)
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub viewport: Vec2,
    pub pin_length: f32,
    pub memories_top: f32,
    pub cards: Vec<Rect>,
    pub letter_top: f32,
    pub letter_text_top: f32,
    pub candle_button: Rect,
    pub height: f32,
}

impl PageLayout {
    /// Stack the sections for a viewport; `letter_height` is the laid-out
    /// height of the full letter text at `content_width()`
    pub fn compute(viewport: Vec2, pin_length: f32, card_count: usize, letter_height: f32) -> Self {
        let content_width = Self::content_width_for(viewport.x);
        let left = (viewport.x - content_width) * 0.5;

        // Hero occupies one viewport, plus the scroll distance it stays pinned
        let memories_top = viewport.y + pin_length;

        let columns = match viewport.x {
            w if w >= 900.0 => 3,
            w if w >= 560.0 => 2,
            _ => 1,
        };
        let card_width = (content_width - CARD_GAP * (columns - 1) as f32) / columns as f32;
        let grid_top = memories_top + SECTION_PADDING + HEADER_HEIGHT;
        let cards: Vec<Rect> = (0..card_count)
            .map(|i| {
                let (row, col) = (i / columns, i % columns);
                let min = Pos2::new(
                    left + col as f32 * (card_width + CARD_GAP),
                    grid_top + row as f32 * (CARD_HEIGHT + CARD_GAP),
                );
                Rect::from_min_size(min, Vec2::new(card_width, CARD_HEIGHT))
            })
            .collect();

        let rows = card_count.div_ceil(columns);
        let grid_height = if rows == 0 {
            0.0
        } else {
            rows as f32 * CARD_HEIGHT + (rows - 1) as f32 * CARD_GAP
        };
        let letter_top = grid_top + grid_height + SECTION_PADDING;
        let letter_text_top = letter_top + SECTION_PADDING + HEADER_HEIGHT;

        let button_top = letter_text_top + letter_height + SECTION_PADDING;
        let candle_button = Rect::from_min_size(
            Pos2::new((viewport.x - CANDLE_BUTTON.x) * 0.5, button_top),
            CANDLE_BUTTON,
        );

        // Last section can always be scrolled fully into view
        let height = (candle_button.bottom() + SECTION_PADDING * 2.0).max(memories_top + viewport.y);

        Self {
            viewport,
            pin_length,
            memories_top,
            cards,
            letter_top,
            letter_text_top,
            candle_button,
            height,
        }
    }

    fn content_width_for(viewport_width: f32) -> f32 {
        (viewport_width - 2.0 * CARD_GAP).clamp(1.0, CONTENT_MAX_WIDTH)
    }

    pub fn content_width(&self) -> f32 {
        Self::content_width_for(self.viewport.x)
    }

    pub fn max_scroll(&self) -> f32 {
        (self.height - self.viewport.y).max(0.0)
    }
}

/// Music toggle sits in the bottom-right corner of the window
fn music_button_rect(screen: Rect) -> Rect {
    Rect::from_min_size(
        screen.right_bottom() - Vec2::splat(MUSIC_BUTTON + 24.0),
        Vec2::splat(MUSIC_BUTTON),
    )
}

/// Main window state
pub struct TunnelApp {
    config: TunnelConfig,
    workers: Workers,
    frames: FrameSequence,
    trigger: PinTrigger,
    binder: ScrollBinder,
    shader: ShaderState,
    renderer: Arc<Mutex<TunnelRenderer>>,
    cards: CardReveal,
    letter_trigger: LineTrigger,
    typewriter: Typewriter,
    candle: CandleOverlay,
    music: MusicToggle,
    audio: Box<dyn AudioOut>,
    scroll: f32,
}

/// Construction failures: bad tuning or no usable GL surface
#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Render(RenderTargetError),
    Workers(std::io::Error),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Config(e) => write!(f, "Configuration error: {}", e),
            StartupError::Render(e) => write!(f, "Render target error: {}", e),
            StartupError::Workers(e) => write!(f, "Failed to start worker threads: {}", e),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        StartupError::Config(e)
    }
}

impl From<RenderTargetError> for StartupError {
    fn from(e: RenderTargetError) -> Self {
        StartupError::Render(e)
    }
}

impl TunnelApp {
    /// Validate config, compile the shader and start loading frames
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: TunnelConfig,
        audio: Box<dyn AudioOut>,
    ) -> Result<Self, StartupError> {
        config.validate()?;
        let duration = config.scroll_duration()?;

        let gl = cc.gl.as_ref().ok_or(RenderTargetError::NoContext)?;
        let mut renderer = TunnelRenderer::new(TunnelShaders::load(&config.shader_dir));
        renderer.init(gl)?;

        let workers = Workers::new(Workers::default_threads()).map_err(StartupError::Workers)?;
        let template = FrameTemplate::new(&config.frames_path, &config.frame_ext);
        let mut frames = FrameSequence::new(config.total_frames, template)?;

        // Settlements are applied in update(); wake it when the batch completes
        let ctx = cc.egui_ctx.clone();
        frames.begin_load(&workers, Arc::new(DiskFetcher), move |_| ctx.request_repaint());

        let tags = TagTimeline::new(&config.tags, config.tag_fade);
        let typewriter = Typewriter::new(
            config.letter.clone(),
            Duration::from_millis(config.typewriter_ms),
        );

        info!(
            "Tunnel: {} frames, {} workers, pinned for {:?}",
            config.total_frames,
            workers.len(),
            duration
        );

        Ok(Self {
            trigger: PinTrigger::new(0.0, duration, config.scrub_lag),
            binder: ScrollBinder::new(tags),
            shader: ShaderState::new(ShaderParams::from_config(&config)),
            renderer: Arc::new(Mutex::new(renderer)),
            cards: CardReveal::new(config.memories.len()),
            letter_trigger: LineTrigger::new(LETTER_LINE),
            typewriter,
            candle: CandleOverlay::new(),
            music: MusicToggle::new(),
            audio,
            scroll: 0.0,
            workers,
            frames,
            config,
        })
    }

    fn read_scroll(&mut self, ctx: &egui::Context, layout: &PageLayout) {
        let page = layout.viewport.y * 0.9;
        let delta = ctx.input(|i| {
            let mut d = -i.smooth_scroll_delta.y;
            if i.key_pressed(egui::Key::ArrowDown) {
                d += ARROW_STEP;
            }
            if i.key_pressed(egui::Key::ArrowUp) {
                d -= ARROW_STEP;
            }
            if i.key_pressed(egui::Key::PageDown) || i.key_pressed(egui::Key::Space) {
                d += page;
            }
            if i.key_pressed(egui::Key::PageUp) {
                d -= page;
            }
            if i.key_pressed(egui::Key::Home) {
                d = f32::NEG_INFINITY;
            }
            if i.key_pressed(egui::Key::End) {
                d = f32::INFINITY;
            }
            d
        });

        if delta != 0.0 {
            self.scroll = (self.scroll + delta).clamp(0.0, layout.max_scroll());
        }

        for event in self.trigger.update_scroll(self.scroll) {
            debug!("Hero pin: {:?} at scroll {:.0}", event, self.scroll);
        }
    }

    fn advance(&mut self, dt: f32, layout: &PageLayout) {
        if let Some(progress) = self.trigger.tick(dt) {
            let BinderUpdate { transitions, .. } =
                self.binder.on_progress(progress, &self.frames, &mut self.shader);
            for t in transitions {
                trace!("Tag {:?}", t);
            }
        }

        self.shader.advance(dt);
        self.binder.tick(dt);

        let tops: Vec<f32> = layout.cards.iter().map(|r| r.top() - self.scroll).collect();
        self.cards.update(&tops, layout.viewport.y);
        self.cards.tick(dt);

        if let Some(TriggerEvent::Enter) = self
            .letter_trigger
            .update(layout.letter_top - self.scroll, layout.viewport.y)
            && self.typewriter.start()
        {
            info!("Letter reached, typing");
        }
        self.typewriter.tick(dt);

        self.candle.tick(dt);
        self.music.tick(dt);
    }

    fn paint_hero(&self, ui: &egui::Ui, origin: Pos2, layout: &PageLayout) {
        let top = self.trigger.pinned_distance() - self.scroll;
        let hero = Rect::from_min_size(origin + Vec2::new(0.0, top), layout.viewport);
        if hero.bottom() <= origin.y {
            return;
        }

        let renderer = Arc::clone(&self.renderer);
        let state = self.shader.clone();
        ui.painter().add(egui::PaintCallback {
            rect: hero,
            callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                let mut renderer = renderer.lock().unwrap_or_else(|e| e.into_inner());
                renderer.render(painter.gl(), &state);
            })),
        });

        // Overlays go after the callback or the tunnel draws over them
        let painter = ui.painter_at(hero);
        for tag in self.binder.tags().tags() {
            let (Some(pos), opacity) = (tag.position(), tag.opacity()) else {
                continue;
            };
            if opacity <= 0.0 {
                continue;
            }
            let at = hero.min + Vec2::new(pos.left * hero.width(), pos.top * hero.height() + tag.offset_y());
            painter.text(
                at,
                Align2::LEFT_TOP,
                tag.label(),
                FontId::proportional(30.0),
                GOLD.gamma_multiply(opacity),
            );
        }

        if !self.frames.is_settled() {
            painter.text(
                hero.center_bottom() - Vec2::new(0.0, 40.0),
                Align2::CENTER_CENTER,
                format!(
                    "Loading memories… {}/{}",
                    self.frames.settled_count(),
                    self.frames.total_frames()
                ),
                FontId::proportional(16.0),
                PAPER.gamma_multiply(0.7),
            );
        }
    }

    fn paint_memories(&self, ui: &egui::Ui, origin: Pos2, layout: &PageLayout) {
        let painter = ui.painter();
        let offset = origin.to_vec2() - Vec2::new(0.0, self.scroll);

        painter.text(
            Pos2::new(layout.viewport.x * 0.5, layout.memories_top + SECTION_PADDING) + offset,
            Align2::CENTER_TOP,
            "Memories",
            FontId::proportional(40.0),
            GOLD,
        );

        for (i, (rect, caption)) in layout.cards.iter().zip(&self.config.memories).enumerate() {
            let (opacity, dy) = self.cards.appearance(i);
            if opacity <= 0.0 {
                continue;
            }
            let rect = rect.translate(offset + Vec2::new(0.0, dy));
            painter.rect_filled(rect, 12.0, CARD_FILL.gamma_multiply(opacity));
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                caption,
                FontId::proportional(22.0),
                PAPER.gamma_multiply(opacity),
            );
        }
    }

    fn paint_letter(&mut self, ui: &egui::Ui, origin: Pos2, layout: &PageLayout) {
        let offset = origin.to_vec2() - Vec2::new(0.0, self.scroll);
        let painter = ui.painter();

        painter.text(
            Pos2::new(layout.viewport.x * 0.5, layout.letter_top + SECTION_PADDING) + offset,
            Align2::CENTER_TOP,
            "A Letter",
            FontId::proportional(40.0),
            GOLD,
        );

        let galley = painter.layout(
            self.typewriter.visible().to_string(),
            FontId::proportional(LETTER_FONT),
            PAPER,
            layout.content_width(),
        );
        let text_left = (layout.viewport.x - layout.content_width()) * 0.5;
        painter.galley(Pos2::new(text_left, layout.letter_text_top) + offset, galley, PAPER);

        let button = layout.candle_button.translate(offset);
        let response = ui.interact(button, egui::Id::new("candle_button"), Sense::click());
        let fill = if response.hovered() { GOLD } else { GOLD.gamma_multiply(0.8) };
        painter.rect_filled(button, 26.0, fill);
        painter.text(
            button.center(),
            Align2::CENTER_CENTER,
            "🕯 Light a candle",
            FontId::proportional(20.0),
            Color32::BLACK,
        );
        if response.clicked() {
            self.candle.light(self.audio.as_mut());
        }
    }

    fn paint_music_button(&self, ui: &egui::Ui, screen: Rect) {
        if !self.music.is_revealed() {
            return;
        }
        let rect = music_button_rect(screen);
        let opacity = self.music.button_opacity();

        let painter = ui.painter();
        painter.circle_filled(rect.center(), MUSIC_BUTTON * 0.5, CARD_FILL.gamma_multiply(opacity));
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            self.music.icon(),
            FontId::proportional(22.0),
            PAPER.gamma_multiply(opacity),
        );
    }

    fn paint_candle_overlay(&self, ui: &egui::Ui, screen: Rect) {
        let opacity = self.candle.opacity();
        if !self.candle.is_visible() || opacity <= 0.0 {
            return;
        }
        let painter = ui.painter();
        painter.rect_filled(screen, 0.0, Color32::from_black_alpha(230).gamma_multiply(opacity));
        painter.text(
            screen.center() - Vec2::new(0.0, 40.0),
            Align2::CENTER_CENTER,
            "🕯",
            FontId::proportional(96.0),
            GOLD.gamma_multiply(opacity),
        );
        painter.text(
            screen.center() + Vec2::new(0.0, 60.0),
            Align2::CENTER_CENTER,
            "Make a wish",
            FontId::proportional(28.0),
            PAPER.gamma_multiply(opacity),
        );
    }
}

impl eframe::App for TunnelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.frames.pump().is_some() {
            self.binder.on_all_settled(&self.frames, &mut self.shader);
        }

        let dt = ctx.input(|i| i.stable_dt).clamp(0.0, MAX_DT);
        // Some(pos) for a click this frame; pos can be absent on touch release
        let click = ctx.input(|i| i.pointer.any_click().then(|| i.pointer.interact_pos()));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(Color32::BLACK))
            .show(ctx, |ui| {
                let screen = ui.max_rect();
                let viewport = screen.size();

                self.trigger.set_viewport_height(viewport.y);
                self.shader
                    .resize(viewport.x * ctx.pixels_per_point(), viewport.y * ctx.pixels_per_point());

                // Full letter height keeps the page length stable while typing
                let letter_height = ui
                    .painter()
                    .layout(
                        self.config.letter.clone(),
                        FontId::proportional(LETTER_FONT),
                        PAPER,
                        PageLayout::content_width_for(viewport.x),
                    )
                    .size()
                    .y;
                let layout = PageLayout::compute(
                    viewport,
                    self.trigger.length(),
                    self.config.memories.len(),
                    letter_height,
                );

                if let Some(pos) = click {
                    let on_button = pos.is_some_and(|p| music_button_rect(screen).contains(p));
                    if self.music.on_click(on_button, self.audio.as_mut()) {
                        debug!("Music toggled (playing: {})", self.music.is_playing());
                    }
                }

                self.read_scroll(ctx, &layout);
                self.advance(dt, &layout);

                self.paint_hero(ui, screen.min, &layout);
                self.paint_memories(ui, screen.min, &layout);
                self.paint_letter(ui, screen.min, &layout);
                self.paint_music_button(ui, screen);
                self.paint_candle_overlay(ui, screen);
            });

        ctx.request_repaint();
    }

    /// Cleanup on application exit.
    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        self.frames.cancel_load();
        self.typewriter.cancel();
        trace!("Cancelled pending frame loads ({} workers)", self.workers.len());

        if let Some(gl) = gl {
            let mut renderer = self.renderer.lock().unwrap_or_else(|e| e.into_inner());
            renderer.destroy(gl);
            trace!("TunnelRenderer resources cleaned up");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PageLayout {
        PageLayout::compute(Vec2::new(1200.0, 800.0), 1200.0, 6, 500.0)
    }

    /// Test: Section stacking
    /// Validates: Memories start after hero plus pinned distance
    #[test]
    fn test_sections_follow_pin() {
        let l = layout();
        assert_eq!(l.memories_top, 2000.0);
        assert!(l.cards.iter().all(|c| c.top() > l.memories_top));
        assert!(l.letter_top > l.cards[5].bottom());
        assert!(l.candle_button.top() > l.letter_text_top + 500.0);
        assert!(l.height > l.candle_button.bottom());
    }

    /// Test: Card grid
    /// Validates: Three columns on a wide window, two rows for six cards
    #[test]
    fn test_card_grid_columns() {
        let l = layout();
        assert_eq!(l.cards[0].top(), l.cards[2].top());
        assert!(l.cards[3].top() > l.cards[0].bottom());
        assert!(l.cards[1].left() > l.cards[0].right());

        let narrow = PageLayout::compute(Vec2::new(400.0, 800.0), 1200.0, 6, 500.0);
        assert!(narrow.cards[1].top() > narrow.cards[0].bottom());
    }

    #[test]
    fn test_max_scroll() {
        let l = layout();
        assert_eq!(l.max_scroll(), l.height - 800.0);

        let empty = PageLayout::compute(Vec2::new(800.0, 600.0), 900.0, 0, 0.0);
        assert!(empty.max_scroll() >= 900.0);
    }
}
