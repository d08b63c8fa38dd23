//! Window and page interactions

pub mod app;
pub mod audio;
pub mod interactions;
pub mod typewriter;

pub use app::{PageLayout, StartupError, TunnelApp};
pub use audio::{AudioOut, LogAudio, open_audio};
pub use interactions::{CandleOverlay, MusicToggle};
pub use typewriter::Typewriter;
