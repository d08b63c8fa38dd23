//! Memory Tunnel - scroll-driven photo tribute
//!
//! Re-exports all modules for use by binary targets.

// Core engine (frame store, fetch, workers)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod populate;
pub mod render;
pub mod scroll;
pub mod shell;
pub mod ui;

// Re-export commonly used types
pub use config::{ConfigError, TunnelConfig};
pub use core::frame_store::{FrameSequence, LoadHandle, PlaybackCursor};
pub use entities::{Frame, FrameLoadError};
pub use render::{RenderTargetError, ShaderState};
