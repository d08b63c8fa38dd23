//! Entities module - decoded frame handles

pub mod frame;

pub use frame::{Frame, FrameLoadError};
