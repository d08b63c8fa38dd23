//! Core engine modules - frame store, fetching, workers
//!
//! These modules load and serve frames, independent of UI.

pub mod fetch;
pub mod frame_store;
pub mod workers;

// Re-exports for convenience
pub use fetch::{DiskFetcher, FrameFetcher, FrameTemplate};
pub use frame_store::{FrameSequence, FrameSlot, LoadHandle, LoadSummary, PlaybackCursor, SlotState};
pub use workers::Workers;
