use clap::Parser;
use std::path::PathBuf;

use crate::config::TunnelConfig;

#[cfg(feature = "audio")]
const AUDIO_BACKEND: &str = "rodio 0.19";
#[cfg(not(feature = "audio"))]
const AUDIO_BACKEND: &str = "none (log only)";

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Audio:  ", AUDIO_BACKEND, "\n",
    "Render: OpenGL 3.3 (glow)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Scroll-driven photo tunnel
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Folder with the numbered frames (1.png .. N.png)
    #[arg(value_name = "FRAMES_DIR")]
    pub frames_path: Option<PathBuf>,

    /// Number of frames in the sequence
    #[arg(short = 'n', long = "frames", value_name = "N")]
    pub total_frames: Option<usize>,

    /// Frame file extension
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub frame_ext: Option<String>,

    /// Pinned scroll length: percent of viewport height ("150%") or pixels ("900px")
    #[arg(short = 'd', long = "duration", value_name = "LEN")]
    pub scroll_duration: Option<String>,

    /// Vignette strength (higher = tighter)
    #[arg(long = "vignette", value_name = "F")]
    pub vignette_strength: Option<f32>,

    /// Warm tint amount, 0..1
    #[arg(long = "warmth", value_name = "F")]
    pub warmth: Option<f32>,

    /// Static lens distortion
    #[arg(long = "distortion", value_name = "F")]
    pub distortion: Option<f32>,

    /// Seconds for the frame to catch up with the scroll (0 = immediate)
    #[arg(long = "scrub-lag", value_name = "SECONDS")]
    pub scrub_lag: Option<f32>,

    /// Render one frame to a PNG without opening a window
    #[arg(short = 's', long = "snapshot", value_name = "OUT.png")]
    pub snapshot: Option<PathBuf>,

    /// Snapshot scroll progress, 0..1
    #[arg(long = "progress", value_name = "P", default_value_t = 0.0, requires = "snapshot")]
    pub progress: f32,

    /// Snapshot shader time in seconds
    #[arg(long = "time", value_name = "T", default_value_t = 0.0, requires = "snapshot")]
    pub time: f32,

    /// Snapshot size
    #[arg(long = "size", value_names = ["W", "H"], num_args = 2, requires = "snapshot")]
    pub size: Option<Vec<u32>>,

    /// Load settings from a JSON file instead of the config directory
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging to file (default: tunnel.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// CLI flags win over file values
    pub fn apply(&self, config: &mut TunnelConfig) {
        if let Some(path) = &self.frames_path {
            config.frames_path = path.clone();
        }
        if let Some(n) = self.total_frames {
            config.total_frames = n;
        }
        if let Some(ext) = &self.frame_ext {
            config.frame_ext = ext.clone();
        }
        if let Some(d) = &self.scroll_duration {
            config.scroll_duration = d.clone();
        }
        if let Some(v) = self.vignette_strength {
            config.vignette_strength = v;
        }
        if let Some(v) = self.warmth {
            config.warmth = v;
        }
        if let Some(v) = self.distortion {
            config.distortion = v;
        }
        if let Some(v) = self.scrub_lag {
            config.scrub_lag = v;
        }
    }

    /// Snapshot size, 1280x720 unless given
    pub fn snapshot_size(&self) -> (u32, u32) {
        match self.size.as_deref() {
            Some([w, h]) => (*w, *h),
            _ => (1280, 720),
        }
    }
}
