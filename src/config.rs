//! Configuration: application paths, tuning and page content
//!
//! Priority for `TunnelConfig`: CLI flags > `--config FILE` > `tunnel.json`
//! in the config directory > built-in defaults.
//!
//! Config directory priority:
//! 1. CLI `--config-dir`
//! 2. `TUNNEL_CONFIG_DIR` environment variable
//! 3. Local folder IF `tunnel.json` or `tunnel.log` exists there
//! 4. Platform config directory from dirs-next (`~/.config/memory-tunnel` on Linux)

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Application folder name under the platform config/data dirs
const APP_DIR: &str = "memory-tunnel";

/// Config file name looked up in the config directory
pub const CONFIG_FILE: &str = "tunnel.json";

/// Default log file name in the data directory
pub const LOG_FILE: &str = "tunnel.log";

/// Configuration validation errors (fatal at construction)
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Frame count below 1
    TotalFrames(usize),
    /// Unparseable scroll duration ("150%", "900px")
    ScrollDuration(String),
    /// Non-finite or out-of-range tuning value
    Tuning { name: &'static str, value: f32 },
    /// Tag range outside [0,1] or reversed
    TagRange { index: usize, start: f32, end: f32 },
    /// Empty frame extension
    FrameExt(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TotalFrames(n) => write!(f, "totalFrames must be >= 1 (got {})", n),
            ConfigError::ScrollDuration(s) => {
                write!(f, "Invalid scroll duration '{}' (expected e.g. 150% or 900px)", s)
            }
            ConfigError::Tuning { name, value } => write!(f, "Invalid {}: {}", name, value),
            ConfigError::TagRange { index, start, end } => {
                write!(f, "Tag {} has invalid range [{}, {}]", index + 1, start, end)
            }
            ConfigError::FrameExt(ext) => write!(f, "Invalid frame extension '{}'", ext),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Length of the pinned region
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollDuration {
    /// Percentage of viewport height ("150%")
    ViewportPercent(f32),
    /// Absolute logical pixels ("900px")
    Pixels(f32),
}

impl ScrollDuration {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let trimmed = s.trim();
        let err = || ConfigError::ScrollDuration(s.to_string());

        let (number, percent) = match trimmed.strip_suffix('%') {
            Some(n) => (n, true),
            None => (trimmed.strip_suffix("px").unwrap_or(trimmed), false),
        };

        let value: f32 = number.trim().parse().map_err(|_| err())?;
        if !value.is_finite() || value <= 0.0 {
            return Err(err());
        }
        Ok(if percent {
            ScrollDuration::ViewportPercent(value)
        } else {
            ScrollDuration::Pixels(value)
        })
    }

    /// Pinned distance in logical pixels for the given viewport height
    pub fn to_pixels(&self, viewport_height: f32) -> f32 {
        match *self {
            ScrollDuration::ViewportPercent(p) => viewport_height * p / 100.0,
            ScrollDuration::Pixels(px) => px,
        }
    }
}

/// One floating tag: label and the progress range it shows in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    pub label: String,
    pub start: f32,
    pub end: f32,
}

impl TagConfig {
    fn new(label: &str, start: f32, end: f32) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
        }
    }
}

const DEFAULT_LETTER: &str = "Mom,

You have been my first home,
my first teacher,
my first protector,
and my forever strength.

Every step I take has your love behind it.
Every dream I chase has your blessing in it.

Today is your day.
And I just want you to know…

I am who I am because of you.

Happy Birthday, Mom.
I love you always.";

/// Tunnel tuning and page content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    // Frames
    pub total_frames: usize,
    pub frames_path: PathBuf,
    pub frame_ext: String,

    // Scroll
    pub scroll_duration: String, // "150%" of viewport height
    pub scrub_lag: f32,          // Seconds for progress to catch up (0 = immediate)

    // Shader
    pub vignette_strength: f32,
    pub warmth: f32,
    pub distortion: f32,
    pub shader_dir: PathBuf, // tunnel.glsl here overrides the embedded shader

    // Overlays
    pub tags: Vec<TagConfig>,
    pub tag_fade: f32, // Seconds per tag fade
    pub memories: Vec<String>,
    pub letter: String,
    pub typewriter_ms: u64,

    // Audio
    pub music_path: Option<PathBuf>,
    pub bell_path: Option<PathBuf>,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            total_frames: 190,
            frames_path: PathBuf::from("Family Photos"),
            frame_ext: "png".to_string(),
            scroll_duration: "150%".to_string(),
            scrub_lag: 1.0,
            vignette_strength: 1.2, // Soft vignette
            warmth: 0.1,            // Subtle gold
            distortion: 0.02,       // Subtle lens
            shader_dir: PathBuf::from("shaders"),
            tags: vec![
                TagConfig::new("My First Hero", 0.05, 0.2),
                TagConfig::new("My Safe Place", 0.25, 0.4),
                TagConfig::new("My Biggest Support", 0.45, 0.6),
                TagConfig::new("My Forever Friend", 0.65, 0.8),
                TagConfig::new("My Strength", 0.85, 1.0),
            ],
            tag_fade: 0.5,
            memories: vec![
                "The first steps".to_string(),
                "Sunday kitchen".to_string(),
                "School mornings".to_string(),
                "Every birthday".to_string(),
                "Long talks".to_string(),
                "Still holding on".to_string(),
            ],
            letter: DEFAULT_LETTER.to_string(),
            typewriter_ms: 40,
            music_path: Some(PathBuf::from("assets/audio/music.mp3")),
            bell_path: Some(PathBuf::from("assets/audio/bell.mp3")),
        }
    }
}

impl TunnelConfig {
    /// Read a JSON config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: TunnelConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!("Loaded config: {}", path.display());
        Ok(config)
    }

    /// Explicit file, else `tunnel.json` in the config dir, else defaults
    pub fn load(explicit: Option<&Path>, paths: &PathConfig) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidate = config_file(CONFIG_FILE, paths);
        if candidate.exists() {
            Self::from_file(&candidate)
        } else {
            debug!("No config at {}, using defaults", candidate.display());
            Ok(Self::default())
        }
    }

    /// Parsed pinned-region length
    pub fn scroll_duration(&self) -> Result<ScrollDuration, ConfigError> {
        ScrollDuration::parse(&self.scroll_duration)
    }

    /// Check every value that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_frames < 1 {
            return Err(ConfigError::TotalFrames(self.total_frames));
        }
        if self.frame_ext.trim_start_matches('.').is_empty() {
            return Err(ConfigError::FrameExt(self.frame_ext.clone()));
        }
        self.scroll_duration()?;

        let non_negative = [
            ("vignette_strength", self.vignette_strength),
            ("scrub_lag", self.scrub_lag),
            ("tag_fade", self.tag_fade),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Tuning { name, value });
            }
        }
        for (name, value) in [("warmth", self.warmth), ("distortion", self.distortion)] {
            if !value.is_finite() {
                return Err(ConfigError::Tuning { name, value });
            }
        }

        for (index, tag) in self.tags.iter().enumerate() {
            let valid = (0.0..=1.0).contains(&tag.start)
                && (0.0..=1.0).contains(&tag.end)
                && tag.start <= tag.end;
            if !valid {
                return Err(ConfigError::TagRange {
                    index,
                    start: tag.start,
                    end: tag.end,
                });
            }
        }

        Ok(())
    }
}

/// Overrides for default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args -> ENV var (TUNNEL_CONFIG_DIR) -> None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var("TUNNEL_CONFIG_DIR").ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Path to a configuration file
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir()).join(name)
}

/// Path to a data file (logs)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir()).join(name)
}

/// Create config and data directories if missing
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir());
    let data_dir = resolve_dir(config, dirs_next::data_dir());

    for dir in [config_dir, data_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    [CONFIG_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir()
        && has_local_files(&current_dir)
    {
        return current_dir;
    }

    if let Some(dir) = platform {
        return dir.join(APP_DIR);
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        let c = TunnelConfig::default();
        assert_eq!(c.total_frames, 190);
        assert_eq!(c.frames_path, PathBuf::from("Family Photos"));
        assert_eq!(c.frame_ext, "png");
        assert_eq!(c.tags.len(), 5);
        assert_eq!(c.typewriter_ms, 40);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_scroll_duration_parse() {
        assert_eq!(
            ScrollDuration::parse("150%").unwrap(),
            ScrollDuration::ViewportPercent(150.0)
        );
        assert_eq!(ScrollDuration::parse(" 900px ").unwrap(), ScrollDuration::Pixels(900.0));
        assert_eq!(ScrollDuration::parse("600").unwrap(), ScrollDuration::Pixels(600.0));
        assert!(ScrollDuration::parse("abc%").is_err());
        assert!(ScrollDuration::parse("-10%").is_err());
        assert!(ScrollDuration::parse("").is_err());

        let d = ScrollDuration::ViewportPercent(150.0);
        assert!((d.to_pixels(800.0) - 1200.0).abs() < 1e-3);
    }

    /// Test: Tuning errors name the settings key
    /// Validates: Every reported name is a key of the saved JSON
    #[test]
    fn test_tuning_error_names_json_key() {
        let json = serde_json::to_value(TunnelConfig::default()).unwrap();
        let setters: [(&str, fn(&mut TunnelConfig)); 5] = [
            ("vignette_strength", |c| c.vignette_strength = -1.0),
            ("scrub_lag", |c| c.scrub_lag = -1.0),
            ("tag_fade", |c| c.tag_fade = f32::INFINITY),
            ("warmth", |c| c.warmth = f32::NAN),
            ("distortion", |c| c.distortion = f32::NAN),
        ];

        for (key, break_it) in setters {
            let mut c = TunnelConfig::default();
            break_it(&mut c);
            match c.validate() {
                Err(ConfigError::Tuning { name, .. }) => {
                    assert_eq!(name, key);
                    assert!(json.get(name).is_some(), "{} is not a config key", name);
                }
                other => panic!("expected tuning error for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut c = TunnelConfig::default();
        c.total_frames = 0;
        assert_eq!(c.validate(), Err(ConfigError::TotalFrames(0)));

        let mut c = TunnelConfig::default();
        c.vignette_strength = f32::NAN;
        assert!(matches!(c.validate(), Err(ConfigError::Tuning { name: "vignette_strength", .. })));

        let mut c = TunnelConfig::default();
        c.tags[1].start = 0.5;
        c.tags[1].end = 0.4;
        assert!(matches!(c.validate(), Err(ConfigError::TagRange { index: 1, .. })));

        let mut c = TunnelConfig::default();
        c.frame_ext = ".".to_string();
        assert!(matches!(c.validate(), Err(ConfigError::FrameExt(_))));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "total_frames": 12, "warmth": 0.4 }"#).unwrap();

        let c = TunnelConfig::from_file(&path).unwrap();
        assert_eq!(c.total_frames, 12);
        assert!((c.warmth - 0.4).abs() < 1e-6);
        assert_eq!(c.frame_ext, "png");
        assert_eq!(c.tags.len(), 5);
    }

    #[test]
    fn test_load_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "frame_ext": "jpg" }"#).unwrap();

        let paths = PathConfig {
            config_dir: Some(dir.path().to_path_buf()),
        };
        let c = TunnelConfig::load(None, &paths).unwrap();
        assert_eq!(c.frame_ext, "jpg");

        let empty = tempfile::tempdir().unwrap();
        let paths = PathConfig {
            config_dir: Some(empty.path().to_path_buf()),
        };
        assert_eq!(TunnelConfig::load(None, &paths).unwrap(), TunnelConfig::default());
    }

    #[test]
    fn test_custom_dir_paths() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("tunnel.json", &config), PathBuf::from("/custom/tunnel.json"));
        assert_eq!(data_file("tunnel.log", &config), PathBuf::from("/custom/tunnel.log"));
    }
}
