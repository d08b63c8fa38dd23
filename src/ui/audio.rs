//! Audio output for the bell and the background music
//!
//! The default build has no audio device code: `LogAudio` only records what
//! would play. With the `audio` feature, `RodioAudio` decodes and plays the
//! configured files through the default output device.

use log::{info, warn};
use std::fmt;
use std::path::PathBuf;

/// Bell volume on candle lighting
pub const BELL_VOLUME: f32 = 0.5;

/// Background music volume
pub const MUSIC_VOLUME: f32 = 0.3;

/// Playback failures; never fatal to the page
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No file configured for this sound
    NotConfigured(&'static str),
    /// File could not be opened or decoded
    Source { path: PathBuf, reason: String },
    /// Output device unavailable
    Device(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NotConfigured(what) => write!(f, "No {} file configured", what),
            AudioError::Source { path, reason } => {
                write!(f, "Audio source error ({}): {}", path.display(), reason)
            }
            AudioError::Device(msg) => write!(f, "Audio device error: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

/// Sound sink used by the candle and music interactions
pub trait AudioOut {
    /// Play the bell from the start
    fn play_bell(&mut self, volume: f32) -> Result<(), AudioError>;
    /// Start or resume the background music
    fn play_music(&mut self, volume: f32) -> Result<(), AudioError>;
    fn pause_music(&mut self);
}

/// Records requests in the log; used when no device is compiled in
#[derive(Debug, Default, Clone)]
pub struct LogAudio {
    bell: Option<PathBuf>,
    music: Option<PathBuf>,
    pub bells: usize,
    pub music_playing: bool,
}

impl LogAudio {
    pub fn new(bell: Option<PathBuf>, music: Option<PathBuf>) -> Self {
        Self {
            bell,
            music,
            ..Self::default()
        }
    }
}

impl AudioOut for LogAudio {
    fn play_bell(&mut self, volume: f32) -> Result<(), AudioError> {
        let path = self.bell.as_ref().ok_or(AudioError::NotConfigured("bell"))?;
        info!("Bell: {} at volume {}", path.display(), volume);
        self.bells += 1;
        Ok(())
    }

    fn play_music(&mut self, volume: f32) -> Result<(), AudioError> {
        let path = self.music.as_ref().ok_or(AudioError::NotConfigured("music"))?;
        info!("Music: {} at volume {}", path.display(), volume);
        self.music_playing = true;
        Ok(())
    }

    fn pause_music(&mut self) {
        info!("Music paused");
        self.music_playing = false;
    }
}

#[cfg(feature = "audio")]
pub use device::RodioAudio;

#[cfg(feature = "audio")]
mod device {
    use super::{AudioError, AudioOut};
    use log::debug;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    /// Plays through the default output device
    pub struct RodioAudio {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        bell: Option<PathBuf>,
        music: Option<PathBuf>,
        bell_sink: Option<Sink>,
        music_sink: Option<Sink>,
    }

    impl RodioAudio {
        pub fn new(bell: Option<PathBuf>, music: Option<PathBuf>) -> Result<Self, AudioError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;
            Ok(Self {
                _stream: stream,
                handle,
                bell,
                music,
                bell_sink: None,
                music_sink: None,
            })
        }

        fn open(path: &Path) -> Result<Decoder<BufReader<File>>, AudioError> {
            let err = |reason: String| AudioError::Source {
                path: path.to_path_buf(),
                reason,
            };
            let file = File::open(path).map_err(|e| err(e.to_string()))?;
            Decoder::new(BufReader::new(file)).map_err(|e| err(e.to_string()))
        }

        fn sink(&self) -> Result<Sink, AudioError> {
            Sink::try_new(&self.handle).map_err(|e| AudioError::Device(e.to_string()))
        }
    }

    impl AudioOut for RodioAudio {
        fn play_bell(&mut self, volume: f32) -> Result<(), AudioError> {
            let path = self.bell.as_ref().ok_or(AudioError::NotConfigured("bell"))?;
            let source = Self::open(path)?;

            // Restart from the beginning: drop the old sink
            let sink = self.sink()?;
            sink.set_volume(volume);
            sink.append(source);
            self.bell_sink = Some(sink);
            Ok(())
        }

        fn play_music(&mut self, volume: f32) -> Result<(), AudioError> {
            if let Some(sink) = &self.music_sink {
                sink.set_volume(volume);
                sink.play();
                return Ok(());
            }

            let path = self.music.as_ref().ok_or(AudioError::NotConfigured("music"))?;
            let source = Self::open(path)?.repeat_infinite();
            let sink = self.sink()?;
            sink.set_volume(volume);
            sink.append(source);
            debug!("Music sink created for {}", path.display());
            self.music_sink = Some(sink);
            Ok(())
        }

        fn pause_music(&mut self) {
            if let Some(sink) = &self.music_sink {
                sink.pause();
            }
        }
    }
}

/// Best available output: the device when compiled in, the log otherwise
pub fn open_audio(bell: Option<PathBuf>, music: Option<PathBuf>) -> Box<dyn AudioOut> {
    #[cfg(feature = "audio")]
    {
        match RodioAudio::new(bell.clone(), music.clone()) {
            Ok(device) => return Box::new(device),
            Err(e) => warn!("{}, falling back to silent audio", e),
        }
    }
    #[cfg(not(feature = "audio"))]
    if bell.is_some() || music.is_some() {
        warn!("Built without the audio feature, sounds are logged only");
    }

    Box::new(LogAudio::new(bell, music))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_audio_tracks_requests() {
        let mut audio = LogAudio::new(Some("bell.mp3".into()), Some("music.mp3".into()));
        audio.play_bell(BELL_VOLUME).unwrap();
        audio.play_bell(BELL_VOLUME).unwrap();
        audio.play_music(MUSIC_VOLUME).unwrap();
        assert_eq!(audio.bells, 2);
        assert!(audio.music_playing);
        audio.pause_music();
        assert!(!audio.music_playing);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut audio = LogAudio::new(None, None);
        assert_eq!(audio.play_bell(BELL_VOLUME), Err(AudioError::NotConfigured("bell")));
        assert!(audio.play_music(MUSIC_VOLUME).is_err());
    }
}
