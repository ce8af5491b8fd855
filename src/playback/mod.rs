//! Fire-and-forget audio playback.
//!
//! [`AudioPlayer::play`] starts playback and returns immediately; there is
//! no completion signal and failures never reach the caller.  The production
//! [`CommandPlayer`] hands the asset to an external player process (`ffplay`
//! by default) on a detached thread; byte clips live in a temporary file that
//! is removed once the player exits.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempPath;

use crate::config::PlaybackConfig;
use crate::synthesis::PlayableAudio;

/// Starts playback of a decoded asset.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, audio: PlayableAudio);
}

/// File extension for a MIME type, as understood by the external player.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mp3" | "audio/mpeg" => "mp3",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        _ => "bin",
    }
}

/// What the player process is pointed at.  A staged clip is deleted when
/// the target is dropped.
#[derive(Debug)]
pub enum PlaybackTarget {
    Url(String),
    Clip(TempPath),
}

impl PlaybackTarget {
    pub fn as_arg(&self) -> &OsStr {
        match self {
            PlaybackTarget::Url(url) => OsStr::new(url),
            PlaybackTarget::Clip(path) => path.as_os_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandPlayer
// ---------------------------------------------------------------------------

/// Spawns the configured external player for every clip.
#[derive(Clone)]
pub struct CommandPlayer {
    config: PlaybackConfig,
    cache_dir: PathBuf,
}

impl CommandPlayer {
    pub fn new(config: PlaybackConfig, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            cache_dir: cache_dir.into(),
        }
    }

    /// Bytes are written to a temporary file in the cache directory; URLs
    /// are passed through.
    pub fn prepare_target(&self, audio: &PlayableAudio) -> std::io::Result<PlaybackTarget> {
        match audio {
            PlayableAudio::Url(url) => Ok(PlaybackTarget::Url(url.clone())),
            PlayableAudio::Bytes { data, mime_type } => {
                std::fs::create_dir_all(&self.cache_dir)?;
                let suffix = format!(".{}", extension_for(mime_type));
                let mut file = tempfile::Builder::new()
                    .prefix("clip-")
                    .suffix(&suffix)
                    .tempfile_in(&self.cache_dir)?;
                file.write_all(data)?;
                file.flush()?;
                Ok(PlaybackTarget::Clip(file.into_temp_path()))
            }
        }
    }

    fn run(&self, target: &PlaybackTarget) -> std::io::Result<std::process::ExitStatus> {
        Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(target.as_arg())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
    }

    /// Stage, play and clean up one asset on the calling thread.
    pub fn play_blocking(&self, audio: &PlayableAudio) {
        let target = match self.prepare_target(audio) {
            Ok(target) => target,
            Err(e) => {
                log::error!("playback: cannot stage audio clip: {e}");
                return;
            }
        };
        log::debug!("playback: {} {:?}", self.config.command, target.as_arg());
        match self.run(&target) {
            Ok(status) if !status.success() => {
                log::warn!("playback: {} exited with {status}", self.config.command)
            }
            Ok(_) => {}
            Err(e) => log::error!("playback: cannot start {}: {e}", self.config.command),
        }
        if let PlaybackTarget::Clip(path) = target {
            if let Err(e) = path.close() {
                log::warn!("playback: cannot remove staged clip: {e}");
            }
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&self, audio: PlayableAudio) {
        let player = self.clone();
        let spawned = std::thread::Builder::new()
            .name("audio-playback".into())
            .spawn(move || player.play_blocking(&audio));

        if let Err(e) = spawned {
            log::error!("playback: cannot spawn playback thread: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingPlayer (test double)
// ---------------------------------------------------------------------------

/// Remembers every asset it was asked to play.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingPlayer {
    pub played: std::sync::Mutex<Vec<PlayableAudio>>,
}

#[cfg(test)]
impl RecordingPlayer {
    pub fn played(&self) -> Vec<PlayableAudio> {
        self.played.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl AudioPlayer for RecordingPlayer {
    fn play(&self, audio: PlayableAudio) {
        self.played.lock().unwrap().push(audio);
    }
}
