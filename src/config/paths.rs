//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\leku-tester\
//!   macOS:   ~/Library/Application Support/leku-tester/
//!   Linux:   ~/.config/leku-tester/
//!
//! Cache dir (temporary clips handed to the player, removed after playback):
//!   Windows: %LOCALAPPDATA%\leku-tester\
//!   macOS:   ~/Library/Caches/leku-tester/
//!   Linux:   ~/.cache/leku-tester/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory where inline audio payloads are written before playback.
    pub audio_cache_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "leku-tester";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let audio_cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME)
            .join("audio");

        let settings_file = config_dir.join("settings.toml");

        Self {
            settings_file,
            audio_cache_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.settings_file.parent().is_some_and(|d| d.ends_with("leku-tester")));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths.audio_cache_dir.ends_with("audio"));
    }
}
