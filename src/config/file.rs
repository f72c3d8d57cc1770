//! TOML configuration file loading
//!
//! Supports `~/.config/moonspell/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct MoonspellConfigFile {
    /// Generative API configuration
    #[serde(default)]
    pub genai: GenAiFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Local audio configuration
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Reading layout configuration
    #[serde(default)]
    pub reading: ReadingFileConfig,
}

/// Generative API settings
#[derive(Debug, Default, Deserialize)]
pub struct GenAiFileConfig {
    /// API key (prefer the `GEMINI_API_KEY` env var)
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: Option<String>,

    /// Model for reading text (e.g. "gemini-2.5-flash")
    pub text_model: Option<String>,

    /// Model for narration
    pub tts_model: Option<String>,

    /// Prebuilt narration voice (e.g. "Kore")
    pub tts_voice: Option<String>,

    /// Model for sigil images
    pub image_model: Option<String>,

    /// Sampling temperature for readings
    pub temperature: Option<f32>,

    /// Nucleus sampling for readings
    pub top_p: Option<f32>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Directory with a pre-built front-end
    pub static_dir: Option<String>,
}

/// Local audio settings
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// Play cue tones and narration on this machine
    pub enabled: Option<bool>,
}

/// Reading settings
#[derive(Debug, Default, Deserialize)]
pub struct ReadingFileConfig {
    /// "headers" or "json"
    pub format: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `MoonspellConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> MoonspellConfigFile {
    config_file_path().map_or_else(MoonspellConfigFile::default, |p| load_config_file_from(&p))
}

/// Load a TOML config file from `path`, falling back to defaults
pub fn load_config_file_from(path: &Path) -> MoonspellConfigFile {
    if !path.exists() {
        return MoonspellConfigFile::default();
    }

    match read_config_file(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            MoonspellConfigFile::default()
        }
    }
}

/// Read and parse a TOML config file
///
/// # Errors
///
/// Returns `Error::Io` if the file can't be read and `Error::Toml` if it
/// doesn't parse
pub fn read_config_file(path: &Path) -> Result<MoonspellConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/moonspell/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("moonspell").join("config.toml"))
}
