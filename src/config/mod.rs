//! Configuration management for moonspell
//!
//! Every setting resolves as env > TOML file > default.

pub mod file;

use std::path::PathBuf;

use secrecy::SecretString;

pub use file::{MoonspellConfigFile, config_file_path, load_config_file, load_config_file_from};

use crate::prompt::ReadingFormat;
use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 18790;

/// Default generative API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// moonspell configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Generative API configuration
    pub genai: GenAiConfig,

    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Local audio configuration
    pub audio: AudioConfig,

    /// Requested reading layout
    pub reading_format: ReadingFormat,
}

/// Generative API configuration
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// API key (`GEMINI_API_KEY`, or `API_KEY`)
    pub api_key: Option<SecretString>,

    /// Base URL, overridable for proxies and tests
    pub base_url: String,

    /// Model for reading text
    pub text_model: String,

    /// Model for narration
    pub tts_model: String,

    /// Prebuilt narration voice
    pub tts_voice: String,

    /// Model for sigil images
    pub image_model: String,

    /// Sampling temperature for readings
    pub temperature: f32,

    /// Nucleus sampling for readings
    pub top_p: f32,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            tts_voice: "Kore".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            temperature: 0.8,
            top_p: 0.9,
        }
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web front-end)
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: None,
        }
    }
}

/// Local audio configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Play cue tones and narration on this machine
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        let fc = load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an env lookup
    ///
    /// # Errors
    ///
    /// Returns error if a port or reading format is invalid
    pub fn from_sources(
        fc: MoonspellConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = GenAiConfig::default();

        // API key (env > toml)
        let api_key = env("GEMINI_API_KEY")
            .or_else(|| env("API_KEY"))
            .or(fc.genai.api_key)
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let genai = GenAiConfig {
            api_key,
            base_url: env("MOONSPELL_API_BASE_URL")
                .or(fc.genai.base_url)
                .unwrap_or(defaults.base_url),
            text_model: env("MOONSPELL_TEXT_MODEL")
                .or(fc.genai.text_model)
                .unwrap_or(defaults.text_model),
            tts_model: env("MOONSPELL_TTS_MODEL")
                .or(fc.genai.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_voice: env("MOONSPELL_TTS_VOICE")
                .or(fc.genai.tts_voice)
                .unwrap_or(defaults.tts_voice),
            image_model: env("MOONSPELL_IMAGE_MODEL")
                .or(fc.genai.image_model)
                .unwrap_or(defaults.image_model),
            temperature: fc.genai.temperature.unwrap_or(defaults.temperature),
            top_p: fc.genai.top_p.unwrap_or(defaults.top_p),
        };

        let port = match env("MOONSPELL_PORT").or_else(|| env("PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid port: {raw}")))?,
            None => fc.server.port.unwrap_or(DEFAULT_PORT),
        };

        let server = ServerConfig {
            port,
            static_dir: env("MOONSPELL_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        let audio_disabled = env("MOONSPELL_DISABLE_AUDIO").is_some_and(|v| parse_bool(&v));
        if audio_disabled {
            tracing::info!("local audio disabled via MOONSPELL_DISABLE_AUDIO");
        }
        let audio = AudioConfig {
            enabled: !audio_disabled && fc.audio.enabled.unwrap_or(true),
        };

        let reading_format = env("MOONSPELL_READING_FORMAT")
            .or(fc.reading.format)
            .map(|f| f.parse::<ReadingFormat>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            genai,
            server,
            audio,
            reading_format,
        })
    }
}
