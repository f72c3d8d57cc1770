//! Error types for moonspell

use thiserror::Error;

/// Result type alias for moonspell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a reading
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// User input rejected before any external call
    #[error("validation error: {0}")]
    Validation(String),

    /// Reading generation failed
    #[error("generation error: {0}")]
    Generation(String),

    /// Reading text did not contain three recognizable sections
    #[error("reading malformed: {0}")]
    ReadingMalformed(String),

    /// Text-to-speech error
    #[error("speech error: {0}")]
    Speech(String),

    /// Sigil image generation error
    #[error("sigil error: {0}")]
    Sigil(String),

    /// Speech requested while audio is muted
    #[error("audio is muted")]
    Muted,

    /// A newer speech request or an explicit stop replaced this one
    #[error("speech request superseded")]
    SpeechSuperseded,

    /// Audio output error
    #[error("audio error: {0}")]
    Audio(String),

    /// Audio payload decode error
    #[error("decode error: {0}")]
    Decode(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Message suitable for showing to the person asking for a reading
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Generation(_) | Self::Http(_) => {
                "Er was een probleem bij het verbinden met de kosmos. Controleer je verbinding en probeer het opnieuw.".to_string()
            }
            Self::ReadingMalformed(_) => {
                "De ontvangen boodschap had een onverwachte vorm. Probeer het alsjeblieft opnieuw.".to_string()
            }
            Self::Speech(_) | Self::Decode(_) => {
                "De stem van de kosmos kon niet worden bereikt. Probeer het later opnieuw.".to_string()
            }
            Self::Sigil(_) => {
                "De kosmos kon de zegel niet vormen. Probeer het later opnieuw.".to_string()
            }
            Self::Muted => "Het geluid staat uit.".to_string(),
            _ => "Er is een onbekende fout opgetreden.".to_string(),
        }
    }

    /// Whether resubmitting the same input may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Generation(_) | Self::ReadingMalformed(_) | Self::Http(_)
        )
    }
}
