//! Generative API clients
//!
//! The session and API layers only see the three traits below; `GeminiClient`
//! implements all of them against the hosted `generateContent` endpoint.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::{Error, Result};
use crate::prompt::Prompt;

/// Produces reading text from an assembled prompt
#[async_trait]
pub trait ReadingGenerator: Send + Sync {
    /// Generate the raw reading text
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` if the service fails or returns no text
    async fn generate_reading(&self, prompt: &Prompt) -> Result<String>;
}

/// Narrates text
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning base64 raw PCM (s16le, mono, 24 kHz)
    ///
    /// # Errors
    ///
    /// Returns `Error::Speech` if the service fails or returns no audio
    async fn synthesize(&self, text: &str) -> Result<String>;
}

/// Draws a sigil for a reading
#[async_trait]
pub trait SigilGenerator: Send + Sync {
    /// Generate a sigil image for the full reading text
    ///
    /// # Errors
    ///
    /// Returns `Error::Sigil` if the service fails or returns no image
    async fn generate_sigil(&self, reading_text: &str) -> Result<SigilImage>;
}

/// A generated image, still base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigilImage {
    pub mime_type: String,
    pub data: String,
}

impl SigilImage {
    /// Decoded image bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Sigil` if the payload is not valid base64
    pub fn bytes(&self) -> Result<Vec<u8>> {
        crate::audio::decode_base64(&self.data)
            .map_err(|e| Error::Sigil(format!("invalid image data: {e}")))
    }

    /// `data:` URL for embedding in a page
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
