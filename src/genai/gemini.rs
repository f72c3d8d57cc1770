//! Gemini `generateContent` client

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ReadingGenerator, SigilGenerator, SigilImage, SpeechSynthesizer};
use crate::config::GenAiConfig;
use crate::prompt::{Prompt, ReadingFormat, sigil_prompt, speech_prompt};
use crate::{Error, Result};

/// Client for text, speech and image generation
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    text_model: String,
    tts_model: String,
    tts_voice: String,
    image_model: String,
    temperature: f32,
    top_p: f32,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("tts_model", &self.tts_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| {
                Error::Config("Gemini API key required (set GEMINI_API_KEY)".to_string())
            })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            tts_model: config.tts_model.clone(),
            tts_voice: config.tts_voice.clone(),
            image_model: config.image_model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    /// Send a `generateContent` request; HTTP failures are mapped by `on_error`
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest<'_>,
        on_error: fn(String) -> Error,
    ) -> Result<GenerateResponse> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| on_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(on_error(format!("Gemini error {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| on_error(format!("failed to parse Gemini response: {e}")))
    }
}

#[async_trait]
impl ReadingGenerator for GeminiClient {
    async fn generate_reading(&self, prompt: &Prompt) -> Result<String> {
        let (mime, schema) = match prompt.format {
            ReadingFormat::Headers => (None, None),
            ReadingFormat::Json => (Some("application/json"), Some(reading_schema())),
        };

        let request = GenerateRequest {
            system_instruction: Some(Content::text(&prompt.system_instruction)),
            contents: vec![Content::user(&prompt.contents)],
            generation_config: GenerationConfig {
                temperature: Some(self.temperature),
                top_p: Some(self.top_p),
                response_mime_type: mime,
                response_schema: schema,
                ..GenerationConfig::default()
            },
        };

        tracing::debug!(model = %self.text_model, format = ?prompt.format, "requesting reading");
        let response = self
            .generate(&self.text_model, &request, Error::Generation)
            .await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(Error::Generation("no text in response".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn synthesize(&self, text: &str) -> Result<String> {
        let spoken = speech_prompt(text);
        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content::user(&spoken)],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO"]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: &self.tts_voice,
                        },
                    },
                }),
                ..GenerationConfig::default()
            },
        };

        tracing::debug!(model = %self.tts_model, chars = text.len(), "requesting speech");
        let response = self.generate(&self.tts_model, &request, Error::Speech).await?;

        response
            .first_part()
            .and_then(|p| p.inline_data.as_ref())
            .map(|d| d.data.clone())
            .ok_or_else(|| Error::Speech("no audio data received".to_string()))
    }
}

#[async_trait]
impl SigilGenerator for GeminiClient {
    async fn generate_sigil(&self, reading_text: &str) -> Result<SigilImage> {
        let prompt = sigil_prompt(reading_text);
        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content::user(&prompt)],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["IMAGE"]),
                ..GenerationConfig::default()
            },
        };

        tracing::debug!(model = %self.image_model, "requesting sigil");
        let response = self.generate(&self.image_model, &request, Error::Sigil).await?;

        response
            .parts()
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| SigilImage {
                mime_type: d
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "image/png".to_string()),
                data: d.data.clone(),
            })
            .ok_or_else(|| Error::Sigil("no image data received".to_string()))
    }
}

fn reading_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "geestenBoodschap": { "type": "STRING" },
            "ritueleInstructie": { "type": "STRING" },
            "energetischeTip": { "type": "STRING" }
        },
        "required": ["geestenBoodschap", "ritueleInstructie", "energetischeTip"],
        "propertyOrdering": ["geestenBoodschap", "ritueleInstructie", "energetischeTip"]
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<TextPart<'a>>,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            role: None,
            parts: vec![TextPart { text }],
        }
    }

    fn user(text: &'a str) -> Self {
        Self {
            role: Some("user"),
            parts: vec![TextPart { text }],
        }
    }
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    fn first_part(&self) -> Option<&ResponsePart> {
        self.parts().next()
    }

    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }
}
