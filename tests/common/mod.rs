//! Shared test utilities
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use moonspell::audio::{AudioService, NullOutput};
use moonspell::prompt::Prompt;
use moonspell::{
    Error, ReadingForm, ReadingGenerator, Result, SigilGenerator, SigilImage, SpeechSynthesizer,
};

/// A well-formed header reading
pub const HEADER_READING: &str = "### De boodschap van de geesten ###\n\
    De sterren fluisteren je naam.\n\
    ### De rituele instructie ###\n\
    Steek bij zonsondergang een witte kaars aan.\n\
    ### De energetische tip ###\n\
    Draag vandaag iets zilvers.";

/// Smallest valid PNG signature, base64 encoded
pub const PNG_BASE64: &str = "iVBORw0KGgo=";

/// A form that passes validation
pub fn valid_form() -> ReadingForm {
    ReadingForm {
        name: "Luna".to_string(),
        birth_date: "1990-01-01".to_string(),
        zodiac_sign: "Steenbok".to_string(),
        wish: "Ik wens rust en helderheid in mijn leven".to_string(),
    }
}

/// Base64 of `frames` mono 16-bit samples at a constant level
pub fn pcm_payload(frames: usize, level: i16) -> String {
    let bytes: Vec<u8> = (0..frames).flat_map(|_| level.to_le_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// What a mock generator answers
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail,
    Never,
}

/// Reading generator that records prompts and answers with a fixed reply
pub struct MockGenerator {
    reply: Reply,
    pub prompts: Mutex<Vec<Prompt>>,
}

impl MockGenerator {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Text(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Fail,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Never answers
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Never,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ReadingGenerator for MockGenerator {
    async fn generate_reading(&self, prompt: &Prompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(Error::Generation("503 upstream overloaded".to_string())),
            Reply::Never => std::future::pending().await,
        }
    }
}

/// Speech synthesizer with an optional delay that counts its calls
pub struct MockSynthesizer {
    payload: Option<String>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl MockSynthesizer {
    /// Answers with `frames` of quiet PCM
    pub fn with_frames(frames: usize) -> Arc<Self> {
        Arc::new(Self {
            payload: Some(pcm_payload(frames, 1000)),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn delayed(frames: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            payload: Some(pcm_payload(frames, 1000)),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            payload: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.payload
            .clone()
            .ok_or_else(|| Error::Speech("no audio data received".to_string()))
    }
}

/// Sigil generator answering with a fixed payload, or failing
pub struct MockSigils {
    data: Option<&'static str>,
}

impl MockSigils {
    /// Answers with a tiny PNG
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            data: Some(PNG_BASE64),
        })
    }

    /// Answers with a payload that is not base64
    pub fn garbled() -> Arc<Self> {
        Arc::new(Self {
            data: Some("not base64!"),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { data: None })
    }
}

#[async_trait]
impl SigilGenerator for MockSigils {
    async fn generate_sigil(&self, _reading_text: &str) -> Result<SigilImage> {
        self.data
            .map(|data| SigilImage {
                mime_type: "image/png".to_string(),
                data: data.to_string(),
            })
            .ok_or_else(|| Error::Sigil("no image data received".to_string()))
    }
}

/// Initialized audio service on a null output
pub fn null_audio(synthesizer: Option<Arc<dyn SpeechSynthesizer>>) -> Arc<AudioService> {
    let service = AudioService::new(Box::new(NullOutput::default()), synthesizer);
    service.initialize();
    Arc::new(service)
}

/// Active voices on the service's mixer
pub fn active_voices(audio: &AudioService) -> usize {
    audio
        .mixer()
        .map_or(0, |m| moonspell::audio::mixer::lock(&m).active_voices())
}

/// Render `seconds` on the service's mixer
pub fn advance(audio: &AudioService, seconds: f64) {
    if let Some(mixer) = audio.mixer() {
        moonspell::audio::mixer::lock(&mixer).advance(seconds);
    }
}
