//! Moonspell - personalized moon-phase readings
//!
//! This library provides the core functionality for moonspell:
//! - Moon phase calculation and life-path numerology
//! - Prompt assembly and reading parsing
//! - Text, speech and sigil generation via a hosted generative API
//! - Local cue tones and narration playback
//! - HTTP API for web front-ends
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │      CLI reading  │  HTTP API  │  Web front-end      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Moonspell                           │
//! │   Session  │  Prompt  │  Reading  │  Audio  │  Moon  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Generative API                          │
//! │        Text  │  Speech  │  Image                     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod genai;
pub mod interactive;
pub mod moon;
pub mod numerology;
pub mod prompt;
pub mod reading;
pub mod session;
pub mod share;

pub use config::Config;
pub use error::{Error, Result};
pub use genai::{GeminiClient, ReadingGenerator, SigilGenerator, SigilImage, SpeechSynthesizer};
pub use moon::{MoonPhase, moon_phase, moon_phase_now};
pub use numerology::life_path_number;
pub use prompt::{PromptAssembler, ReadingForm, ReadingFormat, ReadingRequest, ZodiacSign};
pub use reading::{Section, Spell, parse_reading, parse_spell};
pub use session::{AppState, ReadingSession, SigilState};
