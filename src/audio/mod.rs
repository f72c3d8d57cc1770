//! Local audio: cue tones and narration
//!
//! A small software mixer replaces a browser audio graph. Sources are
//! scheduled with sample-accurate gain automation, and an [`AudioOutput`]
//! pulls mixed frames on its own thread.

pub mod mixer;
mod output;
mod pcm;
mod service;
pub mod synth;

pub use mixer::{Mixer, PlaybackState, SharedMixer};
pub use output::{AudioOutput, CpalOutput, NullOutput, OUTPUT_SAMPLE_RATE};
pub use pcm::{
    AudioBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, decode_base64, decode_pcm16, decode_speech,
    to_wav,
};
pub use service::{AudioService, LoadingTone, SpeechHandle};
