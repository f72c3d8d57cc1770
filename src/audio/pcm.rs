//! Raw PCM payload decoding
//!
//! Narration arrives as base64-encoded little-endian 16-bit signed PCM,
//! mono, at 24 kHz, with no container.

use std::time::Duration;

use base64::Engine;

use crate::{Error, Result};

/// Sample rate of narration payloads
pub const SPEECH_SAMPLE_RATE: u32 = 24000;

/// Channel count of narration payloads
pub const SPEECH_CHANNELS: u16 = 1;

/// Decoded, planar audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    data: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build from planar channel data; all channels must share a length
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` on zero channels, zero sample rate or ragged channels
    pub fn new(sample_rate: u32, data: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::Decode("sample rate must be positive".to_string()));
        }
        let Some(first) = data.first() else {
            return Err(Error::Decode("buffer needs at least one channel".to_string()));
        };
        if data.iter().any(|c| c.len() != first.len()) {
            return Err(Error::Decode("channels differ in length".to_string()));
        }
        Ok(Self { sample_rate, data })
    }

    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn channels(&self) -> u16 {
        self.data.len() as u16
    }

    /// Frames per channel
    #[must_use]
    pub fn frames(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// Samples of one channel
    #[must_use]
    pub fn channel(&self, index: usize) -> &[f32] {
        self.data.get(index).map_or(&[], Vec::as_slice)
    }

    /// Playback length
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Decode interleaved little-endian i16 PCM
///
/// Each sample maps to `i16 / 32768.0`, so values lie in `[-1.0, 1.0)`.
///
/// # Errors
///
/// Returns `Error::Decode` if the byte count is odd or the sample count is
/// not a whole number of frames
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer> {
    if channels == 0 {
        return Err(Error::Decode("channel count must be positive".to_string()));
    }
    if bytes.len() % 2 != 0 {
        return Err(Error::Decode(format!(
            "PCM payload has odd length {}",
            bytes.len()
        )));
    }

    let channels = usize::from(channels);
    let sample_count = bytes.len() / 2;
    if sample_count % channels != 0 {
        return Err(Error::Decode(format!(
            "{sample_count} samples do not divide into {channels} channels"
        )));
    }

    let frames = sample_count / channels;
    let mut data = vec![Vec::with_capacity(frames); channels];

    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        data[i % channels].push(f32::from(sample) / 32768.0);
    }

    AudioBuffer::new(sample_rate, data)
}

/// Decode a standard base64 payload
///
/// # Errors
///
/// Returns `Error::Decode` on invalid base64
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Decode(format!("invalid base64 payload: {e}")))
}

/// Decode a base64 narration payload (24 kHz mono PCM)
///
/// # Errors
///
/// Returns `Error::Decode` on invalid base64 or misaligned PCM
pub fn decode_speech(payload: &str) -> Result<AudioBuffer> {
    let bytes = decode_base64(payload)?;
    decode_pcm16(&bytes, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS)
}

/// Encode a buffer as a 16-bit WAV file
///
/// Uses the same 32768 scale as decoding so decoded PCM round-trips exactly.
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn to_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for frame in 0..buffer.frames() {
            for channel in 0..usize::from(buffer.channels()) {
                #[allow(clippy::cast_possible_truncation)]
                let sample =
                    (buffer.channel(channel)[frame] * 32768.0).clamp(-32768.0, 32767.0) as i16;
                writer
                    .write_sample(sample)
                    .map_err(|e| Error::Audio(e.to_string()))?;
            }
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
