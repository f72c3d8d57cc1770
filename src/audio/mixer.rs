//! Software mixer driven by the output callback

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::pcm::AudioBuffer;
use super::synth::{BandPass, Param, SineOscillator};

/// Mixer shared between the service and the output thread
pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Lock a shared mixer, recovering from a poisoned lock
pub fn lock(mixer: &SharedMixer) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identifier of a scheduled voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

/// Playback state published to speech handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    /// Reached its end or its scheduled stop
    Finished,
    /// Stopped on request before the end
    Stopped,
}

/// What a voice plays
pub enum Source {
    Sine(SineOscillator),
    /// Looping noise, optionally band-passed
    Noise {
        samples: Arc<[f32]>,
        position: usize,
        filter: Option<BandPass>,
    },
    /// One-shot decoded buffer, first channel only
    Buffer {
        buffer: Arc<AudioBuffer>,
        position: f64,
    },
}

impl Source {
    /// Looping noise source
    #[must_use]
    pub const fn noise(samples: Arc<[f32]>, filter: Option<BandPass>) -> Self {
        Self::Noise {
            samples,
            position: 0,
            filter,
        }
    }

    /// One-shot buffer source
    #[must_use]
    pub const fn buffer(buffer: Arc<AudioBuffer>) -> Self {
        Self::Buffer {
            buffer,
            position: 0.0,
        }
    }

    /// Next sample, or `None` once a buffer is exhausted
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn next_sample(&mut self, time: f64, sample_rate: f64) -> Option<f32> {
        match self {
            Self::Sine(osc) => Some(osc.next_sample(time, sample_rate)),
            Self::Noise {
                samples,
                position,
                filter,
            } => {
                if samples.is_empty() {
                    return Some(0.0);
                }
                let raw = samples[*position];
                *position = (*position + 1) % samples.len();
                Some(filter.as_mut().map_or(raw, |f| f.process(raw, time, sample_rate)))
            }
            Self::Buffer { buffer, position } => {
                let data = buffer.channel(0);
                let index = position.floor() as usize;
                if index >= data.len() {
                    return None;
                }
                let frac = (*position - position.floor()) as f32;
                let next = data.get(index + 1).copied().unwrap_or(data[index]);
                *position += f64::from(buffer.sample_rate()) / sample_rate;
                Some(data[index] + (next - data[index]) * frac)
            }
        }
    }
}

struct Voice {
    id: VoiceId,
    source: Source,
    gain: Param,
    start: f64,
    stop: Option<f64>,
    on_end: Option<Arc<watch::Sender<PlaybackState>>>,
}

/// Mixes scheduled voices through a master gain
pub struct Mixer {
    sample_rate: u32,
    frame: u64,
    master: Param,
    voices: Vec<Voice>,
    next_id: u64,
}

impl Mixer {
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frame: 0,
            master: Param::new(1.0),
            voices: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Seconds rendered so far
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / f64::from(self.sample_rate)
    }

    pub fn master_gain_mut(&mut self) -> &mut Param {
        &mut self.master
    }

    #[must_use]
    pub const fn master_gain(&self) -> &Param {
        &self.master
    }

    /// Schedule a voice starting at `start` seconds
    pub fn add_voice(&mut self, source: Source, gain: Param, start: f64) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.push(Voice {
            id,
            source,
            gain,
            start,
            stop: None,
            on_end: None,
        });
        id
    }

    /// Publish `Finished` to `sender` when the voice ends on its own
    pub fn notify_on_end(&mut self, id: VoiceId, sender: Arc<watch::Sender<PlaybackState>>) {
        if let Some(voice) = self.voice_mut(id) {
            voice.on_end = Some(sender);
        }
    }

    /// Gain automation of a live voice
    pub fn voice_gain_mut(&mut self, id: VoiceId) -> Option<&mut Param> {
        self.voice_mut(id).map(|v| &mut v.gain)
    }

    /// Schedule a voice to stop at `time`; earlier stops win
    pub fn stop_voice_at(&mut self, id: VoiceId, time: f64) {
        if let Some(voice) = self.voice_mut(id) {
            voice.stop = Some(voice.stop.map_or(time, |t| t.min(time)));
        }
    }

    /// Drop a voice immediately without notifying; returns whether it was live
    pub fn remove_voice(&mut self, id: VoiceId) -> bool {
        let before = self.voices.len();
        self.voices.retain(|v| v.id != id);
        self.voices.len() != before
    }

    #[must_use]
    pub fn is_active(&self, id: VoiceId) -> bool {
        self.voices.iter().any(|v| v.id == id)
    }

    /// Number of live voices
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.id == id)
    }

    /// Fill an interleaved output block and advance the clock
    #[allow(clippy::cast_precision_loss)]
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let sample_rate = f64::from(self.sample_rate);
        let mut ended: Vec<VoiceId> = Vec::new();

        for frame in out.chunks_mut(channels) {
            let time = self.frame as f64 / sample_rate;
            let mut mix = 0.0_f32;

            for voice in &mut self.voices {
                if time < voice.start || ended.contains(&voice.id) {
                    continue;
                }
                if voice.stop.is_some_and(|stop| time >= stop) {
                    ended.push(voice.id);
                    continue;
                }
                match voice.source.next_sample(time, sample_rate) {
                    Some(sample) => mix += sample * voice.gain.value_at(time),
                    None => ended.push(voice.id),
                }
            }

            let sample = (mix * self.master.value_at(time)).clamp(-1.0, 1.0);
            frame.fill(sample);
            self.frame += 1;
        }

        if !ended.is_empty() {
            self.voices.retain(|voice| {
                if !ended.contains(&voice.id) {
                    return true;
                }
                if let Some(sender) = &voice.on_end {
                    sender.send_if_modified(|state| {
                        let playing = *state == PlaybackState::Playing;
                        if playing {
                            *state = PlaybackState::Finished;
                        }
                        playing
                    });
                }
                false
            });
        }

        let now = self.current_time();
        self.master.prune_before(now);
    }

    /// Render `seconds` of audio into a scratch buffer
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn advance(&mut self, seconds: f64) -> Vec<f32> {
        let frames = (seconds * f64::from(self.sample_rate)).round() as usize;
        let mut out = vec![0.0; frames];
        self.render(&mut out, 1);
        out
    }
}
