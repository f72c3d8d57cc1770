//! Cue tones, mute and narration playback

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::mixer::{self, Mixer, PlaybackState, SharedMixer, Source, VoiceId};
use super::output::{AudioOutput, CpalOutput, NullOutput};
use super::pcm::decode_speech;
use super::synth::{BandPass, Param, SineOscillator, white_noise};
use crate::genai::SpeechSynthesizer;
use crate::{Error, Result};

const MUTE_RAMP_SECONDS: f64 = 0.1;

const FOCUS_FREQUENCY: f32 = 80.0;
const FOCUS_GAIN: f32 = 0.05;
const FOCUS_FADE_SECONDS: f64 = 0.5;

const LOADING_FREQUENCY: f32 = 60.0;
const LOADING_GAIN: f32 = 0.08;
const LOADING_FADE_IN_SECONDS: f64 = 2.0;
const LOADING_STOP_DELAY_SECONDS: f64 = 1.0;

const ACTIVATION_TONE: f32 = 880.0;
const ACTIVATION_FILTER_START: f32 = 800.0;
const ACTIVATION_FILTER_END: f32 = 4000.0;
const ACTIVATION_GAIN: f32 = 0.3;
const ACTIVATION_DECAY_SECONDS: f64 = 0.4;
const ACTIVATION_STOP_SECONDS: f64 = 0.5;

struct ActiveSpeech {
    voice: VoiceId,
    state: Arc<watch::Sender<PlaybackState>>,
}

#[derive(Default)]
struct ServiceState {
    mixer: Option<SharedMixer>,
    muted: bool,
    speech: Option<ActiveSpeech>,
    speech_generation: u64,
    input_focus: Option<VoiceId>,
    loading: Option<VoiceId>,
}

impl ServiceState {
    /// Mixer, unless uninitialized or muted
    fn audible_mixer(&self) -> Option<SharedMixer> {
        if self.muted {
            return None;
        }
        self.mixer.clone()
    }

    fn stop_speech(&mut self) {
        self.speech_generation += 1;
        let Some(speech) = self.speech.take() else {
            return;
        };

        speech.state.send_if_modified(|state| {
            let playing = *state == PlaybackState::Playing;
            if playing {
                *state = PlaybackState::Stopped;
            }
            playing
        });
        if let Some(mixer) = &self.mixer {
            mixer::lock(mixer).remove_voice(speech.voice);
        }
        tracing::debug!("speech stopped");
    }

    fn stop_input_focus(&mut self) {
        let Some(voice) = self.input_focus.take() else {
            return;
        };
        let Some(mixer) = &self.mixer else {
            return;
        };

        let mut mixer = mixer::lock(mixer);
        let now = mixer.current_time();
        if let Some(gain) = mixer.voice_gain_mut(voice) {
            gain.cancel_and_hold_at_time(now);
            gain.linear_ramp_to_value_at_time(0.0, now + FOCUS_FADE_SECONDS);
        }
        mixer.stop_voice_at(voice, now + FOCUS_FADE_SECONDS);
    }

    fn stop_loading(&mut self) {
        let Some(voice) = self.loading.take() else {
            return;
        };
        if let Some(mixer) = &self.mixer {
            let mut mixer = mixer::lock(mixer);
            let now = mixer.current_time();
            mixer.stop_voice_at(voice, now + LOADING_STOP_DELAY_SECONDS);
        }
    }
}

/// Add a sine voice that fades in from silence to `level` over `fade` seconds
fn start_drone(mixer: &mut Mixer, frequency: f32, level: f32, fade: f64) -> VoiceId {
    let now = mixer.current_time();
    let mut gain = Param::new(0.0);
    gain.set_value_at_time(0.0, now);
    gain.linear_ramp_to_value_at_time(level, now + fade);
    mixer.add_voice(Source::Sine(SineOscillator::new(frequency)), gain, now)
}

/// Local sound for the reading flow
///
/// Share it behind an `Arc`. Every method is synchronous except
/// [`AudioService::speak_text`], and the internal lock is never held across
/// an await point.
pub struct AudioService {
    output: Mutex<Box<dyn AudioOutput>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    state: Mutex<ServiceState>,
}

impl AudioService {
    /// Create a service; the output is opened on [`AudioService::initialize`]
    pub fn new(
        output: Box<dyn AudioOutput>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            output: Mutex::new(output),
            synthesizer,
            state: Mutex::new(ServiceState::default()),
        }
    }

    /// Service on the default output device, or one that never opens when disabled
    pub fn local(enabled: bool, synthesizer: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        let output: Box<dyn AudioOutput> = if enabled {
            Box::new(CpalOutput::new())
        } else {
            Box::new(NullOutput::unavailable())
        };
        Self::new(output, synthesizer)
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the output device if not already open
    ///
    /// Failure is logged and leaves the service uninitialized; later calls retry.
    pub fn initialize(&self) {
        let mut state = self.lock_state();
        if state.mixer.is_some() {
            return;
        }

        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        match output.open() {
            Ok(shared) => {
                if state.muted {
                    let mut mixer = mixer::lock(&shared);
                    let now = mixer.current_time();
                    mixer.master_gain_mut().set_value_at_time(0.0, now);
                }
                tracing::info!(backend = output.name(), "audio initialized");
                state.mixer = Some(shared);
            }
            Err(e) => {
                tracing::warn!(backend = output.name(), error = %e, "audio output unavailable");
            }
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock_state().mixer.is_some()
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.lock_state().muted
    }

    /// The live mixer, if initialized
    #[must_use]
    pub fn mixer(&self) -> Option<SharedMixer> {
        self.lock_state().mixer.clone()
    }

    /// Flip mute and return the new state
    ///
    /// Muting also stops speech and both drones.
    pub fn toggle_mute(&self) -> bool {
        let mut state = self.lock_state();
        state.muted = !state.muted;
        let muted = state.muted;

        if let Some(shared) = &state.mixer {
            let mut mixer = mixer::lock(shared);
            let now = mixer.current_time();
            let gain = mixer.master_gain_mut();
            gain.cancel_and_hold_at_time(now);
            gain.linear_ramp_to_value_at_time(
                if muted { 0.0 } else { 1.0 },
                now + MUTE_RAMP_SECONDS,
            );
        }

        if muted {
            state.stop_speech();
            state.stop_input_focus();
            state.stop_loading();
        }

        tracing::debug!(muted, "mute toggled");
        muted
    }

    /// Short shimmer played when a reading appears
    pub fn play_activation_complete(&self) {
        let Some(shared) = self.lock_state().audible_mixer() else {
            return;
        };
        let mut mixer = mixer::lock(&shared);
        let now = mixer.current_time();

        let mut gain = Param::new(ACTIVATION_GAIN);
        gain.set_value_at_time(ACTIVATION_GAIN, now);
        gain.exponential_ramp_to_value_at_time(0.001, now + ACTIVATION_DECAY_SECONDS);

        let mut filter = BandPass::new(ACTIVATION_FILTER_START, 1.0);
        filter
            .frequency_mut()
            .set_value_at_time(ACTIVATION_FILTER_START, now);
        filter
            .frequency_mut()
            .exponential_ramp_to_value_at_time(ACTIVATION_FILTER_END, now + ACTIVATION_DECAY_SECONDS);

        let noise_frames = mixer.sample_rate() as usize;
        let noise = mixer.add_voice(
            Source::noise(white_noise(noise_frames), Some(filter)),
            gain.clone(),
            now,
        );
        let tone = mixer.add_voice(
            Source::Sine(SineOscillator::new(ACTIVATION_TONE)),
            gain,
            now,
        );
        mixer.stop_voice_at(noise, now + ACTIVATION_STOP_SECONDS);
        mixer.stop_voice_at(tone, now + ACTIVATION_STOP_SECONDS);
    }

    /// Low hum while an input has focus
    pub fn start_input_focus_sound(&self) {
        let mut state = self.lock_state();
        if state.input_focus.is_some() {
            return;
        }
        let Some(shared) = state.audible_mixer() else {
            return;
        };
        let voice = start_drone(
            &mut mixer::lock(&shared),
            FOCUS_FREQUENCY,
            FOCUS_GAIN,
            FOCUS_FADE_SECONDS,
        );
        state.input_focus = Some(voice);
    }

    pub fn stop_input_focus_sound(&self) {
        self.lock_state().stop_input_focus();
    }

    /// Deep drone while a reading is generated
    ///
    /// Prefer [`AudioService::loading_tone`], which stops on drop.
    pub fn start_loading_loop(&self) {
        let mut state = self.lock_state();
        if state.loading.is_some() {
            return;
        }
        let Some(shared) = state.audible_mixer() else {
            return;
        };
        let voice = start_drone(
            &mut mixer::lock(&shared),
            LOADING_FREQUENCY,
            LOADING_GAIN,
            LOADING_FADE_IN_SECONDS,
        );
        state.loading = Some(voice);
    }

    pub fn stop_loading_loop(&self) {
        self.lock_state().stop_loading();
    }

    /// Start the loading drone, stopping it when the guard drops
    #[must_use]
    pub fn loading_tone(self: &Arc<Self>) -> LoadingTone {
        self.start_loading_loop();
        LoadingTone {
            service: Arc::clone(self),
        }
    }

    /// Stop narration; safe to call when nothing is playing
    pub fn stop_current_speech(&self) {
        self.lock_state().stop_speech();
    }

    /// Whether narration is currently audible
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.lock_state()
            .speech
            .as_ref()
            .is_some_and(|s| *s.state.borrow() == PlaybackState::Playing)
    }

    /// Narrate `text`, replacing any current narration
    ///
    /// # Errors
    ///
    /// - `Error::Muted` if muted before the request or while it was in flight
    /// - `Error::SpeechSuperseded` if another request or a stop happened meanwhile
    /// - `Error::Audio` if no output is available
    /// - `Error::Speech` / `Error::Decode` if synthesis or decoding fails
    pub async fn speak_text(&self, text: &str) -> Result<SpeechHandle> {
        let generation = {
            let mut state = self.lock_state();
            if state.muted {
                return Err(Error::Muted);
            }
            state.stop_speech();
            state.speech_generation
        };

        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| Error::Config("no speech synthesizer configured".to_string()))?;

        self.initialize();
        if !self.is_initialized() {
            return Err(Error::Audio("no audio output available".to_string()));
        }

        let payload = synthesizer.synthesize(text).await?;
        let buffer = decode_speech(&payload)?;
        let duration = buffer.duration();

        let mut state = self.lock_state();
        if state.muted {
            return Err(Error::Muted);
        }
        if state.speech_generation != generation {
            tracing::debug!(generation, "discarding superseded speech");
            return Err(Error::SpeechSuperseded);
        }
        let shared = state
            .mixer
            .clone()
            .ok_or_else(|| Error::Audio("audio output closed".to_string()))?;

        let (sender, receiver) = watch::channel(PlaybackState::Playing);
        let sender = Arc::new(sender);
        let voice = {
            let mut mixer = mixer::lock(&shared);
            let now = mixer.current_time();
            let voice = mixer.add_voice(Source::buffer(Arc::new(buffer)), Param::new(1.0), now);
            mixer.notify_on_end(voice, Arc::clone(&sender));
            voice
        };
        state.speech = Some(ActiveSpeech {
            voice,
            state: sender,
        });

        tracing::debug!(duration_ms = duration.as_millis(), "speech started");
        Ok(SpeechHandle { state: receiver })
    }
}

/// Observes one narration
#[derive(Debug, Clone)]
pub struct SpeechHandle {
    state: watch::Receiver<PlaybackState>,
}

impl SpeechHandle {
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Wait until playback ends, returning how it ended
    pub async fn finished(&mut self) -> PlaybackState {
        match self.state.wait_for(|s| *s != PlaybackState::Playing).await {
            Ok(state) => *state,
            // Sender gone without a final state: the service went away
            Err(_) => PlaybackState::Stopped,
        }
    }
}

/// Keeps the loading drone running until dropped
pub struct LoadingTone {
    service: Arc<AudioService>,
}

impl Drop for LoadingTone {
    fn drop(&mut self) {
        self.service.stop_loading_loop();
    }
}
