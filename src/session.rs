//! Reading flow: input, loading and result screens

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::audio::AudioService;
use crate::genai::{ReadingGenerator, SigilGenerator, SigilImage};
use crate::moon::{self, MoonPhase};
use crate::prompt::{PromptAssembler, ReadingForm, ReadingRequest};
use crate::reading::{Section, Spell, parse_reading};
use crate::{Error, Result};

/// Period of the rotating loading status
pub const STATUS_INTERVAL: Duration = Duration::from_millis(2500);

/// Which screen the flow is on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppState {
    #[default]
    InputWish,
    Loading,
    ShowingSpell,
}

/// Progress of the sigil for the current reading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SigilState {
    #[default]
    Idle,
    Generating,
    Generated(SigilImage),
    Error(String),
}

/// The four loading status messages, personalized where possible
#[must_use]
pub fn loading_messages(name: &str, zodiac_sign: &str) -> [String; 4] {
    let name = name.trim();
    let zodiac_sign = zodiac_sign.trim();

    [
        if name.is_empty() {
            "Nikita verbindt met de kosmos...".to_string()
        } else {
            format!("Nikita verbindt met jouw energie, {name}...")
        },
        if zodiac_sign.is_empty() {
            "De energie wordt gebundeld...".to_string()
        } else {
            format!("De unieke energie van {zodiac_sign} wordt gevoeld...")
        },
        "Je wens resoneert door het universum...".to_string(),
        "Een persoonlijke boodschap wordt voor jou gekanaliseerd...".to_string(),
    ]
}

/// Rotates the loading status until dropped
struct StatusTicker {
    task: JoinHandle<()>,
    status: watch::Sender<Option<String>>,
}

impl StatusTicker {
    fn start(status: &watch::Sender<Option<String>>, messages: [String; 4]) -> Self {
        let sender = status.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(STATUS_INTERVAL);
            for message in messages.iter().cycle() {
                interval.tick().await;
                sender.send_replace(Some(message.clone()));
            }
        });
        Self {
            task,
            status: status.clone(),
        }
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.task.abort();
        self.status.send_replace(None);
    }
}

/// Holds the flow on the loading screen; back to input if dropped there
struct LoadingScreen<'a> {
    state: &'a mut AppState,
}

impl<'a> LoadingScreen<'a> {
    fn enter(state: &'a mut AppState) -> Self {
        *state = AppState::Loading;
        Self { state }
    }
}

impl Drop for LoadingScreen<'_> {
    fn drop(&mut self) {
        if *self.state == AppState::Loading {
            *self.state = AppState::InputWish;
        }
    }
}

/// Generate a sigil and publish its progress
async fn draw_sigil(
    sigils: &dyn SigilGenerator,
    text: &str,
    state: &watch::Sender<SigilState>,
) -> SigilState {
    state.send_replace(SigilState::Generating);
    let next = match sigils.generate_sigil(text).await {
        Ok(image) => SigilState::Generated(image),
        Err(e) => {
            tracing::warn!(error = %e, "sigil generation failed");
            SigilState::Error(e.user_message())
        }
    };
    state.send_replace(next.clone());
    next
}

/// One person's path through the reading screens
pub struct ReadingSession {
    audio: Arc<AudioService>,
    generator: Arc<dyn ReadingGenerator>,
    sigils: Arc<dyn SigilGenerator>,
    assembler: PromptAssembler,
    state: AppState,
    request: Option<ReadingRequest>,
    moon_phase: Option<MoonPhase>,
    spell: Option<Spell>,
    last_error: Option<String>,
    sigil: Arc<watch::Sender<SigilState>>,
    sigil_task: Option<JoinHandle<()>>,
    speaking: Option<Section>,
    status: watch::Sender<Option<String>>,
}

impl ReadingSession {
    pub fn new(
        audio: Arc<AudioService>,
        generator: Arc<dyn ReadingGenerator>,
        sigils: Arc<dyn SigilGenerator>,
        assembler: PromptAssembler,
    ) -> Self {
        let (status, _) = watch::channel(None);
        Self {
            audio,
            generator,
            sigils,
            assembler,
            state: AppState::default(),
            request: None,
            moon_phase: None,
            spell: None,
            last_error: None,
            sigil: Arc::new(watch::channel(SigilState::Idle).0),
            sigil_task: None,
            speaking: None,
            status,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AppState {
        self.state
    }

    #[must_use]
    pub const fn spell(&self) -> Option<&Spell> {
        self.spell.as_ref()
    }

    /// Validated input of the last submission
    #[must_use]
    pub const fn request(&self) -> Option<&ReadingRequest> {
        self.request.as_ref()
    }

    /// Moon phase the current reading was made under
    #[must_use]
    pub const fn moon_phase(&self) -> Option<MoonPhase> {
        self.moon_phase
    }

    /// User-facing message of the last failed submission
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Sigil progress for the current reading
    #[must_use]
    pub fn sigil(&self) -> SigilState {
        self.sigil.borrow().clone()
    }

    /// Sigil updates for the current reading
    #[must_use]
    pub fn subscribe_sigil(&self) -> watch::Receiver<SigilState> {
        self.sigil.subscribe()
    }

    /// Section currently being narrated
    #[must_use]
    pub fn speaking(&self) -> Option<Section> {
        self.speaking.filter(|_| self.audio.is_speaking())
    }

    #[must_use]
    pub fn audio(&self) -> &Arc<AudioService> {
        &self.audio
    }

    /// Loading status updates; `None` outside of loading
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<Option<String>> {
        self.status.subscribe()
    }

    /// Validate the form and generate a reading
    ///
    /// On failure the flow returns to the input screen with
    /// [`ReadingSession::last_error`] set.
    ///
    /// # Errors
    ///
    /// Returns the validation, generation or parse error
    pub async fn submit(&mut self, form: &ReadingForm) -> Result<Spell> {
        // First user gesture
        self.audio.initialize();

        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                self.last_error = Some(e.user_message());
                return Err(e);
            }
        };

        self.last_error = None;
        self.clear_sigil();

        let result = {
            let _screen = LoadingScreen::enter(&mut self.state);
            let _tone = self.audio.loading_tone();
            let _ticker = StatusTicker::start(
                &self.status,
                loading_messages(request.name(), request.zodiac_sign().name()),
            );
            generate(&self.assembler, self.generator.as_ref(), &request).await
        };

        match result {
            Ok((spell, phase)) => {
                tracing::info!(phase = %phase, "reading ready");
                self.spell = Some(spell.clone());
                self.moon_phase = Some(phase);
                self.request = Some(request);
                self.speaking = None;
                self.state = AppState::ShowingSpell;
                self.audio.play_activation_complete();
                self.start_sigil(&spell);
                Ok(spell)
            }
            Err(e) => {
                tracing::warn!(error = %e, "reading failed");
                self.last_error = Some(e.user_message());
                self.state = AppState::InputWish;
                Err(e)
            }
        }
    }

    /// Draw the sigil in the background as the result screen opens
    fn start_sigil(&mut self, spell: &Spell) {
        let sigils = Arc::clone(&self.sigils);
        let state = Arc::clone(&self.sigil);
        let text = spell.full_text();
        state.send_replace(SigilState::Generating);
        self.sigil_task = Some(tokio::spawn(async move {
            draw_sigil(sigils.as_ref(), &text, &state).await;
        }));
    }

    /// Drop the sigil of the previous reading
    ///
    /// A fresh channel keeps a stale background draw from publishing here.
    fn clear_sigil(&mut self) {
        if let Some(task) = self.sigil_task.take() {
            task.abort();
        }
        self.sigil = Arc::new(watch::channel(SigilState::Idle).0);
    }

    /// Sigil for the current reading, drawing it again after a failure
    ///
    /// Waits for a background draw that is still running. A failure only
    /// affects [`ReadingSession::sigil`].
    pub async fn generate_sigil(&mut self) -> SigilState {
        let Some(spell) = &self.spell else {
            return self.sigil();
        };
        let text = spell.full_text();

        if let Some(task) = self.sigil_task.take() {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "background sigil draw ended early");
            }
        }

        match self.sigil() {
            SigilState::Generated(image) => SigilState::Generated(image),
            SigilState::Idle | SigilState::Generating | SigilState::Error(_) => {
                draw_sigil(self.sigils.as_ref(), &text, &self.sigil).await
            }
        }
    }

    /// Narrate a section, or stop it if it is the one being narrated
    ///
    /// Returns whether narration started. Failures are logged only.
    pub async fn speak_section(&mut self, section: Section) -> bool {
        let current = self.speaking();
        self.speaking = None;
        self.audio.stop_current_speech();
        if current == Some(section) {
            return false;
        }

        let Some(spell) = &self.spell else {
            return false;
        };
        let text = spell.section(section).to_string();

        match self.audio.speak_text(&text).await {
            Ok(_) => {
                self.speaking = Some(section);
                true
            }
            Err(e) => {
                tracing::warn!(section = ?section, error = %e, "could not speak section");
                false
            }
        }
    }

    /// Flip mute; narration stops when muting
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.audio.toggle_mute();
        if muted {
            self.speaking = None;
        }
        muted
    }

    /// Back to an empty input screen
    pub fn reset(&mut self) {
        self.audio.stop_current_speech();
        self.audio.stop_input_focus_sound();
        self.state = AppState::InputWish;
        self.request = None;
        self.moon_phase = None;
        self.spell = None;
        self.last_error = None;
        self.clear_sigil();
        self.speaking = None;
    }
}

impl Drop for ReadingSession {
    fn drop(&mut self) {
        if let Some(task) = self.sigil_task.take() {
            task.abort();
        }
    }
}

async fn generate(
    assembler: &PromptAssembler,
    generator: &dyn ReadingGenerator,
    request: &ReadingRequest,
) -> Result<(Spell, MoonPhase)> {
    let phase = moon::moon_phase_now();
    let prompt = assembler.assemble(request, phase);
    let text = generator.generate_reading(&prompt).await?;
    let spell = parse_reading(&text, prompt.format).ok_or_else(|| {
        Error::ReadingMalformed(format!("no sections found in {} chars", text.len()))
    })?;
    Ok((spell, phase))
}
