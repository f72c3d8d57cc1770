//! Interactive terminal reading (`moonspell reading`)
//!
//! Prompts block on terminal input, so they run on the blocking pool while
//! the runtime keeps driving the status ticker and the background sigil.

use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::{Input, Select};

use crate::Config;
use crate::audio::AudioService;
use crate::genai::{GeminiClient, SpeechSynthesizer};
use crate::moon;
use crate::prompt::{PromptAssembler, ReadingForm, ZodiacSign};
use crate::reading::{Section, Spell};
use crate::session::{ReadingSession, SigilState};
use crate::share;

enum MenuChoice {
    Speak(Section),
    ToggleMute,
    Sigil,
    SaveSigil,
    ShareText,
    Again,
    Quit,
}

/// Run the three-screen reading flow in the terminal
///
/// # Errors
///
/// Returns error if the client cannot be configured or terminal input fails
pub async fn run_reading(config: &Config) -> anyhow::Result<()> {
    let client = Arc::new(GeminiClient::new(&config.genai)?);
    let synthesizer: Arc<dyn SpeechSynthesizer> = client.clone();
    let audio = Arc::new(AudioService::local(config.audio.enabled, Some(synthesizer)));
    let mut session = ReadingSession::new(
        audio,
        client.clone(),
        client,
        PromptAssembler::new(config.reading_format),
    );

    let phase = moon::moon_phase_now();
    println!("{phase}: {}\n", phase.description());
    println!("Ontvang jouw kosmische reading van Nikita\n");

    loop {
        if let Some(error) = session.last_error() {
            println!("\n{error}\n");
        }

        let form = ask_form(session.audio()).await?;
        let printer = spawn_status_printer(&session);
        let result = session.submit(&form).await;
        printer.abort();

        let Ok(spell) = result else {
            continue;
        };

        print_spell(&form.name, &spell);
        println!("De kosmos creëert jouw persoonlijke zegel...\n");
        if !result_menu(&mut session).await? {
            break;
        }
        session.reset();
    }

    Ok(())
}

/// Run a terminal prompt on the blocking pool
async fn prompt<T, F>(interact: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, dialoguer::Error> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(interact).await??)
}

/// Prompt with the focus hum playing
async fn ask(audio: &AudioService, label: &'static str) -> anyhow::Result<String> {
    audio.start_input_focus_sound();
    let value = prompt(move || {
        Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
    })
    .await;
    audio.stop_input_focus_sound();
    value
}

async fn ask_form(audio: &AudioService) -> anyhow::Result<ReadingForm> {
    // Focus is the first gesture on a terminal
    audio.initialize();

    let name = ask(audio, "Jouw naam").await?;
    let birth_date = ask(audio, "Geboortedatum (JJJJ-MM-DD)").await?;

    let signs: Vec<&'static str> = ZodiacSign::ALL.iter().map(|s| s.name()).collect();
    audio.start_input_focus_sound();
    let picked = prompt({
        let signs = signs.clone();
        move || {
            Select::new()
                .with_prompt("Kies je sterrenbeeld")
                .items(&signs)
                .default(0)
                .interact()
        }
    })
    .await;
    audio.stop_input_focus_sound();
    let zodiac_sign = signs[picked?].to_string();

    let wish = ask(audio, "Wat is je wens?").await?;

    Ok(ReadingForm {
        name,
        birth_date,
        zodiac_sign,
        wish,
    })
}

fn spawn_status_printer(session: &ReadingSession) -> tokio::task::JoinHandle<()> {
    let mut status = session.subscribe_status();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if let Some(message) = status.borrow_and_update().clone() {
                println!("  {message}");
            }
        }
    })
}

fn print_spell(name: &str, spell: &Spell) {
    let name = if name.trim().is_empty() { "ziel" } else { name.trim() };
    println!(
        "\nLieve {name}, hier is de leiding die de kosmos voor jou heeft. Gebruik deze inzichten om je eigen magie te creëren:\n"
    );
    for section in Section::ALL {
        println!("## {}\n{}\n", section.title(), spell.section(section));
    }
}

fn menu_choices(session: &ReadingSession) -> Vec<(String, MenuChoice)> {
    let mut choices: Vec<(String, MenuChoice)> = Section::ALL
        .iter()
        .map(|&section| {
            let label = if session.speaking() == Some(section) {
                format!("Stop met voorlezen: {}", section.title())
            } else {
                format!("Lees voor: {}", section.title())
            };
            (label, MenuChoice::Speak(section))
        })
        .collect();

    let mute_label = if session.audio().is_muted() {
        "Geluid aan"
    } else {
        "Geluid uit"
    };
    choices.push((mute_label.to_string(), MenuChoice::ToggleMute));

    let sigil_choice = match session.sigil() {
        SigilState::Generated(_) => ("Bewaar zegel", MenuChoice::SaveSigil),
        SigilState::Generating => ("Wacht op je zegel", MenuChoice::Sigil),
        SigilState::Error(_) => ("Probeer de zegel opnieuw", MenuChoice::Sigil),
        SigilState::Idle => ("Maak persoonlijke zegel", MenuChoice::Sigil),
    };
    choices.push((sigil_choice.0.to_string(), sigil_choice.1));

    choices.push(("Kopieer tekst".to_string(), MenuChoice::ShareText));
    choices.push(("Nieuwe reading".to_string(), MenuChoice::Again));
    choices.push(("Stoppen".to_string(), MenuChoice::Quit));
    choices
}

/// Result screen; returns `true` to start over
async fn result_menu(session: &mut ReadingSession) -> anyhow::Result<bool> {
    loop {
        let mut choices = menu_choices(session);
        let labels: Vec<String> = choices.iter().map(|(l, _)| l.clone()).collect();
        let index = prompt(move || Select::new().items(&labels).default(0).interact()).await?;

        match choices.swap_remove(index).1 {
            MenuChoice::Speak(section) => {
                session.speak_section(section).await;
            }
            MenuChoice::ToggleMute => {
                session.toggle_mute();
            }
            MenuChoice::Sigil => match session.generate_sigil().await {
                SigilState::Error(message) => println!("{message}"),
                SigilState::Generated(_) => println!("Jouw persoonlijke zegel is klaar."),
                SigilState::Idle | SigilState::Generating => {}
            },
            MenuChoice::SaveSigil => {
                if let SigilState::Generated(image) = session.sigil() {
                    let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                    let path = share::save_sigil(&dir, &image.data)?;
                    println!("Zegel bewaard in {}", path.display());
                }
            }
            MenuChoice::ShareText => {
                if let Some(spell) = session.spell() {
                    println!("\n{}\n", share::share_text(spell));
                }
            }
            MenuChoice::Again => return Ok(true),
            MenuChoice::Quit => return Ok(false),
        }
    }
}
