use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use moonspell::api::{ApiServerBuilder, ApiState};
use moonspell::audio::AudioService;
use moonspell::{Config, GeminiClient, PromptAssembler, SpeechSynthesizer};

/// Moonspell - personalized moon-phase readings
#[derive(Parser)]
#[command(name = "moonspell", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show the moon phase
    Moon {
        /// Date as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Compute a life-path number
    LifePath {
        /// Birth date as YYYY-MM-DD
        date: String,
    },
    /// Interactive reading in the terminal
    Reading,
    /// Test speaker output with the cue tones
    TestSpeaker,
    /// Narrate text
    Speak {
        /// Text to speak
        #[arg(default_value = "De sterren staan gunstig voor jou.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,moonspell=info",
        1 => "info,moonspell=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve { port } => serve(port).await,
        Command::Moon { date } => show_moon(date.as_deref()),
        Command::LifePath { date } => {
            println!("{}", moonspell::life_path_number(&date));
            Ok(())
        }
        Command::Reading => {
            let config = Config::load()?;
            moonspell::interactive::run_reading(&config).await
        }
        Command::TestSpeaker => test_speaker().await,
        Command::Speak { text } => speak(&text).await,
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let port = port.unwrap_or(config.server.port);

    let client = Arc::new(GeminiClient::new(&config.genai)?);
    let state = ApiState::from_client(client, PromptAssembler::new(config.reading_format));

    tracing::info!(
        port,
        text_model = %config.genai.text_model,
        format = ?config.reading_format,
        "starting moonspell API"
    );

    ApiServerBuilder::new(state, port)
        .static_dir(config.server.static_dir)
        .build()
        .run()
        .await?;

    Ok(())
}

fn show_moon(date: Option<&str>) -> anyhow::Result<()> {
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid date {raw}: {e}"))?,
        None => Utc::now().date_naive(),
    };

    let phase = moonspell::moon_phase(date);
    println!("{date}: {phase}");
    println!("  {}", phase.description());
    println!("  {}", phase.full_description());
    Ok(())
}

/// Play the cue tones on the default output device
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a short shimmer, then a low hum for 2 seconds\n");

    let audio = AudioService::local(true, None);
    audio.initialize();
    if !audio.is_initialized() {
        anyhow::bail!("no audio output available");
    }

    audio.play_activation_complete();
    tokio::time::sleep(Duration::from_secs(1)).await;

    audio.start_input_focus_sound();
    tokio::time::sleep(Duration::from_secs(2)).await;
    audio.stop_input_focus_sound();
    tokio::time::sleep(Duration::from_millis(600)).await;

    println!("\n---");
    println!("If you heard both sounds, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Narrate text through the local audio service
async fn speak(text: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client: Arc<dyn SpeechSynthesizer> = Arc::new(GeminiClient::new(&config.genai)?);
    let audio = AudioService::local(config.audio.enabled, Some(client));

    println!("Speaking: \"{text}\"");
    let mut handle = audio.speak_text(text).await?;
    let state = handle.finished().await;
    tracing::debug!(?state, "speech ended");

    Ok(())
}
