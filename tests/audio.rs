//! Audio service integration tests
//!
//! Runs on a null output and advances the mixer by hand

use std::sync::Arc;
use std::time::Duration;

use moonspell::Error;
use moonspell::SpeechSynthesizer;
use moonspell::audio::{AudioService, NullOutput, PlaybackState};

mod common;
use common::{MockSynthesizer, active_voices, advance, null_audio};

#[test]
fn test_focus_tone_is_single_instance() {
    let audio = null_audio(None);

    audio.start_input_focus_sound();
    audio.start_input_focus_sound();
    assert_eq!(active_voices(&audio), 1);

    audio.stop_input_focus_sound();
    audio.stop_input_focus_sound();
    advance(&audio, 0.6);
    assert_eq!(active_voices(&audio), 0);
}

#[test]
fn test_loading_loop_is_single_instance() {
    let audio = null_audio(None);

    audio.start_loading_loop();
    audio.start_loading_loop();
    assert_eq!(active_voices(&audio), 1);

    audio.stop_loading_loop();
    advance(&audio, 0.5);
    assert_eq!(active_voices(&audio), 1, "loop keeps sounding for a second");
    advance(&audio, 0.6);
    assert_eq!(active_voices(&audio), 0);
}

#[test]
fn test_muting_stops_drones_and_blocks_cues() {
    let audio = null_audio(None);
    audio.start_input_focus_sound();
    audio.start_loading_loop();

    assert!(audio.toggle_mute());
    advance(&audio, 1.1);
    assert_eq!(active_voices(&audio), 0);

    audio.play_activation_complete();
    audio.start_input_focus_sound();
    assert_eq!(active_voices(&audio), 0);

    assert!(!audio.toggle_mute());
    audio.play_activation_complete();
    assert_eq!(active_voices(&audio), 2);
}

#[test]
fn test_mute_ramps_master_gain() {
    let audio = null_audio(None);
    audio.toggle_mute();

    let mixer = audio.mixer().unwrap();
    let mixer = moonspell::audio::mixer::lock(&mixer);
    let gain = mixer.master_gain();
    assert!((gain.value_at(0.0) - 1.0).abs() < 1e-6);
    assert!((gain.value_at(0.05) - 0.5).abs() < 1e-3);
    assert!(gain.value_at(0.1).abs() < 1e-6);
}

#[tokio::test]
async fn test_speech_plays_to_completion() {
    let synth = MockSynthesizer::with_frames(2400);
    let audio = null_audio(Some(synth.clone()));

    let mut handle = audio.speak_text("Hallo").await.unwrap();
    assert!(handle.is_playing());
    assert!(audio.is_speaking());

    advance(&audio, 0.2);
    assert_eq!(handle.finished().await, PlaybackState::Finished);
    assert!(!audio.is_speaking());
    assert_eq!(synth.call_count(), 1);
}

#[tokio::test]
async fn test_stop_publishes_stopped() {
    let audio = null_audio(Some(MockSynthesizer::with_frames(24000)));

    let mut handle = audio.speak_text("Hallo").await.unwrap();
    audio.stop_current_speech();
    audio.stop_current_speech();

    assert_eq!(handle.state(), PlaybackState::Stopped);
    assert_eq!(handle.finished().await, PlaybackState::Stopped);
    assert_eq!(active_voices(&audio), 0);
}

#[tokio::test]
async fn test_mute_stops_speech() {
    let audio = null_audio(Some(MockSynthesizer::with_frames(24000)));

    let handle = audio.speak_text("Hallo").await.unwrap();
    audio.toggle_mute();

    assert_eq!(handle.state(), PlaybackState::Stopped);
}

#[tokio::test]
async fn test_speech_rejected_when_muted() {
    let synth = MockSynthesizer::with_frames(2400);
    let audio = null_audio(Some(synth.clone()));
    audio.toggle_mute();

    assert!(matches!(audio.speak_text("Hallo").await, Err(Error::Muted)));
    assert_eq!(synth.call_count(), 0, "no request while muted");
}

#[tokio::test]
async fn test_new_speech_replaces_current() {
    let audio = null_audio(Some(MockSynthesizer::with_frames(24000)));

    let first = audio.speak_text("Een").await.unwrap();
    let second = audio.speak_text("Twee").await.unwrap();

    assert_eq!(first.state(), PlaybackState::Stopped);
    assert!(second.is_playing());
    assert_eq!(active_voices(&audio), 1);
}

#[tokio::test]
async fn test_last_speech_request_wins() {
    let audio = null_audio(Some(MockSynthesizer::delayed(
        2400,
        Duration::from_millis(40),
    )));

    let (first, second) = tokio::join!(audio.speak_text("Een"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        audio.speak_text("Twee").await
    });

    assert!(matches!(first, Err(Error::SpeechSuperseded)));
    assert!(second.unwrap().is_playing());
    assert_eq!(active_voices(&audio), 1);
}

#[tokio::test]
async fn test_stop_during_fetch_discards_result() {
    let audio = null_audio(Some(MockSynthesizer::delayed(
        2400,
        Duration::from_millis(40),
    )));

    let (result, ()) = tokio::join!(audio.speak_text("Een"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        audio.stop_current_speech();
    });

    assert!(matches!(result, Err(Error::SpeechSuperseded)));
    assert_eq!(active_voices(&audio), 0);
}

#[tokio::test]
async fn test_mute_during_fetch_fails_with_muted() {
    let audio = null_audio(Some(MockSynthesizer::delayed(
        2400,
        Duration::from_millis(40),
    )));

    let (result, muted) = tokio::join!(audio.speak_text("Een"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        audio.toggle_mute()
    });

    assert!(muted);
    assert!(matches!(result, Err(Error::Muted)));
    assert_eq!(active_voices(&audio), 0);
}

#[tokio::test]
async fn test_speech_without_output_is_audio_error() {
    let synth = MockSynthesizer::with_frames(2400);
    let audio = AudioService::new(Box::new(NullOutput::unavailable()), Some(synth.clone()));

    assert!(matches!(audio.speak_text("Hallo").await, Err(Error::Audio(_))));
    assert_eq!(synth.call_count(), 0);
}

#[tokio::test]
async fn test_synthesis_failure_propagates() {
    let audio = null_audio(Some(MockSynthesizer::failing()));
    assert!(matches!(audio.speak_text("Hallo").await, Err(Error::Speech(_))));
    assert!(!audio.is_speaking());
}

#[tokio::test]
async fn test_speak_initializes_lazily() {
    let synth: Arc<dyn SpeechSynthesizer> = MockSynthesizer::with_frames(2400);
    let audio = AudioService::new(Box::new(NullOutput::default()), Some(synth));
    assert!(!audio.is_initialized());

    audio.speak_text("Hallo").await.unwrap();
    assert!(audio.is_initialized());
}
