//! Audio output backends that drive the mixer

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::mixer::{self, Mixer, SharedMixer};
use crate::{Error, Result};

/// Preferred output sample rate (matches narration payloads)
pub const OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Something that can render a mixer to a sound device
pub trait AudioOutput: Send {
    /// Open the device and start pulling from a new mixer
    ///
    /// # Errors
    ///
    /// Returns error if no usable output is available
    fn open(&mut self) -> Result<SharedMixer>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Default output device via `cpal`
///
/// The stream lives on a dedicated thread, since `cpal` streams are not
/// `Send` on every platform.
#[derive(Default)]
pub struct CpalOutput {
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn select_config(device: &cpal::Device) -> Result<StreamConfig> {
    let rate = SampleRate(OUTPUT_SAMPLE_RATE);
    let supports = |c: &cpal::SupportedStreamConfigRange, channels: u16| {
        c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
    };

    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| supports(c, 1))
        .or_else(|| {
            // Fallback: try stereo
            device
                .supported_output_configs()
                .ok()?
                .find(|c| supports(c, 2))
        })
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

    Ok(supported.with_sample_rate(rate).config())
}

fn run_stream(
    ready: &mpsc::Sender<Result<SharedMixer>>,
    shutdown: &mpsc::Receiver<()>,
) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;
    let config = select_config(&device)?;
    let channels = usize::from(config.channels);

    let shared: SharedMixer = Arc::new(Mutex::new(Mixer::new(config.sample_rate.0)));
    let callback_mixer = Arc::clone(&shared);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                mixer::lock(&callback_mixer).render(data, channels);
            },
            |err| {
                tracing::error!(error = %err, "audio output error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    tracing::debug!(
        device = %device.name().unwrap_or_default(),
        sample_rate = config.sample_rate.0,
        channels,
        "audio output started"
    );

    // The receiver may be gone if open() already gave up; keep running anyway
    let _ = ready.send(Ok(shared));

    // Blocks until CpalOutput is dropped
    let _ = shutdown.recv();
    drop(stream);
    tracing::debug!("audio output stopped");
    Ok(())
}

impl AudioOutput for CpalOutput {
    fn open(&mut self) -> Result<SharedMixer> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("moonspell-audio".to_string())
            .spawn(move || {
                if let Err(e) = run_stream(&ready_tx, &shutdown_rx) {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| Error::Audio("audio thread exited before starting".to_string()))??;

        self.shutdown = Some(shutdown_tx);
        self.thread = Some(thread);
        Ok(mixer)
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        drop(self.shutdown.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Output that never plays; the mixer only advances when rendered by hand
///
/// Used on headless hosts and in tests.
pub struct NullOutput {
    sample_rate: u32,
    available: bool,
}

impl NullOutput {
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            available: true,
        }
    }

    /// An output whose `open` always fails
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            sample_rate: OUTPUT_SAMPLE_RATE,
            available: false,
        }
    }
}

impl Default for NullOutput {
    fn default() -> Self {
        Self::new(OUTPUT_SAMPLE_RATE)
    }
}

impl AudioOutput for NullOutput {
    fn open(&mut self) -> Result<SharedMixer> {
        if !self.available {
            return Err(Error::Audio("audio output disabled".to_string()));
        }
        Ok(Arc::new(Mutex::new(Mixer::new(self.sample_rate))))
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
