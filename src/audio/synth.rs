//! Signal primitives for the cue tones
//!
//! `Param` follows Web Audio automation semantics: values hold between
//! events, ramps start from the previous event's time and value.

use std::f64::consts::TAU;
use std::sync::Arc;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ramp {
    Set,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Event {
    time: f64,
    value: f32,
    ramp: Ramp,
}

/// An automatable parameter (gain, frequency)
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    default: f32,
    events: Vec<Event>,
}

impl Param {
    #[must_use]
    pub const fn new(default: f32) -> Self {
        Self {
            default,
            events: Vec::new(),
        }
    }

    fn insert(&mut self, event: Event) {
        let at = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(at, event);
    }

    /// Jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Event {
            time,
            value,
            ramp: Ramp::Set,
        });
    }

    /// Ramp linearly from the previous event to `value`, reaching it at `time`
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Event {
            time,
            value,
            ramp: Ramp::Linear,
        });
    }

    /// Ramp exponentially from the previous event to `value`, reaching it at `time`
    ///
    /// Both ends must be non-zero and share a sign, otherwise the previous
    /// value holds until `time`.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Event {
            time,
            value,
            ramp: Ramp::Exponential,
        });
    }

    /// Freeze the current trajectory at `time` and drop everything after it
    pub fn cancel_and_hold_at_time(&mut self, time: f64) {
        let value = self.value_at(time);
        self.events.retain(|e| e.time <= time);
        self.set_value_at_time(value, time);
    }

    /// Forget events that no longer affect values at or after `time`
    pub fn prune_before(&mut self, time: f64) {
        let past = self.events.partition_point(|e| e.time <= time);
        if past > 1 {
            self.events.drain(..past - 1);
        }
    }

    /// Value at `time` in seconds
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn value_at(&self, time: f64) -> f32 {
        let mut anchor_time = 0.0;
        let mut anchor_value = self.default;

        for event in &self.events {
            if event.time <= time {
                anchor_time = event.time;
                anchor_value = event.value;
                continue;
            }

            let span = event.time - anchor_time;
            if span <= 0.0 {
                return anchor_value;
            }
            let progress = (time - anchor_time) / span;

            return match event.ramp {
                Ramp::Set => anchor_value,
                Ramp::Linear => {
                    anchor_value + (event.value - anchor_value) * progress as f32
                }
                Ramp::Exponential => {
                    let (v0, v1) = (f64::from(anchor_value), f64::from(event.value));
                    if v0 == 0.0 || v1 == 0.0 || v0.signum() != v1.signum() {
                        anchor_value
                    } else {
                        (v0 * (v1 / v0).powf(progress)) as f32
                    }
                }
            };
        }

        anchor_value
    }
}

/// Sine oscillator with automatable frequency
#[derive(Debug, Clone)]
pub struct SineOscillator {
    frequency: Param,
    phase: f64,
}

impl SineOscillator {
    #[must_use]
    pub const fn new(frequency: f32) -> Self {
        Self {
            frequency: Param::new(frequency),
            phase: 0.0,
        }
    }

    pub fn frequency_mut(&mut self) -> &mut Param {
        &mut self.frequency
    }

    /// Next sample at `time`, advancing the phase by one frame
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_sample(&mut self, time: f64, sample_rate: f64) -> f32 {
        let sample = self.phase.sin() as f32;
        self.phase = (self.phase + TAU * f64::from(self.frequency.value_at(time)) / sample_rate)
            .rem_euclid(TAU);
        sample
    }
}

/// Band-pass biquad (RBJ cookbook, constant 0 dB peak)
#[derive(Debug, Clone)]
pub struct BandPass {
    frequency: Param,
    q: f32,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BandPass {
    #[must_use]
    pub const fn new(frequency: f32, q: f32) -> Self {
        Self {
            frequency: Param::new(frequency),
            q,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn frequency_mut(&mut self) -> &mut Param {
        &mut self.frequency
    }

    /// Filter one sample at `time`
    #[allow(clippy::cast_possible_truncation)]
    pub fn process(&mut self, input: f32, time: f64, sample_rate: f64) -> f32 {
        let nyquist = sample_rate / 2.0;
        let f0 = f64::from(self.frequency.value_at(time)).clamp(1.0, nyquist * 0.99);
        let w0 = TAU * f0 / sample_rate;
        let alpha = w0.sin() / (2.0 * f64::from(self.q.max(1e-4)));
        let cos_w0 = w0.cos();

        let a0 = 1.0 + alpha;
        let b0 = alpha / a0;
        let b2 = -alpha / a0;
        let a1 = -2.0 * cos_w0 / a0;
        let a2 = (1.0 - alpha) / a0;

        let x0 = f64::from(input);
        let y0 = b0 * x0 + b2 * self.x2 - a1 * self.y1 - a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;

        y0 as f32
    }
}

/// One channel of uniform white noise in `[-1, 1)`
#[must_use]
pub fn white_noise(frames: usize) -> Arc<[f32]> {
    let mut rng = rand::thread_rng();
    (0..frames).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn holds_default_without_events() {
        let p = Param::new(0.7);
        assert!(close(p.value_at(0.0), 0.7));
        assert!(close(p.value_at(100.0), 0.7));
    }

    #[test]
    fn linear_ramp_from_set() {
        let mut p = Param::new(1.0);
        p.set_value_at_time(0.0, 1.0);
        p.linear_ramp_to_value_at_time(0.05, 1.5);

        assert!(close(p.value_at(0.5), 1.0));
        assert!(close(p.value_at(1.0), 0.0));
        assert!(close(p.value_at(1.25), 0.025));
        assert!(close(p.value_at(2.0), 0.05));
    }

    #[test]
    fn exponential_ramp() {
        let mut p = Param::new(0.0);
        p.set_value_at_time(800.0, 0.0);
        p.exponential_ramp_to_value_at_time(4000.0, 0.4);

        assert!(close(p.value_at(0.0), 800.0));
        // geometric midpoint
        assert!((p.value_at(0.2) - (800.0_f32 * 4000.0).sqrt()).abs() < 0.01);
        assert!(close(p.value_at(0.4), 4000.0));
    }

    #[test]
    fn exponential_ramp_to_zero_holds() {
        let mut p = Param::new(0.0);
        p.set_value_at_time(0.3, 0.0);
        p.exponential_ramp_to_value_at_time(0.0, 1.0);
        assert!(close(p.value_at(0.5), 0.3));
        assert!(close(p.value_at(1.0), 0.0));
    }

    #[test]
    fn cancel_and_hold_restarts_ramp() {
        let mut p = Param::new(1.0);
        p.set_value_at_time(1.0, 0.0);
        p.linear_ramp_to_value_at_time(0.0, 1.0);
        p.cancel_and_hold_at_time(0.5);
        p.linear_ramp_to_value_at_time(1.0, 0.6);

        assert!(close(p.value_at(0.5), 0.5));
        assert!(close(p.value_at(0.55), 0.75));
        assert!(close(p.value_at(5.0), 1.0));
    }

    #[test]
    fn prune_keeps_current_value() {
        let mut p = Param::new(0.0);
        p.set_value_at_time(0.2, 0.0);
        p.linear_ramp_to_value_at_time(0.4, 1.0);
        p.linear_ramp_to_value_at_time(0.8, 2.0);
        let before = p.value_at(1.5);
        p.prune_before(1.2);
        assert!(close(p.value_at(1.5), before));
    }

    #[test]
    fn sine_has_expected_period() {
        let mut osc = SineOscillator::new(6000.0);
        let samples: Vec<f32> = (0..8).map(|_| osc.next_sample(0.0, 24000.0)).collect();
        // quarter-period steps: 0, 1, 0, -1
        assert!(close(samples[0], 0.0));
        assert!(close(samples[1], 1.0));
        assert!(close(samples[2], 0.0));
        assert!(close(samples[3], -1.0));
        assert!(close(samples[4], 0.0));
    }

    #[test]
    fn band_pass_rejects_dc() {
        let mut filter = BandPass::new(800.0, 1.0);
        let mut last = 1.0;
        for _ in 0..24000 {
            last = filter.process(1.0, 0.0, 24000.0);
        }
        assert!(last.abs() < 1e-3);
    }

    #[test]
    fn noise_in_range() {
        let noise = white_noise(1000);
        assert_eq!(noise.len(), 1000);
        assert!(noise.iter().all(|s| (-1.0..1.0).contains(s)));
    }
}
