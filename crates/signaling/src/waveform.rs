//! Periodic waveform primitives
//!
//! Unit waveforms return a level in [0, 1] for time `t` (seconds) at
//! frequency `f`; callers map that level onto their own range.

use std::f64::consts::TAU;

use crate::template::{Tone, Waveform};

/// Fractional position within the current period
fn phase(frequency_hz: f64, t: f64) -> f64 {
    (frequency_hz * t).rem_euclid(1.0)
}

/// `0.5 + 0.5 sin(2π f t)`
pub fn sine(frequency_hz: f64, t: f64) -> f64 {
    0.5 + 0.5 * (TAU * frequency_hz * t).sin()
}

/// Rises 0→1 over the first half period, falls back over the second
pub fn triangle(frequency_hz: f64, t: f64) -> f64 {
    1.0 - (2.0 * phase(frequency_hz, t) - 1.0).abs()
}

/// 1 for the first `duty` fraction of each period, 0 otherwise
pub fn square(frequency_hz: f64, duty: f64, t: f64) -> f64 {
    if phase(frequency_hz, t) < duty {
        1.0
    } else {
        0.0
    }
}

/// Unit level for a light waveform
pub fn unit_level(waveform: Waveform, frequency_hz: f64, t: f64) -> f64 {
    match waveform {
        Waveform::Steady => 1.0,
        Waveform::Sine => sine(frequency_hz, t),
        Waveform::Triangle => triangle(frequency_hz, t),
        Waveform::Square { duty } => square(frequency_hz, duty, t),
    }
}

/// `base + amplitude * level`, with base and peak taken from the range
pub fn scale(level: f64, baseline: f64, peak: f64) -> f64 {
    baseline + (peak - baseline) * level
}

/// Linear frequency sweep restarting every `period_s`.
///
/// Holds `end_hz` between the end of the sweep and the next period.
pub fn sweep(start_hz: f64, end_hz: f64, sweep_s: f64, period_s: f64, t: f64) -> f64 {
    let local = t.rem_euclid(period_s);
    if local >= sweep_s {
        return end_hz;
    }
    start_hz + (end_hz - start_hz) * (local / sweep_s)
}

/// Instantaneous carrier frequency; 0 when silent
pub fn tone_frequency(tone: Tone, t: f64) -> f64 {
    match tone {
        Tone::Silent => 0.0,
        Tone::Fixed { hz } => hz,
        Tone::Sweep {
            start_hz,
            end_hz,
            sweep_s,
            period_s,
        } => sweep(start_hz, end_hz, sweep_s, period_s, t),
    }
}
