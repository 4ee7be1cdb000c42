//! Synthetic voices for unit tests.

use std::path::Path;

use crate::audio::Sound;
use crate::textgrid::{write_interval_tier, Interval};

use super::model::DiphoneVoice;
use super::phoneme::{normalize, PhoneticUnit, TargetPhoneme};

pub const SAMPLE_RATE: u32 = 16_000;

/// A 100 Hz sine: one rising zero crossing every 10 ms, starting at 0.
pub fn sine(duration: f64) -> Sound {
    let n = (duration * SAMPLE_RATE as f64).round() as usize;
    let samples = (0..n)
        .map(|i| {
            (0.5 * (2.0 * std::f64::consts::PI * 100.0 * i as f64 / SAMPLE_RATE as f64).sin())
                as f32
        })
        .collect();
    Sound::new(samples, SAMPLE_RATE)
}

pub fn intervals(segments: &[(&str, f64, f64)]) -> Vec<Interval> {
    segments
        .iter()
        .map(|&(label, start, end)| Interval::new(label, start, end))
        .collect()
}

fn duration_of(segments: &[(&str, f64, f64)]) -> f64 {
    segments.last().map(|s| s.2).unwrap_or(0.0)
}

pub fn voice(segments: &[(&str, f64, f64)]) -> DiphoneVoice {
    DiphoneVoice::from_parts(sine(duration_of(segments)), intervals(segments))
}

/// Write `<stem>.wav` and `<stem>.TextGrid` (one tier named `tier`) to `dir`.
pub fn write_voice(dir: &Path, stem: &str, tier: &str, segments: &[(&str, f64, f64)]) {
    sine(duration_of(segments))
        .save(&dir.join(format!("{stem}.wav")))
        .unwrap();
    write_interval_tier(&dir.join(format!("{stem}.TextGrid")), tier, &intervals(segments)).unwrap();
}

pub fn unit(label: &str, duration: f64) -> PhoneticUnit {
    PhoneticUnit {
        label: label.to_string(),
        duration,
        pitch: vec![Some(110.0), Some(115.0), None, Some(105.0)],
    }
}

pub fn target(label: &str, duration: f64) -> TargetPhoneme {
    TargetPhoneme {
        label: normalize(label).expect("test labels are phonemes"),
        duration,
        pitch: vec![Some(110.0), Some(115.0), None, Some(105.0)],
    }
}
