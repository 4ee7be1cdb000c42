//! Sentence to phoneme-sequence conversion.
//!
//! A [`Phonetizer`] turns text into phonemes carrying a requested duration
//! and a few pitch samples. Labels come back raw; the engine normalizes
//! them and drops filler.

pub mod espeak;
#[cfg(feature = "maus")]
pub mod maus;

pub use espeak::{EspeakConfig, EspeakPhonetizer};
#[cfg(feature = "maus")]
pub use maus::{MausConfig, MausPhonetizer, TtsCommand};

use crate::audio::PitchTrack;
use crate::textgrid::Interval;

use super::model::DiphoneError;
use super::phoneme::{PhoneticUnit, PITCH_DIVISIONS};

pub trait Phonetizer {
    /// Phonemes of `sentence`, in order.
    fn phonetic(&mut self, sentence: &str) -> Result<Vec<PhoneticUnit>, DiphoneError>;
}

/// Which phonetizer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhonetizerKind {
    /// Rule-based: espeak-ng with an MBROLA voice.
    #[default]
    Espeak,
    /// Neural TTS aligned by the MAUS web service (feature `maus`).
    Maus,
}

impl PhonetizerKind {
    pub fn build(self) -> Result<Box<dyn Phonetizer>, DiphoneError> {
        match self {
            PhonetizerKind::Espeak => Ok(Box::new(EspeakPhonetizer::default())),
            #[cfg(feature = "maus")]
            PhonetizerKind::Maus => Ok(Box::new(MausPhonetizer::new(MausConfig::default())?)),
            #[cfg(not(feature = "maus"))]
            PhonetizerKind::Maus => Err(DiphoneError::Config(
                "the MAUS phonetizer requires the `maus` feature".to_string(),
            )),
        }
    }
}

/// Fractions of a phoneme where pitch is sampled: `1/5 .. 4/5`.
pub fn sample_fractions() -> impl Iterator<Item = f64> {
    (1..PITCH_DIVISIONS).map(|k| k as f64 / PITCH_DIVISIONS as f64)
}

/// Turn aligned intervals of a recording into phonetic units, sampling the
/// recording's pitch inside each interval.
pub fn units_from_intervals(intervals: &[Interval], track: &PitchTrack) -> Vec<PhoneticUnit> {
    intervals
        .iter()
        .map(|interval| PhoneticUnit {
            label: interval.label.clone(),
            duration: interval.duration(),
            pitch: sample_fractions()
                .map(|f| track.value_at(interval.start + f * interval.duration()))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Sound;

    #[test]
    fn fractions_exclude_edges() {
        let fractions: Vec<f64> = sample_fractions().collect();
        assert_eq!(fractions, vec![0.2, 0.4, 0.6, 0.8]);
    }

    #[test]
    fn units_sample_recording_pitch() {
        let rate = 16_000;
        let mut samples: Vec<f32> = (0..rate / 2)
            .map(|i| {
                (0.6 * (2.0 * std::f64::consts::PI * 140.0 * i as f64 / rate as f64).sin()) as f32
            })
            .collect();
        samples.extend(std::iter::repeat(0.0).take(rate / 2));
        let sound = Sound::new(samples, rate as u32);
        let track = PitchTrack::from_sound(&sound, 0.01, 75.0, 600.0);

        let intervals = vec![
            Interval::new("a", 0.1, 0.4),
            Interval::new("<p:>", 0.6, 0.9),
        ];
        let units = units_from_intervals(&intervals, &track);

        assert_eq!(units.len(), 2);
        assert!((units[0].duration - 0.3).abs() < 1e-12);
        assert_eq!(units[0].pitch.len(), 4);
        for f0 in &units[0].pitch {
            let f0 = f0.expect("voiced");
            assert!((f0 - 140.0).abs() < 3.0);
        }
        assert!(units[1].pitch.iter().all(Option::is_none));
    }
}
