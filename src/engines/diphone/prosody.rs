use derive_builder::Builder;

use crate::audio::{Manipulation, Sound, Tier};

use super::assembler::AssembledUtterance;
use super::model::DiphoneError;
use super::phoneme::{TimedPhoneme, PITCH_DIVISIONS};

/// Settings for pitch and duration transplantation.
///
/// ```
/// use diphone_tts::engines::diphone::ProsodyConfigBuilder;
///
/// let config = ProsodyConfigBuilder::default()
///     .pitch_ceiling(400.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.duration_damping, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct ProsodyConfig {
    /// Analysis step of the pitch tracker, in seconds.
    pub time_step: f64,
    /// Lowest f0 considered when analysing the assembled waveform (Hz).
    pub pitch_floor: f64,
    /// Highest f0 considered when analysing the assembled waveform (Hz).
    pub pitch_ceiling: f64,
    /// Fraction of the requested/real duration ratio applied in the middle
    /// of each phoneme. `1.0` would fully match the requested duration.
    pub duration_damping: f64,
    /// Pitch samples sit at `k / pitch_divisions` of each phoneme for
    /// `k` in `1..pitch_divisions`.
    pub pitch_divisions: usize,
}

impl Default for ProsodyConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            pitch_floor: 75.0,
            pitch_ceiling: 600.0,
            duration_damping: 0.5,
            pitch_divisions: PITCH_DIVISIONS,
        }
    }
}

/// Apply the requested pitch and duration of every phoneme to the
/// assembled waveform and resynthesize it.
pub fn transplant(
    utterance: AssembledUtterance,
    config: &ProsodyConfig,
) -> Result<Sound, DiphoneError> {
    let AssembledUtterance {
        sound, phonemes, ..
    } = utterance;
    let duration = sound.duration();

    let mut manipulation = Manipulation::from_sound(
        sound,
        config.time_step,
        config.pitch_floor,
        config.pitch_ceiling,
    );

    // The measured contour is discarded; only transplanted targets remain.
    let mut pitch_tier = manipulation.extract_pitch_tier();
    pitch_tier.remove_points_between(0.0, duration);
    let mut duration_tier = manipulation.extract_duration_tier();

    for phoneme in &phonemes {
        add_phoneme_points(phoneme, config, &mut pitch_tier, &mut duration_tier);
    }

    log::debug!(
        "Transplanting {} pitch and {} duration points over {:.3}s",
        pitch_tier.len(),
        duration_tier.len(),
        duration
    );

    manipulation.replace_duration_tier(duration_tier);
    manipulation.replace_pitch_tier(pitch_tier);
    Ok(manipulation.overlap_add()?)
}

fn add_phoneme_points(
    phoneme: &TimedPhoneme,
    config: &ProsodyConfig,
    pitch_tier: &mut Tier,
    duration_tier: &mut Tier,
) {
    let (start, end) = (phoneme.start, phoneme.end);
    let label = phoneme.target.label.as_str();

    for (time, f0) in pitch_times(start, end, config.pitch_divisions).zip(&phoneme.target.pitch) {
        if let Some(f0) = f0.filter(|f| f.is_finite()) {
            pitch_tier.add_point(time, f0);
        }
    }

    match duration_ratio(phoneme.target.duration, phoneme.real_duration(), config.duration_damping) {
        Some(ratio) => {
            duration_tier.add_point(start, 1.0);
            duration_tier.add_point((start + end) / 2.0, ratio);
            duration_tier.add_point(end, 1.0);
        }
        None => log::warn!(
            "{label}: no duration shaping over {start:.3}..{end:.3} (requested {:.3}s)",
            phoneme.target.duration
        ),
    }
}

/// Times of the pitch samples strictly inside `start..end`.
pub fn pitch_times(start: f64, end: f64, divisions: usize) -> impl Iterator<Item = f64> {
    let step = (end - start) / divisions.max(1) as f64;
    (1..divisions).map(move |k| start + step * k as f64)
}

/// Damped requested/real duration ratio, when it is usable.
pub fn duration_ratio(requested: f64, real: f64, damping: f64) -> Option<f64> {
    if real <= 0.0 {
        return None;
    }
    let ratio = requested / real * damping;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::diphone::assembler::assemble;
    use crate::engines::diphone::fixtures::{self, target};

    fn timed(start: f64, end: f64, duration: f64, pitch: Vec<Option<f64>>) -> TimedPhoneme {
        let mut t = target("a", duration);
        t.pitch = pitch;
        TimedPhoneme {
            target: t,
            start,
            end,
        }
    }

    #[test]
    fn four_pitch_samples_inside_the_phoneme() {
        let times: Vec<f64> = pitch_times(0.0, 1.0, 5).collect();
        assert_eq!(times.len(), 4);
        for (t, expected) in times.iter().zip([0.2, 0.4, 0.6, 0.8]) {
            assert!((t - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn damped_ratio() {
        assert_eq!(duration_ratio(0.2, 0.1, 0.5), Some(1.0));
        assert_eq!(duration_ratio(0.1, 0.1, 0.5), Some(0.5));
        assert_eq!(duration_ratio(0.1, 0.0, 0.5), None);
        assert_eq!(duration_ratio(0.1, -0.2, 0.5), None);
        assert_eq!(duration_ratio(0.0, 0.1, 0.5), None);
    }

    #[test]
    fn phoneme_points() {
        let phoneme = timed(
            0.05,
            0.15,
            0.1,
            vec![Some(100.0), None, Some(120.0), Some(130.0)],
        );
        let mut pitch = Tier::new();
        let mut duration = Tier::new();
        add_phoneme_points(&phoneme, &ProsodyConfig::default(), &mut pitch, &mut duration);

        let pitch_times: Vec<f64> = pitch.points().iter().map(|p| p.0).collect();
        assert_eq!(pitch_times.len(), 3);
        assert!((pitch_times[0] - 0.07).abs() < 1e-12);
        assert!((pitch_times[1] - 0.11).abs() < 1e-12);
        assert!((pitch_times[2] - 0.13).abs() < 1e-12);

        let points = duration.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (0.05, 1.0));
        assert!((points[1].0 - 0.1).abs() < 1e-12);
        assert!((points[1].1 - 0.5).abs() < 1e-12);
        assert_eq!(points[2], (0.15, 1.0));
    }

    #[test]
    fn degenerate_interval_keeps_pitch_only() {
        let phoneme = timed(0.3, 0.2, 0.1, vec![Some(100.0); 4]);
        let mut pitch = Tier::new();
        let mut duration = Tier::new();
        add_phoneme_points(&phoneme, &ProsodyConfig::default(), &mut pitch, &mut duration);
        assert_eq!(pitch.len(), 4);
        assert!(duration.is_empty());
    }

    #[test]
    fn transplant_is_deterministic() {
        let voice = fixtures::voice(&[
            ("sil", 0.0, 0.1),
            ("b", 0.1, 0.2),
            ("a", 0.2, 0.35),
            ("p", 0.35, 0.45),
            ("a", 0.45, 0.6),
            ("sil", 0.6, 0.7),
        ]);
        let targets = vec![target("b", 0.08), target("a", 0.2), target("p", 0.1)];
        let config = ProsodyConfig::default();

        let first = transplant(assemble(&targets, &voice, true).unwrap(), &config).unwrap();
        let second = transplant(assemble(&targets, &voice, true).unwrap(), &config).unwrap();
        assert!(first.duration() > 0.0);
        assert_eq!(first, second);
    }
}
