//! Waveform assembly.
//!
//! Each consecutive pair of target phonemes is cut out of the reference
//! recording from the middle of the first phoneme to the middle of the
//! second one (from the very start for the first pair, to the very end for
//! the last pair), always on a rising zero crossing. While concatenating,
//! the position where each phoneme boundary lands in the output is
//! recorded so prosody can be applied phoneme by phoneme.

use serde::Serialize;

use crate::audio::Sound;

use super::inventory::{DiphoneInventory, DiphoneKey};
use super::model::{DiphoneError, DiphoneVoice};
use super::phoneme::{TargetPhoneme, TimedPhoneme};
use super::resolver::{lookup, Resolution};

/// Silence kept before and after the assembled phonemes, in seconds.
pub const LEAD_IN: f64 = 0.05;

/// The concatenated waveform and the real timing of every phoneme in it.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledUtterance {
    #[serde(skip)]
    pub sound: Sound,
    pub phonemes: Vec<TimedPhoneme>,
    /// Where the last phoneme ends in the output, in seconds.
    pub output_length: f64,
}

/// Every consecutive pair of `targets` that the inventory did not record.
///
/// With phoneme-level fallback enabled the pairs are reported as warnings,
/// since they will be substituted or spliced.
pub fn check_diphones(
    targets: &[TargetPhoneme],
    inventory: &DiphoneInventory,
    use_phonemes: bool,
) -> Vec<DiphoneKey> {
    let missing: Vec<DiphoneKey> = targets
        .windows(2)
        .filter(|pair| !inventory.contains(pair[0].label.as_str(), pair[1].label.as_str()))
        .map(|pair| DiphoneKey::new(pair[0].label.as_str(), pair[1].label.as_str()))
        .collect();

    if use_phonemes && !missing.is_empty() {
        log::warn!(
            "{} diphone(s) missing, they will be replaced by concatenated phonemes:",
            missing.len()
        );
        for key in &missing {
            log::warn!("- {}", key);
        }
    }

    missing
}

/// Concatenate the diphones of `targets` cut from the voice's recording.
///
/// With `use_phonemes` disabled, a pair without a recorded (or substitute)
/// transition fails with [`DiphoneError::MissingDiphone`].
pub fn assemble(
    targets: &[TargetPhoneme],
    voice: &DiphoneVoice,
    use_phonemes: bool,
) -> Result<AssembledUtterance, DiphoneError> {
    if targets.is_empty() {
        return Err(DiphoneError::EmptyUtterance);
    }

    let reference = voice.sound();
    let edge = reference.extract_part(0.0, LEAD_IN)?;
    let mut output = edge.clone();

    let n = targets.len();
    let mut starts = vec![LEAD_IN; n];
    let mut ends = vec![LEAD_IN; n];
    let mut output_length = LEAD_IN;

    if n == 1 {
        log::warn!(
            "Single phoneme {:?}: no diphone to assemble",
            targets[0].label.as_str()
        );
    }

    for i in 0..n.saturating_sub(1) {
        let left = targets[i].label.as_str();
        let right = targets[i + 1].label.as_str();

        let resolution = lookup(voice.inventory(), left, right);
        let record = match &resolution {
            Resolution::Exact(record) => *record,
            Resolution::Replaced { key, record } => {
                log::debug!("{left}{right}: using {key}");
                *record
            }
            Resolution::Disjoint(record) if use_phonemes => {
                log::debug!("{left}{right}: splicing independent phonemes");
                *record
            }
            Resolution::Disjoint(_) => {
                return Err(missing(left, right));
            }
            Resolution::NotFound if use_phonemes => {
                return Err(DiphoneError::DiphoneResolution {
                    left: left.to_string(),
                    right: right.to_string(),
                })
            }
            Resolution::NotFound => return Err(missing(left, right)),
        };

        let cut_start = voice.nearest_zero(if i == 0 {
            record.seg_start
        } else {
            record.left_middle()
        });
        let cut_end = voice.nearest_zero(if i == n - 2 {
            record.seg_end
        } else {
            record.right_middle()
        });

        let fragment = if record.is_joined() {
            reference.extract_part(cut_start, cut_end)?
        } else {
            let splice_left = voice.nearest_zero(record.boundary_left);
            let splice_right = voice.nearest_zero(record.boundary_right);
            let mut fragment = reference.extract_part(cut_start, splice_left)?;
            fragment.append(&reference.extract_part(splice_right, cut_end)?)?;
            fragment
        };
        output.append(&fragment)?;

        let boundary = output_length + (record.boundary_left - record.seg_start);
        ends[i] = boundary;
        starts[i + 1] = boundary;

        output_length += (cut_start - record.seg_start) + (record.seg_end - cut_end);
    }

    starts[0] = LEAD_IN;
    ends[n - 1] = output_length;
    output.append(&edge)?;

    let phonemes = targets
        .iter()
        .zip(starts.into_iter().zip(ends))
        .map(|(target, (start, end))| TimedPhoneme {
            target: target.clone(),
            start,
            end,
        })
        .collect();

    Ok(AssembledUtterance {
        sound: output,
        phonemes,
        output_length,
    })
}

fn missing(left: &str, right: &str) -> DiphoneError {
    DiphoneError::MissingDiphone {
        left: left.to_string(),
        right: right.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::diphone::fixtures::{self, target, SAMPLE_RATE};
    use crate::engines::diphone::inventory::DiphoneRecord;

    const TOLERANCE: f64 = 2.0 / SAMPLE_RATE as f64;

    fn ba_voice() -> DiphoneVoice {
        fixtures::voice(&[
            ("sil", 0.0, 0.1),
            ("b", 0.1, 0.2),
            ("a", 0.2, 0.35),
            ("sil", 0.35, 0.4),
        ])
    }

    fn long_voice() -> DiphoneVoice {
        fixtures::voice(&[
            ("sil", 0.0, 0.1),
            ("b", 0.1, 0.2),
            ("a", 0.2, 0.34),
            ("p", 0.34, 0.42),
            ("i", 0.42, 0.56),
            ("t", 0.56, 0.64),
            ("o", 0.64, 0.8),
            ("sil", 0.8, 0.9),
        ])
    }

    #[test]
    fn single_diphone_duration() {
        let voice = ba_voice();
        let targets = vec![target("b", 0.1), target("a", 0.15)];
        let out = assemble(&targets, &voice, true).unwrap();

        let expected = 0.05 + (0.2 - 0.1) + (0.35 - 0.2) + 0.05;
        assert!((out.sound.duration() - expected).abs() < TOLERANCE);
        assert_eq!(out.phonemes[0].end, out.phonemes[1].start);
        assert!((out.phonemes[0].end - 0.15).abs() < 1e-9);
        assert_eq!(out.phonemes[0].start, LEAD_IN);
        assert_eq!(out.phonemes.last().unwrap().end, out.output_length);
        assert!((out.output_length - 0.05).abs() < TOLERANCE);
    }

    #[test]
    fn timing_chain_is_contiguous() {
        let voice = long_voice();
        let targets: Vec<_> = ["b", "a", "p", "i", "t", "o"]
            .iter()
            .map(|l| target(l, 0.1))
            .collect();
        let out = assemble(&targets, &voice, false).unwrap();

        assert_eq!(out.phonemes.len(), targets.len());
        assert_eq!(out.phonemes[0].start, LEAD_IN);
        for pair in out.phonemes.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }

        // Cuts land on 10 ms crossings: 0.1..0.27, 0.27..0.38, 0.38..0.49,
        // 0.49..0.60, 0.60..0.8
        assert!((out.phonemes[0].end - 0.15).abs() < 1e-3);
        assert!((out.phonemes[1].end - 0.26).abs() < 1e-3);
        let last = out.phonemes.last().unwrap();
        assert!((last.end - 0.49).abs() < 1e-3, "got {}", last.end);
        assert_eq!(last.end, out.output_length);

        let fragments = (0.27 - 0.1) + (0.38 - 0.27) + (0.49 - 0.38) + (0.60 - 0.49) + (0.8 - 0.60);
        assert!((out.sound.duration() - (2.0 * LEAD_IN + fragments)).abs() < 5.0 * TOLERANCE);
    }

    #[test]
    fn assembly_is_deterministic() {
        let voice = long_voice();
        let targets: Vec<_> = ["b", "a", "p", "o"].iter().map(|l| target(l, 0.1)).collect();
        let first = assemble(&targets, &voice, true).unwrap();
        let second = assemble(&targets, &voice, true).unwrap();
        assert_eq!(first.sound, second.sound);
        assert_eq!(first.phonemes, second.phonemes);
    }

    #[test]
    fn missing_diphone_without_fallback() {
        let voice = long_voice();
        // (a, o) was never recorded and has no substitute; both halves exist.
        let targets = vec![target("a", 0.1), target("o", 0.1)];
        match assemble(&targets, &voice, false) {
            Err(DiphoneError::MissingDiphone { left, right }) => {
                assert_eq!(left, "a");
                assert_eq!(right, "o");
            }
            other => panic!("expected MissingDiphone, got {other:?}"),
        }
    }

    #[test]
    fn disjoint_halves_are_spliced_with_fallback() {
        let voice = long_voice();
        let targets = vec![target("a", 0.1), target("o", 0.1)];
        let out = assemble(&targets, &voice, true).unwrap();

        // left half of (a, p): 0.2..0.34, right half of (t, o): 0.64..0.8
        let expected = 2.0 * LEAD_IN + (0.34 - 0.2) + (0.8 - 0.64);
        assert!((out.sound.duration() - expected).abs() < 2.0 * TOLERANCE);
        assert_eq!(out.phonemes[0].end, out.phonemes[1].start);
    }

    #[test]
    fn exact_record_with_split_boundary_is_spliced() {
        let inventory = DiphoneInventory::from_records([(
            DiphoneKey::new("a", "o"),
            DiphoneRecord {
                seg_start: 0.2,
                boundary_left: 0.34,
                boundary_right: 0.64,
                seg_end: 0.8,
            },
        )]);
        let voice = long_voice().with_inventory(inventory);
        let targets = vec![target("a", 0.1), target("o", 0.1)];
        let out = assemble(&targets, &voice, false).unwrap();

        // 0.34..0.64 is left out; a single cut would keep 0.2..0.8
        let expected = 2.0 * LEAD_IN + (0.34 - 0.2) + (0.8 - 0.64);
        assert!((out.sound.duration() - expected).abs() < 2.0 * TOLERANCE);
    }

    #[test]
    fn unresolvable_pair_with_fallback() {
        let voice = ba_voice();
        let targets = vec![target("b", 0.1), target("u", 0.1)];
        assert!(matches!(
            assemble(&targets, &voice, true),
            Err(DiphoneError::DiphoneResolution { .. })
        ));
    }

    #[test]
    fn empty_and_single_targets() {
        let voice = ba_voice();
        assert!(matches!(
            assemble(&[], &voice, true),
            Err(DiphoneError::EmptyUtterance)
        ));

        let out = assemble(&[target("a", 0.1)], &voice, true).unwrap();
        assert!((out.sound.duration() - 2.0 * LEAD_IN).abs() < TOLERANCE);
        assert_eq!(out.phonemes[0].start, LEAD_IN);
        assert_eq!(out.phonemes[0].end, LEAD_IN);
    }

    #[test]
    fn check_reports_missing_pairs() {
        let voice = ba_voice();
        let targets = vec![target("b", 0.1), target("a", 0.1), target("b", 0.1)];
        let missing = check_diphones(&targets, voice.inventory(), true);
        assert_eq!(missing, vec![DiphoneKey::new("a", "b")]);
    }
}
