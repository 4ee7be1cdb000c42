use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Labels accepted as phonemes. Anything else (silences, pauses, word
/// boundaries emitted by phonetizers) is filler.
static SAMPA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]|[A-Z]|[0-9]|~|@)+$").expect("valid regex"));

/// Number of equal slices a phoneme is cut into for pitch sampling; one
/// pitch sample sits on each inner slice boundary.
pub const PITCH_DIVISIONS: usize = 5;

/// A normalized SAMPA phoneme label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PhonemeLabel(String);

impl PhonemeLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhonemeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhonemeLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Rewrite spelling variants to the symbols used by the reference voice.
pub fn clean_sampa(raw: &str) -> String {
    let code = raw.replace('-', "");
    match code.as_str() {
        "9~" => "e~".to_string(),
        "2" | "Y" => "@".to_string(),
        "A~" | "E~" | "O~" => code.to_lowercase(),
        _ => code,
    }
}

pub fn is_sampa(label: &str) -> bool {
    SAMPA.is_match(label)
}

/// Clean a raw label and keep it only if it is a phoneme.
pub fn normalize(raw: &str) -> Option<PhonemeLabel> {
    let code = clean_sampa(raw);
    is_sampa(&code).then_some(PhonemeLabel(code))
}

/// A phoneme as produced by a phonetizer, label not yet normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneticUnit {
    pub label: String,
    /// Requested duration in seconds.
    pub duration: f64,
    /// f0 samples (Hz) at `k / PITCH_DIVISIONS` of the phoneme, `None`
    /// where no pitch was measurable.
    pub pitch: Vec<Option<f64>>,
}

/// A requested phoneme: what the phonetizer asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetPhoneme {
    pub label: PhonemeLabel,
    pub duration: f64,
    pub pitch: Vec<Option<f64>>,
}

impl TargetPhoneme {
    pub fn from_unit(unit: PhoneticUnit) -> Option<Self> {
        let label = normalize(&unit.label)?;
        Some(Self {
            label,
            duration: unit.duration,
            pitch: unit.pitch,
        })
    }
}

/// A requested phoneme together with where it landed in the assembled
/// waveform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedPhoneme {
    #[serde(flatten)]
    pub target: TargetPhoneme,
    pub start: f64,
    pub end: f64,
}

impl TimedPhoneme {
    pub fn real_duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Normalize a phonetizer's output, dropping filler units.
pub fn normalize_units(units: Vec<PhoneticUnit>) -> Vec<TargetPhoneme> {
    units
        .into_iter()
        .filter_map(|unit| {
            let raw = unit.label.clone();
            let target = TargetPhoneme::from_unit(unit);
            if target.is_none() {
                log::debug!("Dropping non-phonetic unit {raw:?}");
            }
            target
        })
        .collect()
}
