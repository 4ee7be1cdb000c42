use std::path::{Path, PathBuf};

use crate::audio::{AudioError, Sound, ZeroCrossings};
use crate::textgrid::{read_interval_tier, Interval, TextGridError};

use super::inventory::DiphoneInventory;

/// Tier holding the phoneme segmentation of the reference recording.
pub const DEFAULT_TIER: &str = "phonemes";

/// Name of the optional voice description file in a voice directory.
pub const VOICE_CONFIG_FILE: &str = "voice.json";

#[derive(thiserror::Error, Debug)]
pub enum DiphoneError {
    #[error("Audio backend error: {0}")]
    Backend(#[from] AudioError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TextGrid error: {0}")]
    TextGrid(#[from] TextGridError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No diphone, substitute or phoneme pair available for {left} {right}")]
    DiphoneResolution { left: String, right: String },
    #[error("Missing diphone: {left} {right}")]
    MissingDiphone { left: String, right: String },
    #[error("Nothing to synthesize: no phoneme left after normalization")]
    EmptyUtterance,
    #[error("Voice not loaded. Call load_model() first.")]
    VoiceNotLoaded,
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng mbrola-fr1`, \
         macOS: `brew install espeak-ng`"
    )]
    EspeakNotFound,
    #[error("Phonetization failed: {0}")]
    PhonetizerFailed(String),
    #[error("Alignment service error: {0}")]
    Collaborator(String),
    #[cfg(feature = "maus")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Contents of `voice.json`. Every field is optional.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Reference recording, relative to the voice directory.
    pub audio: Option<PathBuf>,
    /// TextGrid segmentation, relative to the voice directory.
    pub segmentation: Option<PathBuf>,
    /// Tier holding the phoneme intervals.
    pub tier: Option<String>,
}

impl VoiceConfig {
    pub fn load(path: &Path) -> Result<Self, DiphoneError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| DiphoneError::Config(format!("{}: {e}", path.display())))
    }
}

/// A reference voice: its recording, its segmentation and the diphones
/// indexed from it. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct DiphoneVoice {
    sound: Sound,
    segmentation: Vec<Interval>,
    zero_crossings: ZeroCrossings,
    inventory: DiphoneInventory,
}

impl DiphoneVoice {
    /// Load a voice directory.
    ///
    /// The directory holds the reference WAV and its TextGrid, either named
    /// in `voice.json` or discovered by extension. `tier` overrides the
    /// segmentation tier name.
    pub fn load(voice_dir: &Path, tier: Option<&str>) -> Result<Self, DiphoneError> {
        let config_path = voice_dir.join(VOICE_CONFIG_FILE);
        let config = if config_path.exists() {
            log::info!("Loading voice description from {}", config_path.display());
            VoiceConfig::load(&config_path)?
        } else {
            VoiceConfig::default()
        };

        let audio_path = match &config.audio {
            Some(path) => voice_dir.join(path),
            None => find_file(voice_dir, "wav")?,
        };
        let grid_path = match &config.segmentation {
            Some(path) => voice_dir.join(path),
            None => find_file(voice_dir, "TextGrid")?,
        };
        let tier = tier
            .map(str::to_string)
            .or(config.tier)
            .unwrap_or_else(|| DEFAULT_TIER.to_string());

        log::info!(
            "Loading reference voice {} ({} / tier {tier:?})",
            audio_path.display(),
            grid_path.display()
        );

        let sound = Sound::load(&audio_path)?;
        let segmentation = read_interval_tier(&grid_path, &tier)?;

        Ok(Self::from_parts(sound, segmentation))
    }

    pub fn from_parts(sound: Sound, segmentation: Vec<Interval>) -> Self {
        let zero_crossings = ZeroCrossings::rising(&sound);
        let inventory = DiphoneInventory::build(&segmentation);
        log::info!(
            "Voice ready: {:.2}s, {} intervals, {} diphones",
            sound.duration(),
            segmentation.len(),
            inventory.len()
        );
        Self {
            sound,
            segmentation,
            zero_crossings,
            inventory,
        }
    }

    /// Replace the inventory built from the segmentation.
    pub fn with_inventory(mut self, inventory: DiphoneInventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    pub fn segmentation(&self) -> &[Interval] {
        &self.segmentation
    }

    pub fn inventory(&self) -> &DiphoneInventory {
        &self.inventory
    }

    /// Nearest rising zero crossing of the reference recording.
    pub fn nearest_zero(&self, time: f64) -> f64 {
        self.zero_crossings.nearest(time)
    }
}

/// First file in `dir` with the given extension (case-insensitive), in
/// file-name order.
fn find_file(dir: &Path, extension: &str) -> Result<PathBuf, DiphoneError> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches {
            candidates.push(path);
        }
    }
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        DiphoneError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No .{extension} file found in {}", dir.display()),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::diphone::fixtures;
    use crate::textgrid::write_interval_tier;

    const BA: &[(&str, f64, f64)] = &[
        ("sil", 0.0, 0.1),
        ("b", 0.1, 0.2),
        ("a", 0.2, 0.35),
        ("sil", 0.35, 0.4),
    ];

    #[test]
    fn loads_voice_directory_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_voice(dir.path(), "logatomes", "phonemes", BA);

        let voice = DiphoneVoice::load(dir.path(), None).unwrap();
        assert_eq!(voice.segmentation().len(), 4);
        assert_eq!(voice.inventory().len(), 1);
        assert!(voice.inventory().contains("b", "a"));
    }

    #[test]
    fn voice_json_names_files_and_tier() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_voice(dir.path(), "ref", "MAU", BA);
        std::fs::write(
            dir.path().join(VOICE_CONFIG_FILE),
            r#"{"audio": "ref.wav", "segmentation": "ref.TextGrid", "tier": "MAU"}"#,
        )
        .unwrap();

        let voice = DiphoneVoice::load(dir.path(), None).unwrap();
        assert_eq!(voice.inventory().len(), 1);

        let err = DiphoneVoice::load(dir.path(), Some("words")).unwrap_err();
        assert!(matches!(
            err,
            DiphoneError::TextGrid(TextGridError::MissingTier { .. })
        ));
    }

    #[test]
    fn missing_audio_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_interval_tier(&dir.path().join("ref.TextGrid"), "phonemes", &fixtures::intervals(BA))
            .unwrap();
        assert!(matches!(
            DiphoneVoice::load(dir.path(), None),
            Err(DiphoneError::Io(_))
        ));
    }

    #[test]
    fn snaps_to_reference_zero_crossings() {
        let voice = fixtures::voice(&[("sil", 0.0, 0.1), ("b", 0.1, 0.2), ("a", 0.2, 0.4)]);
        assert!((voice.nearest_zero(0.1032) - 0.1).abs() < 1e-4);
    }
}
