use std::path::{Path, PathBuf};

use crate::{SynthesisEngine, SynthesisResult};

use super::assembler::{assemble, check_diphones};
use super::model::{DiphoneError, DiphoneVoice};
use super::phoneme::{normalize_units, PhoneticUnit, TimedPhoneme};
use super::phonetizer::{EspeakPhonetizer, Phonetizer};
use super::prosody::{transplant, ProsodyConfig};

/// Parameters for loading a reference voice.
#[derive(Debug, Clone, Default)]
pub struct DiphoneModelParams {
    /// Segmentation tier to read. `None` uses `voice.json` or `"phonemes"`.
    pub tier: Option<String>,
}

/// Parameters for one synthesis request.
#[derive(Debug, Clone)]
pub struct DiphoneInferenceParams {
    /// Splice independent phoneme halves when a diphone was never recorded.
    /// When disabled such a pair fails with [`DiphoneError::MissingDiphone`].
    pub use_phonemes: bool,
    pub prosody: ProsodyConfig,
}

impl Default for DiphoneInferenceParams {
    fn default() -> Self {
        Self {
            use_phonemes: true,
            prosody: ProsodyConfig::default(),
        }
    }
}

/// Diphone concatenation engine.
///
/// Holds one reference voice (recording, segmentation and the diphone
/// inventory built from it) and a phonetizer. Every utterance is
/// phonetized, assembled from the voice's diphones and then given the
/// requested pitch and durations.
///
/// ```rust,no_run
/// use diphone_tts::{SynthesisEngine, engines::diphone::DiphoneEngine};
/// use std::path::PathBuf;
///
/// let mut engine = DiphoneEngine::new();
/// engine.load_model(&PathBuf::from("diphones"))?;
/// engine.synthesize_to_file("Bonjour", &PathBuf::from("output.wav"), None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DiphoneEngine {
    voice: Option<DiphoneVoice>,
    voice_path: Option<PathBuf>,
    phonetizer: Box<dyn Phonetizer>,
}

impl Default for DiphoneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiphoneEngine {
    /// Create an engine phonetizing with `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::with_phonetizer(Box::new(EspeakPhonetizer::default()))
    }

    pub fn with_phonetizer(phonetizer: Box<dyn Phonetizer>) -> Self {
        Self {
            voice: None,
            voice_path: None,
            phonetizer,
        }
    }

    /// Use an already loaded voice.
    pub fn with_voice(mut self, voice: DiphoneVoice) -> Self {
        self.voice = Some(voice);
        self.voice_path = None;
        self
    }

    pub fn voice(&self) -> Option<&DiphoneVoice> {
        self.voice.as_ref()
    }

    pub fn voice_path(&self) -> Option<&Path> {
        self.voice_path.as_deref()
    }

    /// Synthesize already phonetized units.
    ///
    /// Returns the audio together with where each phoneme ended up in the
    /// assembled waveform, before duration shaping.
    pub fn speak_phonemes(
        &self,
        units: Vec<PhoneticUnit>,
        params: &DiphoneInferenceParams,
    ) -> Result<(SynthesisResult, Vec<TimedPhoneme>), DiphoneError> {
        let voice = self.voice.as_ref().ok_or(DiphoneError::VoiceNotLoaded)?;

        let targets = normalize_units(units);
        let labels: Vec<&str> = targets.iter().map(|t| t.label.as_str()).collect();
        log::info!("Phonemes: {}", labels.join(" "));

        check_diphones(&targets, voice.inventory(), params.use_phonemes);

        let utterance = assemble(&targets, voice, params.use_phonemes)?;
        let timings = utterance.phonemes.clone();
        let sound = transplant(utterance, &params.prosody)?;

        Ok((sound.into(), timings))
    }

    /// Phonetize and synthesize `text`, keeping the phoneme timings.
    pub fn synthesize_with_timings(
        &mut self,
        text: &str,
        params: Option<DiphoneInferenceParams>,
    ) -> Result<(SynthesisResult, Vec<TimedPhoneme>), DiphoneError> {
        if self.voice.is_none() {
            return Err(DiphoneError::VoiceNotLoaded);
        }
        let params = params.unwrap_or_default();
        let units = self.phonetizer.phonetic(text)?;
        log::debug!("Phonetizer returned {} units for {text:?}", units.len());
        self.speak_phonemes(units, &params)
    }
}

impl Drop for DiphoneEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for DiphoneEngine {
    type SynthesisParams = DiphoneInferenceParams;
    type ModelParams = DiphoneModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let voice = DiphoneVoice::load(model_path, params.tier.as_deref())?;
        self.voice = Some(voice);
        self.voice_path = Some(model_path.to_path_buf());
        Ok(())
    }

    fn unload_model(&mut self) {
        self.voice = None;
        self.voice_path = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let (result, _) = self.synthesize_with_timings(text, params)?;
        Ok(result)
    }
}
