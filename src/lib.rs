//! # diphone-tts
//!
//! A Rust library synthesizing speech by diphone concatenation: diphones are
//! cut from a single segmented reference recording, joined on zero
//! crossings, then reshaped to the pitch and durations requested by a
//! phonetizer.
//!
//! ## Features
//!
//! - **Diphone engine**: inventory built once per voice, replacement and
//!   split-phoneme fallbacks for missing transitions
//! - **Prosody transplantation**: pitch contour and damped durations applied
//!   with TD-PSOLA overlap-add
//! - **Phonetizers**: espeak-ng/MBROLA by default, neural TTS + MAUS
//!   alignment with the `maus` feature
//! - **CLI**: `diphone-say` with the `cli` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! diphone-tts = "2026.10"
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use diphone_tts::{engines::diphone::DiphoneEngine, SynthesisEngine};
//!
//! let mut engine = DiphoneEngine::new();
//! engine.load_model(&PathBuf::from("diphones"))?;
//!
//! let result = engine.synthesize("Bonjour", None)?;
//! result.write_wav(&PathBuf::from("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod engines;
pub mod textgrid;

use std::path::Path;

use audio::Sound;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (that of the reference recording)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        audio::sound::write_pcm16(path, &self.samples, self.sample_rate)?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

impl From<Sound> for SynthesisResult {
    fn from(sound: Sound) -> Self {
        let sample_rate = sound.sample_rate();
        Self {
            samples: sound.into_samples(),
            sample_rate,
        }
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Each engine may have different parameter types for model loading and
/// inference configuration.
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (fallbacks, prosody, etc.)
    type SynthesisParams;
    /// Parameters for configuring model loading
    type ModelParams: Default;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech from the given text and write to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_wav(wav_path)
    }
}
