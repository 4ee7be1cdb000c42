//! Diphone concatenation engine.
//!
//! Speech is built by cutting diphones (the transition from the middle of
//! one phoneme to the middle of the next) out of a single segmented
//! reference recording, gluing them on zero crossings, and then imposing
//! the pitch contour and durations requested by a phonetizer with
//! pitch-synchronous overlap-add.
//!
//! # System Requirements
//!
//! The default phonetizer needs **espeak-ng** with the French MBROLA voice:
//! - **Linux**: `sudo apt-get install espeak-ng mbrola-fr1`
//! - **macOS**: `brew install espeak-ng` (MBROLA voices installed separately)
//!
//! The `maus` feature adds a phonetizer driving a neural TTS command and the
//! BAS MAUS aligner over HTTP.
//!
//! # Voice Directory Layout
//!
//! ```text
//! diphones/
//! ├── logatomes.wav        # reference recording
//! ├── logatomes.TextGrid   # phoneme segmentation (tier "phonemes")
//! └── voice.json           # optional: {"audio", "segmentation", "tier"}
//! ```
//!
//! The first and last intervals of the segmentation are treated as edge
//! filler and never used as diphone halves.
//!
//! # Examples
//!
//! ```rust,no_run
//! use diphone_tts::{SynthesisEngine, engines::diphone::{DiphoneEngine, DiphoneInferenceParams}};
//! use std::path::PathBuf;
//!
//! let mut engine = DiphoneEngine::new();
//! engine.load_model(&PathBuf::from("diphones"))?;
//!
//! let params = DiphoneInferenceParams {
//!     use_phonemes: false,
//!     ..Default::default()
//! };
//! engine.synthesize_to_file("Bonjour à tous", &PathBuf::from("out.wav"), Some(params))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assembler;
pub mod engine;
pub mod inventory;
pub mod model;
pub mod phoneme;
pub mod phonetizer;
pub mod prosody;
pub mod resolver;

#[cfg(test)]
mod fixtures;

pub use assembler::{assemble, check_diphones, AssembledUtterance};
pub use engine::{DiphoneEngine, DiphoneInferenceParams, DiphoneModelParams};
pub use inventory::{DiphoneInventory, DiphoneKey, DiphoneRecord};
pub use model::{DiphoneError, DiphoneVoice, VoiceConfig};
pub use phoneme::{normalize, PhonemeLabel, PhoneticUnit, TargetPhoneme, TimedPhoneme};
pub use phonetizer::{EspeakConfig, EspeakPhonetizer, Phonetizer, PhonetizerKind};
#[cfg(feature = "maus")]
pub use phonetizer::{MausConfig, MausPhonetizer};
pub use prosody::{transplant, ProsodyConfig, ProsodyConfigBuilder};
pub use resolver::{resolve, Resolution};
