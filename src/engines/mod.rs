//! Speech synthesis engines.
//!
//! [`diphone`] is the only engine: it concatenates diphones cut from a
//! segmented reference recording. Its phonetizer runs espeak-ng, or a
//! neural TTS aligned by MAUS when built with the `maus` feature.

pub mod diphone;
