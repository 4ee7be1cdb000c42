//! Signal-processing backend used by the diphone engine.
//!
//! Everything here works on mono `f32` buffers with times expressed in
//! seconds:
//!
//! - [`Sound`]: WAV load/save, sub-range extraction and concatenation
//! - [`ZeroCrossings`]: rising zero crossings, used as click-free splice points
//! - [`PitchTrack`]: autocorrelation f0 tracker queryable by time
//! - [`Tier`] and [`Manipulation`]: pitch/duration control curves and
//!   TD-PSOLA overlap-add resynthesis

pub mod manipulation;
pub mod pitch;
pub mod sound;
pub mod zero_crossings;

pub use manipulation::{Manipulation, Tier};
pub use pitch::PitchTrack;
pub use sound::Sound;
pub use zero_crossings::ZeroCrossings;

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Invalid range {start:.4}s..{end:.4}s for a sound of {duration:.4}s")]
    InvalidRange { start: f64, end: f64, duration: f64 },
    #[error("Sample rate mismatch: {left} Hz vs {right} Hz")]
    SampleRateMismatch { left: u32, right: u32 },
    #[error("Resynthesis failed: {0}")]
    Resynthesis(String),
}
