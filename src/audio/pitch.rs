use super::Sound;

/// Normalized autocorrelation below which a frame is unvoiced.
const VOICING_THRESHOLD: f64 = 0.45;

/// Frames quieter than this fraction of the global peak are unvoiced.
const SILENCE_THRESHOLD: f64 = 0.03;

/// Candidate lags scoring within this fraction of the best one are preferred
/// when shorter, which keeps the tracker off sub-harmonics.
const OCTAVE_TOLERANCE: f64 = 0.9;

/// Fundamental frequency contour sampled on a regular time grid.
#[derive(Debug, Clone)]
pub struct PitchTrack {
    time_step: f64,
    first_time: f64,
    frames: Vec<Option<f64>>,
}

impl PitchTrack {
    /// Track f0 with a normalized autocorrelation over windows three floor
    /// periods long, searching lags between `ceiling` and `floor` Hz.
    pub fn from_sound(sound: &Sound, time_step: f64, floor: f64, ceiling: f64) -> Self {
        let rate = sound.sample_rate() as f64;
        let samples = sound.samples();
        let window = ((3.0 / floor) * rate).round() as usize;
        let duration = sound.duration();
        let window_secs = window as f64 / rate;

        if window < 4 || samples.len() < window || time_step <= 0.0 {
            return Self {
                time_step,
                first_time: duration / 2.0,
                frames: Vec::new(),
            };
        }

        let n_frames = ((duration - window_secs) / time_step).floor() as usize + 1;
        let first_time = (duration - (n_frames - 1) as f64 * time_step) / 2.0;
        let min_lag = ((rate / ceiling).floor() as usize).max(1);
        let max_lag = ((rate / floor).ceil() as usize).min(window - 2);
        let silence = SILENCE_THRESHOLD * sound.peak() as f64;

        let frames = (0..n_frames)
            .map(|k| {
                let center = first_time + k as f64 * time_step;
                let start = ((center * rate).round() as isize - (window / 2) as isize)
                    .clamp(0, (samples.len() - window) as isize) as usize;
                let frame = &samples[start..start + window];
                estimate_frame(frame, rate, min_lag, max_lag, silence)
            })
            .collect();

        Self {
            time_step,
            first_time,
            frames,
        }
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Center time of frame `index`.
    pub fn frame_time(&self, index: usize) -> f64 {
        self.first_time + index as f64 * self.time_step
    }

    pub fn frames(&self) -> &[Option<f64>] {
        &self.frames
    }

    /// f0 at `time`, linearly interpolated between neighbouring voiced
    /// frames. `None` when the nearest frame is unvoiced or the time lies
    /// outside the analysed range.
    pub fn value_at(&self, time: f64) -> Option<f64> {
        if self.frames.is_empty() || !time.is_finite() {
            return None;
        }
        let position = (time - self.first_time) / self.time_step;
        let last = (self.frames.len() - 1) as f64;
        if position < -0.5 || position > last + 0.5 {
            return None;
        }

        let nearest = position.round().clamp(0.0, last) as usize;
        let value = self.frames[nearest]?;

        let neighbour = if position >= nearest as f64 {
            nearest + 1
        } else {
            nearest.wrapping_sub(1)
        };
        match self.frames.get(neighbour).copied().flatten() {
            Some(other) => {
                let frac = (position - nearest as f64).abs();
                Some(value + (other - value) * frac)
            }
            None => Some(value),
        }
    }
}

fn estimate_frame(
    frame: &[f32],
    rate: f64,
    min_lag: usize,
    max_lag: usize,
    silence: f64,
) -> Option<f64> {
    let local_peak = frame.iter().fold(0.0f64, |acc, &s| acc.max((s as f64).abs()));
    if local_peak <= silence || min_lag >= max_lag {
        return None;
    }

    let r: Vec<f64> = (min_lag - 1..=max_lag + 1)
        .map(|lag| normalized_autocorrelation(frame, lag))
        .collect();
    // r[j] corresponds to lag `min_lag - 1 + j`
    let best = r[1..r.len() - 1].iter().cloned().fold(f64::MIN, f64::max);
    if best < VOICING_THRESHOLD {
        return None;
    }

    let j = (1..r.len() - 1)
        .find(|&j| r[j] >= OCTAVE_TOLERANCE * best && r[j] >= r[j - 1] && r[j] >= r[j + 1])?;

    let denom = r[j - 1] - 2.0 * r[j] + r[j + 1];
    let delta = if denom.abs() > f64::EPSILON {
        (0.5 * (r[j - 1] - r[j + 1]) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };
    let lag = (min_lag - 1 + j) as f64 + delta;
    Some(rate / lag)
}

fn normalized_autocorrelation(frame: &[f32], lag: usize) -> f64 {
    if lag == 0 || lag >= frame.len() {
        return 0.0;
    }
    let mut cross = 0.0;
    let mut head = 0.0;
    let mut tail = 0.0;
    for i in 0..frame.len() - lag {
        let a = frame[i] as f64;
        let b = frame[i + lag] as f64;
        cross += a * b;
        head += a * a;
        tail += b * b;
    }
    let energy = (head * tail).sqrt();
    if energy > 0.0 {
        cross / energy
    } else {
        0.0
    }
}
