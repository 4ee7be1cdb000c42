use super::Sound;

/// Instants where the waveform rises through zero.
#[derive(Debug, Clone, Default)]
pub struct ZeroCrossings {
    times: Vec<f64>,
}

impl ZeroCrossings {
    /// Collect the rising zero crossings of a sound, linearly interpolated
    /// between the two samples that straddle zero.
    pub fn rising(sound: &Sound) -> Self {
        let rate = sound.sample_rate() as f64;
        let times = sound
            .samples()
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                let (a, b) = (pair[0] as f64, pair[1] as f64);
                if a <= 0.0 && b > 0.0 {
                    let frac = -a / (b - a);
                    Some((i as f64 + frac) / rate)
                } else {
                    None
                }
            })
            .collect();
        Self { times }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The crossing closest to `time`. A sound without crossings leaves the
    /// time untouched.
    pub fn nearest(&self, time: f64) -> f64 {
        let idx = self.times.partition_point(|&t| t < time);
        let after = self.times.get(idx).copied();
        let before = idx.checked_sub(1).and_then(|i| self.times.get(i)).copied();

        match (before, after) {
            (Some(b), Some(a)) => {
                if time - b <= a - time {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => time,
        }
    }
}
