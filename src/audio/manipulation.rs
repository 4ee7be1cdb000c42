use super::{AudioError, PitchTrack, Sound};

/// Resolution of the time map used to apply a duration tier.
const TIME_MAP_STEP: f64 = 0.001;

/// Smallest local duration factor honoured by resynthesis.
const MIN_DURATION_FACTOR: f64 = 1e-3;

/// A sparse control curve of `(time, value)` points kept sorted by time.
///
/// Values are linearly interpolated between points and held constant
/// before the first and after the last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tier {
    points: Vec<(f64, f64)>,
}

impl Tier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, time: f64, value: f64) {
        let idx = self.points.partition_point(|&(t, _)| t <= time);
        self.points.insert(idx, (time, value));
    }

    /// Remove every point with `from <= time <= to`.
    pub fn remove_points_between(&mut self, from: f64, to: f64) {
        self.points.retain(|&(t, _)| t < from || t > to);
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, time: f64) -> Option<f64> {
        let (first, last) = (self.points.first()?, self.points.last()?);
        if time <= first.0 {
            return Some(first.1);
        }
        if time >= last.0 {
            return Some(last.1);
        }
        let idx = self.points.partition_point(|&(t, _)| t <= time);
        let (t0, v0) = self.points[idx - 1];
        let (t1, v1) = self.points[idx];
        if t1 - t0 <= f64::EPSILON {
            return Some(v1);
        }
        Some(v0 + (v1 - v0) * (time - t0) / (t1 - t0))
    }
}

/// One analysis pitch mark.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pulse {
    time: f64,
    period: f64,
    voiced: bool,
}

/// A sound prepared for pitch and duration editing.
///
/// The source is cut into pitch-synchronous grains around analysis pulses;
/// [`Manipulation::overlap_add`] lays those grains out again following the
/// pitch tier (grain spacing) and the duration tier (local time stretch).
#[derive(Debug, Clone)]
pub struct Manipulation {
    sound: Sound,
    pulses: Vec<Pulse>,
    pitch_tier: Tier,
    duration_tier: Tier,
}

impl Manipulation {
    /// Analyse `sound` with a pitch range of `floor..ceiling` Hz.
    ///
    /// The initial pitch tier holds the measured f0 of every voiced frame;
    /// the initial duration tier is empty (no time stretch).
    pub fn from_sound(sound: Sound, time_step: f64, floor: f64, ceiling: f64) -> Self {
        let track = PitchTrack::from_sound(&sound, time_step, floor, ceiling);

        let mut pitch_tier = Tier::new();
        for (i, f0) in track.frames().iter().enumerate() {
            if let Some(f0) = f0 {
                pitch_tier.add_point(track.frame_time(i), *f0);
            }
        }

        let pulses = place_pulses(&track, sound.duration(), time_step);
        log::debug!(
            "Manipulation: {:.3}s, {} pulses, {} pitch points",
            sound.duration(),
            pulses.len(),
            pitch_tier.len()
        );

        Self {
            sound,
            pulses,
            pitch_tier,
            duration_tier: Tier::new(),
        }
    }

    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    /// Copy of the current pitch tier.
    pub fn extract_pitch_tier(&self) -> Tier {
        self.pitch_tier.clone()
    }

    /// Copy of the current duration tier.
    pub fn extract_duration_tier(&self) -> Tier {
        self.duration_tier.clone()
    }

    pub fn replace_pitch_tier(&mut self, tier: Tier) {
        self.pitch_tier = tier;
    }

    pub fn replace_duration_tier(&mut self, tier: Tier) {
        self.duration_tier = tier;
    }

    /// Render the manipulated sound with TD-PSOLA.
    ///
    /// An empty pitch tier keeps the source periods, an empty duration tier
    /// keeps the source timing.
    pub fn overlap_add(&self) -> Result<Sound, AudioError> {
        let rate = self.sound.sample_rate() as f64;
        let source = self.sound.samples();
        if source.is_empty() || self.pulses.is_empty() {
            return Ok(self.sound.clone());
        }

        let time_map = TimeMap::new(&self.duration_tier, self.sound.duration());
        let total = time_map.output_duration();
        if !total.is_finite() || total <= 0.0 {
            return Err(AudioError::Resynthesis(format!(
                "invalid output duration {total}"
            )));
        }

        let out_len = (total * rate).round() as usize;
        let mut output = vec![0.0f32; out_len];
        let mut weight = vec![0.0f32; out_len];

        let mut t_out = 0.0;
        while t_out < total {
            let t_in = time_map.source_time(t_out);
            let pulse = self.nearest_pulse(t_in);

            let target_period = if pulse.voiced {
                match self.pitch_tier.value_at(t_in) {
                    Some(f0) if f0 > 0.0 => 1.0 / f0,
                    _ => pulse.period,
                }
            } else {
                pulse.period
            };

            let half = ((pulse.period * rate).round() as isize).max(1);
            let center_in = (pulse.time * rate).round() as isize;
            let center_out = (t_out * rate).round() as isize;
            for j in -half..=half {
                let src = center_in + j;
                let dst = center_out + j;
                if src < 0 || dst < 0 || src as usize >= source.len() || dst as usize >= out_len {
                    continue;
                }
                let w = 0.5
                    * (1.0 + (std::f64::consts::PI * j as f64 / half as f64).cos()) as f32;
                output[dst as usize] += source[src as usize] * w;
                weight[dst as usize] += w;
            }

            t_out += target_period.max(1.0 / rate);
        }

        for (sample, w) in output.iter_mut().zip(&weight) {
            *sample /= w.max(1.0);
        }

        Ok(Sound::new(output, self.sound.sample_rate()))
    }

    fn nearest_pulse(&self, time: f64) -> Pulse {
        let idx = self.pulses.partition_point(|p| p.time < time);
        match (idx.checked_sub(1).map(|i| self.pulses[i]), self.pulses.get(idx)) {
            (Some(before), Some(after)) => {
                if time - before.time <= after.time - time {
                    before
                } else {
                    *after
                }
            }
            (Some(before), None) => before,
            (None, Some(after)) => *after,
            (None, None) => unreachable!("pulses are never empty here"),
        }
    }
}

/// Pitch marks one period apart in voiced regions, one time step apart
/// elsewhere.
fn place_pulses(track: &PitchTrack, duration: f64, time_step: f64) -> Vec<Pulse> {
    let mut pulses = Vec::new();
    let mut t = 0.0;
    while t < duration {
        let pulse = match track.value_at(t) {
            Some(f0) if f0 > 0.0 => Pulse {
                time: t,
                period: 1.0 / f0,
                voiced: true,
            },
            _ => Pulse {
                time: t,
                period: time_step,
                voiced: false,
            },
        };
        t += pulse.period;
        pulses.push(pulse);
    }
    pulses
}

/// Cumulative source-to-output time map derived from a duration tier.
struct TimeMap {
    step: f64,
    output: Vec<f64>,
    duration: f64,
}

impl TimeMap {
    fn new(tier: &Tier, duration: f64) -> Self {
        let factor = |t: f64| tier.value_at(t).unwrap_or(1.0).max(MIN_DURATION_FACTOR);
        let steps = (duration / TIME_MAP_STEP).ceil().max(1.0) as usize;
        let step = duration / steps as f64;

        let mut output = Vec::with_capacity(steps + 1);
        output.push(0.0);
        let mut acc = 0.0;
        for k in 0..steps {
            let (a, b) = (k as f64 * step, (k + 1) as f64 * step);
            acc += 0.5 * (factor(a) + factor(b)) * step;
            output.push(acc);
        }

        Self {
            step,
            output,
            duration,
        }
    }

    fn output_duration(&self) -> f64 {
        self.output.last().copied().unwrap_or(0.0)
    }

    /// Invert the map: the source time that lands at `t_out`.
    fn source_time(&self, t_out: f64) -> f64 {
        let idx = self.output.partition_point(|&t| t <= t_out);
        if idx == 0 {
            return 0.0;
        }
        if idx >= self.output.len() {
            return self.duration;
        }
        let (o0, o1) = (self.output[idx - 1], self.output[idx]);
        let frac = if o1 > o0 { (t_out - o0) / (o1 - o0) } else { 0.0 };
        ((idx - 1) as f64 + frac) * self.step
    }
}
