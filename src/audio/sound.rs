use std::path::Path;

use super::AudioError;

/// A mono audio buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Sound {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A buffer of zeros lasting `duration` seconds.
    pub fn silence(duration: f64, sample_rate: u32) -> Self {
        let len = (duration.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Load a WAV file, converting integer PCM to `[-1, 1]` floats and
    /// averaging channels down to mono.
    pub fn load(path: &Path) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect()
        };

        log::debug!(
            "Loaded {} ({} samples @ {} Hz, {} channel(s))",
            path.display(),
            samples.len(),
            spec.sample_rate,
            channels
        );

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Save as a 16-bit PCM WAV file.
    pub fn save(&self, path: &Path) -> Result<(), AudioError> {
        write_pcm16(path, &self.samples, self.sample_rate)?;
        Ok(())
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Nearest sample index for a time, clamped to the buffer.
    pub fn index_at(&self, time: f64) -> usize {
        let idx = (time * self.sample_rate as f64).round();
        if idx <= 0.0 {
            0
        } else {
            (idx as usize).min(self.samples.len())
        }
    }

    /// Copy the samples between `start` and `end` (seconds).
    ///
    /// `end` is clamped to the duration; a reversed range or a start past the
    /// end of the sound is an error.
    pub fn extract_part(&self, start: f64, end: f64) -> Result<Sound, AudioError> {
        let duration = self.duration();
        if !start.is_finite() || !end.is_finite() || end < start || start > duration {
            return Err(AudioError::InvalidRange {
                start,
                end,
                duration,
            });
        }

        let from = self.index_at(start);
        let to = self.index_at(end).max(from);
        Ok(Self::new(self.samples[from..to].to_vec(), self.sample_rate))
    }

    /// Return a new sound made of `self` followed by `other`.
    pub fn concatenate(&self, other: &Sound) -> Result<Sound, AudioError> {
        let mut joined = self.clone();
        joined.append(other)?;
        Ok(joined)
    }

    /// Append `other` in place.
    pub fn append(&mut self, other: &Sound) -> Result<(), AudioError> {
        if self.sample_rate != other.sample_rate {
            return Err(AudioError::SampleRateMismatch {
                left: self.sample_rate,
                right: other.sample_rate,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Write mono samples as a 16-bit PCM WAV file.
pub(crate) fn write_pcm16(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, sample_rate: u32) -> Sound {
        Sound::new((0..len).map(|i| i as f32 / len as f32).collect(), sample_rate)
    }

    #[test]
    fn extract_part_cuts_on_sample_boundaries() {
        let sound = ramp(1000, 1000);
        let part = sound.extract_part(0.1, 0.35).unwrap();
        assert_eq!(part.len(), 250);
        assert_eq!(part.samples()[0], sound.samples()[100]);
    }

    #[test]
    fn extract_part_clamps_end() {
        let sound = ramp(1000, 1000);
        let part = sound.extract_part(0.9, 5.0).unwrap();
        assert_eq!(part.len(), 100);
    }

    #[test]
    fn extract_part_rejects_reversed_range() {
        let sound = ramp(1000, 1000);
        assert!(matches!(
            sound.extract_part(0.5, 0.2),
            Err(AudioError::InvalidRange { .. })
        ));
        assert!(sound.extract_part(2.0, 3.0).is_err());
    }

    #[test]
    fn concatenate_requires_same_rate() {
        let a = Sound::silence(0.1, 16_000);
        let b = Sound::silence(0.2, 16_000);
        let joined = a.concatenate(&b).unwrap();
        assert!((joined.duration() - 0.3).abs() < 1e-9);

        let c = Sound::silence(0.1, 8_000);
        assert!(matches!(
            a.concatenate(&c),
            Err(AudioError::SampleRateMismatch { .. })
        ));
    }

    #[test]
    fn save_and_load_pcm16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let sound = Sound::new(vec![0.0, 0.5, -0.5, 1.0], 22_050);
        sound.save(&path).unwrap();

        let loaded = Sound::load(&path).unwrap();
        assert_eq!(loaded.sample_rate(), 22_050);
        assert_eq!(loaded.len(), 4);
        for (a, b) in loaded.samples().iter().zip(sound.samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }
}
