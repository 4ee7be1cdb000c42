use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::{sample_fractions, Phonetizer};
use crate::engines::diphone::model::DiphoneError;
use crate::engines::diphone::phoneme::PhoneticUnit;

/// Where to find espeak-ng and which MBROLA voice drives it.
#[derive(Debug, Clone)]
pub struct EspeakConfig {
    /// espeak-ng binary. `None` uses `espeak-ng` from PATH.
    pub bin_path: Option<PathBuf>,
    /// espeak-ng data directory. `None` uses the built-in default.
    pub data_path: Option<PathBuf>,
    /// MBROLA voice; its phoneme set must match the reference voice labels.
    pub voice: String,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            bin_path: None,
            data_path: None,
            voice: "mb-fr1".to_string(),
        }
    }
}

/// Rule-based phonetizer reading espeak-ng's MBROLA phoneme output.
///
/// Each `.pho` line gives a SAMPA label, a duration in milliseconds and
/// optional `(position %, f0 Hz)` pitch targets.
#[derive(Debug, Clone, Default)]
pub struct EspeakPhonetizer {
    config: EspeakConfig,
}

impl EspeakPhonetizer {
    pub fn new(config: EspeakConfig) -> Self {
        Self { config }
    }
}

impl Phonetizer for EspeakPhonetizer {
    fn phonetic(&mut self, sentence: &str) -> Result<Vec<PhoneticUnit>, DiphoneError> {
        let pho = run_espeak(sentence, &self.config)?;
        Ok(parse_pho(&pho))
    }
}

fn run_espeak(input: &str, config: &EspeakConfig) -> Result<String, DiphoneError> {
    let program = config
        .bin_path
        .as_deref()
        .map(|p| p.as_os_str().to_owned())
        .unwrap_or_else(|| "espeak-ng".into());

    let mut command = Command::new(program);
    command.args(["-q", "--stdin", "--pho", "-v", &config.voice]);
    if let Some(data) = &config.data_path {
        command.arg(format!("--path={}", data.display()));
    }

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DiphoneError::EspeakNotFound
            } else {
                DiphoneError::Io(e)
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(canonicalize_stdin_payload(input).as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiphoneError::PhonetizerFailed(format!(
            "espeak-ng exited with code {:?}: {stderr}",
            output.status.code()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// espeak-ng reads stdin line by line; the last line needs its terminator.
fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Parse MBROLA `.pho` text.
pub fn parse_pho(pho: &str) -> Vec<PhoneticUnit> {
    pho.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let label = fields.next()?;
            let duration_ms: f64 = match fields.next().map(str::parse) {
                Some(Ok(ms)) => ms,
                _ => {
                    log::warn!("Skipping malformed .pho line {line:?}");
                    return None;
                }
            };

            let values: Vec<f64> = fields.filter_map(|f| f.parse().ok()).collect();
            let targets: Vec<(f64, f64)> = values.chunks_exact(2).map(|c| (c[0], c[1])).collect();

            Some(PhoneticUnit {
                label: label.to_string(),
                duration: duration_ms / 1000.0,
                pitch: sample_fractions()
                    .map(|f| interpolate_pitch(&targets, f * 100.0))
                    .collect(),
            })
        })
        .collect()
}

/// f0 at `position` percent of a phoneme from its `(position %, f0)` targets.
fn interpolate_pitch(targets: &[(f64, f64)], position: f64) -> Option<f64> {
    let (first, last) = (targets.first()?, targets.last()?);
    if position <= first.0 {
        return Some(first.1);
    }
    if position >= last.0 {
        return Some(last.1);
    }
    targets.windows(2).find_map(|w| {
        let ((p0, f0), (p1, f1)) = (w[0], w[1]);
        (position >= p0 && position <= p1).then(|| {
            if p1 > p0 {
                f0 + (f1 - f0) * (position - p0) / (p1 - p0)
            } else {
                f1
            }
        })
    })
}
