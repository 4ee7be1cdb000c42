//! Neural TTS + MAUS forced-alignment phonetizer.
//!
//! The sentence is first spoken by an external neural TTS command. The
//! recording and its transcript are sent to the BAS `runMAUSBasic` web
//! service, which answers with a link to a TextGrid aligning the recording
//! phoneme by phoneme. Durations come from the alignment and pitch from the
//! TTS recording itself.

use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::{multipart::Form, Client};

use super::{units_from_intervals, Phonetizer};
use crate::audio::{PitchTrack, Sound};
use crate::engines::diphone::model::DiphoneError;
use crate::engines::diphone::phoneme::PhoneticUnit;
use crate::textgrid::read_interval_tier;

pub const MAUS_SERVICE_URL: &str =
    "https://clarin.phonetik.uni-muenchen.de/BASWebServices/services/runMAUSBasic";

static DOWNLOAD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<downloadLink>\s*([^<\s]+)\s*</downloadLink>").expect("valid regex"));

/// External neural TTS invocation:
/// `<program> --text <sentence> --model_name <model> --out_path <wav>`.
#[derive(Debug, Clone)]
pub struct TtsCommand {
    pub program: PathBuf,
    pub model_name: String,
}

impl Default for TtsCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tts"),
            model_name: "tts_models/fr/css10/vits".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MausConfig {
    pub service_url: String,
    /// MAUS language code.
    pub language: String,
    /// Alignment tier of the returned TextGrid.
    pub tier: String,
    pub tts: TtsCommand,
    /// Pitch analysis of the TTS recording: time step, floor, ceiling.
    pub pitch_time_step: f64,
    pub pitch_floor: f64,
    pub pitch_ceiling: f64,
}

impl Default for MausConfig {
    fn default() -> Self {
        Self {
            service_url: MAUS_SERVICE_URL.to_string(),
            language: "fra-FR".to_string(),
            tier: "MAU".to_string(),
            tts: TtsCommand::default(),
            pitch_time_step: 0.01,
            pitch_floor: 75.0,
            pitch_ceiling: 600.0,
        }
    }
}

pub struct MausPhonetizer {
    config: MausConfig,
    client: Client,
}

impl MausPhonetizer {
    pub fn new(config: MausConfig) -> Result<Self, DiphoneError> {
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    fn speak(&self, sentence: &str, wav_path: &Path) -> Result<(), DiphoneError> {
        let tts = &self.config.tts;
        log::info!("Running {} ({})", tts.program.display(), tts.model_name);

        let output = Command::new(&tts.program)
            .arg("--text")
            .arg(sentence)
            .arg("--model_name")
            .arg(&tts.model_name)
            .arg("--out_path")
            .arg(wav_path)
            .output()
            .map_err(|e| {
                DiphoneError::PhonetizerFailed(format!(
                    "cannot run {}: {e}",
                    tts.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiphoneError::PhonetizerFailed(format!(
                "{} exited with code {:?}: {stderr}",
                tts.program.display(),
                output.status.code()
            )));
        }
        Ok(())
    }

    /// Align the recording with its transcript and store the resulting
    /// TextGrid at `grid_path`.
    fn align(
        &self,
        wav_path: &Path,
        transcript_path: &Path,
        grid_path: &Path,
    ) -> Result<(), DiphoneError> {
        let form = Form::new()
            .file("SIGNAL", wav_path)?
            .file("TEXT", transcript_path)?
            .text("LANGUAGE", self.config.language.clone())
            .text("OUTFORMAT", "TextGrid");

        log::info!("Requesting alignment from {}", self.config.service_url);
        let response = self
            .client
            .post(&self.config.service_url)
            .multipart(form)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiphoneError::Collaborator(format!(
                "MAUS service answered {status}"
            )));
        }

        let body = response.text()?;
        let link = extract_download_link(&body).ok_or_else(|| {
            DiphoneError::Collaborator(format!("no download link in MAUS reply: {body}"))
        })?;

        log::debug!("Downloading alignment {link}");
        let response = self.client.get(link).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiphoneError::Collaborator(format!(
                "TextGrid download answered {status}"
            )));
        }

        std::fs::write(grid_path, response.bytes()?)?;
        Ok(())
    }

    /// Units of the alignment tier, with pitch measured on the recording.
    fn read_alignment(
        &self,
        grid_path: &Path,
        wav_path: &Path,
    ) -> Result<Vec<PhoneticUnit>, DiphoneError> {
        let intervals = read_interval_tier(grid_path, &self.config.tier)?;
        let sound = Sound::load(wav_path)?;
        let track = PitchTrack::from_sound(
            &sound,
            self.config.pitch_time_step,
            self.config.pitch_floor,
            self.config.pitch_ceiling,
        );
        Ok(units_from_intervals(&intervals, &track))
    }
}

impl Phonetizer for MausPhonetizer {
    fn phonetic(&mut self, sentence: &str) -> Result<Vec<PhoneticUnit>, DiphoneError> {
        let scratch = tempfile::Builder::new().prefix("diphone-maus").tempdir()?;
        let wav_path = scratch.path().join("output.wav");
        let transcript_path = scratch.path().join("output.txt");
        let grid_path = scratch.path().join("output.TextGrid");

        self.speak(sentence, &wav_path)?;
        std::fs::write(&transcript_path, sentence)?;
        self.align(&wav_path, &transcript_path, &grid_path)?;
        self.read_alignment(&grid_path, &wav_path)
    }
}

/// Download link of a MAUS XML reply.
pub fn extract_download_link(reply: &str) -> Option<&str> {
    DOWNLOAD_LINK
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
