use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use diphone_tts::{
    engines::diphone::{DiphoneEngine, DiphoneInferenceParams, DiphoneModelParams, PhonetizerKind},
    SynthesisEngine,
};

/// Speak a French sentence with a diphone voice.
#[derive(Parser)]
#[command(name = "diphone-say", version, long_about = None)]
struct Args {
    /// Sentence to synthesize
    text: String,

    /// Output WAV file
    #[arg(short, long, value_name = "FILE", default_value = "output.wav")]
    output: PathBuf,

    /// Fail on missing diphones instead of splicing independent phonemes
    #[arg(short = 'p', long)]
    never_use_phonemes: bool,

    /// Phonetize with espeak-ng/MBROLA instead of neural TTS + MAUS
    #[arg(short, long)]
    legacy_phonetizer: bool,

    /// Voice directory (reference WAV + TextGrid)
    #[arg(long, value_name = "DIR", default_value = "./diphones")]
    voice: PathBuf,

    /// Segmentation tier of the voice TextGrid
    #[arg(long, value_name = "NAME")]
    tier: Option<String>,

    /// Write the phoneme timings as JSON
    #[arg(long, value_name = "FILE")]
    timings: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let kind = if args.legacy_phonetizer {
        PhonetizerKind::Espeak
    } else {
        PhonetizerKind::Maus
    };
    let mut engine = DiphoneEngine::with_phonetizer(kind.build()?);

    let load_start = Instant::now();
    engine.load_model_with_params(&args.voice, DiphoneModelParams { tier: args.tier })?;
    log::info!("Voice loaded in {:.2?}", load_start.elapsed());

    let params = DiphoneInferenceParams {
        use_phonemes: !args.never_use_phonemes,
        ..Default::default()
    };

    let synth_start = Instant::now();
    let (result, timings) = engine.synthesize_with_timings(&args.text, Some(params))?;
    log::info!(
        "Synthesized {:.2}s audio in {:.2?}",
        result.duration_secs(),
        synth_start.elapsed()
    );

    result.write_wav(&args.output)?;
    println!("Saved to {}", args.output.display());

    if let Some(path) = &args.timings {
        std::fs::write(path, serde_json::to_string_pretty(&timings)?)?;
        println!("Timings saved to {}", path.display());
    }

    engine.unload_model();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
