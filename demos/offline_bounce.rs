//! Bounce an ascending quarter-tone octave from C4 to a WAV file.
//!
//! Run with: cargo run --example offline_bounce

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use quartertone::{
    dsp::{Adsr, Waveform},
    io::{keyboard, OfflineBackend},
    EngineConfig, Synth,
};

const SAMPLE_RATE: u32 = 48_000;
const NOTE_SECONDS: f32 = 0.25;

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let config = EngineConfig::default()
        .waveform(Waveform::Triangle)
        .adsr(Adsr::new(0.005, 0.05, 0.6, 0.1));
    let mut synth = Synth::new(OfflineBackend::new(SAMPLE_RATE as f32, 1), config);
    synth.start()?;

    // One octave of the grid: 25 quarter-tone steps from C4 up to C5.
    let mut audio = Vec::new();
    for index in 0..=24 {
        let (note, quarter_step) = keyboard::note_for_index(index);
        let (label, _) = keyboard::label_for_index(index);
        let key = index.to_string();

        synth.note_on(note, quarter_step, &key)?;
        audio.extend(render(&mut synth, NOTE_SECONDS * 0.8)?);
        synth.note_off(&key)?;
        audio.extend(render(&mut synth, NOTE_SECONDS * 0.2)?);
        println!("{label:>4}  {:.2} Hz", quartertone::tuning::frequency(note, quarter_step, 0));
    }
    audio.extend(render(&mut synth, 0.5)?);

    let path = std::env::temp_dir().join("quartertone_scale.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;
    for &sample in &audio {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    println!("Rendered {} samples to {}", audio.len(), path.display());
    Ok(())
}

fn render(synth: &mut Synth<OfflineBackend>, seconds: f32) -> EyreResult<Vec<f32>> {
    let stream = synth
        .stream_mut()
        .ok_or_else(|| color_eyre::eyre::eyre!("synth is not started"))?;
    Ok(stream.render_seconds(seconds)?)
}
