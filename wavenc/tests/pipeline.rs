use std::error::Error;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tempfile::tempdir;

use wavenc::codec::lame::LameEncoderFactory;
use wavenc::container::{PcmFormat, PcmWavBuilder, writer::pack_i16};
use wavenc::process::pipeline::{Pipeline, PipelineConfig};

/// A 440 Hz sine, mono, 16-bit.
fn tone(sample_rate: u32, duration_ms: u64) -> Vec<i16> {
    let total = sample_rate as u64 * duration_ms / 1_000;
    (0..total)
        .map(|n| {
            let theta = (n as f32 / sample_rate as f32) * 2.0 * std::f32::consts::PI * 440.0;
            (theta.sin() * i16::MAX as f32 * 0.5) as i16
        })
        .collect()
}

fn write_tone_wav(path: &Path, sample_rate: u32, duration_ms: u64) -> Result<(), Box<dyn Error>> {
    let samples = tone(sample_rate, duration_ms);
    PcmWavBuilder::new()
        .chunk(PcmFormat::new(1, sample_rate, 16), pack_i16(&samples))
        .write_to(File::create(path)?)?;
    Ok(())
}

/// Deterministic noise so the "random bytes" file never happens to look like RIFF.
fn noise(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn mp3_outputs(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut outputs: Vec<_> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "mp3"))
        .collect();
    outputs.sort();
    Ok(outputs)
}

/// Decodes `path` and returns (seconds, channels).
fn decode_mp3(path: &Path) -> Result<(f64, usize), Box<dyn Error>> {
    let mut hint = Hint::new();
    hint.with_extension("mp3");
    let mss = MediaSourceStream::new(Box::new(File::open(path)?), Default::default());
    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;
    let track = reader.default_track().ok_or("no audio track")?;
    let track_id = track.id;
    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut frames = 0u64;
    let mut channels = 0;
    let mut rate = 0;
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder.decode(&packet)?;
        let spec = decoded.spec();
        channels = spec.channels.count();
        rate = spec.rate;
        frames += decoded.frames() as u64;
    }

    if rate == 0 {
        return Err("no audio decoded".into());
    }
    Ok((frames as f64 / rate as f64, channels))
}

fn lame_pipeline(workers: usize) -> Pipeline {
    Pipeline::new(
        PipelineConfig::new(workers),
        Arc::new(LameEncoderFactory::default()),
    )
}

#[test]
fn valid_and_garbage_files_yield_one_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let good = dir.path().join("good.wav");
    let bad = dir.path().join("bad.wav");
    write_tone_wav(&good, 22_050, 300)?;
    fs::write(&bad, noise(4_096))?;

    let summary = lame_pipeline(2).run(vec![bad, good], None)?;

    assert_eq!(summary.files_discovered, 2);
    assert_eq!(summary.chunks_encoded, 1);
    assert_eq!(summary.files_without_chunks, 1);
    assert_eq!(mp3_outputs(dir.path())?, [dir.path().join("good.mp3")]);
    Ok(())
}

#[test]
fn multi_chunk_source_numbers_its_outputs() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("medley.wav");
    let stereo: Vec<i16> = tone(32_000, 200)
        .into_iter()
        .flat_map(|s| [s, s / 2])
        .collect();
    PcmWavBuilder::new()
        .chunk(PcmFormat::new(1, 16_000, 16), pack_i16(&tone(16_000, 200)))
        .chunk(PcmFormat::new(2, 32_000, 16), pack_i16(&stereo))
        .write_to(File::create(&source)?)?;

    let summary = lame_pipeline(1).run(vec![source], None)?;

    assert_eq!(summary.chunks_encoded, 2);
    assert_eq!(
        mp3_outputs(dir.path())?,
        [dir.path().join("medley.mp3"), dir.path().join("medley1.mp3")]
    );
    let (_, channels) = decode_mp3(&dir.path().join("medley1.mp3"))?;
    assert_eq!(channels, 2);
    Ok(())
}

#[test]
fn mono_round_trip_keeps_duration_and_channels() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("tone.wav");
    write_tone_wav(&source, 44_100, 1_000)?;

    lame_pipeline(1).run(vec![source], None)?;

    let (seconds, channels) = decode_mp3(&dir.path().join("tone.mp3"))?;
    assert_eq!(channels, 1);
    // Encoder delay and final frame padding add up to a few MPEG frames.
    assert!((seconds - 1.0).abs() < 0.15, "decoded {seconds:.3}s");
    Ok(())
}

#[test]
fn stop_request_before_dispatch_terminates() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let sources = (0..8)
        .map(|i| {
            let path = dir.path().join(format!("{i}.wav"));
            write_tone_wav(&path, 8_000, 50).map(|_| path)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pipeline = lame_pipeline(2);
    pipeline.stop_handle().request_stop();
    let summary = pipeline.run(sources, None)?;

    assert_eq!(summary.files_not_dispatched, 8);
    assert!(mp3_outputs(dir.path())?.is_empty());
    Ok(())
}
