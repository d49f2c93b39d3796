use assert_cmd::Command;
use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

/// Writes a mono 16-bit PCM WAV holding a 440 Hz tone.
fn write_test_tone<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    duration_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let total_samples = (sample_rate as u64 * duration_ms).div_ceil(1_000);
    let mut samples = Vec::with_capacity(total_samples as usize * 2);

    for n in 0..total_samples {
        let theta = (n as f32 / sample_rate as f32) * 2.0 * std::f32::consts::PI * 440.0;
        let sample = (theta.sin() * i16::MAX as f32 * 0.5) as i16;
        samples.extend_from_slice(&sample.to_le_bytes());
    }

    let mut file = File::create(path)?;
    let data_len = samples.len() as u32;
    file.write_all(b"RIFF")?;
    file.write_all(&(36u32 + data_len).to_le_bytes())?;
    file.write_all(b"WAVE")?;
    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?; // PCM header size
    file.write_all(&1u16.to_le_bytes())?; // audio format = PCM
    file.write_all(&1u16.to_le_bytes())?; // channels
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&(sample_rate * 2).to_le_bytes())?;
    file.write_all(&2u16.to_le_bytes())?; // block align
    file.write_all(&16u16.to_le_bytes())?; // bits per sample
    file.write_all(b"data")?;
    file.write_all(&data_len.to_le_bytes())?;
    file.write_all(&samples)?;
    Ok(())
}

fn wav2mp3() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("wav2mp3")?)
}

#[test]
fn missing_argument_exits_with_one() -> Result<(), Box<dyn Error>> {
    wav2mp3()?.assert().code(1);
    Ok(())
}

#[test]
fn help_exits_with_zero() -> Result<(), Box<dyn Error>> {
    wav2mp3()?.arg("--help").assert().success();
    Ok(())
}

#[test]
fn missing_folder_exits_with_one() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    wav2mp3()?
        .arg(dir.path().join("does-not-exist"))
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn folder_without_wav_files_exits_with_one() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("readme.txt"), "not audio")?;
    wav2mp3()?.arg(dir.path()).assert().code(1);
    Ok(())
}

#[test]
fn converts_folder_and_skips_garbage() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    write_test_tone(dir.path().join("tone.WAV"), 8_000, 400)?;
    fs::write(dir.path().join("junk.wav"), [0x13u8; 512])?;

    wav2mp3()?
        .args(["--jobs", "2", "--loglevel", "warn"])
        .arg(dir.path())
        .assert()
        .success();

    let tone = fs::metadata(dir.path().join("tone.mp3"))?;
    assert!(tone.len() > 0);
    assert!(!dir.path().join("junk.mp3").exists());
    Ok(())
}

#[test]
fn output_dir_and_report() -> Result<(), Box<dyn Error>> {
    let input = tempdir()?;
    let output = tempdir()?;
    write_test_tone(input.path().join("a.wav"), 16_000, 200)?;
    write_test_tone(input.path().join("b.wav"), 16_000, 200)?;
    let report = output.path().join("report.yaml");

    wav2mp3()?
        .arg("--output-dir")
        .arg(output.path())
        .arg("--report")
        .arg(&report)
        .args(["--quality", "9", "--log-format", "json"])
        .arg(input.path())
        .assert()
        .success();

    assert!(output.path().join("a.mp3").exists());
    assert!(output.path().join("b.mp3").exists());
    assert!(!input.path().join("a.mp3").exists());

    let yaml = fs::read_to_string(&report)?;
    assert!(yaml.contains("discovered: 2"));
    assert!(yaml.contains("encoded: 2"));
    Ok(())
}
