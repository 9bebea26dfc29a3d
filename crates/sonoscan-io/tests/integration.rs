//! Integration tests for sonoscan-io WAV output.

use sonoscan_io::{StereoSamples, StereoWavWriter, WavSpec, read_wav_stereo, write_wav_stereo};
use tempfile::{NamedTempFile, TempDir};

/// Left: sine, right: the same sine inverted.
fn stereo_sine(sample_rate: u32, freq_hz: f32, frames: usize) -> StereoSamples {
    let left: Vec<f32> = (0..frames)
        .map(|i| 0.5 * (std::f32::consts::TAU * freq_hz * i as f32 / sample_rate as f32).sin())
        .collect();
    let right = left.iter().map(|s| -s).collect();
    StereoSamples::new(left, right)
}

#[test]
fn stereo_roundtrip_keeps_channels_apart() {
    for sample_rate in [44100, 48000] {
        let samples = stereo_sine(sample_rate, 440.0, sample_rate as usize / 10);
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            sample_rate,
            ..WavSpec::default()
        };
        write_wav_stereo(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(loaded.len(), samples.len());
        for (a, b) in loaded.left.iter().zip(&loaded.right) {
            assert!((a + b).abs() < 1e-6);
        }
    }
}

#[test]
fn block_writer_matches_one_shot_writer() {
    let dir = TempDir::new().unwrap();
    let samples = stereo_sine(48000, 1000.0, 1000);

    let whole = dir.path().join("whole.wav");
    write_wav_stereo(&whole, &samples, WavSpec::default()).unwrap();

    let blocks = dir.path().join("blocks.wav");
    let mut writer = StereoWavWriter::create(&blocks, WavSpec::default()).unwrap();
    for (l, r) in samples.left.chunks(256).zip(samples.right.chunks(256)) {
        writer.write_block(l, r).unwrap();
    }
    writer.finalize().unwrap();

    assert_eq!(std::fs::read(whole).unwrap(), std::fs::read(blocks).unwrap());
}

#[test]
fn unreadable_file_is_a_wav_error() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"not a wav").unwrap();
    assert!(matches!(
        read_wav_stereo(file.path()),
        Err(sonoscan_io::Error::Wav(_))
    ));
}
