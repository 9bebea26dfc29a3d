//! Stereo WAV reading and writing.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::Result;

/// WAV format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample: 32 writes float, anything else integer PCM.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Deinterleaved stereo audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSamples {
    /// Left channel.
    pub left: Vec<f32>,
    /// Right channel.
    pub right: Vec<f32>,
}

impl StereoSamples {
    /// Pair two channels. The longer one is truncated to match.
    pub fn new(mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self { left, right }
    }

    /// Split `[L0, R0, L1, R1, ...]`. A trailing odd sample is dropped.
    pub fn from_interleaved(samples: &[f32]) -> Self {
        let (left, right) = samples.chunks_exact(2).map(|f| (f[0], f[1])).unzip();
        Self { left, right }
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Whether there are no frames.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Largest absolute sample on either channel.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |m, s| m.max(s.abs()))
    }
}

fn to_int(sample: f32, max_val: f32) -> i32 {
    (sample * max_val).clamp(-max_val, max_val - 1.0) as i32
}

/// Streams stereo blocks into a WAV file.
///
/// Used by the offline renderer so long renders never hold the whole
/// signal in memory. Call [`finalize`](Self::finalize) to write the header.
pub struct StereoWavWriter {
    writer: WavWriter<BufWriter<File>>,
    bits_per_sample: u16,
    frames: u64,
}

impl StereoWavWriter {
    /// Create the file. `spec.channels` is forced to 2.
    pub fn create<P: AsRef<Path>>(path: P, spec: WavSpec) -> Result<Self> {
        let spec = WavSpec { channels: 2, ..spec };
        let writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
        Ok(Self {
            writer,
            bits_per_sample: spec.bits_per_sample,
            frames: 0,
        })
    }

    /// Append one block. Extra samples on the longer channel are ignored.
    pub fn write_block(&mut self, left: &[f32], right: &[f32]) -> Result<()> {
        if self.bits_per_sample == 32 {
            for (&l, &r) in left.iter().zip(right) {
                self.writer.write_sample(l)?;
                self.writer.write_sample(r)?;
            }
        } else {
            let max_val = (1i32 << (self.bits_per_sample - 1)) as f32;
            for (&l, &r) in left.iter().zip(right) {
                self.writer.write_sample(to_int(l, max_val))?;
                self.writer.write_sample(to_int(r, max_val))?;
            }
        }
        self.frames += left.len().min(right.len()) as u64;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Flush and fix up the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl std::fmt::Debug for StereoWavWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StereoWavWriter")
            .field("bits_per_sample", &self.bits_per_sample)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/// Write stereo samples to a WAV file.
pub fn write_wav_stereo<P: AsRef<Path>>(
    path: P,
    samples: &StereoSamples,
    spec: WavSpec,
) -> Result<()> {
    let mut writer = StereoWavWriter::create(path, spec)?;
    writer.write_block(&samples.left, &samples.right)?;
    writer.finalize()
}

/// Read a WAV file as stereo.
///
/// Mono is duplicated to both channels; beyond two channels only the first
/// two are kept.
pub fn read_wav_stereo<P: AsRef<Path>>(path: P) -> Result<(StereoSamples, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let channels = usize::from(spec.channels.max(1));

    let all: Vec<f32> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let stereo = match channels {
        1 => StereoSamples {
            left: all.clone(),
            right: all,
        },
        2 => StereoSamples::from_interleaved(&all),
        _ => {
            let (left, right) = all.chunks_exact(channels).map(|f| (f[0], f[1])).unzip();
            StereoSamples { left, right }
        }
    };
    Ok((stereo, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn new_truncates_to_shorter_channel() {
        let s = StereoSamples::new(vec![1.0, 2.0, 3.0], vec![4.0, 5.0]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.left, vec![1.0, 2.0]);
    }

    #[test]
    fn interleaved_split() {
        let s = StereoSamples::from_interleaved(&[1.0, -1.0, 2.0, -2.0, 9.0]);
        assert_eq!(s.left, vec![1.0, 2.0]);
        assert_eq!(s.right, vec![-1.0, -2.0]);
        assert_eq!(s.peak(), 2.0);
    }

    #[test]
    fn float_roundtrip_is_exact() {
        let samples = StereoSamples::new(vec![0.5, -0.25, 0.0], vec![-0.5, 0.125, 1.0]);
        let file = NamedTempFile::new().unwrap();
        write_wav_stereo(file.path(), &samples, WavSpec::default()).unwrap();
        let (loaded, spec) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(spec.channels, 2);
        assert_eq!(loaded, samples);
    }

    #[test]
    fn int16_clamps_and_quantizes() {
        let samples = StereoSamples::new(vec![2.0, 0.5], vec![-2.0, -0.5]);
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            bits_per_sample: 16,
            ..WavSpec::default()
        };
        write_wav_stereo(file.path(), &samples, spec).unwrap();
        let (loaded, _) = read_wav_stereo(file.path()).unwrap();
        assert!(loaded.left[0] < 1.0 && loaded.left[0] > 0.999);
        assert_eq!(loaded.right[0], -1.0);
        assert!((loaded.left[1] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn incremental_writer_counts_frames() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = StereoWavWriter::create(file.path(), WavSpec::default()).unwrap();
        writer.write_block(&[0.1; 256], &[0.2; 256]).unwrap();
        writer.write_block(&[0.3; 100], &[0.4; 120]).unwrap();
        assert_eq!(writer.frames(), 356);
        writer.finalize().unwrap();

        let (loaded, _) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(loaded.len(), 356);
        assert_eq!(loaded.right[300], 0.4);
    }
}
