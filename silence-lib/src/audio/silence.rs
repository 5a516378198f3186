//! Zero-amplitude PCM buffers.

use super::{CHANNELS, SAMPLE_WIDTH_BYTES};

/// Interleaved integer PCM layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub width_bytes: u16,
}

impl PcmFormat {
    /// 16-bit stereo at `sample_rate`, the layout every backend plays.
    pub fn stereo_16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: CHANNELS,
            width_bytes: SAMPLE_WIDTH_BYTES,
        }
    }

    /// Size of one frame (one sample for every channel) in bytes.
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.width_bytes as usize
    }
}

/// An immutable run of silent frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilenceBuffer {
    bytes: Vec<u8>,
    format: PcmFormat,
}

impl SilenceBuffer {
    /// Silence lasting `duration_seconds` in the given format.
    pub fn seconds(format: PcmFormat, duration_seconds: f64) -> Self {
        let frames = (format.sample_rate as f64 * duration_seconds).round() as usize;
        Self::frames(format, frames)
    }

    /// Silence holding exactly `frames` frames.
    pub fn frames(format: PcmFormat, frames: usize) -> Self {
        Self {
            bytes: silence_frames(frames, format.channels, format.width_bytes),
            format,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.bytes.len() / self.format.frame_bytes().max(1)
    }

    /// Decode the buffer as little-endian `i16` samples.
    ///
    /// Only meaningful for 16-bit formats.
    pub fn to_i16_samples(&self) -> Vec<i16> {
        self.bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Normalized `f32` samples for float-based mixers.
    pub fn to_f32_samples(&self) -> Vec<f32> {
        self.to_i16_samples()
            .into_iter()
            .map(|sample| sample as f32 / i16::MAX as f32)
            .collect()
    }
}

/// Build `duration_seconds` of silence as raw bytes.
///
/// The result holds `round(sample_rate * duration_seconds) * channels *
/// width_bytes` zero bytes.
pub fn make_silence(
    sample_rate: u32,
    channels: u16,
    width_bytes: u16,
    duration_seconds: f64,
) -> Vec<u8> {
    let format = PcmFormat {
        sample_rate,
        channels,
        width_bytes,
    };
    SilenceBuffer::seconds(format, duration_seconds).bytes
}

/// Build exactly `frames` frames of silence as raw bytes.
pub fn silence_frames(frames: usize, channels: u16, width_bytes: u16) -> Vec<u8> {
    vec![0u8; frames * channels as usize * width_bytes as usize]
}
