//! PCM helpers: silence generation and WAV staging.

pub mod silence;
pub mod wav;

pub use silence::{make_silence, silence_frames, PcmFormat, SilenceBuffer};

/// Every backend plays interleaved stereo.
pub const CHANNELS: u16 = 2;

/// Signed 16-bit samples.
pub const SAMPLE_WIDTH_BYTES: u16 = 2;
