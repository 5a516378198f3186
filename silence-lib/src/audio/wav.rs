//! Temporary WAV staging for file-based players.

use std::io::{Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::SilenceBuffer;

const STAGED_PREFIX: &str = "play-silence-";
const STAGED_SUFFIX: &str = ".wav";

/// Write `silence` as a canonical 16-bit PCM WAV stream.
pub fn write_wav<W: Write + Seek>(writer: W, silence: &SilenceBuffer) -> hound::Result<()> {
    let format = silence.format();
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.width_bytes * 8,
        sample_format: hound::SampleFormat::Int,
    };

    let mut wav = hound::WavWriter::new(writer, spec)?;
    for sample in silence.to_i16_samples() {
        wav.write_sample(sample)?;
    }
    wav.finalize()
}

/// Stage `silence` in a fresh temporary WAV file.
///
/// The file is removed when the returned handle is dropped or closed.
///
/// # Arguments
/// * `silence` - 16-bit PCM buffer to stage.
/// * `dir` - Staging directory; the system temp dir when `None`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn stage_wav(silence: &SilenceBuffer, dir: Option<&Path>) -> hound::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGED_PREFIX).suffix(STAGED_SUFFIX);
    let mut staged = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    write_wav(&mut staged, silence)?;
    Ok(staged)
}
