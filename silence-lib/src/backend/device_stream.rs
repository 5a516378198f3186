//! Raw PCM stream backend.
//!
//! The stream itself sits behind [`PcmOutput`] so the write loop can run
//! against cpal in production and against a recording double in tests.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use super::{Availability, BackendError, BackendKind, BackendProvider, SilenceBackend};
use crate::audio::{PcmFormat, SilenceBuffer};

/// Pause between chunk writes to keep CPU usage down.
const WRITE_PAUSE: Duration = Duration::from_millis(1);

/// An open, blocking PCM output stream.
pub trait PcmOutput {
    /// Write interleaved little-endian 16-bit stereo frames.
    ///
    /// Returns the number of bytes accepted.
    fn write(&mut self, pcm: &[u8]) -> Result<usize, BackendError>;

    /// Flush and release the stream. Called exactly once.
    fn close(&mut self);
}

/// Opens the stream on the thread that will write to it.
///
/// Platform streams are often `!Send`, so the backend carries an opener
/// across the thread boundary rather than the stream.
pub trait PcmOutputOpener: Send {
    fn open(&self) -> Result<Box<dyn PcmOutput>, BackendError>;

    /// Human-readable target, used in log lines.
    fn describe(&self) -> String;
}

/// Closes the wrapped stream however the write loop exits.
struct OutputGuard {
    output: Box<dyn PcmOutput>,
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        self.output.close();
    }
}

/// Writes small silent chunks to one persistent output stream.
pub struct DeviceStreamBackend {
    opener: Box<dyn PcmOutputOpener>,
    format: PcmFormat,
    chunk_frames: usize,
}

impl DeviceStreamBackend {
    pub fn new(opener: Box<dyn PcmOutputOpener>, sample_rate: u32, chunk_frames: usize) -> Self {
        Self {
            opener,
            format: PcmFormat::stereo_16(sample_rate),
            chunk_frames,
        }
    }

    /// Like [`DeviceStreamBackend::new`], but first opens and closes the
    /// stream once on the calling thread.
    ///
    /// # Errors
    /// A stream that cannot be opened is reported as
    /// [`BackendError::Unavailable`], so selection can fall back.
    pub fn try_open(
        opener: Box<dyn PcmOutputOpener>,
        sample_rate: u32,
        chunk_frames: usize,
    ) -> Result<Self, BackendError> {
        let mut trial = opener.open().map_err(|err| {
            BackendError::Unavailable(format!("cannot open {}: {}", opener.describe(), err))
        })?;
        trial.close();
        debug!("trial open of {} succeeded", opener.describe());

        Ok(Self::new(opener, sample_rate, chunk_frames))
    }
}

impl SilenceBackend for DeviceStreamBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::DeviceStream
    }

    fn run(&mut self, should_continue: &dyn Fn() -> bool) -> Result<(), BackendError> {
        let mut guard = OutputGuard {
            output: self.opener.open()?,
        };
        let chunk = SilenceBuffer::frames(self.format, self.chunk_frames);
        info!(
            "Playing silence on {} at {}Hz, chunk size {}",
            self.opener.describe(),
            self.format.sample_rate,
            self.chunk_frames
        );

        while should_continue() {
            let written = guard.output.write(chunk.as_bytes())?;
            if written != chunk.len() {
                warn!(
                    "partial write ({}/{} frames)",
                    written / self.format.frame_bytes(),
                    self.chunk_frames
                );
            }
            thread::sleep(WRITE_PAUSE);
        }

        debug!("device stream loop finished");
        Ok(())
    }
}

/// Provider for [`DeviceStreamBackend`] backed by cpal.
pub struct DeviceStreamProvider {
    sample_rate: u32,
    chunk_frames: usize,
    device: Option<String>,
}

impl DeviceStreamProvider {
    /// # Arguments
    /// * `sample_rate` - Stream rate in Hz.
    /// * `chunk_frames` - Frames per write.
    /// * `device` - Output device name; the host default when `None`.
    pub fn new(sample_rate: u32, chunk_frames: usize, device: Option<String>) -> Self {
        Self {
            sample_rate,
            chunk_frames,
            device,
        }
    }
}

impl BackendProvider for DeviceStreamProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::DeviceStream
    }

    #[cfg(feature = "device-stream")]
    fn probe(&self) -> Availability {
        match super::cpal_output::find_output_device(self.device.as_deref()) {
            Ok(_) => Availability::Available,
            Err(err) => Availability::Missing(err.to_string()),
        }
    }

    #[cfg(not(feature = "device-stream"))]
    fn probe(&self) -> Availability {
        Availability::Missing("built without the `device-stream` feature".to_string())
    }

    #[cfg(feature = "device-stream")]
    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError> {
        let opener = super::cpal_output::CpalOpener::new(self.device.as_deref(), self.sample_rate)?;
        Ok(Box::new(DeviceStreamBackend::try_open(
            Box::new(opener),
            self.sample_rate,
            self.chunk_frames,
        )?))
    }

    #[cfg(not(feature = "device-stream"))]
    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError> {
        let _ = (self.sample_rate, self.chunk_frames, &self.device);
        Err(BackendError::Unavailable(
            "built without the `device-stream` feature".to_string(),
        ))
    }
}
