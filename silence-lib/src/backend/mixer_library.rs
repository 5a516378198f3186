//! rodio mixer backend.
//!
//! Each second a fresh one-second silent source is added to the mixer, and
//! the loop wakes slightly early so consecutive sources overlap.

#[cfg(feature = "mixer-library")]
use std::thread;
#[cfg(feature = "mixer-library")]
use std::time::Duration;

#[cfg(feature = "mixer-library")]
use log::{debug, error, info, warn};
#[cfg(feature = "mixer-library")]
use rodio::buffer::SamplesBuffer;
#[cfg(feature = "mixer-library")]
use rodio::{OutputStream, OutputStreamBuilder};

use super::{Availability, BackendError, BackendKind, BackendProvider, SilenceBackend};
#[cfg(feature = "mixer-library")]
use crate::audio::{PcmFormat, SilenceBuffer, CHANNELS};
#[cfg(feature = "mixer-library")]
use crate::tools::sleep_while;

#[cfg(feature = "mixer-library")]
const SOUND_SECONDS: f64 = 1.0;
/// Fraction of a sound's length to wait before queueing the next one.
#[cfg(feature = "mixer-library")]
const OVERLAP_FACTOR: f64 = 0.9;
#[cfg(feature = "mixer-library")]
const OUTPUT_STREAM_OPEN_RETRIES: usize = 5;
#[cfg(feature = "mixer-library")]
const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;

#[cfg(feature = "mixer-library")]
fn replay_interval() -> Duration {
    Duration::from_secs_f64(SOUND_SECONDS * OVERLAP_FACTOR)
}

/// Open an output stream at `sample_rate` with bounded retry behavior.
///
/// Gives up early if a stop is requested between attempts.
#[cfg(feature = "mixer-library")]
fn open_output_stream_with_retry(
    sample_rate: u32,
    should_continue: &dyn Fn() -> bool,
) -> Result<OutputStream, BackendError> {
    let mut last_error = String::new();
    for attempt in 1..=OUTPUT_STREAM_OPEN_RETRIES {
        let opened = OutputStreamBuilder::from_default_device()
            .map(|builder| builder.with_sample_rate(sample_rate).with_channels(CHANNELS))
            .and_then(|builder| builder.open_stream_or_fallback());
        match opened {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                warn!(
                    "mixer stream attempt {}/{} failed: {}",
                    attempt, OUTPUT_STREAM_OPEN_RETRIES, err
                );
                last_error = err.to_string();
            }
        }
        if !should_continue() {
            break;
        }
        thread::sleep(Duration::from_millis(OUTPUT_STREAM_OPEN_RETRY_MS));
    }

    error!(
        "failed to open mixer output stream after {} attempts",
        OUTPUT_STREAM_OPEN_RETRIES
    );
    Err(BackendError::Runtime(format!(
        "cannot open mixer output stream: {}",
        last_error
    )))
}

/// Plays one-second silent sounds through rodio's mixer.
#[cfg(feature = "mixer-library")]
pub struct MixerLibraryBackend {
    sample_rate: u32,
}

#[cfg(feature = "mixer-library")]
impl MixerLibraryBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

#[cfg(feature = "mixer-library")]
impl SilenceBackend for MixerLibraryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MixerLibrary
    }

    fn run(&mut self, should_continue: &dyn Fn() -> bool) -> Result<(), BackendError> {
        let mut stream = open_output_stream_with_retry(self.sample_rate, should_continue)?;
        stream.log_on_drop(false);

        let silence = SilenceBuffer::seconds(PcmFormat::stereo_16(self.sample_rate), SOUND_SECONDS)
            .to_f32_samples();
        info!("Playing silence through the mixer at {}Hz", self.sample_rate);

        while should_continue() {
            stream
                .mixer()
                .add(SamplesBuffer::new(CHANNELS, self.sample_rate, silence.clone()));
            sleep_while(replay_interval(), should_continue);
        }

        drop(stream);
        debug!("mixer output stream closed");
        Ok(())
    }
}

/// Provider for the rodio mixer backend.
pub struct MixerLibraryProvider {
    sample_rate: u32,
}

impl MixerLibraryProvider {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl BackendProvider for MixerLibraryProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::MixerLibrary
    }

    #[cfg(feature = "mixer-library")]
    fn probe(&self) -> Availability {
        use rodio::cpal::traits::HostTrait;

        match rodio::cpal::default_host().default_output_device() {
            Some(_) => Availability::Available,
            None => Availability::Missing("no default output device for the mixer".to_string()),
        }
    }

    #[cfg(not(feature = "mixer-library"))]
    fn probe(&self) -> Availability {
        Availability::Missing("built without the `mixer-library` feature".to_string())
    }

    #[cfg(feature = "mixer-library")]
    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError> {
        if let Availability::Missing(reason) = self.probe() {
            return Err(BackendError::Unavailable(reason));
        }

        // The worker opens its own stream; this one only proves the mixer starts.
        let mut trial = open_output_stream_with_retry(self.sample_rate, &|| true)
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;
        trial.log_on_drop(false);
        drop(trial);
        debug!("trial mixer stream opened at {}Hz", self.sample_rate);

        Ok(Box::new(MixerLibraryBackend::new(self.sample_rate)))
    }

    #[cfg(not(feature = "mixer-library"))]
    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError> {
        let _ = self.sample_rate;
        Err(BackendError::Unavailable(
            "built without the `mixer-library` feature".to_string(),
        ))
    }
}
