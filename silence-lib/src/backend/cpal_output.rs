//! cpal-backed [`PcmOutput`].
//!
//! cpal pulls samples from a callback, so writes land in a ring buffer that
//! the callback drains. A full ring makes `write` block, which paces the
//! loop at the device's playback rate.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{debug, warn};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::{BackendError, PcmOutput, PcmOutputOpener};
use crate::audio::CHANNELS;

/// Ring capacity as a fraction of one second (100 ms).
const RING_DIVISOR: usize = 10;
const PUSH_RETRY: Duration = Duration::from_millis(1);
/// A write that makes no progress for this long means the device is gone.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

type StreamFailure = Arc<Mutex<Option<String>>>;

/// Resolve an output device by name, or the host default.
pub(super) fn find_output_device(name: Option<&str>) -> Result<cpal::Device, BackendError> {
    let host = cpal::default_host();
    match name {
        None | Some("default") => host
            .default_output_device()
            .ok_or_else(|| BackendError::Unavailable("no default output device".to_string())),
        Some(name) => {
            let mut devices = host.output_devices().map_err(|err| {
                BackendError::Unavailable(format!("cannot enumerate output devices: {}", err))
            })?;
            devices
                .find(|device| device.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| {
                    BackendError::Unavailable(format!("output device `{}` not found", name))
                })
        }
    }
}

pub(super) fn list_output_devices() -> Result<Vec<String>, BackendError> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(|err| {
        BackendError::Unavailable(format!("cannot enumerate output devices: {}", err))
    })?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

/// Pick a stereo configuration at `sample_rate`, preferring integer samples.
fn pick_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<(StreamConfig, SampleFormat), BackendError> {
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|err| {
            BackendError::Unavailable(format!("cannot query output configurations: {}", err))
        })?
        .filter(|range| {
            range.channels() == CHANNELS
                && range.min_sample_rate().0 <= sample_rate
                && range.max_sample_rate().0 >= sample_rate
        })
        .collect();

    for format in [SampleFormat::I16, SampleFormat::F32, SampleFormat::U16] {
        if let Some(range) = ranges.iter().find(|range| range.sample_format() == format) {
            let supported = range
                .clone()
                .with_sample_rate(cpal::SampleRate(sample_rate));
            return Ok((supported.config(), format));
        }
    }

    Err(BackendError::Unavailable(format!(
        "device offers no stereo {}Hz output configuration",
        sample_rate
    )))
}

/// Resolved device and configuration; opens a fresh stream per `run`.
pub(super) struct CpalOpener {
    device: cpal::Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    label: String,
}

impl CpalOpener {
    pub(super) fn new(device_name: Option<&str>, sample_rate: u32) -> Result<Self, BackendError> {
        let device = find_output_device(device_name)?;
        let (config, sample_format) = pick_config(&device, sample_rate)?;
        let label = device
            .name()
            .unwrap_or_else(|_| device_name.unwrap_or("default").to_string());
        debug!(
            "device stream config for {}: {:?} {:?}",
            label, config, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            label,
        })
    }
}

impl PcmOutputOpener for CpalOpener {
    fn open(&self) -> Result<Box<dyn PcmOutput>, BackendError> {
        let capacity = (self.config.sample_rate.0 as usize / RING_DIVISOR).max(1) * CHANNELS as usize;
        let (producer, consumer) = HeapRb::<i16>::new(capacity).split();
        let failure: StreamFailure = Arc::new(Mutex::new(None));

        let stream = match self.sample_format {
            SampleFormat::I16 => {
                build_stream::<i16>(&self.device, &self.config, consumer, failure.clone())?
            }
            SampleFormat::F32 => {
                build_stream::<f32>(&self.device, &self.config, consumer, failure.clone())?
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&self.device, &self.config, consumer, failure.clone())?
            }
            other => {
                return Err(BackendError::Unavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|err| BackendError::Runtime(format!("failed to start stream: {}", err)))?;

        Ok(Box::new(CpalOutput {
            stream,
            producer,
            failure,
            closed: false,
        }))
    }

    fn describe(&self) -> String {
        format!("output device `{}`", self.label)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: HeapCons<i16>,
    failure: StreamFailure,
) -> Result<Stream, BackendError>
where
    T: SizedSample + FromSample<i16> + Send + 'static,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for sample in data.iter_mut() {
                    *sample = T::from_sample(consumer.try_pop().unwrap_or(0));
                }
            },
            move |err| {
                warn!("output stream error: {}", err);
                *failure.lock().unwrap() = Some(err.to_string());
            },
            None,
        )
        .map_err(|err| BackendError::Runtime(format!("failed to build output stream: {}", err)))
}

struct CpalOutput {
    stream: Stream,
    producer: HeapProd<i16>,
    failure: StreamFailure,
    closed: bool,
}

impl CpalOutput {
    fn check_failure(&self) -> Result<(), BackendError> {
        match self.failure.lock().unwrap().as_ref() {
            Some(err) => Err(BackendError::Runtime(err.clone())),
            None => Ok(()),
        }
    }
}

impl PcmOutput for CpalOutput {
    fn write(&mut self, pcm: &[u8]) -> Result<usize, BackendError> {
        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        let mut offset = 0;
        let mut last_progress = Instant::now();
        while offset < samples.len() {
            self.check_failure()?;
            let pushed = self.producer.push_slice(&samples[offset..]);
            if pushed > 0 {
                offset += pushed;
                last_progress = Instant::now();
                continue;
            }
            if last_progress.elapsed() >= STALL_TIMEOUT {
                return Err(BackendError::Runtime(format!(
                    "output stream stalled for {}s",
                    STALL_TIMEOUT.as_secs()
                )));
            }
            thread::sleep(PUSH_RETRY);
        }

        Ok(offset * 2)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let started = Instant::now();
        while !self.producer.is_empty()
            && self.check_failure().is_ok()
            && started.elapsed() < DRAIN_TIMEOUT
        {
            thread::sleep(PUSH_RETRY);
        }

        if let Err(err) = self.stream.pause() {
            debug!("pausing output stream failed: {}", err);
        }
        debug!("output stream closed");
    }
}
