//! Test doubles for providers, backends and PCM streams.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::backend::{
    Availability, BackendError, BackendKind, BackendProvider, DeviceStreamBackend, PcmOutput,
    PcmOutputOpener, SilenceBackend,
};

/// Records which providers were probed and constructed, in order.
#[derive(Clone, Default)]
pub(crate) struct ProviderLog {
    probed: Arc<Mutex<Vec<BackendKind>>>,
    constructed: Arc<Mutex<Vec<BackendKind>>>,
}

impl ProviderLog {
    pub(crate) fn probed(&self) -> Vec<BackendKind> {
        self.probed.lock().unwrap().clone()
    }

    pub(crate) fn constructed(&self) -> Vec<BackendKind> {
        self.constructed.lock().unwrap().clone()
    }
}

#[derive(Clone, Copy)]
enum ProviderMode {
    Available,
    Missing,
    /// Probes fine, then reports absence from `construct`.
    Vanishing,
    /// Probes fine, then fails construction for a non-absence reason.
    Broken,
}

pub(crate) struct MockProvider {
    kind: BackendKind,
    mode: ProviderMode,
    log: ProviderLog,
}

impl MockProvider {
    pub(crate) fn available(kind: BackendKind, log: ProviderLog) -> Self {
        Self {
            kind,
            mode: ProviderMode::Available,
            log,
        }
    }

    pub(crate) fn missing(kind: BackendKind, log: ProviderLog) -> Self {
        Self {
            kind,
            mode: ProviderMode::Missing,
            log,
        }
    }

    pub(crate) fn vanishing(kind: BackendKind, log: ProviderLog) -> Self {
        Self {
            kind,
            mode: ProviderMode::Vanishing,
            log,
        }
    }

    pub(crate) fn broken(kind: BackendKind, log: ProviderLog) -> Self {
        Self {
            kind,
            mode: ProviderMode::Broken,
            log,
        }
    }
}

impl BackendProvider for MockProvider {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn probe(&self) -> Availability {
        self.log.probed.lock().unwrap().push(self.kind);
        match self.mode {
            ProviderMode::Missing => Availability::Missing(format!("{} simulated absent", self.kind)),
            _ => Availability::Available,
        }
    }

    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError> {
        match self.mode {
            ProviderMode::Available => {
                self.log.constructed.lock().unwrap().push(self.kind);
                Ok(Box::new(IdleBackend::new(self.kind)))
            }
            ProviderMode::Missing | ProviderMode::Vanishing => Err(BackendError::Unavailable(
                format!("{} vanished", self.kind),
            )),
            ProviderMode::Broken => Err(BackendError::Runtime(format!(
                "{} misconfigured",
                self.kind
            ))),
        }
    }
}

/// Loops until asked to stop, checking every few milliseconds.
pub(crate) struct IdleBackend {
    kind: BackendKind,
}

impl IdleBackend {
    pub(crate) fn new(kind: BackendKind) -> Self {
        Self { kind }
    }
}

impl SilenceBackend for IdleBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn run(&mut self, should_continue: &dyn Fn() -> bool) -> Result<(), BackendError> {
        while should_continue() {
            thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

/// Blocks for a fixed time without looking at the stop flag.
pub(crate) struct StubbornBackend {
    pub(crate) block_for: Duration,
}

impl SilenceBackend for StubbornBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ExternalProcess
    }

    fn run(&mut self, _should_continue: &dyn Fn() -> bool) -> Result<(), BackendError> {
        thread::sleep(self.block_for);
        Ok(())
    }
}

/// Fails immediately, as a backend whose device disappeared would.
pub(crate) struct FailingBackend;

impl SilenceBackend for FailingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::DeviceStream
    }

    fn run(&mut self, _should_continue: &dyn Fn() -> bool) -> Result<(), BackendError> {
        Err(BackendError::Runtime("device disconnected".to_string()))
    }
}

#[derive(Default)]
struct StreamRecord {
    writes: Vec<Vec<u8>>,
    closes: usize,
    fail_after: Option<usize>,
}

/// Shared view of everything written to a simulated PCM stream.
#[derive(Clone, Default)]
pub(crate) struct RecordedStream {
    record: Arc<Mutex<StreamRecord>>,
}

impl RecordedStream {
    /// A stream whose writes fail once `writes` chunks were accepted.
    pub(crate) fn failing_after(writes: usize) -> Self {
        let stream = Self::default();
        stream.record.lock().unwrap().fail_after = Some(writes);
        stream
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.record.lock().unwrap().writes.clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.record.lock().unwrap().closes
    }
}

struct RecordingOutput {
    stream: RecordedStream,
}

impl PcmOutput for RecordingOutput {
    fn write(&mut self, pcm: &[u8]) -> Result<usize, BackendError> {
        let mut record = self.stream.record.lock().unwrap();
        if record.fail_after == Some(record.writes.len()) {
            return Err(BackendError::Runtime("simulated device error".to_string()));
        }
        record.writes.push(pcm.to_vec());
        Ok(pcm.len())
    }

    fn close(&mut self) {
        self.stream.record.lock().unwrap().closes += 1;
    }
}

/// Opens [`RecordingOutput`]s onto a shared [`RecordedStream`].
pub(crate) struct RecordingOpener {
    stream: RecordedStream,
    refuse: bool,
}

impl RecordingOpener {
    pub(crate) fn new(stream: RecordedStream) -> Self {
        Self {
            stream,
            refuse: false,
        }
    }

    pub(crate) fn refusing(stream: RecordedStream) -> Self {
        Self {
            stream,
            refuse: true,
        }
    }
}

impl PcmOutputOpener for RecordingOpener {
    fn open(&self) -> Result<Box<dyn PcmOutput>, BackendError> {
        if self.refuse {
            return Err(BackendError::Runtime("simulated open failure".to_string()));
        }
        Ok(Box::new(RecordingOutput {
            stream: self.stream.clone(),
        }))
    }

    fn describe(&self) -> String {
        "simulated device".to_string()
    }
}

/// Device-stream provider over a recorded stream.
///
/// Construction trial-opens the stream the way the cpal provider does, so a
/// refusing device surfaces during selection.
pub(crate) struct SimulatedDeviceProvider {
    stream: RecordedStream,
    refuse: bool,
}

impl SimulatedDeviceProvider {
    pub(crate) fn new(stream: RecordedStream) -> Self {
        Self {
            stream,
            refuse: false,
        }
    }

    pub(crate) fn refusing(stream: RecordedStream) -> Self {
        Self {
            stream,
            refuse: true,
        }
    }
}

impl BackendProvider for SimulatedDeviceProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::DeviceStream
    }

    fn probe(&self) -> Availability {
        Availability::Available
    }

    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError> {
        let opener = if self.refuse {
            RecordingOpener::refusing(self.stream.clone())
        } else {
            RecordingOpener::new(self.stream.clone())
        };
        let backend = DeviceStreamBackend::try_open(Box::new(opener), 44_100, 256)?;
        Ok(Box::new(backend))
    }
}
