//! Callbacks into the document side of the application.

use parking_lot::Mutex;
use rondo_core::InstrumentId;
use std::path::PathBuf;

/// What the engine needs from the host when recording starts.
///
/// Both methods are called with the engine lock held but no engine state
/// borrowed, so an implementation may read engine state back.
pub trait RecordHost: Send + Sync {
    /// Instruments currently armed for recording.
    fn armed_instruments(&self) -> Vec<InstrumentId>;

    /// Create one destination file per audio instrument, in order.
    ///
    /// Returning fewer paths than instruments aborts the recording.
    fn create_record_audio_files(&self, audio_instruments: &[InstrumentId]) -> Vec<PathBuf>;
}

/// Host with nothing armed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecordHost;

impl RecordHost for NoRecordHost {
    fn armed_instruments(&self) -> Vec<InstrumentId> {
        Vec::new()
    }

    fn create_record_audio_files(&self, _audio_instruments: &[InstrumentId]) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Fixed arming set with audio files named after their instrument under a
/// base directory.
#[derive(Debug)]
pub struct ArmedInstruments {
    armed: Mutex<Vec<InstrumentId>>,
    directory: PathBuf,
}

impl ArmedInstruments {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            armed: Mutex::new(Vec::new()),
            directory: directory.into(),
        }
    }

    pub fn arm(&self, instrument: InstrumentId) {
        let mut armed = self.armed.lock();
        if !armed.contains(&instrument) {
            armed.push(instrument);
        }
    }

    pub fn disarm(&self, instrument: InstrumentId) {
        self.armed.lock().retain(|i| *i != instrument);
    }
}

impl RecordHost for ArmedInstruments {
    fn armed_instruments(&self) -> Vec<InstrumentId> {
        self.armed.lock().clone()
    }

    fn create_record_audio_files(&self, audio_instruments: &[InstrumentId]) -> Vec<PathBuf> {
        audio_instruments
            .iter()
            .map(|id| self.directory.join(format!("rec-{id}.wav")))
            .collect()
    }
}
