//! State the engine publishes for observers on other threads.

use parking_lot::Mutex;
use rondo_core::{MappedEventList, RealTime, TransportStatus};
use rondo_driver::DriverStatus;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};

/// Playhead, transport status, driver status and recorded MIDI.
///
/// Readers never take the engine lock. The position is the latency-compensated
/// playhead as last computed by the sequencer tick.
pub struct PlaybackMonitor {
    position_nanos: AtomicI64,
    status: AtomicU8,
    driver_status: AtomicU32,
    recorded: Mutex<MappedEventList>,
}

impl Default for PlaybackMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackMonitor {
    pub fn new() -> Self {
        Self {
            position_nanos: AtomicI64::new(0),
            status: AtomicU8::new(TransportStatus::Stopped.to_u8()),
            driver_status: AtomicU32::new(DriverStatus::NO_DRIVER.bits()),
            recorded: Mutex::new(MappedEventList::new()),
        }
    }

    #[inline]
    pub fn position(&self) -> RealTime {
        RealTime::from_nanos(self.position_nanos.load(Ordering::Acquire))
    }

    pub(crate) fn set_position(&self, position: RealTime) {
        self.position_nanos
            .store(position.as_nanos(), Ordering::Release);
    }

    pub fn status(&self) -> TransportStatus {
        TransportStatus::from_u8(self.status.load(Ordering::Acquire))
            .unwrap_or(TransportStatus::Stopped)
    }

    pub(crate) fn set_status(&self, status: TransportStatus) {
        self.status.store(status.to_u8(), Ordering::Release);
    }

    pub fn driver_status(&self) -> DriverStatus {
        DriverStatus(self.driver_status.load(Ordering::Acquire))
    }

    pub(crate) fn set_driver_status(&self, status: DriverStatus) {
        self.driver_status.store(status.bits(), Ordering::Release);
    }

    pub(crate) fn add_recorded_events(&self, events: &MappedEventList) {
        if events.is_empty() {
            return;
        }
        self.recorded.lock().merge(events);
    }

    /// Take every event recorded since the last call.
    pub fn take_recorded_events(&self) -> MappedEventList {
        self.recorded.lock().take()
    }

    pub fn recorded_len(&self) -> usize {
        self.recorded.lock().len()
    }

    /// Drop per-session scratch state.
    pub(crate) fn clear_temporaries(&self) {
        self.recorded.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rondo_core::MappedEvent;

    #[test]
    fn test_position_roundtrip() {
        let monitor = PlaybackMonitor::new();
        monitor.set_position(RealTime::from_millis(-40));
        assert_eq!(monitor.position(), RealTime::from_millis(-40));
    }

    #[test]
    fn test_status_published() {
        let monitor = PlaybackMonitor::new();
        assert_eq!(monitor.status(), TransportStatus::Stopped);
        monitor.set_status(TransportStatus::Recording);
        assert_eq!(monitor.status(), TransportStatus::Recording);
    }

    #[test]
    fn test_recorded_events_taken_once() {
        let monitor = PlaybackMonitor::new();
        let list: MappedEventList = [MappedEvent::note(2000, 60, 90, RealTime::ZERO, RealTime::ZERO)]
            .into_iter()
            .collect();
        monitor.add_recorded_events(&list);
        assert_eq!(monitor.take_recorded_events().len(), 1);
        assert!(monitor.take_recorded_events().is_empty());

        monitor.add_recorded_events(&list);
        monitor.clear_temporaries();
        assert_eq!(monitor.recorded_len(), 0);
    }
}
