//! Locked passthroughs to the sound driver, plus segment notifications.

use super::TransportEngine;
use crate::meta_iterator::{MappedSegment, SegmentId};
use rondo_core::{DeviceId, InstrumentId, RealTime};
use rondo_driver::{
    DeviceDirection, DeviceType, DriverStatus, InstrumentType, MappedInstrument,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

impl TransportEngine {
    // --- status -----------------------------------------------------------

    /// Driver status, with `VERSION_OK` set when `gui_version` matches the
    /// configured version.
    pub fn sound_driver_status(&self, gui_version: &str) -> DriverStatus {
        let guard = self.lock();
        let st = guard.borrow();
        let mut status = st.driver.status();
        if gui_version == self.config.gui_version {
            status |= DriverStatus::VERSION_OK;
        } else {
            warn!(
                gui_version,
                engine_version = %self.config.gui_version,
                "version mismatch"
            );
        }
        self.monitor.set_driver_status(status);
        status
    }

    pub fn status_log(&self) -> String {
        self.lock().borrow().driver.status_log()
    }

    // --- audio files ------------------------------------------------------

    pub fn add_audio_file(&self, path: &Path, id: u32) -> bool {
        let guard = self.lock();
        let result = guard.borrow_mut().driver.add_audio_file(path, id);
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(id, path = %path.display(), error = %e, "failed to add audio file");
                false
            }
        }
    }

    pub fn remove_audio_file(&self, id: u32) -> bool {
        let guard = self.lock();
        let result = guard.borrow_mut().driver.remove_audio_file(id);
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(id, error = %e, "failed to remove audio file");
                false
            }
        }
    }

    pub fn clear_all_audio_files(&self) {
        self.lock().borrow_mut().driver.clear_audio_files();
    }

    // --- instruments and devices ------------------------------------------

    pub fn set_mapped_instrument(&self, instrument_type: InstrumentType, channel: u8, id: InstrumentId) {
        let guard = self.lock();
        guard.borrow_mut().driver.set_mapped_instrument(MappedInstrument {
            instrument_type,
            channel,
            id,
        });
    }

    pub fn can_reconnect(&self, device_type: DeviceType) -> bool {
        self.lock().borrow().driver.can_reconnect(device_type)
    }

    pub fn add_device(
        &self,
        device_type: DeviceType,
        id: DeviceId,
        base_instrument: InstrumentId,
        direction: DeviceDirection,
    ) -> bool {
        let guard = self.lock();
        let result = guard
            .borrow_mut()
            .driver
            .add_device(device_type, id, base_instrument, direction);
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(id, error = %e, "failed to add device");
                false
            }
        }
    }

    pub fn remove_device(&self, id: DeviceId) {
        self.lock().borrow_mut().driver.remove_device(id);
    }

    pub fn remove_all_devices(&self) {
        self.lock().borrow_mut().driver.remove_all_devices();
    }

    pub fn rename_device(&self, id: DeviceId, name: &str) {
        self.lock().borrow_mut().driver.rename_device(id, name);
    }

    pub fn connection_count(&self, device_type: DeviceType, direction: DeviceDirection) -> usize {
        self.lock()
            .borrow()
            .driver
            .connection_count(device_type, direction)
    }

    pub fn connection(
        &self,
        device_type: DeviceType,
        direction: DeviceDirection,
        index: usize,
    ) -> Option<String> {
        self.lock()
            .borrow()
            .driver
            .connection(device_type, direction, index)
    }

    pub fn device_connection(&self, id: DeviceId) -> Option<String> {
        self.lock().borrow().driver.device_connection(id)
    }

    pub fn set_connection(&self, id: DeviceId, connection: &str) {
        self.lock().borrow_mut().driver.set_connection(id, connection);
    }

    pub fn set_plausible_connection(&self, id: DeviceId, connection: &str) {
        self.lock()
            .borrow_mut()
            .driver
            .set_plausible_connection(id, connection);
    }

    pub fn connect_something(&self) {
        self.lock().borrow_mut().driver.connect_something();
    }

    /// Ask the driver to rescan for clients. Skipped while rolling.
    pub fn check_for_new_clients(&self) -> bool {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        if st.status.is_rolling() {
            return false;
        }
        st.driver.check_for_new_clients()
    }

    // --- timing -----------------------------------------------------------

    pub fn timers(&self) -> Vec<String> {
        self.lock().borrow().driver.timers()
    }

    pub fn current_timer(&self) -> String {
        self.lock().borrow().driver.current_timer()
    }

    pub fn set_current_timer(&self, name: &str) {
        self.lock().borrow_mut().driver.set_current_timer(name);
    }

    pub fn set_low_latency_mode(&self, enabled: bool) {
        self.lock().borrow_mut().driver.set_low_latency_mode(enabled);
    }

    pub fn audio_play_latency(&self) -> RealTime {
        self.lock().borrow().driver.audio_play_latency()
    }

    pub fn audio_record_latency(&self) -> RealTime {
        self.lock().borrow().driver.audio_record_latency()
    }

    pub fn sample_rate(&self) -> u32 {
        self.lock().borrow().driver.sample_rate()
    }

    /// MIDI clock runs at 24 pulses per quarter note.
    pub fn set_quarter_note_length(&self, length: RealTime) {
        let guard = self.lock();
        guard
            .borrow_mut()
            .driver
            .set_midi_clock_interval(length / 24);
    }

    /// Sleep through the driver, which may wake early on input.
    pub fn sleep(&self, duration: std::time::Duration) {
        self.lock().borrow().driver.sleep(duration);
    }

    pub fn plugin_information(&self) -> Vec<String> {
        self.lock().borrow().driver.plugin_information()
    }

    // --- segments ---------------------------------------------------------

    pub fn segment_added(&self, segment: &Arc<MappedSegment>) {
        let guard = self.lock();
        guard.borrow_mut().iterator.add_segment(segment);
        debug!(segment = segment.id(), "segment added");
    }

    /// Re-seek a segment's cursor after its events changed. Only matters
    /// while rolling; the next first fetch re-seeks everything anyway.
    pub fn segment_modified(&self, id: SegmentId) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        if st.status.is_rolling() {
            st.iterator.reset_iterator_for_segment(id);
        }
    }

    pub fn segment_about_to_be_deleted(&self, id: SegmentId) {
        let guard = self.lock();
        if guard.borrow_mut().iterator.remove_segment(id) {
            debug!(segment = id, "segment removed");
        }
    }

    pub fn close_all_segments(&self) {
        self.lock().borrow_mut().iterator.clear();
    }

    /// Re-seed the driver's audio queue after instrument assignments changed.
    pub fn remap_tracks(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        let audio = st.iterator.audio_events();
        st.driver.initialise_audio_queue(&audio);
    }

    pub fn segment_count(&self) -> usize {
        self.lock().borrow().iterator.segment_count()
    }
}
