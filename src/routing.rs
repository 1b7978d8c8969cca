//! MIDI thru/record filtering and instrument routing for inbound events.
//!
//! ```text
//! Control thread                      Sequencer thread
//!     │                                   │
//!     ▼                                   ▼
//! ┌──────────────┐                ┌──────────────────┐
//! │ RoutingTable │───ArcSwap─────▶│ RoutingSnapshot  │
//! │ update()     │                │ (immutable)      │
//! └──────────────┘                └──────────────────┘
//! ```

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rondo_core::{
    DeviceId, InstrumentId, MappedEventList, MidiFilter, CONTROL_DEVICE, MIDI_INSTRUMENT_BASE,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type TrackId = u32;

/// Immutable routing configuration read once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSnapshot {
    pub routing_enabled: bool,
    /// Kinds dropped before echoing input back out.
    pub thru_filter: MidiFilter,
    /// Kinds dropped before recording.
    pub record_filter: MidiFilter,
    pub selected_track: TrackId,
    pub track_instruments: BTreeMap<TrackId, InstrumentId>,
    /// Record-source bindings: which instrument a `(device, channel)` feeds.
    pub input_bindings: BTreeMap<(DeviceId, u8), InstrumentId>,
}

impl Default for RoutingSnapshot {
    fn default() -> Self {
        Self {
            routing_enabled: true,
            thru_filter: MidiFilter::NONE,
            record_filter: MidiFilter::NONE,
            selected_track: 0,
            track_instruments: BTreeMap::new(),
            input_bindings: BTreeMap::new(),
        }
    }
}

impl RoutingSnapshot {
    /// Instrument on `track`, or the first MIDI instrument when unassigned.
    pub fn instrument_for_track(&self, track: TrackId) -> InstrumentId {
        self.track_instruments
            .get(&track)
            .copied()
            .unwrap_or(MIDI_INSTRUMENT_BASE)
    }

    /// Instrument bound to an input source, falling back to the selected track's.
    pub fn instrument_for_event(&self, device: DeviceId, channel: u8) -> InstrumentId {
        self.input_bindings
            .get(&(device, channel))
            .copied()
            .unwrap_or_else(|| self.instrument_for_track(self.selected_track))
    }

    /// Retarget every event, either to the selected track or by source.
    pub fn route(&self, events: &mut MappedEventList, use_selected_track: bool) {
        if use_selected_track {
            let instrument = self.instrument_for_track(self.selected_track);
            events.update(|e| e.instrument = instrument);
        } else {
            events.update(|e| e.instrument = self.instrument_for_event(e.recorded_device, e.recorded_channel));
        }
    }
}

/// Drop events whose kind is in `filter`, and, when `filter_control_device`
/// is set, anything that came from the control surface.
pub fn apply_filter(events: &mut MappedEventList, filter: MidiFilter, filter_control_device: bool) {
    events.retain(|e| {
        !(filter.matches(e.event_type)
            || (filter_control_device && e.recorded_device == CONTROL_DEVICE))
    });
}

/// Staged routing configuration published to readers through [`ArcSwap`].
pub struct RoutingTable {
    staged: Mutex<RoutingSnapshot>,
    snapshot: ArcSwap<RoutingSnapshot>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            staged: Mutex::new(RoutingSnapshot::default()),
            snapshot: ArcSwap::from_pointee(RoutingSnapshot::default()),
        }
    }

    pub fn load(&self) -> Arc<RoutingSnapshot> {
        self.snapshot.load_full()
    }

    /// Modify the staged configuration and publish it.
    pub fn update(&self, f: impl FnOnce(&mut RoutingSnapshot)) {
        let mut staged = self.staged.lock();
        f(&mut staged);
        self.snapshot.store(Arc::new(staged.clone()));
    }

    pub fn set_routing_enabled(&self, enabled: bool) {
        self.update(|r| r.routing_enabled = enabled);
    }

    pub fn set_thru_filter(&self, filter: MidiFilter) {
        self.update(|r| r.thru_filter = filter);
    }

    pub fn set_record_filter(&self, filter: MidiFilter) {
        self.update(|r| r.record_filter = filter);
    }

    pub fn set_selected_track(&self, track: TrackId) {
        self.update(|r| r.selected_track = track);
    }

    pub fn set_track_instrument(&self, track: TrackId, instrument: InstrumentId) {
        self.update(|r| {
            r.track_instruments.insert(track, instrument);
        });
    }

    pub fn bind_input(&self, device: DeviceId, channel: u8, instrument: InstrumentId) {
        self.update(|r| {
            r.input_bindings.insert((device, channel), instrument);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rondo_core::{MappedEvent, MappedEventType, RealTime};

    fn inbound(kind: MappedEventType, device: DeviceId, channel: u8) -> MappedEvent {
        MappedEvent::new(2000, kind, 60, 100, RealTime::ZERO, RealTime::ZERO)
            .recorded_from(device, channel)
    }

    #[test]
    fn test_filter_by_kind_and_control_device() {
        let mut list: MappedEventList = [
            inbound(MappedEventType::MidiNote, 0, 0),
            inbound(MappedEventType::MidiController, 0, 0),
            inbound(MappedEventType::MidiNote, CONTROL_DEVICE, 0),
        ]
        .into_iter()
        .collect();

        let mut kept = list.clone();
        apply_filter(&mut kept, MidiFilter::from(MappedEventType::MidiController), false);
        assert_eq!(kept.len(), 2);

        apply_filter(&mut list, MidiFilter::from(MappedEventType::MidiController), true);
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0].recorded_device, 0);
    }

    #[test]
    fn test_route_to_selected_track() {
        let table = RoutingTable::new();
        table.set_track_instrument(3, 2005);
        table.set_selected_track(3);

        let mut list: MappedEventList = [inbound(MappedEventType::MidiNote, 1, 4)].into_iter().collect();
        table.load().route(&mut list, true);
        assert_eq!(list.as_slice()[0].instrument, 2005);
    }

    #[test]
    fn test_route_by_source_with_fallback() {
        let table = RoutingTable::new();
        table.set_track_instrument(0, 2001);
        table.bind_input(1, 9, 2042);

        let mut list: MappedEventList = [
            inbound(MappedEventType::MidiNote, 1, 9),
            inbound(MappedEventType::MidiNote, 2, 0),
        ]
        .into_iter()
        .collect();
        table.load().route(&mut list, false);
        let instruments: Vec<_> = list.iter().map(|e| e.instrument).collect();
        assert_eq!(instruments, vec![2042, 2001]);
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let table = RoutingTable::new();
        let before = table.load();
        table.set_routing_enabled(false);
        assert!(before.routing_enabled);
        assert!(!table.load().routing_enabled);
    }
}
