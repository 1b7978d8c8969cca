//! Ad-hoc event traffic that bypasses the playback pipeline.
//!
//! Two FIFOs, each behind its own lock and independent of the engine lock:
//! outbound events waiting to be sent to the driver, and inbound events
//! received from the driver waiting for an external consumer.

use parking_lot::Mutex;
use rondo_core::{MappedEvent, MappedEventList};
use std::collections::VecDeque;

#[derive(Default)]
pub struct AsyncRelay {
    outbound: Mutex<VecDeque<MappedEvent>>,
    inbound: Mutex<MappedEventList>,
}

impl AsyncRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for immediate emission on the next tick.
    pub fn queue_outbound(&self, event: MappedEvent) {
        self.outbound.lock().push_back(event);
    }

    /// Take every queued outbound event in FIFO order.
    pub fn take_outbound(&self) -> VecDeque<MappedEvent> {
        std::mem::take(&mut *self.outbound.lock())
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.lock().len()
    }

    /// Merge newly received events into the inbound buffer.
    pub fn push_inbound(&self, events: &MappedEventList) {
        if events.is_empty() {
            return;
        }
        self.inbound.lock().merge(events);
    }

    /// Take everything received since the last pull.
    pub fn pull_inbound(&self) -> MappedEventList {
        self.inbound.lock().take()
    }

    pub fn inbound_len(&self) -> usize {
        self.inbound.lock().len()
    }
}
