//! The per-tick side of the engine: fetch windows, clocks and async traffic.

use super::{EngineState, TransportEngine};
use crate::routing::apply_filter;
use rondo_core::{MappedEventList, RealTime, TransportStatus};
use rondo_driver::SoundDriver;
use tracing::{debug, trace};

/// Shift each event by `max - latency(instrument)` so that every output path
/// sounds together with the slowest one. A zero maximum leaves `events` alone.
pub fn compensate_latency(driver: &dyn SoundDriver, events: &mut MappedEventList) {
    let max = driver.maximum_play_latency();
    if max.is_zero() {
        return;
    }
    events.update(|e| {
        e.event_time = e.event_time + max - driver.instrument_play_latency(e.instrument);
    });
}

impl EngineState {
    /// End of a read-ahead window starting at `start`, kept one tick short of
    /// the loop end when the window would run past it.
    pub(crate) fn read_ahead_end(&self, start: RealTime) -> RealTime {
        let end = start + self.buffer_sizes.read_ahead;
        let range = self.loop_range;
        if range.is_active() && start < range.end && end >= range.end {
            range.end - RealTime::TICK
        } else {
            end
        }
    }

    /// Events due in `[start, end)`, latency compensated.
    pub(crate) fn fetch_events(
        &mut self,
        start: RealTime,
        end: RealTime,
        first_fetch: bool,
    ) -> MappedEventList {
        let mut events = MappedEventList::new();
        if self.status.is_stopped() || self.status == TransportStatus::Quit {
            return events;
        }

        if first_fetch || start < self.last_start {
            self.iterator.jump_to_time(start);
        }
        self.iterator.fill_until(first_fetch, &mut events, start, end);
        self.last_start = start;

        compensate_latency(self.driver.as_ref(), &mut events);
        trace!(%start, %end, count = events.len(), "fetched");
        events
    }
}

impl TransportEngine {
    /// One sequencer cycle. Returns false once the engine has quit.
    pub fn tick(&self) -> bool {
        let guard = self.lock();

        let status = guard.borrow().status;
        match status {
            TransportStatus::Quit => return false,
            TransportStatus::Starting => {
                self.start_playing();
                let mut st = guard.borrow_mut();
                self.set_status(&mut st, TransportStatus::Playing);
            }
            TransportStatus::StartingToRecord => {
                self.start_playing();
                let mut st = guard.borrow_mut();
                self.set_status(&mut st, TransportStatus::Recording);
            }
            TransportStatus::Playing => self.keep_playing(),
            TransportStatus::Recording => {
                self.keep_playing();
                self.process_recorded_midi();
            }
            TransportStatus::Stopping => {
                let mut st = guard.borrow_mut();
                self.set_status(&mut st, TransportStatus::Stopped);
            }
            TransportStatus::Stopped => self.poll_clients(),
        }

        self.process_asynchronous_events();
        self.update_clocks();

        while let Some((request, time)) = self.sync.next_request() {
            self.apply_transport_request(request, time);
        }

        let status = guard.borrow().status;
        status != TransportStatus::Quit
    }

    /// Queue the first window and start the driver clock.
    pub fn start_playing(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();

        let start = st.song_position;
        let end = st.read_ahead_end(start);
        st.last_fetch = end;

        st.driver.initialise_playback(start);

        let events = st.fetch_events(start, end, true);
        st.driver.process_events_out(&events, start, end);

        let audio = st.iterator.audio_events();
        st.driver.initialise_audio_queue(&audio);

        st.driver.start_clocks();
        self.sync.increment_token();
        debug!(%start, %end, events = events.len(), "playback started");
    }

    /// Queue the next incremental window.
    pub fn keep_playing(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();

        let mut fetch_end = st.song_position + st.buffer_sizes.read_ahead;
        if st.loop_range.is_active() && fetch_end >= st.loop_range.end {
            fetch_end = st.loop_range.end - RealTime::TICK;
        }

        let from = st.last_fetch;
        let events = if fetch_end > from {
            st.fetch_events(from, fetch_end, false)
        } else {
            MappedEventList::new()
        };

        st.driver.process_events_out(&events, from, fetch_end);

        if fetch_end > from {
            st.last_fetch = fetch_end;
        }
    }

    /// Follow the driver clock, wrapping at the loop end, and publish the
    /// latency-compensated playhead.
    pub fn update_clocks(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();

        st.driver.run_tasks();

        if !st.status.is_rolling() {
            return;
        }

        let mut position = st.driver.sequencer_time();
        let range = st.loop_range;

        if range.is_active() && position >= range.end {
            let old = st.song_position;
            st.song_position = range.start;
            st.last_fetch = range.start;
            position = range.start;

            st.driver.stop_clocks();
            st.driver.reset_playback(old, range.start);

            let end = st.read_ahead_end(range.start);
            let events = st.fetch_events(range.start, end, true);
            st.driver.process_events_out(&events, range.start, end);
            st.last_fetch = end;

            st.driver.start_clocks();
            debug!(from = %old, to = %range.start, "loop wrapped");
        } else {
            st.song_position = position;
            let start = st.driver.start_position();
            if position <= start {
                position = start;
            }
        }

        let max = st.driver.maximum_play_latency();
        if !max.is_zero() {
            position = position - max;
        }
        self.publish_position(position);
    }

    /// Drain the outbound relay to the driver, then pick up ad-hoc input.
    ///
    /// While recording, inbound events belong to the recorded path and are
    /// left for [`process_recorded_midi`](Self::process_recorded_midi).
    pub fn process_asynchronous_events(&self) {
        let guard = self.lock();
        let outbound = self.relay.take_outbound();
        let mut st = guard.borrow_mut();

        for event in outbound {
            let single: MappedEventList = std::iter::once(event).collect();
            st.driver.process_events_now(&single);
        }

        if st.status != TransportStatus::Recording {
            let mut incoming = st.driver.drain_incoming();
            if !incoming.is_empty() {
                self.relay.push_inbound(&incoming);

                let routing = self.routing.load();
                if routing.routing_enabled {
                    apply_filter(&mut incoming, routing.thru_filter, true);
                    routing.route(&mut incoming, true);
                    if !incoming.is_empty() {
                        st.driver.process_events_now(&incoming);
                    }
                }
            }
        }

        st.driver.process_pending();
    }

    /// Capture input while recording and echo it to the instrument bound to
    /// its source.
    pub fn process_recorded_midi(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();

        let mut recorded = st.driver.drain_incoming();
        if recorded.is_empty() {
            return;
        }

        let routing = self.routing.load();
        apply_filter(&mut recorded, routing.record_filter, false);
        self.monitor.add_recorded_events(&recorded);

        if routing.routing_enabled {
            apply_filter(&mut recorded, routing.thru_filter, true);
            routing.route(&mut recorded, false);
            if !recorded.is_empty() {
                st.driver.process_events_now(&recorded);
            }
        }
    }

    fn poll_clients(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        if st.last_client_check.elapsed() < self.config.client_check_interval {
            return;
        }
        st.last_client_check = std::time::Instant::now();
        if st.driver.check_for_new_clients() {
            debug!("driver reported new clients");
        }
    }
}
