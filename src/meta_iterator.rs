//! Time-ordered merge over a changing set of event segments.

use parking_lot::RwLock;
use rondo_core::{MappedEvent, MappedEventList, MappedEventType, RealTime};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub type SegmentId = u64;

static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);

/// A run of events owned by the document model.
///
/// Events are kept sorted by time. Editors mutate the segment in place and
/// then notify the engine through `segment_modified` so iterators re-seek.
#[derive(Debug)]
pub struct MappedSegment {
    id: SegmentId,
    events: RwLock<Vec<MappedEvent>>,
}

impl MappedSegment {
    pub fn new(events: impl IntoIterator<Item = MappedEvent>) -> Arc<Self> {
        let mut events: Vec<MappedEvent> = events.into_iter().collect();
        events.sort_by_key(|e| e.event_time);
        Arc::new(Self {
            id: NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed),
            events: RwLock::new(events),
        })
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Replace the whole contents.
    pub fn set_events(&self, events: impl IntoIterator<Item = MappedEvent>) {
        let mut events: Vec<MappedEvent> = events.into_iter().collect();
        events.sort_by_key(|e| e.event_time);
        *self.events.write() = events;
    }

    pub fn insert(&self, event: MappedEvent) {
        let mut events = self.events.write();
        let at = events.partition_point(|e| e.event_time <= event.event_time);
        events.insert(at, event);
    }

    pub fn events(&self) -> Vec<MappedEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Index of the first event still relevant at `t`: one that starts at or
    /// after `t`, or starts earlier and is still sounding.
    fn seek(&self, t: RealTime) -> usize {
        let events = self.events.read();
        events
            .iter()
            .position(|e| e.event_time >= t || e.end_time() > t)
            .unwrap_or(events.len())
    }
}

struct Cursor {
    id: SegmentId,
    segment: Weak<MappedSegment>,
    index: usize,
}

/// Walks every tracked segment and yields events window by window.
///
/// Holds only weak references: a segment dropped by its owner simply stops
/// contributing. Callers still announce removals so cursors are released promptly.
pub struct MetaIterator {
    cursors: Vec<Cursor>,
    current_time: RealTime,
}

impl Default for MetaIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaIterator {
    pub fn new() -> Self {
        Self {
            cursors: Vec::new(),
            current_time: RealTime::ZERO,
        }
    }

    /// Start tracking `segment`, positioned at the current time. Adding a
    /// segment twice is a no-op.
    pub fn add_segment(&mut self, segment: &Arc<MappedSegment>) {
        if self.cursors.iter().any(|c| c.id == segment.id()) {
            return;
        }
        self.cursors.push(Cursor {
            id: segment.id(),
            segment: Arc::downgrade(segment),
            index: segment.seek(self.current_time),
        });
    }

    pub fn remove_segment(&mut self, id: SegmentId) -> bool {
        let before = self.cursors.len();
        self.cursors.retain(|c| c.id != id);
        self.cursors.len() != before
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
    }

    pub fn current_time(&self) -> RealTime {
        self.current_time
    }

    /// Reposition every cursor at `t`.
    pub fn jump_to_time(&mut self, t: RealTime) {
        self.current_time = t;
        self.cursors.retain_mut(|cursor| match cursor.segment.upgrade() {
            Some(segment) => {
                cursor.index = segment.seek(t);
                true
            }
            None => false,
        });
    }

    /// Re-seek one segment after its contents changed.
    pub fn reset_iterator_for_segment(&mut self, id: SegmentId) {
        let t = self.current_time;
        if let Some(cursor) = self.cursors.iter_mut().find(|c| c.id == id) {
            if let Some(segment) = cursor.segment.upgrade() {
                cursor.index = segment.seek(t);
            }
        }
    }

    /// Append every event due before `end` to `out` and advance.
    ///
    /// Events starting before `start` are only taken on a first fetch, and only
    /// while still sounding at `start`; they are clipped to begin at `start`.
    /// Returns true while any segment has events left.
    pub fn fill_until(
        &mut self,
        first_fetch: bool,
        out: &mut MappedEventList,
        start: RealTime,
        end: RealTime,
    ) -> bool {
        let mut remaining = false;
        self.cursors.retain_mut(|cursor| {
            let Some(segment) = cursor.segment.upgrade() else {
                return false;
            };
            let events = segment.events.read();
            while let Some(event) = events.get(cursor.index) {
                if event.event_time >= end {
                    break;
                }
                cursor.index += 1;
                if event.event_time >= start {
                    out.insert(*event);
                } else if first_fetch && event.end_time() > start {
                    out.insert(clip_to_start(*event, start));
                }
            }
            remaining |= cursor.index < events.len();
            true
        });
        self.current_time = end;
        remaining
    }

    /// Every audio event across all live segments.
    pub fn audio_events(&self) -> Vec<MappedEvent> {
        let mut audio: Vec<MappedEvent> = self
            .cursors
            .iter()
            .filter_map(|c| c.segment.upgrade())
            .flat_map(|s| {
                s.events
                    .read()
                    .iter()
                    .filter(|e| e.event_type == MappedEventType::Audio)
                    .copied()
                    .collect::<Vec<_>>()
            })
            .collect();
        audio.sort_by_key(|e| e.event_time);
        audio
    }

    pub fn segments(&self) -> Vec<Arc<MappedSegment>> {
        self.cursors
            .iter()
            .filter_map(|c| c.segment.upgrade())
            .collect()
    }

    pub fn segment_count(&self) -> usize {
        self.cursors.len()
    }
}

fn clip_to_start(mut event: MappedEvent, start: RealTime) -> MappedEvent {
    let skipped = start - event.event_time;
    event.event_time = start;
    event.duration = event.duration - skipped;
    if event.is_audio() {
        event.audio_start_marker = event.audio_start_marker + skipped;
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(v: i64) -> RealTime {
        RealTime::from_millis(v)
    }

    fn note(t: i64, dur: i64, pitch: u8) -> MappedEvent {
        MappedEvent::note(2000, pitch, 100, ms(t), ms(dur))
    }

    fn pitches(list: &MappedEventList) -> Vec<u8> {
        list.iter().map(|e| e.data1).collect()
    }

    #[test]
    fn test_merges_segments_in_time_order() {
        let a = MappedSegment::new([note(0, 10, 1), note(200, 10, 3)]);
        let b = MappedSegment::new([note(100, 10, 2), note(300, 10, 4)]);
        let mut it = MetaIterator::new();
        it.add_segment(&a);
        it.add_segment(&b);

        let mut out = MappedEventList::new();
        it.jump_to_time(ms(0));
        assert!(it.fill_until(true, &mut out, ms(0), ms(250)));
        assert_eq!(pitches(&out), vec![1, 2, 3]);

        let mut rest = MappedEventList::new();
        assert!(!it.fill_until(false, &mut rest, ms(250), ms(1000)));
        assert_eq!(pitches(&rest), vec![4]);
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let seg = MappedSegment::new([note(100, 10, 1)]);
        let mut it = MetaIterator::new();
        it.add_segment(&seg);

        let mut out = MappedEventList::new();
        it.fill_until(true, &mut out, ms(0), ms(100));
        assert!(out.is_empty());
        it.fill_until(false, &mut out, ms(100), ms(200));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_first_fetch_picks_up_sounding_note() {
        let seg = MappedSegment::new([note(0, 500, 1), note(50, 10, 2)]);
        let mut it = MetaIterator::new();
        it.add_segment(&seg);

        it.jump_to_time(ms(200));
        let mut out = MappedEventList::new();
        it.fill_until(true, &mut out, ms(200), ms(300));
        assert_eq!(pitches(&out), vec![1]);
        assert_eq!(out.as_slice()[0].event_time, ms(200));
        assert_eq!(out.as_slice()[0].duration, ms(300));
    }

    #[test]
    fn test_jump_back_replays() {
        let seg = MappedSegment::new([note(0, 10, 1), note(100, 10, 2)]);
        let mut it = MetaIterator::new();
        it.add_segment(&seg);

        let mut out = MappedEventList::new();
        it.fill_until(true, &mut out, ms(0), ms(200));
        assert_eq!(out.len(), 2);

        it.jump_to_time(ms(0));
        let mut again = MappedEventList::new();
        it.fill_until(true, &mut again, ms(0), ms(200));
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn test_dropped_segment_is_pruned() {
        let mut it = MetaIterator::new();
        {
            let seg = MappedSegment::new([note(0, 10, 1)]);
            it.add_segment(&seg);
            assert_eq!(it.segment_count(), 1);
        }
        let mut out = MappedEventList::new();
        it.fill_until(true, &mut out, ms(0), ms(100));
        assert!(out.is_empty());
        assert_eq!(it.segment_count(), 0);
    }

    #[test]
    fn test_reset_after_modification() {
        let seg = MappedSegment::new([note(0, 10, 1), note(300, 10, 2)]);
        let mut it = MetaIterator::new();
        it.add_segment(&seg);

        let mut out = MappedEventList::new();
        it.fill_until(true, &mut out, ms(0), ms(100));
        seg.insert(note(150, 10, 9));
        it.reset_iterator_for_segment(seg.id());

        let mut next = MappedEventList::new();
        it.fill_until(false, &mut next, ms(100), ms(400));
        assert_eq!(pitches(&next), vec![9, 2]);
    }

    #[test]
    fn test_remove_and_duplicate_add() {
        let seg = MappedSegment::new([note(0, 10, 1)]);
        let mut it = MetaIterator::new();
        it.add_segment(&seg);
        it.add_segment(&seg);
        assert_eq!(it.segment_count(), 1);
        assert!(it.remove_segment(seg.id()));
        assert!(!it.remove_segment(seg.id()));
    }

    #[test]
    fn test_audio_events() {
        let audio = MappedEvent::audio(1000, 3, ms(500), ms(2000), RealTime::ZERO);
        let seg = MappedSegment::new([note(0, 10, 1), audio]);
        let mut it = MetaIterator::new();
        it.add_segment(&seg);
        assert_eq!(it.audio_events(), vec![audio]);
    }

    #[test]
    fn test_clipped_audio_advances_marker() {
        let audio = MappedEvent::audio(1000, 3, ms(0), ms(2000), ms(100));
        let clipped = clip_to_start(audio, ms(500));
        assert_eq!(clipped.event_time, ms(500));
        assert_eq!(clipped.duration, ms(1500));
        assert_eq!(clipped.audio_start_marker, ms(600));
    }

    proptest! {
        #[test]
        fn prop_contiguous_windows_yield_each_event_once(
            times in proptest::collection::vec(0i64..5_000, 1..60),
            step in 10i64..700,
        ) {
            let seg = MappedSegment::new(times.iter().map(|t| note(*t, 0, 0)));
            let mut it = MetaIterator::new();
            it.add_segment(&seg);

            let mut total = 0;
            let mut start = 0;
            let mut first = true;
            while start < 6_000 {
                let mut out = MappedEventList::new();
                it.fill_until(first, &mut out, ms(start), ms(start + step));
                prop_assert!(out.iter().all(|e| e.event_time >= ms(start) && e.event_time < ms(start + step)));
                total += out.len();
                first = false;
                start += step;
            }
            prop_assert_eq!(total, times.len());
        }
    }
}
