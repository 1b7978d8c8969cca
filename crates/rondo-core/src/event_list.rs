//! Time-ordered collection of [`MappedEvent`]s.

use crate::{MappedEvent, RealTime};

/// Events kept sorted by `event_time`. Events sharing a time keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedEventList {
    events: Vec<MappedEvent>,
}

impl MappedEventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Insert after any events with the same or earlier time.
    pub fn insert(&mut self, event: MappedEvent) {
        let at = self
            .events
            .partition_point(|e| e.event_time <= event.event_time);
        self.events.insert(at, event);
    }

    /// Merge another list into this one, preserving order.
    pub fn merge(&mut self, other: &MappedEventList) {
        if other.is_empty() {
            return;
        }
        self.events.extend_from_slice(&other.events);
        self.sort();
    }

    pub fn extend<I: IntoIterator<Item = MappedEvent>>(&mut self, events: I) {
        self.events.extend(events);
        self.sort();
    }

    pub fn retain<F: FnMut(&MappedEvent) -> bool>(&mut self, f: F) {
        self.events.retain(f);
    }

    /// Mutate every event, then restore time order.
    pub fn update<F: FnMut(&mut MappedEvent)>(&mut self, f: F) {
        self.events.iter_mut().for_each(f);
        self.sort();
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Move all events out, leaving the list empty.
    pub fn take(&mut self) -> MappedEventList {
        std::mem::take(self)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappedEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[MappedEvent] {
        &self.events
    }

    pub fn first_time(&self) -> Option<RealTime> {
        self.events.first().map(|e| e.event_time)
    }

    pub fn last_time(&self) -> Option<RealTime> {
        self.events.last().map(|e| e.event_time)
    }

    fn sort(&mut self) {
        self.events.sort_by_key(|e| e.event_time);
    }
}

impl FromIterator<MappedEvent> for MappedEventList {
    fn from_iter<I: IntoIterator<Item = MappedEvent>>(iter: I) -> Self {
        let mut list = Self {
            events: iter.into_iter().collect(),
        };
        list.sort();
        list
    }
}

impl IntoIterator for MappedEventList {
    type Item = MappedEvent;
    type IntoIter = std::vec::IntoIter<MappedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a MappedEventList {
    type Item = &'a MappedEvent;
    type IntoIter = std::slice::Iter<'a, MappedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MappedEventType;
    use proptest::prelude::*;

    fn note_at(ms: i64, pitch: u8) -> MappedEvent {
        MappedEvent::note(2000, pitch, 100, RealTime::from_millis(ms), RealTime::from_millis(10))
    }

    #[test]
    fn test_insert_keeps_order_and_ties_stable() {
        let mut list = MappedEventList::new();
        list.insert(note_at(20, 1));
        list.insert(note_at(10, 2));
        list.insert(note_at(20, 3));
        list.insert(note_at(0, 4));

        let pitches: Vec<u8> = list.iter().map(|e| e.data1).collect();
        assert_eq!(pitches, vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_merge() {
        let mut a: MappedEventList = [note_at(0, 1), note_at(30, 2)].into_iter().collect();
        let b: MappedEventList = [note_at(15, 3)].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.as_slice()[1].data1, 3);
    }

    #[test]
    fn test_update_resorts() {
        let mut list: MappedEventList = [note_at(0, 1), note_at(10, 2)].into_iter().collect();
        list.update(|e| {
            if e.data1 == 1 {
                e.event_time = RealTime::from_millis(50);
            }
        });
        assert_eq!(list.first_time(), Some(RealTime::from_millis(10)));
        assert_eq!(list.last_time(), Some(RealTime::from_millis(50)));
    }

    #[test]
    fn test_retain_and_take() {
        let mut list: MappedEventList = [
            note_at(0, 1),
            MappedEvent::controller(2000, 7, 100, RealTime::from_millis(5)),
        ]
        .into_iter()
        .collect();
        list.retain(|e| e.event_type != MappedEventType::MidiController);
        assert_eq!(list.len(), 1);

        let taken = list.take();
        assert!(list.is_empty());
        assert_eq!(taken.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_insert_always_sorted(times in proptest::collection::vec(0i64..10_000, 0..64)) {
            let mut list = MappedEventList::new();
            for (i, t) in times.iter().enumerate() {
                list.insert(note_at(*t, i as u8));
            }
            let sorted = list.as_slice().windows(2).all(|w| w[0].event_time <= w[1].event_time);
            prop_assert!(sorted);
            prop_assert_eq!(list.len(), times.len());
        }
    }
}
