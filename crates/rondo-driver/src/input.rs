//! SPSC input port for events arriving from outside the driver.
//!
//! - Producer: an input callback or a test (single thread)
//! - Consumer: the driver, drained once per engine tick

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use rondo_core::{MappedEvent, MappedEventList};

/// Sending half of an [`InputPort`]. Move it to the thread that receives input.
pub struct InputProducer {
    producer: HeapProd<MappedEvent>,
}

impl InputProducer {
    /// Returns false if the port is full and the event was dropped.
    #[inline]
    pub fn push(&mut self, event: MappedEvent) -> bool {
        self.producer.try_push(event).is_ok()
    }
}

impl std::fmt::Debug for InputProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputProducer").finish_non_exhaustive()
    }
}

pub struct InputPort {
    consumer: HeapCons<MappedEvent>,
    producer: Option<InputProducer>,
}

impl InputPort {
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::<MappedEvent>::new(capacity.max(1)).split();
        Self {
            consumer,
            producer: Some(InputProducer { producer }),
        }
    }

    /// Hand out the producer. Only the first call returns `Some`.
    pub fn take_producer(&mut self) -> Option<InputProducer> {
        self.producer.take()
    }

    /// Drain everything queued so far into `list`.
    pub fn drain_into(&mut self, list: &mut MappedEventList) {
        while let Some(event) = self.consumer.try_pop() {
            list.insert(event);
        }
    }

    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }
}

impl std::fmt::Debug for InputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPort")
            .field("pending", &self.pending())
            .finish()
    }
}
