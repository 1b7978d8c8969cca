//! Transport request queue and completion token.

use parking_lot::Mutex;
use rondo_core::{RealTime, TransportRequest};
use rondo_driver::ExternalTransport;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Requests marshalled toward the sequencer thread, plus the generation
/// counter callers poll to learn when a request has taken effect.
///
/// The queue has its own lock, separate from the engine lock, so a caller
/// can enqueue while the engine is busy. The token starts at 1 and never
/// decreases.
pub struct TransportSync {
    requests: Mutex<VecDeque<(TransportRequest, RealTime)>>,
    token: AtomicU64,
}

impl Default for TransportSync {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportSync {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            token: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn token(&self) -> u64 {
        self.token.load(Ordering::Acquire)
    }

    pub(crate) fn increment_token(&self) -> u64 {
        let token = self.token.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(token, "transport token incremented");
        token
    }

    /// Oldest queued request, if any.
    pub fn next_request(&self) -> Option<(TransportRequest, RealTime)> {
        self.requests.lock().pop_front()
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.lock().len()
    }
}

impl ExternalTransport for TransportSync {
    fn transport_change(&self, request: TransportRequest) -> u64 {
        let mut requests = self.requests.lock();
        requests.push_back((request, RealTime::ZERO));
        tracing::debug!(?request, "transport change queued");
        match request {
            TransportRequest::NoChange => self.token(),
            _ => self.token() + 1,
        }
    }

    fn transport_jump(&self, request: TransportRequest, time: RealTime) -> u64 {
        let mut requests = self.requests.lock();
        requests.push_back((request, time));
        tracing::debug!(?request, %time, "transport jump queued");
        match request {
            TransportRequest::NoChange => self.token() + 1,
            _ => self.token() + 2,
        }
    }

    fn is_transport_sync_complete(&self, token: u64) -> bool {
        self.token() >= token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_returned_by_requests() {
        let sync = TransportSync::new();
        assert_eq!(sync.token(), 1);
        assert_eq!(sync.transport_change(TransportRequest::NoChange), 1);
        assert_eq!(sync.transport_change(TransportRequest::Start), 2);
        assert_eq!(sync.transport_jump(TransportRequest::NoChange, RealTime::ZERO), 2);
        assert_eq!(sync.transport_jump(TransportRequest::Jump, RealTime::new(4, 0)), 3);
    }

    #[test]
    fn test_sync_complete_after_increment() {
        let sync = TransportSync::new();
        let token = sync.transport_change(TransportRequest::Stop);
        assert!(!sync.is_transport_sync_complete(token));
        sync.increment_token();
        assert!(sync.is_transport_sync_complete(token));
        assert!(sync.is_transport_sync_complete(1));
    }

    #[test]
    fn test_requests_drain_fifo() {
        let sync = TransportSync::new();
        sync.transport_change(TransportRequest::Start);
        sync.transport_jump(TransportRequest::Jump, RealTime::new(2, 0));
        sync.transport_change(TransportRequest::Stop);
        assert_eq!(sync.pending_requests(), 3);

        assert_eq!(sync.next_request(), Some((TransportRequest::Start, RealTime::ZERO)));
        assert_eq!(sync.next_request(), Some((TransportRequest::Jump, RealTime::new(2, 0))));
        assert_eq!(sync.next_request(), Some((TransportRequest::Stop, RealTime::ZERO)));
        assert_eq!(sync.next_request(), None);
    }
}
