//! Asynchronous label construction
//!
//! Building a label renderable is slow on real engines, so the session only
//! issues a request and carries on. The host completes it later through
//! `OverlaySession::on_label_ready`, quoting the ticket it was given.

use std::collections::VecDeque;

/// Identifies one label request
///
/// The generation is bumped every time the active anchor changes, so a
/// completion that arrives after a switch can be told apart from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelTicket {
    pub generation: u64,
    pub index: u32,
}

impl LabelTicket {
    pub fn new(generation: u64, index: u32) -> Self {
        Self { generation, index }
    }
}

/// Request for a label showing a point of interest's name
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub ticket: LabelTicket,
    pub text: String,
}

/// Builds label renderables on behalf of the session
pub trait LabelFactory {
    /// Begin building a label; completion is reported back to the session
    fn request_label(&mut self, request: LabelRequest);
}

/// Label factory that only records requests
///
/// The host (or a test) drains the queue and completes each request at a
/// time of its choosing.
#[derive(Debug, Default)]
pub struct QueuedLabelFactory {
    queue: VecDeque<LabelRequest>,
    total_requested: usize,
}

impl QueuedLabelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest request not yet completed
    pub fn pop_request(&mut self) -> Option<LabelRequest> {
        self.queue.pop_front()
    }

    /// Take every queued request, oldest first
    pub fn take_requests(&mut self) -> Vec<LabelRequest> {
        self.queue.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of requests received since creation
    pub fn total_requested(&self) -> usize {
        self.total_requested
    }
}

impl LabelFactory for QueuedLabelFactory {
    fn request_label(&mut self, request: LabelRequest) {
        self.queue.push_back(request);
        self.total_requested += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut factory = QueuedLabelFactory::new();

        for index in 0..3 {
            factory.request_label(LabelRequest {
                ticket: LabelTicket::new(1, index),
                text: format!("poi {}", index),
            });
        }

        assert_eq!(factory.pending(), 3);
        assert_eq!(factory.pop_request().map(|r| r.ticket.index), Some(0));

        let rest = factory.take_requests();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].text, "poi 1");
        assert_eq!(factory.pending(), 0);
        assert_eq!(factory.total_requested(), 3);
    }
}
