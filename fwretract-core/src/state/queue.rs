//! Deferred `SET_RETRACTION` requests

use fwretract_protocol::SetRetraction;
use heapless::Vec;

/// Maximum number of queued requests
pub const DEFERRED_QUEUE_CAPACITY: usize = 16;

/// Requests received while retracted, replayed in arrival order
///
/// A request arriving at a full queue is folded into the newest entry. The
/// later fields win there exactly as they would on replay, so the final
/// configuration is unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    entries: Vec<SetRetraction, DEFERRED_QUEUE_CAPACITY>,
}

impl DeferredQueue {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a request, returns its 1-based position
    pub fn push(&mut self, request: SetRetraction) -> usize {
        if let Err(request) = self.entries.push(request) {
            if let Some(last) = self.entries.last_mut() {
                last.merge(&request);
            }
            #[cfg(feature = "defmt")]
            defmt::warn!("deferred queue full, merged into last entry");
        }
        self.entries.len()
    }

    /// Remove and return every queued request
    pub fn take(&mut self) -> Vec<SetRetraction, DEFERRED_QUEUE_CAPACITY> {
        core::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &SetRetraction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(value: f64) -> SetRetraction {
        SetRetraction {
            retract_length: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = DeferredQueue::new();
        assert_eq!(queue.push(length(1.0)), 1);
        assert_eq!(queue.push(length(2.0)), 2);

        let taken = queue.take();
        assert!(queue.is_empty());
        assert_eq!(taken[0].retract_length, Some(1.0));
        assert_eq!(taken[1].retract_length, Some(2.0));
    }

    #[test]
    fn test_overflow_merges_into_last() {
        let mut queue = DeferredQueue::new();
        for i in 0..DEFERRED_QUEUE_CAPACITY {
            queue.push(length(i as f64));
        }

        let position = queue.push(SetRetraction {
            z_hop_height: Some(0.6),
            ..length(99.0)
        });

        assert_eq!(position, DEFERRED_QUEUE_CAPACITY);
        assert_eq!(queue.len(), DEFERRED_QUEUE_CAPACITY);
        let last = queue.iter().last().unwrap();
        assert_eq!(last.retract_length, Some(99.0));
        assert_eq!(last.z_hop_height, Some(0.6));
    }

    #[test]
    fn test_clear() {
        let mut queue = DeferredQueue::new();
        queue.push(length(1.0));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.iter().count(), 0);
    }
}
