//! Bounded log of extractor progress events.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Default number of events retained.
pub const DEFAULT_CAPACITY: usize = 200;

/// Shared ring buffer of the most recent progress events.
///
/// Cloning yields another handle to the same buffer, so the extractor's hook
/// and the job that reads the diagnostics can each hold one.
#[derive(Clone, Debug)]
pub struct ProgressLog {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append an event, evicting the oldest once full.
    pub fn push(&self, event: impl Into<String>) {
        let mut events = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.into());
    }

    /// The last `n` events, oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let events = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = events.len().saturating_sub(n);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let log = ProgressLog::with_capacity(3);
        for i in 0..5 {
            log.push(format!("event {i}"));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.tail(10), vec!["event 2", "event 3", "event 4"]);
    }

    #[test]
    fn tail_returns_most_recent() {
        let log = ProgressLog::new();
        for i in 0..30 {
            log.push(i.to_string());
        }

        let tail = log.tail(25);
        assert_eq!(tail.len(), 25);
        assert_eq!(tail.first().map(String::as_str), Some("5"));
        assert_eq!(tail.last().map(String::as_str), Some("29"));
    }

    #[test]
    fn clones_share_buffer() {
        let log = ProgressLog::new();
        let hook = log.clone();
        hook.push("downloading");

        assert_eq!(log.tail(1), vec!["downloading"]);
    }

    #[test]
    fn default_capacity() {
        let log = ProgressLog::default();
        for i in 0..250 {
            log.push(i.to_string());
        }
        assert_eq!(log.len(), DEFAULT_CAPACITY);
        assert!(!log.is_empty());
    }
}
