//! Append-only event log owned by a registry.

use uuid::Uuid;

use crate::{Event, EventEnvelope};

/// Append-only, in-memory log of committed events.
///
/// Sequence numbers start at 1 and increase by exactly one per appended event;
/// entries are never modified or removed. The log has no interior locking: it
/// lives inside the owning registry's store lock so that a record mutation and
/// its log entry commit together.
#[derive(Debug, Clone)]
pub struct EventLog<E> {
    entries: Vec<EventEnvelope<E>>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E> EventLog<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number of the newest entry (0 when empty).
    pub fn last_sequence(&self) -> u64 {
        self.entries.last().map(|e| e.sequence_number()).unwrap_or(0)
    }

    pub fn entries(&self) -> &[EventEnvelope<E>] {
        &self.entries
    }

    /// Entries with a sequence number strictly greater than `sequence`.
    pub fn since(&self, sequence: u64) -> &[EventEnvelope<E>] {
        let start = usize::try_from(sequence).unwrap_or(usize::MAX).min(self.entries.len());
        &self.entries[start..]
    }
}

impl<E: Event> EventLog<E> {
    /// Append `event`, returning the envelope it was committed under.
    pub fn append(&mut self, event: E) -> &EventEnvelope<E> {
        let envelope = EventEnvelope::new(Uuid::now_v7(), self.last_sequence() + 1, event);
        self.entries.push(envelope);
        &self.entries[self.entries.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Noted(&'static str);

    impl Event for Noted {
        fn event_type(&self) -> &'static str {
            "test.noted"
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            epoch()
        }
    }

    #[test]
    fn sequence_numbers_start_at_one_and_increase() {
        let mut log = EventLog::new();
        assert_eq!(log.last_sequence(), 0);

        assert_eq!(log.append(Noted("a")).sequence_number(), 1);
        assert_eq!(log.append(Noted("b")).sequence_number(), 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last_sequence(), 2);
    }

    #[test]
    fn envelope_copies_event_metadata() {
        let mut log = EventLog::new();
        let envelope = log.append(Noted("a")).clone();
        assert_eq!(envelope.event_type(), "test.noted");
        assert_eq!(envelope.event_version(), 1);
        assert_eq!(envelope.occurred_at(), epoch());
        assert_eq!(envelope.payload(), &Noted("a"));
    }

    #[test]
    fn since_returns_only_newer_entries() {
        let mut log = EventLog::new();
        log.append(Noted("a"));
        log.append(Noted("b"));
        log.append(Noted("c"));

        let newer: Vec<_> = log.since(1).iter().map(|e| e.payload().0).collect();
        assert_eq!(newer, vec!["b", "c"]);
        assert!(log.since(3).is_empty());
        assert!(log.since(100).is_empty());
        assert_eq!(log.since(0).len(), 3);
    }
}
