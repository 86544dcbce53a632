//! Media element events republished to the host
//!
//! The adapter listens to a set of native event names on the display
//! element, merges them into one stream in delivery order and drops an event
//! identical to the one right before it.

#[cfg(feature = "runtime")]
mod adapter;

#[cfg(feature = "runtime")]
pub use adapter::{EventSink, EventStreamAdapter, EventSubscription, ListenerId, MediaEventTarget};

use serde::{Deserialize, Serialize};

/// Events observed on every display element
pub const DEFAULT_EVENTS: &[&str] = &[
    "pause",
    "play",
    "canplay",
    "playing",
    "waiting",
    "ended",
    "seeked",
    "enterpictureinpicture",
    "leavepictureinpicture",
];

/// Native media element event
///
/// Two values compare equal only when they are the same native event
/// (same name and dispatch id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEvent {
    /// Event type, e.g. `"playing"`
    pub name: String,
    /// Dispatch id assigned by the element
    pub id: u64,
    /// Media position when dispatched, in seconds
    pub media_time: f64,
}

impl MediaEvent {
    pub fn new(name: impl Into<String>, id: u64, media_time: f64) -> Self {
        Self {
            name: name.into(),
            id,
            media_time,
        }
    }
}

/// Host extras followed by the defaults, duplicates removed
pub fn event_names<S: AsRef<str>>(extra: &[S]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(extra.len() + DEFAULT_EVENTS.len());
    let candidates = extra.iter().map(|s| s.as_ref()).chain(DEFAULT_EVENTS.iter().copied());

    for name in candidates {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Suppresses an item equal to its immediate predecessor
#[derive(Debug, Clone)]
pub struct DistinctUntilChanged<T> {
    last: Option<T>,
}

impl<T: PartialEq + Clone> DistinctUntilChanged<T> {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Returns true if `item` should be emitted
    pub fn admit(&mut self, item: &T) -> bool {
        if self.last.as_ref() == Some(item) {
            return false;
        }
        self.last = Some(item.clone());
        true
    }

    /// Forget the last emitted item
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl<T: PartialEq + Clone> Default for DistinctUntilChanged<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_event_names() {
        let names = event_names::<&str>(&[]);
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "pause");
        assert_eq!(names[8], "leavepictureinpicture");
    }

    #[test]
    fn test_extra_events_first_and_unique() {
        let names = event_names(&["timeupdate", "play", "timeupdate"]);
        assert_eq!(names[0], "timeupdate");
        assert_eq!(names[1], "play");
        assert_eq!(names.len(), 10);
        assert_eq!(names.iter().filter(|n| *n == "play").count(), 1);
    }

    #[test]
    fn test_identical_event_suppressed() {
        let mut distinct = DistinctUntilChanged::new();
        let play = MediaEvent::new("play", 1, 0.0);

        assert!(distinct.admit(&play));
        assert!(!distinct.admit(&play));
    }

    #[test]
    fn test_different_events_pass_in_order() {
        let mut distinct = DistinctUntilChanged::new();
        let events = [
            MediaEvent::new("play", 1, 0.0),
            MediaEvent::new("playing", 2, 0.0),
            MediaEvent::new("play", 3, 4.0),
        ];

        let admitted: Vec<_> = events.iter().filter(|e| distinct.admit(e)).map(|e| e.id).collect();
        assert_eq!(admitted, vec![1, 2, 3]);
    }

    #[test]
    fn test_only_immediate_predecessor_counts() {
        let mut distinct = DistinctUntilChanged::new();
        let a = MediaEvent::new("pause", 1, 0.0);
        let b = MediaEvent::new("play", 2, 0.0);

        assert!(distinct.admit(&a));
        assert!(distinct.admit(&b));
        assert!(distinct.admit(&a));

        distinct.reset();
        assert!(distinct.admit(&a));
    }
}
