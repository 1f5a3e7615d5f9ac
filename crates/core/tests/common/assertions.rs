//! Helpers for checking collected events.

use cq_protocol::{Event, Stage, StageStatus};
use tokio::sync::mpsc::Receiver;

/// Drain every event currently buffered on `rx`.
pub fn drain_events(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Whether `events` contains a status update for `stage` to `status`.
#[allow(dead_code)]
pub fn has_status_update(events: &[Event], stage: Stage, status: StageStatus) -> bool {
    events.iter().any(|e| {
        matches!(
            e,
            Event::StageStatusUpdate { stage: s, status: st } if *s == stage && *st == status
        )
    })
}

/// Whether `events` contains a completion for `stage`.
#[allow(dead_code)]
pub fn has_completed(events: &[Event], stage: Stage) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::StageCompleted { stage: s, .. } if *s == stage))
}

/// The failure message reported for `stage`, if any.
#[allow(dead_code)]
pub fn failure_message(events: &[Event], stage: Stage) -> Option<String> {
    events.iter().find_map(|e| match e {
        Event::StageFailed { stage: s, error } if *s == stage => Some(error.clone()),
        _ => None,
    })
}

/// Whether `events` contains a rejection for `stage`.
#[allow(dead_code)]
pub fn has_rejection(events: &[Event], stage: Stage) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::StageRejected { stage: s, .. } if *s == stage))
}
