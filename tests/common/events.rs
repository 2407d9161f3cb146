//! Event collection helpers

use msil_extract::Event;
use tokio::sync::broadcast::Receiver;

/// Drain every event currently buffered in `rx`
///
/// Call after the operation under test has returned; all of its events are
/// already in the channel by then.
pub fn drain_events(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// `(offset, fetched, total)` of every page event, in order
pub fn page_progress(events: &[Event]) -> Vec<(u64, u64, u64)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PageFetched {
                offset,
                fetched,
                total,
                ..
            } => Some((*offset, *fetched, *total)),
            _ => None,
        })
        .collect()
}

/// `(name, expected, actual, matched)` of every verification event, in order
pub fn verifications(events: &[Event]) -> Vec<(String, u64, u64, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Verified {
                name,
                expected,
                actual,
                matched,
            } => Some((name.clone(), *expected, *actual, *matched)),
            _ => None,
        })
        .collect()
}
