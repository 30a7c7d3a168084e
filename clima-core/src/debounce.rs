//! Search-as-you-type debouncing.
//!
//! [`Debouncer`] is a clock-free state machine: callers pass `now` in, so
//! cancellation and firing can be checked without waiting. [`debounced`] runs
//! it on the tokio timer, turning a stream of keystrokes into a stream of
//! settled queries.

use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{Instant, sleep_until},
};
use tracing::trace;

/// Quiet period after the last keystroke before a lookup is issued.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug)]
struct Pending<T> {
    value: T,
    due: Instant,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `value` to fire `delay` after `now`. Returns the value whose
    /// pending lookup this cancels, if any.
    pub fn schedule(&mut self, now: Instant, value: T) -> Option<T> {
        let due = now + self.delay;
        self.pending
            .replace(Pending { value, due })
            .map(|cancelled| cancelled.value)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|cancelled| cancelled.value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its quiet period has elapsed by `now`.
    pub fn poll_due(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|due| due <= now) {
            self.pending.take().map(|p| p.value)
        } else {
            None
        }
    }
}

/// Forward only the values followed by `delay` of silence on `input`.
///
/// A value still pending when `input` closes fires once its quiet period ends.
pub fn debounced<T: Send + 'static>(
    mut input: mpsc::Receiver<T>,
    delay: Duration,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(delay);

        loop {
            let deadline = debouncer.deadline();
            tokio::select! {
                received = input.recv() => match received {
                    Some(value) => {
                        if debouncer.schedule(Instant::now(), value).is_some() {
                            trace!("pending lookup cancelled by new keystroke");
                        }
                    }
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(value) = debouncer.poll_due(Instant::now()) {
                        if tx.send(value).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }

        if let Some(deadline) = debouncer.deadline() {
            sleep_until(deadline).await;
            if let Some(value) = debouncer.poll_due(Instant::now()) {
                let _ = tx.send(value).await;
            }
        }
    });

    rx
}
