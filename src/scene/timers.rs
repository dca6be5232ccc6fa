//! Timers behind the `wait` command.
//!
//! `Scene::wait` hands out a [`Delay`]; awaiting it is the only point where a
//! run suspends. Every delay is registered in [`Timers`], and cancelling the
//! registry (on `reset`, or from a host holding a clone of the handle)
//! resolves all outstanding delays as [`DelayOutcome::Cancelled`] without
//! publishing their "finished" notice.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use super::notify::Notifier;
use crate::log::debug;

/// Delay used when a script asks for `wait 0`
pub const ZERO_WAIT_FALLBACK: Duration = Duration::from_millis(1000);

/// Deadline offset used when `now + duration` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Unit of a `wait` count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUnit {
    Milliseconds,
    Seconds,
}

impl WaitUnit {
    /// Second-like words select seconds; anything else, or nothing, is
    /// milliseconds.
    pub fn from_word(word: Option<&str>) -> WaitUnit {
        match word.map(str::to_ascii_lowercase).as_deref() {
            Some("s" | "sec" | "second" | "seconds") => WaitUnit::Seconds,
            _ => WaitUnit::Milliseconds,
        }
    }

    /// `n` of this unit as a duration, with the zero fallback applied
    pub fn duration(self, n: u64) -> Duration {
        if n == 0 {
            return ZERO_WAIT_FALLBACK;
        }
        match self {
            WaitUnit::Milliseconds => Duration::from_millis(n),
            WaitUnit::Seconds => Duration::from_secs(n),
        }
    }

    /// `5 seconds`, `1 millisecond`
    pub fn describe(self, n: u64) -> String {
        let word = match self {
            WaitUnit::Milliseconds => "millisecond",
            WaitUnit::Seconds => "second",
        };
        let plural = if n == 1 { "" } else { "s" };
        format!("{n} {word}{plural}")
    }
}

/// How a delay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    Elapsed,
    Cancelled,
}

/// Registry of outstanding delays
#[derive(Clone, Default, Debug)]
pub struct Timers {
    pending: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<oneshot::Sender<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.lock();
        // Finished delays have dropped their receiver.
        pending.retain(|tx| !tx.is_closed());
        pending.push(tx);
        rx
    }

    /// Number of delays that have neither fired nor been dropped
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|tx| !tx.is_closed()).count()
    }

    /// Cancel every outstanding delay. Returns how many were live.
    pub fn cancel_all(&self) -> usize {
        let mut pending = self.lock();
        let live = pending.iter().filter(|tx| !tx.is_closed()).count();
        pending.clear();
        if live > 0 {
            debug!(live, "cancelled pending timers");
        }
        live
    }

    /// Schedule a delay of `duration` starting now
    pub(crate) fn schedule(
        &self,
        duration: Duration,
        notifier: Notifier,
        finished: String,
    ) -> Delay {
        let now = Instant::now();
        let deadline = now
            .checked_add(duration)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Delay {
            deadline,
            duration,
            cancel: self.register(),
            notifier,
            finished,
        }
    }
}

/// A scheduled timer. Await it (or call [`Delay::finished`]) to suspend
/// until it fires or is cancelled.
#[must_use = "a delay does nothing unless awaited"]
#[derive(Debug)]
pub struct Delay {
    deadline: Instant,
    duration: Duration,
    cancel: oneshot::Receiver<()>,
    notifier: Notifier,
    finished: String,
}

impl Delay {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Resolve once the timer fires (publishing its "finished" notice) or
    /// once it is cancelled.
    pub async fn finished(self) -> DelayOutcome {
        let Delay {
            deadline,
            cancel,
            notifier,
            finished,
            ..
        } = self;
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                notifier.info(finished);
                DelayOutcome::Elapsed
            }
            _ = cancel => DelayOutcome::Cancelled,
        }
    }
}

impl IntoFuture for Delay {
    type Output = DelayOutcome;
    type IntoFuture = Pin<Box<dyn Future<Output = DelayOutcome> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.finished())
    }
}
