//! Aggregation of progress events across concurrent tasks.

use super::{ProgressEvent, ProgressListener};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Point-in-time view of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Bytes present across all tracked files.
    pub transferred: u64,
    /// Sum of the known file sizes.
    pub expected: u64,
    /// Tracked tasks that reported `done`.
    pub finished: usize,
    /// Bytes per second over the sliding window.
    pub speed: f64,
    /// Remaining time at the current speed, when it can be estimated.
    pub eta: Option<Duration>,
}

#[derive(Debug)]
struct State {
    started: Instant,
    transferred: u64,
    expected: u64,
    finished: usize,
    samples: VecDeque<(Instant, u64)>,
}

impl State {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some((at, _)) = self.samples.front() {
            if now.saturating_duration_since(*at) > window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Folds `(bytes, delta, total, done)` events of many tasks into one view.
///
/// Each task reports through its own [`TrackedProgress`] obtained from
/// [`track`](Self::track), which lets the aggregator replace a task's
/// previous position and size instead of double counting them.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    state: Arc<Mutex<State>>,
    window: Duration,
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator computing speed over the last `window`.
    pub fn with_window(window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                started: Instant::now(),
                transferred: 0,
                expected: 0,
                finished: 0,
                samples: VecDeque::new(),
            })),
            window,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A listener for one more task.
    pub fn track(&self) -> TrackedProgress {
        TrackedProgress {
            aggregator: self.clone(),
            last: Mutex::new((0, 0, false)),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(Instant::now())
    }

    fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let mut state = self.lock();
        state.prune(now, self.window);

        let in_window: u64 = state.samples.iter().map(|(_, delta)| delta).sum();
        let span = now
            .saturating_duration_since(state.started)
            .min(self.window)
            .max(Duration::from_millis(1));
        let speed = in_window as f64 / span.as_secs_f64();

        let remaining = state.expected.saturating_sub(state.transferred);
        let eta = (speed > 0.0 && state.expected > 0)
            .then(|| Duration::from_secs_f64(remaining as f64 / speed));

        ProgressSnapshot {
            transferred: state.transferred,
            expected: state.expected,
            finished: state.finished,
            speed,
            eta,
        }
    }

    fn apply(&self, now: Instant, last: &mut (u64, u64, bool), event: ProgressEvent) {
        let (last_bytes, last_total, last_done) = *last;
        let total = event.total.unwrap_or(last_total);

        let mut state = self.lock();
        state.transferred = state.transferred - last_bytes.min(state.transferred) + event.bytes;
        state.expected = state.expected - last_total.min(state.expected) + total;
        if event.done && !last_done {
            state.finished += 1;
        }
        if event.delta > 0 {
            state.samples.push_back((now, event.delta));
        }
        state.prune(now, self.window);

        *last = (event.bytes, total, last_done || event.done);
    }
}

/// Listener feeding one task's events into a [`ProgressAggregator`].
#[derive(Debug)]
pub struct TrackedProgress {
    aggregator: ProgressAggregator,
    // bytes, total, done
    last: Mutex<(u64, u64, bool)>,
}

impl ProgressListener for TrackedProgress {
    fn on_progress(&self, event: ProgressEvent) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        self.aggregator.apply(Instant::now(), &mut last, event);
    }
}
