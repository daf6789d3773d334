use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures::{Stream, StreamExt};
use stream_cancel::StreamExt as _;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::history::{HistoryBuffer, HistoryEntry};
use crate::pose_file::PoseFileReader;
use crate::viewport::{ViewportController, ViewportState, ZoomDirection, ZoomPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    Polling,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated { seq: u64 },
    NoChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStatus {
    pub state: PollState,
    pub last_outcome: Option<PollOutcome>,
    pub polls: u64,
    pub updates: u64,
}

// Only the poll task of the current source may touch history or status.
#[derive(Debug)]
pub struct TelemetryState {
    history: RwLock<HistoryBuffer>,
    viewport: RwLock<ViewportController>,
    status: Mutex<PollStatus>,
    source: AtomicU64,
    sequence: Arc<AtomicU64>,
}

impl TelemetryState {
    pub fn new(capacity: usize, initial_view: ViewportState, policy: ZoomPolicy) -> Self {
        Self {
            history: RwLock::new(HistoryBuffer::new(capacity)),
            viewport: RwLock::new(ViewportController::new(initial_view, policy)),
            status: Mutex::new(PollStatus::default()),
            source: AtomicU64::new(0),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.history_capacity, config.initial_view, config.zoom)
    }

    /// Retires the previous source: its trail and status are dropped and its
    /// poll task can no longer write. Returns the token of the new source.
    pub fn begin_source(&self) -> u64 {
        let source = {
            let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
            history.clear();
            self.source.fetch_add(1, Ordering::SeqCst) + 1
        };
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = PollStatus::default();
        source
    }

    fn is_current(&self, source: u64) -> bool {
        self.source.load(Ordering::SeqCst) == source
    }

    pub fn sequence(&self) -> Arc<AtomicU64> {
        self.sequence.clone()
    }

    pub fn push_from(&self, source: u64, entry: HistoryEntry) -> bool {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(source) {
            return false;
        }
        history.push(entry);
        true
    }

    pub fn history_snapshot(&self) -> (Vec<HistoryEntry>, Option<HistoryEntry>) {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        (history.all(), history.latest())
    }

    pub fn latest(&self) -> Option<HistoryEntry> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latest()
    }

    pub fn latest_seq(&self) -> Option<u64> {
        self.latest().map(|entry| entry.seq)
    }

    pub fn history_fill(&self) -> (usize, usize) {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        (history.len(), history.capacity())
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }

    pub fn viewport_revision(&self) -> u64 {
        self.viewport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision()
    }

    pub fn apply_zoom(&self, cursor_x: f64, cursor_y: f64, direction: ZoomDirection) -> ViewportState {
        self.viewport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply_zoom(cursor_x, cursor_y, direction)
    }

    pub fn pan(&self, dx: f64, dy: f64) -> ViewportState {
        self.viewport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pan(dx, dy)
    }

    pub fn reset_view(&self) -> ViewportState {
        self.viewport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reset()
    }

    pub fn status(&self) -> PollStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, source: u64, state: PollState) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_current(source) {
            status.state = state;
        }
    }

    fn record(&self, source: u64, outcome: PollOutcome) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(source) {
            return;
        }
        status.state = PollState::Idle;
        status.last_outcome = Some(outcome);
        status.polls += 1;
        if let PollOutcome::Updated { .. } = outcome {
            status.updates += 1;
        }
    }
}

/// One `Idle -> Polling -> {Updated | NoChange} -> Idle` cycle on behalf of
/// `source`. A cycle of a retired source changes nothing and reports `NoChange`.
pub async fn poll_cycle(
    reader: &mut PoseFileReader,
    state: &TelemetryState,
    source: u64,
    skip_repeats: bool,
) -> PollOutcome {
    state.set_state(source, PollState::Polling);

    let outcome = match reader.poll_once().await {
        Some(entry)
            if skip_repeats
                && state
                    .latest()
                    .is_some_and(|l| l.pose == entry.pose && l.reading == entry.reading) =>
        {
            PollOutcome::NoChange
        }
        Some(entry) if state.push_from(source, entry) => PollOutcome::Updated { seq: entry.seq },
        Some(entry) => {
            log::debug!("dropping sample #{} of a retired source", entry.seq);
            PollOutcome::NoChange
        }
        None => PollOutcome::NoChange,
    };

    state.record(source, outcome);
    outcome
}

fn ticks(period: Duration) -> impl Stream<Item = ()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    futures::stream::unfold(interval, |mut interval| async move {
        interval.tick().await;
        Some(((), interval))
    })
}

pub struct PollTask {
    trigger: Option<stream_cancel::Trigger>,
    handle: JoinHandle<()>,
}

impl PollTask {
    pub fn spawn(
        reader: PoseFileReader,
        state: Arc<TelemetryState>,
        interval: Duration,
        skip_repeats: bool,
    ) -> Self {
        let (trigger, tripwire) = stream_cancel::Tripwire::new();
        let source = state.begin_source();
        let mut reader = reader.with_sequence(state.sequence());

        let handle = tokio::spawn(async move {
            log::info!(
                "polling '{}' every {:?} ({})",
                reader.path().display(),
                interval,
                reader.encoding().name()
            );

            let ticks = ticks(interval).take_until_if(tripwire);
            tokio::pin!(ticks);
            while ticks.next().await.is_some() {
                if let PollOutcome::Updated { seq } =
                    poll_cycle(&mut reader, &state, source, skip_repeats).await
                {
                    log::trace!("sample #{} ingested", seq);
                }
            }

            state.set_state(source, PollState::Stopped);
            log::info!("stopped polling '{}'", reader.path().display());
        });

        Self {
            trigger: Some(trigger),
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.trigger.is_some() && !self.handle.is_finished()
    }

    pub fn stop(&mut self) {
        self.trigger.take();
    }

    pub async fn join(mut self) -> Result<(), tokio::task::JoinError> {
        self.stop();
        self.handle.await
    }
}
