//! Fixed-duration ticker behind the "analyzing" screen.
//!
//! The driver advances [`ProgressState`] one unit per tick on its own task.
//! It never looks at the analyzer; reaching 100% only means finalization
//! *may* begin. Only the most recently started run publishes; a run that
//! was superseded keeps quiet even if its task has not yet observed its
//! cancellation.

use leafdoc_core::config::ProgressSettings;
use leafdoc_core::progress::{ProgressObserver, ProgressState, ProgressUpdate, TickOutcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::{oneshot, watch};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Starts progress runs and fans their updates out to subscribers.
#[derive(Clone)]
pub struct ProgressDriver {
    settings: ProgressSettings,
    updates: watch::Sender<ProgressUpdate>,
    observers: Arc<RwLock<ObserverList>>,
    current_run: Arc<AtomicU64>,
}

#[derive(Default)]
struct ObserverList {
    next_id: u64,
    entries: Vec<(u64, Arc<dyn ProgressObserver>)>,
}

impl ObserverList {
    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }
}

impl ProgressDriver {
    pub fn new(settings: ProgressSettings) -> Self {
        let (updates, _) = watch::channel(ProgressUpdate::default());
        Self {
            settings,
            updates,
            observers: Arc::new(RwLock::new(ObserverList::default())),
            current_run: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Latest update of the current (or last) run.
    pub fn subscribe(&self) -> watch::Receiver<ProgressUpdate> {
        self.updates.subscribe()
    }

    /// Registers an observer for every published tick.
    ///
    /// The observer stays registered until the returned handle is dropped
    /// or [`ObserverHandle::remove`] is called.
    #[must_use = "dropping the handle unregisters the observer"]
    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) -> ObserverHandle {
        let mut list = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        list.next_id += 1;
        let id = list.next_id;
        list.entries.push((id, observer));
        ObserverHandle {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Resets to 0% and starts ticking until 100% or until `cancel` fires.
    ///
    /// Starting a run silences any earlier run still winding down.
    pub fn start(&self, cancel: CancellationToken) -> ProgressRun {
        let (finalize_tx, finalize_rx) = oneshot::channel();
        let tick_interval = self.settings.tick_interval();
        let publisher = self.clone();
        let task_cancel = cancel.clone();
        let run_id = self.current_run.fetch_add(1, Ordering::AcqRel) + 1;

        tokio::spawn(async move {
            let mut state = ProgressState::new();
            let mut finalize = Some(finalize_tx);
            publisher.publish(run_id, &state);

            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => {
                        tracing::debug!("[Progress] Cancelled at {}%", state.percent());
                        break;
                    }
                    _ = interval.tick() => {
                        let outcome = state.tick();
                        if !publisher.publish(run_id, &state) {
                            tracing::debug!("[Progress] Run {} superseded at {}%", run_id, state.percent());
                            break;
                        }
                        if outcome == TickOutcome::Completed {
                            if let Some(tx) = finalize.take() {
                                let _ = tx.send(());
                            }
                            tracing::debug!("[Progress] Reached 100%");
                            break;
                        }
                    }
                }
            }
        });

        ProgressRun {
            finalize: finalize_rx,
            cancel,
        }
    }

    /// Returns `false` without publishing when `run_id` is no longer current.
    fn publish(&self, run_id: u64, state: &ProgressState) -> bool {
        if self.current_run.load(Ordering::Acquire) != run_id {
            return false;
        }
        let update = state.update();
        self.updates.send_replace(update);

        let observers: Vec<_> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer.on_progress(update.percent, update.stage_index);
        }
        true
    }
}

/// Registration of a progress observer. Dropping it unregisters the observer.
pub struct ObserverHandle {
    id: u64,
    observers: Weak<RwLock<ObserverList>>,
}

impl ObserverHandle {
    /// Unregisters the observer. Returns `false` if it was already gone.
    pub fn remove(mut self) -> bool {
        self.unregister()
    }

    fn unregister(&mut self) -> bool {
        let Some(observers) = self.observers.upgrade() else {
            return false;
        };
        self.observers = Weak::new();
        let mut list = observers.write().unwrap_or_else(PoisonError::into_inner);
        list.remove(self.id)
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// One run of the driver.
pub struct ProgressRun {
    finalize: oneshot::Receiver<()>,
    cancel: CancellationToken,
}

impl ProgressRun {
    /// Resolves `true` once 100% is reached, `false` if the run stopped
    /// first (cancelled, superseded, or its task died). The finalization
    /// signal is delivered only once.
    pub async fn wait(self) -> bool {
        self.finalize.await.is_ok()
    }

    /// Stops ticking. Finalization will not be signalled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn driver() -> ProgressDriver {
        ProgressDriver::new(ProgressSettings {
            tick_interval_ms: 40,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaches_hundred_after_nominal_duration() {
        let driver = driver();
        let started = Instant::now();
        let run = driver.start(CancellationToken::new());

        assert!(run.wait().await);
        assert_eq!(started.elapsed(), Duration::from_secs(4));

        let update = *driver.subscribe().borrow();
        assert_eq!(update.percent, 100);
        assert_eq!(update.stage_index, 3);
        assert!(update.is_finalizing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalization_signalled_once() {
        let driver = driver();
        let completions = Arc::new(Mutex::new(0));
        let seen = completions.clone();
        let _observer = driver.add_observer(Arc::new(move |percent: u8, _stage: usize| {
            if percent == 100 {
                *seen.lock().unwrap() += 1;
            }
        }));

        let run = driver.start(CancellationToken::new());
        assert!(run.wait().await);

        // Let any stray ticks fire.
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*completions.lock().unwrap(), 1);
        assert_eq!(driver.subscribe().borrow().percent, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stages_observed_in_order() {
        let driver = driver();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();
        let _observer = driver.add_observer(Arc::new(move |_percent: u8, stage: usize| {
            let mut stages = seen.lock().unwrap();
            if stages.last() != Some(&stage) {
                stages.push(stage);
            }
        }));

        assert!(driver.start(CancellationToken::new()).wait().await);
        assert_eq!(*stages.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticking_without_finalization() {
        let driver = driver();
        let run = driver.start(CancellationToken::new());

        time::sleep(Duration::from_millis(1000)).await;
        run.cancel();
        let percent_at_cancel = driver.subscribe().borrow().percent;
        assert!(percent_at_cancel > 0 && percent_at_cancel < 100);

        assert!(!run.wait().await);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(driver.subscribe().borrow().percent, percent_at_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_observer_stops_receiving() {
        let driver = driver();
        let calls = Arc::new(Mutex::new(0));
        let seen = calls.clone();
        let handle = driver.add_observer(Arc::new(move |_percent: u8, _stage: usize| {
            *seen.lock().unwrap() += 1;
        }));
        assert_eq!(driver.observer_count(), 1);

        let run = driver.start(CancellationToken::new());
        time::sleep(Duration::from_millis(400)).await;
        assert!(handle.remove());
        assert_eq!(driver.observer_count(), 0);
        let calls_at_removal = *calls.lock().unwrap();
        assert!(calls_at_removal > 0);

        assert!(run.wait().await);
        assert_eq!(*calls.lock().unwrap(), calls_at_removal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_unregisters_observer() {
        let driver = driver();
        {
            let _observer = driver.add_observer(Arc::new(|_percent: u8, _stage: usize| {}));
            assert_eq!(driver.observer_count(), 1);
        }
        assert_eq!(driver.observer_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_run_stops_publishing() {
        let driver = driver();
        let first_cancel = CancellationToken::new();
        let first = driver.start(first_cancel.clone());
        time::sleep(Duration::from_millis(2000)).await;
        assert!(driver.subscribe().borrow().percent >= 49);

        // The first run is never cancelled, yet the newer run owns the channel.
        let second = driver.start(CancellationToken::new());
        time::sleep(Duration::from_millis(400)).await;
        let percent = driver.subscribe().borrow().percent;
        assert!(percent <= 11, "stale run published {percent}%");

        assert!(!first.wait().await);
        assert!(second.wait().await);
        assert!(!first_cancel.is_cancelled());
    }
}
