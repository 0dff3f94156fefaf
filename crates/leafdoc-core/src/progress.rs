//! Progress state machine for the "analyzing" experience.
//!
//! This is cosmetic pacing: the state advances one unit per tick and knows
//! nothing about the real analyzer call. The async ticking lives in the
//! application layer; this module only holds the transitions.

use serde::Serialize;

/// Percent value at which finalization may begin.
pub const COMPLETE_PERCENT: u8 = 100;

/// Labels for the four analysis stages, indexed by stage.
pub const STAGE_LABELS: [&str; 4] = [
    "Analyzing image quality",
    "Identifying plant species",
    "Detecting disease patterns",
    "Generating diagnosis",
];

/// Maps a percent value to its stage by threshold.
///
/// `[0,20)` → 0, `[20,50)` → 1, `[50,80)` → 2, `[80,100]` → 3.
pub fn stage_for_percent(percent: u8) -> usize {
    match percent {
        0..=19 => 0,
        20..=49 => 1,
        50..=79 => 2,
        _ => 3,
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Percent moved forward, not yet complete.
    Advanced,
    /// Percent just reached 100. Returned at most once per run.
    Completed,
    /// The run already completed; nothing changed.
    Idle,
}

/// Transient progress of one scan flow. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    percent: u8,
    stage_index: usize,
    is_finalizing: bool,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns to 0% / stage 0.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances one unit.
    ///
    /// Stages never regress, and `Completed` is reported exactly once even if
    /// the caller keeps ticking after completion.
    pub fn tick(&mut self) -> TickOutcome {
        if self.is_finalizing {
            return TickOutcome::Idle;
        }

        self.percent = self.percent.saturating_add(1).min(COMPLETE_PERCENT);
        self.stage_index = self.stage_index.max(stage_for_percent(self.percent));

        if self.percent == COMPLETE_PERCENT {
            self.is_finalizing = true;
            TickOutcome::Completed
        } else {
            TickOutcome::Advanced
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn stage_label(&self) -> &'static str {
        STAGE_LABELS[self.stage_index]
    }

    pub fn is_finalizing(&self) -> bool {
        self.is_finalizing
    }

    /// Snapshot suitable for publishing to subscribers.
    pub fn update(&self) -> ProgressUpdate {
        ProgressUpdate {
            percent: self.percent,
            stage_index: self.stage_index,
            stage_label: self.stage_label(),
            is_finalizing: self.is_finalizing,
        }
    }
}

/// What progress subscribers receive on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub percent: u8,
    pub stage_index: usize,
    pub stage_label: &'static str,
    pub is_finalizing: bool,
}

impl Default for ProgressUpdate {
    fn default() -> Self {
        ProgressState::new().update()
    }
}

/// Receives live progress for UI updates.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, percent: u8, stage_index: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(u8, usize) + Send + Sync,
{
    fn on_progress(&self, percent: u8, stage_index: usize) {
        self(percent, stage_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_thresholds() {
        assert_eq!(stage_for_percent(0), 0);
        assert_eq!(stage_for_percent(19), 0);
        assert_eq!(stage_for_percent(20), 1);
        assert_eq!(stage_for_percent(49), 1);
        assert_eq!(stage_for_percent(50), 2);
        assert_eq!(stage_for_percent(79), 2);
        assert_eq!(stage_for_percent(80), 3);
        assert_eq!(stage_for_percent(100), 3);
    }

    #[test]
    fn test_hundred_ticks_complete_once() {
        let mut state = ProgressState::new();
        let mut completions = 0;
        let mut last_stage = 0;

        for _ in 0..150 {
            match state.tick() {
                TickOutcome::Completed => completions += 1,
                TickOutcome::Advanced | TickOutcome::Idle => {}
            }
            assert!(state.stage_index() >= last_stage, "stage regressed");
            last_stage = state.stage_index();
        }

        assert_eq!(completions, 1);
        assert_eq!(state.percent(), 100);
        assert_eq!(state.stage_index(), 3);
        assert!(state.is_finalizing());
        assert_eq!(state.stage_label(), "Generating diagnosis");
    }

    #[test]
    fn test_reset() {
        let mut state = ProgressState::new();
        for _ in 0..60 {
            state.tick();
        }
        assert_eq!(state.stage_index(), 2);

        state.reset();
        assert_eq!(state.percent(), 0);
        assert_eq!(state.stage_index(), 0);
        assert!(!state.is_finalizing());
    }

    #[test]
    fn test_closure_observer() {
        use std::sync::Mutex;

        let seen = Mutex::new(Vec::new());
        let observer = |percent: u8, stage: usize| seen.lock().unwrap().push((percent, stage));
        observer.on_progress(21, 1);
        assert_eq!(*seen.lock().unwrap(), vec![(21, 1)]);
    }
}
