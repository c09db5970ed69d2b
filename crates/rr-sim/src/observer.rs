//! Simulation observer trait for progress reporting and data collection.

use crate::info::StepOutcome;
use crate::sim::EpisodeSummary;

/// Callbacks invoked by [`Sim::run_episode`][crate::Sim::run_episode].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — reward logger
///
/// ```rust,ignore
/// struct RewardLog(Vec<f64>);
///
/// impl SimObserver for RewardLog {
///     fn on_step(&mut self, _step: u64, outcome: &StepOutcome) {
///         self.0.push(outcome.reward);
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once after the simulation has been reset.
    fn on_reset(&mut self, _seed: u64, _observation: &[f32]) {}

    /// Called after every successful step.  `step` counts from 1.
    fn on_step(&mut self, _step: u64, _outcome: &StepOutcome) {}

    /// Called once after the step that reported `done`.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
