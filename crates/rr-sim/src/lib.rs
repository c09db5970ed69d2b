//! `rr-sim` — episode orchestrator for the reroute simulator.
//!
//! # Tick loop
//!
//! ```text
//! step(actions):
//!   ① Dispatch     — decode one action per learned bus; the whole step is
//!                    rejected before any mutation on a bad index or length.
//!   ② Demand       — Poisson arrivals for the current period, cloned into
//!                    the learned and baseline ledgers.
//!   ③ Movement     — both fleets advance along their paths.
//!   ④ Service      — alight the manifest, board FIFO up to capacity.
//!   ⑤ Waits        — recompute waits for riders still queued.
//!   ⑥ Score        — reward the learned fleet; advance the clock.
//!   ⑦ Disruptions  — revert closures, slowdowns and surges that expired.
//! ```
//!
//! # Modules
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | `sim`         | [`Sim`], [`EpisodeSummary`]                            |
//! | `builder`     | [`SimBuilder`]                                         |
//! | `score`       | [`ScoreModel`], weights and per-term breakdown         |
//! | `disruption`  | [`DisruptionManager`], kinds and parameters            |
//! | `info`        | [`StepOutcome`], [`StepInfo`], KPIs, display snapshot  |
//! | `policy`      | [`DispatchPolicy`], [`ConstantPolicy`]                 |
//! | `observer`    | [`SimObserver`], [`NoopObserver`]                      |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                  |
//! |-----------|---------------------------------------------------------|
//! | `fx-hash` | FxHash for the per-stop rider queues.                   |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rr_core::SimConfig;
//! use rr_fleet::DispatchAction;
//! use rr_sim::{ConstantPolicy, NoopObserver, Sim};
//!
//! let mut sim = Sim::new(SimConfig::default())?;
//! let summary = sim.run_episode(7, &mut ConstantPolicy(DispatchAction::HighDemand), &mut NoopObserver)?;
//! println!("reward {:.1}", summary.total_reward);
//! ```

pub mod builder;
pub mod disruption;
pub mod error;
pub mod info;
pub mod observer;
pub mod policy;
pub mod score;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use disruption::{Disruption, DisruptionEffect, DisruptionKind, DisruptionManager, DisruptionParams};
pub use error::{SimError, SimResult};
pub use info::{
    BusView, DisplaySnapshot, DisruptionView, ImprovementRatios, Kpis, RiderCounters, StepInfo, StepOutcome,
    StopView,
};
pub use observer::{NoopObserver, SimObserver};
pub use policy::{ConstantPolicy, DispatchPolicy};
pub use score::{RewardBreakdown, ScoreBaselines, ScoreModel, ScoreWeights};
pub use sim::{EpisodeSummary, Sim};
