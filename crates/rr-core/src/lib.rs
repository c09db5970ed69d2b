//! `rr-core` — foundational types for the `reroute` bus-dispatch simulator.
//!
//! This crate is a dependency of every other `rr-*` crate.  It intentionally
//! has no `rr-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                              |
//! |------------|-------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `EdgeId`, `StopId`, `BusId`, `RiderId`      |
//! | [`geo`]    | `GridPoint`, L1 / Euclidean grid distances            |
//! | [`time`]   | `SimClock` — fixed-Δt logical clock, time of day      |
//! | [`config`] | `SimConfig` with defaults and validation              |
//! | [`rng`]    | `SimRng` (seeded, injectable), Poisson sampling       |
//! | [`error`]  | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{CoreError, CoreResult};
pub use geo::GridPoint;
pub use ids::{BusId, EdgeId, NodeId, RiderId, StopId};
pub use rng::SimRng;
pub use time::SimClock;
