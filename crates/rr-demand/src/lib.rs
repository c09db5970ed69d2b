//! `rr-demand` — rider generation and queueing.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`rider`]  | `Rider`                                                     |
//! | [`period`] | `TimePeriod` and its rate / destination tables              |
//! | [`surge`]  | `SurgeMap` (per-stop rate multipliers)                      |
//! | [`model`]  | `DemandModel` (seeded Poisson arrivals)                     |
//! | [`ledger`] | `RiderLedger` (FIFO queues, boarding, wait statistics)      |
//! | [`error`]  | `DemandError`, `DemandResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                              |
//! |-----------|-----------------------------------------------------|
//! | `serde`   | Derives `Serialize`/`Deserialize` on data types.    |
//! | `fx-hash` | FxHash instead of SipHash for the per-stop queues.  |

pub mod error;
pub mod ledger;
pub mod model;
pub mod period;
pub mod rider;
pub mod surge;


pub use error::{DemandError, DemandResult};
pub use ledger::{RiderLedger, WaitStats};
pub use model::DemandModel;
pub use period::TimePeriod;
pub use rider::Rider;
pub use surge::{MAX_SURGE, SurgeMap};
