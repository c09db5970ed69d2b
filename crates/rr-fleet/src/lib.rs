//! `rr-fleet` — buses, dispatch and movement.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                         |
//! |------------|------------------------------------------------------------------|
//! | [`action`] | `DispatchAction` — the four discrete choices                     |
//! | [`state`]  | `Movement` — path, cursor and edge progress                      |
//! | [`bus`]    | `Bus`, `DispatchMode`, `BusPhase`                                |
//! | [`routes`] | `StaticRoute` — the baseline loops                               |
//! | [`fleet`]  | `Fleet<R>` — dispatch, movement, alight/board phases             |
//! | [`stats`]  | `FleetStats` — load, utilization, distance, replans              |
//! | [`error`]  | `FleetError`, `FleetResult<T>`                                   |
//!
//! # Bus state machine
//!
//! ```text
//! IDLE_AT_STOP ──target + path──► PATHING ──path end──► IDLE_AT_STOP
//!      │  ▲                          │ edge closed
//!      │  └──── no path (replan) ◄───┘ (replan, maybe resume PATHING)
//!      └──SHORT_HOLD──► HOLDING ──timer 0──► IDLE_AT_STOP
//! ```
//!
//! Movement is fixed-step: each tick adds `Δt / travel_time` to the current
//! edge's progress and snaps to the next node once it reaches 1.  Leftover
//! progress is discarded, so an edge always costs at least one tick.

pub mod action;
pub mod bus;
pub mod error;
pub mod fleet;
pub mod routes;
pub mod state;
pub mod stats;


pub use action::DispatchAction;
pub use bus::{Bus, BusPhase, DispatchMode};
pub use error::{FleetError, FleetResult};
pub use fleet::{Fleet, FleetContext};
pub use routes::StaticRoute;
pub use state::Movement;
pub use stats::FleetStats;
