//! `rr-spatial` — street network, routing, and the stop registry.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`network`] | `StreetNetwork` (CSR + live edge state), `StreetNetworkBuilder` |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter`                     |
//! | [`stops`]   | `Stop`, `StopRegistry` (R-tree over stop coordinates)         |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public data types.      |

pub mod error;
pub mod network;
pub mod router;
pub mod stops;


pub use error::{SpatialError, SpatialResult};
pub use network::{StreetNetwork, StreetNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router};
pub use stops::{Stop, StopRegistry};
