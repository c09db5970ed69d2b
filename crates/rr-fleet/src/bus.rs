//! The bus entity.

use std::fmt;

use rr_core::{BusId, GridPoint, NodeId, StopId};
use rr_demand::Rider;

use crate::routes::StaticRoute;
use crate::state::Movement;

/// Who decides where the bus goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispatchMode {
    /// Follows its fixed loop and ignores demand.
    Static,
    /// Receives one [`DispatchAction`](crate::DispatchAction) per tick.
    Learned,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispatchMode::Static => "static",
            DispatchMode::Learned => "learned",
        })
    }
}

/// Coarse state-machine phase, derived from the bus fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusPhase {
    IdleAtStop,
    Pathing,
    Holding,
}

#[derive(Clone, Debug)]
pub struct Bus {
    pub id:           BusId,
    pub mode:         DispatchMode,
    pub capacity:     usize,
    pub node:         NodeId,
    pub pos:          GridPoint,
    pub target:       Option<StopId>,
    pub movement:     Movement,
    /// Riders aboard, in boarding order.  `load() == manifest.len()`.
    pub manifest:     Vec<Rider>,
    /// Odometer, in coarse per-tick units.
    pub distance:     f64,
    pub replan_count: u32,
    /// Remaining dwell in seconds.
    pub hold_timer:   f64,
    /// Static loop and the index of the stop being driven to.
    pub route:        Option<(StaticRoute, usize)>,
}

impl Bus {
    pub fn new(id: BusId, mode: DispatchMode, capacity: usize, node: NodeId, pos: GridPoint) -> Self {
        Self {
            id,
            mode,
            capacity,
            node,
            pos,
            target: None,
            movement: Movement::default(),
            manifest: Vec::with_capacity(capacity),
            distance: 0.0,
            replan_count: 0,
            hold_timer: 0.0,
            route: None,
        }
    }

    #[inline]
    pub fn load(&self) -> usize {
        self.manifest.len()
    }

    #[inline]
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.manifest.len())
    }

    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.load() as f64 / self.capacity as f64
        }
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.movement.is_moving()
    }

    #[inline]
    pub fn is_holding(&self) -> bool {
        self.hold_timer > 0.0
    }

    pub fn phase(&self) -> BusPhase {
        if self.is_holding() {
            BusPhase::Holding
        } else if self.is_moving() {
            BusPhase::Pathing
        } else {
            BusPhase::IdleAtStop
        }
    }

    /// The stop the static loop currently points at.
    pub fn route_stop(&self) -> Option<StopId> {
        self.route.as_ref().map(|(r, c)| r.stop(*c))
    }

    /// Step the static loop cursor.  Returns `true` on wrap-around.
    pub fn advance_route(&mut self) -> bool {
        match self.route.as_mut() {
            Some((r, c)) => {
                *c = r.next_cursor(*c);
                *c == 0
            }
            None => false,
        }
    }
}
