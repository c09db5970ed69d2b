//! Fleet controller: dispatch, movement and boarding for every bus.
//!
//! # Tick phases
//!
//! The simulation calls these in order once per tick:
//!
//! 1. [`Fleet::apply_actions`] — learned buses only, idle buses only.
//! 2. [`Fleet::advance`] — hold countdown, path planning, edge progress,
//!    replanning on closed edges, arrival handling.
//! 3. [`Fleet::service_stops`] — alight then board at every stationary bus
//!    standing on a stop.
//!
//! Per-bus failures (unreachable target, closed edge) are absorbed into the
//! bus's replan counter; none of these methods fail once actions validate.

use rr_core::{BusId, NodeId, StopId};
use rr_demand::RiderLedger;
use rr_spatial::{DijkstraRouter, Router, StopRegistry, StreetNetwork};

use crate::action::DispatchAction;
use crate::bus::{Bus, DispatchMode};
use crate::routes::StaticRoute;
use crate::stats::FleetStats;
use crate::{FleetError, FleetResult};

/// Dwell set by [`DispatchAction::ShortHold`], in ticks.  The timer itself
/// holds seconds, so it is scaled by Δt when set.
pub const SHORT_HOLD_TICKS: f64 = 2.0;
/// SKIP_LOW only fires when the reference stop has fewer riders than this.
pub const SKIP_LOW_THRESHOLD: usize = 2;
/// SKIP_LOW search radius, in grid blocks.
pub const SKIP_LOW_RADIUS: u32 = 8;
/// HIGH_DEMAND distance discount: `queue / (1 + d / HIGH_DEMAND_DISTANCE_SCALE)`.
pub const HIGH_DEMAND_DISTANCE_SCALE: f64 = 10.0;

/// Read-only context every fleet phase needs.
#[derive(Clone, Copy)]
pub struct FleetContext<'a> {
    pub network:       &'a StreetNetwork,
    pub stops:         &'a StopRegistry,
    pub dt:            f64,
    pub odometer_step: f64,
}

/// A set of buses sharing one dispatch mode and one router.
///
/// # Type parameter
///
/// `R` is the path planner.  It defaults to [`DijkstraRouter`].
pub struct Fleet<R: Router = DijkstraRouter> {
    pub router: R,
    buses:      Vec<Bus>,
}

impl Fleet<DijkstraRouter> {
    /// Spawn `count` buses with the default router.  See [`Fleet::spawn_with`].
    pub fn spawn(
        mode:     DispatchMode,
        count:    usize,
        capacity: usize,
        routes:   &[StaticRoute],
        ctx:      &FleetContext<'_>,
    ) -> Self {
        Self::spawn_with(DijkstraRouter, mode, count, capacity, routes, ctx)
    }
}

impl<R: Router> Fleet<R> {
    /// Spawn `count` buses at their loop positions.
    ///
    /// Bus `i` is assigned loop `i % routes.len()` and starts on that loop's
    /// stop `i / routes.len()` (wrapping), so both fleets built from the same
    /// routes start on identical nodes.  Static buses keep the loop; learned
    /// buses only use it for placement.
    pub fn spawn_with(
        router:   R,
        mode:     DispatchMode,
        count:    usize,
        capacity: usize,
        routes:   &[StaticRoute],
        ctx:      &FleetContext<'_>,
    ) -> Self {
        let buses = (0..count)
            .map(|i| {
                let id = BusId(i as u32);
                let assigned = if routes.is_empty() {
                    None
                } else {
                    let route = &routes[i % routes.len()];
                    let cursor = (i / routes.len()) % route.lap_len();
                    Some((route.clone(), cursor))
                };
                let start_stop = assigned
                    .as_ref()
                    .map(|(r, c)| r.stop(*c))
                    .or_else(|| ctx.stops.ids().nth(i % ctx.stops.len().max(1)));
                let node = start_stop.and_then(|s| ctx.stops.node(s)).unwrap_or(NodeId(0));
                let pos = ctx.network.pos(node).unwrap_or_default();

                let mut bus = Bus::new(id, mode, capacity, node, pos);
                if mode == DispatchMode::Static {
                    bus.route = assigned;
                }
                bus
            })
            .collect();
        Self { router, buses }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.buses.get(id.index())
    }

    pub fn bus_mut(&mut self, id: BusId) -> Option<&mut Bus> {
        self.buses.get_mut(id.index())
    }

    pub fn learned_count(&self) -> usize {
        self.buses.iter().filter(|b| b.mode == DispatchMode::Learned).count()
    }

    /// Fleet-level read model, recomputed on every call.
    pub fn stats(&self) -> FleetStats {
        FleetStats::compute(&self.buses)
    }

    // ── Phase 1: dispatch ─────────────────────────────────────────────────

    /// Apply one action per learned bus, in bus-id order.
    ///
    /// The length is checked before any bus is touched.  Actions for buses
    /// that are pathing or holding are ignored.
    pub fn apply_actions(
        &mut self,
        actions: &[DispatchAction],
        ledger:  &RiderLedger,
        ctx:     &FleetContext<'_>,
    ) -> FleetResult<()> {
        let expected = self.learned_count();
        if actions.len() != expected {
            return Err(FleetError::ActionCountMismatch { expected, got: actions.len() });
        }
        let learned = self.buses.iter_mut().filter(|b| b.mode == DispatchMode::Learned);
        for (bus, &action) in learned.zip(actions) {
            if bus.is_moving() || bus.is_holding() {
                continue;
            }
            dispatch(bus, action, ledger, ctx);
        }
        Ok(())
    }

    // ── Phase 2: movement ─────────────────────────────────────────────────

    pub fn advance(&mut self, ctx: &FleetContext<'_>) {
        let router = &self.router;
        for bus in &mut self.buses {
            step_bus(router, bus, ctx);
        }
    }

    // ── Phase 3: alight & board ───────────────────────────────────────────

    /// Returns `(alighted, boarded)` rider counts for the tick.
    pub fn service_stops(&mut self, ledger: &mut RiderLedger, now: f64, stops: &StopRegistry) -> (usize, usize) {
        let mut alighted = 0;
        let mut boarded = 0;
        for bus in &mut self.buses {
            if bus.is_moving() {
                continue;
            }
            let Some(stop) = stops.stop_at(bus.node) else { continue };

            let (off, stay): (Vec<_>, Vec<_>) =
                std::mem::take(&mut bus.manifest).into_iter().partition(|r| r.destination == stop);
            bus.manifest = stay;
            alighted += off.len();
            ledger.complete(off);

            let room = bus.remaining_capacity();
            if room > 0 {
                let on = ledger.board(stop, room, now);
                boarded += on.len();
                bus.manifest.extend(on);
            }
            debug_assert!(bus.load() <= bus.capacity);
        }
        (alighted, boarded)
    }
}

// ── Dispatch rules ────────────────────────────────────────────────────────────

fn dispatch(bus: &mut Bus, action: DispatchAction, ledger: &RiderLedger, ctx: &FleetContext<'_>) {
    let here = ctx.stops.stop_at(bus.node);
    match action {
        DispatchAction::Continue => {
            if bus.target.is_none() {
                bus.target = ctx.stops.nearest_to(bus.pos, here);
            }
        }
        DispatchAction::HighDemand => {
            if let Some(best) = highest_demand(bus, here, ledger, ctx) {
                bus.target = Some(best);
            }
        }
        DispatchAction::SkipLow => {
            if let Some(better) = skip_low_candidate(bus, here, ledger, ctx) {
                log::debug!("{} skips {:?} for {better}", bus.id, bus.target.or(here));
                bus.target = Some(better);
                bus.replan_count += 1;
            }
        }
        DispatchAction::ShortHold => {
            bus.hold_timer = SHORT_HOLD_TICKS * ctx.dt;
        }
    }
}

/// `argmax queue / (1 + d / 10)` over every stop but `here`; `None` when no
/// stop has anyone waiting.  Ties go to the lowest id.
fn highest_demand(bus: &Bus, here: Option<StopId>, ledger: &RiderLedger, ctx: &FleetContext<'_>) -> Option<StopId> {
    let mut best: Option<(f64, StopId)> = None;
    for stop in ctx.stops.iter() {
        if Some(stop.id) == here {
            continue;
        }
        let q = ledger.queue_length(stop.id);
        if q == 0 {
            continue;
        }
        let d = bus.pos.l1_distance(stop.pos) as f64;
        let score = q as f64 / (1.0 + d / HIGH_DEMAND_DISTANCE_SCALE);
        // Strict `>` keeps the first (lowest-id) stop on ties.
        if best.is_none_or(|(s, _)| score > s) {
            best = Some((score, stop.id));
        }
    }
    best.map(|(_, id)| id)
}

/// A stop within [`SKIP_LOW_RADIUS`] of the reference stop whose queue beats
/// the reference by more than one rider.  Largest queue wins, then lowest id.
fn skip_low_candidate(bus: &Bus, here: Option<StopId>, ledger: &RiderLedger, ctx: &FleetContext<'_>) -> Option<StopId> {
    let reference = bus.target.or(here)?;
    let ref_q = ledger.queue_length(reference);
    if ref_q >= SKIP_LOW_THRESHOLD {
        return None;
    }
    let centre = ctx.stops.pos(reference)?;
    ctx.stops
        .within_l1(centre, SKIP_LOW_RADIUS)
        .into_iter()
        .filter(|&s| s != reference && Some(s) != here)
        .map(|s| (ledger.queue_length(s), s))
        .filter(|&(q, _)| q > ref_q + 1)
        .min_by_key(|&(q, s)| (std::cmp::Reverse(q), s))
        .map(|(_, s)| s)
}

// ── Movement ──────────────────────────────────────────────────────────────────

fn plan<R: Router>(router: &R, network: &StreetNetwork, from: NodeId, to: NodeId) -> Vec<NodeId> {
    match router.route(network, from, to) {
        Ok(route) => route.nodes,
        Err(_) => Vec::new(),
    }
}

fn step_bus<R: Router>(router: &R, bus: &mut Bus, ctx: &FleetContext<'_>) {
    if bus.hold_timer > 0.0 {
        bus.hold_timer = (bus.hold_timer - ctx.dt).max(0.0);
        return;
    }

    if !bus.is_moving() {
        if bus.target.is_none() && bus.mode == DispatchMode::Static {
            bus.target = bus.route_stop();
        }
        let Some(target) = bus.target else { return };
        let Some(goal) = ctx.stops.node(target) else {
            bus.target = None;
            return;
        };
        let path = plan(router, ctx.network, bus.node, goal);
        match path.len() {
            0 => {
                unreachable_target(bus, target);
                return;
            }
            1 => {
                arrive(bus);
                return;
            }
            _ => bus.movement.begin(path),
        }
    }

    let Some((hop, next)) = bus.movement.current_edge() else {
        bus.movement.clear();
        return;
    };
    let tt = ctx.network.travel_time(hop, next);
    if !tt.is_finite() {
        replan(router, bus, ctx);
        return;
    }

    bus.movement.progress += ctx.dt / tt;
    bus.distance += ctx.odometer_step;

    if bus.movement.progress >= 1.0 {
        if let Some((node, at_end)) = bus.movement.advance() {
            bus.node = node;
            bus.pos = ctx.network.pos(node).unwrap_or(bus.pos);
            if at_end {
                bus.movement.clear();
                arrive(bus);
            }
        }
    }
}

/// The next edge went to `∞`: recompute from the current node.
fn replan<R: Router>(router: &R, bus: &mut Bus, ctx: &FleetContext<'_>) {
    bus.replan_count += 1;
    let goal = bus.target.and_then(|t| ctx.stops.node(t));
    let path = goal.map(|g| plan(router, ctx.network, bus.node, g)).unwrap_or_default();
    match path.len() {
        0 => {
            bus.movement.clear();
            log::debug!("{} lost its path at {}, idling", bus.id, bus.node);
            bus.target = None;
            if bus.mode == DispatchMode::Static {
                bus.advance_route();
            }
        }
        1 => {
            bus.movement.clear();
            arrive(bus);
        }
        _ => {
            log::debug!("{} replanned at {} ({} hops)", bus.id, bus.node, path.len() - 1);
            bus.movement.begin(path);
        }
    }
}

fn unreachable_target(bus: &mut Bus, target: StopId) {
    log::debug!("{} cannot reach {target} from {}", bus.id, bus.node);
    bus.target = None;
    bus.replan_count += 1;
    if bus.mode == DispatchMode::Static {
        bus.advance_route();
    }
}

/// Reached the target stop.  Static buses retarget the next loop stop;
/// learned buses wait for their next action.
fn arrive(bus: &mut Bus) {
    match bus.mode {
        DispatchMode::Static => {
            if bus.advance_route() {
                log::debug!("{} wrapped its loop", bus.id);
            }
            bus.target = bus.route_stop();
        }
        DispatchMode::Learned => bus.target = None,
    }
}
