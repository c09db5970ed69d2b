//! The `Sim` struct and its tick loop.

use rr_core::{SimClock, SimConfig, SimRng};
use rr_demand::{DemandModel, RiderLedger, TimePeriod};
use rr_fleet::{DispatchAction, DispatchMode, Fleet, FleetContext, FleetError, StaticRoute};
use rr_spatial::{DijkstraRouter, Router, StopRegistry, StreetNetwork};

use crate::disruption::{self, DisruptionKind, DisruptionManager, DisruptionParams};
use crate::info::{
    BusView, DisplaySnapshot, DisruptionView, ImprovementRatios, Kpis, RiderCounters, StepInfo,
    StepOutcome, StopView,
};
use crate::policy::DispatchPolicy;
use crate::score::{RewardBreakdown, ScoreModel};
use crate::{SimError, SimObserver, SimResult};

/// Observation scales: positions, hold timer, queue length.
const POSITION_SCALE: f32 = 20.0;
const HOLD_SCALE: f32 = 5.0;
const QUEUE_SCALE: f32 = 10.0;

/// Seed offset for the disruption helper stream.
const DISRUPTION_STREAM: u64 = 2;

/// Totals for one [`Sim::run_episode`] call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EpisodeSummary {
    pub seed:         u64,
    pub steps:        u64,
    pub total_reward: f64,
    pub final_info:   Option<StepInfo>,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<R>` owns the city, the demand stream and two fleet/ledger pairs:
/// the **learned** fleet driven by external actions and the **baseline**
/// fleet following fixed loops.  Each [`step`](Self::step):
///
/// 1. **Dispatch**: decode and apply one action per learned bus.
/// 2. **Demand**: draw one tick of arrivals and enqueue the same riders in
///    both ledgers.
/// 3. **Movement**: advance both fleets.
/// 4. **Service**: alight and board at stationary buses on stops.
/// 5. **Waits**: recompute waits in both ledgers.
/// 6. **Score**: reward the learned fleet, then advance the clock.
/// 7. **Disruptions**: revert any that have expired.
///
/// Create via [`Sim::new`] or [`SimBuilder`][crate::SimBuilder].
pub struct Sim<R: Router + Clone = DijkstraRouter> {
    /// Global configuration (layout, fleet size, Δt, horizon, seeds).
    pub config: SimConfig,

    /// Simulation clock.
    pub clock: SimClock,

    pub(crate) network:         StreetNetwork,
    pub(crate) stops:           StopRegistry,
    pub(crate) routes:          Vec<StaticRoute>,
    pub(crate) demand:          DemandModel,
    pub(crate) router:          R,
    pub(crate) learned:         Fleet<R>,
    pub(crate) baseline:        Fleet<R>,
    pub(crate) learned_ledger:  RiderLedger,
    pub(crate) baseline_ledger: RiderLedger,
    pub(crate) score:           ScoreModel,
    pub(crate) disruptions:     DisruptionManager,
    pub(crate) seed:            u64,
}

impl Sim<DijkstraRouter> {
    /// Build a simulation with a generated layout and the default router,
    /// reset with `config.seed`.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        crate::SimBuilder::new(config).build()
    }
}

impl<R: Router + Clone> Sim<R> {
    /// Generate the street grid and stop layout from `layout_seed`.
    pub(crate) fn generate_layout(config: &SimConfig) -> SimResult<(StreetNetwork, StopRegistry)> {
        let mut rng = SimRng::new(config.layout_seed);
        let network = StreetNetwork::grid(config.grid_size, &mut rng.child(0));
        let stops = StopRegistry::generate(&network, config.grid_size, config.num_stops, &mut rng.child(1))?;
        Ok((network, stops))
    }

    /// Assemble from validated parts and reset with `config.seed`.
    pub(crate) fn assemble(config: SimConfig, network: StreetNetwork, stops: StopRegistry, router: R) -> Self {
        let ids: Vec<_> = stops.ids().collect();
        let routes = StaticRoute::baseline_set(&ids);
        let demand = DemandModel::new(&stops, config.grid_size, config.seed);
        let ctx = FleetContext {
            network:       &network,
            stops:         &stops,
            dt:            config.dt,
            odometer_step: config.odometer_step,
        };
        let learned = Fleet::spawn_with(
            router.clone(),
            DispatchMode::Learned,
            config.num_buses,
            config.bus_capacity,
            &routes,
            &ctx,
        );
        let baseline = Fleet::spawn_with(
            router.clone(),
            DispatchMode::Static,
            config.num_buses,
            config.bus_capacity,
            &routes,
            &ctx,
        );
        let seed = config.seed;
        let mut sim = Self {
            clock: config.make_clock(),
            network,
            stops,
            routes,
            demand,
            router,
            learned,
            baseline,
            learned_ledger: RiderLedger::new(),
            baseline_ledger: RiderLedger::new(),
            score: ScoreModel::default(),
            disruptions: DisruptionManager::new(seed),
            seed,
            config,
        };
        sim.reset(seed);
        sim
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Start a new episode: reseed demand, clear surges and street
    /// conditions, recreate both fleets and ledgers.  The layout is kept.
    pub fn reset(&mut self, seed: u64) -> Vec<f32> {
        self.seed = seed;
        self.demand.reseed(seed);
        self.demand.clear_surges();
        self.network.reset_conditions();
        self.disruptions.reset(SimRng::new(seed).child(DISRUPTION_STREAM).random());

        let ctx = FleetContext {
            network:       &self.network,
            stops:         &self.stops,
            dt:            self.config.dt,
            odometer_step: self.config.odometer_step,
        };
        self.learned = Fleet::spawn_with(
            self.router.clone(),
            DispatchMode::Learned,
            self.config.num_buses,
            self.config.bus_capacity,
            &self.routes,
            &ctx,
        );
        self.baseline = Fleet::spawn_with(
            self.router.clone(),
            DispatchMode::Static,
            self.config.num_buses,
            self.config.bus_capacity,
            &self.routes,
            &ctx,
        );
        self.learned_ledger.clear();
        self.baseline_ledger.clear();
        self.score.reset();
        self.clock.reset();

        log::info!(
            "reset: seed {seed}, {} buses, {} stops, horizon {}s",
            self.config.num_buses,
            self.stops.len(),
            self.config.episode_horizon
        );
        self.observation()
    }

    /// Advance one tick with raw action indices (`0..=3`, one per learned
    /// bus).  The whole call is rejected before any state changes if an index
    /// is out of range or the length is wrong.
    pub fn step(&mut self, actions: &[u8]) -> SimResult<StepOutcome> {
        let decoded = DispatchAction::decode_all(actions).map_err(|e| {
            log::warn!("step rejected: {e}");
            SimError::from(e)
        })?;
        self.step_actions(&decoded)
    }

    /// Advance one tick with typed actions.
    pub fn step_actions(&mut self, actions: &[DispatchAction]) -> SimResult<StepOutcome> {
        let expected = self.learned.learned_count();
        if actions.len() != expected {
            let e = FleetError::ActionCountMismatch { expected, got: actions.len() };
            log::warn!("step rejected: {e}");
            return Err(e.into());
        }

        let now = self.clock.elapsed();
        let dt = self.config.dt;
        let period = self.period();
        let ctx = FleetContext {
            network:       &self.network,
            stops:         &self.stops,
            dt,
            odometer_step: self.config.odometer_step,
        };

        // ── ① Dispatch ────────────────────────────────────────────────────
        self.learned.apply_actions(actions, &self.learned_ledger, &ctx)?;

        // ── ② Demand ──────────────────────────────────────────────────────
        let arrivals = self.demand.generate_arrivals(now, dt, period);
        self.baseline_ledger.enqueue(arrivals.iter().cloned());
        self.learned_ledger.enqueue(arrivals);

        // ── ③ Movement ────────────────────────────────────────────────────
        self.learned.advance(&ctx);
        self.baseline.advance(&ctx);

        // ── ④ Service ─────────────────────────────────────────────────────
        self.learned.service_stops(&mut self.learned_ledger, now, &self.stops);
        self.baseline.service_stops(&mut self.baseline_ledger, now, &self.stops);

        // ── ⑤ Waits ───────────────────────────────────────────────────────
        self.learned_ledger.tick_wait_times(now);
        self.baseline_ledger.tick_wait_times(now);

        // ── ⑥ Score & clock ───────────────────────────────────────────────
        let learned_stats = self.learned.stats();
        let reward = self.score.score(&self.learned_ledger.stats(), &learned_stats);
        self.clock.advance();
        let elapsed = self.clock.elapsed();

        // ── ⑦ Disruptions ─────────────────────────────────────────────────
        self.disruptions.expire(elapsed, &mut self.network, &mut self.demand);

        let done = elapsed >= self.config.episode_horizon;
        let info = self.info(period, Kpis::collect(&self.learned_ledger, &learned_stats));
        if done {
            log::info!(
                "episode done at t={elapsed:.0}s: mean wait {:.2}s vs baseline {:.2}s",
                info.learned_kpis.mean_wait,
                info.baseline_kpis.mean_wait
            );
        }
        Ok(StepOutcome { observation: self.observation(), reward, done, info })
    }

    /// Apply a disruption by kind name.  Returns `false` (and logs why) on an
    /// unknown kind or bad parameters; nothing is mutated in that case.
    pub fn apply_disruption(&mut self, kind: &str, params: &DisruptionParams) -> bool {
        match self.try_apply_disruption(kind, params) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("disruption {kind:?} rejected: {e}");
                false
            }
        }
    }

    /// Like [`apply_disruption`](Self::apply_disruption) but returns the new
    /// disruption id or the reason it was rejected.
    pub fn try_apply_disruption(&mut self, kind: &str, params: &DisruptionParams) -> SimResult<String> {
        let kind: DisruptionKind = kind.parse()?;
        let now = self.clock.elapsed();
        self.disruptions.apply(kind, params, now, &mut self.network, &mut self.demand)
    }

    /// Revert every active disruption immediately.
    pub fn clear_disruptions(&mut self) {
        self.disruptions.clear(&mut self.network, &mut self.demand);
    }

    /// Run one full episode from `reset(seed)` until `done`.
    pub fn run_episode<P, O>(&mut self, seed: u64, policy: &mut P, observer: &mut O) -> SimResult<EpisodeSummary>
    where
        P: DispatchPolicy,
        O: SimObserver,
    {
        let mut observation = self.reset(seed);
        observer.on_reset(seed, &observation);
        let bus_count = self.learned.learned_count();

        let mut summary = EpisodeSummary { seed, steps: 0, total_reward: 0.0, final_info: None };
        loop {
            let actions = policy.decide(&observation, bus_count);
            let outcome = self.step_actions(&actions)?;
            summary.steps += 1;
            summary.total_reward += outcome.reward;
            observer.on_step(summary.steps, &outcome);
            let done = outcome.done;
            observation = outcome.observation;
            if done {
                summary.final_info = Some(outcome.info);
                break;
            }
        }
        observer.on_episode_end(&summary);
        Ok(summary)
    }

    // ── Read model ────────────────────────────────────────────────────────

    /// Flat observation: per learned bus `[x/20, y/20, utilization,
    /// is_moving, hold/5]`, then per stop (ascending id)
    /// `min(queue/10, 1)`.
    pub fn observation(&self) -> Vec<f32> {
        let mut obs = Vec::with_capacity(self.learned.len() * 5 + self.stops.len());
        for bus in self.learned.buses() {
            obs.push(bus.pos.x as f32 / POSITION_SCALE);
            obs.push(bus.pos.y as f32 / POSITION_SCALE);
            obs.push(bus.utilization() as f32);
            obs.push(if bus.is_moving() { 1.0 } else { 0.0 });
            obs.push(bus.hold_timer as f32 / HOLD_SCALE);
        }
        for stop in self.stops.ids() {
            let q = self.learned_ledger.queue_length(stop) as f32;
            obs.push((q / QUEUE_SCALE).min(1.0));
        }
        obs
    }

    pub fn snapshot_for_display(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            elapsed_time:   self.clock.elapsed(),
            clock:          self.clock.hm(),
            buses:          self.learned.buses().iter().map(BusView::from).collect(),
            baseline_buses: self.baseline.buses().iter().map(BusView::from).collect(),
            stops:          self
                .stops
                .iter()
                .map(|s| StopView {
                    id:           s.id.0,
                    x:            s.pos.x,
                    y:            s.pos.y,
                    queue_length: self.learned_ledger.queue_length(s.id),
                })
                .collect(),
            kpis:           self.learned_kpis(),
            baseline_kpis:  self.baseline_kpis(),
            disruptions:    self
                .disruptions
                .active()
                .iter()
                .map(|d| DisruptionView { id: d.id.clone(), kind: d.effect.kind(), expires_at: d.expires_at() })
                .collect(),
        }
    }

    pub fn learned_kpis(&self) -> Kpis {
        Kpis::collect(&self.learned_ledger, &self.learned.stats())
    }

    pub fn baseline_kpis(&self) -> Kpis {
        Kpis::collect(&self.baseline_ledger, &self.baseline.stats())
    }

    pub fn reward_breakdown(&self) -> &RewardBreakdown {
        self.score.breakdown()
    }

    /// Demand period at the current simulated time of day.
    pub fn period(&self) -> TimePeriod {
        TimePeriod::from_minute_of_day(self.clock.minute_of_day())
    }

    pub fn observation_len(&self) -> usize {
        self.learned.len() * 5 + self.stops.len()
    }

    pub fn network(&self) -> &StreetNetwork {
        &self.network
    }

    pub fn stops(&self) -> &StopRegistry {
        &self.stops
    }

    pub fn demand(&self) -> &DemandModel {
        &self.demand
    }

    pub fn learned_fleet(&self) -> &Fleet<R> {
        &self.learned
    }

    pub fn baseline_fleet(&self) -> &Fleet<R> {
        &self.baseline
    }

    pub fn learned_ledger(&self) -> &RiderLedger {
        &self.learned_ledger
    }

    pub fn baseline_ledger(&self) -> &RiderLedger {
        &self.baseline_ledger
    }

    pub fn disruptions(&self) -> &DisruptionManager {
        &self.disruptions
    }

    /// The seed of the current episode.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    // ── Disruption helpers ────────────────────────────────────────────────

    /// A random street in the central band, for scripted closures.
    pub fn random_central_edge(&mut self) -> Option<(rr_core::NodeId, rr_core::NodeId)> {
        self.disruptions.random_central_edge(&self.network, self.config.grid_size)
    }

    /// The `n` busiest stops on the learned side.
    pub fn high_demand_stops(&self, n: usize) -> Vec<rr_core::StopId> {
        disruption::high_demand_stops(&self.learned_ledger, &self.stops, n)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn info(&self, period: TimePeriod, learned_kpis: Kpis) -> StepInfo {
        let baseline_kpis = self.baseline_kpis();
        StepInfo {
            elapsed_time: self.clock.elapsed(),
            period,
            improvement_ratios: ImprovementRatios::between(&learned_kpis, &baseline_kpis),
            learned_kpis,
            baseline_kpis,
            reward: *self.score.breakdown(),
            riders: RiderCounters {
                generated:          self.demand.total_generated(),
                learned_waiting:    self.learned_ledger.waiting_count(),
                learned_boarded:    self.learned_ledger.boarded_count(),
                learned_delivered:  self.learned_ledger.delivered_count(),
                baseline_waiting:   self.baseline_ledger.waiting_count(),
                baseline_boarded:   self.baseline_ledger.boarded_count(),
                baseline_delivered: self.baseline_ledger.delivered_count(),
            },
            active_disruptions: self.disruptions.active().len(),
        }
    }
}
