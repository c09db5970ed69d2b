//! Integration tests for rr-sim.

use rr_core::{SimConfig, StopId};
use rr_fleet::DispatchAction;

use crate::{Sim, SimBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn small_config(horizon: f64) -> SimConfig {
    SimConfig {
        grid_size: 10,
        num_stops: 10,
        num_buses: 3,
        bus_capacity: 8,
        episode_horizon: horizon,
        ..SimConfig::default()
    }
}

fn small_sim() -> Sim {
    init_logging();
    Sim::new(small_config(3_600.0)).unwrap()
}

/// Deterministic action pattern covering all four actions.
fn pattern(step: usize, buses: usize) -> Vec<u8> {
    (0..buses).map(|b| ((step + b) % DispatchAction::COUNT) as u8).collect()
}

fn continue_all(sim: &Sim) -> Vec<u8> {
    vec![0; sim.learned_fleet().learned_count()]
}

// ── Construction & reset ──────────────────────────────────────────────────────

#[cfg(test)]
mod construction {
    use super::*;

    #[test]
    fn observation_length_matches_layout() {
        let mut sim = small_sim();
        let obs = sim.reset(1);
        assert_eq!(obs.len(), 3 * 5 + 10);
        assert_eq!(obs.len(), sim.config.observation_len());
        assert_eq!(obs.len(), sim.observation_len());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SimConfig { num_buses: 0, ..small_config(100.0) };
        assert!(Sim::new(cfg).is_err());
    }

    #[test]
    fn layout_stop_count_must_match_config() {
        let cfg = small_config(100.0);
        let mut rng = rr_core::SimRng::new(3);
        let net = rr_spatial::StreetNetwork::grid(10, &mut rng);
        let stops = rr_spatial::StopRegistry::generate(&net, 10, 4, &mut rng).unwrap();
        assert!(SimBuilder::new(cfg).layout(net, stops).build().is_err());
    }

    #[test]
    fn reset_restores_clock_and_counters() {
        let mut sim = small_sim();
        for i in 0..20 {
            sim.step(&pattern(i, 3)).unwrap();
        }
        sim.reset(5);
        assert_eq!(sim.clock.elapsed(), 0.0);
        assert_eq!(sim.demand().total_generated(), 0);
        assert_eq!(sim.learned_ledger().waiting_count(), 0);
        assert_eq!(sim.baseline_ledger().waiting_count(), 0);
        assert!(sim.disruptions().active().is_empty());
        assert_eq!(sim.seed(), 5);
    }

    #[test]
    fn baseline_fleet_is_all_static() {
        let sim = small_sim();
        assert_eq!(sim.learned_fleet().learned_count(), 3);
        assert_eq!(sim.baseline_fleet().learned_count(), 0);
        assert_eq!(sim.baseline_fleet().len(), 3);
    }
}

// ── Stepping ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stepping {
    use super::*;
    use crate::SimError;
    use rr_fleet::FleetError;

    #[test]
    fn same_seed_same_rewards() {
        let mut a = small_sim();
        let mut b = small_sim();
        a.reset(11);
        b.reset(11);
        for i in 0..200 {
            let ra = a.step(&pattern(i, 3)).unwrap();
            let rb = b.step(&pattern(i, 3)).unwrap();
            assert_eq!(ra.reward, rb.reward, "step {i}");
            assert_eq!(ra.observation, rb.observation, "step {i}");
        }
    }

    #[test]
    fn reset_replays_the_episode() {
        let mut sim = small_sim();
        let run = |sim: &mut Sim| -> Vec<f64> {
            sim.reset(4);
            (0..100).map(|i| sim.step(&pattern(i, 3)).unwrap().reward).collect()
        };
        let first = run(&mut sim);
        let second = run(&mut sim);
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_action_rejected_without_mutation() {
        let mut sim = small_sim();
        sim.step(&[0, 0, 0]).unwrap();
        let elapsed = sim.clock.elapsed();
        let generated = sim.demand().total_generated();

        let err = sim.step(&[0, 4, 0]).unwrap_err();
        assert!(matches!(err, SimError::Fleet(FleetError::InvalidAction(4))));
        assert_eq!(sim.clock.elapsed(), elapsed);
        assert_eq!(sim.demand().total_generated(), generated);
    }

    #[test]
    fn wrong_length_rejected_without_mutation() {
        let mut sim = small_sim();
        let err = sim.step(&[0]).unwrap_err();
        assert!(matches!(
            err,
            SimError::Fleet(FleetError::ActionCountMismatch { expected: 3, got: 1 })
        ));
        assert_eq!(sim.clock.elapsed(), 0.0);
        assert_eq!(sim.demand().total_generated(), 0);
    }

    #[test]
    fn clock_advances_by_dt_and_done_at_horizon() {
        init_logging();
        let mut sim = Sim::new(small_config(10.0)).unwrap();
        for i in 1..=10 {
            let out = sim.step(&[0, 0, 0]).unwrap();
            assert_eq!(out.info.elapsed_time, i as f64);
            assert_eq!(out.done, i == 10);
        }
    }

    #[test]
    fn both_ledgers_see_the_same_riders() {
        let mut sim = small_sim();
        for i in 0..300 {
            sim.step(&pattern(i, 3)).unwrap();
        }
        let total = |l: &rr_demand::RiderLedger| l.waiting_count() + l.boarded_count();
        let generated = sim.demand().total_generated() as usize;
        assert!(generated > 0);
        assert_eq!(total(sim.learned_ledger()), generated);
        assert_eq!(total(sim.baseline_ledger()), generated);
    }

    #[test]
    fn observation_values_are_normalised() {
        let mut sim = small_sim();
        let mut obs = Vec::new();
        for i in 0..300 {
            obs = sim.step(&pattern(i, 3)).unwrap().observation;
        }
        for chunk in obs[..15].chunks(5) {
            assert!((0.0..=1.0).contains(&chunk[2]), "utilization {}", chunk[2]);
            assert!(chunk[3] == 0.0 || chunk[3] == 1.0);
        }
        assert!(obs[15..].iter().all(|q| (0.0..=1.0).contains(q)));
    }

    #[test]
    fn morning_start_reports_morning_period() {
        let mut sim = small_sim();
        let out = sim.step(&[0, 0, 0]).unwrap();
        assert_eq!(out.info.period, rr_demand::TimePeriod::MorningRush);
        assert_eq!(out.info.reward.total, out.reward);
    }
}

// ── Disruptions ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod disruptions {
    use super::*;
    use crate::{DisruptionKind, DisruptionParams};

    #[test]
    fn closure_is_idempotent() {
        let mut sim = small_sim();
        let (a, b) = sim.random_central_edge().unwrap();
        let params = DisruptionParams::closure(a, b);

        assert!(sim.apply_disruption("closure", &params));
        let closed = sim.network().closed_edge_count();
        assert_eq!(closed, 2);
        assert!(sim.network().travel_time(a, b).is_infinite());

        assert!(sim.apply_disruption("closure", &params));
        assert_eq!(sim.network().closed_edge_count(), closed);
        assert!(sim.network().travel_time(b, a).is_infinite());
    }

    #[test]
    fn kind_names_are_case_insensitive() {
        let mut sim = small_sim();
        let (a, b) = sim.random_central_edge().unwrap();
        assert!(sim.apply_disruption("  Closure ", &DisruptionParams::closure(a, b)));
        assert_eq!(sim.disruptions().active()[0].id, "closure_0");
    }

    #[test]
    fn bad_requests_return_false_and_change_nothing() {
        let mut sim = small_sim();
        let (a, b) = sim.random_central_edge().unwrap();
        assert!(!sim.apply_disruption("meteor", &DisruptionParams::closure(a, b)));
        assert!(!sim.apply_disruption("closure", &DisruptionParams::default()));
        assert!(!sim.apply_disruption("traffic", &DisruptionParams::traffic(a, b, 0.5)));
        assert!(!sim.apply_disruption("traffic", &DisruptionParams::closure(a, b)));
        assert!(!sim.apply_disruption("surge", &DisruptionParams::surge(vec![StopId(999)], 2.0)));
        assert!(!sim.apply_disruption("surge", &DisruptionParams::surge(vec![], 2.0)));
        assert!(!sim.apply_disruption("surge", &DisruptionParams::surge(vec![StopId(0)], -1.0)));
        assert!(!sim.apply_disruption("closure", &DisruptionParams::closure(a, b).lasting(0.0)));
        assert!(!sim.apply_disruption("surge", &DisruptionParams::surge(vec![StopId(0)], 1e18)));
        assert!(!sim.apply_disruption("closure", &DisruptionParams::closure_at([2.0, 2.0], [2.1, 1.9])));

        assert!(sim.disruptions().active().is_empty());
        assert_eq!(sim.network().closed_edge_count(), 0);
        assert_eq!(sim.network().congestion_factor(a, b), Some(1.0));
        assert!(sim.demand().surges().is_empty());
    }

    #[test]
    fn closure_by_coordinates_snaps_to_intersections() {
        let mut sim = small_sim();
        assert!(sim.apply_disruption("closure", &DisruptionParams::closure_at([2.2, 3.1], [2.9, 2.8])));
        let a = sim.network().node_at(rr_core::GridPoint::new(2, 3)).unwrap();
        let b = sim.network().node_at(rr_core::GridPoint::new(3, 3)).unwrap();
        assert!(sim.network().is_closed(a, b));
        assert!(sim.network().is_closed(b, a));
        assert_eq!(sim.network().closed_edge_count(), 2);
    }

    #[test]
    fn max_surge_step_completes() {
        let mut sim = small_sim();
        let stops: Vec<StopId> = sim.stops().ids().collect();
        let params = DisruptionParams::surge(stops, rr_demand::MAX_SURGE);
        assert!(sim.apply_disruption("surge", &params));
        let start = std::time::Instant::now();
        for _ in 0..5 {
            let actions = continue_all(&sim);
            sim.step(&actions).unwrap();
        }
        assert!(sim.demand().total_generated() > 0);
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn traffic_expires_after_its_duration() {
        let mut sim = small_sim();
        let (a, b) = sim.random_central_edge().unwrap();
        assert!(sim.apply_disruption("traffic", &DisruptionParams::traffic(a, b, 3.0).lasting(5.0)));
        for _ in 0..4 {
            let actions = continue_all(&sim);
            sim.step(&actions).unwrap();
            assert_eq!(sim.network().congestion_factor(a, b), Some(3.0));
        }
        let actions = continue_all(&sim);
        let out = sim.step(&actions).unwrap();
        assert_eq!(sim.network().congestion_factor(a, b), Some(1.0));
        assert_eq!(out.info.active_disruptions, 0);
        assert_eq!(sim.disruptions().history().len(), 1);
    }

    #[test]
    fn expiring_closure_keeps_slowdown() {
        let mut sim = small_sim();
        let (a, b) = sim.random_central_edge().unwrap();
        let slow = DisruptionParams::traffic(a, b, 2.0).lasting(f64::INFINITY);
        assert!(sim.apply_disruption("traffic", &slow));
        assert!(sim.apply_disruption("closure", &DisruptionParams::closure(a, b).lasting(3.0)));
        for _ in 0..3 {
            let actions = continue_all(&sim);
            sim.step(&actions).unwrap();
        }
        assert!(!sim.network().is_closed(a, b));
        assert_eq!(sim.network().congestion_factor(a, b), Some(2.0));
        assert_eq!(sim.disruptions().active().len(), 1);
        assert_eq!(sim.disruptions().active()[0].effect.kind(), DisruptionKind::Traffic);
    }

    #[test]
    fn surge_scales_arrival_rate_until_cleared() {
        let mut sim = small_sim();
        let stop = sim.stops().ids().next().unwrap();
        let period = sim.period();
        let base = sim.demand().arrival_rate(stop, period).unwrap();

        assert!(sim.apply_disruption("surge", &DisruptionParams::surge(vec![stop], 3.0)));
        let surged = sim.demand().arrival_rate(stop, period).unwrap();
        assert!((surged - 3.0 * base).abs() < 1e-12);

        sim.clear_disruptions();
        assert_eq!(sim.demand().arrival_rate(stop, period).unwrap(), base);
        assert!(sim.disruptions().active().is_empty());
    }

    #[test]
    fn reset_lifts_all_disruptions() {
        let mut sim = small_sim();
        let (a, b) = sim.random_central_edge().unwrap();
        assert!(sim.apply_disruption("closure", &DisruptionParams::closure(a, b)));
        sim.reset(2);
        assert_eq!(sim.network().closed_edge_count(), 0);
        assert!(sim.disruptions().active().is_empty());
    }

    #[test]
    fn high_demand_stops_are_sorted_by_queue() {
        let mut sim = small_sim();
        for _ in 0..120 {
            let actions = continue_all(&sim);
            sim.step(&actions).unwrap();
        }
        let top = sim.high_demand_stops(3);
        assert_eq!(top.len(), 3);
        let q: Vec<usize> = top.iter().map(|&s| sim.learned_ledger().queue_length(s)).collect();
        assert!(q.windows(2).all(|w| w[0] >= w[1]));
    }
}

// ── Scoring ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scoring {
    use rr_demand::WaitStats;
    use rr_fleet::FleetStats;

    use crate::ScoreModel;
    use crate::info::improvement;

    #[test]
    fn first_tick_has_no_deltas() {
        let mut score = ScoreModel::default();
        let waits = WaitStats { mean: 5.0, ..WaitStats::default() };
        let fleet = FleetStats { mean_distance: 40.0, mean_replans: 3.0, ..FleetStats::default() };
        let r = score.score(&waits, &fleet);
        assert!((r - -0.5).abs() < 1e-12);
        assert_eq!(score.breakdown().delta_distance, 0.0);
        assert_eq!(score.breakdown().delta_replans, 0.0);
    }

    #[test]
    fn distance_penalised_above_baseline_only() {
        let mut score = ScoreModel::default();
        let waits = WaitStats::default();
        score.score(&waits, &FleetStats::default());

        let moved = FleetStats { mean_distance: 5.0, ..FleetStats::default() };
        let r = score.score(&waits, &moved);
        assert!((r - -0.3).abs() < 1e-12);

        let idle = FleetStats { mean_distance: 6.0, ..FleetStats::default() };
        assert_eq!(score.score(&waits, &idle), 0.0);
    }

    #[test]
    fn overcrowding_and_replans() {
        let mut score = ScoreModel::default();
        let waits = WaitStats::default();
        score.score(&waits, &FleetStats::default());
        let fleet = FleetStats { load_std: 2.5, mean_replans: 2.0, ..FleetStats::default() };
        let r = score.score(&waits, &fleet);
        // -2 × 2.5/5 + -0.05 × 2
        assert!((r - -1.1).abs() < 1e-12);
    }

    #[test]
    fn reset_forgets_previous_snapshot() {
        let mut score = ScoreModel::default();
        let waits = WaitStats::default();
        score.score(&waits, &FleetStats::default());
        score.reset();
        let far = FleetStats { mean_distance: 100.0, ..FleetStats::default() };
        assert_eq!(score.score(&waits, &far), 0.0);
    }

    #[test]
    fn improvement_ratio() {
        assert_eq!(improvement(10.0, 7.5), 25.0);
        assert!((improvement(10.0, 12.0) - -20.0).abs() < 1e-9);
        assert_eq!(improvement(0.0, 3.0), 0.0);
    }
}

// ── Episodes & observers ──────────────────────────────────────────────────────

#[cfg(test)]
mod episodes {
    use super::*;
    use crate::{ConstantPolicy, EpisodeSummary, NoopObserver, SimObserver, StepOutcome};

    #[derive(Default)]
    struct Counting {
        resets:  usize,
        steps:   u64,
        ends:    usize,
        rewards: Vec<f64>,
    }

    impl SimObserver for Counting {
        fn on_reset(&mut self, _seed: u64, _observation: &[f32]) {
            self.resets += 1;
        }

        fn on_step(&mut self, step: u64, outcome: &StepOutcome) {
            self.steps = step;
            self.rewards.push(outcome.reward);
        }

        fn on_episode_end(&mut self, _summary: &EpisodeSummary) {
            self.ends += 1;
        }
    }

    #[test]
    fn run_episode_reaches_horizon() {
        init_logging();
        let mut sim = Sim::new(small_config(20.0)).unwrap();
        let mut obs = Counting::default();
        let summary = sim
            .run_episode(9, &mut ConstantPolicy(DispatchAction::HighDemand), &mut obs)
            .unwrap();

        assert_eq!(summary.steps, 20);
        assert_eq!((obs.resets, obs.steps, obs.ends), (1, 20, 1));
        let total: f64 = obs.rewards.iter().sum();
        assert!((summary.total_reward - total).abs() < 1e-9);
        assert_eq!(summary.final_info.unwrap().elapsed_time, 20.0);
    }

    #[test]
    fn closures_are_policies() {
        init_logging();
        let mut sim = Sim::new(small_config(15.0)).unwrap();
        let mut calls = 0;
        let mut policy = |obs: &[f32], n: usize| {
            calls += 1;
            assert_eq!(obs.len(), 3 * 5 + 10);
            vec![DispatchAction::SkipLow; n]
        };
        let summary = sim.run_episode(1, &mut policy, &mut NoopObserver).unwrap();
        assert_eq!(summary.steps, 15);
        assert_eq!(calls, 15);
    }

    #[test]
    fn episodes_with_same_seed_match() {
        init_logging();
        let mut sim = Sim::new(small_config(60.0)).unwrap();
        let mut policy = ConstantPolicy(DispatchAction::HighDemand);
        let a = sim.run_episode(3, &mut policy, &mut NoopObserver).unwrap();
        let b = sim.run_episode(3, &mut policy, &mut NoopObserver).unwrap();
        assert_eq!(a, b);
    }
}

// ── Serialization ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod serialization {
    use super::*;
    use crate::{DisruptionKind, DisruptionParams};
    use rr_core::NodeId;

    #[test]
    fn snapshot_serializes_to_json() {
        let mut sim = small_sim();
        for i in 0..30 {
            sim.step(&pattern(i, 3)).unwrap();
        }
        let snap = sim.snapshot_for_display();
        assert_eq!(snap.buses.len(), 3);
        assert_eq!(snap.baseline_buses.len(), 3);
        assert_eq!(snap.stops.len(), 10);
        assert_eq!(snap.clock, (7, 0));

        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["buses"].as_array().unwrap().len(), 3);
        assert_eq!(v["buses"][0]["mode"], "Learned");
        assert_eq!(v["baseline_buses"][0]["mode"], "Static");
    }

    #[test]
    fn step_info_serializes() {
        let mut sim = small_sim();
        let out = sim.step(&[1, 1, 1]).unwrap();
        let v = serde_json::to_value(&out.info).unwrap();
        assert_eq!(v["period"], "MorningRush");
        assert_eq!(v["elapsed_time"], 1.0);
        assert!(v["improvement_ratios"]["mean_wait"].is_number());
        assert!(v["reward"]["total"].is_number());
    }

    #[test]
    fn disruption_params_from_json() {
        let p: DisruptionParams = serde_json::from_str(r#"{ "edge": [3, 4], "duration": 10.0 }"#).unwrap();
        assert_eq!(p.edge, Some((NodeId(3), NodeId(4))));
        assert_eq!(p.duration, Some(10.0));
        assert!(p.factor.is_none());
        assert!(p.stops.is_empty());
        assert!(p.edge_at.is_none());

        let p: DisruptionParams = serde_json::from_str(r#"{ "edge_at": [[1.2, 0.0], [2.0, 0.1]] }"#).unwrap();
        assert_eq!(p.edge_at, Some(([1.2, 0.0], [2.0, 0.1])));

        let p: DisruptionParams = serde_json::from_str(r#"{ "stops": [1, 2], "factor": 2.5 }"#).unwrap();
        assert_eq!(p.stops, vec![StopId(1), StopId(2)]);
        assert_eq!(p.factor, Some(2.5));
    }

    #[test]
    fn disruption_kind_uses_snake_case() {
        assert_eq!(serde_json::to_value(DisruptionKind::Traffic).unwrap(), "traffic");
        assert_eq!("SURGE".parse::<DisruptionKind>().unwrap(), DisruptionKind::Surge);
        assert!("flood".parse::<DisruptionKind>().is_err());
    }
}
