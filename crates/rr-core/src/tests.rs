//! Unit tests for rr-core primitives.

#[cfg(test)]
mod ids {
    use crate::{BusId, NodeId, RiderId, StopId};

    #[test]
    fn index_roundtrip() {
        let id = StopId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(StopId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(StopId(0) < StopId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(BusId::INVALID.0, u32::MAX);
        assert_eq!(RiderId::INVALID.0, u64::MAX);
        assert_eq!(StopId::default(), StopId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(BusId(7).to_string(), "BusId(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::GridPoint;

    #[test]
    fn l1_is_symmetric() {
        let a = GridPoint::new(2, 9);
        let b = GridPoint::new(7, 3);
        assert_eq!(a.l1_distance(b), 11);
        assert_eq!(b.l1_distance(a), 11);
        assert_eq!(a.l1_distance(a), 0);
    }

    #[test]
    fn to_array_keeps_coordinates() {
        assert_eq!(GridPoint::new(3, -4).to_array(), [3.0, -4.0]);
    }
}

#[cfg(test)]
mod time {
    use crate::SimClock;

    #[test]
    fn elapsed_is_recomputed_from_step() {
        let mut c = SimClock::new(0.1, 0.0);
        for _ in 0..10 {
            c.advance();
        }
        // 10 * 0.1 computed in one multiplication, not ten additions.
        assert_eq!(c.elapsed(), 10.0 * 0.1);
        c.reset();
        assert_eq!(c.step, 0);
        assert_eq!(c.elapsed(), 0.0);
    }

    #[test]
    fn time_of_day_wraps() {
        let mut c = SimClock::new(3_600.0, 23.0 * 3_600.0);
        assert_eq!(c.hm(), (23, 0));
        c.advance();
        assert_eq!(c.minute_of_day(), 0);
        c.advance();
        assert_eq!(c.hm(), (1, 0));
    }

    #[test]
    fn display_shows_clock_face() {
        let c = SimClock::new(1.0, 7.5 * 3_600.0);
        assert_eq!(c.to_string(), "step 0 (t=0.0s, 07:30)");
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimRng::new(9);
        let mut b = SimRng::new(9);
        for _ in 0..100 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn children_diverge() {
        let mut root = SimRng::new(1);
        let mut c0 = root.child(0);
        let mut c1 = root.child(1);
        let s0: Vec<u32> = (0..8).map(|_| c0.random()).collect();
        let s1: Vec<u32> = (0..8).map(|_| c1.random()).collect();
        assert_ne!(s0, s1);
    }

    #[test]
    fn poisson_degenerate_rates() {
        let mut rng = SimRng::new(3);
        assert_eq!(rng.poisson(0.0), 0);
        assert_eq!(rng.poisson(-1.0), 0);
        assert_eq!(rng.poisson(f64::NAN), 0);
        assert_eq!(rng.poisson(f64::INFINITY), 0);
    }

    #[test]
    fn poisson_mean_matches_rate() {
        let mut rng = SimRng::new(11);
        let n = 20_000;
        let total: u64 = (0..n).map(|_| rng.poisson(2.5) as u64).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 2.5).abs() < 0.1, "mean {mean}");
    }

    #[test]
    fn poisson_large_rate_does_not_underflow() {
        let mut rng = SimRng::new(5);
        let k = rng.poisson(5_000.0) as f64;
        // σ ≈ 70; 10σ window.
        assert!((k - 5_000.0).abs() < 700.0, "got {k}");
    }

    #[test]
    fn poisson_huge_rate_returns_promptly() {
        let mut rng = SimRng::new(8);
        let start = std::time::Instant::now();
        assert_eq!(rng.poisson(1e18), u32::MAX);
        let k = rng.poisson(1e9) as f64;
        assert!((k - 1e9).abs() < 1e6, "got {k}");
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn weighted_index_rejects_all_zero() {
        let mut rng = SimRng::new(0);
        assert_eq!(rng.weighted_index(&[0.0, 0.0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
        assert_eq!(rng.weighted_index(&[0.0, 3.0, 0.0]), Some(1));
    }
}

#[cfg(test)]
mod config {
    use crate::{CoreError, SimConfig};

    #[test]
    fn default_is_valid() {
        let c = SimConfig::default();
        c.validate().unwrap();
        assert_eq!(c.observation_len(), 6 * 5 + 35);
    }

    #[test]
    fn zero_buses_rejected() {
        let c = SimConfig { num_buses: 0, ..SimConfig::default() };
        assert!(matches!(c.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn zero_stops_rejected() {
        let c = SimConfig { num_stops: 0, ..SimConfig::default() };
        assert!(matches!(c.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn too_many_stops_rejected() {
        let c = SimConfig { grid_size: 3, num_stops: 10, ..SimConfig::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn non_positive_dt_rejected() {
        let c = SimConfig { dt: 0.0, ..SimConfig::default() };
        assert!(c.validate().is_err());
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_config {
    use crate::SimConfig;

    #[test]
    fn partial_json_fills_defaults() {
        let c: SimConfig = serde_json::from_str(r#"{ "num_buses": 4, "seed": 7 }"#).unwrap();
        assert_eq!(c.num_buses, 4);
        assert_eq!(c.seed, 7);
        assert_eq!(c.num_stops, SimConfig::default().num_stops);
    }
}
