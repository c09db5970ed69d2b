//! Top-level simulation configuration.

use crate::{CoreError, CoreResult, SimClock};

/// Everything needed to build a simulation.
///
/// Typically loaded from a JSON/TOML file by the host (with the `serde`
/// feature) or built from [`SimConfig::default`] and tweaked in code.
///
/// Changing `num_buses` or `num_stops` changes the observation vector length
/// (`num_buses * 5 + num_stops`), which invalidates any policy trained
/// against the old layout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Streets form a `grid_size × grid_size` Manhattan grid.
    pub grid_size: u32,

    /// Number of serviced stops placed on the grid.
    pub num_stops: usize,

    /// Buses per fleet.  The learned and baseline fleets have the same size.
    pub num_buses: usize,

    /// Seats per bus.
    pub bus_capacity: usize,

    /// Simulated seconds per tick.
    pub dt: f64,

    /// An episode is done once elapsed simulated time reaches this value.
    pub episode_horizon: f64,

    /// Second-of-day at tick 0 (selects the initial demand period).
    pub start_secs_of_day: f64,

    /// Seed for the street weights and stop placement.  The layout is built
    /// once and survives `reset`.
    pub layout_seed: u64,

    /// Default seed for the rider stream when none is given to `reset`.
    pub seed: u64,

    /// Odometer increment credited per tick while a bus is moving.
    pub odometer_step: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size:         20,
            num_stops:         35,
            num_buses:         6,
            bus_capacity:      50,
            dt:                1.0,
            episode_horizon:   3_600.0,
            start_secs_of_day: 7.0 * 3_600.0,
            layout_seed:       42,
            seed:              42,
            odometer_step:     1.0,
        }
    }
}

impl SimConfig {
    /// Reject configurations that would leave the observation vector or the
    /// street grid ill-defined.
    pub fn validate(&self) -> CoreResult<()> {
        if self.grid_size < 2 {
            return Err(CoreError::Config(format!(
                "grid_size must be at least 2, got {}",
                self.grid_size
            )));
        }
        if self.num_stops == 0 {
            return Err(CoreError::Config("num_stops must be positive".into()));
        }
        if self.num_stops < 2 {
            return Err(CoreError::Config(
                "at least 2 stops are needed for riders to have a destination".into(),
            ));
        }
        let nodes = (self.grid_size as usize) * (self.grid_size as usize);
        if self.num_stops > nodes {
            return Err(CoreError::Config(format!(
                "{} stops do not fit on a {}x{} grid",
                self.num_stops, self.grid_size, self.grid_size
            )));
        }
        if self.num_buses == 0 {
            return Err(CoreError::Config("num_buses must be positive".into()));
        }
        if self.bus_capacity == 0 {
            return Err(CoreError::Config("bus_capacity must be positive".into()));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(CoreError::Config(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.episode_horizon.is_finite() && self.episode_horizon > 0.0) {
            return Err(CoreError::Config(format!(
                "episode_horizon must be positive, got {}",
                self.episode_horizon
            )));
        }
        if !(self.odometer_step.is_finite() && self.odometer_step >= 0.0) {
            return Err(CoreError::Config(format!(
                "odometer_step must be non-negative, got {}",
                self.odometer_step
            )));
        }
        Ok(())
    }

    /// Length of the observation vector for this layout.
    #[inline]
    pub fn observation_len(&self) -> usize {
        self.num_buses * 5 + self.num_stops
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.dt, self.start_secs_of_day)
    }
}
