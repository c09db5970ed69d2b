//! Fluent builder for constructing a [`Sim`].

use rr_core::{CoreError, SimConfig};
use rr_spatial::{DijkstraRouter, Router, StopRegistry, StreetNetwork};

use crate::{Sim, SimResult};

/// Fluent builder for [`Sim<R>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: grid size, fleet size, Δt, horizon, seeds.
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                                       |
/// |-----------------------|-----------------------------------------------|
/// | `.layout(net, stops)` | Grid and stops generated from `layout_seed`   |
/// | `.router(r)`          | [`DijkstraRouter`]                            |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(SimConfig::default())
///     .router(DijkstraRouter)
///     .build()?;
/// let obs = sim.reset(7);
/// ```
pub struct SimBuilder<R: Router + Clone = DijkstraRouter> {
    config: SimConfig,
    layout: Option<(StreetNetwork, StopRegistry)>,
    router: R,
}

impl SimBuilder<DijkstraRouter> {
    pub fn new(config: SimConfig) -> Self {
        Self { config, layout: None, router: DijkstraRouter }
    }
}

impl<R: Router + Clone> SimBuilder<R> {
    /// Use a hand-built street network and stop set instead of the generated
    /// grid.  The stop count must match `config.num_stops`.
    pub fn layout(mut self, network: StreetNetwork, stops: StopRegistry) -> Self {
        self.layout = Some((network, stops));
        self
    }

    /// Swap the routing algorithm used by both fleets.
    pub fn router<R2: Router + Clone>(self, router: R2) -> SimBuilder<R2> {
        SimBuilder { config: self.config, layout: self.layout, router }
    }

    /// Validate the configuration, resolve the layout and return a
    /// freshly reset [`Sim`].
    pub fn build(self) -> SimResult<Sim<R>> {
        self.config.validate()?;

        let (network, stops) = match self.layout {
            Some((network, stops)) => {
                if stops.len() != self.config.num_stops {
                    return Err(CoreError::Config(format!(
                        "layout has {} stops, config expects {}",
                        stops.len(),
                        self.config.num_stops
                    ))
                    .into());
                }
                (network, stops)
            }
            None => Sim::<R>::generate_layout(&self.config)?,
        };

        log::debug!(
            "building sim: {} nodes, {} edges, {} stops",
            network.node_count(),
            network.edge_count(),
            stops.len()
        );
        Ok(Sim::assemble(self.config, network, stops, self.router))
    }
}
