//! The decision-maker seam.
//!
//! Training loops live outside this crate; a [`DispatchPolicy`] is just the
//! function from observation to actions that [`Sim::run_episode`] calls each
//! tick.
//!
//! [`Sim::run_episode`]: crate::Sim::run_episode

use rr_fleet::DispatchAction;

/// Chooses one action per learned bus from the flat observation vector.
///
/// Closures `FnMut(&[f32], usize) -> Vec<DispatchAction>` implement this
/// trait directly.
pub trait DispatchPolicy {
    fn decide(&mut self, observation: &[f32], bus_count: usize) -> Vec<DispatchAction>;
}

impl<F> DispatchPolicy for F
where
    F: FnMut(&[f32], usize) -> Vec<DispatchAction>,
{
    fn decide(&mut self, observation: &[f32], bus_count: usize) -> Vec<DispatchAction> {
        self(observation, bus_count)
    }
}

/// Sends the same action to every bus.  `ConstantPolicy(Continue)` gives a
/// demand-blind nearest-stop shuttle.
#[derive(Clone, Copy, Debug)]
pub struct ConstantPolicy(pub DispatchAction);

impl DispatchPolicy for ConstantPolicy {
    fn decide(&mut self, _observation: &[f32], bus_count: usize) -> Vec<DispatchAction> {
        vec![self.0; bus_count]
    }
}
