//! Per-bus path-following state.

use rr_core::NodeId;

/// Where a bus is along its current path.
///
/// A bus is either **stationary** (`path` empty) or **pathing** along
/// `path[cursor] → path[cursor + 1]` with `progress ∈ [0, 1)` of that edge
/// covered.  While pathing, `path.len() >= 2` and `cursor < path.len() - 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Movement {
    pub path:     Vec<NodeId>,
    pub cursor:   usize,
    pub progress: f64,
}

impl Movement {
    #[inline]
    pub fn is_moving(&self) -> bool {
        !self.path.is_empty()
    }

    /// Start following `path` from its first node.  Paths shorter than two
    /// nodes leave the bus stationary.
    pub fn begin(&mut self, path: Vec<NodeId>) {
        if path.len() < 2 {
            self.clear();
            return;
        }
        self.path = path;
        self.cursor = 0;
        self.progress = 0.0;
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.cursor = 0;
        self.progress = 0.0;
    }

    /// The edge currently being traversed.
    #[inline]
    pub fn current_edge(&self) -> Option<(NodeId, NodeId)> {
        let from = *self.path.get(self.cursor)?;
        let to = *self.path.get(self.cursor + 1)?;
        Some((from, to))
    }

    /// Step onto the next node.  Returns the node reached and whether it ends
    /// the path.
    pub fn advance(&mut self) -> Option<(NodeId, bool)> {
        let (_, to) = self.current_edge()?;
        self.cursor += 1;
        self.progress = 0.0;
        Some((to, self.cursor + 1 >= self.path.len()))
    }
}
