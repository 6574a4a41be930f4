use glam::IVec2;
use serde::{Deserialize, Serialize};
use world::ResourceKind;

/// Harvest state of a resource node.
#[derive(Copy, Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Available,
    /// Harvested, grows back after `regrow` more seconds.
    Depleted { regrow: f32 },
    /// Task is finished, the node stays empty until it's reopened.
    Exhausted,
}

/// Map feature standing for a task.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ResourceNode {
    pub pos: IVec2,
    pub kind: ResourceKind,
    pub state: NodeState,
    /// Whether the node's tile has been revealed, for edge-triggered
    /// notifications.
    pub(crate) seen: bool,
}

impl ResourceNode {
    pub fn new(pos: IVec2, kind: ResourceKind, exhausted: bool) -> Self {
        ResourceNode {
            pos,
            kind,
            state: if exhausted {
                NodeState::Exhausted
            } else {
                NodeState::Available
            },
            seen: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == NodeState::Available
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == NodeState::Exhausted
    }

    pub(crate) fn deplete(&mut self, regrow: f32) {
        if !self.is_exhausted() {
            self.state = NodeState::Depleted { regrow };
        }
    }

    pub(crate) fn exhaust(&mut self) {
        self.state = NodeState::Exhausted;
    }

    pub(crate) fn reopen(&mut self) {
        self.state = NodeState::Available;
    }

    /// Count down regrowth, return true when the node became available.
    pub(crate) fn update(&mut self, dt: f32) -> bool {
        if let NodeState::Depleted { regrow } = &mut self.state {
            *regrow -= dt;
            if *regrow <= 0.0 {
                self.state = NodeState::Available;
                return true;
            }
        }
        false
    }
}

/// Milestone's building near the base.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Structure {
    pub pos: IVec2,
    /// Mean completion of the milestone's tasks, in [0, 1].
    pub progress: f32,
    pub(crate) seen: bool,
}

impl Structure {
    pub fn new(pos: IVec2) -> Self {
        Structure {
            pos,
            progress: 0.0,
            seen: false,
        }
    }
}
