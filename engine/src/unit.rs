use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use util::{tile_center, tile_of, HashMap};
use world::{MilestoneId, PersonId, ResourceKind, TaskId};

/// Distance at which a waypoint counts as reached.
pub const ARRIVAL_TOLERANCE: f32 = 0.15;

/// What a unit carries back from a node.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Cargo {
    pub kind: ResourceKind,
    pub task: TaskId,
}

/// Unit behavior state, each variant carries exactly the data it needs.
#[derive(Clone, PartialEq, Debug, IntoStaticStr, Serialize, Deserialize)]
pub enum UnitState {
    Idle {
        /// Seconds until the unit looks for work again.
        cooldown: f32,
    },
    /// Walking towards the fog. With a task, the target is that task's node
    /// and the unit starts gathering on arrival.
    Scouting {
        target: IVec2,
        task: Option<TaskId>,
    },
    MovingToResource {
        task: TaskId,
    },
    Gathering {
        task: TaskId,
        progress: f32,
    },
    MovingToStructure {
        milestone: MilestoneId,
        cargo: Cargo,
    },
    Building {
        milestone: MilestoneId,
        cargo: Cargo,
        elapsed: f32,
    },
    ReturningToBase {
        cargo: Cargo,
    },
    Depositing {
        cargo: Cargo,
        elapsed: f32,
    },
    Resting {
        elapsed: f32,
    },
}

impl Default for UnitState {
    fn default() -> Self {
        UnitState::Idle { cooldown: 0.0 }
    }
}

impl UnitState {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, UnitState::Idle { .. })
    }

    /// States where the unit follows its route.
    pub fn is_moving(&self) -> bool {
        use UnitState::*;
        matches!(
            self,
            Scouting { .. }
                | MovingToResource { .. }
                | MovingToStructure { .. }
                | ReturningToBase { .. }
                | Resting { .. }
        )
    }

    pub fn cargo(&self) -> Option<&Cargo> {
        use UnitState::*;
        match self {
            MovingToStructure { cargo, .. }
            | Building { cargo, .. }
            | ReturningToBase { cargo }
            | Depositing { cargo, .. } => Some(cargo),
            _ => None,
        }
    }
}

/// Path being followed, as tile waypoints.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Route {
    pub tiles: Vec<IVec2>,
    /// Next waypoint to reach.
    pub index: usize,
}

impl Route {
    pub fn new(tiles: Vec<IVec2>) -> Self {
        Route { tiles, index: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.tiles.len()
    }

    pub fn destination(&self) -> Option<IVec2> {
        self.tiles.last().copied()
    }
}

/// On-map avatar of a person.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub person: PersonId,
    pub(crate) pos: Vec2,
    pub(crate) state: UnitState,
    pub(crate) route: Option<Route>,
    /// Tasks to skip until the given simulation time.
    pub(crate) unreachable: HashMap<TaskId, f32>,
}

impl Unit {
    pub fn new(person: PersonId, tile: IVec2) -> Self {
        Unit {
            person,
            pos: tile_center(tile),
            state: Default::default(),
            route: None,
            unreachable: Default::default(),
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn tile(&self) -> IVec2 {
        tile_of(self.pos)
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Switch to a new state, replacing the current route.
    pub(crate) fn transition(
        &mut self,
        state: UnitState,
        path: Option<Vec<IVec2>>,
    ) {
        log::debug!(
            "{}: {} -> {}",
            self.person,
            self.state.name(),
            state.name()
        );
        self.state = state;
        self.route = path.map(Route::new);
    }

    pub(crate) fn avoids(&self, task: &TaskId, clock: f32) -> bool {
        self.unreachable.get(task).is_some_and(|&until| clock < until)
    }

    pub(crate) fn mark_unreachable(&mut self, task: TaskId, until: f32) {
        self.unreachable.insert(task, until);
    }

    /// Walk along the route by up to `distance`.
    ///
    /// Returns true when the route is finished or there is no route.
    pub(crate) fn advance(&mut self, mut distance: f32) -> bool {
        let Some(route) = self.route.as_mut() else {
            return true;
        };

        while let Some(&wp) = route.tiles.get(route.index) {
            let to = tile_center(wp) - self.pos;
            let dist = to.length();
            if dist <= ARRIVAL_TOLERANCE {
                route.index += 1;
                continue;
            }
            if distance <= 0.0 {
                return false;
            }
            let step = distance.min(dist);
            self.pos += to * (step / dist);
            distance -= step;
        }
        true
    }
}
