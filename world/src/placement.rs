//! Deterministic placement of task nodes and milestone structures.

use std::f32::consts::TAU;

use glam::{ivec2, vec2, IVec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use util::{dijkstra_map, srng, HashSet, VecExt};

use crate::{Grid, Milestone, MilestoneId, ResourceKind, Task, TaskId};

/// Where a task's resource node ended up.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodePlacement {
    pub pos: IVec2,
    pub task: TaskId,
    pub kind: ResourceKind,
    pub depleted: bool,
}

/// Where a milestone's structure ended up.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StructurePlacement {
    pub pos: IVec2,
    pub milestone: MilestoneId,
}

#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Placement {
    pub nodes: Vec<NodePlacement>,
    pub structures: Vec<StructurePlacement>,
}

/// Placement state over a fixed grid.
///
/// Only tiles reachable from the base are used, so every node and
/// structure can be pathed to.
pub struct Placer {
    seed: u64,
    base: IVec2,
    base_radius: i32,
    /// Furthest distance from base a node is aimed at.
    reach: f32,
    reachable: HashSet<IVec2>,
    occupied: HashSet<IVec2>,
    bounds: (i32, i32),
}

impl Placer {
    pub fn new(grid: &Grid, seed: u64, base: IVec2, base_radius: i32) -> Self {
        let reachable = dijkstra_map(
            |&p: &IVec2| {
                grid.neighbors(p)
                    .filter(|&n| grid.is_walkable(n))
                    .collect::<Vec<_>>()
            },
            [base],
        )
        .map(|(p, _)| p)
        .collect();

        let occupied = grid
            .iter()
            .filter(|(_, t)| t.is_occupied())
            .map(|(p, _)| p)
            .collect();

        let reach = (grid.width().min(grid.height()) / 2 - 2) as f32;

        Placer {
            seed,
            base,
            base_radius,
            reach: reach.max(base_radius as f32 + 3.0),
            reachable,
            occupied,
            bounds: (grid.width(), grid.height()),
        }
    }

    /// Find the free reachable tile closest to `target`, outside the base.
    fn snap(&self, target: IVec2) -> Option<IVec2> {
        let (w, h) = self.bounds;
        let target = target.clamp(ivec2(0, 0), ivec2(w - 1, h - 1));
        let r2 = self.base_radius * self.base_radius;

        dijkstra_map(
            move |&p: &IVec2| {
                p.ns_4()
                    .filter(move |p| (0..w).contains(&p.x) && (0..h).contains(&p.y))
            },
            [target],
        )
        .map(|(p, _)| p)
        .find(|p| {
            self.reachable.contains(p)
                && !self.occupied.contains(p)
                && (*p - self.base).length_squared() > r2
        })
    }

    /// Place a task's node. Tasks with more discovery end up further out.
    pub fn place_task(&mut self, task: &Task) -> Option<NodePlacement> {
        let mut rng = srng(&(self.seed, &task.id));
        let angle = rng.gen_range(0.0..TAU);
        let inner = self.base_radius as f32 + 2.0;
        let radius = inner
            + task.discovery_ratio() * (self.reach - inner)
            + rng.gen_range(-1.5..1.5);

        let offset = vec2(angle.cos(), angle.sin()) * radius.max(inner);
        let target = self.base + offset.round().as_ivec2();

        let Some(pos) = self.snap(target) else {
            log::warn!("No room to place node for task {}", task.id);
            return None;
        };
        self.occupied.insert(pos);

        Some(NodePlacement {
            pos,
            task: task.id.clone(),
            kind: task.resource_kind(),
            depleted: task.is_complete(),
        })
    }

    /// Place the `index`th of `count` structures on a ring around the base.
    pub fn place_milestone(
        &mut self,
        milestone: &MilestoneId,
        index: usize,
        count: usize,
    ) -> Option<StructurePlacement> {
        let mut rng = srng(&(self.seed, milestone));
        let angle = TAU * index as f32 / count.max(1) as f32
            + rng.gen_range(-0.2..0.2);
        let radius = self.base_radius as f32 + 2.5;
        let offset = vec2(angle.cos(), angle.sin()) * radius;
        let target = self.base + offset.round().as_ivec2();

        let Some(pos) = self.snap(target) else {
            log::warn!("No room to place structure for milestone {milestone}");
            return None;
        };
        self.occupied.insert(pos);

        Some(StructurePlacement {
            pos,
            milestone: milestone.clone(),
        })
    }
}

/// Place structures for milestones and nodes for tasks that aren't yet on
/// the grid, and record them on the grid tiles.
///
/// Inputs are processed in id order, so the result only depends on the
/// grid, the seed and the sets of ids.
pub fn place_all(
    grid: &mut Grid,
    seed: u64,
    base: IVec2,
    base_radius: i32,
    tasks: &[Task],
    milestones: &[Milestone],
) -> Placement {
    let mut tasks: Vec<&Task> = tasks.iter().collect();
    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    let mut milestones: Vec<&MilestoneId> =
        milestones.iter().map(|m| &m.id).collect();
    milestones.sort();
    milestones.dedup();

    let (placed_nodes, placed_structures): (HashSet<_>, HashSet<_>) = {
        let nodes = grid.iter().filter_map(|(_, t)| t.node().cloned());
        let structures =
            grid.iter().filter_map(|(_, t)| t.structure().cloned());
        (nodes.collect(), structures.collect())
    };

    let mut placer = Placer::new(grid, seed, base, base_radius);
    let mut ret = Placement::default();

    let count = milestones.len();
    for (i, m) in milestones.into_iter().enumerate() {
        if placed_structures.contains(m) {
            continue;
        }
        ret.structures.extend(placer.place_milestone(m, i, count));
    }

    for task in tasks {
        if placed_nodes.contains(&task.id) {
            continue;
        }
        ret.nodes.extend(placer.place_task(task));
    }

    for s in &ret.structures {
        if let Err(e) = grid.place_structure(s.pos, s.milestone.clone()) {
            log::warn!("place_all: {e}");
        }
    }
    for n in &ret.nodes {
        if let Err(e) = grid.place_node(n.pos, n.task.clone()) {
            log::warn!("place_all: {e}");
        }
    }

    log::info!(
        "Placed {} nodes and {} structures",
        ret.nodes.len(),
        ret.structures.len()
    );

    ret
}
