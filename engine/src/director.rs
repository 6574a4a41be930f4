//! Units deciding what to do and carrying it out.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use glam::IVec2;
use rand::{seq::SliceRandom, Rng};
use util::dijkstra_map;
use world::{Grid, MilestoneId, Task, TaskId, TaskPatch};

use crate::{
    stamina::{
        gather_rate, scout_speed, stamina, structure_progress, REST_THRESHOLD,
    },
    Cargo, Observer, Runtime, TaskStore, UnitState, VisibilityField,
};

/// Order tasks by expected date, undated tasks go last.
pub fn by_deadline(a: &Task, b: &Task) -> Ordering {
    match (a.expected_date, b.expected_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Pick a random explored tile at the edge of the unexplored area.
///
/// Searches outwards from `from` through walkable explored tiles, looking
/// at no more than `budget` tiles. A frontier tile has at least one
/// walkable hidden neighbor. The starting tile is never returned.
pub fn find_frontier_tile(
    grid: &Grid,
    fog: &VisibilityField,
    from: IVec2,
    budget: usize,
    rng: &mut impl Rng,
) -> Option<IVec2> {
    let open = |p: IVec2| grid.is_walkable(p) && fog.is_revealed(p);
    let is_frontier = |p: IVec2| {
        grid.neighbors(p)
            .any(|n| grid.is_walkable(n) && !fog.is_revealed(n))
    };

    let frontier: Vec<IVec2> = dijkstra_map(
        |&p: &IVec2| grid.neighbors(p).filter(|&n| open(n)).collect::<Vec<_>>(),
        [from],
    )
    .take(budget)
    .map(|(p, _)| p)
    .filter(|&p| p != from && is_frontier(p))
    .collect();

    frontier.choose(rng).copied()
}

impl Runtime {
    /// Run one unit's state machine for a frame.
    pub(crate) fn update_unit(
        &mut self,
        i: usize,
        store: &mut impl TaskStore,
        obs: &mut impl Observer,
        now: NaiveDateTime,
        dt: f32,
    ) {
        use UnitState::*;

        let person = self.units[i].person.clone();
        let tasks = store.tasks_for_person(&person);
        let stamina = stamina(&tasks, now);
        let step = self.config.move_speed * scout_speed(stamina) * dt;

        match self.units[i].state.clone() {
            Idle { cooldown } if cooldown > 0.0 => {
                self.units[i].state = Idle {
                    cooldown: cooldown - dt,
                };
            }
            Idle { .. } => self.assign(i, &tasks, stamina),
            Gathering { task, progress } => {
                let progress = progress + dt * gather_rate(stamina);
                if progress >= 1.0 {
                    self.finish_gathering(i, task, &*store, obs);
                } else {
                    self.units[i].state = Gathering { task, progress };
                }
            }
            Building { milestone, .. }
                if !self.has_structure(&milestone, &*store) =>
            {
                self.abandon(i, "milestone removed while building");
            }
            Building {
                milestone,
                cargo,
                elapsed,
            } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.config.build_duration {
                    self.deliver(i, cargo, Some(milestone), store, obs, now);
                } else {
                    self.units[i].state = Building {
                        milestone,
                        cargo,
                        elapsed,
                    };
                }
            }
            Depositing { cargo, elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.config.deposit_duration {
                    self.deliver(i, cargo, None, store, obs, now);
                } else {
                    self.units[i].state = Depositing { cargo, elapsed };
                }
            }
            Resting { elapsed } => {
                // Rest on the way home, or at home if there's a path.
                self.units[i].advance(step);
                let elapsed = elapsed + dt;
                if elapsed >= self.config.rest_duration {
                    self.units[i].transition(Idle { cooldown: 0.0 }, None);
                } else {
                    self.units[i].state = Resting { elapsed };
                }
            }
            state => {
                if self.units[i].advance(step) {
                    self.arrive(i, state, &*store);
                }
            }
        }
    }

    /// Pick the next job for an idle unit.
    pub(crate) fn assign(&mut self, i: usize, tasks: &[Task], stamina: f32) {
        use UnitState::*;

        if tasks.is_empty() {
            self.scout_frontier(i);
            return;
        }

        let tile = self.units[i].tile();
        if stamina < REST_THRESHOLD {
            let path = self.grid.find_path(tile, self.base);
            self.units[i].transition(Resting { elapsed: 0.0 }, path);
            return;
        }

        let clock = self.clock;
        let unit = &self.units[i];
        let mut candidates: Vec<(&Task, IVec2)> = tasks
            .iter()
            .filter(|t| !t.is_complete() && !unit.avoids(&t.id, clock))
            .filter_map(|t| {
                let node = self.nodes.get(&t.id)?;
                node.is_available().then_some((t, node.pos))
            })
            .collect();
        candidates.sort_by(|(a, _), (b, _)| by_deadline(a, b));

        let Some(&(task, target)) = candidates.first() else {
            self.scout_frontier(i);
            return;
        };

        let Some(path) = self.grid.find_path(tile, target) else {
            log::debug!("{}: no path to task {}", self.units[i].person, task.id);
            let until = clock + self.config.unreachable_cooldown;
            let unit = &mut self.units[i];
            unit.mark_unreachable(task.id.clone(), until);
            unit.transition(Idle { cooldown: 0.0 }, None);
            return;
        };

        let state = if task.discovery_ratio() > 0.5 && !self.fog.is_revealed(target)
        {
            Scouting {
                target,
                task: Some(task.id.clone()),
            }
        } else {
            MovingToResource {
                task: task.id.clone(),
            }
        };
        self.units[i].transition(state, Some(path));
    }

    /// Head for the edge of the unexplored area, or idle if there's none in
    /// reach.
    fn scout_frontier(&mut self, i: usize) {
        let tile = self.units[i].tile();
        let route = find_frontier_tile(
            &self.grid,
            &self.fog,
            tile,
            self.config.frontier_budget,
            &mut self.rng,
        )
        .and_then(|t| Some((t, self.grid.find_path(tile, t)?)));

        match route {
            Some((target, path)) => self.units[i].transition(
                UnitState::Scouting { target, task: None },
                Some(path),
            ),
            None => self.units[i].transition(
                UnitState::Idle {
                    cooldown: self.config.idle_retry,
                },
                None,
            ),
        }
    }

    /// Drop whatever the unit was doing.
    fn abandon(&mut self, i: usize, reason: &str) {
        let unit = &mut self.units[i];
        log::debug!(
            "{}: abandoning {}: {reason}",
            unit.person,
            unit.state.name()
        );
        unit.transition(UnitState::Idle { cooldown: 0.0 }, None);
    }

    /// Route finished, move to the state for the destination.
    fn arrive(&mut self, i: usize, state: UnitState, store: &impl TaskStore) {
        use UnitState::*;

        match state {
            Scouting {
                task: Some(task), ..
            }
            | MovingToResource { task } => self.start_gathering(i, task, store),
            MovingToStructure { milestone, .. }
                if !self.has_structure(&milestone, store) =>
            {
                self.abandon(i, "milestone is gone")
            }
            MovingToStructure { milestone, cargo } => self.units[i].transition(
                Building {
                    milestone,
                    cargo,
                    elapsed: 0.0,
                },
                None,
            ),
            ReturningToBase { cargo } => self.units[i].transition(
                Depositing {
                    cargo,
                    elapsed: 0.0,
                },
                None,
            ),
            _ => self.units[i].transition(Idle { cooldown: 0.0 }, None),
        }
    }

    /// Milestone still exists in the store and has a structure on the map.
    fn has_structure(
        &self,
        milestone: &MilestoneId,
        store: &impl TaskStore,
    ) -> bool {
        store.milestone(milestone).is_some()
            && self.structures.contains_key(milestone)
    }

    fn start_gathering(
        &mut self,
        i: usize,
        task: TaskId,
        store: &impl TaskStore,
    ) {
        if !store.task(&task).is_some_and(|t| !t.is_complete()) {
            self.abandon(i, "task is gone or done");
            return;
        }
        if !self.nodes.get(&task).is_some_and(|n| n.is_available()) {
            self.abandon(i, "node is not available");
            return;
        }

        self.units[i].transition(
            UnitState::Gathering {
                task,
                progress: 0.0,
            },
            None,
        );
    }

    /// Harvest done, carry the cargo to the task's structure if it has one,
    /// otherwise to base.
    fn finish_gathering(
        &mut self,
        i: usize,
        task_id: TaskId,
        store: &impl TaskStore,
        obs: &mut impl Observer,
    ) {
        let Some(task) = store.task(&task_id) else {
            self.abandon(i, "task removed while gathering");
            return;
        };
        let Some(node) = self.nodes.get_mut(&task_id) else {
            self.abandon(i, "node removed while gathering");
            return;
        };

        let permanent = task.is_complete();
        if permanent {
            node.exhaust();
        } else {
            node.deplete(self.config.node_regrow_duration);
        }
        obs.node_depleted(&task_id, permanent);

        let cargo = Cargo {
            kind: node.kind,
            task: task_id,
        };
        let tile = self.units[i].tile();

        let structure = task
            .milestone
            .and_then(|m| Some((self.structures.get(&m)?.pos, m)));

        if let Some((pos, milestone)) = structure {
            match self.grid.find_path(tile, pos) {
                Some(path) => self.units[i].transition(
                    UnitState::MovingToStructure { milestone, cargo },
                    Some(path),
                ),
                None => self.abandon(i, "no path to structure"),
            }
        } else {
            match self.grid.find_path(tile, self.base) {
                Some(path) => self.units[i].transition(
                    UnitState::ReturningToBase { cargo },
                    Some(path),
                ),
                None => self.abandon(i, "no path to base"),
            }
        }
    }

    /// Hand in cargo, advancing the task, then look for new work right away.
    fn deliver(
        &mut self,
        i: usize,
        cargo: Cargo,
        milestone: Option<MilestoneId>,
        store: &mut impl TaskStore,
        obs: &mut impl Observer,
        now: NaiveDateTime,
    ) {
        let person = self.units[i].person.clone();

        if let Some(task) = store.task(&cargo.task) {
            let gain = self
                .rng
                .gen_range(self.config.progress_min..=self.config.progress_max);
            let percent = (task.percent_complete + gain).min(100.0);

            match store.update_task(
                &task.id,
                TaskPatch {
                    percent_complete: Some(percent),
                },
            ) {
                Ok(()) => {
                    log::info!(
                        "{person} delivered {} for {}, now at {percent:.0}%",
                        cargo.kind,
                        task.id
                    );
                    if percent >= 100.0 {
                        if let Some(node) = self.nodes.get_mut(&task.id) {
                            if !node.is_exhausted() {
                                node.exhaust();
                                obs.node_depleted(&task.id, true);
                            }
                        }
                    }
                    if let Some(m) = milestone {
                        let progress = structure_progress(&m, &store.tasks());
                        match self.structures.get_mut(&m) {
                            Some(s) if store.milestone(&m).is_some() => {
                                s.progress = progress;
                                obs.structure_progress(&m, progress);
                            }
                            _ => log::debug!("{person}: milestone {m} is gone"),
                        }
                    }
                }
                Err(e) => log::warn!("deliver: {e}"),
            }
        } else {
            log::debug!("{person}: cargo task {} no longer exists", cargo.task);
        }

        self.units[i].transition(UnitState::Idle { cooldown: 0.0 }, None);
        let tasks = store.tasks_for_person(&person);
        let stamina = stamina(&tasks, now);
        self.assign(i, &tasks, stamina);
    }
}
