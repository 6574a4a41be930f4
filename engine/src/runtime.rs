use anyhow::ensure;
use chrono::NaiveDateTime;
use glam::IVec2;
use rand::{distributions::Distribution, SeedableRng};
use util::{dijkstra_map, GameRng, HashMap, HashSet, IndexMap};
use world::{
    place_all, Grid, MilestoneId, PersonId, TaskId, TerrainSpec,
};

use crate::{
    stamina::structure_progress, Config, Observer, ResourceNode, Sight,
    Structure, TaskStore, Unit, UnitState, VisibilityField,
};

/// Main data container for the simulation.
pub struct Runtime {
    pub(crate) config: Config,
    pub(crate) grid: Grid,
    pub(crate) fog: VisibilityField,
    pub(crate) base: IVec2,
    pub(crate) nodes: IndexMap<TaskId, ResourceNode>,
    pub(crate) structures: IndexMap<MilestoneId, Structure>,
    pub(crate) units: IndexMap<PersonId, Unit>,
    pub(crate) rng: GameRng,
    /// Simulation seconds since start.
    pub(crate) clock: f32,
    since_sync: f32,
}

impl Runtime {
    /// Generate terrain from the config seed and populate it from the
    /// store.
    pub fn new(config: Config, store: &impl TaskStore) -> anyhow::Result<Self> {
        // Map size must be sane before generating terrain.
        config.validate()?;
        let spec = TerrainSpec::new(
            config.map_width,
            config.map_height,
            config.base_radius,
        );
        let grid = spec.sample(&mut GameRng::seed_from_u64(config.seed));

        let mut ret = Runtime::with_grid(config, grid, spec.base())?;
        ret.sync(store, &mut ());
        Ok(ret)
    }

    /// Set up a runtime on an existing map, without populating it.
    pub fn with_grid(
        config: Config,
        grid: Grid,
        base: IVec2,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        ensure!(grid.is_walkable(base), "base {base} is not walkable");

        let mut fog = VisibilityField::new(
            &grid,
            config.fog_clear_rate,
            config.fog_return_rate,
        );
        fog.reveal_radius(&grid, base, config.base_radius + 2);

        // Keep unit decisions off the terrain rng stream.
        let rng = GameRng::seed_from_u64(config.seed ^ 0x9e37_79b9_7f4a_7c15);

        Ok(Runtime {
            config,
            grid,
            fog,
            base,
            nodes: Default::default(),
            structures: Default::default(),
            units: Default::default(),
            rng,
            clock: 0.0,
            since_sync: 0.0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn fog(&self) -> &VisibilityField {
        &self.fog
    }

    pub fn base(&self) -> IVec2 {
        self.base
    }

    /// Simulation seconds elapsed.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn unit(&self, person: &PersonId) -> Option<&Unit> {
        self.units.get(person)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn node(&self, task: &TaskId) -> Option<&ResourceNode> {
        self.nodes.get(task)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&TaskId, &ResourceNode)> {
        self.nodes.iter()
    }

    pub fn structure(&self, milestone: &MilestoneId) -> Option<&Structure> {
        self.structures.get(milestone)
    }

    pub fn structures(
        &self,
    ) -> impl Iterator<Item = (&MilestoneId, &Structure)> {
        self.structures.iter()
    }

    /// Bring units, nodes and structures in line with the store.
    ///
    /// Runs automatically every sync interval. Call it directly after
    /// making changes to the store to have them show up right away.
    pub fn sync(&mut self, store: &impl TaskStore, obs: &mut impl Observer) {
        self.since_sync = 0.0;

        // People.
        let people = store.people();
        let roster: HashSet<&PersonId> = people.iter().collect();
        self.units.retain(|id, _| {
            let keep = roster.contains(id);
            if !keep {
                log::info!("Unit {id} left");
            }
            keep
        });
        for person in &people {
            if !self.units.contains_key(person) {
                let tile = self.spawn_tile(self.units.len());
                log::info!("Unit {person} arrived at {tile}");
                self.units
                    .insert(person.clone(), Unit::new(person.clone(), tile));
            }
        }

        // Map features.
        let tasks = store.tasks();
        let milestones = store.milestones();
        place_all(
            &mut self.grid,
            self.config.seed,
            self.base,
            self.config.base_radius,
            &tasks,
            &milestones,
        );

        let mut node_tiles: HashMap<TaskId, IVec2> = HashMap::default();
        let mut structure_tiles: HashMap<MilestoneId, IVec2> =
            HashMap::default();
        for (p, t) in self.grid.iter() {
            if let Some(id) = t.node() {
                node_tiles.insert(id.clone(), p);
            }
            if let Some(id) = t.structure() {
                structure_tiles.insert(id.clone(), p);
            }
        }

        let task_ids: HashSet<&TaskId> = tasks.iter().map(|t| &t.id).collect();
        self.nodes.retain(|id, _| task_ids.contains(id));

        for task in &tasks {
            if let Some(node) = self.nodes.get_mut(&task.id) {
                if task.is_complete() && !node.is_exhausted() {
                    node.exhaust();
                    obs.node_depleted(&task.id, true);
                } else if !task.is_complete() && node.is_exhausted() {
                    node.reopen();
                    obs.node_available(&task.id);
                }
            } else if let Some(&pos) = node_tiles.get(&task.id) {
                self.nodes.insert(
                    task.id.clone(),
                    ResourceNode::new(
                        pos,
                        task.resource_kind(),
                        task.is_complete(),
                    ),
                );
            }
        }

        let milestone_ids: HashSet<&MilestoneId> =
            milestones.iter().map(|m| &m.id).collect();
        self.structures.retain(|id, _| milestone_ids.contains(id));

        for m in &milestones {
            if !self.structures.contains_key(&m.id) {
                let Some(&pos) = structure_tiles.get(&m.id) else {
                    continue;
                };
                self.structures.insert(m.id.clone(), Structure::new(pos));
            }
            let progress = structure_progress(&m.id, &tasks);
            if let Some(s) = self.structures.get_mut(&m.id) {
                if s.progress != progress {
                    s.progress = progress;
                    obs.structure_progress(&m.id, progress);
                }
            }
        }

        self.notify_visibility(obs);
    }

    /// Where the `n`th unit appears, spreading out from the base.
    fn spawn_tile(&self, n: usize) -> IVec2 {
        let grid = &self.grid;
        dijkstra_map(
            |&p: &IVec2| {
                grid.neighbors(p)
                    .filter(|&n| grid.is_walkable(n))
                    .collect::<Vec<_>>()
            },
            [self.base],
        )
        .map(|(p, _)| p)
        .filter(|&p| !grid.get(p).is_some_and(|t| t.is_occupied()))
        .take(9)
        .nth(n % 9)
        .unwrap_or(self.base)
    }

    /// Fire visibility notifications for features whose tiles got revealed.
    fn notify_visibility(&mut self, obs: &mut impl Observer) {
        for (id, node) in self.nodes.iter_mut() {
            let seen = self.fog.is_revealed(node.pos);
            if seen != node.seen {
                node.seen = seen;
                obs.node_visible(id, seen);
            }
        }
        for (id, s) in self.structures.iter_mut() {
            let seen = self.fog.is_revealed(s.pos);
            if seen != s.seen {
                s.seen = seen;
                obs.structure_visible(id, seen);
            }
        }
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// `now` is the wall clock time used for schedule calculations.
    pub fn tick(
        &mut self,
        store: &mut impl TaskStore,
        obs: &mut impl Observer,
        now: NaiveDateTime,
        dt: f32,
    ) {
        for i in 0..self.units.len() {
            let before = self.units[i].state.name();
            self.update_unit(i, store, obs, now, dt);

            let unit = &self.units[i];
            let after = unit.state.name();
            if after != before {
                obs.unit_state_changed(&unit.person, after);
            }
            obs.unit_moved(&unit.person, unit.pos);
        }

        let sights: Vec<Sight> = self
            .units
            .values()
            .map(|u| Sight {
                tile: u.tile(),
                radius: match u.state {
                    UnitState::Scouting { .. } => self.config.scout_sight_radius,
                    _ => self.config.gather_sight_radius,
                },
            })
            .collect();
        self.fog.update_visibility(&self.grid, &sights);
        self.fog.update(dt);

        for (id, node) in self.nodes.iter_mut() {
            if node.update(dt) {
                obs.node_available(id);
            }
        }
        self.notify_visibility(obs);

        self.clock += dt;
        self.since_sync += dt;
        if self.since_sync >= self.config.sync_interval {
            self.sync(&*store, obs);
        }
    }

    /// Share of the map that's been explored.
    pub fn explored_fraction(&self) -> f32 {
        self.fog.explored_fraction()
    }
}
