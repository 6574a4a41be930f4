//! Access to the external task tracker.

use anyhow::bail;
use util::IndexMap;
use world::{Milestone, MilestoneId, PersonId, Task, TaskId, TaskPatch};

/// Read and update interface to wherever tasks actually live.
///
/// The runtime only reads the store during a tick and writes progress back
/// through `update_task`. Records are returned by value, the runtime never
/// holds on to them between ticks.
pub trait TaskStore {
    fn people(&self) -> Vec<PersonId>;

    fn tasks(&self) -> Vec<Task>;

    fn milestones(&self) -> Vec<Milestone>;

    fn tasks_for_person(&self, person: &PersonId) -> Vec<Task> {
        self.tasks()
            .into_iter()
            .filter(|t| &t.assignee == person)
            .collect()
    }

    fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks().into_iter().find(|t| &t.id == id)
    }

    fn milestone(&self, id: &MilestoneId) -> Option<Milestone> {
        self.milestones().into_iter().find(|m| &m.id == id)
    }

    fn update_task(&mut self, id: &TaskId, patch: TaskPatch)
        -> anyhow::Result<()>;
}

/// In-memory store, used by the demo binary and in tests.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    people: Vec<PersonId>,
    tasks: IndexMap<TaskId, Task>,
    milestones: IndexMap<MilestoneId, Milestone>,
}

impl MemoryStore {
    pub fn add_person(&mut self, person: impl Into<PersonId>) {
        let person = person.into();
        if !self.people.contains(&person) {
            self.people.push(person);
        }
    }

    pub fn remove_person(&mut self, person: &PersonId) {
        self.people.retain(|p| p != person);
    }

    /// Insert or replace a task.
    pub fn insert_task(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        self.tasks.shift_remove(id)
    }

    pub fn insert_milestone(&mut self, milestone: Milestone) {
        self.milestones.insert(milestone.id.clone(), milestone);
    }

    pub fn remove_milestone(&mut self, id: &MilestoneId) -> Option<Milestone> {
        self.milestones.shift_remove(id)
    }
}

impl TaskStore for MemoryStore {
    fn people(&self) -> Vec<PersonId> {
        self.people.clone()
    }

    fn tasks(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    fn milestones(&self) -> Vec<Milestone> {
        self.milestones.values().cloned().collect()
    }

    fn tasks_for_person(&self, person: &PersonId) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|t| &t.assignee == person)
            .cloned()
            .collect()
    }

    fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.get(id).cloned()
    }

    fn milestone(&self, id: &MilestoneId) -> Option<Milestone> {
        self.milestones.get(id).cloned()
    }

    fn update_task(
        &mut self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> anyhow::Result<()> {
        let Some(task) = self.tasks.get_mut(id) else {
            bail!("update_task: unknown task {id}");
        };
        if let Some(p) = patch.percent_complete {
            task.percent_complete = p.clamp(0.0, 100.0);
        }
        Ok(())
    }
}
