//! Notification hooks for whatever renders the simulation.

use glam::Vec2;
use world::{MilestoneId, PersonId, TaskId};

/// Receiver of simulation side effects.
///
/// All methods default to doing nothing, implement the ones you care
/// about. Visibility notifications only fire on change.
pub trait Observer {
    /// Node was harvested. A permanent depletion means the task is done.
    fn node_depleted(&mut self, _task: &TaskId, _permanent: bool) {}

    fn node_available(&mut self, _task: &TaskId) {}

    fn node_visible(&mut self, _task: &TaskId, _visible: bool) {}

    fn structure_visible(&mut self, _milestone: &MilestoneId, _visible: bool) {}

    fn structure_progress(&mut self, _milestone: &MilestoneId, _progress: f32) {
    }

    fn unit_moved(&mut self, _person: &PersonId, _pos: Vec2) {}

    fn unit_state_changed(&mut self, _person: &PersonId, _state: &'static str) {
    }
}

impl Observer for () {}

/// Recorded notification.
#[derive(Clone, PartialEq, Debug)]
pub enum Event {
    NodeDepleted(TaskId, bool),
    NodeAvailable(TaskId),
    NodeVisible(TaskId, bool),
    StructureVisible(MilestoneId, bool),
    StructureProgress(MilestoneId, f32),
    StateChanged(PersonId, &'static str),
}

/// Event log, records everything except per-frame movement.
impl Observer for Vec<Event> {
    fn node_depleted(&mut self, task: &TaskId, permanent: bool) {
        self.push(Event::NodeDepleted(task.clone(), permanent));
    }

    fn node_available(&mut self, task: &TaskId) {
        self.push(Event::NodeAvailable(task.clone()));
    }

    fn node_visible(&mut self, task: &TaskId, visible: bool) {
        self.push(Event::NodeVisible(task.clone(), visible));
    }

    fn structure_visible(&mut self, milestone: &MilestoneId, visible: bool) {
        self.push(Event::StructureVisible(milestone.clone(), visible));
    }

    fn structure_progress(&mut self, milestone: &MilestoneId, progress: f32) {
        self.push(Event::StructureProgress(milestone.clone(), progress));
    }

    fn unit_state_changed(&mut self, person: &PersonId, state: &'static str) {
        self.push(Event::StateChanged(person.clone(), state));
    }
}
