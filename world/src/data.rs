use chrono::NaiveDate;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Default,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
            Debug,
            Display,
            From,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_owned())
            }
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Team member, shown on the map as one unit.
    PersonId
);

string_id!(
    /// Tracked task, shown on the map as one resource node.
    TaskId
);

string_id!(
    /// Milestone grouping tasks, shown on the map as one structure.
    MilestoneId
);

/// Task record as kept by the external store.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Task {
    pub id: TaskId,
    pub assignee: PersonId,
    /// How much of the task is figuring out what to do, in percent. The
    /// rest is execution.
    pub discovery_percent: f32,
    pub percent_complete: f32,
    pub expected_date: Option<NaiveDate>,
    pub milestone: Option<MilestoneId>,
    pub category: String,
}

impl Task {
    pub fn execution_percent(&self) -> f32 {
        100.0 - self.discovery_percent
    }

    /// Discovery share in [0, 1].
    pub fn discovery_ratio(&self) -> f32 {
        (self.discovery_percent / 100.0).clamp(0.0, 1.0)
    }

    /// Work left in [0, 1].
    pub fn remaining_work(&self) -> f32 {
        (1.0 - self.percent_complete / 100.0).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.percent_complete >= 100.0
    }

    pub fn resource_kind(&self) -> ResourceKind {
        ResourceKind::from_category(&self.category)
    }
}

/// Partial update to a task. Only fields that are `Some` get written.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct TaskPatch {
    pub percent_complete: Option<f32>,
}

#[derive(Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Milestone {
    pub id: MilestoneId,
    pub name: String,
}

/// What a task's node looks like and what units carry away from it.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Display,
    EnumIter,
    EnumCount,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    #[default]
    Wood,
    Stone,
    Ore,
    Crystal,
    Herb,
}

impl ResourceKind {
    /// Map a free-form task category to a resource kind.
    ///
    /// Same category always gives the same kind.
    pub fn from_category(category: &str) -> Self {
        let n = util::stable_hash(category) % ResourceKind::COUNT as u64;
        ResourceKind::iter().nth(n as usize).unwrap_or_default()
    }
}
