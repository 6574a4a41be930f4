use serde::{Deserialize, Serialize};

use crate::{MilestoneId, TaskId};

/// Terrain type of a single map cell.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Hash, Debug, Serialize, Deserialize,
)]
#[serde(try_from = "char", into = "char")]
pub enum TileKind {
    #[default]
    Grass,
    Dirt,
    Stone,
    Water,
    Forest,
    Void,
}

use TileKind::*;

impl TileKind {
    pub fn blocks_movement(self) -> bool {
        matches!(self, Water | Void)
    }
}

impl TryFrom<char> for TileKind {
    type Error = &'static str;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '.' => Ok(Grass),
            ',' => Ok(Dirt),
            '^' => Ok(Stone),
            '~' => Ok(Water),
            'T' => Ok(Forest),
            ' ' => Ok(Void),
            _ => Err("invalid terrain char"),
        }
    }
}

impl From<TileKind> for char {
    fn from(val: TileKind) -> Self {
        // NB. This must match TileKind's TryFrom inputs above.
        match val {
            Grass => '.',
            Dirt => ',',
            Stone => '^',
            Water => '~',
            Forest => 'T',
            Void => ' ',
        }
    }
}

/// One grid cell.
///
/// A tile holds at most one resource node and at most one structure. Both
/// are assigned once during placement and never change afterwards.
#[derive(Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Tile {
    pub kind: TileKind,
    /// Obstacle on otherwise passable terrain.
    pub blocked: bool,
    pub(crate) node: Option<TaskId>,
    pub(crate) structure: Option<MilestoneId>,
}

impl Tile {
    pub fn new(kind: TileKind) -> Self {
        Tile {
            kind,
            ..Default::default()
        }
    }

    pub fn is_walkable(&self) -> bool {
        !self.blocked && !self.kind.blocks_movement()
    }

    /// Task whose resource node sits here.
    pub fn node(&self) -> Option<&TaskId> {
        self.node.as_ref()
    }

    /// Milestone whose structure sits here.
    pub fn structure(&self) -> Option<&MilestoneId> {
        self.structure.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.node.is_some() || self.structure.is_some()
    }
}
