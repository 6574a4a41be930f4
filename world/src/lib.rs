//! Map data model and boot-time world generation.

mod data;
pub use data::{
    Milestone, MilestoneId, PersonId, ResourceKind, Task, TaskId, TaskPatch,
};

mod grid;
pub use grid::Grid;

pub mod placement;
pub use placement::{place_all, NodePlacement, Placement, StructurePlacement};

mod terrain;
pub use terrain::TerrainSpec;

mod tile;
pub use tile::{Tile, TileKind};
