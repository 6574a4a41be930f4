//! Simulation layer: units working on tasks in a fog-covered world.

mod config;
pub use config::Config;

pub mod director;
pub use director::{by_deadline, find_frontier_tile};

pub mod fog;
pub use fog::{FogCell, FogState, Sight, VisibilityField};

mod node;
pub use node::{NodeState, ResourceNode, Structure};

mod observer;
pub use observer::{Event, Observer};

mod runtime;
pub use runtime::Runtime;

pub mod stamina;

mod store;
pub use store::{MemoryStore, TaskStore};

mod unit;
pub use unit::{Cargo, Route, Unit, UnitState, ARRIVAL_TOLERANCE};
