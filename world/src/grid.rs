use std::{fmt, str::FromStr};

use anyhow::{bail, ensure};
use glam::{ivec2, IVec2};
use pathfinding::prelude::astar;
use serde::{Deserialize, Serialize};
use util::VecExt;

use crate::{MilestoneId, TaskId, Tile, TileKind};

/// Fixed size rectangular tile map with its origin at (0, 0).
///
/// Dimensions never change after construction, tile contents are mutable in
/// place.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Create an all-grass grid.
    ///
    /// # Panics
    ///
    /// If either dimension is not positive.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "Grid::new: empty grid");
        Grid {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, p: IVec2) -> bool {
        (0..self.width).contains(&p.x) && (0..self.height).contains(&p.y)
    }

    pub(crate) fn idx(&self, p: IVec2) -> Option<usize> {
        self.contains(p).then(|| (p.y * self.width + p.x) as usize)
    }

    pub fn get(&self, p: IVec2) -> Option<&Tile> {
        self.idx(p).map(|i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, p: IVec2) -> Option<&mut Tile> {
        self.idx(p).map(|i| &mut self.tiles[i])
    }

    /// Iterate all tile positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = IVec2> {
        let w = self.width;
        (0..self.width * self.height).map(move |i| ivec2(i % w, i / w))
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec2, &Tile)> + '_ {
        self.positions().zip(self.tiles.iter())
    }

    /// Out-of-bounds positions are never walkable.
    pub fn is_walkable(&self, p: IVec2) -> bool {
        self.get(p).map_or(false, Tile::is_walkable)
    }

    /// Up to 4 orthogonal in-bounds neighbors.
    pub fn neighbors(&self, p: IVec2) -> impl Iterator<Item = IVec2> + '_ {
        p.ns_4().filter(move |&n| self.contains(n))
    }

    /// In-bounds tiles within Euclidean distance `r` of `center`, inclusive.
    pub fn tiles_in_radius(
        &self,
        center: IVec2,
        r: i32,
    ) -> impl Iterator<Item = IVec2> + '_ {
        let r = r.max(0);
        (-r..=r)
            .flat_map(move |y| (-r..=r).map(move |x| ivec2(x, y)))
            .filter(move |d| d.length_squared() <= r * r)
            .map(move |d| center + d)
            .filter(move |&p| self.contains(p))
    }

    /// Shortest 4-connected path from `from` to `to`, both ends included.
    ///
    /// Returns `None` if the destination is not walkable or can't be
    /// reached. The start tile itself does not need to be walkable.
    pub fn find_path(&self, from: IVec2, to: IVec2) -> Option<Vec<IVec2>> {
        if !self.contains(from) || !self.is_walkable(to) {
            return None;
        }

        astar(
            &from,
            |&p| {
                self.neighbors(p)
                    .filter(|&n| self.is_walkable(n))
                    .map(|n| (n, 1))
                    .collect::<Vec<_>>()
            },
            |&p| (to - p).taxi_len(),
            |&p| p == to,
        )
        .map(|(path, _)| path)
    }

    /// Put a task's resource node on a tile.
    ///
    /// Fails if the tile is outside the grid or already holds a node or a
    /// structure.
    pub fn place_node(&mut self, p: IVec2, task: TaskId) -> anyhow::Result<()> {
        let Some(tile) = self.get_mut(p) else {
            bail!("node position {p} outside grid");
        };
        ensure!(!tile.is_occupied(), "tile {p} already occupied");
        tile.node = Some(task);
        Ok(())
    }

    /// Put a milestone's structure on a tile.
    pub fn place_structure(
        &mut self,
        p: IVec2,
        milestone: MilestoneId,
    ) -> anyhow::Result<()> {
        let Some(tile) = self.get_mut(p) else {
            bail!("structure position {p} outside grid");
        };
        ensure!(!tile.is_occupied(), "tile {p} already occupied");
        tile.structure = Some(milestone);
        Ok(())
    }
}

/// Parse a grid from an ASCII map. `#` is blocked grass, other cells use
/// the `TileKind` character mapping.
impl FromStr for Grid {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> =
            s.lines().filter(|l| !l.trim().is_empty()).collect();
        let Some(first) = lines.first() else {
            bail!("empty map");
        };
        let width = first.chars().count() as i32;
        let mut ret = Grid::new(width, lines.len() as i32);

        for (y, line) in lines.iter().enumerate() {
            ensure!(
                line.chars().count() as i32 == width,
                "ragged map line {y}"
            );
            for (x, c) in line.chars().enumerate() {
                let tile = if c == '#' {
                    Tile {
                        blocked: true,
                        ..Tile::default()
                    }
                } else {
                    Tile::new(TileKind::try_from(c).map_err(anyhow::Error::msg)?)
                };
                ret.tiles[y * width as usize + x] = tile;
            }
        }

        Ok(ret)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let tile = &self.tiles[(y * self.width + x) as usize];
                let c = if tile.blocked { '#' } else { tile.kind.into() };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
