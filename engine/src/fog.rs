//! Fog of war over the tile grid.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use world::Grid;

/// Alpha floor of a tile that has been seen at least once.
pub const EXPLORED_FLOOR: f32 = 0.55;

/// Knowledge state of a single tile.
///
/// Goes Hidden -> Revealed -> Visible, and Visible -> Revealed when no unit
/// is near. Never goes back to Hidden.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Hash, Debug, Serialize, Deserialize,
)]
pub enum FogState {
    #[default]
    Hidden,
    Revealed,
    Visible,
}

/// Fog opacity triple for one tile, all values in [0, 1].
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FogCell {
    pub state: FogState,
    /// Lowest opacity the tile returns to when unobserved. Only ever
    /// decreases.
    pub floor: f32,
    /// Opacity the tile is heading towards this frame.
    pub target: f32,
    /// Displayed opacity, moves towards `target` at a bounded rate.
    pub current: f32,
}

impl Default for FogCell {
    fn default() -> Self {
        FogCell {
            state: FogState::Hidden,
            floor: 1.0,
            target: 1.0,
            current: 1.0,
        }
    }
}

impl FogCell {
    fn lower_floor(&mut self, to: f32) {
        self.floor = self.floor.min(to);
        self.target = self.target.min(self.floor);
    }

    fn reveal(&mut self) {
        if self.state == FogState::Hidden {
            self.state = FogState::Revealed;
        }
        self.lower_floor(EXPLORED_FLOOR);
    }
}

/// Unit's contribution to visibility for one frame.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Sight {
    pub tile: IVec2,
    pub radius: i32,
}

/// Per-tile fog state for a grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisibilityField {
    width: i32,
    height: i32,
    cells: Vec<FogCell>,
    /// Opacity change per second when fog is thinning.
    clear_rate: f32,
    /// Opacity change per second when fog is returning.
    return_rate: f32,
}

impl VisibilityField {
    /// Create a fully hidden field matching the grid's dimensions.
    pub fn new(grid: &Grid, clear_rate: f32, return_rate: f32) -> Self {
        VisibilityField {
            width: grid.width(),
            height: grid.height(),
            cells: vec![
                FogCell::default();
                (grid.width() * grid.height()) as usize
            ],
            clear_rate,
            return_rate,
        }
    }

    fn idx(&self, p: IVec2) -> Option<usize> {
        ((0..self.width).contains(&p.x) && (0..self.height).contains(&p.y))
            .then(|| (p.y * self.width + p.x) as usize)
    }

    fn cell_mut(&mut self, p: IVec2) -> Option<&mut FogCell> {
        self.idx(p).map(|i| &mut self.cells[i])
    }

    pub fn cell(&self, p: IVec2) -> Option<&FogCell> {
        self.idx(p).map(|i| &self.cells[i])
    }

    /// Out-of-bounds tiles are always hidden.
    pub fn state(&self, p: IVec2) -> FogState {
        self.cell(p).map_or(FogState::Hidden, |c| c.state)
    }

    /// Tile has been seen at some point, its contents are known.
    pub fn is_revealed(&self, p: IVec2) -> bool {
        self.state(p) != FogState::Hidden
    }

    /// Tile is in some unit's sight right now.
    pub fn is_visible(&self, p: IVec2) -> bool {
        self.state(p) == FogState::Visible
    }

    /// Mark a single tile explored.
    pub fn reveal_tile(&mut self, p: IVec2) {
        if let Some(c) = self.cell_mut(p) {
            c.reveal();
        }
    }

    /// Permanently thin the fog around `center`.
    ///
    /// Tiles within `r` become explored, tiles within `r - 1` are cleared
    /// completely.
    pub fn reveal_radius(&mut self, grid: &Grid, center: IVec2, r: i32) {
        for p in grid.tiles_in_radius(center, r) {
            self.reveal_tile(p);
        }

        if r >= 1 {
            for p in grid.tiles_in_radius(center, r - 1) {
                if let Some(c) = self.cell_mut(p) {
                    c.lower_floor(0.0);
                }
            }
        }
    }

    /// Recompute this frame's targets from all unit sights at once.
    pub fn update_visibility(&mut self, grid: &Grid, sights: &[Sight]) {
        for c in &mut self.cells {
            c.target = c.floor;
            if c.state == FogState::Visible {
                c.state = FogState::Revealed;
            }
        }

        for s in sights {
            let r2 = s.radius * s.radius;
            for p in grid.tiles_in_radius(s.tile, s.radius + 1) {
                let Some(c) = self.cell_mut(p) else { continue };
                if (p - s.tile).length_squared() <= r2 {
                    c.lower_floor(EXPLORED_FLOOR);
                    c.state = FogState::Visible;
                    c.target = 0.0;
                } else {
                    // Edge ring is remembered but stays hazy.
                    c.reveal();
                }
            }
        }
    }

    /// Move displayed opacities towards their targets.
    pub fn update(&mut self, dt: f32) {
        let (clear, ret) = (self.clear_rate * dt, self.return_rate * dt);
        for c in &mut self.cells {
            if c.current > c.target {
                c.current = (c.current - clear).max(c.target);
            } else if c.current < c.target {
                c.current = (c.current + ret).min(c.target);
            }
        }
    }

    /// Share of tiles that are no longer hidden.
    pub fn explored_fraction(&self) -> f32 {
        let n = self
            .cells
            .iter()
            .filter(|c| c.state != FogState::Hidden)
            .count();
        n as f32 / self.cells.len().max(1) as f32
    }
}

#[cfg(test)]
mod test {
    use glam::ivec2;
    use quickcheck_macros::quickcheck;

    use super::*;

    fn field(grid: &Grid) -> VisibilityField {
        VisibilityField::new(grid, 2.0, 0.5)
    }

    #[test]
    fn starts_hidden() {
        let grid = Grid::new(8, 8);
        let fog = field(&grid);
        let c = fog.cell(ivec2(3, 3)).unwrap();
        assert_eq!(c.state, FogState::Hidden);
        assert_eq!((c.floor, c.target, c.current), (1.0, 1.0, 1.0));
        assert!(!fog.is_revealed(ivec2(-1, 0)));
        assert_eq!(fog.explored_fraction(), 0.0);
    }

    #[test]
    fn reveal_radius_floors() {
        let grid = Grid::new(16, 16);
        let mut fog = field(&grid);
        fog.reveal_radius(&grid, ivec2(8, 8), 3);

        assert_eq!(fog.cell(ivec2(8, 8)).unwrap().floor, 0.0);
        assert_eq!(fog.cell(ivec2(10, 8)).unwrap().floor, 0.0);
        assert_eq!(fog.cell(ivec2(11, 8)).unwrap().floor, EXPLORED_FLOOR);
        assert_eq!(fog.state(ivec2(11, 8)), FogState::Revealed);
        assert_eq!(fog.state(ivec2(12, 8)), FogState::Hidden);

        // Radius zero touches only the center and never clears it fully.
        let mut fog = field(&grid);
        fog.reveal_radius(&grid, ivec2(1, 1), 0);
        assert_eq!(fog.cell(ivec2(1, 1)).unwrap().floor, EXPLORED_FLOOR);
        assert_eq!(fog.explored_fraction(), 1.0 / 256.0);
    }

    #[test]
    fn sight_and_ring() {
        let grid = Grid::new(16, 16);
        let mut fog = field(&grid);
        let sight = Sight {
            tile: ivec2(8, 8),
            radius: 2,
        };
        fog.update_visibility(&grid, &[sight]);

        let inner = fog.cell(ivec2(10, 8)).unwrap();
        assert_eq!(inner.state, FogState::Visible);
        assert_eq!(inner.target, 0.0);
        assert_eq!(inner.floor, EXPLORED_FLOOR);

        let ring = fog.cell(ivec2(11, 8)).unwrap();
        assert_eq!(ring.state, FogState::Revealed);
        assert_eq!(ring.target, EXPLORED_FLOOR);

        // Unit leaves, visible tiles drop back to revealed at their floor.
        fog.update_visibility(&grid, &[]);
        let inner = fog.cell(ivec2(10, 8)).unwrap();
        assert_eq!(inner.state, FogState::Revealed);
        assert_eq!(inner.target, EXPLORED_FLOOR);
        assert!(fog.is_revealed(ivec2(10, 8)));
        assert!(!fog.is_visible(ivec2(10, 8)));
    }

    #[test]
    fn clearing_is_faster_than_returning() {
        let grid = Grid::new(4, 4);
        let mut fog = field(&grid);
        let p = ivec2(1, 1);
        fog.update_visibility(&grid, &[Sight { tile: p, radius: 0 }]);
        fog.update(0.25);
        assert_eq!(fog.cell(p).unwrap().current, 0.5);
        fog.update(0.25);
        assert_eq!(fog.cell(p).unwrap().current, 0.0);

        fog.update_visibility(&grid, &[]);
        fog.update(0.2);
        assert!((fog.cell(p).unwrap().current - 0.1).abs() < 1e-6);
    }

    #[quickcheck]
    fn converges(steps: u8) -> bool {
        let grid = Grid::new(6, 6);
        let mut fog = field(&grid);
        fog.update_visibility(
            &grid,
            &[Sight {
                tile: ivec2(2, 2),
                radius: (steps % 4) as i32,
            }],
        );
        // Opacity moves at most 1.0 in any direction, 2 s at 0.5/s covers
        // it.
        for _ in 0..=(20 + steps as usize) {
            fog.update(0.1);
        }
        fog.cells.iter().all(|c| (c.current - c.target).abs() < 1e-4)
    }

    #[quickcheck]
    fn floor_never_rises(ops: Vec<(bool, u8, u8, u8)>) -> bool {
        let grid = Grid::new(10, 10);
        let mut fog = field(&grid);
        let mut prev: Vec<f32> = fog.cells.iter().map(|c| c.floor).collect();

        for (is_reveal, x, y, r) in ops {
            let p = ivec2(x as i32 % 12 - 1, y as i32 % 12 - 1);
            let r = (r % 5) as i32;
            if is_reveal {
                fog.reveal_radius(&grid, p, r);
            } else {
                fog.update_visibility(&grid, &[Sight { tile: p, radius: r }]);
            }
            fog.update(0.1);

            let floors: Vec<f32> = fog.cells.iter().map(|c| c.floor).collect();
            if floors.iter().zip(&prev).any(|(a, b)| a > b) {
                return false;
            }
            if fog.cells.iter().any(|c| c.target < c.floor - 1.0) {
                return false;
            }
            prev = floors;
        }
        true
    }
}
