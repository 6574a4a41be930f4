//! Procedural island terrain.

use glam::{ivec2, vec2, IVec2};
use rand::{distributions::Distribution, Rng};
use util::{fbm, tile_center, RngExt};

use crate::{Grid, Tile, TileKind};

/// Feature size of the noise field in tiles.
const NOISE_SCALE: f32 = 9.0;

/// Heights below this are off the island entirely.
const VOID_LEVEL: f32 = 0.2;

/// Heights below this are lakes and shoreline.
const WATER_LEVEL: f32 = 0.33;

/// Heights above this are bare rock.
const STONE_LEVEL: f32 = 0.66;

/// Terrain generation parameters.
///
/// Sample a `Grid` from this with a seeded rng. The same rng state always
/// gives the same grid.
///
/// Sampling panics like [`Grid::new`] if either dimension is not positive.
#[derive(Copy, Clone, Debug)]
pub struct TerrainSpec {
    pub width: i32,
    pub height: i32,
    /// Radius of the always-clear grass area around the base.
    pub base_radius: i32,
}

impl TerrainSpec {
    pub fn new(width: i32, height: i32, base_radius: i32) -> Self {
        TerrainSpec {
            width,
            height,
            base_radius,
        }
    }

    /// Home base tile at the center of the map.
    pub fn base(&self) -> IVec2 {
        ivec2(self.width / 2, self.height / 2)
    }

    /// Classify a tile given its noise samples.
    fn kind(height: f32, moisture: f32) -> TileKind {
        if height < VOID_LEVEL {
            TileKind::Void
        } else if height < WATER_LEVEL {
            TileKind::Water
        } else if height > STONE_LEVEL {
            TileKind::Stone
        } else if moisture > 0.6 {
            TileKind::Forest
        } else if moisture < 0.4 {
            TileKind::Dirt
        } else {
            TileKind::Grass
        }
    }
}

impl Distribution<Grid> for TerrainSpec {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let height_seed: u64 = rng.gen();
        let moisture_seed: u64 = rng.gen();

        let mut grid = Grid::new(self.width, self.height);
        let center = tile_center(self.base());
        let half_span = (self.width.min(self.height) as f32 / 2.0).max(1.0);

        for p in grid.positions().collect::<Vec<_>>() {
            let pos = tile_center(p);
            let noise_pos = pos / NOISE_SCALE;

            // Push the edges of the map down into the sea.
            let edge = (pos.distance(center) / half_span - 0.7).max(0.0);
            let height = fbm(height_seed, noise_pos, 3) - edge * 1.5;
            let moisture = fbm(moisture_seed, noise_pos + vec2(31.7, 17.3), 2);

            let mut tile = Tile::new(Self::kind(height, moisture));
            if tile.kind == TileKind::Stone && rng.one_chance_in(6) {
                // Boulder.
                tile.blocked = true;
            }

            if let Some(t) = grid.get_mut(p) {
                *t = tile;
            }
        }

        // Keep the base open.
        let base_tiles: Vec<IVec2> = grid
            .tiles_in_radius(self.base(), self.base_radius + 1)
            .collect();
        for p in base_tiles {
            if let Some(t) = grid.get_mut(p) {
                *t = Tile::new(TileKind::Grass);
            }
        }

        log::info!(
            "Generated {}x{} terrain, {} walkable tiles",
            self.width,
            self.height,
            grid.iter().filter(|(_, t)| t.is_walkable()).count()
        );

        grid
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use util::GameRng;

    use super::*;

    #[test]
    fn terrain_is_deterministic() {
        let spec = TerrainSpec::new(40, 30, 3);
        let a: Grid = GameRng::seed_from_u64(123).sample(spec);
        let b: Grid = GameRng::seed_from_u64(123).sample(spec);
        let c: Grid = GameRng::seed_from_u64(124).sample(spec);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn base_is_open() {
        let spec = TerrainSpec::new(40, 40, 4);
        for seed in 0..8 {
            let grid: Grid = GameRng::seed_from_u64(seed).sample(spec);
            for p in grid.tiles_in_radius(spec.base(), spec.base_radius) {
                assert!(grid.is_walkable(p), "seed {seed} blocked at {p}");
            }
        }
    }

    #[test]
    fn classification() {
        assert_eq!(TerrainSpec::kind(0.1, 0.5), TileKind::Void);
        assert_eq!(TerrainSpec::kind(0.3, 0.5), TileKind::Water);
        assert_eq!(TerrainSpec::kind(0.7, 0.9), TileKind::Stone);
        assert_eq!(TerrainSpec::kind(0.5, 0.9), TileKind::Forest);
        assert_eq!(TerrainSpec::kind(0.5, 0.1), TileKind::Dirt);
        assert_eq!(TerrainSpec::kind(0.5, 0.5), TileKind::Grass);
    }
}
