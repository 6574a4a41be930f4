use glam::{ivec2, vec2, IVec2, Vec2};

/// 4 directions, clock face order.
pub const DIR_4: [IVec2; 4] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 0]),
];

pub trait VecExt: Sized + Default {
    /// Absolute size of vector in taxicab metric.
    fn taxi_len(&self) -> i32;

    /// Vec points to an adjacent cell, left, right, up or down.
    fn is_adjacent(&self) -> bool {
        self.taxi_len() == 1
    }

    /// Orthogonal neighbor cells of this cell, clock face order.
    fn ns_4(self) -> impl Iterator<Item = Self>;
}

impl VecExt for IVec2 {
    fn taxi_len(&self) -> i32 {
        self[0].abs() + self[1].abs()
    }

    fn ns_4(self) -> impl Iterator<Item = Self> {
        DIR_4.into_iter().map(move |d| self + d)
    }
}

/// Continuous position of the center of a tile.
///
/// Tile (col, row) covers the square from (col, row) to (col + 1, row + 1).
pub fn tile_center(tile: IVec2) -> Vec2 {
    vec2(tile.x as f32 + 0.5, tile.y as f32 + 0.5)
}

/// Tile that contains the continuous position.
pub fn tile_of(pos: Vec2) -> IVec2 {
    ivec2(pos.x.floor() as i32, pos.y.floor() as i32)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tile_coordinates() {
        assert_eq!(tile_center(ivec2(2, 3)), vec2(2.5, 3.5));
        assert_eq!(tile_of(vec2(2.99, 3.01)), ivec2(2, 3));
        assert_eq!(tile_of(vec2(-0.5, 0.0)), ivec2(-1, 0));
        assert_eq!(tile_of(tile_center(ivec2(7, 1))), ivec2(7, 1));
    }

    #[test]
    fn neighbors() {
        let ns: Vec<IVec2> = ivec2(1, 1).ns_4().collect();
        assert_eq!(ns.len(), 4);
        assert!(ns.iter().all(|&n| (n - ivec2(1, 1)).is_adjacent()));
    }
}
