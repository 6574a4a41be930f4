//! Lattice value noise for procedural terrain.

use glam::Vec2;

/// Pseudorandom value in [0, 1) for an integer lattice point.
fn lattice(seed: u64, x: i32, y: i32) -> f32 {
    // Squirrel-style integer mixing, stable across platforms.
    let mut h = seed
        ^ (x as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u32 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h = h.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    h ^= h >> 33;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Smoothly interpolated value noise in [0, 1).
pub fn value_noise(seed: u64, p: Vec2) -> f32 {
    let (x0, y0) = (p.x.floor(), p.y.floor());
    let (tx, ty) = (smoothstep(p.x - x0), smoothstep(p.y - y0));
    let (x0, y0) = (x0 as i32, y0 as i32);

    let a = lattice(seed, x0, y0);
    let b = lattice(seed, x0 + 1, y0);
    let c = lattice(seed, x0, y0 + 1);
    let d = lattice(seed, x0 + 1, y0 + 1);

    let top = a + (b - a) * tx;
    let bottom = c + (d - c) * tx;
    top + (bottom - top) * ty
}

/// Fractal sum of `octaves` layers of value noise, normalized to [0, 1).
pub fn fbm(seed: u64, p: Vec2, octaves: u32) -> f32 {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amp = 1.0;
    let mut freq = 1.0;
    for i in 0..octaves {
        sum += amp * value_noise(seed.wrapping_add(i as u64), p * freq);
        norm += amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    if norm > 0.0 {
        sum / norm
    } else {
        0.0
    }
}
