// src/heightmap_data.rs
use bevy::math::{UVec2, Vec2};
use bevy::prelude::*;
use std::sync::Arc;

use crate::roulette::core::{Intersection, SurfaceKind, WorldProbe};

/// In-memory height grid over the X/Y plane (Z-up), usable as a `WorldProbe`.
#[derive(Clone)]
pub struct HeightField {
    /// World-space origin of the grid (min X/Y corner)
    pub origin: Vec2,
    /// Extent of the whole grid in world units (X,Y)
    pub size: Vec2,
    /// Sample resolution (columns, rows)
    pub res: UVec2,
    /// Row-major heights in world units
    pub heights: Arc<Vec<f32>>,
    /// Runtime obstacles (buildings etc.) reported above the terrain
    pub obstacles: Vec<Obstacle>,
}

/// Axis-aligned box footprint on X/Y with a flat roof at `top`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub min: Vec2,
    pub max: Vec2,
    pub top: f32,
}

impl Obstacle {
    #[inline]
    fn covers(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

impl HeightField {
    /// Build by evaluating `f(world_x, world_y)` at every grid sample.
    pub fn from_fn(origin: Vec2, size: Vec2, res: UVec2, f: impl Fn(f32, f32) -> f32) -> Self {
        let res = res.max(UVec2::splat(2));
        let step = size / (res - UVec2::ONE).as_vec2();
        let mut heights = Vec::with_capacity((res.x * res.y) as usize);
        for y in 0..res.y {
            for x in 0..res.x {
                heights.push(f(origin.x + x as f32 * step.x, origin.y + y as f32 * step.y));
            }
        }
        Self { origin, size, res, heights: Arc::new(heights), obstacles: Vec::new() }
    }

    /// Decode a little-endian RAW16 heightmap; `height_scale` is the world
    /// height of a full-range (65535) sample. `None` if `bytes` is short.
    pub fn from_raw16_bytes(bytes: &[u8], res: UVec2, origin: Vec2, size: Vec2, height_scale: f32) -> Option<Self> {
        let expected_pixels = (res.x as usize) * (res.y as usize);
        if res.x < 2 || res.y < 2 || bytes.len() < expected_pixels * 2 {
            return None;
        }

        // Convert little-endian bytes -> normalized height
        let heights = bytes
            .chunks_exact(2)
            .take(expected_pixels)
            .map(|px| u16::from_le_bytes([px[0], px[1]]) as f32 / u16::MAX as f32 * height_scale)
            .collect();

        Some(Self { origin, size, res, heights: Arc::new(heights), obstacles: Vec::new() })
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Obstacle>) -> Self {
        self.obstacles = obstacles;
        self
    }

    #[inline]
    fn get_clamped(&self, x: i32, y: i32) -> f32 {
        let xi = x.clamp(0, self.res.x as i32 - 1) as u32;
        let yi = y.clamp(0, self.res.y as i32 - 1) as u32;
        // Row-major
        self.heights[(yi * self.res.x + xi) as usize]
    }

    /// Bilinear-sample the terrain height at (world_x, world_y).
    /// Returns None outside the grid.
    pub fn sample_height(&self, world_x: f32, world_y: f32) -> Option<f32> {
        let lx = world_x - self.origin.x;
        let ly = world_y - self.origin.y;
        if lx < 0.0 || ly < 0.0 || lx > self.size.x || ly > self.size.y {
            return None;
        }

        let max_x = self.res.x.saturating_sub(1) as i32;
        let max_y = self.res.y.saturating_sub(1) as i32;

        let px_f = (lx / self.size.x).clamp(0.0, 1.0) * max_x as f32;
        let py_f = (ly / self.size.y).clamp(0.0, 1.0) * max_y as f32;

        let x0 = px_f.floor() as i32;
        let y0 = py_f.floor() as i32;
        let x1 = (x0 + 1).min(max_x);
        let y1 = (y0 + 1).min(max_y);

        let dx = px_f - x0 as f32;
        let dy = py_f - y0 as f32;

        let s00 = self.get_clamped(x0, y0);
        let s10 = self.get_clamped(x1, y0);
        let s01 = self.get_clamped(x0, y1);
        let s11 = self.get_clamped(x1, y1);

        let a = s00 * (1.0 - dx) + s10 * dx;
        let b = s01 * (1.0 - dx) + s11 * dx;
        Some(a * (1.0 - dy) + b * dy)
    }
}

impl WorldProbe for HeightField {
    fn probe_downward(&self, origin: Vec3, max_distance: f32) -> Vec<Intersection> {
        let floor = origin.z - max_distance;
        let xy = origin.truncate();

        let mut hits: Vec<Intersection> = self
            .obstacles
            .iter()
            .filter(|o| o.covers(xy) && o.top <= origin.z && o.top >= floor)
            .map(|o| Intersection { point: xy.extend(o.top), surface: SurfaceKind::Dynamic })
            .collect();

        if let Some(z) = self.sample_height(xy.x, xy.y) {
            if z <= origin.z && z >= floor {
                hits.push(Intersection { point: xy.extend(z), surface: SurfaceKind::Terrain });
            }
        }

        // Nearest first
        hits.sort_by(|a, b| b.point.z.total_cmp(&a.point.z));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> HeightField {
        // z = x / 10 over a 1000 x 1000 square
        HeightField::from_fn(Vec2::ZERO, Vec2::splat(1_000.0), UVec2::splat(11), |x, _| x / 10.0)
    }

    #[test]
    fn bilinear_matches_linear_terrain() {
        let hf = ramp();
        let z = hf.sample_height(250.0, 730.0).expect("inside");
        assert!((z - 25.0).abs() < 1e-3);
        assert_eq!(hf.sample_height(-1.0, 10.0), None);
        assert_eq!(hf.sample_height(10.0, 1_000.5), None);
    }

    #[test]
    fn raw16_decodes_little_endian() {
        let px: [u16; 4] = [0, u16::MAX, 0, u16::MAX];
        let bytes: Vec<u8> = px.iter().flat_map(|v| v.to_le_bytes()).collect();
        let hf = HeightField::from_raw16_bytes(&bytes, UVec2::new(2, 2), Vec2::ZERO, Vec2::splat(10.0), 100.0)
            .expect("decodes");
        assert!((hf.sample_height(10.0, 0.0).unwrap_or_default() - 100.0).abs() < 1e-3);
        assert!((hf.sample_height(5.0, 5.0).unwrap_or_default() - 50.0).abs() < 1e-3);
        assert!(HeightField::from_raw16_bytes(&bytes[..6], UVec2::new(2, 2), Vec2::ZERO, Vec2::ONE, 1.0).is_none());
    }

    #[test]
    fn probe_reports_obstacles_before_terrain() {
        let hf = ramp().with_obstacles(vec![Obstacle { min: Vec2::splat(100.0), max: Vec2::splat(200.0), top: 80.0 }]);
        let hits = hf.probe_downward(Vec3::new(150.0, 150.0, 500.0), 1_000.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].surface, SurfaceKind::Dynamic);
        assert_eq!(hits[1].surface, SurfaceKind::Terrain);
        assert!((hits[1].point.z - 15.0).abs() < 1e-3);

        // Too short to reach the ground.
        assert!(hf.probe_downward(Vec3::new(500.0, 500.0, 500.0), 10.0).is_empty());
    }
}
