// Map document parsing: arena bounds, collider rectangles, and the
// perimeter spawn generator.

use crate::domain::rng::seeded_rng;
use rand::seq::SliceRandom;
use serde::Deserialize;

pub const DEFAULT_SPAWN_MARGIN: f32 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn left(&self) -> f32 {
        self.x
    }
    pub fn right(&self) -> f32 {
        self.x + self.w
    }
    pub fn top(&self) -> f32 {
        self.y
    }
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default)]
    pub collider: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapLayer {
    #[serde(default)]
    pub tiles: Vec<TileRect>,
    #[serde(default)]
    pub data: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapDocument {
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    #[serde(rename = "mapWidth")]
    pub map_width: u32,
    #[serde(rename = "mapHeight")]
    pub map_height: u32,
    #[serde(default)]
    pub layers: Vec<MapLayer>,
}

impl MapDocument {
    pub fn bounds(&self) -> (f32, f32) {
        (
            self.tile_size * self.map_width as f32,
            self.tile_size * self.map_height as f32,
        )
    }

    pub fn colliders(&self) -> Vec<Rect> {
        let mut rects = Vec::new();
        for layer in &self.layers {
            for tile in &layer.tiles {
                if tile.collider {
                    rects.push(Rect {
                        x: tile.x,
                        y: tile.y,
                        w: tile.w,
                        h: tile.h,
                    });
                }
            }
            if self.map_width == 0 {
                continue;
            }
            for (idx, &tile_id) in layer.data.iter().enumerate() {
                if tile_id == 0 {
                    continue;
                }
                let col = (idx as u32) % self.map_width;
                let row = (idx as u32) / self.map_width;
                rects.push(Rect {
                    x: col as f32 * self.tile_size,
                    y: row as f32 * self.tile_size,
                    w: self.tile_size,
                    h: self.tile_size,
                });
            }
        }
        rects
    }
}

/// Produce `n` evenly distributed points along the perimeter of an inset
/// rectangle, deterministic for a given `(bounds, margin, n, seed)`.
pub fn perimeter_spawn_points(bounds: (f32, f32), margin: f32, n: usize, seed: &str) -> Vec<(f32, f32)> {
    if n == 0 {
        return Vec::new();
    }
    let (w, h) = bounds;
    let inset = Rect {
        x: margin,
        y: margin,
        w: (w - 2.0 * margin).max(0.0),
        h: (h - 2.0 * margin).max(0.0),
    };

    let base = n / 4;
    let rem = n % 4;
    let counts: [usize; 4] = std::array::from_fn(|edge| base + usize::from(edge < rem));

    let mut points = Vec::with_capacity(n);
    for (edge, &slots) in counts.iter().enumerate() {
        for i in 0..slots {
            let t = (i as f32 + 0.5) / slots as f32;
            points.push(edge_point(edge, t, inset));
        }
    }

    let mut rng = seeded_rng(&[
        &w.to_bits().to_string(),
        &h.to_bits().to_string(),
        &margin.to_bits().to_string(),
        &n.to_string(),
        seed,
    ]);
    points.shuffle(&mut rng);

    if points.len() >= n {
        points.truncate(n);
        points
    } else if points.is_empty() {
        Vec::new()
    } else {
        (0..n).map(|i| points[i % points.len()]).collect()
    }
}

fn edge_point(edge: usize, t: f32, inset: Rect) -> (f32, f32) {
    match edge {
        0 => (inset.x + t * inset.w, inset.y),                   // top
        1 => (inset.right(), inset.y + t * inset.h),             // right
        2 => (inset.right() - t * inset.w, inset.bottom()),       // bottom
        _ => (inset.x, inset.bottom() - t * inset.h),             // left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_tile_grid() {
        let doc = MapDocument {
            tile_size: 16.0,
            map_width: 20,
            map_height: 10,
            layers: Vec::new(),
        };
        assert_eq!(doc.bounds(), (320.0, 160.0));
    }

    #[test]
    fn colliders_from_explicit_tiles_and_dense_data() {
        let doc = MapDocument {
            tile_size: 16.0,
            map_width: 2,
            map_height: 2,
            layers: vec![
                MapLayer {
                    tiles: vec![TileRect { x: 0.0, y: 0.0, w: 16.0, h: 16.0, collider: true }],
                    data: Vec::new(),
                },
                MapLayer {
                    tiles: Vec::new(),
                    data: vec![0, 1, 0, 2],
                },
            ],
        };
        let rects = doc.colliders();
        assert_eq!(rects.len(), 3);
        // dense tile id=1 at index 1 -> col 1, row 0
        assert!(rects.iter().any(|r| r.x == 16.0 && r.y == 0.0));
        // dense tile id=2 at index 3 -> col 1, row 1
        assert!(rects.iter().any(|r| r.x == 16.0 && r.y == 16.0));
    }

    #[test]
    fn perimeter_spawns_deterministic_for_same_inputs() {
        let a = perimeter_spawn_points((1856.0, 1856.0), 96.0, 16, "deadbeef");
        let b = perimeter_spawn_points((1856.0, 1856.0), 96.0, 16, "deadbeef");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn perimeter_spawns_differ_for_different_seeds() {
        let a = perimeter_spawn_points((1856.0, 1856.0), 96.0, 16, "seed-a");
        let b = perimeter_spawn_points((1856.0, 1856.0), 96.0, 16, "seed-b");
        assert_ne!(a, b);
    }

    #[test]
    fn perimeter_spawns_stay_inside_inset_rect() {
        let bounds = (1000.0, 800.0);
        let margin = 96.0;
        let points = perimeter_spawn_points(bounds, margin, 9, "x");
        for (x, y) in points {
            assert!(x >= margin - 0.01 && x <= bounds.0 - margin + 0.01);
            assert!(y >= margin - 0.01 && y <= bounds.1 - margin + 0.01);
        }
    }
}
