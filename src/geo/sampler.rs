//! Spatial decimation for dense viewports.
//!
//! The query rectangle is cut into a uniform `size × size` grid and each
//! populated cell keeps its most-liked point. This is a best-effort spread of
//! markers over the viewport, not a guarantee of even density: a viewport
//! whose points sit in a handful of cells still yields only a handful of
//! representatives, and callers must tolerate fewer results than requested.

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::Rectangle;
use crate::models::Point;

/// Cells per requested point.
pub const GRID_OVERSAMPLE_FACTOR: usize = 2;

pub type CellIndex = (usize, usize);

/// Uniform partition of a rectangle, keyed by `(lat_index, lng_index)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrid {
    origin_lng: f64,
    origin_lat: f64,
    lat_step: f64,
    lng_step: f64,
    size: usize,
}

impl SampleGrid {
    pub fn for_target(target_count: usize, rect: &Rectangle) -> Self {
        let cell_count = target_count.saturating_mul(GRID_OVERSAMPLE_FACTOR).max(1);
        let size = ((cell_count as f64).sqrt().ceil() as usize).max(1);

        Self {
            origin_lng: rect.sw_lng,
            origin_lat: rect.sw_lat,
            lat_step: (rect.ne_lat - rect.sw_lat) / size as f64,
            lng_step: (rect.ne_lng - rect.sw_lng) / size as f64,
            size,
        }
    }

    /// Cells per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// A zero-area rectangle collapses the grid into a single cell.
    pub fn is_degenerate(&self) -> bool {
        !(self.lat_step > 0.0 && self.lng_step > 0.0)
    }

    pub fn cell_of(&self, lng: f64, lat: f64) -> CellIndex {
        if self.is_degenerate() {
            return (0, 0);
        }
        (
            axis_index(lat - self.origin_lat, self.lat_step, self.size),
            axis_index(lng - self.origin_lng, self.lng_step, self.size),
        )
    }
}

/// Points on the upper edge (or outside the rectangle) are clamped into the
/// nearest edge cell so none is lost.
fn axis_index(offset: f64, step: f64, size: usize) -> usize {
    let raw = (offset / step).floor();
    if raw.is_nan() || raw < 0.0 {
        0
    } else {
        (raw as usize).min(size - 1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DensitySampler {
    target_count: usize,
}

impl DensitySampler {
    pub fn new(target_count: usize) -> Self {
        Self { target_count }
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Index of the champion point for every populated cell, in order of
    /// first appearance. Highest `likes` wins; ties keep the earlier point.
    pub fn cell_champions(&self, points: &[Point], grid: &SampleGrid) -> IndexMap<CellIndex, usize> {
        let mut champions: IndexMap<CellIndex, usize> = IndexMap::new();

        for (idx, point) in points.iter().enumerate() {
            let cell = grid.cell_of(point.location.longitude, point.location.latitude);
            champions
                .entry(cell)
                .and_modify(|best| {
                    if point.likes > points[*best].likes {
                        *best = idx;
                    }
                })
                .or_insert(idx);
        }

        champions
    }

    /// Reduces `points` to at most `target_count` representatives.
    ///
    /// Input at or under the target comes back untouched. Otherwise one
    /// champion per populated cell is kept; if that is still too many the
    /// champions are shuffled with `rng` and truncated, which is the only
    /// non-deterministic step.
    pub fn sample<R: Rng + ?Sized>(&self, points: Vec<Point>, rect: &Rectangle, rng: &mut R) -> Vec<Point> {
        if points.len() <= self.target_count {
            return points;
        }

        let grid = SampleGrid::for_target(self.target_count, rect);
        let champions = self.cell_champions(&points, &grid);
        let candidates = points.len();

        let mut slots: Vec<Option<Point>> = points.into_iter().map(Some).collect();
        let mut picked: Vec<Point> = champions
            .into_values()
            .filter_map(|idx| slots[idx].take())
            .collect();

        let populated = picked.len();
        if picked.len() > self.target_count {
            picked.shuffle(rng);
            picked.truncate(self.target_count);
        }

        debug!(
            "Grid sample: {} candidates, grid {}x{}, {} populated cells, {} kept",
            candidates,
            grid.size(),
            grid.size(),
            populated,
            picked.len()
        );

        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn point(id: i64, lng: f64, lat: f64, likes: i64) -> Point {
        Point {
            id,
            title: format!("point {}", id),
            author: None,
            description: None,
            category: "hot".to_string(),
            location: GeoPoint {
                longitude: lng,
                latitude: lat,
            },
            likes,
            created_at: "2024-01-15T10:30:00.000Z".to_string(),
        }
    }

    fn unit_rect() -> Rectangle {
        Rectangle {
            sw_lng: 0.0,
            sw_lat: 0.0,
            ne_lng: 1.0,
            ne_lat: 1.0,
        }
    }

    fn ids(points: &[Point]) -> Vec<i64> {
        points.iter().map(|p| p.id).collect()
    }

    /// Deterministic scatter over the unit square.
    fn scatter(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let lng = ((i * 37) % 101) as f64 / 100.0;
                let lat = ((i * 53) % 97) as f64 / 96.0;
                point(i as i64, lng, lat, ((i * 7919) % 311) as i64)
            })
            .collect()
    }

    #[test]
    fn test_small_input_returned_unchanged() {
        let points = vec![
            point(3, 0.9, 0.9, 1),
            point(1, 0.1, 0.1, 50),
            point(2, 0.1, 0.1, 99),
        ];
        let mut rng = StdRng::seed_from_u64(1);

        let sampled = DensitySampler::new(3).sample(points.clone(), &unit_rect(), &mut rng);
        assert_eq!(sampled, points);

        let sampled = DensitySampler::new(10).sample(points.clone(), &unit_rect(), &mut rng);
        assert_eq!(ids(&sampled), vec![3, 1, 2]);
    }

    #[test]
    fn test_same_cell_keeps_most_liked() {
        let rect = Rectangle {
            sw_lng: 103.9,
            sw_lat: 29.0,
            ne_lng: 104.1,
            ne_lat: 31.0,
        };
        let points = vec![point(1, 104.0, 30.0, 5), point(2, 104.0001, 30.0, 9)];
        let mut rng = StdRng::seed_from_u64(7);

        let sampled = DensitySampler::new(1).sample(points, &rect, &mut rng);

        assert_eq!(sampled.len(), 1);
        assert_eq!(sampled[0].likes, 9);
        assert_eq!(sampled[0].id, 2);
    }

    #[test]
    fn test_likes_tie_first_occurrence_wins() {
        let points = vec![
            point(10, 0.2, 0.2, 4),
            point(11, 0.21, 0.21, 4),
            point(12, 0.22, 0.22, 3),
        ];
        let grid = SampleGrid::for_target(1, &unit_rect());
        let champions = DensitySampler::new(1).cell_champions(&points, &grid);

        assert_eq!(champions.len(), 1);
        assert_eq!(champions.values().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_grid_dimensions_for_page_of_ten() {
        // pageSize 10 * multiplier 5 = 50 targets -> 100 cells -> 10x10
        let grid = SampleGrid::for_target(50, &unit_rect());
        assert_eq!(grid.size(), 10);

        assert_eq!(SampleGrid::for_target(1, &unit_rect()).size(), 2);
        assert_eq!(SampleGrid::for_target(5, &unit_rect()).size(), 4);
        assert_eq!(SampleGrid::for_target(0, &unit_rect()).size(), 1);
    }

    #[test]
    fn test_every_point_lands_in_exactly_one_cell() {
        let rect = Rectangle {
            sw_lng: 103.9,
            sw_lat: 29.0,
            ne_lng: 104.1,
            ne_lat: 31.0,
        };
        let grid = SampleGrid::for_target(50, &rect);
        let size = grid.size();

        let corners = [
            (rect.sw_lng, rect.sw_lat),
            (rect.ne_lng, rect.ne_lat),
            (rect.sw_lng, rect.ne_lat),
            (rect.ne_lng, rect.sw_lat),
        ];
        for (lng, lat) in corners {
            let (r, c) = grid.cell_of(lng, lat);
            assert!(r < size && c < size);
        }
        assert_eq!(grid.cell_of(rect.ne_lng, rect.ne_lat), (size - 1, size - 1));
        assert_eq!(grid.cell_of(rect.sw_lng, rect.sw_lat), (0, 0));

        for i in 0..=200 {
            let t = i as f64 / 200.0;
            let lng = rect.sw_lng + t * (rect.ne_lng - rect.sw_lng);
            let lat = rect.ne_lat - t * (rect.ne_lat - rect.sw_lat);
            let (r, c) = grid.cell_of(lng, lat);
            assert!(r < size, "lat index {} out of grid", r);
            assert!(c < size, "lng index {} out of grid", c);
        }
    }

    #[test]
    fn test_champion_beats_everything_in_its_cell() {
        let points = scatter(400);
        let grid = SampleGrid::for_target(20, &unit_rect());
        let champions = DensitySampler::new(20).cell_champions(&points, &grid);

        for point in &points {
            let cell = grid.cell_of(point.location.longitude, point.location.latitude);
            let champion = &points[champions[&cell]];
            assert!(champion.likes >= point.likes);
            assert_eq!(
                grid.cell_of(champion.location.longitude, champion.location.latitude),
                cell
            );
        }
    }

    #[test]
    fn test_output_never_exceeds_target() {
        let points = scatter(400);
        for target in [1usize, 5, 20, 50, 399] {
            let mut rng = StdRng::seed_from_u64(target as u64);
            let sampled = DensitySampler::new(target).sample(points.clone(), &unit_rect(), &mut rng);

            assert!(sampled.len() <= target);
            let unique: HashSet<i64> = sampled.iter().map(|p| p.id).collect();
            assert_eq!(unique.len(), sampled.len());
        }
    }

    #[test]
    fn test_few_populated_cells_returned_without_shuffle() {
        // Four tight clusters in distinct corners; target 5 -> 4x4 grid.
        let mut points = Vec::new();
        let corners = [(0.05, 0.05), (0.95, 0.05), (0.05, 0.95), (0.95, 0.95)];
        for (c, (lng, lat)) in corners.iter().enumerate() {
            for k in 0..3 {
                let id = (c * 3 + k) as i64;
                points.push(point(id, lng + k as f64 * 0.001, *lat, (k as i64 + 1) * 10));
            }
        }
        let mut rng = StdRng::seed_from_u64(99);

        let sampled = DensitySampler::new(5).sample(points, &unit_rect(), &mut rng);

        // champion of each cluster is its third point, in first-seen cell order
        assert_eq!(ids(&sampled), vec![2, 5, 8, 11]);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let points = scatter(400);
        let sampler = DensitySampler::new(10);

        let a = sampler.sample(points.clone(), &unit_rect(), &mut StdRng::seed_from_u64(42));
        let b = sampler.sample(points.clone(), &unit_rect(), &mut StdRng::seed_from_u64(42));

        assert_eq!(a.len(), 10);
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_zero_area_rectangle_is_one_cell() {
        let rect = Rectangle {
            sw_lng: 104.0,
            sw_lat: 30.0,
            ne_lng: 104.0,
            ne_lat: 30.0,
        };
        let points = vec![
            point(1, 104.0, 30.0, 3),
            point(2, 104.0, 30.0, 8),
            point(3, 104.0, 30.0, 8),
        ];
        let grid = SampleGrid::for_target(2, &rect);
        assert!(grid.is_degenerate());

        let sampled = DensitySampler::new(2).sample(points, &rect, &mut StdRng::seed_from_u64(0));
        assert_eq!(ids(&sampled), vec![2]);
    }
}
