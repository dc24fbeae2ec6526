//! Tolerance-based recognition of freehand strokes.
//!
//! Stages run in a fixed order and the first match wins:
//! closed strokes try circle, rectangle/square, triangle and polygon; any
//! stroke that has not matched yet is finally tried as a line.

use std::f32::consts::{PI, TAU};

use egui::{Pos2, Rect, pos2};
use serde::{Deserialize, Serialize};

use super::ShapeCandidate;
use crate::geometry::{angle_at, bounding_box, distance, point_to_line_distance, simplify};

/// Recognition thresholds, all in canvas units unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fewer raw points than this never match
    pub min_points: usize,
    pub simplify_tolerance: f32,
    /// Endpoint gap below which a stroke counts as closed
    pub closure_distance: f32,
    /// Upper bound on the variance of point-to-center distances
    pub circle_max_variance: f32,
    pub circle_probe_count: usize,
    pub circle_probe_distance: f32,
    pub circle_min_probe_hits: usize,
    /// Turn angles below this (radians) are corners
    pub corner_angle: f32,
    pub rectangle_min_corners: usize,
    pub rectangle_max_corners: usize,
    /// Relative side difference still accepted as a square
    pub square_tolerance: f32,
    pub triangle_min_corners: usize,
    /// Minimum offset of a vertex from the chord to count as significant
    pub significant_distance: f32,
    pub polygon_min_corners: usize,
    pub line_max_deviation: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            simplify_tolerance: 5.0,
            closure_distance: 30.0,
            circle_max_variance: 500.0,
            circle_probe_count: 8,
            circle_probe_distance: 20.0,
            circle_min_probe_hits: 6,
            corner_angle: PI * 0.7,
            rectangle_min_corners: 3,
            rectangle_max_corners: 5,
            square_tolerance: 0.2,
            triangle_min_corners: 2,
            significant_distance: 10.0,
            polygon_min_corners: 4,
            line_max_deviation: 20.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeClassifier {
    config: ClassifierConfig,
}

impl ShapeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Match a raw stroke against the known primitives.
    ///
    /// `None` means nothing matched and the raw ink should be kept.
    pub fn classify(&self, points: &[Pos2]) -> Option<ShapeCandidate> {
        if points.len() < self.config.min_points {
            return None;
        }

        let simplified = simplify(points, self.config.simplify_tolerance);
        let bounds = bounding_box(&simplified)?;

        if self.is_closed(&simplified) {
            let closed_match = self
                .detect_circle(&simplified, bounds)
                .or_else(|| self.detect_rectangle(&simplified, bounds))
                .or_else(|| self.detect_triangle(&simplified))
                .or_else(|| self.detect_polygon(&simplified));
            if closed_match.is_some() {
                return closed_match;
            }
        }

        self.detect_line(points, &simplified)
    }

    pub fn is_closed(&self, simplified: &[Pos2]) -> bool {
        match (simplified.first(), simplified.last()) {
            (Some(first), Some(last)) => distance(*first, *last) < self.config.closure_distance,
            _ => false,
        }
    }

    fn detect_circle(&self, simplified: &[Pos2], bounds: Rect) -> Option<ShapeCandidate> {
        let center = bounds.center();
        let distances: Vec<f32> = simplified.iter().map(|p| distance(*p, center)).collect();

        let n = distances.len() as f32;
        let mean = distances.iter().sum::<f32>() / n;
        let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f32>() / n;

        if variance >= self.config.circle_max_variance {
            return None;
        }

        let hits = self.circle_probe_hits(simplified, center, mean);
        log::trace!("circle test: variance {:.1}, {} probe hits", variance, hits);
        (hits >= self.config.circle_min_probe_hits).then_some(ShapeCandidate::Circle { center, radius: mean })
    }

    /// Evenly spaced positions on the candidate circle that have a stroke
    /// point close by.
    fn circle_probe_hits(&self, points: &[Pos2], center: Pos2, radius: f32) -> usize {
        let count = self.config.circle_probe_count.max(1);
        (0..count)
            .filter(|k| {
                let angle = TAU * *k as f32 / count as f32;
                let probe = pos2(center.x + radius * angle.cos(), center.y + radius * angle.sin());
                points
                    .iter()
                    .any(|p| distance(*p, probe) < self.config.circle_probe_distance)
            })
            .count()
    }

    fn detect_rectangle(&self, simplified: &[Pos2], bounds: Rect) -> Option<ShapeCandidate> {
        let corners = self.corners(simplified).len();
        if corners < self.config.rectangle_min_corners || corners > self.config.rectangle_max_corners {
            return None;
        }

        let (width, height) = (bounds.width(), bounds.height());
        if (width - height).abs() < width.max(height) * self.config.square_tolerance {
            Some(ShapeCandidate::Square { bounds })
        } else {
            Some(ShapeCandidate::Rectangle { bounds })
        }
    }

    fn detect_triangle(&self, simplified: &[Pos2]) -> Option<ShapeCandidate> {
        let path = simplify(simplified, self.config.simplify_tolerance);
        let corners = self.corners(&path).len();
        // Strokes with enough corners for a polygon are left to that stage.
        if corners < self.config.triangle_min_corners || corners >= self.config.polygon_min_corners {
            return None;
        }

        match self.significant_points(&path)[..] {
            [a, b, c] => Some(ShapeCandidate::Triangle { vertices: [a, b, c] }),
            _ => None,
        }
    }

    fn detect_polygon(&self, simplified: &[Pos2]) -> Option<ShapeCandidate> {
        let path = simplify(simplified, self.config.simplify_tolerance);
        let corners = self.corners(&path);
        (corners.len() >= self.config.polygon_min_corners).then_some(ShapeCandidate::Polygon { vertices: corners })
    }

    fn detect_line(&self, points: &[Pos2], simplified: &[Pos2]) -> Option<ShapeCandidate> {
        let (&start, &end) = (simplified.first()?, simplified.last()?);
        // A chord of zero length has no direction to measure against.
        if distance(start, end) <= f32::EPSILON {
            return None;
        }

        let max_deviation = points
            .iter()
            .map(|p| point_to_line_distance(*p, start, end))
            .fold(0.0_f32, f32::max);

        (max_deviation < self.config.line_max_deviation).then_some(ShapeCandidate::Line { start, end })
    }

    /// Interior points whose turn angle is sharper than the corner threshold.
    ///
    /// Points with a zero-length incident edge have no defined angle and are
    /// skipped.
    pub fn corners(&self, path: &[Pos2]) -> Vec<Pos2> {
        path.windows(3)
            .filter_map(|w| {
                let angle = angle_at(w[0], w[1], w[2])?;
                (angle < self.config.corner_angle).then_some(w[1])
            })
            .collect()
    }

    /// Reduce a path to its first point plus the vertices farthest from it.
    ///
    /// An open path yields `[first, farthest from chord, last]`. On a closed
    /// path the chord is too short to measure against, so the vertex farthest
    /// from the first point becomes the second anchor and the vertex farthest
    /// from that diagonal the third. Paths without a vertex beyond the
    /// significance distance collapse to their two endpoints.
    pub fn significant_points(&self, path: &[Pos2]) -> Vec<Pos2> {
        if path.len() <= 3 {
            return path.to_vec();
        }

        let first = path[0];
        let last = path[path.len() - 1];
        let interior = 1..path.len() - 1;

        if distance(first, last) < self.config.closure_distance {
            let Some(pivot) = farthest(interior.clone(), |i| distance(path[i], first)) else {
                return vec![first, last];
            };
            let anchor = path[pivot];
            let apex = farthest(interior.filter(|i| *i != pivot), |i| {
                point_to_line_distance(path[i], first, anchor)
            });

            return match apex {
                Some(apex) if point_to_line_distance(path[apex], first, anchor) > self.config.significant_distance => {
                    let (a, b) = if pivot < apex { (pivot, apex) } else { (apex, pivot) };
                    vec![first, path[a], path[b]]
                }
                _ => vec![first, last],
            };
        }

        match farthest(interior, |i| point_to_line_distance(path[i], first, last)) {
            Some(index) if point_to_line_distance(path[index], first, last) > self.config.significant_distance => {
                vec![first, path[index], last]
            }
            _ => vec![first, last],
        }
    }
}

/// Index with the largest score; the earliest wins ties.
fn farthest(indices: impl Iterator<Item = usize>, score: impl Fn(usize) -> f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for i in indices {
        let s = score(i);
        if best.is_none_or(|(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;

    fn circle(center: Pos2, radius: f32, count: usize) -> Vec<Pos2> {
        (0..count)
            .map(|i| {
                let a = TAU * i as f32 / count as f32;
                pos2(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect()
    }

    /// Samples `per_edge` points along each edge of the polyline through `corners`.
    fn polyline(corners: &[Pos2], per_edge: usize) -> Vec<Pos2> {
        let mut points = Vec::new();
        for edge in corners.windows(2) {
            for k in 0..per_edge {
                points.push(edge[0].lerp(edge[1], k as f32 / per_edge as f32));
            }
        }
        if let Some(last) = corners.last() {
            points.push(*last);
        }
        points
    }

    #[test]
    fn test_circle() {
        let classifier = ShapeClassifier::default();
        let shape = classifier.classify(&circle(pos2(150.0, 150.0), 100.0, 72)).unwrap();

        let ShapeCandidate::Circle { center, radius } = shape else {
            panic!("expected a circle, got {shape:?}");
        };
        assert!(distance(center, pos2(150.0, 150.0)) < 5.0);
        assert!((radius - 100.0).abs() < 5.0);
    }

    #[test]
    fn test_square_not_rectangle() {
        let classifier = ShapeClassifier::default();
        let points = polyline(
            &[pos2(0.0, 0.0), pos2(100.0, 0.0), pos2(100.0, 100.0), pos2(0.0, 100.0), pos2(0.0, 0.0)],
            5,
        );
        let shape = classifier.classify(&points).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Square);
    }

    #[test]
    fn test_near_square_is_rectangle() {
        let classifier = ShapeClassifier::default();
        let points = polyline(
            &[pos2(0.0, 0.0), pos2(100.0, 0.0), pos2(100.0, 75.0), pos2(0.0, 75.0), pos2(0.0, 0.0)],
            5,
        );
        let shape = classifier.classify(&points).unwrap();
        let ShapeCandidate::Rectangle { bounds } = shape else {
            panic!("expected a rectangle, got {shape:?}");
        };
        assert_eq!(bounds.min, pos2(0.0, 0.0));
        assert_eq!(bounds.max, pos2(100.0, 75.0));
    }

    #[test]
    fn test_line_within_tolerance() {
        let classifier = ShapeClassifier::default();
        let points: Vec<Pos2> = (0..=20).map(|i| pos2(i as f32 * 10.0, 5.0 * (i as f32).sin())).collect();

        let shape = classifier.classify(&points).unwrap();
        let ShapeCandidate::Line { start, end } = shape else {
            panic!("expected a line, got {shape:?}");
        };
        assert_eq!(start, pos2(0.0, 0.0));
        assert_eq!(end, points[20]);
    }

    #[test]
    fn test_too_few_points() {
        let classifier = ShapeClassifier::default();
        let points = circle(pos2(150.0, 150.0), 100.0, 72);
        assert!(classifier.classify(&points[..9]).is_none());
        assert!(classifier.classify(&[]).is_none());
    }

    #[test]
    fn test_triangle() {
        let classifier = ShapeClassifier::default();
        let points = polyline(&[pos2(0.0, 0.0), pos2(120.0, 0.0), pos2(60.0, 100.0), pos2(2.0, 3.0)], 10);

        let shape = classifier.classify(&points).unwrap();
        assert_eq!(
            shape,
            ShapeCandidate::Triangle {
                vertices: [pos2(0.0, 0.0), pos2(120.0, 0.0), pos2(60.0, 100.0)]
            }
        );
    }

    #[test]
    fn test_star_is_polygon() {
        let classifier = ShapeClassifier::default();
        let star: Vec<Pos2> = (0..=10)
            .map(|k| {
                let r = if k % 2 == 0 { 100.0 } else { 38.0 };
                let a = -PI / 2.0 + k as f32 * PI / 5.0;
                pos2(150.0 + r * a.cos(), 150.0 + r * a.sin())
            })
            .collect();

        let shape = classifier.classify(&polyline(&star, 6)).unwrap();
        let ShapeCandidate::Polygon { vertices } = shape else {
            panic!("expected a polygon, got {shape:?}");
        };
        assert_eq!(vertices.len(), 9);
    }

    #[test]
    fn test_open_wiggle_matches_nothing() {
        let classifier = ShapeClassifier::default();
        let points: Vec<Pos2> = (0..30).map(|i| pos2(i as f32 * 10.0, if i % 10 < 5 { 0.0 } else { 60.0 })).collect();
        assert!(classifier.classify(&points).is_none());
    }

    #[test]
    fn test_corners_skip_repeated_points() {
        let classifier = ShapeClassifier::default();
        let path = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)];
        assert!(classifier.corners(&path).is_empty());

        let path = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)];
        assert_eq!(classifier.corners(&path), vec![pos2(10.0, 0.0)]);
    }

    #[test]
    fn test_significant_points_open_path() {
        let classifier = ShapeClassifier::default();
        let path = [pos2(0.0, 0.0), pos2(30.0, 4.0), pos2(50.0, 40.0), pos2(100.0, 0.0)];
        assert_eq!(
            classifier.significant_points(&path),
            vec![pos2(0.0, 0.0), pos2(50.0, 40.0), pos2(100.0, 0.0)]
        );

        let flat = [pos2(0.0, 0.0), pos2(30.0, 4.0), pos2(60.0, -3.0), pos2(100.0, 0.0)];
        assert_eq!(classifier.significant_points(&flat), vec![pos2(0.0, 0.0), pos2(100.0, 0.0)]);
    }
}
