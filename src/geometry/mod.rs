//! Point and vector helpers shared by the renderer and the shape classifier.
//!
//! All functions are pure. Degenerate input is reported through the return
//! type (`Option`) instead of producing `NaN`.

use egui::{Pos2, Rect};

mod simplify;

pub use simplify::simplify;

/// Squared lengths below this are treated as zero.
const DEGENERATE_LENGTH_SQ: f32 = 1e-12;

/// Euclidean distance between two points
pub fn distance(a: Pos2, b: Pos2) -> f32 {
    a.distance(b)
}

/// Midpoint of the segment `a`-`b`
pub fn midpoint(a: Pos2, b: Pos2) -> Pos2 {
    Pos2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Axis-aligned bounds of a point set, `None` when the set is empty.
pub fn bounding_box(points: &[Pos2]) -> Option<Rect> {
    let first = points.first()?;

    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;

    for point in &points[1..] {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Some(Rect::from_min_max(
        Pos2::new(min_x, min_y),
        Pos2::new(max_x, max_y),
    ))
}

/// Angle in `[0, π]` between the two edges meeting at `vertex`.
///
/// A straight continuation gives π, a full reversal gives 0. Returns `None`
/// when either edge has zero length, since the angle is undefined there.
pub fn angle_at(prev: Pos2, vertex: Pos2, next: Pos2) -> Option<f32> {
    let v1 = prev - vertex;
    let v2 = next - vertex;

    let mag_sq1 = v1.length_sq();
    let mag_sq2 = v2.length_sq();
    if mag_sq1 < DEGENERATE_LENGTH_SQ || mag_sq2 < DEGENERATE_LENGTH_SQ {
        return None;
    }

    let cos = v1.dot(v2) / (mag_sq1.sqrt() * mag_sq2.sqrt());
    // Rounding can push the cosine just outside [-1, 1].
    Some(cos.clamp(-1.0, 1.0).acos())
}

/// Perpendicular distance from `p` to the infinite line through
/// `line_start` and `line_end`.
///
/// When the two endpoints coincide there is no line; the distance to
/// `line_start` is returned instead.
pub fn point_to_line_distance(p: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let d = line_end - line_start;
    let length_sq = d.length_sq();
    if length_sq < DEGENERATE_LENGTH_SQ {
        return p.distance(line_start);
    }

    let numerator = (d.y * p.x - d.x * p.y + line_end.x * line_start.y - line_end.y * line_start.x).abs();
    numerator / length_sq.sqrt()
}

/// Squared distance from `p` to the closed segment `a`-`b`.
pub fn segment_distance_sq(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let d = b - a;
    let length_sq = d.length_sq();
    if length_sq < DEGENERATE_LENGTH_SQ {
        return (p - a).length_sq();
    }

    let t = ((p - a).dot(d) / length_sq).clamp(0.0, 1.0);
    let projection = a + d * t;
    (p - projection).length_sq()
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_bounding_box() {
        let points = [pos2(3.0, -1.0), pos2(-2.0, 4.0), pos2(1.0, 1.0)];
        let bounds = bounding_box(&points).unwrap();
        assert_eq!(bounds.min, pos2(-2.0, -1.0));
        assert_eq!(bounds.max, pos2(3.0, 4.0));

        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_angle_at() {
        let right = angle_at(pos2(0.0, 10.0), pos2(0.0, 0.0), pos2(10.0, 0.0)).unwrap();
        assert!((right - FRAC_PI_2).abs() < 1e-5);

        let straight = angle_at(pos2(-5.0, 0.0), pos2(0.0, 0.0), pos2(5.0, 0.0)).unwrap();
        assert!((straight - PI).abs() < 1e-5);

        let reversal = angle_at(pos2(5.0, 0.0), pos2(0.0, 0.0), pos2(3.0, 0.0)).unwrap();
        assert!(reversal.abs() < 1e-3);
    }

    #[test]
    fn test_angle_at_degenerate_edge() {
        assert!(angle_at(pos2(1.0, 1.0), pos2(1.0, 1.0), pos2(5.0, 0.0)).is_none());
        assert!(angle_at(pos2(0.0, 0.0), pos2(1.0, 1.0), pos2(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_point_to_line_distance() {
        let d = point_to_line_distance(pos2(5.0, 3.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-5);

        // The line is infinite, so points past the endpoints still measure perpendicular distance.
        let d = point_to_line_distance(pos2(20.0, -4.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert!((d - 4.0).abs() < 1e-5);

        let d = point_to_line_distance(pos2(3.0, 4.0), pos2(0.0, 0.0), pos2(0.0, 0.0));
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_segment_distance_clamps_to_endpoints() {
        let d = segment_distance_sq(pos2(13.0, 4.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert!((d - 25.0).abs() < 1e-4);

        let d = segment_distance_sq(pos2(5.0, 2.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert!((d - 4.0).abs() < 1e-4);
    }
}
