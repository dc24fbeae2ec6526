//! Ramer-Douglas-Peucker polyline reduction.

use egui::Pos2;

use super::segment_distance_sq;

/// Reduce `points` to the subset needed to stay within `tolerance` of the
/// original polyline.
///
/// The first and last point are always kept. Inputs with fewer than three
/// points are returned unchanged.
pub fn simplify(points: &[Pos2], tolerance: f32) -> Vec<Pos2> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let sq_tolerance = tolerance * tolerance;

    let mut simplified = Vec::with_capacity(points.len());
    simplified.push(points[0]);
    simplify_range(points, 0, last, sq_tolerance, &mut simplified);
    simplified.push(points[last]);
    simplified
}

/// Emits the kept interior points of `points[first..=last]` in order.
fn simplify_range(points: &[Pos2], first: usize, last: usize, sq_tolerance: f32, out: &mut Vec<Pos2>) {
    let mut max_sq_dist = sq_tolerance;
    let mut index = None;

    for i in first + 1..last {
        let sq_dist = segment_distance_sq(points[i], points[first], points[last]);
        if sq_dist > max_sq_dist {
            max_sq_dist = sq_dist;
            index = Some(i);
        }
    }

    if let Some(index) = index {
        simplify_range(points, first, index, sq_tolerance, out);
        out.push(points[index]);
        simplify_range(points, index, last, sq_tolerance, out);
    }
}
