//! Stroke outlining: turns pressure-sampled centrelines into fillable polygons.

use crate::shapes::Sample;
use kurbo::{BezPath, Point, Vec2};
use std::f64::consts::PI;

/// Samples closer than this are treated as the same position.
const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Parameters for [`stroke_to_outline_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineOptions {
    /// Nominal stroke diameter.
    pub size: f64,
    /// How much pressure thins the stroke. 0 keeps a constant width.
    pub thinning: f64,
    /// Segments per half-circle end cap.
    pub cap_segments: usize,
}

impl OutlineOptions {
    pub fn new(size: f64) -> Self {
        Self {
            size,
            thinning: 0.0,
            cap_segments: 8,
        }
    }

    pub fn with_thinning(mut self, thinning: f64) -> Self {
        self.thinning = thinning.clamp(-1.0, 1.0);
        self
    }

    fn radius(&self, pressure: f64) -> f64 {
        let pressure = if pressure.is_finite() { pressure.clamp(0.0, 1.0) } else { 1.0 };
        (self.size * (0.5 - self.thinning * (0.5 - pressure))).max(0.0)
    }
}

/// Outline a stroke with constant width.
///
/// Fewer than two samples yield an empty polygon.
pub fn stroke_to_outline(samples: &[Sample], width: f64) -> Vec<Point> {
    stroke_to_outline_with(samples, &OutlineOptions::new(width))
}

/// Outline a stroke as a closed polygon around its centreline.
///
/// The polygon runs along the left side, around the end cap, back along the
/// right side and around the start cap.
pub fn stroke_to_outline_with(samples: &[Sample], options: &OutlineOptions) -> Vec<Point> {
    if samples.len() < 2 || options.size <= 0.0 || !options.size.is_finite() {
        return Vec::new();
    }

    let centre = dedup_samples(samples);
    match centre.as_slice() {
        [] => return Vec::new(),
        [s] => return dot(s.point(), options.radius(s.pressure), options.cap_segments),
        _ => {}
    }

    let n = centre.len();
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);

    for i in 0..n {
        let prev = centre[i.saturating_sub(1)].point();
        let next = centre[(i + 1).min(n - 1)].point();
        let normal = unit_normal(next - prev);
        let p = centre[i].point();
        let r = options.radius(centre[i].pressure);
        left.push(p + normal * r);
        right.push(p - normal * r);
    }

    let segments = options.cap_segments.max(1);
    let mut polygon = Vec::with_capacity(2 * n + 2 * segments);

    polygon.extend_from_slice(&left);

    let last = centre[n - 1];
    let end_dir = unit_normal(last.point() - centre[n - 2].point());
    polygon.extend(cap(last.point(), end_dir, options.radius(last.pressure), segments));

    polygon.extend(right.iter().rev());

    let first = centre[0];
    let start_dir = unit_normal(centre[1].point() - first.point());
    polygon.extend(cap(first.point(), -start_dir, options.radius(first.pressure), segments));

    polygon
}

/// Build a closed path through the polygon using quadratic segments that
/// pass through the midpoints of consecutive vertices.
pub fn polygon_to_bez_path(polygon: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = polygon.first() else {
        return path;
    };

    path.move_to(first);
    for (i, &p) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        path.quad_to(p, p.midpoint(next));
    }
    path.close_path();
    path
}

/// Serialize the polygon as SVG path data (`M … Q … Z`).
pub fn polygon_to_path_syntax(polygon: &[Point]) -> String {
    if polygon.is_empty() {
        return String::new();
    }
    polygon_to_bez_path(polygon).to_svg()
}

fn dedup_samples(samples: &[Sample]) -> Vec<Sample> {
    let mut out: Vec<Sample> = Vec::with_capacity(samples.len());
    for s in samples {
        if !s.x.is_finite() || !s.y.is_finite() {
            continue;
        }
        match out.last() {
            Some(prev) if prev.point().distance(s.point()) < MIN_SEGMENT_LENGTH => {}
            _ => out.push(*s),
        }
    }
    out
}

/// Left-hand unit normal of a direction; zero for a degenerate direction.
fn unit_normal(direction: Vec2) -> Vec2 {
    let len = direction.hypot();
    if len < MIN_SEGMENT_LENGTH {
        return Vec2::ZERO;
    }
    Vec2::new(-direction.y / len, direction.x / len)
}

/// Half circle around `center` from `center + normal * r` to `center - normal * r`,
/// bulging forward (to the right of the normal). Endpoints excluded.
fn cap(center: Point, normal: Vec2, radius: f64, segments: usize) -> impl Iterator<Item = Point> {
    let start_angle = normal.y.atan2(normal.x);
    (1..segments).map(move |k| {
        let theta = start_angle - PI * k as f64 / segments as f64;
        center + Vec2::new(theta.cos(), theta.sin()) * radius
    })
}

fn dot(center: Point, radius: f64, segments: usize) -> Vec<Point> {
    let count = (segments.max(2)) * 2;
    (0..count)
        .map(|k| {
            let theta = 2.0 * PI * k as f64 / count as f64;
            center + Vec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    fn samples(points: &[(f64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(x, y)| Sample::new(x, y, 1.0)).collect()
    }

    #[test]
    fn test_degenerate_input_is_empty() {
        assert!(stroke_to_outline(&[], 5.0).is_empty());
        assert!(stroke_to_outline(&samples(&[(3.0, 4.0)]), 5.0).is_empty());
        assert_eq!(polygon_to_path_syntax(&[]), "");
    }

    #[test]
    fn test_non_finite_samples_are_dropped() {
        let all_bad = [Sample::new(f64::INFINITY, 0.0, 1.0), Sample::new(f64::INFINITY, 1.0, 1.0)];
        assert!(stroke_to_outline(&all_bad, 5.0).is_empty());

        let one_good = [Sample::new(f64::NAN, 0.0, 1.0), Sample::new(4.0, 4.0, 1.0)];
        let dot = stroke_to_outline(&one_good, 5.0);
        assert!(!dot.is_empty());
        assert!(dot.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_straight_stroke_outline_extent() {
        let outline = stroke_to_outline(&samples(&[(10.0, 10.0), (50.0, 10.0)]), 5.0);
        assert!(!outline.is_empty());

        let min_y = outline.iter().map(|p| p.y).fold(f64::MAX, f64::min);
        let max_y = outline.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        let min_x = outline.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        let max_x = outline.iter().map(|p| p.x).fold(f64::MIN, f64::max);

        assert!((min_y - 7.5).abs() < 1e-9);
        assert!((max_y - 12.5).abs() < 1e-9);
        // Round caps extend past the endpoints, but never beyond the radius.
        assert!(min_x < 10.0 && min_x >= 7.5 - 1e-9);
        assert!(max_x > 50.0 && max_x <= 52.5 + 1e-9);
    }

    #[test]
    fn test_coincident_samples_make_a_dot() {
        let outline = stroke_to_outline(&samples(&[(20.0, 20.0), (20.0, 20.0), (20.0, 20.0)]), 6.0);
        assert!(!outline.is_empty());
        for p in &outline {
            assert!((p.distance(Point::new(20.0, 20.0)) - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_thinning_follows_pressure() {
        let light = [Sample::new(0.0, 0.0, 0.2), Sample::new(40.0, 0.0, 0.2)];
        let options = OutlineOptions::new(10.0).with_thinning(0.5);
        let outline = stroke_to_outline_with(&light, &options);
        let max_y = outline.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        // 10 * (0.5 - 0.5 * 0.3) = 3.5
        assert!((max_y - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_path_syntax_shape() {
        let outline = stroke_to_outline(&samples(&[(0.0, 0.0), (30.0, 0.0), (30.0, 30.0)]), 4.0);
        let d = polygon_to_path_syntax(&outline);
        assert!(d.starts_with('M'));
        assert!(d.contains('Q'));
        assert!(d.ends_with('Z'));
    }

    #[test]
    fn test_path_syntax_round_trips_to_fill_region() {
        let strokes = [
            samples(&[(10.0, 10.0), (50.0, 10.0)]),
            samples(&[(0.0, 0.0), (5.0, 8.0), (12.0, 3.0), (20.0, 20.0)]),
            samples(&[(7.0, 7.0), (7.0, 7.0)]),
        ];
        for stroke in &strokes {
            let outline = stroke_to_outline(stroke, 5.0);
            let d = polygon_to_path_syntax(&outline);
            let parsed = BezPath::from_svg(&d).unwrap();

            assert_eq!(parsed.elements(), polygon_to_bez_path(&outline).elements());
            assert!(parsed.area().abs() > 1.0);
        }
    }

    #[test]
    fn test_outline_covers_centreline() {
        let stroke = samples(&[(10.0, 10.0), (60.0, 40.0)]);
        let path = polygon_to_bez_path(&stroke_to_outline(&stroke, 8.0));
        assert!(path.contains(Point::new(35.0, 25.0)));
        assert!(!path.contains(Point::new(35.0, 60.0)));
    }
}
