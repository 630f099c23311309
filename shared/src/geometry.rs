//! 2D point-set transforms and the even-odd point-in-polygon test

use crate::error::GeometryError;

/// Closed outline stored as flattened `x, y` pairs in local coordinates
///
/// The points are relative to the owning entity's position; callers translate
/// by that position when drawing or hit-testing. Always holds at least three
/// points and an even number of coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<f32>,
}

impl Polygon {
    /// Validates and wraps a flattened point list
    pub fn new(points: Vec<f32>) -> Result<Self, GeometryError> {
        if points.len() % 2 != 0 {
            return Err(GeometryError::OddCoordinateCount(points.len()));
        }
        if points.len() < 6 {
            return Err(GeometryError::TooFewPoints(points.len() / 2));
        }
        Ok(Self { points })
    }

    /// Copies one of the built-in outline tables
    pub(crate) fn from_template(template: &[f32]) -> Self {
        debug_assert!(template.len() % 2 == 0 && template.len() >= 6);
        Self {
            points: template.to_vec(),
        }
    }

    pub fn points(&self) -> &[f32] {
        &self.points
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len() / 2
    }

    /// Iterates the vertices as `(x, y)` pairs
    pub fn vertices(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.points.chunks_exact(2).map(|p| (p[0], p[1]))
    }

    /// Rotates every point by `theta` radians about the local origin
    pub fn rotate(&mut self, theta: f32) {
        let (sine, cosine) = theta.sin_cos();

        for point in self.points.chunks_exact_mut(2) {
            let (x, y) = (point[0], point[1]);
            point[0] = cosine * x - sine * y;
            point[1] = sine * x + cosine * y;
        }
    }

    /// Multiplies every coordinate by `factor`
    pub fn scale(&mut self, factor: f32) {
        for coordinate in &mut self.points {
            *coordinate *= factor;
        }
    }

    /// Even-odd test of `(x, y)` against this polygon placed at the offset
    pub fn contains(&self, offset_x: f32, offset_y: f32, x: f32, y: f32) -> bool {
        point_in_polygon(self, offset_x, offset_y, x, y)
    }
}

/// Ray-casting point-in-polygon test
///
/// Casts a horizontal ray from `(x, y)` and toggles on every edge it crosses,
/// including the closing edge from the last point back to the first. The
/// polygon is translated by `(offset_x, offset_y)` on the fly and never
/// modified. Horizontal edges cannot be crossed by a horizontal ray and are
/// skipped before the intersection division.
pub fn point_in_polygon(polygon: &Polygon, offset_x: f32, offset_y: f32, x: f32, y: f32) -> bool {
    let p = polygon.points();
    let length = p.len();
    let mut inside = false;

    let mut j = length - 2;
    for i in (0..length).step_by(2) {
        let px1 = p[i] + offset_x;
        let py1 = p[i + 1] + offset_y;
        let px2 = p[j] + offset_x;
        let py2 = p[j + 1] + offset_y;
        j = i;

        if py1 == py2 {
            continue;
        }

        if (py1 > y) != (py2 > y) && x < (px2 - px1) * (y - py1) / (py2 - py1) + px1 {
            inside = !inside;
        }
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::PI;

    fn square() -> Polygon {
        Polygon::new(vec![-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0]).unwrap()
    }

    #[test]
    fn test_rejects_odd_coordinate_count() {
        let result = Polygon::new(vec![0.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(result, Err(GeometryError::OddCoordinateCount(5)));
    }

    #[test]
    fn test_rejects_segment() {
        let result = Polygon::new(vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(result, Err(GeometryError::TooFewPoints(2)));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut polygon = Polygon::new(vec![1.0, 0.0, 0.0, 1.0, -1.0, 0.0]).unwrap();
        polygon.rotate(PI / 2.0);

        let p = polygon.points();
        assert_approx_eq!(p[0], 0.0, 1e-6);
        assert_approx_eq!(p[1], 1.0, 1e-6);
        assert_approx_eq!(p[2], -1.0, 1e-6);
        assert_approx_eq!(p[3], 0.0, 1e-6);
    }

    #[test]
    fn test_rotate_inverse_restores_points() {
        let original = Polygon::new(vec![
            -4.0, -2.0, -2.0, -4.0, 0.0, -2.0, 2.0, -4.0, 4.0, -2.0, 3.0, 0.0, 4.0, 2.0,
        ])
        .unwrap();

        for theta in [0.01, 0.5, 1.0, PI, 4.2, -2.7] {
            let mut polygon = original.clone();
            polygon.rotate(theta);
            polygon.rotate(-theta);

            for (a, b) in polygon.points().iter().zip(original.points()) {
                assert_approx_eq!(*a, *b, 1e-4);
            }
        }
    }

    #[test]
    fn test_scale_multiplies_each_coordinate() {
        let mut polygon = square();
        polygon.scale(2.5);

        for (scaled, original) in polygon.points().iter().zip(square().points()) {
            assert_eq!(*scaled, original * 2.5);
        }
    }

    #[test]
    fn test_scale_by_one_is_identity() {
        let mut polygon = square();
        polygon.scale(1.0);
        assert_eq!(polygon, square());
    }

    #[test]
    fn test_point_inside_and_outside() {
        let polygon = square();
        assert!(point_in_polygon(&polygon, 0.0, 0.0, 0.0, 0.0));
        assert!(point_in_polygon(&polygon, 0.0, 0.0, 0.5, -0.5));
        assert!(!point_in_polygon(&polygon, 0.0, 0.0, 2.0, 0.0));
        assert!(!point_in_polygon(&polygon, 0.0, 0.0, 0.0, -3.0));
    }

    #[test]
    fn test_point_in_polygon_translation_invariant() {
        let polygon = square();
        let samples = [(0.0, 0.0), (0.9, 0.3), (1.5, 0.0), (-0.2, -1.4)];

        for (x, y) in samples {
            let local = point_in_polygon(&polygon, 0.0, 0.0, x, y);
            let moved = point_in_polygon(&polygon, 300.0, -120.0, x + 300.0, y - 120.0);
            assert_eq!(local, moved, "mismatch at ({}, {})", x, y);
        }
    }

    #[test]
    fn test_offset_does_not_mutate_polygon() {
        let polygon = square();
        let before = polygon.clone();
        let _ = polygon.contains(50.0, 50.0, 50.0, 50.0);
        assert_eq!(polygon, before);
    }

    #[test]
    fn test_horizontal_edges_are_skipped() {
        // Ray at y = 0 runs exactly along the bottom edge
        let triangle = Polygon::new(vec![0.0, 0.0, 4.0, 0.0, 2.0, 4.0]).unwrap();
        assert!(!point_in_polygon(&triangle, 0.0, 0.0, -1.0, 0.0));
        assert!(point_in_polygon(&triangle, 0.0, 0.0, 2.0, 1.0));

        let flat = Polygon::new(vec![0.0, 1.0, 5.0, 1.0, 9.0, 1.0]).unwrap();
        assert!(!point_in_polygon(&flat, 0.0, 0.0, 3.0, 1.0));
    }

    #[test]
    fn test_vertices_pairs() {
        let vertices: Vec<(f32, f32)> = square().vertices().collect();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[2], (1.0, 1.0));
    }
}
