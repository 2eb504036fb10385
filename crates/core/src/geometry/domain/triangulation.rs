//! Delaunay triangulation of a landmark set (Bowyer-Watson).
//!
//! Used to derive a dense base mesh from one observed face. The result depends
//! on the geometry it was built from, so callers build it once and reuse it.

use std::collections::HashMap;

use super::mesh_topology::{MeshEdge, MeshTopology};
use crate::detection::domain::landmarks::LandmarkSet;

const COINCIDENT_EPS: f64 = 1e-9;
const DEGENERATE_EPS: f64 = 1e-12;

#[derive(Clone, Copy, Debug)]
struct Triangle {
    v: [usize; 3],
    center: (f64, f64),
    radius_sq: f64,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[(f64, f64)]) -> Self {
        let (ax, ay) = pts[v[0]];
        let (bx, by) = pts[v[1]];
        let (cx, cy) = pts[v[2]];
        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
        if d.abs() < DEGENERATE_EPS {
            // Collinear: treat as containing everything so the next
            // insertion retriangulates it away.
            return Self {
                v,
                center: (0.0, 0.0),
                radius_sq: f64::INFINITY,
            };
        }
        let a2 = ax * ax + ay * ay;
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
        let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
        Self {
            v,
            center: (ux, uy),
            radius_sq: (ax - ux).powi(2) + (ay - uy).powi(2),
        }
    }

    fn circumcircle_contains(&self, (px, py): (f64, f64)) -> bool {
        let dist_sq = (px - self.center.0).powi(2) + (py - self.center.1).powi(2);
        dist_sq < self.radius_sq * (1.0 - 1e-10)
    }

    fn is_degenerate(&self) -> bool {
        self.radius_sq.is_infinite()
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

/// Delaunay triangles over `points`, as index triples into `points`.
///
/// Non-finite and coincident points are skipped. Fewer than three usable
/// points, or all points collinear, yields no triangles.
pub fn delaunay_triangles(points: &[(f64, f64)]) -> Vec<[usize; 3]> {
    let mut usable: Vec<usize> = Vec::with_capacity(points.len());
    for (i, &(x, y)) in points.iter().enumerate() {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        let coincident = usable.iter().any(|&j| {
            let (ux, uy) = points[j];
            (ux - x).abs() < COINCIDENT_EPS && (uy - y).abs() < COINCIDENT_EPS
        });
        if !coincident {
            usable.push(i);
        }
    }
    if usable.len() < 3 {
        return Vec::new();
    }

    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for &i in &usable {
        let (x, y) = points[i];
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    // Working vertex list: input points followed by the three super vertices.
    let mut pts = points.to_vec();
    let s = pts.len();
    pts.push((mid_x - 100.0 * span, mid_y - 100.0 * span));
    pts.push((mid_x + 100.0 * span, mid_y - 100.0 * span));
    pts.push((mid_x, mid_y + 100.0 * span));

    let mut triangles = vec![Triangle::new([s, s + 1, s + 2], &pts)];

    for &i in &usable {
        let p = pts[i];
        let (bad, good): (Vec<Triangle>, Vec<Triangle>) = triangles
            .into_iter()
            .partition(|t| t.circumcircle_contains(p));
        triangles = good;

        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for t in &bad {
            for (a, b) in t.edges() {
                *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        for t in &bad {
            for (a, b) in t.edges() {
                if edge_count[&(a.min(b), a.max(b))] == 1 {
                    triangles.push(Triangle::new([a, b, i], &pts));
                }
            }
        }
    }

    triangles
        .into_iter()
        .filter(|t| !t.is_degenerate() && t.v.iter().all(|&v| v < s))
        .map(|t| t.v)
        .collect()
}

impl MeshTopology {
    /// Base mesh from the Delaunay triangulation of `landmarks` in normalized
    /// image space.
    pub fn triangulate(landmarks: &LandmarkSet) -> Self {
        let points: Vec<(f64, f64)> = landmarks
            .points()
            .iter()
            .map(|p| (p.x as f64, p.y as f64))
            .collect();
        let triangles = delaunay_triangles(&points);
        log::debug!(
            "Triangulated {} landmarks into {} triangles",
            points.len(),
            triangles.len()
        );
        MeshTopology::from_edges(
            triangles
                .iter()
                .flat_map(|&[a, b, c]| [MeshEdge(a, b), MeshEdge(b, c), MeshEdge(c, a)]),
        )
    }
}
