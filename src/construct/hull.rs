//! Exact convex hull of a voxel mask.
//!
//! Works on integer voxel indices. Convexity is preserved by the diagonal
//! index-to-physical map, so the voxels inside the hull do not depend on the
//! spacing. The hull is kept as a set of half-spaces `n . p <= d` with
//! integer coefficients; flat and thin masks get the matching lower
//! dimensional hull expressed the same way.

use std::collections::{HashMap, VecDeque};

use ndarray::Array3;

use crate::volume::mask::{BoundingBox, bounding_box};

type Point = [i64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfSpace {
    pub n: [i64; 3],
    pub d: i64,
}

impl HalfSpace {
    fn through(n: [i64; 3], p: Point) -> Self {
        Self { n, d: dot(n, p) }
    }

    pub fn contains(&self, p: Point) -> bool {
        dot(self.n, p) <= self.d
    }

    fn flipped(&self) -> Self {
        Self {
            n: [-self.n[0], -self.n[1], -self.n[2]],
            d: -self.d,
        }
    }
}

/// Voxels whose centres lie in the convex hull of the foreground.
pub fn convex_hull_mask(mask: &Array3<bool>) -> Array3<bool> {
    let mut out = Array3::from_elem(mask.raw_dim(), false);
    let Some(bbox) = bounding_box(&[mask]) else {
        return out;
    };
    let points = row_extremes(mask, &bbox);
    let planes = hull_half_spaces(&points);
    fill_rows(&mut out, &bbox, &planes);
    out
}

/// Half-spaces whose intersection is the convex hull of `points`.
/// `points` must not be empty.
pub fn hull_half_spaces(points: &[Point]) -> Vec<HalfSpace> {
    let p0 = points[0];
    let Some(p1) = points.iter().copied().find(|&p| p != p0) else {
        return point_planes(p0);
    };
    let u = sub(p1, p0);
    let Some(p2) = points
        .iter()
        .copied()
        .find(|&p| cross(u, sub(p, p0)) != [0, 0, 0])
    else {
        return segment_planes(points, p0, u);
    };
    let normal = cross(u, sub(p2, p0));
    let Some(p3) = points
        .iter()
        .copied()
        .find(|&p| dot(normal, sub(p, p0)) != 0)
    else {
        return polygon_planes(points, p0, normal);
    };
    Hull3::new([p0, p1, p2, p3]).build(points)
}

/// Keeps the first and last foreground voxel of every x row; the hull of
/// these equals the hull of the whole mask.
fn row_extremes(mask: &Array3<bool>, bbox: &BoundingBox) -> Vec<Point> {
    let mut points = Vec::new();
    for z in bbox.lo[0]..bbox.hi[0] {
        for y in bbox.lo[1]..bbox.hi[1] {
            let mut first = None;
            let mut last = None;
            for x in bbox.lo[2]..bbox.hi[2] {
                if mask[[z, y, x]] {
                    first.get_or_insert(x);
                    last = Some(x);
                }
            }
            if let (Some(a), Some(b)) = (first, last) {
                points.push([z as i64, y as i64, a as i64]);
                if b != a {
                    points.push([z as i64, y as i64, b as i64]);
                }
            }
        }
    }
    points
}

/// Intersects every x row of the bounding box with the half-spaces.
fn fill_rows(out: &mut Array3<bool>, bbox: &BoundingBox, planes: &[HalfSpace]) {
    let x_lo = bbox.lo[2] as i64;
    let x_hi = bbox.hi[2] as i64 - 1;
    for z in bbox.lo[0]..bbox.hi[0] {
        for y in bbox.lo[1]..bbox.hi[1] {
            let mut lo = x_lo;
            let mut hi = x_hi;
            for plane in planes {
                let rhs = plane.d - plane.n[0] * z as i64 - plane.n[1] * y as i64;
                let nx = plane.n[2];
                if nx > 0 {
                    hi = hi.min(rhs.div_euclid(nx));
                } else if nx < 0 {
                    lo = lo.max(-rhs.div_euclid(-nx));
                } else if rhs < 0 {
                    hi = lo - 1;
                }
                if lo > hi {
                    break;
                }
            }
            for x in lo..=hi {
                out[[z, y, x as usize]] = true;
            }
        }
    }
}

fn point_planes(p: Point) -> Vec<HalfSpace> {
    let mut planes = Vec::with_capacity(6);
    for axis in 0..3 {
        let mut n = [0; 3];
        n[axis] = 1;
        let plane = HalfSpace::through(n, p);
        planes.push(plane);
        planes.push(plane.flipped());
    }
    planes
}

fn segment_planes(points: &[Point], p0: Point, u: [i64; 3]) -> Vec<HalfSpace> {
    let (min_t, max_t) = points.iter().fold((i64::MAX, i64::MIN), |(lo, hi), &p| {
        let t = dot(u, p);
        (lo.min(t), hi.max(t))
    });
    let axis = (0..3).min_by_key(|&k| u[k].abs()).unwrap_or(0);
    let mut e = [0; 3];
    e[axis] = 1;
    let n1 = cross(u, e);
    let n2 = cross(u, n1);

    let mut planes = Vec::with_capacity(6);
    for n in [n1, n2] {
        let plane = HalfSpace::through(n, p0);
        planes.push(plane);
        planes.push(plane.flipped());
    }
    planes.push(HalfSpace { n: u, d: max_t });
    planes.push(HalfSpace {
        n: [-u[0], -u[1], -u[2]],
        d: -min_t,
    });
    planes
}

fn polygon_planes(points: &[Point], p0: Point, normal: [i64; 3]) -> Vec<HalfSpace> {
    // Dropping the dominant normal axis maps the plane onto 2-D one to one.
    let drop = (0..3).max_by_key(|&k| normal[k].abs()).unwrap_or(0);
    let keep: Vec<usize> = (0..3).filter(|&k| k != drop).collect();
    let project = |p: &Point| [p[keep[0]], p[keep[1]]];

    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by_key(|p| project(p));
    sorted.dedup();
    let ring = monotone_chain(&sorted, project);

    let plane = HalfSpace::through(normal, p0);
    let mut planes = vec![plane, plane.flipped()];
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let c = ring[(i + 2) % ring.len()];
        let mut edge = HalfSpace::through(cross(sub(b, a), normal), a);
        if !edge.contains(c) {
            edge = edge.flipped();
        }
        planes.push(edge);
    }
    planes
}

/// Strict hull (collinear points dropped) of points sorted by projection.
fn monotone_chain<F>(sorted: &[Point], project: F) -> Vec<Point>
where
    F: Fn(&Point) -> [i64; 2],
{
    let turn = |o: &Point, a: &Point, b: &Point| {
        let (o, a, b) = (project(o), project(a), project(b));
        (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
    };
    let mut lower: Vec<Point> = Vec::new();
    for p in sorted {
        while lower.len() >= 2 && turn(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point> = Vec::new();
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && turn(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[derive(Debug, Clone)]
struct Face {
    v: [usize; 3],
    plane: HalfSpace,
}

/// Incremental 3-D hull. Faces are outward oriented triangles; a directed
/// edge map links each face to its neighbours.
struct Hull3 {
    verts: Vec<Point>,
    faces: Vec<Option<Face>>,
    live: Vec<usize>,
    edges: HashMap<(usize, usize), usize>,
}

impl Hull3 {
    fn new(tetra: [Point; 4]) -> Self {
        let mut hull = Self {
            verts: tetra.to_vec(),
            faces: Vec::new(),
            live: Vec::new(),
            edges: HashMap::new(),
        };
        let centroid4 = [
            tetra.iter().map(|p| p[0]).sum::<i64>(),
            tetra.iter().map(|p| p[1]).sum::<i64>(),
            tetra.iter().map(|p| p[2]).sum::<i64>(),
        ];
        for [a, b, c] in [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]] {
            let plane = face_plane(&hull.verts, [a, b, c]);
            // The scaled centroid must fall strictly on the inner side.
            if dot(plane.n, centroid4) < 4 * plane.d {
                hull.add_face([a, b, c]);
            } else {
                hull.add_face([a, c, b]);
            }
        }
        hull
    }

    fn add_face(&mut self, v: [usize; 3]) {
        let id = self.faces.len();
        for k in 0..3 {
            self.edges.insert((v[k], v[(k + 1) % 3]), id);
        }
        let plane = face_plane(&self.verts, v);
        self.faces.push(Some(Face { v, plane }));
        self.live.push(id);
    }

    fn build(mut self, points: &[Point]) -> Vec<HalfSpace> {
        for &p in points {
            self.insert(p);
        }
        self.faces
            .into_iter()
            .flatten()
            .map(|face| face.plane)
            .collect()
    }

    fn insert(&mut self, p: Point) {
        let seeds: Vec<usize> = self
            .live
            .iter()
            .copied()
            .filter(|&id| {
                self.faces[id]
                    .as_ref()
                    .is_some_and(|f| !f.plane.contains(p))
            })
            .collect();
        if seeds.is_empty() {
            return;
        }

        // Strictly visible faces plus the coplanar faces connected to them.
        let mut visible = vec![false; self.faces.len()];
        let mut queue: VecDeque<usize> = VecDeque::new();
        for &id in &seeds {
            visible[id] = true;
            queue.push_back(id);
        }
        while let Some(id) = queue.pop_front() {
            let Some(face) = self.faces[id].clone() else {
                continue;
            };
            for k in 0..3 {
                let (a, b) = (face.v[k], face.v[(k + 1) % 3]);
                let Some(&nb) = self.edges.get(&(b, a)) else {
                    continue;
                };
                if visible[nb] {
                    continue;
                }
                if let Some(nf) = &self.faces[nb] {
                    if dot(nf.plane.n, p) >= nf.plane.d {
                        visible[nb] = true;
                        queue.push_back(nb);
                    }
                }
            }
        }

        let mut horizon = Vec::new();
        for (id, &seen) in visible.iter().enumerate() {
            if !seen {
                continue;
            }
            let Some(face) = self.faces[id].take() else {
                continue;
            };
            for k in 0..3 {
                let (a, b) = (face.v[k], face.v[(k + 1) % 3]);
                let across = self.edges.get(&(b, a)).copied();
                if across.is_some_and(|nb| !visible[nb]) {
                    horizon.push((a, b));
                }
            }
            for k in 0..3 {
                let key = (face.v[k], face.v[(k + 1) % 3]);
                if self.edges.get(&key) == Some(&id) {
                    self.edges.remove(&key);
                }
            }
        }

        self.live.retain(|&id| !visible[id]);
        let apex = self.verts.len();
        self.verts.push(p);
        for (a, b) in horizon {
            self.add_face([a, b, apex]);
        }
    }
}

fn face_plane(verts: &[Point], v: [usize; 3]) -> HalfSpace {
    let (a, b, c) = (verts[v[0]], verts[v[1]], verts[v[2]]);
    HalfSpace::through(cross(sub(b, a), sub(c, a)), a)
}

fn sub(a: Point, b: Point) -> [i64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [i64; 3], b: [i64; 3]) -> i64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
