//! The geodesic unit sphere.
//!
//! Starting from an icosahedron, each subdivision splits every triangle
//! into four by inserting the normalized midpoint of each edge. Vertex
//! indices are stable across levels: the vertices of level `n` are exactly
//! the first [`vertex_count`][Geodesic::vertex_count]`(n)` vertices of
//! every later level, which lets a normal quantized at a coarse level be
//! refined without remapping.
//!
//! Level | Vertices | Faces | Edges
//! ----- | -------- | ----- | -----
//! 0     | 12       | 20    | 30
//! 1     | 42       | 80    | 120
//! 2     | 162      | 320   | 480
//! 3     | 642      | 1280  | 1920

use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};
use core::f32::consts::PI;
use core::fmt::{self, Display, Formatter};

use log::debug;
use once_cell::race::OnceBox;

use crate::math::{
    float::f32 as fp,
    vec::{Vec3, vec3},
};

/// The finest subdivision level built by [`Geodesic::get`].
pub const MAX_LEVEL: usize = 3;

/// Marks an unused slot in a neighbor list.
pub const NO_NEIGHBOR: i16 = -1;

const ICOSAHEDRON_FACES: [[u16; 3]; 20] = [
    [0, 1, 2],
    [0, 2, 3],
    [0, 3, 4],
    [0, 4, 5],
    [0, 5, 1],
    [1, 6, 2],
    [2, 7, 3],
    [3, 8, 4],
    [4, 9, 5],
    [5, 10, 1],
    [6, 1, 10],
    [7, 2, 6],
    [8, 3, 7],
    [9, 4, 8],
    [10, 5, 9],
    [11, 6, 10],
    [11, 7, 6],
    [11, 8, 7],
    [11, 9, 8],
    [11, 10, 9],
];

const ICOSAHEDRON_NEIGHBORS: [[i16; 6]; 12] = [
    [1, 2, 3, 4, 5, -1],
    [0, 5, 10, 6, 2, -1],
    [0, 1, 6, 7, 3, -1],
    [0, 2, 7, 8, 4, -1],
    [0, 3, 8, 9, 5, -1],
    [0, 4, 9, 10, 1, -1],
    [1, 10, 11, 7, 2, -1],
    [2, 6, 11, 8, 3, -1],
    [3, 7, 11, 9, 4, -1],
    [4, 8, 11, 10, 5, -1],
    [5, 9, 11, 6, 1, -1],
    [6, 7, 8, 9, 10, -1],
];

/// A failed self-check while building the sphere.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GeodesicError {
    /// A vertex would get more than six neighbors.
    NeighborOverflow { level: usize, vertex: usize },
    /// A level has the wrong number of vertices or faces.
    Count {
        level: usize,
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Vertices + faces - edges is not 2.
    Euler {
        level: usize,
        vertices: usize,
        faces: usize,
        edges: usize,
    },
    /// A vertex has the wrong number of neighbors or incident faces.
    Degree {
        level: usize,
        vertex: usize,
        what: &'static str,
        actual: usize,
    },
}

#[cfg(feature = "std")]
impl std::error::Error for GeodesicError {}

impl Display for GeodesicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use GeodesicError::*;
        match self {
            NeighborOverflow { level, vertex } => {
                write!(f, "level {level}: vertex {vertex} has too many neighbors")
            }
            Count { level, what, expected, actual } => write!(
                f,
                "level {level}: expected {expected} {what}, found {actual}"
            ),
            Euler { level, vertices, faces, edges } => write!(
                f,
                "level {level}: V + F - E = {vertices} + {faces} - {edges} != 2"
            ),
            Degree { level, vertex, what, actual } => write!(
                f,
                "level {level}: vertex {vertex} has {actual} {what}"
            ),
        }
    }
}

/// The topology of one subdivision level.
#[derive(Clone, Debug)]
pub struct Level {
    vertex_count: usize,
    faces: Vec<[u16; 3]>,
    neighbors: Vec<[i16; 6]>,
}

impl Level {
    /// Returns the number of vertices at this level.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Returns the faces as triples of vertex indices.
    pub fn faces(&self) -> &[[u16; 3]] {
        &self.faces
    }

    /// Returns the neighbors of `vertex` at this level.
    pub fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors[vertex]
            .iter()
            .filter(|&&n| n != NO_NEIGHBOR)
            .map(|&n| n as usize)
    }

    /// Returns the number of edges, counted from the neighbor lists.
    pub fn edge_count(&self) -> usize {
        let ends: usize = self
            .neighbors
            .iter()
            .map(|ns| ns.iter().filter(|&&n| n != NO_NEIGHBOR).count())
            .sum();
        ends / 2
    }
}

/// A geodesic sphere subdivided up to some level.
#[derive(Clone, Debug)]
pub struct Geodesic {
    vertices: Vec<Vec3>,
    levels: Vec<Level>,
}

impl Geodesic {
    /// Returns the shared sphere subdivided to [`MAX_LEVEL`].
    ///
    /// The sphere is built and validated on first use.
    ///
    /// # Panics
    /// If validation fails. This indicates a defect in the builder, not
    /// a recoverable condition.
    pub fn get() -> &'static Geodesic {
        static SPHERE: OnceBox<Geodesic> = OnceBox::new();
        SPHERE.get_or_init(|| match Self::build(MAX_LEVEL) {
            Ok(g) => Box::new(g),
            Err(e) => panic!("geodesic sphere construction failed: {e}"),
        })
    }

    /// Builds and validates a sphere subdivided to `max_level`.
    pub fn build(max_level: usize) -> Result<Self, GeodesicError> {
        let mut g = Self {
            vertices: icosahedron_vertices(),
            levels: alloc::vec![Level {
                vertex_count: 12,
                faces: ICOSAHEDRON_FACES.to_vec(),
                neighbors: ICOSAHEDRON_NEIGHBORS.to_vec(),
            }],
        };
        g.validate(0)?;
        for level in 1..=max_level {
            g.quadruple()?;
            g.validate(level)?;
        }
        Ok(g)
    }

    /// Returns the finest level available.
    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Returns the unit vectors of all vertices.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Returns the unit vector of `vertex`.
    pub fn vertex(&self, vertex: usize) -> Vec3 {
        self.vertices[vertex]
    }

    /// Returns the topology of `level`.
    ///
    /// # Panics
    /// If `level > self.max_level()`.
    pub fn level(&self, level: usize) -> &Level {
        &self.levels[level]
    }

    /// Returns the number of vertices at `level`.
    pub fn vertex_count(&self, level: usize) -> usize {
        self.levels[level].vertex_count
    }

    /// Subdivides the finest level into a new level.
    fn quadruple(&mut self) -> Result<(), GeodesicError> {
        let old = &self.levels[self.levels.len() - 1];
        let level = self.levels.len();
        let old_faces = old.faces.clone();
        let new_count = old.vertex_count + old.edge_count();

        let mut faces = Vec::with_capacity(4 * old_faces.len());
        let mut neighbors = alloc::vec![[NO_NEIGHBOR; 6]; new_count];
        let mut midpoints = BTreeMap::new();

        for [a, b, c] in old_faces {
            let ab = self.midpoint(&mut midpoints, a, b);
            let bc = self.midpoint(&mut midpoints, b, c);
            let ca = self.midpoint(&mut midpoints, c, a);

            faces.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ca, ab, bc]]);

            for (u, v) in [
                (ab, a),
                (ab, ca),
                (ab, bc),
                (ab, b),
                (bc, b),
                (bc, ca),
                (bc, c),
                (ca, c),
                (ca, a),
            ] {
                link(&mut neighbors, u, v)
                    .ok_or(GeodesicError::NeighborOverflow { level, vertex: u as usize })?;
            }
        }
        if self.vertices.len() != new_count {
            return Err(GeodesicError::Count {
                level,
                what: "vertices",
                expected: new_count,
                actual: self.vertices.len(),
            });
        }
        self.levels.push(Level { vertex_count: new_count, faces, neighbors });
        Ok(())
    }

    /// Returns the index of the midpoint of edge `ab`, creating it if it
    /// does not exist yet.
    fn midpoint(&mut self, cache: &mut BTreeMap<u32, u16>, a: u16, b: u16) -> u16 {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let key = (lo as u32) << 16 | hi as u32;
        *cache.entry(key).or_insert_with(|| {
            let v = (self.vertices[lo as usize] + self.vertices[hi as usize]) * 0.5;
            self.vertices.push(v.normalize());
            (self.vertices.len() - 1) as u16
        })
    }

    fn validate(&self, level: usize) -> Result<(), GeodesicError> {
        let lvl = &self.levels[level];
        let pow = 1 << (2 * level);
        let (v, f, e) = (lvl.vertex_count, lvl.faces.len(), lvl.edge_count());

        for (what, expected, actual) in
            [("vertices", 10 * pow + 2, v), ("faces", 20 * pow, f)]
        {
            if actual != expected {
                return Err(GeodesicError::Count { level, what, expected, actual });
            }
        }
        if v + f != e + 2 {
            return Err(GeodesicError::Euler { level, vertices: v, faces: f, edges: e });
        }

        let mut face_degree = alloc::vec![0usize; v];
        for face in &lvl.faces {
            for &i in face {
                face_degree[i as usize] += 1;
            }
        }
        for (vertex, &faces) in face_degree.iter().enumerate() {
            let expected = if vertex < 12 { 5 } else { 6 };
            let neighbors = lvl.neighbors(vertex).count();
            if neighbors != expected {
                let what = "neighbors";
                return Err(GeodesicError::Degree { level, vertex, what, actual: neighbors });
            }
            if faces != expected {
                let what = "faces";
                return Err(GeodesicError::Degree { level, vertex, what, actual: faces });
            }
        }
        debug!("geodesic level {level}: {v} vertices, {f} faces, {e} edges");
        Ok(())
    }
}

/// Adds `u` and `v` to each other's neighbor lists, unless already there.
///
/// Returns `None` if a list is full.
fn link(neighbors: &mut [[i16; 6]], u: u16, v: u16) -> Option<()> {
    add_neighbor(&mut neighbors[u as usize], v)?;
    add_neighbor(&mut neighbors[v as usize], u)
}

fn add_neighbor(list: &mut [i16; 6], n: u16) -> Option<()> {
    let n = n as i16;
    if list.contains(&n) {
        return Some(());
    }
    let slot = list.iter_mut().find(|s| **s == NO_NEIGHBOR)?;
    *slot = n;
    Some(())
}

fn icosahedron_vertices() -> Vec<Vec3> {
    let fifth = 2.0 * PI / 5.0;
    let tenth = fifth / 2.0;
    let mut vs = Vec::with_capacity(642);
    vs.push(vec3(0.0, 0.0, 1.0));
    let ring = |offset: f32, z: f32| {
        (0..5).map(move |i| {
            let a = i as f32 * fifth + offset;
            vec3(fp::cos(a), fp::sin(a), z).normalize()
        })
    };
    vs.extend(ring(0.0, 0.5));
    vs.extend(ring(tenth, -0.5));
    vs.push(vec3(0.0, 0.0, -1.0));
    vs
}

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;

    use super::*;

    #[test]
    fn counts_per_level() {
        let g = Geodesic::get();
        assert_eq!(g.max_level(), MAX_LEVEL);
        for (level, (v, f, e)) in
            [(12, 20, 30), (42, 80, 120), (162, 320, 480), (642, 1280, 1920)]
                .into_iter()
                .enumerate()
        {
            let l = g.level(level);
            assert_eq!(l.vertex_count(), v);
            assert_eq!(l.faces().len(), f);
            assert_eq!(l.edge_count(), e);
            assert_eq!(v + f - e, 2);
        }
        assert_eq!(g.vertices().len(), 642);
    }

    #[test]
    fn vertex_degrees() {
        let g = Geodesic::get();
        for level in 0..=MAX_LEVEL {
            let l = g.level(level);
            for v in 0..l.vertex_count() {
                let expected = if v < 12 { 5 } else { 6 };
                assert_eq!(l.neighbors(v).count(), expected, "level {level} v {v}");
            }
        }
    }

    #[test]
    fn vertices_are_unit_length() {
        for v in Geodesic::get().vertices() {
            assert_approx_eq!(v.len(), 1.0);
        }
    }

    #[test]
    fn poles() {
        let g = Geodesic::get();
        assert_approx_eq!(g.vertex(0), vec3(0.0, 0.0, 1.0));
        assert_approx_eq!(g.vertex(11), vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn neighbors_are_symmetric_and_adjacent() {
        let g = Geodesic::get();
        for level in 0..=MAX_LEVEL {
            let l = g.level(level);
            // Edge length shrinks roughly by half per level
            let max_len = 1.4 / (1 << level) as f32;
            for v in 0..l.vertex_count() {
                for n in l.neighbors(v) {
                    assert!(l.neighbors(n).any(|m| m == v));
                    let d = (g.vertex(v) - g.vertex(n)).len();
                    assert!(d < max_len, "level {level}: |{v} - {n}| = {d}");
                }
            }
        }
    }

    #[test]
    fn faces_are_wound_consistently() {
        // Every face normal points outward from the center
        let g = Geodesic::get();
        for level in 0..=MAX_LEVEL {
            for &[a, b, c] in g.level(level).faces() {
                let (a, b, c) =
                    (g.vertex(a as usize), g.vertex(b as usize), g.vertex(c as usize));
                let n = (b - a).cross(&(c - a));
                assert!(n.dot(&(a + b + c)) > 0.0);
            }
        }
    }

    #[test]
    fn add_neighbor_overflow() {
        let mut list = [1, 2, 3, 4, 5, 6];
        assert_eq!(add_neighbor(&mut list, 3), Some(()));
        assert_eq!(add_neighbor(&mut list, 7), None);
    }
}
