//! Quantized surface normals.
//!
//! A [`Normix`] names the geodesic sphere vertex closest to a normal.
//! Once per frame, [`NormixTable::set_rotation`] lights every vertex under
//! the current rotation, after which shading any quantized normal is a
//! table lookup.

use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

use crate::geom::geodesic::{Geodesic, MAX_LEVEL};
use crate::math::{mat::Mat3, vec::Vec3};

use super::light::{Lighting, NULL_NORMIX_SHADE};

/// A quantized unit normal: the index of a geodesic sphere vertex.
///
/// The bitwise complement of a vertex index marks a *two-sided* normal,
/// lit from whichever side faces the viewer.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Normix(i16);

impl Normix {
    /// The absent normal; shaded with a fixed mid-level intensity.
    pub const NULL: Self = Self(9999);

    /// Returns the normix of a geodesic vertex.
    ///
    /// # Panics
    /// If `vertex` is out of range of the finest geodesic level.
    pub fn from_vertex(vertex: usize) -> Self {
        assert!(vertex < Geodesic::get().vertex_count(MAX_LEVEL), "vertex {vertex}");
        Self(vertex as i16)
    }

    /// Returns the raw value of `self`.
    pub const fn to_raw(self) -> i16 {
        self.0
    }

    /// Returns the two-sided variant of `self`.
    pub const fn two_sided(self) -> Self {
        if self.0 < 0 { self } else { Self(!self.0) }
    }

    pub const fn is_two_sided(self) -> bool {
        self.0 < 0
    }

    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0 || self.0 == !Self::NULL.0
    }

    /// Returns the geodesic vertex of `self`, or `None` if null.
    pub const fn vertex(self) -> Option<usize> {
        if self.is_null() {
            None
        } else if self.0 < 0 {
            Some(!self.0 as usize)
        } else {
            Some(self.0 as usize)
        }
    }

    /// Quantizes `v` at the finest geodesic level.
    ///
    /// `v` need not be of unit length; the zero vector maps to
    /// [`Normix::NULL`].
    pub fn new(v: &Vec3) -> Self {
        Self::at_level(v, MAX_LEVEL)
    }

    /// Quantizes `v` to one of the vertices of geodesic level `level`.
    ///
    /// Starting at the pole on the same side as `v`, the search descends
    /// through the levels, at each level repeatedly moving to the closest
    /// neighbor that is nearer to `v` than the current vertex. This is a
    /// local search: it visits only a few dozen vertices, and on the
    /// geodesic mesh it agrees with exhaustive search in all but rare
    /// cases, where it still returns a neighbor of the nearest vertex.
    ///
    /// # Panics
    /// If `level` exceeds the finest geodesic level.
    pub fn at_level(v: &Vec3, level: usize) -> Self {
        if v.len_sqr() == 0.0 {
            return Self::NULL;
        }
        let g = Geodesic::get();
        let mut champ = if v.z() >= 0.0 { 0 } else { 11 };
        let mut champ_dist = g.vertex(champ).dist_sqr(v);
        let mut visited = Visited::default();
        visited.insert(champ);

        for lvl in 0..=level {
            let level = g.level(lvl);
            loop {
                let mut best = None;
                for n in level.neighbors(champ) {
                    if !visited.insert(n) {
                        continue;
                    }
                    let d = g.vertex(n).dist_sqr(v);
                    if d < champ_dist {
                        best = Some(n);
                        champ_dist = d;
                    }
                }
                match best {
                    Some(n) => champ = n,
                    None => break,
                }
            }
        }
        Self(champ as i16)
    }

    /// Quantizes `v` by comparing against every vertex of `level`.
    pub fn exhaustive(v: &Vec3, level: usize) -> Self {
        if v.len_sqr() == 0.0 {
            return Self::NULL;
        }
        let g = Geodesic::get();
        let mut champ = 0;
        let mut champ_dist = f32::INFINITY;
        for (i, u) in g.vertices()[..g.vertex_count(level)].iter().enumerate() {
            let d = u.dist_sqr(v);
            if d < champ_dist {
                champ = i;
                champ_dist = d;
            }
        }
        Self(champ as i16)
    }
}

impl Debug for Normix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (self.vertex(), self.is_two_sided()) {
            (None, _) => f.write_str("Normix(null)"),
            (Some(v), false) => write!(f, "Normix({v})"),
            (Some(v), true) => write!(f, "Normix(!{v})"),
        }
    }
}

/// A set of geodesic vertex indices.
#[derive(Default)]
struct Visited([u64; 11]);

impl Visited {
    /// Inserts `i`, returning whether it was absent.
    fn insert(&mut self, i: usize) -> bool {
        let (w, b) = (i / 64, 1 << (i % 64));
        let absent = self.0[w] & b == 0;
        self.0[w] |= b;
        absent
    }
}

/// Per-vertex lighting of the geodesic sphere under the current rotation.
#[derive(Clone, Debug)]
pub struct NormixTable {
    rotation: Mat3,
    transformed: Vec<Vec3>,
    one_sided: Vec<u8>,
    two_sided: Vec<u8>,
    screen: Vec<u8>,
}

impl NormixTable {
    /// Returns a table lit for the identity rotation.
    pub fn new(lighting: &Lighting) -> Self {
        let n = Geodesic::get().vertex_count(MAX_LEVEL);
        let mut t = Self {
            rotation: Mat3::IDENTITY,
            transformed: alloc::vec![Vec3::ZERO; n],
            one_sided: alloc::vec![0; n],
            two_sided: alloc::vec![0; n],
            screen: alloc::vec![0; n],
        };
        t.set_rotation(&Mat3::IDENTITY, lighting);
        t
    }

    /// Returns the current rotation.
    pub fn rotation(&self) -> &Mat3 {
        &self.rotation
    }

    /// Rotates every vertex by `m` and recomputes its intensities.
    ///
    /// `m` maps model space (y up) to view space; intensities are taken
    /// in screen space, where y points down.
    pub fn set_rotation(&mut self, m: &Mat3, lighting: &Lighting) {
        self.rotation = *m;
        let g = Geodesic::get();
        for (i, v) in g.vertices().iter().enumerate() {
            let tv = m.apply(v);
            let [x, y, z] = tv.0;
            self.transformed[i] = tv;
            let front = lighting.intensity_normalized(x, -y, z);
            self.one_sided[i] = front;
            self.two_sided[i] = if z >= 0.0 {
                front
            } else {
                lighting.intensity_normalized(-x, y, -z)
            };
        }
        self.relight_screen(lighting);
    }

    /// Recomputes all intensities for new lighting, keeping the rotation.
    pub fn relight(&mut self, lighting: &Lighting) {
        let m = self.rotation;
        self.set_rotation(&m, lighting);
    }

    fn relight_screen(&mut self, lighting: &Lighting) {
        for (i, v) in Geodesic::get().vertices().iter().enumerate() {
            let [x, y, z] = v.0;
            self.screen[i] = lighting.intensity_normalized(x, y, z);
        }
    }

    /// Returns the shade index of `n` under the current rotation.
    pub fn shade(&self, n: Normix) -> u8 {
        match n.vertex() {
            None => NULL_NORMIX_SHADE,
            Some(v) if n.is_two_sided() => self.two_sided[v],
            Some(v) => self.one_sided[v],
        }
    }

    /// Returns the rotated direction of `n`.
    pub fn transformed(&self, n: Normix) -> Option<Vec3> {
        n.vertex().map(|v| self.transformed[v])
    }

    /// Returns the shade index of a normal given directly in screen space,
    /// with x right, y down, and z toward the viewer.
    pub fn screen_shade(&self, normal: &Vec3) -> u8 {
        match Normix::new(normal).vertex() {
            None => NULL_NORMIX_SHADE,
            Some(v) => self.screen[v],
        }
    }
}
