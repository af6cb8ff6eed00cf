//! Clipping against the screen and depth volume.
//!
//! All primitives are clipped in integer screen space against a box
//! bounded by the buffer edges in x and y, and by the slab (near) and
//! depth (far) planes in z. Each point is classified by an [`Outcode`],
//! a bitset of the box faces it lies outside of.

use bitflags::bitflags;

use crate::math::vec::{Point3i, pt3i};

bitflags! {
    /// The Cohen–Sutherland outcode of a point.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Outcode: u8 {
        /// `y >= height`
        const Y_GT = 1 << 0;
        /// `y < 0`
        const Y_LT = 1 << 1;
        /// `x >= width`
        const X_GT = 1 << 2;
        /// `x < 0`
        const X_LT = 1 << 3;
        /// `z > depth`
        const Z_GT = 1 << 4;
        /// `z < slab`
        const Z_LT = 1 << 5;
    }
}

/// Visibility of a shape in the clip volume.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// Entirely inside the volume.
    Visible,
    /// Partly inside, or outside but not provably so; needs per-pixel tests.
    Clipped,
    /// Entirely outside the volume.
    Hidden,
}

/// The result of trimming a line segment to the clip volume.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineClip {
    /// Both endpoints are inside; the segment needs no clipping.
    Unclipped,
    /// The segment crosses the boundary. Holds the endpoints of the
    /// visible part, in the same order as the input.
    Clipped(Point3i, Point3i),
    /// No part of the segment is inside.
    Offscreen,
}

/// The clip volume: `0..width` × `0..height` × `slab..=depth`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClipVolume {
    pub width: i32,
    pub height: i32,
    pub slab: i32,
    pub depth: i32,
}

impl ClipVolume {
    /// Returns the outcode of the point `(x, y, z)`.
    #[inline]
    pub fn outcode(&self, x: i32, y: i32, z: i32) -> Outcode {
        let mut code = Outcode::empty();
        if x < 0 {
            code |= Outcode::X_LT;
        } else if x >= self.width {
            code |= Outcode::X_GT;
        }
        if y < 0 {
            code |= Outcode::Y_LT;
        } else if y >= self.height {
            code |= Outcode::Y_GT;
        }
        code | self.z_outcode(z)
    }

    /// Returns the depth-only outcode of `z`.
    #[inline]
    pub fn z_outcode(&self, z: i32) -> Outcode {
        if z < self.slab {
            Outcode::Z_LT
        } else if z > self.depth {
            Outcode::Z_GT
        } else {
            Outcode::empty()
        }
    }

    /// Returns the outcode of `p`.
    #[inline]
    pub fn outcode_of(&self, p: &Point3i) -> Outcode {
        self.outcode(p.x(), p.y(), p.z())
    }

    /// Returns whether `(x, y, z)` is inside the volume.
    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && x < self.width
            && y >= 0
            && y < self.height
            && z >= self.slab
            && z <= self.depth
    }

    /// Returns whether `(x, y)` is outside the buffer.
    #[inline]
    pub fn is_clipped_xy(&self, x: i32, y: i32) -> bool {
        x < 0 || x >= self.width || y < 0 || y >= self.height
    }

    /// Returns whether a disc of diameter `d` centered at `(x, y)` lies
    /// entirely outside the buffer.
    #[inline]
    pub fn is_disc_offscreen(&self, d: i32, x: i32, y: i32) -> bool {
        let r = (d + 1) >> 1;
        x < -r || x >= self.width + r || y < -r || y >= self.height + r
    }

    /// Returns the visibility of the convex hull of points with the given
    /// outcodes.
    pub fn status(codes: &[Outcode]) -> Status {
        let all = codes.iter().fold(Outcode::all(), |acc, &c| acc & c);
        let any = codes.iter().fold(Outcode::empty(), |acc, &c| acc | c);
        if !all.is_empty() {
            // Every point is outside the same face
            Status::Hidden
        } else if any.is_empty() {
            Status::Visible
        } else {
            Status::Clipped
        }
    }

    /// Trims the segment `ab` to the volume using Cohen–Sutherland
    /// clipping.
    ///
    /// While either endpoint is outside, the offending endpoint is moved
    /// onto the first violated face (checked in the order x, y, z), its
    /// other coordinates interpolated and truncated toward zero. If both
    /// endpoints are ever outside the same face, the segment is offscreen.
    ///
    /// The trimmed endpoints are only used to bound rasterization;
    /// lines are always stepped from their original endpoints so that
    /// adjacent primitives share exactly the same pixels.
    pub fn trim(&self, a: Point3i, b: Point3i) -> LineClip {
        let mut cc1 = self.outcode_of(&a);
        let mut cc2 = self.outcode_of(&b);
        if (cc1 | cc2).is_empty() {
            return LineClip::Unclipped;
        }
        let (mut p1, mut p2) = (a, b);
        // Each pass clears at least one bit unless rounding re-sets it
        for _ in 0..16 {
            if cc1.intersects(cc2) {
                return LineClip::Offscreen;
            }
            if (cc1 | cc2).is_empty() {
                return LineClip::Clipped(p1, p2);
            }
            if !cc1.is_empty() {
                p1 = self.clip_endpoint(p1, p2, cc1);
                cc1 = self.outcode_of(&p1);
            } else {
                p2 = self.clip_endpoint(p2, p1, cc2);
                cc2 = self.outcode_of(&p2);
            }
        }
        if (cc1 | cc2).is_empty() {
            LineClip::Clipped(p1, p2)
        } else {
            LineClip::Offscreen
        }
    }

    /// Moves `p` along `pq` onto the first face named in `code`.
    fn clip_endpoint(&self, p: Point3i, q: Point3i, code: Outcode) -> Point3i {
        let [x, y, z] = p.0;
        let dx = (q.x() - x) as f32;
        let dy = (q.y() - y) as f32;
        let dz = (q.z() - z) as f32;
        let lerp = |d: i32, num: f32, den: f32| (d as f32 * num / den) as i32;

        if code.contains(Outcode::X_LT) {
            pt3i(0, y + lerp(-x, dy, dx), z + lerp(-x, dz, dx))
        } else if code.contains(Outcode::X_GT) {
            let t = self.width - 1 - x;
            pt3i(self.width - 1, y + lerp(t, dy, dx), z + lerp(t, dz, dx))
        } else if code.contains(Outcode::Y_LT) {
            pt3i(x + lerp(-y, dx, dy), 0, z + lerp(-y, dz, dy))
        } else if code.contains(Outcode::Y_GT) {
            let t = self.height - 1 - y;
            pt3i(x + lerp(t, dx, dy), self.height - 1, z + lerp(t, dz, dy))
        } else if code.contains(Outcode::Z_LT) {
            let t = self.slab - z;
            pt3i(x + lerp(t, dx, dz), y + lerp(t, dy, dz), self.slab)
        } else {
            let t = self.depth - z;
            pt3i(x + lerp(t, dx, dz), y + lerp(t, dy, dz), self.depth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOL: ClipVolume = ClipVolume { width: 100, height: 50, slab: 0, depth: 1000 };

    #[test]
    fn outcodes() {
        assert_eq!(VOL.outcode(10, 10, 10), Outcode::empty());
        assert_eq!(VOL.outcode(-1, 10, 10), Outcode::X_LT);
        assert_eq!(VOL.outcode(100, 50, 10), Outcode::X_GT | Outcode::Y_GT);
        assert_eq!(VOL.outcode(0, -1, -1), Outcode::Y_LT | Outcode::Z_LT);
        assert_eq!(VOL.outcode(99, 49, 1000), Outcode::empty());
        assert_eq!(VOL.outcode(99, 49, 1001), Outcode::Z_GT);
    }

    #[test]
    fn status_of_hulls() {
        let c = |x, y, z| VOL.outcode(x, y, z);
        assert_eq!(ClipVolume::status(&[c(1, 1, 1), c(5, 5, 5)]), Status::Visible);
        assert_eq!(ClipVolume::status(&[c(-1, 1, 1), c(5, 5, 5)]), Status::Clipped);
        assert_eq!(ClipVolume::status(&[c(-1, 1, 1), c(-5, 60, 5)]), Status::Hidden);
        // Outside different faces is not enough to be hidden
        assert_eq!(ClipVolume::status(&[c(-1, 1, 1), c(200, 1, 1)]), Status::Clipped);
    }

    #[test]
    fn trim_inside_is_unclipped() {
        assert_eq!(VOL.trim(pt3i(0, 0, 0), pt3i(99, 49, 1000)), LineClip::Unclipped);
    }

    #[test]
    fn trim_offscreen() {
        assert_eq!(VOL.trim(pt3i(-5, 0, 0), pt3i(-1, 40, 0)), LineClip::Offscreen);
        assert_eq!(VOL.trim(pt3i(0, 0, -5), pt3i(50, 40, -1)), LineClip::Offscreen);
        // Crosses the corner region without entering
        assert_eq!(VOL.trim(pt3i(-10, 5, 0), pt3i(5, -10, 0)), LineClip::Offscreen);
    }

    #[test]
    fn trim_horizontal() {
        assert_eq!(
            VOL.trim(pt3i(-50, 10, 0), pt3i(150, 10, 200)),
            LineClip::Clipped(pt3i(0, 10, 50), pt3i(99, 10, 149))
        );
    }

    #[test]
    fn trim_against_depth() {
        assert_eq!(
            VOL.trim(pt3i(0, 0, -100), pt3i(0, 40, 300)),
            LineClip::Clipped(pt3i(0, 10, 0), pt3i(0, 40, 300))
        );
    }
}
