//! Translation of triangles into discrete pixels in the frame buffer.
//!
//! A triangle is turned into two *edge rasters*, one for its west (left)
//! and one for its east (right) side, each holding per-scanline x, depth,
//! and optionally color. Every scanline is then filled as a horizontal
//! span from its west to its east x, inclusive, so that triangles sharing
//! an edge both cover it and no gap opens between them.
//!
//! The edges are stepped with an integer error term, and depth is carried
//! in 22.10 fixed point with the same rounding as the span filler.

use alloc::vec::Vec;

use crate::color::Rgb16;
use crate::math::vec::Point3i;

use super::clip::{ClipVolume, Status};
use super::target::{FrameBuffer, Paint};

/// How a triangle is colored.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Fill {
    /// The same paint for every scanline.
    Uniform(Paint),
    /// Colors at each vertex, interpolated across the triangle.
    Gouraud([u32; 3]),
}

/// Fills triangles, reusing its edge buffers between calls.
#[derive(Clone, Debug, Default)]
pub struct TriangleRasterizer {
    west: Raster,
    east: Raster,
}

/// Per-scanline values along one side of a triangle.
#[derive(Clone, Debug, Default)]
struct Raster {
    xs: Vec<i32>,
    zs: Vec<i32>,
    rgbs: Vec<Rgb16>,
}

impl Raster {
    fn reserve(&mut self, rows: usize) {
        if self.xs.len() < rows {
            // Grow in steps of 32 rows
            let n = (rows + 31) & !31;
            self.xs.resize(n, 0);
            self.zs.resize(n, 0);
            self.rgbs.resize(n, Rgb16::default());
        }
    }

    /// Steps the edge from `n` (north) toward `s` (south) over `rows`
    /// scanlines, storing them from index `at` on.
    fn generate(
        &mut self,
        rows: i32,
        n: &Point3i,
        s: &Point3i,
        at: usize,
        colors: Option<(Rgb16, Rgb16)>,
    ) {
        let [xn, _, zn] = n.0;
        let dx = s.x() - xn;
        let dz = s.z() as i64 - zn as i64;
        let (x_inc, width, mut err) = if dx >= 0 {
            (1, dx, 0)
        } else {
            (-1, -dx, 1 - rows)
        };
        let (major_inc, major_err) = if width <= rows {
            (0, width)
        } else {
            (dx / rows, width % rows)
        };
        let rows_z = rows as i64;
        let round = if dz < 0 { -(rows_z / 2) } else { rows_z / 2 };
        let z_inc = ((dz << 10) + round) / rows_z;

        let mut x = xn;
        // 22.10 fixed point needs more than 32 bits for deep scenes
        let mut z = ((zn as i64) << 10) + (1 << 9);
        for i in at..at + rows as usize {
            self.xs[i] = x;
            self.zs[i] = (z >> 10) as i32;
            x += major_inc;
            err += major_err;
            if err > 0 {
                x += x_inc;
                err -= rows;
            }
            z += z_inc;
        }

        if let Some((cn, cs)) = colors {
            let inc = Rgb16::step(&cn, &cs, rows);
            let mut c = cn;
            for rgb in &mut self.rgbs[at..at + rows as usize] {
                *rgb = c;
                c.add(&inc);
            }
        }
    }
}

impl TriangleRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the triangle `verts`, clipped to the buffer's clip volume.
    ///
    /// Triangles with any vertex at z ≤ 1, or with all vertices outside
    /// the same face of the clip volume, are skipped.
    pub fn fill(&mut self, fb: &mut FrameBuffer, verts: [Point3i; 3], fill: &Fill) {
        if verts.iter().any(|v| v.z() <= 1) {
            return;
        }
        let clip = fb.clip();
        let codes = verts.map(|v| clip.outcode_of(&v));
        match ClipVolume::status(&codes) {
            Status::Hidden => {}
            Status::Visible => self.fill_with(fb, verts, fill, false),
            Status::Clipped => self.fill_with(fb, verts, fill, true),
        }
    }

    /// Rasterizes the triangle `verts`.
    ///
    /// If `clipped`, pixels outside the clip volume are skipped; otherwise
    /// the whole triangle must lie inside the buffer. Both forms write
    /// identical pixels where the triangle is inside.
    pub fn fill_with(
        &mut self,
        fb: &mut FrameBuffer,
        v: [Point3i; 3],
        fill: &Fill,
        clipped: bool,
    ) {
        let mut min = 0;
        if v[1].y() < v[min].y() {
            min = 1;
        }
        if v[2].y() < v[min].y() {
            min = 2;
        }
        let (mut mid, mut max) = ((min + 1) % 3, (min + 2) % 3);
        if v[mid].y() > v[max].y() {
            (mid, max) = (max, mid);
        }
        let (y_min, y_mid, y_max) = (v[min].y(), v[mid].y(), v[max].y());
        let n_lines = y_max - y_min + 1;
        if n_lines > fb.height() * 3 {
            return;
        }
        self.west.reserve(n_lines as usize);
        self.east.reserve(n_lines as usize);

        let rgbs = match fill {
            Fill::Gouraud(argbs) => Some(argbs.map(Rgb16::from_argb)),
            Fill::Uniform(_) => None,
        };
        let colors = |n: usize, s: usize| rgbs.map(|c| (c[n], c[s]));
        let Self { west, east } = self;

        let dy_mid = y_mid - y_min;
        if dy_mid == 0 {
            // Flat top
            if v[mid].x() < v[min].x() {
                (mid, min) = (min, mid);
            }
            west.generate(n_lines, &v[min], &v[max], 0, colors(min, max));
            east.generate(n_lines, &v[mid], &v[max], 0, colors(mid, max));
        } else if y_mid == y_max {
            // Flat bottom
            if v[max].x() < v[mid].x() {
                (mid, max) = (max, mid);
            }
            west.generate(n_lines, &v[min], &v[mid], 0, colors(min, mid));
            east.generate(n_lines, &v[min], &v[max], 0, colors(min, max));
        } else {
            // Split at the x of the long edge at the middle vertex's y
            let dx = v[max].x() - v[min].x();
            let round = if dx < 0 { -(n_lines / 2) } else { n_lines / 2 };
            let x_split = v[min].x() + (dx * dy_mid + round) / n_lines;
            let (long, bent) = if x_split < v[mid].x() {
                (west, east)
            } else {
                (east, west)
            };
            // The short edges share the middle row; the lower one wins
            long.generate(n_lines, &v[min], &v[max], 0, colors(min, max));
            bent.generate(dy_mid + 1, &v[min], &v[mid], 0, colors(min, mid));
            bent.generate(
                n_lines - dy_mid,
                &v[mid],
                &v[max],
                dy_mid as usize,
                colors(mid, max),
            );
        }

        let (mut y, mut i, mut rows) = (y_min, 0usize, n_lines);
        if y < 0 {
            rows += y;
            i = -y as usize;
            y = 0;
        }
        rows = rows.min(fb.height() - y);
        for _ in 0..rows.max(0) {
            let (xw, xe) = (self.west.xs[i], self.east.xs[i]);
            let paint = match fill {
                Fill::Uniform(p) => *p,
                Fill::Gouraud(_) => {
                    Paint::Gouraud(self.west.rgbs[i], self.east.rgbs[i])
                }
            };
            let count = xe - xw + 1;
            if count > 0 {
                let (zw, ze) = (self.west.zs[i], self.east.zs[i]);
                fb.plot_span(xw, y, count, zw, ze, &paint, clipped);
            }
            y += 1;
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::math::rand::Xorshift64;
    use crate::math::vec::pt3i;
    use crate::render::ascii;

    use super::*;

    const A: u32 = 0xFFAA_0000;
    const B: u32 = 0xFF00_00BB;

    fn fb(w: i32, h: i32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        fb.set_slab_depth(0, 1000);
        fb.begin(false);
        fb
    }

    fn flat(c: u32) -> Fill {
        Fill::Uniform(Paint::Flat(c))
    }

    #[test]
    fn general_triangle() {
        let mut fb = fb(12, 8);
        let verts = [pt3i(1, 1, 5), pt3i(10, 3, 5), pt3i(4, 7, 5)];
        TriangleRasterizer::new().fill(&mut fb, verts, &flat(A));
        assert_eq!(
            ascii(&fb, &[(A, '#')]),
            "\
............
.#..........
..###.......
..#########.
...#######..
...######...
....####....
....###.....
"
        );
    }

    #[test]
    fn flat_top_and_bottom() {
        let mut fb = fb(12, 8);
        let mut tr = TriangleRasterizer::new();
        tr.fill(&mut fb, [pt3i(2, 0, 5), pt3i(9, 6, 5), pt3i(2, 6, 5)], &flat(A));
        assert_eq!(
            ascii(&fb, &[(A, 'a')]),
            "\
..a.........
..aa........
..aaa.......
..aaaa......
..aaaaa.....
..aaaaaa....
..aaaaaaa...
............
"
        );
    }

    #[test]
    fn shared_edge_leaves_no_gap() {
        let mut fb = fb(12, 8);
        let mut tr = TriangleRasterizer::new();
        let [tl, tr_, bl, br] =
            [pt3i(1, 1, 5), pt3i(10, 1, 5), pt3i(1, 6, 5), pt3i(10, 6, 5)];
        tr.fill(&mut fb, [tl, tr_, bl], &flat(A));
        tr.fill(&mut fb, [tr_, br, bl], &flat(B));
        for y in 1..=6 {
            for x in 1..=10 {
                assert_ne!(fb.pixel(x, y), 0xFF00_0000, "gap at ({x}, {y})");
            }
        }
    }

    #[test]
    fn uniform_gouraud_matches_flat() {
        let verts = [pt3i(3, 2, 40), pt3i(28, 9, 80), pt3i(11, 21, 10)];
        let c = 0xFF35_7BA1;
        let mut f0 = fb(32, 24);
        let mut f1 = fb(32, 24);
        TriangleRasterizer::new().fill(&mut f0, verts, &flat(c));
        TriangleRasterizer::new().fill(&mut f1, verts, &Fill::Gouraud([c; 3]));
        assert_eq!(f0.pixels(), f1.pixels());
        assert_eq!(f0.zbuf(), f1.zbuf());
    }

    #[test]
    fn gouraud_corners_keep_their_colors() {
        let mut fb = fb(16, 16);
        let verts = [pt3i(0, 0, 5), pt3i(15, 0, 5), pt3i(0, 15, 5)];
        let fill = Fill::Gouraud([0xFFFF_0000, 0xFF00_FF00, 0xFF00_00FF]);
        TriangleRasterizer::new().fill(&mut fb, verts, &fill);
        assert_eq!(fb.pixel(0, 0), 0xFFFF_0000);
        let [r, g, b] = crate::color::channels(fb.pixel(0, 14));
        assert!(b > 200 && r < 40 && g < 10, "{r} {g} {b}");
    }

    #[test]
    fn clipped_path_matches_unclipped_inside() {
        let mut rng = Xorshift64::default();
        let mut coord = |n: u64| (rng.next_bits() % n) as i32;
        let mut tr = TriangleRasterizer::new();
        for _ in 0..200 {
            let verts = [0; 3].map(|_| pt3i(coord(40), coord(30), 2 + coord(500)));
            let fills = [
                flat(A),
                Fill::Gouraud([A, B, 0xFF12_3456]),
                Fill::Uniform(Paint::Noisy { base: A, up: B, down: 0xFF00_FF00 }),
            ];
            for fill in &fills {
                let mut f0 = fb(40, 30);
                let mut f1 = fb(40, 30);
                tr.fill_with(&mut f0, verts, fill, false);
                tr.fill_with(&mut f1, verts, fill, true);
                assert_eq!(f0.pixels(), f1.pixels(), "{verts:?}");
                assert_eq!(f0.zbuf(), f1.zbuf(), "{verts:?}");
            }
        }
    }

    #[test]
    fn offscreen_triangle_writes_nothing() {
        let mut fb = fb(10, 10);
        let mut tr = TriangleRasterizer::new();
        tr.fill(&mut fb, [pt3i(-9, 0, 5), pt3i(-1, 3, 5), pt3i(-4, 9, 5)], &flat(A));
        tr.fill(&mut fb, [pt3i(0, 0, 2000), pt3i(9, 3, 2000), pt3i(4, 9, 3000)], &flat(A));
        tr.fill(&mut fb, [pt3i(0, 0, 1), pt3i(9, 3, 5), pt3i(4, 9, 5)], &flat(A));
        assert_eq!(fb.take_frags().i, 0);
    }

    #[test]
    fn partly_offscreen_triangle_is_clipped() {
        let mut fb = fb(12, 12);
        let verts = [pt3i(-10, -10, 5), pt3i(20, -10, 5), pt3i(-10, 20, 5)];
        TriangleRasterizer::new().fill(&mut fb, verts, &flat(A));
        assert_eq!(fb.pixel(0, 0), A);
        assert_eq!(fb.pixel(11, 11), 0xFF00_0000);
    }
}
