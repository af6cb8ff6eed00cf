//! Line rasterization.
//!
//! Lines are stepped Bresenham-style along their dominant axis, with depth
//! carried as a 22.10 fixed-point accumulator. The first half of a line is
//! drawn with one [`Pen`] and the second half with another, which is how
//! two-colored bonds get their split.
//!
//! Lines include their start point but not their end point.

use alloc::{collections::BTreeMap, vec, vec::Vec};

use log::debug;

use crate::math::rand::Randu;
use crate::math::vec::{Point3i, Vec3};

use super::clip::LineClip;
use super::light::{ShadeRamp, SHADE_LAST};
use super::target::FrameBuffer;

/// How one half of a line is colored.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Pen {
    /// A darker, the base, and a lighter color. A zero base color leaves
    /// the half undrawn.
    pub shades: [u32; 3],
    /// Whether to dither between the three shades.
    pub noisy: bool,
    /// Whether to screen with the translucency checkerboard.
    pub translucent: bool,
}

/// On/off pattern of a dashed line.
///
/// Of every `run` pixels, the first `rise` are drawn.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Dash {
    pub run: u32,
    pub rise: u32,
}

/// Precomputed Bresenham minor-axis steps for a given slope.
///
/// Bit `i` is set if the minor coordinate steps when the major coordinate
/// goes from `i` to `i + 1`. Indexing by absolute screen coordinate makes
/// parallel lines step in lockstep, leaving no gaps between them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineBits {
    x_major: bool,
    len: usize,
    words: Vec<u64>,
}

/// Cache of [`LineBits`] keyed by slope.
#[derive(Clone, Debug, Default)]
pub struct LineBitsCache(BTreeMap<(u32, usize), LineBits>);

impl Pen {
    /// A pen that draws nothing.
    pub const NONE: Self = Self::solid(0);

    /// Returns a pen of one color.
    pub const fn solid(argb: u32) -> Self {
        Self {
            shades: [argb; 3],
            noisy: false,
            translucent: false,
        }
    }

    /// Returns a dithering pen around entry `shade` of `ramp`.
    pub fn shaded(ramp: &ShadeRamp, shade: u8, translucent: bool) -> Self {
        let i = shade.min(SHADE_LAST);
        let up = if i < SHADE_LAST { i + 1 } else { i };
        let dn = i.saturating_sub(1);
        Self {
            shades: [ramp[dn as usize], ramp[i as usize], ramp[up as usize]],
            noisy: true,
            translucent,
        }
    }

    /// Returns whether this pen draws anything.
    pub fn is_visible(&self) -> bool {
        self.shades[1] != 0
    }

    #[inline]
    fn pick(&self, rng: &mut Randu) -> u32 {
        if !self.noisy {
            return self.shades[1];
        }
        let r = rng.next_8bit();
        if r < 85 {
            self.shades[0]
        } else if r > 170 {
            self.shades[2]
        } else {
            self.shades[1]
        }
    }
}

impl Dash {
    /// A solid line.
    pub const SOLID: Self = Self { run: 1, rise: u32::MAX };
    /// Every other pixel.
    pub const DOTTED: Self = Self { run: 2, rise: 1 };
}

impl Default for Dash {
    fn default() -> Self {
        Self::SOLID
    }
}

impl LineBits {
    /// Computes the steps of a line with direction `(dx, dy)` over `len`
    /// major-axis positions.
    pub fn new(dx: f32, dy: f32, len: usize) -> Self {
        let (adx, ady) = (dx.abs(), dy.abs());
        let x_major = ady <= adx;
        let (major, minor) = if x_major { (adx, ady) } else { (ady, adx) };
        let mut words = vec![0u64; len.div_ceil(64)];
        let mut err = 0.0;
        for i in 0..len {
            err += 2.0 * minor;
            if err > major {
                words[i / 64] |= 1 << (i % 64);
                err -= 2.0 * major;
            }
        }
        Self { x_major, len, words }
    }

    /// Returns whether x is the major axis.
    pub fn is_x_major(&self) -> bool {
        self.x_major
    }

    /// Returns whether the minor coordinate steps after major position
    /// `i`, which wraps around the pattern length.
    #[inline]
    pub fn get(&self, i: i32) -> bool {
        let i = i.rem_euclid(self.len as i32) as usize;
        self.words[i / 64] & (1 << (i % 64)) != 0
    }
}

impl LineBitsCache {
    /// Returns the bits for direction `(dx, dy)` in a buffer of the given
    /// size, computing them if needed.
    pub fn get(&mut self, dx: f32, dy: f32, width: i32, height: i32) -> &LineBits {
        let slope = if dx != 0.0 {
            dy / dx
        } else if dy >= 0.0 {
            f32::MAX
        } else {
            -f32::MAX
        };
        let x_major = (-1.0..=1.0).contains(&slope);
        let len = if x_major { width } else { height }.max(1) as usize;
        self.0
            .entry((slope.to_bits(), len))
            .or_insert_with(|| LineBits::new(dx, dy, len))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empties the cache.
    pub fn clear(&mut self) {
        if !self.0.is_empty() {
            debug!("clearing {} cached line patterns", self.0.len());
            self.0.clear();
        }
    }
}

/// Draws a line from `a` toward `b`, clipped to the buffer's clip volume.
///
/// The first half uses `pens[0]`, the second `pens[1]`.
pub fn line(
    fb: &mut FrameBuffer,
    rng: &mut Randu,
    a: Point3i,
    b: Point3i,
    pens: [Pen; 2],
    dash: Dash,
) {
    let clipped = match fb.clip().trim(a, b) {
        LineClip::Unclipped => false,
        LineClip::Clipped(..) => true,
        LineClip::Offscreen => return,
    };
    plot_line(fb, rng, a, b, pens, dash, clipped);
}

/// Rasterizes a line from `a` toward `b`.
///
/// If `clipped`, pixels outside the clip volume are skipped; otherwise
/// the whole line must lie inside the buffer. Both forms write identical
/// pixels where the line is inside.
pub fn plot_line(
    fb: &mut FrameBuffer,
    rng: &mut Randu,
    a: Point3i,
    b: Point3i,
    pens: [Pen; 2],
    dash: Dash,
    clipped: bool,
) {
    let clip = *fb.clip();
    let inside = |x, y, z| !clipped || clip.contains(x, y, z);
    let was_translucent = fb.is_translucent();

    let [mut x, mut y, z] = a.0;
    let [dx, dy, dz] = (b - a).0;

    let mut pen = pens[0];
    fb.set_translucent(pen.translucent);
    if pen.is_visible() && inside(x, y, z) {
        let o = fb.offset(x, y);
        fb.put(o, z, pen.shades[1]);
    }
    let (sx, sy) = (if dx < 0 { -1 } else { 1 }, if dy < 0 { -1 } else { 1 });
    let (adx, ady) = (dx.abs(), dy.abs());
    if adx == 0 && ady == 0 {
        fb.set_translucent(was_translucent);
        return;
    }

    let x_major = ady <= adx;
    let (major, minor) = if x_major { (adx, ady) } else { (ady, adx) };
    let (dz, major_z) = (dz as i64, major as i64);
    let round = if dz < 0 { 1 - major_z } else { major_z - 1 };
    let z_inc = ((dz << 10) + round) / major_z;
    let mut z = (z as i64) << 10;
    let mut err = 0;
    let mid = (major - 1) / 2;
    let (run, rise) = (dash.run.max(1), dash.rise);
    let mut run_idx = 0;

    for n in (0..major - 1).rev() {
        if n == mid {
            pen = pens[1];
            if !pen.is_visible() {
                break;
            }
            fb.set_translucent(pen.translucent);
        }
        if x_major {
            x += sx;
        } else {
            y += sy;
        }
        z += z_inc;
        err += 2 * minor;
        if err > major {
            if x_major {
                y += sy;
            } else {
                x += sx;
            }
            err -= 2 * major;
        }
        let zz = (z >> 10) as i32;
        if pen.is_visible() && run_idx < rise && inside(x, y, zz) {
            let o = fb.offset(x, y);
            fb.put_with(o, zz, || pen.pick(rng));
        }
        run_idx = (run_idx + 1) % run;
    }
    fb.set_translucent(was_translucent);
}

/// Draws a line from `a` to `b` inclusive whose minor-axis steps follow
/// the cached pattern for its slope, with depth interpolated in floating
/// point.
///
/// Cylinders built from many such parallel lines are solid.
pub fn line_bits(
    fb: &mut FrameBuffer,
    rng: &mut Randu,
    bits: &LineBits,
    a: Point3i,
    d: Vec3,
    pens: [Pen; 2],
) {
    let (dx, dy, dz) = (d.x() as i32, d.y() as i32, d.z());
    let b = a + Point3i([dx, dy, dz as i32]);
    if fb.clip().trim(a, b) == LineClip::Offscreen {
        return;
    }
    let clip = *fb.clip();
    let was_translucent = fb.is_translucent();

    let [mut x, mut y, z0] = a.0;
    let (sx, sy) = (if dx < 0 { -1 } else { 1 }, if dy < 0 { -1 } else { 1 });
    let (i0, i_end, i_mid, step, z_inc) = if bits.is_x_major() {
        (x, x + dx, x + dx / 2, sx, dz / dx.abs().max(1) as f32)
    } else {
        (y, y + dy, y + dy / 2, sy, dz / dy.abs().max(1) as f32)
    };

    let mut pen = pens[0];
    fb.set_translucent(pen.translucent);
    let mut z = z0 as f32;
    let mut i = i0;
    loop {
        if i == i_mid {
            pen = pens[1];
            if !pen.is_visible() {
                break;
            }
            fb.set_translucent(pen.translucent);
        }
        let zz = z as i32;
        if pen.is_visible() && clip.contains(x, y, zz) {
            let o = fb.offset(x, y);
            fb.put_with(o, zz, || pen.pick(rng));
        }
        if i == i_end {
            break;
        }
        let minor_step = bits.get(i);
        if bits.is_x_major() {
            x += sx;
            if minor_step {
                y += sy;
            }
        } else {
            y += sy;
            if minor_step {
                x += sx;
            }
        }
        i += step;
        z += z_inc;
    }
    fb.set_translucent(was_translucent);
}
