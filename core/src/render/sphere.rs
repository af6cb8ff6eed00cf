//! Spheres and ellipsoids.
//!
//! Spheres up to [`SHAPE_CACHE_LIMIT`] pixels across are drawn from a
//! cached *shape*: one quarter of the disc, each pixel packed with its
//! height above the disc and the shade of the four mirror-image pixels in
//! the other quadrants. Larger spheres, spheres cut by the slab plane, and
//! ellipsoids are solved per pixel instead.
//!
//! Where the slab plane cuts a solid, the pixels whose front surface is
//! clipped away but whose back surface is not are *core* pixels. They are
//! drawn at the slab depth in a flat, slightly darkened and jittered
//! shade, so the cut reads as a solid cross-section.

use alloc::{boxed::Box, vec::Vec};
use core::fmt::{self, Display, Formatter};
use core::ops::Range;

use log::debug;

use crate::math::{
    Randu,
    float::{ceil_i32, f32 as fp},
    mat::Mat3,
    vec::{Point3i, vec3},
};

use super::light::{Lighting, SHADE_LAST, SHADE_NORMAL, ShadeRamp, SphereIntensities};
use super::normix::NormixTable;
use super::target::FrameBuffer;

/// The largest diameter drawn from a cached shape.
pub const SHAPE_CACHE_LIMIT: i32 = 128;

/// Base shade of core pixels.
const SHADE_SLAB_CLIPPED: u8 = SHADE_NORMAL - 5;

/// One of the four quadrants of a disc, in screen orientation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Quadrant {
    SouthEast = 0,
    SouthWest = 1,
    NorthEast = 2,
    NorthWest = 3,
}

/// A packed sphere shape entry.
///
/// Layout, from the least significant bit:
/// ```text
///  bits   0..7   height of the surface above the disc plane
///  bits   7..13  shade of the south-east pixel
///  bits  13..19  shade of the south-west pixel
///  bits  19..25  shade of the north-east pixel
///  bits  25..31  shade of the north-west pixel
///  bit   31      set on the last entry of a row
/// ```
#[derive(Copy, Clone, Default, Eq, PartialEq)]
#[repr(transparent)]
pub struct ShapeWord(u32);

/// Error returned when a value does not fit its [`ShapeWord`] field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShapeError {
    /// The height exceeds 127.
    Height(u8),
    /// A shade exceeds 63.
    Shade(u8),
}

/// The cached quarter-disc of a sphere of one diameter.
#[derive(Clone, Debug)]
pub struct SphereShape {
    diameter: i32,
    words: Box<[ShapeWord]>,
}

/// Scan converter for spheres and ellipsoids.
///
/// Owns the shape cache and the intensity table of large spheres. Both
/// depend on the lighting and must be [flushed][Self::flush] when it
/// changes.
#[derive(Clone, Debug, Default)]
pub struct SphereRenderer {
    shapes: Vec<Option<SphereShape>>,
    intensities: Option<SphereIntensities>,
}

/// A solid that can be solved for its surface at each pixel.
trait Surface {
    /// Returns the near and far depth offsets, and the shade of the near
    /// surface, at pixel offset `(dx, dy)` from the center.
    fn solve(&mut self, dx: i32, dy: i32) -> Option<(i32, i32, u8)>;
}

/// A large sphere, shaded from the precomputed direction table.
struct Ball<'a> {
    r: f32,
    radius: i32,
    table: &'a SphereIntensities,
}

/// An ellipsoid given by the quadric `pᵀ A p = 1`.
struct Quadric<'a> {
    a: [[f32; 3]; 3],
    normixes: &'a NormixTable,
}

//
// Inherent impls
//

impl ShapeWord {
    const HEIGHT_MASK: u32 = 0x7F;
    const SHADE_MASK: u32 = 0x3F;
    const END_OF_ROW: u32 = 1 << 31;

    /// Packs a height, the shades of the four quadrants in the order of
    /// [`Quadrant`], and the end-of-row flag.
    ///
    /// # Errors
    /// If the height exceeds 127 or any shade exceeds 63.
    pub fn new(height: u8, shades: [u8; 4], end_of_row: bool) -> Result<Self, ShapeError> {
        if height as u32 > Self::HEIGHT_MASK {
            return Err(ShapeError::Height(height));
        }
        let mut bits = height as u32;
        for (i, &s) in shades.iter().enumerate() {
            if s as u32 > Self::SHADE_MASK {
                return Err(ShapeError::Shade(s));
            }
            bits |= (s as u32) << (7 + 6 * i);
        }
        if end_of_row {
            bits |= Self::END_OF_ROW;
        }
        Ok(Self(bits))
    }

    /// Returns a word with the given bit pattern. Every pattern is valid.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Returns the height of the surface above the disc.
    pub const fn height(self) -> i32 {
        (self.0 & Self::HEIGHT_MASK) as i32
    }

    /// Returns the shade of the pixel in quadrant `q`.
    pub const fn shade(self, q: Quadrant) -> u8 {
        ((self.0 >> (7 + 6 * q as u32)) & Self::SHADE_MASK) as u8
    }

    /// Returns whether this is the last entry of its row.
    pub const fn is_end_of_row(self) -> bool {
        self.0 & Self::END_OF_ROW != 0
    }

    fn set_end_of_row(&mut self) {
        self.0 |= Self::END_OF_ROW;
    }
}

impl SphereShape {
    /// Builds the shape of a sphere of the given diameter, dithering its
    /// shades with `rng`.
    ///
    /// # Panics
    /// If `diameter` is not in `1..=SHAPE_CACHE_LIMIT`.
    pub fn new(lighting: &Lighting, diameter: i32, rng: &mut Randu) -> Self {
        assert!(
            (1..=SHAPE_CACHE_LIMIT).contains(&diameter),
            "sphere shape diameter {diameter} out of range"
        );
        let d = diameter as usize;
        let rf = diameter as f32 / 2.0;
        let radius = d / 2;

        // Full disc first; None outside it
        let mut grid: Vec<Option<(u8, u8)>> = Vec::with_capacity(d * d);
        for i in 0..d {
            let y = i as f32 - rf + 0.5;
            for j in 0..d {
                let x = j as f32 - rf + 0.5;
                let z2 = rf * rf - y * y - x * x;
                grid.push((z2 >= 0.0).then(|| {
                    let z = fp::sqrt(z2);
                    let shade = lighting.dithered_intensity(x, y, z, rf, rng);
                    ((z + 0.5) as u8, shade)
                }));
            }
        }
        let shade = |row: usize, col: usize| grid[row * d + col].map_or(0, |(_, s)| s);

        let mut words = Vec::new();
        for south in radius..d {
            let north = d - south - 1;
            for j in radius..d {
                let Some((height, se)) = grid[south * d + j] else {
                    break;
                };
                let shades = [se, shade(south, d - j - 1), shade(north, j), shade(north, d - j - 1)];
                // Heights and shades of a sphere this size always fit
                match ShapeWord::new(height, shades, false) {
                    Ok(w) => words.push(w),
                    Err(e) => unreachable!("{e}"),
                }
            }
            if let Some(last) = words.last_mut() {
                last.set_end_of_row();
            }
        }
        Self {
            diameter,
            words: words.into_boxed_slice(),
        }
    }

    /// Returns the diameter of the sphere.
    pub fn diameter(&self) -> i32 {
        self.diameter
    }

    /// Returns the rows of the south-east quadrant, from the center row
    /// outward.
    pub fn rows(&self) -> impl Iterator<Item = &[ShapeWord]> {
        self.words.split_inclusive(|w| w.is_end_of_row())
    }
}

impl SphereRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all cached shapes and intensities.
    pub fn flush(&mut self) {
        let n = self.shapes.iter().flatten().count();
        if n > 0 || self.intensities.is_some() {
            debug!("flushing {n} cached sphere shapes");
        }
        self.shapes.clear();
        self.intensities = None;
    }

    /// Returns the number of cached shapes.
    pub fn cached_shapes(&self) -> usize {
        self.shapes.iter().flatten().count()
    }

    /// Returns the cached shape of the given diameter, building it if
    /// needed.
    fn shape(&mut self, lighting: &Lighting, diameter: i32, rng: &mut Randu) -> &SphereShape {
        let i = (diameter - 1) as usize;
        if self.shapes.len() <= i {
            self.shapes.resize(i + 1, None);
        }
        self.shapes[i].get_or_insert_with(|| SphereShape::new(lighting, diameter, rng))
    }

    /// Draws a sphere of the given diameter centered on `center`.
    ///
    /// A sphere of diameter 1 is a single pixel in the base shade.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(
        &mut self,
        fb: &mut FrameBuffer,
        rng: &mut Randu,
        lighting: &Lighting,
        ramp: &ShadeRamp,
        translucent: bool,
        diameter: i32,
        center: Point3i,
    ) {
        let [x, y, z] = center.0;
        if diameter <= 0 {
            return;
        }
        let was_translucent = fb.is_translucent();
        fb.set_translucent(translucent);
        if diameter == 1 {
            fb.plot_pixel(x, y, z, ramp[SHADE_NORMAL as usize]);
            fb.set_translucent(was_translucent);
            return;
        }

        let clip = *fb.clip();
        let r = (diameter + 1) >> 1;
        if x + r < 0
            || x - r >= clip.width
            || y + r < 0
            || y - r >= clip.height
            || z + r < clip.slab
            || z - r > clip.depth
        {
            fb.set_translucent(was_translucent);
            return;
        }
        if diameter > SHAPE_CACHE_LIMIT || z - r < clip.slab {
            let table = self
                .intensities
                .get_or_insert_with(|| SphereIntensities::new(lighting, rng));
            let radius = diameter / 2;
            let mut ball = Ball {
                r: diameter as f32 / 2.0,
                radius,
                table,
            };
            render_solid(fb, ramp, center, -radius..diameter - radius, &mut ball);
        } else {
            let clipped = x - r < 0
                || x + r >= clip.width
                || y - r < 0
                || y + r >= clip.height
                || z + r > clip.depth;
            let shape = self.shape(lighting, diameter, rng);
            render_shape(fb, ramp, shape, center, clipped);
        }
        fb.set_translucent(was_translucent);
    }

    /// Draws an ellipsoid centered on `center`.
    ///
    /// `to_unit` maps an offset from the center, in screen units with z
    /// away from the viewer, to the unit sphere: the ellipsoid is the set
    /// of offsets `p` with `|to_unit · p| ≤ 1`. Surface normals are
    /// quantized through `normixes`. Nothing is drawn if `to_unit` is
    /// singular.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_ellipsoid(
        &mut self,
        fb: &mut FrameBuffer,
        normixes: &NormixTable,
        ramp: &ShadeRamp,
        translucent: bool,
        center: Point3i,
        to_unit: &Mat3,
    ) {
        let Some(inv) = to_unit.inverse() else {
            return;
        };
        // Half extents along the screen axes
        let [rx, ry, rz] = [0, 1, 2].map(|i| ceil_i32(inv.row(i).len()));
        let [x, y, z] = center.0;
        let clip = *fb.clip();
        if x + rx < 0
            || x - rx >= clip.width
            || y + ry < 0
            || y - ry >= clip.height
            || z + rz < clip.slab
            || z - rz > clip.depth
        {
            return;
        }
        let cols = [0, 1, 2].map(|i| to_unit.col(i));
        let a = [0, 1, 2].map(|i| [0, 1, 2].map(|j| cols[i].dot(&cols[j])));
        if !(a[2][2] > 0.0) {
            return;
        }
        let was_translucent = fb.is_translucent();
        fb.set_translucent(translucent);
        let mut quadric = Quadric { a, normixes };
        let r = rx.max(ry);
        render_solid(fb, ramp, center, -r..r + 1, &mut quadric);
        fb.set_translucent(was_translucent);
    }
}

//
// Trait impls
//

impl Surface for Ball<'_> {
    fn solve(&mut self, dx: i32, dy: i32) -> Option<(i32, i32, u8)> {
        // Pixel centers, offset for even diameters
        let off = self.radius as f32 - self.r + 0.5;
        let (x, y) = (dx as f32 + off, dy as f32 + off);
        let z2 = self.r * self.r - x * x - y * y;
        if z2 < 0.0 {
            return None;
        }
        let h = (fp::sqrt(z2) + 0.5) as i32;
        let shade = self.table.get(dx, dy, self.radius);
        Some((-h, h, shade))
    }
}

impl Surface for Quadric<'_> {
    fn solve(&mut self, dx: i32, dy: i32) -> Option<(i32, i32, u8)> {
        let a = &self.a;
        let (x, y) = (dx as f32, dy as f32);
        let qa = a[2][2];
        let qb = 2.0 * (a[0][2] * x + a[1][2] * y);
        let qc = a[0][0] * x * x + 2.0 * a[0][1] * x * y + a[1][1] * y * y - 1.0;
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return None;
        }
        let s = fp::sqrt(disc);
        let near = (-qb - s) / (2.0 * qa);
        let far = (-qb + s) / (2.0 * qa);

        // The gradient points away from the center; flip z toward the viewer
        let g = [0, 1, 2].map(|i| a[i][0] * x + a[i][1] * y + a[i][2] * near);
        let shade = self.normixes.screen_shade(&vec3(g[0], g[1], -g[2]));
        Some((round_i32(near), round_i32(far), shade))
    }
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height(h) => write!(f, "sphere shape height {h} exceeds 127"),
            Self::Shade(s) => write!(f, "sphere shape shade {s} exceeds 63"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ShapeError {}

impl fmt::Debug for ShapeWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use Quadrant::*;
        let q = [SouthEast, SouthWest, NorthEast, NorthWest].map(|q| self.shade(q));
        write!(f, "ShapeWord(h={}, {q:?}", self.height())?;
        if self.is_end_of_row() {
            f.write_str(", eor")?;
        }
        f.write_str(")")
    }
}

//
// Local functions
//

fn round_i32(x: f32) -> i32 {
    crate::math::float::round(x)
}

/// Mirrors the rows of `shape` into all four quadrants around `center`.
///
/// Even diameters are centered on the corner between four pixels, up and
/// to the left of `center`.
fn render_shape(
    fb: &mut FrameBuffer,
    ramp: &ShadeRamp,
    shape: &SphereShape,
    center: Point3i,
    clipped: bool,
) {
    let clip = *fb.clip();
    let [xc, yc, zc] = center.0;
    let corr = 1 - (shape.diameter() & 1);
    for (i, row) in shape.rows().enumerate() {
        let i = i as i32;
        let (y_south, y_north) = (yc + i, yc - corr - i);
        for (j, w) in row.iter().enumerate() {
            let j = j as i32;
            let (x_east, x_west) = (xc + j, xc - corr - j);
            let z = zc - w.height();
            for (q, x, y) in [
                (Quadrant::SouthEast, x_east, y_south),
                (Quadrant::SouthWest, x_west, y_south),
                (Quadrant::NorthEast, x_east, y_north),
                (Quadrant::NorthWest, x_west, y_north),
            ] {
                if !clipped || clip.contains(x, y, z) {
                    let o = fb.offset(x, y);
                    fb.put(o, z, ramp[w.shade(q) as usize]);
                }
            }
        }
    }
}

/// Solves `surface` at every offset in the square `range × range`
/// around `center`, drawing core pixels where the slab cuts it.
fn render_solid(
    fb: &mut FrameBuffer,
    ramp: &ShadeRamp,
    center: Point3i,
    range: Range<i32>,
    surface: &mut impl Surface,
) {
    let clip = *fb.clip();
    let [xc, yc, zc] = center.0;
    let mut core = Randu::from_seed(
        ((xc as u32) << 16).wrapping_add((yc as u32) << 1) ^ 0x3333_3333,
    );
    // Only offsets that land inside the clip rectangle
    let visible = |c: i32, len: i32| {
        range.start.max(0i32.saturating_sub(c))..range.end.min(len.saturating_sub(c))
    };
    for dy in visible(yc, clip.height) {
        let y = yc + dy;
        for dx in visible(xc, clip.width) {
            let x = xc + dx;
            let Some((near, far, shade)) = surface.solve(dx, dy) else {
                continue;
            };
            let (z, shade) = if zc + near >= clip.slab {
                (zc + near, Some(shade))
            } else if zc + far >= clip.slab {
                (clip.slab, None)
            } else {
                continue;
            };
            if z > clip.depth {
                continue;
            }
            let o = fb.offset(x, y);
            fb.put_with(o, z, || {
                let s = shade.unwrap_or_else(|| {
                    let jitter = (core.next_state() >> 8) & 7;
                    SHADE_SLAB_CLIPPED - 3 + jitter as u8
                });
                ramp[s.min(SHADE_LAST) as usize]
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::math::vec::pt3i;
    use crate::render::ascii;

    use super::*;

    fn setup(w: i32, h: i32) -> (FrameBuffer, Randu, Lighting, ShadeRamp) {
        let mut fb = FrameBuffer::new(w, h);
        fb.begin(false);
        let lighting = Lighting::default();
        let ramp = lighting.shade_ramp(0xFF_20_A0_40);
        (fb, Randu::default(), lighting, ramp)
    }

    fn coverage(fb: &FrameBuffer) -> Vec<(i32, i32)> {
        let mut v = Vec::new();
        for y in 0..fb.height() {
            for x in 0..fb.width() {
                if fb.z(x, y) != i32::MAX {
                    v.push((x, y));
                }
            }
        }
        v
    }

    #[test]
    fn shape_word_packing() {
        let w = ShapeWord::new(100, [1, 22, 43, 63], true).unwrap();
        assert_eq!(w.height(), 100);
        assert_eq!(w.shade(Quadrant::SouthEast), 1);
        assert_eq!(w.shade(Quadrant::SouthWest), 22);
        assert_eq!(w.shade(Quadrant::NorthEast), 43);
        assert_eq!(w.shade(Quadrant::NorthWest), 63);
        assert!(w.is_end_of_row());
        assert_eq!(ShapeWord::from_bits(w.to_bits()), w);

        assert_eq!(ShapeWord::new(128, [0; 4], false), Err(ShapeError::Height(128)));
        assert_eq!(ShapeWord::new(0, [0, 64, 0, 0], false), Err(ShapeError::Shade(64)));
    }

    #[test]
    fn shape_rows_cover_quarter_disc() {
        let shape = SphereShape::new(&Lighting::default(), 9, &mut Randu::default());
        let rows: Vec<_> = shape.rows().map(|r| r.len()).collect();
        // Row widths of the south-east quarter of a 9-pixel disc
        assert_eq!(rows, [5, 5, 5, 4, 3]);
        assert!(shape.rows().all(|r| r.last().unwrap().is_end_of_row()));
        // Tallest at the center
        assert_eq!(shape.rows().next().unwrap()[0].height(), 5);
    }

    #[test]
    #[should_panic]
    fn shape_diameter_out_of_range() {
        SphereShape::new(&Lighting::default(), 129, &mut Randu::default());
    }

    #[test]
    fn single_pixel_sphere() {
        let (mut fb, mut rng, lighting, ramp) = setup(5, 5);
        let mut s = SphereRenderer::new();
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 1, pt3i(2, 3, 10));
        assert_eq!(coverage(&fb), [(2, 3)]);
        assert_eq!(fb.pixel(2, 3), ramp[SHADE_NORMAL as usize]);
        assert_eq!(fb.z(2, 3), 10);
    }

    #[test]
    fn small_sphere_outline() {
        let (mut fb, mut rng, lighting, ramp) = setup(11, 11);
        let mut s = SphereRenderer::new();
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 9, pt3i(5, 5, 50));
        let marks: Vec<_> = ramp.iter().map(|&c| (c, '#')).collect();
        assert_eq!(
            ascii(&fb, &marks),
            "...........\n\
             ...#####...\n\
             ..#######..\n\
             .#########.\n\
             .#########.\n\
             .#########.\n\
             .#########.\n\
             .#########.\n\
             ..#######..\n\
             ...#####...\n\
             ...........\n"
        );
        assert_eq!(fb.z(5, 5), 45);
        assert_eq!(s.cached_shapes(), 1);
    }

    #[test]
    fn even_sphere_is_centered_on_corner() {
        let (mut fb, mut rng, lighting, ramp) = setup(8, 8);
        SphereRenderer::new().fill(&mut fb, &mut rng, &lighting, &ramp, false, 4, pt3i(4, 4, 50));
        let px = coverage(&fb);
        assert!(px.iter().all(|&(x, y)| (2..6).contains(&x) && (2..6).contains(&y)));
        for &(x, y) in &px {
            assert!(px.contains(&(7 - x, y)));
            assert!(px.contains(&(x, 7 - y)));
        }
    }

    #[test]
    fn clipped_shape_matches_unclipped() {
        let (mut whole, mut rng, lighting, ramp) = setup(40, 40);
        let mut s = SphereRenderer::new();
        s.fill(&mut whole, &mut rng, &lighting, &ramp, false, 21, pt3i(20, 20, 100));

        let (mut part, mut rng, _, _) = setup(40, 40);
        s.fill(&mut part, &mut rng, &lighting, &ramp, false, 21, pt3i(5, 20, 100));
        for y in 0..40 {
            for x in 0..20 {
                assert_eq!(part.pixel(x, y), whole.pixel(x + 15, y), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn slab_cut_sphere_has_flat_core() {
        let (mut fb, mut rng, lighting, ramp) = setup(32, 32);
        fb.set_slab_depth(95, i32::MAX - 1);
        let mut s = SphereRenderer::new();
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 21, pt3i(16, 16, 100));
        // Center is cut: drawn at the slab in a core shade
        assert_eq!(fb.z(16, 16), 95);
        let core = (SHADE_SLAB_CLIPPED - 3..SHADE_SLAB_CLIPPED + 5).map(|i| ramp[i as usize]);
        assert!(core.clone().any(|c| c == fb.pixel(16, 16)));
        // Rim is behind the slab and drawn normally
        assert!(fb.z(16, 6) > 95);
        // Nothing drawn in front of the slab
        assert!(coverage(&fb).iter().all(|&(x, y)| fb.z(x, y) >= 95));
    }

    #[test]
    fn large_sphere_is_round() {
        let (mut fb, mut rng, lighting, ramp) = setup(160, 160);
        let mut s = SphereRenderer::new();
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 151, pt3i(80, 80, 500));
        assert_eq!(s.cached_shapes(), 0);
        assert_ne!(fb.z(80, 80), i32::MAX);
        assert_ne!(fb.z(80, 6), i32::MAX);
        assert_eq!(fb.z(80, 3), i32::MAX);
        assert_eq!(fb.z(10, 10), i32::MAX);
        assert!(fb.z(80, 80) < fb.z(80, 40));
    }

    #[test]
    fn huge_sphere_draws_only_its_visible_cap() {
        let (mut fb, mut rng, lighting, ramp) = setup(16, 16);
        let mut s = SphereRenderer::new();
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 20_001, pt3i(8, 10_008, 20_000));
        assert_eq!(fb.z(8, 5), i32::MAX);
        assert_ne!(fb.z(8, 12), i32::MAX);
        assert_ne!(fb.z(0, 15), i32::MAX);
        assert!(fb.z(8, 15) < fb.z(8, 12));
        assert!(coverage(&fb).iter().all(|&(_, y)| y >= 7));
    }

    #[test]
    fn offscreen_sphere_draws_nothing() {
        let (mut fb, mut rng, lighting, ramp) = setup(16, 16);
        let mut s = SphereRenderer::new();
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 9, pt3i(-10, 5, 10));
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 9, pt3i(5, 5, -10));
        assert!(coverage(&fb).is_empty());
        assert_eq!(s.cached_shapes(), 0);
    }

    #[test]
    fn flush_empties_caches() {
        let (mut fb, mut rng, lighting, ramp) = setup(16, 16);
        let mut s = SphereRenderer::new();
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 5, pt3i(8, 8, 10));
        s.fill(&mut fb, &mut rng, &lighting, &ramp, false, 7, pt3i(8, 8, 10));
        assert_eq!(s.cached_shapes(), 2);
        s.flush();
        assert_eq!(s.cached_shapes(), 0);
    }

    #[test]
    fn unit_ellipsoid_covers_sphere_footprint() {
        let (mut fb, _, lighting, ramp) = setup(32, 32);
        let normixes = NormixTable::new(&lighting);
        let m = Mat3([[0.1, 0.0, 0.0], [0.0, 0.1, 0.0], [0.0, 0.0, 0.1]]);
        SphereRenderer::new().fill_ellipsoid(&mut fb, &normixes, &ramp, false, pt3i(16, 16, 100), &m);
        // Radius 10 around the center
        assert_ne!(fb.z(16, 16), i32::MAX);
        assert_eq!(fb.z(16, 16), 90);
        assert_ne!(fb.z(16, 7), i32::MAX);
        assert_eq!(fb.z(16, 5), i32::MAX);
        assert_eq!(fb.z(4, 4), i32::MAX);
    }

    #[test]
    fn stretched_ellipsoid_is_wider_than_tall() {
        let (mut fb, _, lighting, ramp) = setup(40, 40);
        let normixes = NormixTable::new(&lighting);
        let m = Mat3([[1.0 / 15.0, 0.0, 0.0], [0.0, 0.2, 0.0], [0.0, 0.0, 0.2]]);
        SphereRenderer::new().fill_ellipsoid(&mut fb, &normixes, &ramp, false, pt3i(20, 20, 100), &m);
        assert_ne!(fb.z(33, 20), i32::MAX);
        assert_eq!(fb.z(20, 27), i32::MAX);
        assert_ne!(fb.z(20, 23), i32::MAX);
    }

    #[test]
    fn singular_ellipsoid_draws_nothing() {
        let (mut fb, _, lighting, ramp) = setup(16, 16);
        let normixes = NormixTable::new(&lighting);
        let m = Mat3([[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        SphereRenderer::new().fill_ellipsoid(&mut fb, &normixes, &ramp, false, pt3i(8, 8, 10), &m);
        assert!(coverage(&fb).is_empty());
    }
}
