//! Cylinders, cones, and flat discs.
//!
//! A cylinder is drawn as a bundle of parallel lines, one for each pixel
//! on the visible half of the ellipse its base projects to on screen.
//! That half-ellipse, the *profile*, is found by sampling the rim of the
//! base at three angles and bisecting until neighboring samples are at
//! most one pixel apart. Each sample also carries the lighting intensity
//! of the surface normal at that point, so every line gets one shade.

use alloc::vec::Vec;
use core::f32::consts::PI;

use crate::math::{
    Randu,
    float::{f32 as fp, floor_i32},
    vec::{Point3i, Vec3, pt3i, vec3},
};

use super::clip::Outcode;
use super::light::{Lighting, SHADE_NORMAL, SPECULAR_SURFACE_LIMIT, ShadeRamp};
use super::line::{self, Dash, LineBitsCache, Pen};
use super::target::{FrameBuffer, Paint};

/// How the ends of a cylinder or cone are drawn.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Endcap {
    /// No caps; the far side of the tube shows through the ends.
    None,
    /// Only the rim of the cap facing the viewer, with the inside of the
    /// tube visible.
    Open,
    /// A flat disc closing the end facing the viewer.
    #[default]
    Flat,
    /// A sphere of the cylinder's diameter at each end.
    Spherical,
}

/// The colors of a cylinder's two halves.
#[derive(Copy, Clone, Debug)]
pub struct Shading<'a> {
    /// Shade ramps of the halves at the start and the end point.
    pub ramps: [&'a ShadeRamp; 2],
    /// Whether each half is drawn with screen-door translucency.
    pub translucent: [bool; 2],
}

/// Scan converter for cylinders, cones, and discs.
///
/// Holds the profile buffers and the line bit pattern cache so that they
/// are reused between calls.
#[derive(Clone, Debug, Default)]
pub struct CylinderRenderer {
    profile: Profile,
    bits: LineBitsCache,
}

/// One sample of a profile.
#[derive(Copy, Clone, Debug, Default)]
struct Sample {
    /// Rim angle as a fraction of a half turn.
    t: f32,
    exact: [f32; 3],
    pt: [i32; 3],
    /// Intensity of the surface normal in 8.8 fixed point.
    fp8: i32,
}

/// The visible half of the projected rim of a cylinder's base, relative to
/// the center of the base. Positive z points away from the viewer.
#[derive(Clone, Debug, Default)]
struct Profile {
    samples: Vec<Sample>,
    radius: f32,
    cos_theta: f32,
    cos_phi: f32,
    sin_phi: f32,
    even: bool,
    precise: bool,
}

/// A cap to be drawn at one end.
#[derive(Copy, Clone, Debug)]
struct Cap {
    at: Point3i,
    shade: u8,
    ramp: ShadeRamp,
    translucent: bool,
}

//
// Inherent impls
//

impl<'a> Shading<'a> {
    /// Returns a shading with both halves the same.
    pub fn uniform(ramp: &'a ShadeRamp, translucent: bool) -> Self {
        Self {
            ramps: [ramp; 2],
            translucent: [translucent; 2],
        }
    }
}

impl CylinderRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the line bit pattern cache.
    pub fn line_bits(&mut self) -> &mut LineBitsCache {
        &mut self.bits
    }

    /// Draws a cylinder of the given diameter from `a` to `b`.
    ///
    /// The half nearer `a` is shaded with `shading.ramps[0]`, the half
    /// nearer `b` with `shading.ramps[1]`. A cylinder of diameter 1 or
    /// less is a plain two-colored line.
    ///
    /// Returns whether anything was drawn. Spherical end caps are left to
    /// the caller, which should draw them only if this returns `true`.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(
        &mut self,
        fb: &mut FrameBuffer,
        rng: &mut Randu,
        lighting: &Lighting,
        shading: &Shading,
        endcap: Endcap,
        diameter: i32,
        a: Point3i,
        b: Point3i,
    ) -> bool {
        let Some(unclipped) = cull(fb, diameter, a, b) else {
            return false;
        };
        let d = b - a;
        if diameter <= 1 {
            let pens = solid_pens(shading, SHADE_NORMAL);
            line::plot_line(fb, rng, a, b, pens, Dash::SOLID, !unclipped);
            return true;
        }
        let was_translucent = fb.is_translucent();
        let cap = Cap::for_cylinder(lighting, shading, endcap, a, d);

        self.profile.generate(lighting, diameter, d.to_vec(), false);
        if endcap == Endcap::Flat {
            if let Some(cap) = &cap {
                self.profile.fill_cap(fb, cap);
            }
        }
        for s in self.profile.samples.iter().rev() {
            let [x, y, z] = s.pt;
            if endcap == Endcap::Open {
                if let Some(cap) = &cap {
                    cap.plot_rim(fb, x, y, z);
                }
            }
            let shade = (s.fp8 >> 8) as u8;
            let pens = [0, 1].map(|i| {
                Pen::shaded(shading.ramps[i], shade, shading.translucent[i])
            });
            let start = a + pt3i(x, y, -z);
            line::plot_line(fb, rng, start, start + d, pens, Dash::SOLID, !unclipped);
            if endcap == Endcap::Open {
                let start = a - pt3i(x, y, -z);
                let pens = solid_pens(shading, 0);
                line::plot_line(fb, rng, start, start + d, pens, Dash::SOLID, !unclipped);
            }
        }
        fb.set_translucent(was_translucent);
        true
    }

    /// Draws a cylinder between floating-point end points.
    ///
    /// Each line of the tube follows the same cached minor-axis step
    /// pattern, so thin tubes built from consecutive segments have no
    /// gaps or overdraw where their lines meet. Otherwise like
    /// [`fill`][Self::fill].
    #[allow(clippy::too_many_arguments)]
    pub fn fill_bits(
        &mut self,
        fb: &mut FrameBuffer,
        rng: &mut Randu,
        lighting: &Lighting,
        shading: &Shading,
        endcap: Endcap,
        diameter: i32,
        a: Vec3,
        b: Vec3,
    ) -> bool {
        let (ai, bi) = (a.to_point_trunc(), b.to_point_trunc());
        let Some(unclipped) = cull(fb, diameter, ai, bi) else {
            return false;
        };
        let df = b - a;
        let d = df.to_point_trunc();
        if diameter <= 1 {
            let pens = solid_pens(shading, SHADE_NORMAL);
            line::plot_line(fb, rng, ai, ai + d, pens, Dash::SOLID, !unclipped);
            return true;
        }
        let was_translucent = fb.is_translucent();
        let cap = Cap::for_cylinder(lighting, shading, endcap, ai, d);

        let Self { profile, bits } = self;
        profile.generate(lighting, diameter, df, true);
        if endcap == Endcap::Flat {
            if let Some(cap) = &cap {
                profile.fill_cap(fb, cap);
            }
        }
        let bits = bits.get(df.x(), df.y(), fb.width(), fb.height());
        let di = d.to_vec();
        for s in profile.samples.iter().rev() {
            let [x, y, z] = s.pt;
            if endcap == Endcap::Open {
                if let Some(cap) = &cap {
                    cap.plot_rim(fb, x, y, z);
                }
            }
            let shade = (s.fp8 >> 8) as u8;
            let pens = [0, 1].map(|i| {
                Pen::shaded(shading.ramps[i], shade, shading.translucent[i])
            });
            line::line_bits(fb, rng, bits, ai + pt3i(x, y, -z), di, pens);
            if endcap == Endcap::Open {
                let start = ai - pt3i(x, y, -z);
                let pens = solid_pens(shading, 0);
                line::plot_line(fb, rng, start, start + d, pens, Dash::SOLID, !unclipped);
            }
        }
        fb.set_translucent(was_translucent);
        true
    }

    /// Draws a cone with its base of the given diameter centered on `base`
    /// and its apex at `tip`.
    ///
    /// Only a [flat](Endcap::Flat) or [open](Endcap::Open) cap is drawn,
    /// and only if the base faces the viewer.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_cone(
        &mut self,
        fb: &mut FrameBuffer,
        rng: &mut Randu,
        lighting: &Lighting,
        ramp: &ShadeRamp,
        translucent: bool,
        endcap: Endcap,
        diameter: i32,
        base: Vec3,
        tip: Vec3,
    ) {
        let was_translucent = fb.is_translucent();
        let a = base.to_point_floor();
        let d = (tip - base).to_point_floor();
        let [dx, dy, dz] = d.0;

        fb.set_translucent(translucent);
        let shade = lighting.intensity(dx as f32, dy as f32, -dz as f32);
        let t = tip.to_point_trunc();
        fb.plot_pixel(t.x(), t.y(), t.z(), ramp[shade as usize]);

        if diameter <= 1 {
            if diameter == 1 {
                let pen = Pen {
                    translucent,
                    ..Pen::solid(ramp[SHADE_NORMAL as usize])
                };
                line::line(fb, rng, a, a + d, [pen; 2], Dash::SOLID);
            }
            fb.set_translucent(was_translucent);
            return;
        }
        let shading = Shading::uniform(ramp, translucent);
        let cap = if dz > 0 {
            Cap::for_cylinder(lighting, &shading, endcap, a, d)
        } else {
            None
        };
        self.profile.generate(lighting, diameter, tip - base, true);
        if endcap == Endcap::Flat {
            if let Some(cap) = &cap {
                self.profile.fill_cap(fb, cap);
            }
        }
        let back = Pen {
            translucent,
            ..Pen::solid(ramp[0])
        };
        for s in self.profile.samples.iter().rev() {
            let [x, y, z] = s.exact;
            let up = base + vec3(x, y, -z);
            let dn = base - vec3(x, y, -z);
            if endcap == Endcap::Open {
                if let Some(cap) = &cap {
                    let (u, n) = (up.to_point_trunc(), dn.to_point_trunc());
                    fb.set_translucent(cap.translucent);
                    fb.plot_pixel(u.x(), u.y(), u.z(), cap.argb());
                    fb.plot_pixel(n.x(), n.y(), n.z(), cap.argb());
                }
            }
            let pen = Pen::shaded(ramp, (s.fp8 >> 8) as u8, translucent);
            let start = up.to_point_trunc();
            let end = start + (tip - up).to_point_ceil();
            line::line(fb, rng, start, end, [pen; 2], Dash::SOLID);

            if !(endcap == Endcap::Flat && dz > 0) {
                let start = dn.to_point_trunc();
                let end = start + (tip - dn).to_point_ceil();
                line::line(fb, rng, start, end, [back; 2], Dash::SOLID);
            }
        }
        fb.set_translucent(was_translucent);
    }

    /// Fills a disc of the given diameter centered on `center`, lit as a
    /// surface facing the viewer.
    ///
    /// The disc is the same set of spans as the flat end cap of a
    /// cylinder pointing straight away from the viewer, and like a cap it
    /// lies one unit in front of `center`.
    pub fn fill_disc(
        &mut self,
        fb: &mut FrameBuffer,
        lighting: &Lighting,
        ramp: &ShadeRamp,
        translucent: bool,
        diameter: i32,
        center: Point3i,
    ) {
        if fb.clip().is_disc_offscreen(diameter, center.x(), center.y()) {
            return;
        }
        if diameter <= 1 {
            let was_translucent = fb.is_translucent();
            fb.set_translucent(translucent);
            let [x, y, z] = center.0;
            fb.plot_pixel(x, y, z, ramp[cap_shade(lighting, 0, 0, 1) as usize]);
            fb.set_translucent(was_translucent);
            return;
        }
        let cap = Cap {
            at: center,
            shade: cap_shade(lighting, 0, 0, 1),
            ramp: *ramp,
            translucent,
        };
        self.profile.generate(lighting, diameter, vec3(0.0, 0.0, 1.0), false);
        self.profile.fill_cap(fb, &cap);
    }
}

/// Draws the outline of a circle of the given diameter centered on
/// `center`, in a single color.
///
/// Uses the midpoint algorithm; circles of even diameter are centered on
/// the corner between four pixels, up and to the left of `center`.
pub fn draw_circle(fb: &mut FrameBuffer, argb: u32, diameter: i32, center: Point3i) {
    let [xc, yc, z] = center.0;
    if diameter <= 0 || fb.clip().is_disc_offscreen(diameter, xc, yc) {
        return;
    }
    let r = diameter / 2;
    let corr = 1 - (diameter & 1);
    let (mut x, mut y) = (r, 0);
    let (mut x_change, mut y_change) = (1 - 2 * r, 1);
    let mut err = 0;
    while x >= y {
        for (px, py) in [
            (x, y),
            (-x, y),
            (x, -y),
            (-x, -y),
            (y, x),
            (-y, x),
            (y, -x),
            (-y, -x),
        ] {
            let px = if px > 0 { px - corr } else { px };
            let py = if py > 0 { py - corr } else { py };
            fb.plot_pixel(xc + px, yc + py, z, argb);
        }
        y += 1;
        err += y_change;
        y_change += 2;
        if 2 * err + x_change > 0 {
            x -= 1;
            err += x_change;
            x_change += 2;
        }
    }
}

impl Cap {
    /// Returns the cap of a cylinder from `a` along `d`, if the cylinder
    /// has one facing the viewer.
    fn for_cylinder(
        lighting: &Lighting,
        shading: &Shading,
        endcap: Endcap,
        a: Point3i,
        d: Point3i,
    ) -> Option<Self> {
        let [dx, dy, dz] = d.0;
        if matches!(endcap, Endcap::Spherical | Endcap::None) || dz == 0 {
            return None;
        }
        let (at, shade, i) = if dz > 0 {
            (a, cap_shade(lighting, -dx, -dy, dz), 0)
        } else {
            (a + d, cap_shade(lighting, dx, dy, -dz), 1)
        };
        Some(Self {
            at,
            shade,
            ramp: *shading.ramps[i],
            translucent: shading.translucent[i],
        })
    }

    fn argb(&self) -> u32 {
        self.ramp[self.shade as usize]
    }

    /// Plots the rim pixels of an open cap at profile offset `(x, y, z)`.
    fn plot_rim(&self, fb: &mut FrameBuffer, x: i32, y: i32, z: i32) {
        let [xc, yc, zc] = self.at.0;
        fb.set_translucent(self.translucent);
        fb.plot_pixel(xc + x, yc + y, zc - z - 1, self.argb());
        fb.plot_pixel(xc - x, yc - y, zc + z - 1, self.argb());
    }
}

impl Profile {
    /// Computes the profile of a cylinder of `diameter` along `d`.
    ///
    /// If `precise`, pixel coordinates are the floors of the exact ones;
    /// otherwise they are truncated, offset by half a pixel for even
    /// diameters.
    fn generate(&mut self, lighting: &Lighting, diameter: i32, d: Vec3, precise: bool) {
        self.samples.clear();
        self.radius = diameter as f32 / 2.0;
        self.even = diameter & 1 == 0;
        self.precise = precise;

        let [dx, dy, dz] = d.0;
        let mag2d2 = dx * dx + dy * dy;
        (self.cos_theta, self.cos_phi, self.sin_phi) = if mag2d2 == 0.0 {
            (1.0, 1.0, 0.0)
        } else {
            let mag2d = fp::sqrt(mag2d2);
            let mag3d = fp::sqrt(mag2d2 + dz * dz);
            (dz / mag3d, dx / mag2d, dy / mag2d)
        };
        for t in [0.0, 0.5, 1.0] {
            let s = self.sample(lighting, t);
            self.samples.push(s);
        }
        self.subdivide(lighting, 0, 1);
        self.subdivide(lighting, 1, 2);
    }

    /// Returns the rim point at angle `t` half turns.
    fn sample(&self, lighting: &Lighting, t: f32) -> Sample {
        let (sin, cos) = (fp::sin(t * PI), fp::cos(t * PI));
        let xt = sin * self.cos_theta;
        let r = self.radius;
        let x = r * (xt * self.cos_phi - cos * self.sin_phi);
        let y = r * (xt * self.sin_phi + cos * self.cos_phi);
        let z2 = r * r - (x * x + y * y);
        let z = if z2 > 0.0 { fp::sqrt(z2) } else { 0.0 };

        let pt = if self.precise {
            [x, y, z].map(floor_i32)
        } else if self.even {
            [(x - 0.5) as i32, (y - 0.5) as i32, (z + 0.5) as i32]
        } else {
            [x as i32, y as i32, (z + 0.5) as i32]
        };
        Sample {
            t,
            exact: [x, y, z],
            pt,
            fp8: lighting.fp8_intensity(x, y, z),
        }
    }

    /// Inserts samples between `lo` and `hi` until no two neighbors are
    /// more than one pixel apart.
    fn subdivide(&mut self, lighting: &Lighting, lo: usize, hi: usize) {
        let [xl, yl, _] = self.samples[lo].pt;
        let [xh, yh, _] = self.samples[hi].pt;
        if (xh - xl).abs() + (yh - yl).abs() <= 1 {
            return;
        }
        let (mut t_lo, mut t_hi) = (self.samples[lo].t, self.samples[hi].t);
        let mid = self.samples.len();
        self.samples.push(Sample::default());
        for _ in 0..4 {
            let s = self.sample(lighting, (t_lo + t_hi) / 2.0);
            self.samples[mid] = s;
            let [x, y, _] = s.pt;
            if x == xl && y == yl {
                let l = &mut self.samples[lo];
                l.fp8 = (l.fp8 + s.fp8) >> 1;
                t_lo = s.t;
            } else if x == xh && y == yh {
                let h = &mut self.samples[hi];
                h.fp8 = (h.fp8 + s.fp8) >> 1;
                t_hi = s.t;
            } else {
                self.subdivide(lighting, lo, mid);
                self.subdivide(lighting, mid, hi);
                return;
            }
        }
        // Stuck on a diagonal step; fill the corner
        self.samples[mid].pt[0] = xl;
        self.samples[mid].pt[1] = yh;
    }

    /// Returns the y range of the profile and its mirror image.
    fn y_range(&self) -> (i32, i32) {
        self.samples
            .iter()
            .map(|s| s.pt[1].abs())
            .fold((0, 0), |(lo, hi), y| (lo.min(-y), hi.max(y)))
    }

    /// Returns the x extent of row `y` of the profile and its mirror
    /// image, with the z offsets at both ends.
    fn x_range(&self, y: i32) -> Option<((i32, i32), (i32, i32))> {
        let mut min = (i32::MAX, 0);
        let mut max = (i32::MIN, 0);
        for s in self.samples.iter().rev() {
            let [sx, sy, sz] = s.pt;
            if sy == y {
                if sx < min.0 {
                    min = (sx, sz);
                }
                if sx > max.0 {
                    max = (sx, sz);
                }
            }
            if sy == -y {
                if -sx < min.0 {
                    min = (-sx, -sz);
                }
                if -sx > max.0 {
                    max = (-sx, -sz);
                }
            }
        }
        (min.0 <= max.0).then_some((min, max))
    }

    /// Fills the ellipse of the profile and its mirror image as a flat
    /// cap at `cap.at`.
    fn fill_cap(&self, fb: &mut FrameBuffer, cap: &Cap) {
        let [xc, yc, zc] = cap.at.0;
        let paint = Paint::noisy(&cap.ramp, cap.shade);
        fb.set_translucent(cap.translucent);
        let (y_min, y_max) = self.y_range();
        for y in y_min..=y_max {
            if let Some(((x_min, z_min), (x_max, z_max))) = self.x_range(y) {
                fb.plot_span(
                    xc + x_min,
                    yc + y,
                    x_max - x_min + 1,
                    zc - z_min - 1,
                    zc - z_max - 1,
                    &paint,
                    true,
                );
            }
        }
    }
}

/// Returns whether the cylinder is entirely inside the clip volume, or
/// `None` if it is entirely outside.
fn cull(fb: &FrameBuffer, diameter: i32, a: Point3i, b: Point3i) -> Option<bool> {
    let clip = fb.clip();
    let r = diameter / 2 + 1;
    let codes = [a - pt3i(r, r, r), a + pt3i(r, r, r), b - pt3i(r, r, r), b + pt3i(r, r, r)]
        .map(|p| clip.outcode_of(&p));
    let all = codes.iter().fold(Outcode::all(), |acc, &c| acc & c);
    let any = codes.iter().fold(Outcode::empty(), |acc, &c| acc | c);
    all.is_empty().then_some(any.is_empty())
}

/// Returns the shade of a cap with the given normal, capped below the
/// specular highlight.
fn cap_shade(lighting: &Lighting, x: i32, y: i32, z: i32) -> u8 {
    lighting
        .intensity(x as f32, y as f32, z as f32)
        .min(SPECULAR_SURFACE_LIMIT)
}

/// Returns single-color pens for both halves of a cylinder.
///
/// The back side of an open tube, seen through its end, uses the darkest
/// shade.
fn solid_pens(shading: &Shading, shade: u8) -> [Pen; 2] {
    [0, 1].map(|i| Pen {
        translucent: shading.translucent[i],
        ..Pen::solid(shading.ramps[i][shade as usize])
    })
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::render::ascii;

    use super::*;

    fn setup(w: i32, h: i32) -> (FrameBuffer, Randu, Lighting, ShadeRamp) {
        let mut fb = FrameBuffer::new(w, h);
        fb.begin(false);
        let lighting = Lighting::default();
        let ramp = lighting.shade_ramp(0xFF_40_80_C0);
        (fb, Randu::default(), lighting, ramp)
    }

    fn drawn(fb: &FrameBuffer) -> Vec<(i32, i32)> {
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
    fn profile_samples_are_connected() {
        let mut p = Profile::default();
        p.generate(&Lighting::default(), 15, vec3(20.0, 7.0, 5.0), false);
        assert!(p.samples.len() > 3);

        let mut by_t = p.samples.clone();
        by_t.sort_by(|a, b| a.t.total_cmp(&b.t));
        for w in by_t.windows(2) {
            let [x0, y0, _] = w[0].pt;
            let [x1, y1, _] = w[1].pt;
            assert!(
                (x1 - x0).abs() <= 1 && (y1 - y0).abs() <= 1,
                "gap between {:?} and {:?}",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn profile_of_axial_cylinder_is_a_semicircle() {
        let mut p = Profile::default();
        p.generate(&Lighting::default(), 9, vec3(0.0, 0.0, 10.0), false);
        for s in &p.samples {
            let [x, y, z] = s.exact;
            assert!(x >= -1e-4, "{s:?}");
            assert!((fp::sqrt(x * x + y * y) - 4.5).abs() < 1e-3);
            assert_eq!(s.pt[2], (z + 0.5) as i32);
        }
    }

    #[test]
    fn flat_cap_matches_disc() {
        let (mut fb, mut rng, lighting, ramp) = setup(16, 16);
        let mut cyl = CylinderRenderer::new();
        let a = pt3i(8, 8, 100);
        let b = pt3i(8, 8, 140);
        let shading = Shading::uniform(&ramp, false);
        cyl.fill(&mut fb, &mut rng, &lighting, &shading, Endcap::Flat, 4, a, b);

        let (mut disc, _, _, _) = setup(16, 16);
        cyl.fill_disc(&mut disc, &lighting, &ramp, false, 4, a);

        assert_eq!(fb.pixels(), disc.pixels());
        assert_eq!(fb.zbuf(), disc.zbuf());
        assert_eq!(drawn(&disc).len(), 9);
    }

    #[test]
    fn disc_is_symmetric_for_odd_diameter() {
        let (mut fb, _, lighting, ramp) = setup(16, 16);
        CylinderRenderer::new()
            .fill_disc(&mut fb, &lighting, &ramp, false, 7, pt3i(8, 8, 10));
        let px = drawn(&fb);
        for &(x, y) in &px {
            assert!(px.contains(&(16 - x, y)), "({x}, {y})");
            assert!(px.contains(&(x, 16 - y)), "({x}, {y})");
        }
        assert_eq!(fb.z(8, 8), 9);
    }

    #[test]
    fn thin_cylinder_is_a_line() {
        let (mut fb, mut rng, lighting, ramp) = setup(8, 1);
        let other = lighting.shade_ramp(0xFF_FF_00_00);
        let shading = Shading {
            ramps: [&ramp, &other],
            translucent: [false; 2],
        };
        let a = pt3i(1, 0, 10);
        let b = pt3i(7, 0, 10);
        CylinderRenderer::new()
            .fill(&mut fb, &mut rng, &lighting, &shading, Endcap::Flat, 1, a, b);
        let s = ascii(
            &fb,
            &[(ramp[SHADE_NORMAL as usize], 'a'), (other[SHADE_NORMAL as usize], 'b')],
        );
        assert_eq!(s, ".aaabbb.\n");
    }

    #[test]
    fn tube_covers_its_whole_length() {
        let (mut fb, mut rng, lighting, ramp) = setup(32, 16);
        let shading = Shading::uniform(&ramp, false);
        let (a, b) = (pt3i(4, 8, 50), pt3i(28, 8, 50));
        CylinderRenderer::new()
            .fill(&mut fb, &mut rng, &lighting, &shading, Endcap::Flat, 5, a, b);
        for x in 4..27 {
            for y in 6..=10 {
                assert_ne!(fb.z(x, y), i32::MAX, "hole at ({x}, {y})");
            }
            assert_eq!(fb.z(x, 3), i32::MAX);
            assert_eq!(fb.z(x, 13), i32::MAX);
        }
        // Nearer to the viewer along the axis than at the silhouette
        assert!(fb.z(16, 8) < fb.z(16, 6));
    }

    #[test]
    fn offscreen_cylinder_is_culled() {
        let (mut fb, mut rng, lighting, ramp) = setup(16, 16);
        let shading = Shading::uniform(&ramp, false);
        let drew = CylinderRenderer::new().fill(
            &mut fb,
            &mut rng,
            &lighting,
            &shading,
            Endcap::Spherical,
            6,
            pt3i(-40, 5, 10),
            pt3i(-20, 9, 10),
        );
        assert!(!drew);
        assert!(drawn(&fb).is_empty());
    }

    #[test]
    fn partly_offscreen_cylinder_matches_unclipped_part() {
        let (mut big, mut rng, lighting, ramp) = setup(40, 20);
        let shading = Shading::uniform(&ramp, false);
        let mut cyl = CylinderRenderer::new();
        let (a, b) = (pt3i(2, 10, 30), pt3i(30, 12, 40));
        cyl.fill(&mut big, &mut rng, &lighting, &shading, Endcap::Open, 6, a, b);
        assert!(!drawn(&big).is_empty());

        // Shifting the whole scene left by 10 crops it at the left edge
        let (mut small, mut rng, _, _) = setup(40, 20);
        let shift = pt3i(10, 0, 0);
        cyl.fill(&mut small, &mut rng, &lighting, &shading, Endcap::Open, 6, a - shift, b - shift);
        for y in 0..20 {
            for x in 0..30 {
                assert_eq!(small.z(x, y), big.z(x + 10, y), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn cone_reaches_its_tip() {
        let (mut fb, mut rng, lighting, ramp) = setup(32, 32);
        CylinderRenderer::new().fill_cone(
            &mut fb,
            &mut rng,
            &lighting,
            &ramp,
            false,
            Endcap::Flat,
            10,
            vec3(8.0, 16.0, 20.0),
            vec3(26.0, 16.0, 20.0),
        );
        assert_ne!(fb.z(26, 16), i32::MAX);
        assert_ne!(fb.z(8, 12), i32::MAX);
        // Narrower near the tip than at the base
        let column = |x| (0..32).filter(|&y| fb.z(x, y) != i32::MAX).count();
        assert!(column(10) > column(22));
    }

    #[test]
    fn circle_outline() {
        let mut fb = FrameBuffer::new(7, 7);
        fb.begin(false);
        draw_circle(&mut fb, 0xFFFFFFFF, 5, pt3i(3, 3, 0));
        let s = ascii(&fb, &[(0xFFFFFFFF, '#')]);
        assert_eq!(
            s,
            ".......\n\
             ..###..\n\
             .#...#.\n\
             .#...#.\n\
             .#...#.\n\
             ..###..\n\
             .......\n"
        );
    }
}
