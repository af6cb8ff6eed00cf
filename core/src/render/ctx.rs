//! The rendering context: every table, cache, and buffer of one renderer.
//!
//! A [`RenderContext`] is the call surface the scene layer draws through.
//! Draw calls take colors as [`Colix`] handles and normals as [`Normix`]
//! indices, resolve them against the context's tables, and hand the
//! resulting shades to the primitive renderers. Contexts share nothing,
//! so any number of them can coexist.

use core::mem;
#[cfg(feature = "std")]
use std::io;

use log::{debug, trace};

use crate::color::{self, Colix, ColorTable};
use crate::math::mat::Mat3;
use crate::math::rand::Randu;
use crate::math::vec::{Point3i, Vec3, pt3i};

use super::cylinder::{self, CylinderRenderer, Endcap, Shading};
use super::light::{Lighting, ShadeRamp};
use super::line::{self, Dash, Pen};
use super::normix::{Normix, NormixTable};
use super::raster::{Fill, TriangleRasterizer};
use super::sphere::SphereRenderer;
use super::stats::Stats;
use super::target::{DepthCue, FrameBuffer, Paint};
use super::text::{self, Font};

/// A software renderer with its own color table, lighting, caches, and
/// frame buffer.
///
/// Drawing happens between [`begin_rendering`][Self::begin_rendering]
/// and [`end_rendering`][Self::end_rendering]. Screen coordinates have x
/// to the right, y down, and z away from the viewer; when a frame is
/// oversampled, callers scale their coordinates by two.
#[derive(Debug)]
pub struct RenderContext {
    colors: ColorTable,
    lighting: Lighting,
    normixes: NormixTable,
    fb: FrameBuffer,
    triangles: TriangleRasterizer,
    cylinders: CylinderRenderer,
    spheres: SphereRenderer,

    /// Dither source, reset at the start of every frame.
    rng: Randu,
    /// Feeds the dithered tables built lazily by the sphere renderer.
    table_rng: Randu,
    seed: u32,

    z_extent: (i32, i32),
    rendering: bool,
    frame: Stats,
    stats: Stats,
}

impl RenderContext {
    /// Returns a context with a `width` by `height` window, default
    /// lighting, and a black background.
    ///
    /// # Panics
    /// If `width` or `height` is not positive.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_seed(width, height, Randu::DEFAULT_SEED)
    }

    /// Returns a new context whose dithering is seeded with `seed`.
    ///
    /// # Panics
    /// If `width` or `height` is not positive.
    pub fn with_seed(width: i32, height: i32, seed: u32) -> Self {
        let lighting = Lighting::default();
        Self {
            colors: ColorTable::new(),
            normixes: NormixTable::new(&lighting),
            lighting,
            fb: FrameBuffer::new(width, height),
            triangles: TriangleRasterizer::new(),
            cylinders: CylinderRenderer::new(),
            spheres: SphereRenderer::new(),
            rng: Randu::from_seed(seed),
            table_rng: Randu::from_seed(seed),
            seed,
            z_extent: (0, i32::MAX - 1),
            rendering: false,
            frame: Stats::new(),
            stats: Stats::new(),
        }
    }

    //
    // Frame lifecycle
    //

    /// Sets the window size, and whether frames may be oversampled.
    ///
    /// Takes effect at the next [`begin_rendering`][Self::begin_rendering].
    ///
    /// # Panics
    /// If `width` or `height` is not positive.
    pub fn set_window_size(&mut self, width: i32, height: i32, antialias: bool) {
        self.fb.set_window_size(width, height, antialias);
        self.cylinders.line_bits().clear();
    }

    /// Starts a frame: rotates the normal table by `rotation` and clears
    /// the buffer to the background.
    ///
    /// If `antialias` is set and the window size allows it, the frame is
    /// drawn at twice the window size and downsampled when it ends.
    pub fn begin_rendering(&mut self, rotation: &Mat3, antialias: bool) {
        if self.rendering {
            self.end_rendering();
        }
        if self.normixes.rotation() != rotation {
            self.normixes.set_rotation(rotation, &self.lighting);
        }
        self.fb.begin(antialias);
        trace!("frame {} begins at {}x{}", self.stats.frames, self.fb.width(), self.fb.height());
        self.fb.take_frags();
        self.rng = Randu::from_seed(self.seed);
        self.frame = Stats::start();
        self.rendering = true;
    }

    /// Ends the current frame, downsampling it if it was oversampled, and
    /// adds its statistics to the running totals.
    pub fn end_rendering(&mut self) {
        if !self.rendering {
            return;
        }
        self.fb.end();
        let mut frame = mem::take(&mut self.frame).finish();
        frame.frames = 1.0;
        frame.frags = self.fb.take_frags();
        trace!(
            "frame {} done: {} calls, prims {}, pixels {}",
            self.stats.frames,
            frame.calls,
            frame.prims,
            frame.frags
        );
        self.stats += frame;
        self.rendering = false;
    }

    /// Returns whether the current frame is drawn at twice window size.
    pub fn is_oversampled(&self) -> bool {
        self.fb.is_oversampled()
    }

    /// Returns the statistics of all frames ended so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.fb
    }

    /// Returns the pixels of the buffer, row-major.
    pub fn pixels(&self) -> &[u32] {
        self.fb.pixels()
    }

    /// Returns the depths of the buffer, row-major.
    pub fn zbuf(&self) -> &[i32] {
        self.fb.zbuf()
    }

    pub fn width(&self) -> i32 {
        self.fb.width()
    }
    pub fn height(&self) -> i32 {
        self.fb.height()
    }

    /// Writes the buffer to `out` as a binary PPM image.
    ///
    /// # Errors
    /// Returns any error from writing to `out`.
    #[cfg(feature = "std")]
    pub fn snapshot_ppm(&self, out: impl io::Write) -> io::Result<()> {
        let (w, h) = (self.fb.width() as u32, self.fb.height() as u32);
        crate::util::pnm::write_ppm(out, w, h, self.fb.pixels())
    }

    //
    // Clipping and depth cueing
    //

    /// Sets the depth range of the scene, from its nearest z at `front`
    /// to its farthest at `back`, against which slab and depth
    /// percentages are measured.
    pub fn set_z_extent(&mut self, front: i32, back: i32) {
        self.z_extent = (front, back);
    }

    /// Sets the near (slab) and far (depth) clip planes as percentages of
    /// the scene's depth range.
    ///
    /// 100% is the front of the scene and 0% the back, so the defaults of
    /// slab 100 and depth 0 clip nothing of the scene.
    pub fn set_slab_and_depth(&mut self, slab_percent: i32, depth_percent: i32) {
        let (front, back) = self.z_extent;
        let at = |pct: i32| {
            let span = back as i64 - front as i64;
            (front as i64 + (100 - pct as i64) * span / 100) as i32
        };
        self.set_slab_and_depth_values(at(slab_percent), at(depth_percent));
    }

    /// Sets the near and far clip planes to screen depths. Negative values
    /// are clamped to zero.
    pub fn set_slab_and_depth_values(&mut self, slab: i32, depth: i32) {
        self.fb.set_slab_depth(slab.max(0), depth.max(0));
    }

    /// Fades colors toward the background between `z_slab` and
    /// `z_depth`, with the falloff exponent of the current lighting.
    /// Depth cueing is off unless `z_slab < z_depth`.
    pub fn set_depth_cue(&mut self, z_slab: i32, z_depth: i32) {
        let power = self.lighting.z_shade_power;
        self.fb.set_depth_cue(Some(DepthCue { z_slab, z_depth, power }));
    }

    pub fn clear_depth_cue(&mut self) {
        self.fb.set_depth_cue(None);
    }

    /// Sets the background color, used when a frame begins and by depth
    /// cueing. The color is made opaque.
    pub fn set_background_argb(&mut self, argb: u32) {
        self.fb.set_background(argb);
    }

    //
    // Colors and lighting
    //

    /// Returns the colix of `argb`. See [`ColorTable::colix`].
    ///
    /// # Panics
    /// If the alpha channel is zero but the color channels are not.
    pub fn colix(&mut self, argb: u32) -> Colix {
        self.colors.colix(argb)
    }

    /// Returns the colix of a color name or hex string, or
    /// [`Colix::UNRECOGNIZED`].
    pub fn colix_from_name(&mut self, name: &str) -> Colix {
        self.colors.colix_from_name(name)
    }

    /// Parses a color name or hex string into a colix.
    ///
    /// # Errors
    /// Returns [`color::Error`] if `s` is not a known name or valid hex.
    pub fn parse_color(&mut self, s: &str) -> color::Result<Colix> {
        self.colors.parse(s)
    }

    /// Returns the colix of the mean of two colors.
    pub fn colix_mix(&mut self, a: Colix, b: Colix) -> Colix {
        self.colors.mix(a, b)
    }

    /// Returns the displayed ARGB value of `c`.
    pub fn argb(&self, c: Colix) -> u32 {
        self.colors.argb(c)
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }
    pub fn colors_mut(&mut self) -> &mut ColorTable {
        &mut self.colors
    }

    /// Returns the shade ramp of `c` under the current lighting.
    pub fn shades(&mut self, c: Colix) -> &ShadeRamp {
        self.colors.shades(c, &self.lighting)
    }

    /// Renders every color as its luma when `on`.
    pub fn set_greyscale(&mut self, on: bool) {
        self.colors.set_greyscale(on);
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    /// Replaces the lighting, flushing every shade ramp, normal intensity,
    /// and cached sphere built with the old one.
    pub fn set_lighting(&mut self, lighting: Lighting) {
        if lighting == self.lighting {
            return;
        }
        debug!("lighting changed to {lighting:?}");
        self.lighting = lighting;
        self.colors.flush_shades();
        self.normixes.relight(&self.lighting);
        self.spheres.flush();
    }

    pub fn set_ambient_percent(&mut self, pct: u8) {
        self.set_lighting(Lighting { ambient_percent: pct, ..self.lighting });
    }
    pub fn set_diffuse_percent(&mut self, pct: u8) {
        self.set_lighting(Lighting { diffuse_percent: pct, ..self.lighting });
    }
    pub fn set_specular(&mut self, on: bool) {
        self.set_lighting(Lighting { specular: on, ..self.lighting });
    }
    pub fn set_specular_percent(&mut self, pct: u8) {
        self.set_lighting(Lighting { specular_percent: pct, ..self.lighting });
    }
    pub fn set_specular_power(&mut self, pct: u8) {
        self.set_lighting(Lighting { specular_power: pct, ..self.lighting });
    }
    /// Sets the specular falloff as a number of squarings.
    pub fn set_specular_exponent(&mut self, n: u8) {
        self.set_lighting(Lighting { specular_exponent: n, ..self.lighting });
    }
    /// Sets an explicit specular power, replacing the squaring falloff.
    pub fn set_phong_exponent(&mut self, e: Option<f32>) {
        self.set_lighting(Lighting { phong_exponent: e, ..self.lighting });
    }

    /// Returns the shade index of `n` under the current rotation.
    pub fn shade_index(&self, n: Normix) -> u8 {
        self.normixes.shade(n)
    }

    //
    // Points, lines, and rectangles
    //

    /// Plots one pixel.
    pub fn draw_pixel(&mut self, c: Colix, p: Point3i) {
        self.submit(|ctx| {
            if let Some(argb) = ctx.solid(c) {
                ctx.fb.plot_pixel(p.x(), p.y(), p.z(), argb);
            }
        });
    }

    /// Plots each point, or with a `scale` above one, a small disc of
    /// radius `scale` around each.
    pub fn draw_points(&mut self, c: Colix, points: &[Point3i], scale: i32) {
        self.submit(|ctx| {
            let Some(argb) = ctx.solid(c) else { return };
            if scale <= 1 {
                return ctx.fb.plot_points(points, 0, 0, argb);
            }
            let r2 = (scale * scale) as f32 * 0.8;
            for dy in -scale..scale {
                for dx in -scale..scale {
                    if (dx * dx + dy * dy) as f32 <= r2 {
                        ctx.fb.plot_points(points, dx, dy, argb);
                    }
                }
            }
        });
    }

    /// Draws a line from `a` to `b`, its first half in color `ca` and its
    /// second in `cb`. A sentinel color leaves its half undrawn.
    pub fn draw_line(&mut self, ca: Colix, cb: Colix, a: Point3i, b: Point3i) {
        self.stroke([ca, cb], a, b, Dash::SOLID);
    }

    /// Draws a dashed line: of every `run` pixels, the first `rise` are
    /// drawn.
    pub fn draw_dashed_line(
        &mut self,
        c: Colix,
        run: u32,
        rise: u32,
        a: Point3i,
        b: Point3i,
    ) {
        self.stroke([c; 2], a, b, Dash { run, rise });
    }

    /// Draws every other pixel of the line from `a` to `b`.
    pub fn draw_dotted_line(&mut self, c: Colix, a: Point3i, b: Point3i) {
        self.stroke([c; 2], a, b, Dash::DOTTED);
    }

    fn stroke(&mut self, cs: [Colix; 2], a: Point3i, b: Point3i, dash: Dash) {
        let pens = cs.map(|c| {
            let c = self.colors.resolve(c);
            Pen {
                translucent: c.is_translucent(),
                ..Pen::solid(self.colors.argb(c))
            }
        });
        if !pens.iter().any(Pen::is_visible) {
            return;
        }
        self.submit(|ctx| line::line(&mut ctx.fb, &mut ctx.rng, a, b, pens, dash));
    }

    /// Fills the axis-aligned rectangle with top left corner `(x, y)`.
    pub fn fill_rect(&mut self, c: Colix, x: i32, y: i32, z: i32, w: i32, h: i32) {
        self.submit(|ctx| {
            if let Some(argb) = ctx.solid(c) {
                ctx.fb.fill_rect(x, y, z, w, h, argb);
            }
        });
    }

    /// Outlines the axis-aligned rectangle with top left corner `(x, y)`.
    pub fn draw_rect(&mut self, c: Colix, x: i32, y: i32, z: i32, w: i32, h: i32) {
        self.submit(|ctx| {
            if let Some(argb) = ctx.solid(c) {
                ctx.fb.draw_rect(x, y, z, w, h, argb);
            }
        });
    }

    /// Draws `text` with its baseline starting at `(x, y)`.
    pub fn draw_string(
        &mut self,
        c: Colix,
        font: &dyn Font,
        text: &str,
        x: i32,
        y: i32,
        z: i32,
    ) {
        self.submit(|ctx| {
            if let Some(argb) = ctx.solid(c) {
                text::draw_string(&mut ctx.fb, font, argb, text, x, y, z);
            }
        });
    }

    //
    // Triangles
    //

    /// Fills a triangle in one shade: that of normal `n` on color `c`.
    pub fn fill_triangle_flat(&mut self, c: Colix, n: Normix, verts: [Point3i; 3]) {
        let shade = self.normixes.shade(n);
        let (ramp, translucent) = self.ramp(c);
        let fill = Fill::Uniform(Paint::Flat(ramp[shade as usize]));
        self.fill_tri(verts, &fill, translucent);
    }

    /// Fills a triangle with colors interpolated between its vertices,
    /// each shaded by its own color and normal.
    ///
    /// The triangle is screened as translucent if any vertex color is.
    pub fn fill_triangle_gouraud(
        &mut self,
        cs: [Colix; 3],
        ns: [Normix; 3],
        verts: [Point3i; 3],
    ) {
        let mut argbs = [0; 3];
        let mut translucent = false;
        for i in 0..3 {
            let shade = self.normixes.shade(ns[i]);
            let (ramp, t) = self.ramp(cs[i]);
            argbs[i] = ramp[shade as usize];
            translucent |= t;
        }
        self.fill_tri(verts, &Fill::Gouraud(argbs), translucent);
    }

    /// Fills a triangle, flat if all its colors and normals are the same
    /// and Gouraud shaded otherwise.
    pub fn fill_triangle(&mut self, cs: [Colix; 3], ns: [Normix; 3], verts: [Point3i; 3]) {
        if cs.iter().all(|&c| c == cs[0]) && ns.iter().all(|&n| n == ns[0]) {
            self.fill_triangle_flat(cs[0], ns[0], verts);
        } else {
            self.fill_triangle_gouraud(cs, ns, verts);
        }
    }

    /// Fills a triangle lit from whichever side of normal `n` faces the
    /// viewer.
    pub fn fill_triangle_two_sided(&mut self, c: Colix, n: Normix, verts: [Point3i; 3]) {
        let shade = self.normixes.shade(n.two_sided());
        let (ramp, translucent) = self.ramp(c);
        let fill = Fill::Uniform(Paint::noisy(&ramp, shade));
        self.fill_tri(verts, &fill, translucent);
    }

    /// Fills the quadrilateral `abcd` as the triangles `abc` and `acd`,
    /// shaded by the screen-space orientation of `abc`.
    pub fn fill_quadrilateral(&mut self, c: Colix, [a, b, cc, d]: [Vec3; 4]) {
        let shade = self.lighting.surface_shade(a, b, cc);
        let (ramp, translucent) = self.ramp(c);
        let fill = Fill::Uniform(Paint::noisy(&ramp, shade));
        let [a, b, cc, d] = [a, b, cc, d].map(|v| v.to_point_round());
        self.fill_tri([a, b, cc], &fill, translucent);
        self.fill_tri([a, cc, d], &fill, translucent);
    }

    fn fill_tri(&mut self, verts: [Point3i; 3], fill: &Fill, translucent: bool) {
        self.submit(|ctx| {
            ctx.fb.set_translucent(translucent);
            ctx.triangles.fill(&mut ctx.fb, verts, fill);
        });
    }

    /// Draws the edges of a triangle selected by `mask`: bit 0 for `ab`,
    /// bit 1 for `bc`, and bit 2 for `ca`. Each edge is half in the color
    /// of either end.
    pub fn draw_triangle_edges(&mut self, cs: [Colix; 3], [a, b, c]: [Point3i; 3], mask: u8) {
        if mask & 1 != 0 {
            self.draw_line(cs[0], cs[1], a, b);
        }
        if mask & 2 != 0 {
            self.draw_line(cs[1], cs[2], b, c);
        }
        if mask & 4 != 0 {
            self.draw_line(cs[0], cs[2], a, c);
        }
    }

    /// Outlines the quadrilateral `abcd`.
    pub fn draw_quadrilateral(&mut self, c: Colix, [a, b, cc, d]: [Point3i; 4]) {
        for (p, q) in [(a, b), (b, cc), (cc, d), (d, a)] {
            self.draw_line(c, c, p, q);
        }
    }

    //
    // Cylinders and cones
    //

    /// Draws a cylinder from `a` to `b`, the half nearer `a` in color `ca`
    /// and the rest in `cb`.
    pub fn fill_cylinder(
        &mut self,
        ca: Colix,
        cb: Colix,
        endcap: Endcap,
        diameter: i32,
        a: Point3i,
        b: Point3i,
    ) {
        let (ra, ta) = self.ramp(ca);
        let (rb, tb) = self.ramp(cb);
        let shading = Shading {
            ramps: [&ra, &rb],
            translucent: [ta, tb],
        };
        let mut drawn = false;
        self.submit(|ctx| {
            let Self { fb, rng, lighting, cylinders, .. } = ctx;
            drawn = cylinders.fill(fb, rng, lighting, &shading, endcap, diameter, a, b);
        });
        if drawn && endcap == Endcap::Spherical {
            self.fill_sphere(ca, diameter, a + pt3i(0, 0, 1));
            self.fill_sphere(cb, diameter, b + pt3i(0, 0, 1));
        }
    }

    /// Draws a cylinder of one color between float endpoints, stepping
    /// its lines with cached Bresenham patterns.
    pub fn fill_cylinder_bits(
        &mut self,
        c: Colix,
        endcap: Endcap,
        diameter: i32,
        a: Vec3,
        b: Vec3,
    ) {
        let (ramp, translucent) = self.ramp(c);
        let shading = Shading::uniform(&ramp, translucent);
        let mut drawn = false;
        self.submit(|ctx| {
            let Self { fb, rng, lighting, cylinders, .. } = ctx;
            drawn = cylinders.fill_bits(fb, rng, lighting, &shading, endcap, diameter, a, b);
        });
        if drawn && endcap == Endcap::Spherical {
            self.fill_sphere(c, diameter, a.to_point_round() + pt3i(0, 0, 1));
            self.fill_sphere(c, diameter, b.to_point_round() + pt3i(0, 0, 1));
        }
    }

    /// Draws a cone from a base disc of the given diameter at `base` to a
    /// point at `tip`.
    pub fn fill_cone(&mut self, c: Colix, endcap: Endcap, diameter: i32, base: Vec3, tip: Vec3) {
        let (ramp, translucent) = self.ramp(c);
        self.submit(|ctx| {
            let Self { fb, rng, lighting, cylinders, .. } = ctx;
            cylinders.fill_cone(
                fb, rng, lighting, &ramp, translucent, endcap, diameter, base, tip,
            );
        });
    }

    /// Fills a disc facing the viewer, identical to the flat end cap of a
    /// cylinder of the same diameter pointing away from the viewer.
    pub fn fill_circle_centered(&mut self, c: Colix, diameter: i32, center: Point3i) {
        let (ramp, translucent) = self.ramp(c);
        self.submit(|ctx| {
            let Self { fb, lighting, cylinders, .. } = ctx;
            cylinders.fill_disc(fb, lighting, &ramp, translucent, diameter, center);
        });
    }

    /// Draws a circle outline of the given diameter.
    pub fn draw_circle_centered(&mut self, c: Colix, diameter: i32, center: Point3i) {
        self.submit(|ctx| {
            if let Some(argb) = ctx.solid(c) {
                cylinder::draw_circle(&mut ctx.fb, argb, diameter, center);
            }
        });
    }

    //
    // Spheres
    //

    /// Draws a sphere. A diameter of one plots a single pixel in the base
    /// color of `c`.
    pub fn fill_sphere(&mut self, c: Colix, diameter: i32, center: Point3i) {
        let (ramp, translucent) = self.ramp(c);
        self.submit(|ctx| {
            let Self { fb, table_rng, lighting, spheres, .. } = ctx;
            spheres.fill(fb, table_rng, lighting, &ramp, translucent, diameter, center);
        });
    }

    /// Draws an ellipsoid around `center`: the offsets `p` for which
    /// `to_unit · p` lies within the unit sphere.
    pub fn fill_ellipsoid(&mut self, c: Colix, center: Point3i, to_unit: &Mat3) {
        let (ramp, translucent) = self.ramp(c);
        self.submit(|ctx| {
            let Self { fb, normixes, spheres, .. } = ctx;
            spheres.fill_ellipsoid(fb, normixes, &ramp, translucent, center, to_unit);
        });
    }

    //
    // Helpers
    //

    /// Returns a copy of the shade ramp of `c` and whether it is
    /// translucent.
    fn ramp(&mut self, c: Colix) -> (ShadeRamp, bool) {
        let c = self.colors.resolve(c);
        (*self.colors.shades(c, &self.lighting), c.is_translucent())
    }

    /// Sets the translucency of `c` and returns its color, or `None` for
    /// a sentinel.
    fn solid(&mut self, c: Colix) -> Option<u32> {
        let c = self.colors.resolve(c);
        let argb = self.colors.argb(c);
        self.fb.set_translucent(c.is_translucent());
        (argb != 0).then_some(argb)
    }

    /// Runs one draw call, counting it in the frame statistics.
    fn submit(&mut self, draw: impl FnOnce(&mut Self)) {
        let written = self.fb.frags().o;
        draw(self);
        self.fb.set_translucent(false);
        self.frame.calls += 1.0;
        self.frame.prims.i += 1;
        if self.fb.frags().o > written {
            self.frame.prims.o += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::render::light::SHADE_NORMAL;
    use crate::render::stats::Throughput;
    use crate::render::target::Z_BACKGROUND;

    use super::*;

    fn ctx(w: i32, h: i32) -> RenderContext {
        let mut ctx = RenderContext::new(w, h);
        ctx.begin_rendering(&Mat3::IDENTITY, false);
        ctx
    }

    fn drawn(ctx: &RenderContext) -> usize {
        ctx.zbuf().iter().filter(|&&z| z != Z_BACKGROUND).count()
    }

    #[test]
    fn unit_sphere_is_one_base_pixel() {
        let mut ctx = ctx(8, 8);
        let c = ctx.colix(0xFF20_60A0);
        ctx.fill_sphere(c, 1, pt3i(3, 4, 50));

        assert_eq!(drawn(&ctx), 1);
        let fb = ctx.frame_buffer();
        assert_eq!(fb.pixel(3, 4), 0xFF20_60A0);
        assert_eq!(fb.z(3, 4), 50);
        assert_eq!(ctx.shades(c)[SHADE_NORMAL as usize], 0xFF20_60A0);
    }

    #[test]
    fn slab_and_depth_percent_of_extent() {
        let mut ctx = ctx(4, 4);
        ctx.set_z_extent(100, 300);
        ctx.set_slab_and_depth(50, 25);
        let clip = ctx.frame_buffer().clip();
        assert_eq!((clip.slab, clip.depth), (200, 250));

        ctx.set_slab_and_depth(100, 0);
        let clip = ctx.frame_buffer().clip();
        assert_eq!((clip.slab, clip.depth), (100, 300));

        ctx.set_slab_and_depth_values(-5, 40);
        let clip = ctx.frame_buffer().clip();
        assert_eq!((clip.slab, clip.depth), (0, 40));
    }

    #[test]
    fn lighting_change_flushes_ramps_and_spheres() {
        let mut ctx = ctx(32, 32);
        let c = ctx.colix(0xFF80_8080);
        let dark = ctx.shades(c)[0];
        ctx.fill_sphere(c, 9, pt3i(16, 16, 100));
        assert_eq!(ctx.spheres.cached_shapes(), 1);

        ctx.set_ambient_percent(10);
        assert_ne!(ctx.shades(c)[0], dark);
        assert_eq!(ctx.spheres.cached_shapes(), 0);

        // Unchanged lighting keeps the caches
        ctx.fill_sphere(c, 9, pt3i(16, 16, 100));
        ctx.set_ambient_percent(10);
        assert_eq!(ctx.spheres.cached_shapes(), 1);
    }

    #[test]
    fn frame_statistics() {
        let mut ctx = ctx(16, 16);
        let c = ctx.colix(0xFFFF_0000);
        ctx.fill_sphere(c, 5, pt3i(8, 8, 20));
        ctx.fill_sphere(c, 5, pt3i(-50, 8, 20));
        ctx.end_rendering();

        let stats = ctx.stats();
        assert_eq!(stats.frames, 1.0);
        assert_eq!(stats.calls, 2.0);
        assert_eq!(stats.prims, Throughput { i: 2, o: 1 });
        assert_eq!(stats.frags.o, drawn(&ctx));

        // Ending twice counts one frame
        ctx.end_rendering();
        assert_eq!(ctx.stats().frames, 1.0);
    }

    #[test]
    fn frames_are_reproducible() {
        let mut ctx = ctx(40, 40);
        let (a, b) = (ctx.colix(0xFF30_90C0), ctx.colix(0xFFC0_9030));
        let frame = |ctx: &mut RenderContext| {
            ctx.begin_rendering(&Mat3::IDENTITY, false);
            ctx.fill_cylinder(a, b, Endcap::Flat, 7, pt3i(5, 5, 100), pt3i(34, 30, 120));
            ctx.fill_sphere(b, 11, pt3i(20, 20, 90));
            ctx.end_rendering();
            ctx.pixels().to_vec()
        };
        let first: Vec<u32> = frame(&mut ctx);
        let second: Vec<u32> = frame(&mut ctx);
        assert_eq!(first, second);
    }

    #[test]
    fn sentinel_colors_draw_nothing() {
        let mut ctx = ctx(8, 8);
        let red = ctx.colix(0xFFFF_0000);
        ctx.draw_line(Colix::INHERIT, Colix::UNRECOGNIZED, pt3i(0, 0, 5), pt3i(7, 7, 5));
        ctx.draw_pixel(Colix::INHERIT, pt3i(1, 1, 5));
        assert_eq!(drawn(&ctx), 0);

        // Only the second half of a half-sentinel line
        ctx.draw_line(Colix::INHERIT, red, pt3i(0, 3, 5), pt3i(7, 3, 5));
        let fb = ctx.frame_buffer();
        assert_eq!(fb.z(0, 3), Z_BACKGROUND);
        assert_eq!(fb.pixel(6, 3), 0xFFFF_0000);
        // The end point of a line is not plotted
        assert_eq!(fb.z(7, 3), Z_BACKGROUND);
    }

    #[test]
    fn deep_triangle_keeps_its_depth() {
        let mut ctx = ctx(16, 16);
        let c = ctx.colix(0xFF80_8080);
        let z = 3_000_000;
        let n = Normix::new(&Vec3([0.0, 0.0, 1.0]));
        ctx.fill_triangle_flat(c, n, [pt3i(0, 0, z), pt3i(15, 0, z), pt3i(0, 15, z)]);

        let fb = ctx.frame_buffer();
        assert_eq!(fb.z(4, 4), z);
        assert_eq!(fb.z(1, 1), z);
        assert_ne!(fb.pixel(4, 4), fb.background());
    }

    #[test]
    fn deep_line_interpolates_between_end_depths() {
        let mut ctx = ctx(16, 4);
        let c = ctx.colix(0xFFFF_FFFF);
        let (z0, z1) = (2_000_000_000, 2_000_150_000);
        ctx.draw_line(c, c, pt3i(0, 1, z0), pt3i(15, 1, z1));

        let fb = ctx.frame_buffer();
        let zs: Vec<i32> = (0..15).map(|x| fb.z(x, 1)).collect();
        assert_eq!(zs[0], z0);
        assert!(zs.iter().all(|z| (z0..=z1).contains(z)), "{zs:?}");
        assert!(zs.windows(2).all(|w| w[0] <= w[1]), "{zs:?}");
    }

    #[test]
    fn full_extent_slab_and_depth_admit_deep_geometry() {
        let mut ctx = ctx(16, 16);
        ctx.set_z_extent(0, i32::MAX - 1);
        ctx.set_slab_and_depth(100, 0);
        let clip = ctx.frame_buffer().clip();
        assert_eq!((clip.slab, clip.depth), (0, i32::MAX - 1));

        let c = ctx.colix(0xFF40_80C0);
        let n = Normix::new(&Vec3([0.0, 0.0, 1.0]));
        let (near, far) = (1_000_000_000, 1_900_000_000);
        ctx.fill_triangle_flat(c, n, [pt3i(0, 0, near), pt3i(15, 0, far), pt3i(0, 15, near)]);

        let fb = ctx.frame_buffer();
        let zs: Vec<i32> = ctx.zbuf().iter().copied().filter(|&z| z != Z_BACKGROUND).collect();
        assert!(!zs.is_empty());
        assert!(zs.iter().all(|z| (near..=far).contains(z)), "{zs:?}");
        // Depth grows left to right along the top row
        assert!(fb.z(2, 1) < fb.z(10, 1));

        // Slab at the back and depth at the front leave nothing to draw
        ctx.begin_rendering(&Mat3::IDENTITY, false);
        ctx.set_slab_and_depth(0, 100);
        ctx.fill_triangle_flat(c, n, [pt3i(0, 0, near), pt3i(15, 0, far), pt3i(0, 15, near)]);
        assert_eq!(drawn(&ctx), 0);
    }

    #[test]
    fn translucent_pixels_are_screened() {
        let mut ctx = ctx(4, 4);
        let c = ctx.colix(0x80FF_FFFF);
        assert!(c.is_translucent());
        ctx.fill_rect(c, 0, 0, 5, 4, 4);

        let fb = ctx.frame_buffer();
        for y in 0..4 {
            for x in 0..4 {
                let open = (x ^ y) & 1 == 0;
                assert_eq!(fb.z(x, y) == 5, open, "at ({x}, {y})");
            }
        }
        // Screening does not leak into later opaque draws
        let o = ctx.colix(0xFFFF_FFFF);
        ctx.draw_pixel(o, pt3i(1, 0, 1));
        assert_eq!(ctx.frame_buffer().z(1, 0), 1);
    }

    #[test]
    fn greyscale_mode() {
        let mut ctx = ctx(2, 1);
        let c = ctx.colix(0xFFFF_0000);
        ctx.set_greyscale(true);
        ctx.draw_pixel(c, pt3i(0, 0, 1));
        // (2989 * 255 + 5000) / 10000 == 76
        assert_eq!(ctx.frame_buffer().pixel(0, 0), 0xFF4C_4C4C);
    }

    #[test]
    fn uniform_triangle_takes_flat_path() {
        let verts = [pt3i(1, 1, 10), pt3i(14, 4, 10), pt3i(5, 13, 10)];
        let n = Normix::new(&Vec3([0.0, 0.0, 1.0]));

        let mut flat = ctx(16, 16);
        let c = flat.colix(0xFF40_C040);
        flat.fill_triangle([c; 3], [n; 3], verts);

        let mut gouraud = ctx(16, 16);
        let c = gouraud.colix(0xFF40_C040);
        gouraud.fill_triangle_gouraud([c; 3], [n; 3], verts);

        assert!(drawn(&flat) > 0);
        assert_eq!(flat.pixels(), gouraud.pixels());
        assert_eq!(flat.zbuf(), gouraud.zbuf());
    }

    #[test]
    fn oversampled_frame_is_downsampled() {
        let mut ctx = RenderContext::new(4, 3);
        ctx.set_window_size(4, 3, true);
        ctx.begin_rendering(&Mat3::IDENTITY, true);
        assert!(ctx.is_oversampled());
        assert_eq!((ctx.width(), ctx.height()), (8, 6));

        let white = ctx.colix(0xFFFF_FFFF);
        ctx.fill_rect(white, 0, 0, 10, 8, 6);
        ctx.end_rendering();

        assert_eq!((ctx.width(), ctx.height()), (4, 3));
        assert!(ctx.pixels().iter().all(|&p| p == 0xFFFF_FFFF));
        assert!(ctx.zbuf().iter().all(|&z| z == 5));
    }

    #[test]
    fn spherical_caps_cover_endpoints() {
        let mut ctx = ctx(32, 16);
        let c = ctx.colix(0xFF60_60FF);
        let (a, b) = (pt3i(6, 8, 100), pt3i(26, 8, 100));
        ctx.fill_cylinder(c, c, Endcap::Spherical, 6, a, b);
        let fb = ctx.frame_buffer();
        // The caps bulge past the ends of the tube
        assert_ne!(fb.z(5, 8), Z_BACKGROUND);
        assert_ne!(fb.z(27, 8), Z_BACKGROUND);
    }

    #[cfg(feature = "std")]
    #[test]
    fn snapshot_is_ppm() {
        let mut ctx = ctx(2, 1);
        let c = ctx.colix(0xFF11_2233);
        ctx.draw_pixel(c, pt3i(1, 0, 1));
        let mut out = Vec::new();
        ctx.snapshot_ppm(&mut out).unwrap();
        assert_eq!(&out, b"P6 2 1 255\n\x00\x00\x00\x11\x22\x33");
    }
}
