//! Core functionality of the `rastermol` project.
//!
//! A pure software renderer built for ball-and-stick style scenes: an
//! integer z-buffer, quantized-normal lighting, and scan converters for
//! points, lines, triangles, cylinders and cones, and spheres and
//! ellipsoids. Every primitive resolves its color and normal to table
//! indices, clips in integer screen space, and writes through one shared
//! depth-tested pixel writer.
//!
//! The entry point is [`RenderContext`][render::RenderContext]. A caller
//! configures lighting and a rotation once per frame, issues draw calls
//! between [`begin_rendering`][render::RenderContext::begin_rendering] and
//! [`end_rendering`][render::RenderContext::end_rendering], and then hands
//! the finished ARGB buffer to whatever displays it.
//!
//! # Crate features
//!
//! * `std`:
//!   Makes available items requiring I/O or timekeeping, and uses the
//!   floating-point functions of `std`. Enabled by default.
//!
//!   If this feature is disabled, the crate only depends on `alloc`.
//!
//! * `libm`:
//!   Provides software implementations of floating-point functions via the
//!   [libm](https://crates.io/crates/libm) crate.
//!
//! * `mm`:
//!   Provides fast approximate implementations of floating-point functions
//!   via the [micromath](https://crates.io/crates/micromath) crate.
//!
//! One of the three floating-point backends must be enabled.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;
extern crate core;

#[cfg(not(feature = "fp"))]
compile_error!("one of the features `std`, `libm`, or `mm` must be enabled");

pub mod color;
pub mod geom;
pub mod math;
pub mod render;
pub mod util;

pub mod prelude {
    pub use crate::color::{Colix, ColorTable};
    pub use crate::math::{
        mat::Mat3,
        vec::{Point3i, Vec3, pt3i, vec3},
    };
    pub use crate::render::{
        Endcap, Lighting, Normix, RenderContext,
        text::{BitmapFont, Font},
    };
}
