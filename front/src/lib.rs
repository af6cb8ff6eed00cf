//! Frontends for presenting `rastermol` frames in a window.

use std::time::Duration;

use rastermol_core::render::RenderContext;

#[cfg(feature = "minifb")]
pub mod minifb;

/// Width and height of a window in pixels.
pub type Dims = (u32, u32);

/// The default window size.
pub const SVGA_800_600: Dims = (800, 600);

/// Per-frame state. The window run method passes an instance of `Frame`
/// to the callback function on every iteration of the main loop.
pub struct Frame<'a, Win> {
    /// Elapsed time since the start of the first frame.
    pub t: Duration,
    /// Elapsed time since the start of the previous frame.
    pub dt: Duration,
    /// Reference to the window object.
    pub win: &'a mut Win,
    /// The renderer to draw with. The callback brackets its drawing
    /// with `begin_rendering` and `end_rendering`.
    pub ctx: &'a mut RenderContext,
}
