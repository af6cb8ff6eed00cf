//! Frontend using the `minifb` crate for window creation and event handling.

use std::{
    ops::ControlFlow::{self, Break},
    time::Instant,
};

use log::{info, warn};
use minifb::{Key, WindowOptions};

use rastermol_core::render::RenderContext;

use crate::{Dims, Frame, SVGA_800_600};

/// A lightweight wrapper of a `minifb` window.
pub struct Window {
    /// The wrapped minifb window.
    pub imp: minifb::Window,
    /// The width and height of the window.
    pub dims: Dims,
    /// Whether frames may be drawn oversampled and downsampled.
    pub antialias: bool,
}

/// Builder for creating `Window`s.
pub struct Builder<'title> {
    pub dims: Dims,
    pub title: &'title str,
    pub target_fps: Option<u32>,
    pub antialias: bool,
    pub opts: WindowOptions,
}

impl Default for Builder<'_> {
    fn default() -> Self {
        Self {
            dims: SVGA_800_600,
            title: "rastermol",
            target_fps: Some(60),
            antialias: false,
            opts: WindowOptions::default(),
        }
    }
}

impl<'t> Builder<'t> {
    /// Sets the width and height of the window.
    pub fn dims(mut self, dims: Dims) -> Self {
        self.dims = dims;
        self
    }
    /// Sets the title of the window.
    pub fn title(mut self, title: &'t str) -> Self {
        self.title = title;
        self
    }
    /// Sets the frame rate cap of the window. `None` means unlimited
    /// frame rate (the main loop runs as fast as possible).
    pub fn target_fps(mut self, fps: Option<u32>) -> Self {
        self.target_fps = fps;
        self
    }
    /// Sets whether frames may be drawn at twice the window size.
    pub fn antialias(mut self, on: bool) -> Self {
        self.antialias = on;
        self
    }
    /// Sets other `minifb` options.
    pub fn options(mut self, opts: WindowOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Creates the window.
    pub fn build(self) -> minifb::Result<Window> {
        let Self { dims, title, target_fps, antialias, opts } = self;
        let mut imp =
            minifb::Window::new(title, dims.0 as usize, dims.1 as usize, opts)?;
        if let Some(fps) = target_fps {
            imp.set_target_fps(fps as usize);
        }
        Ok(Window { imp, dims, antialias })
    }
}

impl Window {
    /// Returns a window builder.
    pub fn builder() -> Builder<'static> {
        Builder::default()
    }

    /// Returns a renderer sized to fit this window.
    pub fn context(&self) -> RenderContext {
        let (w, h) = self.dims;
        let mut ctx = RenderContext::new(w as i32, h as i32);
        ctx.set_window_size(w as i32, h as i32, self.antialias);
        ctx
    }

    /// Updates the window content with the last finished frame of `ctx`.
    ///
    /// The alpha channel of the pixels is ignored.
    pub fn present(&mut self, ctx: &RenderContext) -> minifb::Result<()> {
        let (w, h) = (ctx.width() as usize, ctx.height() as usize);
        self.imp.update_with_buffer(ctx.pixels(), w, h)
    }

    /// Runs the main loop of the program, invoking the callback on each
    /// iteration to draw the next frame into `ctx`.
    ///
    /// The main loop stops and this function returns if:
    /// * the user closes the window via the GUI (e.g. titlebar close button);
    /// * the Esc key is pressed; or
    /// * the callback returns `ControlFlow::Break`.
    pub fn run<F>(&mut self, ctx: &mut RenderContext, mut frame_fn: F)
    where
        F: FnMut(&mut Frame<Self>) -> ControlFlow<()>,
    {
        let start = Instant::now();
        let mut last = Instant::now();
        loop {
            if self.should_quit() {
                break;
            }
            let frame = &mut Frame {
                t: start.elapsed(),
                dt: last.elapsed(),
                win: &mut *self,
                ctx: &mut *ctx,
            };
            last = Instant::now();
            if let Break(_) = frame_fn(frame) {
                break;
            }
            // In case the callback left the frame open
            ctx.end_rendering();
            if let Err(e) = self.present(ctx) {
                warn!("could not present frame: {e}");
                break;
            }
        }
        info!("{}", ctx.stats());
    }

    fn should_quit(&self) -> bool {
        !self.imp.is_open() || self.imp.is_key_down(Key::Escape)
    }
}
