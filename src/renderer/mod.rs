//! Rendering abstraction layer.
//!
//! *The rest of the engine never touches a pixel buffer directly.*
//! It walks its visible surfaces, turns each into a [`Surface`] (screen spans
//! plus texture gradients) and hands them to a type that implements
//! [`Renderer`].
//!
//! * Edge walking and gradient setup live upstream; the renderer only fills
//!   spans.
//! * A helper blanket‐impl [`RendererExt`] adds `draw_frame` so call-sites
//!   stay short.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{
    model::FrameGroup,
    world::{Camera, TextureBank, TextureId},
};

pub mod software;

pub use software::{
    Extents, Fixed16, Gradients, SkyError, SkyLayers, Software, Span, SpanRun, TurbTable,
    WarpKind, WarpParams,
};

/// Pixel format of the output frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

bitflags! {
    /// Per-surface drawing flags, numbered like the BSP `SURF_*` bits.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SurfaceFlags: u32 {
        /// Two-layer scrolling sky.
        const SKY      = 0x0004;
        /// Sine-warped liquid; the bits below pick which one.
        const TURB     = 0x0010;
        const LAVA     = 0x0100;
        const SLIME    = 0x0200;
        const TELE     = 0x0400;
        /// Do not write the depth buffer.
        const NO_DEPTH = 0x1000;
    }
}

impl SurfaceFlags {
    /// Liquid flavour of a `TURB` surface (plain water if no bit is set).
    pub fn warp_kind(self) -> WarpKind {
        if self.contains(Self::LAVA) {
            WarpKind::Lava
        } else if self.contains(Self::SLIME) {
            WarpKind::Slime
        } else if self.contains(Self::TELE) {
            WarpKind::Teleport
        } else {
            WarpKind::Water
        }
    }
}

/// Texture binding of a surface; animated ones change with the clock.
#[derive(Clone, Debug)]
pub enum SurfaceTexture {
    Static(TextureId),
    Animated(FrameGroup<TextureId>),
}

impl SurfaceTexture {
    /// Texture to bind at `time`.
    #[inline]
    pub fn resolve(&self, time: f64) -> TextureId {
        match self {
            SurfaceTexture::Static(id) => *id,
            SurfaceTexture::Animated(group) => *group.frame_at(time),
        }
    }
}

/// One visible surface: what to sample and which pixels to cover.
#[derive(Clone, Debug)]
pub struct Surface {
    pub texture: SurfaceTexture,
    pub flags: SurfaceFlags,
    pub gradients: Gradients,
    pub spans: SmallVec<[Span; 8]>,
}

/// A renderer that owns its frame buffers.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
/// Software callers typically forward it to their window-manager.
pub trait Renderer {
    /// (Re)allocate buffers for the requested resolution, clear them and
    /// advance every time-driven effect by `elapsed` seconds.
    ///
    /// Everything that depends on the clock is settled here, before the first
    /// surface of the frame is drawn.
    fn begin_frame(&mut self, width: usize, height: usize, elapsed: f32);

    /// Rasterise every span of one surface.
    fn draw_surface(&mut self, surface: &Surface, bank: &TextureBank, camera: &Camera);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// * `submit(&[Rgba], w, h)` is run exactly once per frame.
    /// * Software caller passes `|fb, w, h| window.update_with_buffer(fb, w, h)`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    #[allow(clippy::too_many_arguments)]
    fn draw_frame<F>(
        &mut self,
        width: usize,
        height: usize,
        elapsed: f32,
        surfaces: &[Surface],
        bank: &TextureBank,
        camera: &Camera,
        submit: F,
    ) where
        F: FnOnce(&[Rgba], usize, usize),
    {
        self.begin_frame(width, height, elapsed);
        for s in surfaces {
            self.draw_surface(s, bank, camera);
        }
        self.end_frame(submit);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}
