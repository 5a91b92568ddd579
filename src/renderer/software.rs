//! ---------------------------------------------------------------------------
//! Classic software (CPU) span renderer
//!
//! * Draws into an 8-bit palette-indexed view plus a 16-bit depth buffer.
//! * Converts to **0x00RRGGBB** once per frame in `end_frame`.
//! * Owns every piece of raster state: sky layers, warp tables and the clock.
//!
//! Frame lifecycle: `begin_frame` (clock, phases, sky reset, clears) →
//! any number of `draw_surface` → `end_frame`.
//! ---------------------------------------------------------------------------

mod fixed;
mod gradients;
mod sampler;
mod sky;
mod span;
mod turb;
mod zspan;

pub use fixed::Fixed16;
pub use gradients::{Extents, Gradients};
pub use sampler::SpanSource;
pub use sky::{LAYER_STRIDE, SKY_SCAN, SKY_SIZE, SkyError, SkyLayers, SkyProjection};
pub use span::{Span, SpanRun, SpanStepper, Texels, draw_run};
pub use turb::{ScreenWarp, TURB_CYCLE, TurbPhase, TurbSampler, TurbTable, WarpKind, WarpParams};
pub use zspan::draw_z_spans;

use crate::{
    config::RenderConfig,
    renderer::{Renderer, Rgba, Surface, SurfaceFlags},
    world::{Camera, Palette, Texture, TextureBank},
};

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

/// Quake-style span renderer.
pub struct Software {
    view: Vec<u8>,
    warped: Vec<u8>,
    zbuffer: Vec<i16>,
    scratch: Vec<Rgba>,
    width: usize,
    height: usize,

    config: RenderConfig,
    palette: Palette,

    /* clock: accumulated seconds */
    time: f64,

    sky: Option<SkyLayers>,
    turb_tables: [TurbTable; 4],
    turb_phases: [TurbPhase; 4],
    screen_warp: ScreenWarp,
}

impl Default for Software {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Software {
    pub fn new(config: RenderConfig) -> Self {
        let turb_tables = WarpKind::ALL.map(|k| TurbTable::new(config.warp(k).amplitude));
        Self {
            view: Vec::new(),
            warped: Vec::new(),
            zbuffer: Vec::new(),
            scratch: Vec::new(),
            width: 0,
            height: 0,
            config,
            palette: Palette::grey(),
            time: 0.0,
            sky: None,
            turb_tables,
            turb_phases: [TurbPhase::default(); 4],
            screen_warp: ScreenWarp::default(),
        }
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Install a 256×128 sky texture; replaces any previous sky.
    pub fn set_sky(&mut self, tex: &Texture) -> Result<(), SkyError> {
        self.sky = Some(SkyLayers::from_texture(
            tex,
            self.config.sky_speed_far,
            self.config.sky_speed_near,
        )?);
        Ok(())
    }

    #[inline]
    pub fn set_underwater(&mut self, on: bool) {
        self.config.underwater = on;
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn sky(&self) -> Option<&SkyLayers> {
        self.sky.as_ref()
    }

    /// Seconds accumulated over all frames.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Palette-indexed view of the current frame.
    #[inline]
    pub fn view(&self) -> &[u8] {
        &self.view
    }

    #[inline]
    pub fn zbuffer(&self) -> &[i16] {
        &self.zbuffer
    }

    #[inline]
    pub fn turb_phase(&self, kind: WarpKind) -> TurbPhase {
        self.turb_phases[kind.index()]
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize, elapsed: f32) {
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            log::debug!("software renderer resized to {w}x{h}");
            self.width = w;
            self.height = h;
            self.view.resize(w * h, 0);
            self.warped.resize(w * h, 0);
            self.zbuffer.resize(w * h, 0);
            self.scratch.resize(w * h, 0);
        }

        self.time += elapsed as f64;

        // every phase is settled before the first span reads it
        for kind in WarpKind::ALL {
            self.turb_phases[kind.index()] =
                TurbPhase::at(self.time, self.config.warp(kind).speed);
        }
        if let Some(sky) = &mut self.sky {
            sky.new_frame();
        }

        self.view.fill(self.config.clear_index);
        self.zbuffer.fill(0);
    }

    fn draw_surface(&mut self, surface: &Surface, bank: &TextureBank, camera: &Camera) {
        let tex = bank.texture_or_missing(surface.texture.resolve(self.time));
        let flags = surface.flags;

        let sky = self
            .sky
            .as_mut()
            .filter(|_| flags.contains(SurfaceFlags::SKY));

        let source = if let Some(sky) = sky {
            // composited at most once per frame, however many sky surfaces follow
            sky.sync_to_time(self.time);
            SpanSource::Sky(sky, SkyProjection::new(camera, self.width, self.height))
        } else if flags.contains(SurfaceFlags::TURB) {
            let kind = flags.warp_kind();
            SpanSource::Turbulent(TurbSampler {
                texels: Texels::new(tex),
                table: &self.turb_tables[kind.index()],
                phase: self.turb_phases[kind.index()],
            })
        } else {
            SpanSource::Solid(Texels::new(tex))
        };

        source.draw_spans(&mut self.view, self.width, &surface.spans, &surface.gradients);

        if !flags.contains(SurfaceFlags::NO_DEPTH) {
            draw_z_spans(
                &mut self.zbuffer,
                self.width,
                &surface.spans,
                &surface.gradients,
            );
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        let frame = if self.config.underwater {
            self.screen_warp.apply(
                &self.view,
                &mut self.warped,
                self.width,
                self.height,
                self.time,
            );
            &self.warped
        } else {
            &self.view
        };

        for (dst, &idx) in self.scratch.iter_mut().zip(frame.iter()) {
            *dst = self.palette[idx as usize];
        }
        submit(&self.scratch, self.width, self.height);
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
