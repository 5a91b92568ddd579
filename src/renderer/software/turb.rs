//! Turbulence: the sine warp on water, slime, lava and teleporter surfaces,
//! plus the full-screen underwater wobble.
//!
//! All warps read a 128-entry table of precomputed offsets instead of calling
//! `sin` per pixel.  The time-dependent part is a single index offset
//! ([`TurbPhase`]) computed once per frame.

use once_cell::sync::Lazy;

use super::fixed::Fixed16;
use super::span::Texels;

/// Table entries in one sine period.
pub const TURB_CYCLE: usize = 128;
const TURB_MASK: i32 = TURB_CYCLE as i32 - 1;

/// Underwater screen warp: amplitude in pixels and table steps per second.
pub const SCREEN_WARP_AMP: usize = 8;
pub const SCREEN_WARP_SPEED: f32 = 20.0;

/// `sin` over one cycle, shared by every table.
static UNIT_SINE: Lazy<[f32; TURB_CYCLE]> = Lazy::new(|| {
    let mut table = [0.0; TURB_CYCLE];
    for (i, v) in table.iter_mut().enumerate() {
        *v = (i as f32 * std::f32::consts::TAU / TURB_CYCLE as f32).sin();
    }
    table
});

/// Liquid flavours. Same warp, different constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarpKind {
    Water,
    Slime,
    Lava,
    Teleport,
}

impl WarpKind {
    pub const ALL: [WarpKind; 4] = [
        WarpKind::Water,
        WarpKind::Slime,
        WarpKind::Lava,
        WarpKind::Teleport,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Amplitude (texels) and speed (table steps per second) of one warp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarpParams {
    pub amplitude: f32,
    pub speed: f32,
}

impl WarpParams {
    pub const fn new(amplitude: f32, speed: f32) -> Self {
        Self { amplitude, speed }
    }

    /// Stock constants per liquid.
    pub const fn stock(kind: WarpKind) -> Self {
        match kind {
            WarpKind::Water | WarpKind::Teleport => Self::new(8.0, 20.0),
            WarpKind::Slime => Self::new(6.0, 14.0),
            WarpKind::Lava => Self::new(4.0, 8.0),
        }
    }
}

/// Precomputed 16.16 offsets `amp * (1 + sin)`, one period long.
#[derive(Clone, Debug)]
pub struct TurbTable {
    offsets: [i32; TURB_CYCLE],
}

impl TurbTable {
    pub fn new(amplitude: f32) -> Self {
        let amp = amplitude * 65536.0;
        let mut offsets = [0; TURB_CYCLE];
        for (o, s) in offsets.iter_mut().zip(UNIT_SINE.iter()) {
            *o = (amp + s * amp) as i32;
        }
        Self { offsets }
    }

    #[inline(always)]
    fn at(&self, angle: i32, phase: TurbPhase) -> Fixed16 {
        Fixed16(self.offsets[((angle + phase.0) & TURB_MASK) as usize])
    }
}

/// Per-frame index offset into a [`TurbTable`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurbPhase(pub i32);

impl TurbPhase {
    /// Phase at an absolute clock; only the low bits survive, so the product
    /// is taken in `f64` to keep them exact over long sessions.
    pub fn at(time: f64, speed: f32) -> Self {
        TurbPhase(((time * speed as f64) as i64 & TURB_MASK as i64) as i32)
    }
}

/// Texel fetch with the warp applied to both coordinates.
#[derive(Clone, Copy)]
pub struct TurbSampler<'a> {
    pub texels: Texels<'a>,
    pub table: &'a TurbTable,
    pub phase: TurbPhase,
}

impl TurbSampler<'_> {
    #[inline(always)]
    pub fn fetch(&self, s: Fixed16, t: Fixed16) -> u8 {
        let sturb = s + self.table.at(t.int(), self.phase);
        let tturb = t + self.table.at(s.int(), self.phase);
        self.texels.fetch(sturb, tturb)
    }
}

/*──────────────────────── underwater screen warp ────────────────────────*/

/// Scratch lookups for [`ScreenWarp::apply`], rebuilt when the size changes.
#[derive(Default)]
pub struct ScreenWarp {
    offsets: Vec<usize>,
    rows: Vec<usize>,
    cols: Vec<usize>,
    width: usize,
    height: usize,
}

impl ScreenWarp {
    fn prepare(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height && !self.offsets.is_empty() {
            return;
        }
        self.width = width;
        self.height = height;

        let amp = SCREEN_WARP_AMP as f32;
        self.offsets = UNIT_SINE
            .iter()
            .map(|s| (amp + s * amp) as usize)
            .collect();

        // squeeze the picture by 2*amp so the wobble never reaches past an edge
        let span_h = height + SCREEN_WARP_AMP * 2;
        self.rows = (0..span_h)
            .map(|v| (v * height / span_h).min(height - 1))
            .collect();
        let span_w = width + SCREEN_WARP_AMP * 2;
        self.cols = (0..span_w)
            .map(|u| (u * width / span_w).min(width - 1))
            .collect();
    }

    /// Wobble `src` into `dest`; both are `width`×`height` palette indices.
    pub fn apply(&mut self, src: &[u8], dest: &mut [u8], width: usize, height: usize, time: f64) {
        if width == 0 || height == 0 {
            return;
        }
        debug_assert!(src.len() >= width * height && dest.len() >= width * height);
        self.prepare(width, height);

        let phase = TurbPhase::at(time, SCREEN_WARP_SPEED).0 as usize;
        let turb = |i: usize| self.offsets[(i + phase) & TURB_MASK as usize];

        for (v, row) in dest.chunks_exact_mut(width).take(height).enumerate() {
            let col_base = turb(v);
            for (u, px) in row.iter_mut().enumerate() {
                let sy = self.rows[v + turb(u)];
                let sx = self.cols[u + col_base];
                *px = src[sy * width + sx];
            }
        }
    }
}
