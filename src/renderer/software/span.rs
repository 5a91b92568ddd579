//! ---------------------------------------------------------------------------
//! Span rasterizer
//!
//! * [`draw_run`] is the innermost loop: an affine 16.16 walk across `count`
//!   destination pixels with a caller-chosen texel fetch.
//! * [`SpanStepper`] splits a screen [`Span`] into such runs, re-deriving the
//!   perspective-correct `(s, t)` every `2^shift` pixels from [`Gradients`].
//!
//! Every fetch masks the integer part of `s` and `t`, so no step size or sign
//! can read outside the source texture.
//! ---------------------------------------------------------------------------

use super::{fixed::Fixed16, gradients::Gradients};
use crate::world::Texture;

/// One horizontal run of destination pixels at row `v`, columns
/// `u .. u + count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub u: i32,
    pub v: i32,
    pub count: i32,
}

impl Span {
    pub const fn new(u: i32, v: i32, count: i32) -> Self {
        Self { u, v, count }
    }

    /// Offset of the first pixel in a buffer `stride` pixels wide.
    #[inline(always)]
    pub fn offset(&self, stride: usize) -> usize {
        self.v as usize * stride + self.u as usize
    }
}

/// Affine segment: `count` pixels starting at `(s, t)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpanRun {
    pub s: Fixed16,
    pub t: Fixed16,
    pub sstep: Fixed16,
    pub tstep: Fixed16,
    pub count: usize,
}

/// Write exactly `run.count` pixels into the front of `dest`.
///
/// Pixel `i` is `fetch(s + i*sstep, t + i*tstep)`.  `dest` must hold at least
/// `run.count` pixels; nothing past that is touched.
#[inline(always)]
pub fn draw_run<F>(dest: &mut [u8], run: &SpanRun, mut fetch: F)
where
    F: FnMut(Fixed16, Fixed16) -> u8,
{
    debug_assert!(run.count <= dest.len(), "span overruns destination");
    let (mut s, mut t) = (run.s, run.t);
    for px in &mut dest[..run.count] {
        *px = fetch(s, t);
        s += run.sstep;
        t += run.tstep;
    }
}

/// Borrowed power-of-two texel grid with its wrap masks.
#[derive(Clone, Copy)]
pub struct Texels<'a> {
    pixels: &'a [u8],
    width_shift: u32,
    smask: i32,
    tmask: i32,
}

impl<'a> Texels<'a> {
    pub fn new(tex: &'a Texture) -> Self {
        debug_assert!(tex.w.is_power_of_two() && tex.h.is_power_of_two());
        Self {
            pixels: &tex.pixels,
            width_shift: tex.w.trailing_zeros(),
            smask: tex.w as i32 - 1,
            tmask: tex.h as i32 - 1,
        }
    }

    #[inline(always)]
    pub fn fetch(&self, s: Fixed16, t: Fixed16) -> u8 {
        self.pixels[(t.texel(self.tmask) << self.width_shift) + s.texel(self.smask)]
    }
}

/*──────────────────────── perspective subdivision ────────────────────────*/

/// Walks one [`Span`] and yields `(first_pixel_offset, SpanRun)` pairs.
///
/// Full chunks are `1 << shift` pixels long and step by shifting; the last
/// chunk steps toward its final pixel by division so it cannot overshoot.
pub struct SpanStepper<'g> {
    grad: &'g Gradients,
    shift: u32,
    sdivz: f32,
    tdivz: f32,
    zi: f32,
    s: i32,
    t: i32,
    remaining: i32,
    done: i32,
}

impl<'g> SpanStepper<'g> {
    pub fn new(grad: &'g Gradients, span: &Span, shift: u32) -> Self {
        let du = span.u as f32;
        let dv = span.v as f32;

        let sdivz = grad.sdivz(du, dv);
        let tdivz = grad.tdivz(du, dv);
        let zi = grad.zi(du, dv);
        let (s, t) = Self::project(grad, sdivz, tdivz, zi, 0);

        Self {
            grad,
            shift,
            sdivz,
            tdivz,
            zi,
            s,
            t,
            remaining: span.count,
            done: 0,
        }
    }

    /// Perspective divide into 16.16, plus adjust and optional clamp.
    #[inline(always)]
    fn project(g: &Gradients, sdivz: f32, tdivz: f32, zi: f32, floor: i32) -> (i32, i32) {
        let z = 65536.0 / zi; // prescale to 16.16
        let s = ((sdivz * z) as i32).wrapping_add(g.s_adjust);
        let t = ((tdivz * z) as i32).wrapping_add(g.t_adjust);
        match g.extents {
            // guard against round-off on negative steps running off the block
            Some(e) => (s.clamp(floor, e.s.max(floor)), t.clamp(floor, e.t.max(floor))),
            None => (s, t),
        }
    }
}

impl Iterator for SpanStepper<'_> {
    type Item = (usize, SpanRun);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining <= 0 {
            return None;
        }
        let g = self.grad;
        let chunk_max = 1i32 << self.shift;
        let count = self.remaining.min(chunk_max);
        self.remaining -= count;

        let (snext, tnext, sstep, tstep) = if self.remaining > 0 {
            self.sdivz += g.sdivz_step_u * chunk_max as f32;
            self.tdivz += g.tdivz_step_u * chunk_max as f32;
            self.zi += g.zi_step_u * chunk_max as f32;
            let (sn, tn) = Self::project(g, self.sdivz, self.tdivz, self.zi, chunk_max);
            (
                sn,
                tn,
                sn.wrapping_sub(self.s) >> self.shift,
                tn.wrapping_sub(self.t) >> self.shift,
            )
        } else {
            // aim at the last pixel of the span so we can't step off the polygon
            let last = (count - 1) as f32;
            self.sdivz += g.sdivz_step_u * last;
            self.tdivz += g.tdivz_step_u * last;
            self.zi += g.zi_step_u * last;
            let (sn, tn) = Self::project(g, self.sdivz, self.tdivz, self.zi, chunk_max);
            if count > 1 {
                (
                    sn,
                    tn,
                    sn.wrapping_sub(self.s) / (count - 1),
                    tn.wrapping_sub(self.t) / (count - 1),
                )
            } else {
                (sn, tn, 0, 0)
            }
        };

        let run = SpanRun {
            s: Fixed16(self.s),
            t: Fixed16(self.t),
            sstep: Fixed16(sstep),
            tstep: Fixed16(tstep),
            count: count as usize,
        };
        let offset = self.done as usize;

        self.done += count;
        self.s = snext;
        self.t = tnext;
        Some((offset, run))
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
