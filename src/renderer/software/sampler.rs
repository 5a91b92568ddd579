//! Where a surface's texels come from.
//!
//! The variant is picked once per surface; each arm then runs its own
//! monomorphised copy of the span loop, so the inner loop never branches on
//! surface type.

use super::{
    gradients::Gradients,
    sky::{SkyLayers, SkyProjection},
    span::{Span, SpanStepper, Texels, draw_run},
    turb::TurbSampler,
};

/// Perspective re-projection interval for textured spans (8 pixels).
pub const SOLID_SPAN_SHIFT: u32 = 3;
/// Turbulent spans hide more affine error under the warp (16 pixels).
pub const TURB_SPAN_SHIFT: u32 = 4;

pub enum SpanSource<'a> {
    Solid(Texels<'a>),
    Turbulent(TurbSampler<'a>),
    Sky(&'a SkyLayers, SkyProjection),
}

impl SpanSource<'_> {
    /// Rasterize `spans` into `dest`, a buffer `stride` pixels wide.
    pub fn draw_spans(&self, dest: &mut [u8], stride: usize, spans: &[Span], grad: &Gradients) {
        match self {
            SpanSource::Solid(texels) => {
                draw_perspective(dest, stride, spans, grad, SOLID_SPAN_SHIFT, |s, t| {
                    texels.fetch(s, t)
                })
            }
            SpanSource::Turbulent(turb) => {
                draw_perspective(dest, stride, spans, grad, TURB_SPAN_SHIFT, |s, t| {
                    turb.fetch(s, t)
                })
            }
            SpanSource::Sky(sky, proj) => {
                for span in spans {
                    proj.draw_span(sky, dest, stride, span);
                }
            }
        }
    }
}

#[inline(always)]
fn draw_perspective<F>(
    dest: &mut [u8],
    stride: usize,
    spans: &[Span],
    grad: &Gradients,
    shift: u32,
    fetch: F,
) where
    F: Fn(super::fixed::Fixed16, super::fixed::Fixed16) -> u8,
{
    for span in spans {
        debug_assert!(span.count > 0, "empty span");
        let row = &mut dest[span.offset(stride)..][..span.count as usize];
        for (ofs, run) in SpanStepper::new(grad, span, shift) {
            draw_run(&mut row[ofs..], &run, &fetch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::software::turb::{TurbPhase, TurbTable};
    use crate::world::Texture;

    fn stripes() -> Texture {
        Texture::from_fn("STRIPES", 16, 16, |x, _| 1 + x as u8).unwrap()
    }

    #[test]
    fn solid_spans_cover_declared_pixels_only() {
        let tex = stripes();
        let src = SpanSource::Solid(Texels::new(&tex));
        let g = Gradients::affine(0.0, 0.0, 1.0, 1.0);

        let mut dest = vec![0u8; 32 * 8];
        let spans = [Span::new(4, 2, 20), Span::new(0, 5, 32)];
        src.draw_spans(&mut dest, 32, &spans, &g);

        let written = dest.iter().filter(|&&p| p != 0).count();
        assert_eq!(written, 52);
        // u maps straight to s, so column 4 reads stripe 4
        assert_eq!(dest[2 * 32 + 4], 5);
        assert_eq!(dest[5 * 32 + 31], 1 + 15);
    }

    #[test]
    fn turbulent_with_flat_table_equals_solid() {
        let tex = Texture::from_fn("MIX", 32, 32, |x, y| (x * 3 + y * 5) as u8 | 1).unwrap();
        let texels = Texels::new(&tex);
        let table = TurbTable::new(0.0);
        let g = Gradients::horizontal_plane(
            &crate::world::Camera::new(glam::Vec3::new(5.0, -3.0, 40.0), 0.4, 1.6),
            64,
            48,
            0.0,
            1.0,
        );
        let spans: Vec<Span> = (30..48).map(|v| Span::new(0, v, 64)).collect();

        let mut a = vec![0u8; 64 * 48];
        let mut b = vec![0u8; 64 * 48];
        // same subdivision so only the fetch differs
        draw_perspective(&mut a, 64, &spans, &g, TURB_SPAN_SHIFT, |s, t| texels.fetch(s, t));
        SpanSource::Turbulent(TurbSampler {
            texels,
            table: &table,
            phase: TurbPhase(17),
        })
        .draw_spans(&mut b, 64, &spans, &g);
        assert_eq!(a, b);
    }
}
