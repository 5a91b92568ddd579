//! Depth spans: `1/z` in 1.15 fixed point, one `i16` per pixel.
//!
//! Larger values are closer.  Sprites and models test against this buffer,
//! world surfaces only write it.

use super::{gradients::Gradients, span::Span};

/// Scale from `1/z` to the 16.16 accumulator whose top half is stored.
const ZI_SCALE: f64 = 0x8000 as f64 * 0x10000 as f64;

/// Write `1/z` for every pixel of `spans` into `zbuffer` (`stride` wide).
pub fn draw_z_spans(zbuffer: &mut [i16], stride: usize, spans: &[Span], grad: &Gradients) {
    let izistep = (grad.zi_step_u as f64 * ZI_SCALE) as i32;

    for span in spans {
        let row = &mut zbuffer[span.offset(stride)..][..span.count as usize];

        let zi = grad.zi(span.u as f32, span.v as f32) as f64;
        let mut izi = (zi * ZI_SCALE) as i32;
        for px in row {
            *px = (izi >> 16) as i16;
            izi = izi.wrapping_add(izistep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_only_span_pixels() {
        let mut zb = vec![-1i16; 16 * 4];
        let g = Gradients {
            zi_origin: 0.5,
            ..Gradients::default()
        };
        draw_z_spans(&mut zb, 16, &[Span::new(2, 1, 5), Span::new(0, 3, 1)], &g);

        for (i, &z) in zb.iter().enumerate() {
            let (x, y) = (i % 16, i / 16);
            let inside = (y == 1 && (2..7).contains(&x)) || (y == 3 && x == 0);
            if inside {
                assert_eq!(z, 0x4000, "({x},{y})");
            } else {
                assert_eq!(z, -1, "({x},{y})");
            }
        }
    }

    #[test]
    fn depth_follows_gradient() {
        let mut zb = vec![0i16; 8];
        let g = Gradients {
            zi_origin: 0.25,
            zi_step_u: 1.0 / 64.0,
            ..Gradients::default()
        };
        draw_z_spans(&mut zb, 8, &[Span::new(0, 0, 8)], &g);
        assert!(zb.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(zb[0], 0x2000);
    }
}
