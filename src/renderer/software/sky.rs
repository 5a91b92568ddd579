//! ----------------------------------------------------------------------------
//!  Two-layer scrolling sky
//!
//!  ▸ A sky texture is 256×128: the right half is the far, opaque layer, the
//!    left half is the near cloud layer where texel 0 means "see through".
//!  ▸ Once per frame both layers scroll by their own phase and get merged into
//!    a 256-wide composite: scrolled far layer in columns 0‥128, clouds over
//!    far layer in columns 128‥256.  Span drawers read the merged band.
//!  ▸ Sky spans map every screen pixel to a direction through the camera
//!    basis, so the sky stays at infinity while the view turns.
//! ----------------------------------------------------------------------------

use glam::Vec3;
use thiserror::Error;

use super::{
    fixed::Fixed16,
    span::{Span, SpanRun, draw_run},
};
use crate::world::{Camera, Palette, Texture};

pub const SKY_SIZE: usize = 128;
const SKY_MASK: usize = SKY_SIZE - 1;
/// Composite scan width: the low-level drawers assume 256-texel rows.
pub const SKY_SCAN: usize = SKY_SIZE * 2;
/// Layer stride: three wrap columns so a 4-texel read never straddles the seam.
pub const LAYER_STRIDE: usize = SKY_SIZE + 3;

/// Sky spans are re-projected every 32 pixels.
const SKY_SPAN_SHIFT: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkyError {
    #[error("sky texture `{name}` is {w}x{h}, expected 256x128")]
    BadSize { name: String, w: usize, h: usize },
}

/// Both sky layers, their scroll phases and the per-frame composite.
pub struct SkyLayers {
    far: Vec<u8>,
    near: Vec<u8>,
    /// 0xFF where the near layer is transparent, 0x00 where it is opaque.
    near_mask: Vec<u8>,
    composite: Vec<u8>,

    speed_far: f32,
    speed_near: f32,
    phase_far: f32,
    phase_near: f32,

    /// Integer shifts the composite was last built with.
    built: Option<(usize, usize)>,
    made: bool,
}

impl SkyLayers {
    /// Split a 256×128 sky texture into its layers.
    pub fn from_texture(tex: &Texture, speed_far: f32, speed_near: f32) -> Result<Self, SkyError> {
        if tex.w != SKY_SCAN || tex.h != SKY_SIZE {
            return Err(SkyError::BadSize {
                name: tex.name.clone(),
                w: tex.w,
                h: tex.h,
            });
        }

        let mut far = vec![0u8; SKY_SIZE * LAYER_STRIDE];
        let mut near = vec![0u8; SKY_SIZE * LAYER_STRIDE];
        let mut near_mask = vec![0u8; SKY_SIZE * LAYER_STRIDE];

        for y in 0..SKY_SIZE {
            let src = &tex.pixels[y * SKY_SCAN..][..SKY_SCAN];
            for x in 0..LAYER_STRIDE {
                let i = y * LAYER_STRIDE + x;
                far[i] = src[SKY_SIZE + (x & SKY_MASK)];
                let cloud = src[x & SKY_MASK];
                near[i] = cloud;
                near_mask[i] = if cloud == 0 { 0xFF } else { 0x00 };
            }
        }

        log::debug!(
            "sky `{}` initialised (far speed {speed_far}, near speed {speed_near})",
            tex.name
        );

        Ok(Self {
            far,
            near,
            near_mask,
            composite: vec![0u8; SKY_SIZE * SKY_SCAN],
            speed_far,
            speed_near,
            phase_far: 0.0,
            phase_near: 0.0,
            built: None,
            made: false,
        })
    }

    /// Frame boundary: the next [`update`](Self::update) may rebuild again.
    #[inline]
    pub fn new_frame(&mut self) {
        self.made = false;
    }

    #[inline]
    pub fn is_made(&self) -> bool {
        self.made
    }

    #[inline]
    pub fn phases(&self) -> (f32, f32) {
        (self.phase_far, self.phase_near)
    }

    /// Composite buffer, `SKY_SIZE` rows of `SKY_SCAN` texels.
    #[inline]
    pub fn composite(&self) -> &[u8] {
        &self.composite
    }

    /// Advance both phases by `elapsed` seconds and rebuild the composite.
    ///
    /// Does nothing if the sky was already made this frame.  Returns `true`
    /// when the composite was rewritten.
    pub fn update(&mut self, elapsed: f32) -> bool {
        if self.made {
            return false;
        }
        self.phase_far = (self.phase_far + elapsed * self.speed_far).rem_euclid(SKY_SIZE as f32);
        self.phase_near =
            (self.phase_near + elapsed * self.speed_near).rem_euclid(SKY_SIZE as f32);
        self.made = true;
        self.rebuild()
    }

    /// Set both phases from an absolute clock instead of accumulating.
    ///
    /// The scroll then depends on the clock alone, not on which frames the
    /// sky happened to be drawn.  With whole-number speeds the clock is first
    /// reduced modulo the period after which both layers are back at zero.
    /// Like [`update`](Self::update), does nothing if already made this frame.
    pub fn sync_to_time(&mut self, time: f64) -> bool {
        if self.made {
            return false;
        }
        let time = match common_period(self.speed_far, self.speed_near) {
            Some(p) => time - (time / p).trunc() * p,
            None => time,
        };
        let wrap = |speed: f32| (time * speed as f64).rem_euclid(SKY_SIZE as f64) as f32;
        self.phase_far = wrap(self.speed_far);
        self.phase_near = wrap(self.speed_near);
        self.made = true;
        self.rebuild()
    }

    fn shifts(&self) -> (usize, usize) {
        (
            self.phase_far as usize & SKY_MASK,
            self.phase_near as usize & SKY_MASK,
        )
    }

    fn rebuild(&mut self) -> bool {
        let shifts = self.shifts();
        if self.built == Some(shifts) {
            return false;
        }
        self.built = Some(shifts);
        let (far_shift, near_shift) = shifts;

        for (y, row) in self.composite.chunks_exact_mut(SKY_SCAN).enumerate() {
            let far_row = ((y + far_shift) & SKY_MASK) * LAYER_STRIDE;
            let near_row = ((y + near_shift) & SKY_MASK) * LAYER_STRIDE;
            let (back, front) = row.split_at_mut(SKY_SIZE);

            for x in (0..SKY_SIZE).step_by(4) {
                let f = far_row + ((x + far_shift) & SKY_MASK);
                let n = near_row + ((x + near_shift) & SKY_MASK);

                let far4 = quad(&self.far, f);
                let near4 = quad(&self.near, n);
                let mask4 = quad(&self.near_mask, n);

                back[x..x + 4].copy_from_slice(&far4.to_ne_bytes());
                front[x..x + 4].copy_from_slice(&((far4 & mask4) | near4).to_ne_bytes());
            }
        }
        true
    }

    /// Write the merged 128×128 tile into `dest` (palette indices).
    pub fn gen_tile(&self, dest: &mut [u8]) {
        for (row, out) in self
            .composite
            .chunks_exact(SKY_SCAN)
            .zip(dest.chunks_exact_mut(SKY_SIZE))
        {
            out.copy_from_slice(&row[SKY_SIZE..]);
        }
    }

    /// Write the merged tile through `palette` as `0x00RRGGBB`.
    pub fn gen_tile_rgb(&self, palette: &Palette, dest: &mut [u32]) {
        for (row, out) in self
            .composite
            .chunks_exact(SKY_SCAN)
            .zip(dest.chunks_exact_mut(SKY_SIZE))
        {
            for (px, &idx) in out.iter_mut().zip(&row[SKY_SIZE..]) {
                *px = palette[idx as usize];
            }
        }
    }

    /// Merged texel for wrapped 16.16 sky coordinates.
    #[inline(always)]
    pub fn fetch(&self, s: Fixed16, t: Fixed16) -> u8 {
        self.composite[(t.texel(SKY_MASK as i32) * SKY_SCAN) + SKY_SIZE + s.texel(SKY_MASK as i32)]
    }
}

#[inline(always)]
fn quad(buf: &[u8], at: usize) -> u32 {
    u32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Time after which both layers return to phase zero, if speeds are whole.
fn common_period(speed_a: f32, speed_b: f32) -> Option<f64> {
    let whole = |s: f32| s > 0.0 && s.fract() == 0.0 && s < u16::MAX as f32;
    if !whole(speed_a) || !whole(speed_b) {
        return None;
    }
    let (a, b) = (speed_a as u32, speed_b as u32);
    // time * a and time * b are both multiples of SKY_SIZE at SKY_SIZE / gcd
    Some(SKY_SIZE as f64 / gcd(a, b) as f64)
}

/*──────────────────────── sky span projection ────────────────────────*/

/// Camera basis and viewport needed to map screen pixels to sky texels.
#[derive(Clone, Copy, Debug)]
pub struct SkyProjection {
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    half_w: f32,
    half_h: f32,
    inv_extent: f32,
}

impl SkyProjection {
    pub fn new(cam: &Camera, width: usize, height: usize) -> Self {
        Self {
            forward: cam.forward(),
            right: cam.right(),
            up: cam.up(),
            half_w: (width / 2) as f32,
            half_h: (height / 2) as f32,
            inv_extent: 1.0 / width.max(height).max(1) as f32,
        }
    }

    /// Sky texel coordinates seen through pixel `(u, v)`.
    pub fn uv_to_st(&self, u: i32, v: i32) -> (Fixed16, Fixed16) {
        let wu = 8192.0 * (u as f32 - self.half_w) * self.inv_extent;
        let wv = 8192.0 * (self.half_h - v as f32) * self.inv_extent;

        let mut end = self.forward * 4096.0 + self.right * wu + self.up * wv;
        end.z *= 3.0;
        let end = end.normalize_or_zero();

        let reach = (6 * (SKY_SIZE / 2 - 1)) as f32;
        (
            Fixed16::from_f32(reach * end.x),
            Fixed16::from_f32(reach * end.y),
        )
    }

    /// Draw `span` from the merged band of `sky` into its row of `dest`.
    pub fn draw_span(&self, sky: &SkyLayers, dest: &mut [u8], stride: usize, span: &Span) {
        let chunk_max = 1i32 << SKY_SPAN_SHIFT;
        let row = &mut dest[span.offset(stride)..][..span.count as usize];

        let mut u = span.u;
        let (mut s, mut t) = self.uv_to_st(u, span.v);
        let mut remaining = span.count;
        let mut ofs = 0usize;

        while remaining > 0 {
            let count = remaining.min(chunk_max);
            remaining -= count;

            let (snext, tnext, sstep, tstep) = if remaining > 0 {
                u += count;
                let (sn, tn) = self.uv_to_st(u, span.v);
                (
                    sn,
                    tn,
                    Fixed16((sn - s).0 >> SKY_SPAN_SHIFT),
                    Fixed16((tn - t).0 >> SKY_SPAN_SHIFT),
                )
            } else if count > 1 {
                u += count - 1;
                let (sn, tn) = self.uv_to_st(u, span.v);
                (
                    sn,
                    tn,
                    Fixed16((sn - s).0 / (count - 1)),
                    Fixed16((tn - t).0 / (count - 1)),
                )
            } else {
                (s, t, Fixed16::ZERO, Fixed16::ZERO)
            };

            let run = SpanRun {
                s,
                t,
                sstep,
                tstep,
                count: count as usize,
            };
            draw_run(&mut row[ofs..], &run, |s, t| sky.fetch(s, t));

            ofs += count as usize;
            s = snext;
            t = tnext;
        }
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    /// Far half: value = 100 + (x + y) % 50 (never 0).
    /// Near half: clouds (value 200 + x % 40) on every third column, else 0.
    fn sky_tex() -> Texture {
        Texture::from_fn("SKY", 256, 128, |x, y| {
            if x >= 128 {
                (100 + (x - 128 + y) % 50) as u8
            } else if x % 3 == 0 {
                (200 + x % 40) as u8
            } else {
                0
            }
        })
        .unwrap()
    }

    fn sky() -> SkyLayers {
        SkyLayers::from_texture(&sky_tex(), 8.0, 16.0).unwrap()
    }

    #[test]
    fn rejects_wrong_size() {
        let tex = Texture::from_fn("SMALL", 128, 128, |_, _| 1).unwrap();
        assert!(matches!(
            SkyLayers::from_texture(&tex, 8.0, 16.0),
            Err(SkyError::BadSize { w: 128, h: 128, .. })
        ));
    }

    #[test]
    fn unscrolled_far_band_is_far_layer() {
        let tex = sky_tex();
        let mut sky = sky();
        assert!(sky.update(0.0));
        let comp = sky.composite();
        for y in [0usize, 1, 77] {
            for x in 0..SKY_SIZE {
                assert_eq!(comp[y * SKY_SCAN + x], tex.texel(128 + x, y), "({x},{y})");
            }
        }
    }

    #[test]
    fn opaque_clouds_override_far_layer() {
        let tex = sky_tex();
        let mut sky = sky();
        sky.update(0.0);
        let comp = sky.composite();
        for y in 0..SKY_SIZE {
            for x in 0..SKY_SIZE {
                let cloud = tex.texel(x, y);
                let merged = comp[y * SKY_SCAN + SKY_SIZE + x];
                if cloud != 0 {
                    assert_eq!(merged, cloud);
                } else {
                    assert_eq!(merged, comp[y * SKY_SCAN + x]);
                }
            }
        }
    }

    #[test]
    fn layers_scroll_independently() {
        let tex = sky_tex();
        let mut sky = sky();
        // far moves 8 texels, near 16
        sky.update(1.0);
        assert_eq!(sky.phases(), (8.0, 16.0));
        let comp = sky.composite();
        let (y, x) = (5usize, 10usize);
        assert_eq!(comp[y * SKY_SCAN + x], tex.texel(128 + x + 8, y + 8));
        let cloud = tex.texel(x + 16, y + 16);
        if cloud != 0 {
            assert_eq!(comp[y * SKY_SCAN + SKY_SIZE + x], cloud);
        }
    }

    #[test]
    fn update_is_idempotent_within_a_frame() {
        let mut sky = sky();
        assert!(sky.update(0.5));
        let snapshot = sky.composite().to_vec();
        let phases = sky.phases();

        assert!(!sky.update(0.5));
        assert_eq!(sky.composite(), &snapshot[..]);
        assert_eq!(sky.phases(), phases);

        sky.new_frame();
        assert!(sky.update(0.5));
        assert_ne!(sky.phases(), phases);
    }

    #[test]
    fn phases_stay_bounded() {
        let mut sky = sky();
        for _ in 0..10_000 {
            sky.new_frame();
            sky.update(0.37);
        }
        let (f, n) = sky.phases();
        assert!((0.0..SKY_SIZE as f32).contains(&f));
        assert!((0.0..SKY_SIZE as f32).contains(&n));
    }

    #[test]
    fn deterministic_for_same_history() {
        let mut a = sky();
        let mut b = sky();
        for dt in [0.016, 0.02, 0.5, 0.033] {
            a.new_frame();
            b.new_frame();
            a.update(dt);
            b.update(dt);
        }
        assert_eq!(a.composite(), b.composite());
    }

    #[test]
    fn synced_clock_repeats_every_period() {
        assert_eq!(common_period(8.0, 16.0), Some(128.0 / 8.0));
        assert_eq!(common_period(8.0, 2.5), None);

        let mut a = sky();
        let mut b = sky();
        a.sync_to_time(3.0);
        b.sync_to_time(3.0 + 16.0 * 4.0);
        assert_eq!(a.phases(), b.phases());
        assert_eq!(a.composite(), b.composite());
    }

    #[test]
    fn synced_clock_is_made_once_per_frame() {
        let mut sky = sky();
        assert!(sky.sync_to_time(1.0));
        assert!(!sky.sync_to_time(5.0));
        assert_eq!(sky.phases(), (8.0, 16.0));

        sky.new_frame();
        assert!(sky.sync_to_time(5.0));
        assert_eq!(sky.phases(), (40.0, 80.0));
    }

    #[test]
    fn tile_is_the_merged_band() {
        let mut sky = sky();
        sky.update(2.25);
        let mut tile = vec![0u8; SKY_SIZE * SKY_SIZE];
        sky.gen_tile(&mut tile);
        for y in 0..SKY_SIZE {
            assert_eq!(
                &tile[y * SKY_SIZE..][..SKY_SIZE],
                &sky.composite()[y * SKY_SCAN + SKY_SIZE..][..SKY_SIZE]
            );
        }

        let mut rgb = vec![0u32; SKY_SIZE * SKY_SIZE];
        sky.gen_tile_rgb(&Palette::grey(), &mut rgb);
        assert_eq!(rgb[0], Palette::grey()[tile[0] as usize]);
    }

    #[test]
    fn sky_span_stays_inside_its_row() {
        let mut sky = sky();
        sky.update(0.0);
        let cam = Camera::new(Vec3::ZERO, 0.7, FRAC_PI_2);
        let proj = SkyProjection::new(&cam, 100, 20);

        let mut dest = vec![0u8; 100 * 20];
        let span = Span::new(3, 4, 90);
        proj.draw_span(&sky, &mut dest, 100, &span);

        for (i, &p) in dest.iter().enumerate() {
            let (x, y) = (i % 100, i / 100);
            let inside = y == 4 && (3..93).contains(&x);
            if inside {
                assert_ne!(p, 0, "sky pixel ({x},{y}) left blank");
            } else {
                assert_eq!(p, 0, "pixel ({x},{y}) written outside span");
            }
        }
    }
}
