//! Screen-space texture gradients for one surface.
//!
//! `s/z`, `t/z` and `1/z` are linear in screen space, so a surface is fully
//! described by their value at pixel (0, 0) plus per-pixel steps along `u`
//! (columns) and `v` (rows).  The span drawers evaluate these at span ends and
//! divide to get perspective-correct `(s, t)`.

use glam::Vec3;

use crate::world::Camera;

/// Largest valid 16.16 coordinates on a surface that must not tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub s: i32,
    pub t: i32,
}

impl Extents {
    /// Extents for a `w`×`h` texel block (last texel, 16.16, minus one ulp).
    pub fn for_block(w: usize, h: usize) -> Self {
        Self {
            s: ((w as i32) << 16) - 1,
            t: ((h as i32) << 16) - 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gradients {
    pub sdivz_origin: f32,
    pub sdivz_step_u: f32,
    pub sdivz_step_v: f32,

    pub tdivz_origin: f32,
    pub tdivz_step_u: f32,
    pub tdivz_step_v: f32,

    pub zi_origin: f32,
    pub zi_step_u: f32,
    pub zi_step_v: f32,

    /// 16.16 offsets added after the perspective divide.
    pub s_adjust: i32,
    pub t_adjust: i32,

    /// `None` = texture tiles freely and coordinates are only wrap-masked.
    pub extents: Option<Extents>,
}

impl Gradients {
    #[inline(always)]
    pub fn sdivz(&self, u: f32, v: f32) -> f32 {
        self.sdivz_origin + v * self.sdivz_step_v + u * self.sdivz_step_u
    }

    #[inline(always)]
    pub fn tdivz(&self, u: f32, v: f32) -> f32 {
        self.tdivz_origin + v * self.tdivz_step_v + u * self.tdivz_step_u
    }

    #[inline(always)]
    pub fn zi(&self, u: f32, v: f32) -> f32 {
        self.zi_origin + v * self.zi_step_v + u * self.zi_step_u
    }

    /// Constant-depth gradients: texel `(s0 + u*ds, t0 + v*dt)` with `1/z = 1`.
    pub fn affine(s0: f32, t0: f32, ds: f32, dt: f32) -> Self {
        Self {
            sdivz_origin: s0,
            sdivz_step_u: ds,
            tdivz_origin: t0,
            tdivz_step_v: dt,
            zi_origin: 1.0,
            ..Self::default()
        }
    }

    /// Gradients for the horizontal plane `z = plane_z`, textured with world
    /// X/Y scaled by `tex_scale` texels per map unit.
    ///
    /// Only pixels where the plane is in front of the eye (`1/z > 0`) are
    /// meaningful; the caller's spans must respect the horizon.
    pub fn horizontal_plane(
        cam: &Camera,
        width: usize,
        height: usize,
        plane_z: f32,
        tex_scale: f32,
    ) -> Self {
        let focal = cam.screen_scale(width);
        let half_w = width as f32 * 0.5;
        let half_h = height as f32 * 0.5;
        let (fwd, right, up) = (cam.forward(), cam.right(), cam.up());

        // view ray through pixel (u, v) = dir0 + u*du + v*dv, forward part = 1
        let du: Vec3 = right / focal;
        let dv: Vec3 = -up / focal;
        let dir0: Vec3 = fwd - du * half_w - dv * half_h;

        let dz = plane_z - cam.pos.z;
        let zi_origin = dir0.z / dz;
        let zi_step_u = du.z / dz;
        let zi_step_v = dv.z / dz;

        let eye = cam.pos * tex_scale;
        let (dir0, du, dv) = (dir0 * tex_scale, du * tex_scale, dv * tex_scale);

        Self {
            sdivz_origin: eye.x * zi_origin + dir0.x,
            sdivz_step_u: eye.x * zi_step_u + du.x,
            sdivz_step_v: eye.x * zi_step_v + dv.x,

            tdivz_origin: eye.y * zi_origin + dir0.y,
            tdivz_step_u: eye.y * zi_step_u + du.y,
            tdivz_step_v: eye.y * zi_step_v + dv.y,

            zi_origin,
            zi_step_u,
            zi_step_v,

            s_adjust: 0,
            t_adjust: 0,
            extents: None,
        }
    }
}
