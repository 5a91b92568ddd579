use glam::Vec3;

/// Player view-point in world space.
///
/// * Z is up, like Quake maps.
/// * `yaw` turns around Z, `pitch` tilts the view up (+) or down (−).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec3,  // eye position in map-units
    pub yaw: f32,   // radians (0 = +X, counter-clockwise)
    pub pitch: f32, // radians, clamped to ±89°
    fov: f32,       // horizontal FoV (radians, typical 90–110°)
}

const PITCH_LIMIT: f32 = 89.0_f32 * std::f32::consts::PI / 180.0;

impl Camera {
    /// Create a new camera at `pos`, facing `yaw`, with horizontal FoV `fov`.
    pub fn new(pos: Vec3, yaw: f32, fov: f32) -> Self {
        Self {
            pos,
            yaw,
            pitch: 0.0,
            fov,
        }
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks.
    #[inline(always)]
    pub fn forward(self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(cy * cp, sy * cp, sp)
    }

    /// Unit vector pointing to the camera's right, always horizontal.
    #[inline(always)]
    pub fn right(self) -> Vec3 {
        let (s, c) = self.yaw.sin_cos();
        Vec3::new(s, -c, 0.0)
    }

    /// Screen-up vector, perpendicular to both `forward` and `right`.
    #[inline(always)]
    pub fn up(self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` units and `side` (strafe) on the horizontal plane.
    pub fn step(&mut self, forward: f32, side: f32) {
        let (s, c) = self.yaw.sin_cos();
        let r = self.right();
        self.pos.x += c * forward + r.x * side;
        self.pos.y += s * forward + r.y * side;
    }

    /// Rotate around Z-axis (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
    }

    /// Tilt the view, clamped short of straight up/down.
    pub fn look(&mut self, delta_pitch: f32) {
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /*───────────────── projection helpers ─────────────────*/

    /// Pixel-per-map-unit scale for viewport width `w`.
    ///
    /// ```text
    /// focal = w / (2 * tan(fov/2))
    /// ```
    #[inline]
    pub fn screen_scale(self, w: usize) -> f32 {
        (w as f32) * 0.5 / (self.fov * 0.5).tan()
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn basis_is_orthonormal() {
        let mut cam = Camera::new(Vec3::ZERO, 0.3, 1.57);
        cam.look(0.4);
        let (f, r, u) = (cam.forward(), cam.right(), cam.up());
        for v in [f, r, u] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(f.dot(r).abs() < 1e-5);
        assert!(f.dot(u).abs() < 1e-5);
        assert!(r.dot(u).abs() < 1e-5);
    }

    #[test]
    fn level_view_has_z_up() {
        let cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        assert!((cam.forward() - Vec3::X).length() < 1e-5);
        assert!((cam.right() - Vec3::NEG_Y).length() < 1e-5);
        assert!((cam.up() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn screen_scale_at_90_deg() {
        let cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        assert!((cam.screen_scale(640) - 320.0).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        cam.look(10.0);
        assert!(cam.pitch < FRAC_PI_2);
        assert!(cam.forward().z < 1.0);
    }
}
