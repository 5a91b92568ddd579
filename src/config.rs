//! Tunables of the software renderer.
//!
//! The binaries map their command-line flags onto [`RenderConfig`]; library
//! users build one directly or start from `Default`.

use crate::renderer::{WarpKind, WarpParams};

/// Stock sky scroll speeds in texels per second.
pub const SKY_SPEED_FAR: f32 = 8.0;
pub const SKY_SPEED_NEAR: f32 = 16.0;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub sky_speed_far: f32,
    pub sky_speed_near: f32,
    /// Indexed by [`WarpKind::index`].
    pub warps: [WarpParams; 4],
    /// Apply the full-screen underwater wobble in `end_frame`.
    pub underwater: bool,
    /// Palette index the view is cleared to every frame.
    pub clear_index: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sky_speed_far: SKY_SPEED_FAR,
            sky_speed_near: SKY_SPEED_NEAR,
            warps: WarpKind::ALL.map(WarpParams::stock),
            underwater: false,
            clear_index: 0,
        }
    }
}

impl RenderConfig {
    #[inline]
    pub fn warp(&self, kind: WarpKind) -> WarpParams {
        self.warps[kind.index()]
    }

    /// Override one liquid's warp.
    pub fn with_warp(mut self, kind: WarpKind, params: WarpParams) -> Self {
        self.warps[kind.index()] = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_stock_warps() {
        let cfg = RenderConfig::default();
        for kind in WarpKind::ALL {
            assert_eq!(cfg.warp(kind), WarpParams::stock(kind));
        }
        assert_eq!(cfg.sky_speed_far, 8.0);
    }

    #[test]
    fn override_touches_one_kind() {
        let cfg = RenderConfig::default().with_warp(WarpKind::Lava, WarpParams::new(0.0, 1.0));
        assert_eq!(cfg.warp(WarpKind::Lava), WarpParams::new(0.0, 1.0));
        assert_eq!(cfg.warp(WarpKind::Water), WarpParams::stock(WarpKind::Water));
    }
}
