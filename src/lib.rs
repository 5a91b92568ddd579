//! Quake-style software rasterization core.
//!
//! * [`model`]: frame timing for animated assets.
//! * [`renderer`]: span rasterizer, turbulence, two-layer sky.
//! * [`world`]: textures, palette and camera handed in by the engine.

pub mod config;
pub mod model;
pub mod renderer;
pub mod world;

pub use config::RenderConfig;
