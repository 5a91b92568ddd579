//! Software sky / liquid viewer.
//!
//! Builds a tiny procedural scene (scrolling sky above an endless floor with
//! water and lava strips) and pushes it through the span renderer every frame.
//!
//! Controls  W/S forward · A/D strafe · ←/→ turn · PgUp/PgDn look · U underwater · Esc quit
//!
//! Build:  cargo run --release --bin view_sw -- --width 640 --height 400

use anyhow::Context;
use clap::Parser;
use glam::Vec3;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::time::{Duration, Instant};

use yaquake_rs::{
    RenderConfig,
    model::{FrameGroup, IntervalTable},
    renderer::{
        Gradients, Renderer, Software, Span, Surface, SurfaceFlags, SurfaceTexture,
    },
    world::{Camera, Palette, Texture, TextureBank, TextureId},
};

const EYE_HEIGHT: f32 = 48.0;
const MOVE_SPEED: f32 = 160.0; // map units / s
const TURN_SPEED: f32 = 1.8; // rad / s
const TEX_SCALE: f32 = 0.5; // texels per map unit
const FAR_CLIP: f32 = 4096.0; // floor rows further than this are left to the sky

#[derive(Parser, Debug)]
#[command(about = "Scrolling sky and turbulent liquids on the software span renderer")]
struct Args {
    #[arg(long, default_value_t = 640)]
    width: usize,
    #[arg(long, default_value_t = 400)]
    height: usize,
    /// Horizontal field of view in degrees.
    #[arg(long, default_value_t = 90.0)]
    fov: f32,
    /// Far sky layer speed (texels / s).
    #[arg(long, default_value_t = yaquake_rs::config::SKY_SPEED_FAR)]
    sky_far: f32,
    /// Cloud layer speed (texels / s).
    #[arg(long, default_value_t = yaquake_rs::config::SKY_SPEED_NEAR)]
    sky_near: f32,
    /// Start with the underwater screen warp on.
    #[arg(long)]
    underwater: bool,
}

struct Scene {
    floor: SurfaceTexture,
    water: TextureId,
    lava: TextureId,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let (w, h) = (args.width, args.height);

    let mut bank = TextureBank::default_with_checker();
    bank.set_palette(demo_palette());
    let scene = build_textures(&mut bank)?;

    let config = RenderConfig {
        sky_speed_far: args.sky_far,
        sky_speed_near: args.sky_near,
        underwater: args.underwater,
        ..RenderConfig::default()
    };
    let mut renderer = Software::new(config);
    renderer.set_palette(bank.palette().clone());
    renderer
        .set_sky(&sky_texture()?)
        .context("installing sky texture")?;

    let mut camera = Camera::new(
        Vec3::new(0.0, 0.0, EYE_HEIGHT),
        0.0,
        args.fov.to_radians(),
    );

    let mut win = Window::new("Quake Software Sky", w, h, WindowOptions::default())?;
    win.set_target_fps(60);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();
    let mut last_frame = Instant::now();
    let mut underwater = args.underwater;

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();

        /* movement --------------------------------------------------------- */
        let mut fwd = 0.0;
        let mut side = 0.0;
        if win.is_key_down(Key::W) || win.is_key_down(Key::Up) {
            fwd += 1.0;
        }
        if win.is_key_down(Key::S) || win.is_key_down(Key::Down) {
            fwd -= 1.0;
        }
        if win.is_key_down(Key::A) {
            side -= 1.0;
        }
        if win.is_key_down(Key::D) {
            side += 1.0;
        }
        if win.is_key_down(Key::Left) {
            camera.turn(TURN_SPEED * dt);
        }
        if win.is_key_down(Key::Right) {
            camera.turn(-TURN_SPEED * dt);
        }
        if win.is_key_down(Key::PageUp) {
            camera.look(TURN_SPEED * 0.5 * dt);
        }
        if win.is_key_down(Key::PageDown) {
            camera.look(-TURN_SPEED * 0.5 * dt);
        }
        if win.is_key_pressed(Key::U, KeyRepeat::No) {
            underwater = !underwater;
            renderer.set_underwater(underwater);
            log::info!("underwater warp {}", if underwater { "on" } else { "off" });
        }
        camera.step(fwd * MOVE_SPEED * dt, side * MOVE_SPEED * dt);

        /* draw ------------------------------------------------------------- */
        let t0 = Instant::now();
        renderer.begin_frame(w, h, dt);
        for surf in build_surfaces(&scene, &camera, w, h) {
            renderer.draw_surface(&surf, &bank, &camera);
        }
        let mut present = Ok(());
        renderer.end_frame(|fb, fw, fh| {
            acc_time += t0.elapsed();
            acc_frames += 1;
            present = win.update_with_buffer(fb, fw, fh);
        });
        present?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            log::info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/// Sky above the horizon; below it three floor strips: stone, water, lava.
fn build_surfaces(scene: &Scene, cam: &Camera, w: usize, h: usize) -> Vec<Surface> {
    let floor = Gradients::horizontal_plane(cam, w, h, 0.0, TEX_SCALE);

    // the floor's 1/z depends on the row only (no roll), so the horizon is a row
    let horizon = (0..h as i32)
        .find(|&v| floor.zi(0.0, v as f32) > 1.0 / FAR_CLIP)
        .unwrap_or(h as i32);

    let rows = |x0: usize, x1: usize, v0: i32, v1: i32| -> smallvec::SmallVec<[Span; 8]> {
        (v0..v1)
            .filter(|_| x1 > x0)
            .map(|v| Span::new(x0 as i32, v, (x1 - x0) as i32))
            .collect()
    };

    let sky_grad = Gradients {
        zi_origin: 1.0 / 8192.0,
        ..Gradients::default()
    };
    let third = w / 3;

    vec![
        Surface {
            texture: SurfaceTexture::Static(0),
            flags: SurfaceFlags::SKY,
            gradients: sky_grad,
            spans: rows(0, w, 0, horizon),
        },
        Surface {
            texture: scene.floor.clone(),
            flags: SurfaceFlags::empty(),
            gradients: floor,
            spans: rows(0, third, horizon, h as i32),
        },
        Surface {
            texture: SurfaceTexture::Static(scene.water),
            flags: SurfaceFlags::TURB,
            gradients: floor,
            spans: rows(third, 2 * third, horizon, h as i32),
        },
        Surface {
            texture: SurfaceTexture::Static(scene.lava),
            flags: SurfaceFlags::TURB | SurfaceFlags::LAVA,
            gradients: floor,
            spans: rows(2 * third, w, horizon, h as i32),
        },
    ]
}

/*──────────────────────── procedural assets ────────────────────────*/

/// 0‥63 grey, 64‥127 blue, 128‥191 lava, 192‥255 cloud white.
fn demo_palette() -> Palette {
    let mut pal = Palette::default();
    for i in 0..64u32 {
        let k = i * 4;
        pal[i as usize] = k << 16 | k << 8 | k;
        pal[64 + i as usize] = (k / 4) << 16 | (k / 2) << 8 | (96 + k * 5 / 8);
        pal[128 + i as usize] = (160 + k * 3 / 8) << 16 | (k * 3 / 4) << 8 | (k / 8);
        pal[192 + i as usize] = (192 + k / 4) << 16 | (192 + k / 4) << 8 | (200 + k / 5);
    }
    pal
}

fn hash(x: usize, y: usize) -> u32 {
    let mut v = (x as u32).wrapping_mul(0x9E37_79B1) ^ (y as u32).wrapping_mul(0x85EB_CA77);
    v ^= v >> 15;
    v.wrapping_mul(0xC2B2_AE3D) >> 16
}

fn build_textures(bank: &mut TextureBank) -> anyhow::Result<Scene> {
    let checker = |name: &str, a: u8, b: u8| {
        Texture::from_fn(name, 64, 64, move |x, y| {
            let base = if ((x / 16) ^ (y / 16)) & 1 == 0 { a } else { b };
            base + (hash(x, y) & 3) as u8
        })
    };
    let floor_a = bank.insert("FLOOR_A", checker("FLOOR_A", 20, 36)?)?;
    let floor_b = bank.insert("FLOOR_B", checker("FLOOR_B", 24, 40)?)?;

    let water = Texture::from_fn("*WATER", 64, 64, |x, y| {
        let ripple = ((x * 2 + y) ^ (y * 3)) & 31;
        64 + 16 + ripple as u8
    })?;
    let lava = Texture::from_fn("*LAVA", 64, 64, |x, y| {
        128 + ((hash(x / 4, y / 4) & 31) + ((x ^ y) & 15) as u32) as u8
    })?;

    let floor = SurfaceTexture::Animated(FrameGroup::new(
        vec![floor_a, floor_b],
        IntervalTable::from_durations(&[1.2, 0.4])?,
    )?);

    Ok(Scene {
        floor,
        water: bank.insert("*WATER", water)?,
        lava: bank.insert("*LAVA", lava)?,
    })
}

/// Right half: deep-blue far sky. Left half: clouds, 0 = see-through.
fn sky_texture() -> anyhow::Result<Texture> {
    Ok(Texture::from_fn("SKY1", 256, 128, |x, y| {
        if x >= 128 {
            64 + (y / 4) as u8 + (hash(x, y) & 3) as u8
        } else {
            let blob = hash(x / 8, y / 8) & 255;
            if blob > 150 {
                192 + ((blob - 150) / 2).min(63) as u8
            } else {
                0
            }
        }
    })?)
}
