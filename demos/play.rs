use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use icethaw::{Font, FontCluster, GameManager, Input, Pixel, Pos, Sfx, SurfaceCache};
use macroquad::prelude::*;

fn window_conf() -> Conf {
    Conf {
        window_title: "icethaw".into(),
        window_width: 960,
        window_height: 640,
        ..Default::default()
    }
}

/// Logs instead of playing; audio mixing is left to the host.
struct LogSfx;

impl Sfx for LogSfx {
    fn play(&self, id: &str, volume: f32) {
        log::info!("sfx: {} ({:.1})", id, volume);
    }
}

fn pressed(input: Input) -> bool {
    match input {
        Input::Up => is_key_down(KeyCode::Up),
        Input::Down => is_key_down(KeyCode::Down),
        Input::Left => is_key_down(KeyCode::Left),
        Input::Right => is_key_down(KeyCode::Right),
        Input::Push => is_key_down(KeyCode::Z) || is_key_down(KeyCode::Space),
        Input::Menu => is_key_down(KeyCode::Escape),
        Input::Reset => is_key_down(KeyCode::R),
        Input::Cancel => is_key_down(KeyCode::X),
    }
}

fn hud(assets: &std::path::Path) -> anyhow::Result<FontCluster> {
    let font = Font::load(&assets.join("font.json"), &mut SurfaceCache::default()).context("loading HUD font")?;
    let mut hud = FontCluster::new();
    hud.add_font(font.clone(), Pos::new(1, 1), Pixel::argb(0xff, 0x20, 0x20, 0x40));
    hud.add_font(font, Pos::new(0, 0), Pixel::argb(0xff, 0xff, 0xff, 0xff));
    Ok(hud)
}

async fn run() -> anyhow::Result<()> {
    let manifest = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets/game.json"));
    let assets = manifest.parent().map(PathBuf::from).unwrap_or_default();

    let mut manager = GameManager::load(&manifest, icethaw::FileImageSource, Rc::new(LogSfx))
        .with_context(|| format!("loading {}", manifest.display()))?;
    manager.set_hud_font(hud(&assets)?);

    let mut frame = Image::gen_image_color(1, 1, BLACK);
    let mut texture = Texture2D::from_image(&frame);
    texture.set_filter(FilterMode::Nearest);

    while !manager.done() {
        if manager.take_menu_request() {
            log::info!("Menu requested, quitting");
            break;
        }

        let mut present = |buf: &[Pixel], w: u32, h: u32, _stride: usize| {
            if frame.width as u32 != w || frame.height as u32 != h {
                frame = Image::gen_image_color(w as u16, h as u16, BLACK);
            }
            for (dst, px) in frame.bytes.chunks_exact_mut(4).zip(buf) {
                dst.copy_from_slice(&[px.red() as u8, px.green() as u8, px.blue() as u8, 0xff]);
            }
        };
        manager.iterate(&pressed, &mut present)?;

        if texture.width() as u16 != frame.width || texture.height() as u16 != frame.height {
            texture = Texture2D::from_image(&frame);
            texture.set_filter(FilterMode::Nearest);
        } else {
            texture.update(&frame);
        }

        clear_background(BLACK);
        let scale = (screen_width() / frame.width as f32).min(screen_height() / frame.height as f32);
        let size = vec2(frame.width as f32, frame.height as f32) * scale;
        draw_texture_ex(
            &texture,
            (screen_width() - size.x) / 2.0,
            (screen_height() - size.y) / 2.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(size),
                ..Default::default()
            },
        );
        next_frame().await;
    }

    log::info!("Finished with {} pushes", manager.total_pushes());
    Ok(())
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        log::error!("{:#}", e);
    }
}
