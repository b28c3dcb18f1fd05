/// Software rasterizer: executes paint commands into an RGBA buffer

use crate::rendering::font::{self, CELL_WIDTH, GLYPH_COLUMNS, GLYPH_ROWS};
use crate::rendering::paint::{self, PaintCommand};
use crate::rendering::{Bitmap, FaceLayout, Rasterizer, RenderOptions};
use crate::{Error, Result};
use image::{imageops, Rgba, RgbaImage};
use log::debug;
use std::path::Path;

/// Pure-Rust [`Rasterizer`] with a built-in bitmap font.
#[derive(Debug, Clone, Default)]
pub struct SoftwareRasterizer;

impl SoftwareRasterizer {
    pub fn new() -> Self {
        SoftwareRasterizer
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn render(&self, layout: &FaceLayout, options: &RenderOptions) -> Result<Bitmap> {
        if !(options.scale.is_finite() && options.scale > 0.0) {
            return Err(Error::Render(format!("invalid scale {}", options.scale)));
        }
        let (width, height) = layout.device_size(options.scale);
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(options.background.rgba()));

        let commands = paint::display_list(layout, options.scale)?;
        debug!(
            "rasterizing {} face at {}x{} ({} commands)",
            layout.face,
            width,
            height,
            commands.len()
        );
        for cmd in &commands {
            draw(&mut canvas, cmd)?;
        }
        Bitmap::from_rgba(&canvas)
    }
}

fn draw(canvas: &mut RgbaImage, cmd: &PaintCommand) -> Result<()> {
    match cmd {
        PaintCommand::SolidRect { x, y, width, height, rgba } => {
            fill_rect(canvas, *x, *y, *width as i32, *height as i32, *rgba);
        }
        PaintCommand::RoundedRect { x, y, width, height, radius, rgba } => {
            fill_rounded_rect(canvas, *x, *y, *width, *height, *radius, *rgba);
        }
        PaintCommand::Text { x, y, dot, bold, text } => draw_text(canvas, *x, *y, *dot, *bold, text),
        PaintCommand::QrModules { x, y, module, size, modules } => {
            for (i, dark) in modules.iter().enumerate() {
                if !*dark {
                    continue;
                }
                let (row, col) = (i / size, i % size);
                fill_span(canvas, x + col as f32 * module, y + row as f32 * module, *module, *module);
            }
        }
        PaintCommand::Image { x, y, width, height, path } => {
            draw_image(canvas, *x, *y, *width, *height, path)?;
        }
    }
    Ok(())
}

fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, rgba: (u8, u8, u8, u8)) {
    if width <= 0 || height <= 0 {
        return;
    }
    let x0 = x.clamp(0, canvas.width() as i32);
    let y0 = y.clamp(0, canvas.height() as i32);
    let x1 = (x + width).clamp(0, canvas.width() as i32);
    let y1 = (y + height).clamp(0, canvas.height() as i32);
    let px = Rgba([rgba.0, rgba.1, rgba.2, rgba.3]);
    for yy in y0..y1 {
        for xx in x0..x1 {
            canvas.put_pixel(xx as u32, yy as u32, px);
        }
    }
}

/// Fill with black ink over a fractional span, snapping edges to whole pixels
/// so neighbouring dots tile without gaps.
fn fill_span(canvas: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32) {
    let x0 = x.round() as i32;
    let y0 = y.round() as i32;
    let x1 = (x + w).round() as i32;
    let y1 = (y + h).round() as i32;
    fill_rect(canvas, x0, y0, (x1 - x0).max(1), (y1 - y0).max(1), (0, 0, 0, 255));
}

fn fill_rounded_rect(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    radius: u32,
    rgba: (u8, u8, u8, u8),
) {
    let r = radius.min(width / 2).min(height / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    let px = Rgba([rgba.0, rgba.1, rgba.2, rgba.3]);
    for yy in 0..h {
        for xx in 0..w {
            // Distance from the nearest corner centre, only relevant inside a corner square.
            let cx = if xx < r { r - xx } else if xx >= w - r { xx - (w - r - 1) } else { 0 };
            let cy = if yy < r { r - yy } else if yy >= h - r { yy - (h - r - 1) } else { 0 };
            if cx > 0 && cy > 0 && (cx - 1) * (cx - 1) + (cy - 1) * (cy - 1) > r * r {
                continue;
            }
            let (px_x, px_y) = (x + xx, y + yy);
            if px_x >= 0 && px_y >= 0 && (px_x as u32) < canvas.width() && (px_y as u32) < canvas.height() {
                canvas.put_pixel(px_x as u32, px_y as u32, px);
            }
        }
    }
}

fn draw_text(canvas: &mut RgbaImage, x: f32, y: f32, dot: f32, bold: bool, text: &str) {
    let mut pen_x = x;
    for c in text.chars() {
        let columns = font::glyph(c);
        for (col, bits) in columns.iter().enumerate().take(GLYPH_COLUMNS) {
            for row in 0..GLYPH_ROWS {
                if (bits >> row) & 1 == 0 {
                    continue;
                }
                let dx = pen_x + col as f32 * dot;
                let dy = y + row as f32 * dot;
                fill_span(canvas, dx, dy, dot, dot);
                if bold {
                    fill_span(canvas, dx + dot * 0.5, dy, dot, dot);
                }
            }
        }
        pen_x += CELL_WIDTH as f32 * dot;
    }
}

fn draw_image(canvas: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, path: &Path) -> Result<()> {
    let img = image::open(path)
        .map_err(|e| Error::AssetLoad(format!("{}: {}", path.display(), e)))?
        .to_rgba8();
    if img.width() == 0 || img.height() == 0 || width == 0 || height == 0 {
        return Ok(());
    }
    // Fit inside the box, anchored to its top-right corner.
    let ratio = (width as f32 / img.width() as f32).min(height as f32 / img.height() as f32);
    let w = ((img.width() as f32 * ratio).round() as u32).max(1);
    let h = ((img.height() as f32 * ratio).round() as u32).max(1);
    let scaled = imageops::resize(&img, w, h, imageops::FilterType::Triangle);
    let left = x as i64 + width.saturating_sub(w) as i64;
    imageops::overlay(canvas, &scaled, left, y as i64);
    Ok(())
}
