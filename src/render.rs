//! Rasterizes the canvas into a plain RGBA bitmap for saving and printing.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use eframe::egui::{pos2, vec2, Pos2, Vec2};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::canvas::Canvas;
use crate::error::{MemeError, Result};
use crate::overlay::{Overlay, TextMeasure};
use crate::settings::OUTLINE_WIDTH;

const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// The font captions are drawn with, shared by on-screen layout and export.
///
/// This is the proportional face egui ships with, so both sides agree on metrics.
#[derive(Clone)]
pub struct CaptionFont {
    font: FontArc,
}

impl CaptionFont {
    pub fn new() -> Result<Self> {
        let font = FontArc::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT).map_err(|_| MemeError::Font)?;
        Ok(Self { font })
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }
}

impl TextMeasure for CaptionFont {
    fn measure(&self, text: &str, font_size: u32) -> Vec2 {
        let scale = PxScale::from(font_size as f32);
        let (width, _) = text_size(scale, &self.font, text);
        let line_height = self.font.as_scaled(scale).height().ceil();
        vec2(width as f32, line_height)
    }
}

/// Top-left corner of the caption text inside its overlay; text is centered horizontally.
pub fn text_origin(overlay: &Overlay) -> Pos2 {
    let rect = overlay.rect();
    let text = overlay.intrinsic_size();
    pos2(
        rect.min.x + (rect.width() - text.x) / 2.0,
        rect.min.y + (rect.height() - text.y) / 2.0,
    )
}

/// Paints the background (at its on-screen size) and every caption, back to front.
///
/// Hover and edit chrome is not part of the picture.
pub fn render_canvas(canvas: &Canvas, font: &CaptionFont) -> RgbaImage {
    let size = canvas.content_size();
    let width = (size.x as u32).max(1);
    let height = (size.y as u32).max(1);
    let mut out = RgbaImage::new(width, height);

    if let (Some(background), Some(display)) = (canvas.background(), canvas.background_display_size()) {
        let (w, h) = (display.x.round() as u32, display.y.round() as u32);
        if w > 0 && h > 0 {
            let scaled = if (w, h) == (background.width(), background.height()) {
                background.to_rgba8()
            } else {
                background.resize_exact(w, h, FilterType::Triangle).to_rgba8()
            };
            imageops::overlay(&mut out, &scaled, 0, 0);
        }
    }

    for overlay in canvas.overlays() {
        draw_caption(&mut out, overlay, font);
    }
    out
}

fn draw_caption(out: &mut RgbaImage, overlay: &Overlay, font: &CaptionFont) {
    if overlay.text().is_empty() {
        return;
    }
    let origin = text_origin(overlay);
    let (x, y) = (origin.x.round() as i32, origin.y.round() as i32);
    let scale = PxScale::from(overlay.font_size() as f32);

    let d = OUTLINE_WIDTH;
    for (dx, dy) in [(-d, -d), (0, -d), (d, -d), (-d, 0), (d, 0), (-d, d), (0, d), (d, d)] {
        draw_text_mut(out, OUTLINE, x + dx, y + dy, scale, font.font(), overlay.text());
    }
    draw_text_mut(out, FILL, x, y, scale, font.font(), overlay.text());
}

/// Writes PNG whatever extension `path` carries.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
