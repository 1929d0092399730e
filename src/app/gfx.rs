// src/app/gfx.rs
use eframe::egui::{self as eg, ColorImage, TextureHandle};

/// Upload an RGBA image to a GPU texture. (UI thread only)
pub fn upload_rgba(ctx: &eg::Context, w: u32, h: u32, bytes: &[u8], name: &str) -> TextureHandle {
    let img = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], bytes);
    ctx.load_texture(name.to_string(), img, eg::TextureOptions::LINEAR)
}

/// Largest size with the texture's aspect ratio that fits inside `bounds`.
pub fn fit_within(tex_size: eg::Vec2, bounds: eg::Vec2) -> eg::Vec2 {
    if tex_size.x <= 0.0 || tex_size.y <= 0.0 {
        return eg::Vec2::ZERO;
    }
    let scale = (bounds.x / tex_size.x).min(bounds.y / tex_size.y);
    tex_size * scale
}
