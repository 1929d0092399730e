// src/app/ui/overlay.rs
use eframe::egui as eg;

use crate::app::gfx::fit_within;
use crate::app::render::{overlay_content, OverlayContent};
use crate::app::thumbs::{Rendition, Thumbnails, MAX_UPLOADS_PER_FRAME};
use crate::app::GalleryApp;

const POEM_W: f32 = 520.0;
const POEM_H: f32 = 420.0;
const IMAGE_MARGIN: f32 = 48.0;

#[derive(Debug, PartialEq, Eq)]
enum OverlayAction {
    PoemClicked,
    ImageClicked,
    Close,
}

impl GalleryApp {
    pub(crate) fn ui_render_overlay(&mut self, ctx: &eg::Context) {
        // content borrows the gallery; keep it scoped to the paint pass
        let action = {
            let Some(content) =
                overlay_content(&self.gallery.view, self.gallery.items(), &self.gallery.metadata)
            else {
                return;
            };
            paint_overlay(ctx, &content, &mut self.thumbs)
        };

        match action {
            Some(OverlayAction::PoemClicked) => self.gallery.click_poem_surface(),
            Some(OverlayAction::ImageClicked) => self.gallery.click_image_surface(),
            Some(OverlayAction::Close) => self.gallery.close_overlay(),
            None => {}
        }
    }
}

fn paint_overlay(
    ctx: &eg::Context,
    content: &OverlayContent<'_>,
    thumbs: &mut Thumbnails,
) -> Option<OverlayAction> {
    let mut action = None;
    let screen = ctx.screen_rect();

    eg::Area::new(eg::Id::new("overlay"))
        .fixed_pos(screen.min)
        .order(eg::Order::Foreground)
        .show(ctx, |ui| {
            ui.set_min_size(screen.size());
            ui.style_mut().interaction.selectable_labels = false;

            // Backdrop closes; surfaces registered after it take their own clicks
            let backdrop =
                ui.interact(screen, eg::Id::new("overlay_backdrop"), eg::Sense::click());
            if backdrop.clicked() {
                action = Some(OverlayAction::Close);
            }
            ui.painter()
                .rect_filled(screen, 0.0, eg::Color32::from_black_alpha(215));

            match content {
                OverlayContent::Poem {
                    item,
                    emoji_song,
                    lore_poem,
                } => {
                    let panel = eg::Rect::from_center_size(
                        screen.center(),
                        eg::vec2(POEM_W.min(screen.width() - 32.0), POEM_H),
                    );
                    let resp = ui.interact(panel, eg::Id::new("poem_surface"), eg::Sense::click());
                    ui.painter()
                        .rect_filled(panel, 10.0, ui.visuals().extreme_bg_color);
                    ui.allocate_ui_at_rect(panel.shrink(20.0), |ui| {
                        ui.vertical_centered(|ui| {
                            ui.heading(&item.name);
                            ui.add_space(12.0);
                            ui.label(eg::RichText::new(emoji_song.as_str()).size(30.0));
                            ui.add_space(12.0);
                            ui.label(eg::RichText::new(lore_poem.as_str()).size(16.0).italics());
                            ui.add_space(16.0);
                            ui.label(eg::RichText::new("Click to see the image").weak());
                        });
                    });
                    if resp.clicked() {
                        action = Some(OverlayAction::PoemClicked);
                    }
                }
                OverlayContent::Image { item } => {
                    let bounds = screen.shrink(IMAGE_MARGIN);
                    // Full rendition when ready, the grid thumbnail until then
                    let mut uploads_left = MAX_UPLOADS_PER_FRAME;
                    let tex = thumbs
                        .texture(ctx, &item.image_url, Rendition::Full, &mut uploads_left)
                        .or_else(|| {
                            thumbs.texture(ctx, &item.image_url, Rendition::Thumb, &mut uploads_left)
                        });

                    let image_rect = match &tex {
                        Some(tex) => eg::Rect::from_center_size(
                            bounds.center(),
                            fit_within(tex.size_vec2(), bounds.size()),
                        ),
                        None => eg::Rect::from_center_size(
                            bounds.center(),
                            eg::Vec2::splat(bounds.width().min(bounds.height()) * 0.5),
                        ),
                    };
                    let resp =
                        ui.interact(image_rect, eg::Id::new("image_surface"), eg::Sense::click());
                    match tex {
                        Some(tex) => {
                            ui.painter().image(
                                tex.id(),
                                image_rect,
                                eg::Rect::from_min_max(eg::pos2(0.0, 0.0), eg::pos2(1.0, 1.0)),
                                eg::Color32::WHITE,
                            );
                        }
                        None => {
                            ui.painter().text(
                                image_rect.center(),
                                eg::Align2::CENTER_CENTER,
                                format!("Loading {}…", item.name),
                                eg::FontId::proportional(18.0),
                                eg::Color32::from_gray(180),
                            );
                        }
                    }
                    if resp.clicked() {
                        action = Some(OverlayAction::ImageClicked);
                    }
                }
            }

            let close_rect = eg::Rect::from_min_size(
                eg::pos2(screen.max.x - 52.0, screen.min.y + 12.0),
                eg::vec2(40.0, 40.0),
            );
            if ui
                .put(
                    close_rect,
                    eg::Button::new(eg::RichText::new("✕").size(20.0)).frame(false),
                )
                .on_hover_text("Close (Esc)")
                .clicked()
            {
                action = Some(OverlayAction::Close);
            }
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::types::Item;

    fn ape() -> Item {
        Item {
            id: 3,
            name: "Midnight Ape #3".into(),
            image_url: "http://127.0.0.1:9/3.png".into(),
            metadata_url: "http://127.0.0.1:9/tx/3".into(),
        }
    }

    fn input(events: Vec<eg::Event>) -> eg::RawInput {
        eg::RawInput {
            screen_rect: Some(eg::Rect::from_min_size(
                eg::Pos2::ZERO,
                eg::vec2(1000.0, 800.0),
            )),
            events,
            ..Default::default()
        }
    }

    fn button(pos: eg::Pos2, pressed: bool) -> eg::Event {
        eg::Event::PointerButton {
            pos,
            button: eg::PointerButton::Primary,
            pressed,
            modifiers: eg::Modifiers::default(),
        }
    }

    /// Lay the overlay out for a few frames, then click at `pos`.
    fn click_at(content: &OverlayContent<'_>, pos: eg::Pos2) -> Option<OverlayAction> {
        let ctx = eg::Context::default();
        let mut thumbs = Thumbnails::new(1);
        let frames = vec![
            vec![],
            vec![],
            vec![eg::Event::PointerMoved(pos)],
            vec![button(pos, true)],
            vec![button(pos, false)],
        ];
        let mut action = None;
        for events in frames {
            let _ = ctx.run(input(events), |ctx| {
                if let Some(a) = paint_overlay(ctx, content, &mut thumbs) {
                    action = Some(a);
                }
            });
        }
        action
    }

    #[test]
    fn poem_surface_and_backdrop_clicks() {
        let item = ape();
        let content = OverlayContent::Poem {
            item: &item,
            emoji_song: "🌙🦍".into(),
            lore_poem: "Under the moon".into(),
        };
        assert_eq!(
            click_at(&content, eg::pos2(500.0, 400.0)),
            Some(OverlayAction::PoemClicked)
        );
        assert_eq!(
            click_at(&content, eg::pos2(20.0, 700.0)),
            Some(OverlayAction::Close)
        );
    }
}
