// src/app/ui/mod.rs
pub mod grid;
pub mod overlay;
pub mod topbar;

use eframe::egui as eg;

use crate::app::{GalleryApp, LOAD_ERROR_TEXT};

impl GalleryApp {
    // Keep splash here; it's tiny and used early.
    pub(crate) fn ui_render_splash(&self, ui: &mut eg::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading(format!("{} Gallery", self.cfg.collection_title));
            ui.add(eg::Spinner::new().size(18.0));
            ui.separator();
            if !self.loading_message.is_empty() {
                ui.label(&self.loading_message);
            }
            ui.add_space(8.0);
            ui.monospace(format!(
                "Cache: {}",
                crate::app::cache::cache_dir().display()
            ));
        });
    }

    pub(crate) fn ui_render_load_error(&self, ui: &mut eg::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.label(
                eg::RichText::new(LOAD_ERROR_TEXT)
                    .size(16.0)
                    .color(ui.visuals().error_fg_color),
            );
            if let Some(detail) = &self.load_error {
                ui.add_space(6.0);
                ui.label(eg::RichText::new(detail).weak().monospace());
            }
        });
    }

    // ---------- INFO POPUP ----------
    pub(crate) fn ui_render_info_popup(&mut self, ctx: &eg::Context) {
        if !self.show_info {
            return;
        }

        let mut open = self.show_info;
        let mut close_clicked = modal_backdrop(ctx, eg::Id::new("info_backdrop"));
        eg::Window::new(format!("About {}", self.cfg.collection_title))
            .order(eg::Order::Foreground)
            .collapsible(false)
            .resizable(false)
            .default_width(340.0)
            .anchor(eg::Align2::CENTER_CENTER, eg::Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} is a collection of {} apes.",
                    self.cfg.collection_title,
                    self.gallery.items().len()
                ));
                ui.label("Click an ape for its emoji song and lore poem, click again for the full image.");
                ui.label("Search matches names, numbers and any trait of the items indexed so far.");
                ui.separator();
                ui.monospace(format!(
                    "Searchable: {}  Metadata cached: {}",
                    self.gallery.index.len(),
                    self.gallery.metadata.len()
                ));
                if self.indexer.is_indexing() {
                    ui.label(eg::RichText::new("Indexing in the background…").italics().weak());
                }
                ui.add_space(6.0);
                if ui.button("Close").clicked() {
                    close_clicked = true;
                }
            });

        // Apply result after .show
        self.show_info = open && !close_clicked;
    }

    pub(crate) fn ui_render_toast(&self, ctx: &eg::Context) {
        let Some(toast) = &self.toast else {
            return;
        };
        eg::Area::new(eg::Id::new("toast"))
            .anchor(eg::Align2::CENTER_BOTTOM, eg::vec2(0.0, -24.0))
            .order(eg::Order::Tooltip)
            .interactable(false)
            .show(ctx, |ui| {
                eg::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(
                        eg::RichText::new(&toast.text).color(ui.visuals().error_fg_color),
                    );
                });
            });
    }
}

/// Dim the screen beneath a modal window; true when the dimmed area is clicked.
fn modal_backdrop(ctx: &eg::Context, id: eg::Id) -> bool {
    let screen = ctx.screen_rect();
    eg::Area::new(id)
        .fixed_pos(screen.min)
        .order(eg::Order::Middle)
        .show(ctx, |ui| {
            ui.set_min_size(screen.size());
            ui.painter()
                .rect_filled(screen, 0.0, eg::Color32::from_black_alpha(160));
            ui.interact(screen, id.with("click"), eg::Sense::click())
                .clicked()
        })
        .inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_click_is_reported() {
        let ctx = eg::Context::default();
        let pos = eg::pos2(30.0, 30.0);
        let press = |pressed| eg::Event::PointerButton {
            pos,
            button: eg::PointerButton::Primary,
            pressed,
            modifiers: eg::Modifiers::default(),
        };
        let frames = vec![
            vec![],
            vec![],
            vec![eg::Event::PointerMoved(pos)],
            vec![press(true)],
            vec![press(false)],
        ];

        let mut clicks = 0;
        for events in frames {
            let input = eg::RawInput {
                screen_rect: Some(eg::Rect::from_min_size(eg::Pos2::ZERO, eg::vec2(800.0, 600.0))),
                events,
                ..Default::default()
            };
            let _ = ctx.run(input, |ctx| {
                if modal_backdrop(ctx, eg::Id::new("info_backdrop")) {
                    clicks += 1;
                }
            });
        }
        assert_eq!(clicks, 1);
    }
}
