// src/app/ui/grid.rs
use eframe::egui as eg;

use crate::app::render::{load_more_label, visible_cells};
use crate::app::thumbs::{Rendition, MAX_UPLOADS_PER_FRAME};
use crate::app::types::ThumbState;
use crate::app::GalleryApp;

pub const CARD_W: f32 = 180.0;
pub const TEXT_H: f32 = 26.0;
pub const H_SPACING: f32 = 8.0;
pub const V_SPACING: f32 = 10.0;

enum GridAction {
    Open(usize),
    LoadMore,
}

impl GalleryApp {
    pub(crate) fn ui_render_grid(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        let card_h = CARD_W + TEXT_H;
        let mut uploads_left = MAX_UPLOADS_PER_FRAME;
        let mut action: Option<GridAction> = None;

        let cells = visible_cells(&self.gallery.view, self.gallery.items());
        let search_term = self.gallery.view.search_term();
        let loading = self.gallery.view.is_loading();
        let load_more = load_more_label(&self.gallery.view);
        let thumbs = &mut self.thumbs;

        eg::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                if cells.is_empty() {
                    ui.add_space(24.0);
                    ui.vertical_centered(|ui| {
                        if search_term.is_empty() {
                            ui.label("No items to show.");
                        } else {
                            ui.label(format!("No items match \"{search_term}\"."));
                        }
                    });
                    return;
                }

                // Columns + centering
                let avail = ui.available_width();
                let cols = ((avail + H_SPACING) / (CARD_W + H_SPACING))
                    .floor()
                    .max(1.0) as usize;
                let used = cols as f32 * CARD_W + (cols.saturating_sub(1)) as f32 * H_SPACING;
                let left_pad = ((avail - used) * 0.5).max(0.0);

                ui.horizontal_wrapped(|ui| {
                    ui.spacing_mut().item_spacing = eg::vec2(H_SPACING, V_SPACING);

                    for (col, cell) in cells.iter().enumerate() {
                        if col > 0 && col % cols == 0 {
                            ui.end_row();
                        }
                        if col % cols == 0 && left_pad > 0.0 {
                            ui.add_space(left_pad);
                        }

                        ui.allocate_ui_with_layout(
                            eg::vec2(CARD_W, card_h),
                            eg::Layout::top_down(eg::Align::Min),
                            |ui| {
                                ui.set_min_size(eg::vec2(CARD_W, card_h));
                                let rect = ui.max_rect();

                                let id = eg::Id::new(("card", cell.item.id));
                                let resp = ui.interact(rect, id, eg::Sense::click());
                                if resp.clicked() {
                                    action = Some(GridAction::Open(cell.item.id));
                                }

                                let image_rect = eg::Rect::from_min_size(
                                    rect.min,
                                    eg::vec2(CARD_W, CARD_W),
                                );
                                let text_rect = eg::Rect::from_min_max(
                                    eg::pos2(rect.min.x, image_rect.max.y),
                                    rect.max,
                                );

                                let tex = thumbs.texture(
                                    ctx,
                                    &cell.item.image_url,
                                    Rendition::Thumb,
                                    &mut uploads_left,
                                );
                                match tex {
                                    Some(tex) => {
                                        ui.painter().image(
                                            tex.id(),
                                            image_rect,
                                            eg::Rect::from_min_max(
                                                eg::pos2(0.0, 0.0),
                                                eg::pos2(1.0, 1.0),
                                            ),
                                            eg::Color32::WHITE,
                                        );
                                    }
                                    None => {
                                        ui.painter().rect_filled(
                                            image_rect,
                                            6.0,
                                            eg::Color32::from_gray(40),
                                        );
                                        let failed = thumbs
                                            .state(&cell.item.image_url, Rendition::Thumb)
                                            == Some(ThumbState::Failed);
                                        ui.painter().text(
                                            image_rect.center(),
                                            eg::Align2::CENTER_CENTER,
                                            if failed { "no image" } else { "…" },
                                            eg::FontId::proportional(14.0),
                                            eg::Color32::from_gray(140),
                                        );
                                    }
                                }

                                if resp.hovered() {
                                    ui.painter().rect_filled(
                                        image_rect,
                                        6.0,
                                        eg::Color32::from_white_alpha(12),
                                    );
                                }

                                ui.allocate_ui_at_rect(text_rect, |ui| {
                                    ui.add(
                                        eg::Label::new(
                                            eg::RichText::new(&cell.item.name).size(14.0),
                                        )
                                        .truncate(),
                                    );
                                });

                                // Selection stroke
                                if cell.selected {
                                    ui.painter().rect_stroke(
                                        rect.shrink(1.0),
                                        6.0,
                                        eg::Stroke::new(2.0, eg::Color32::YELLOW),
                                    );
                                }
                            },
                        );
                    }

                    ui.end_row();
                });

                if let Some(label) = load_more {
                    ui.add_space(12.0);
                    ui.vertical_centered(|ui| {
                        if ui
                            .add_enabled(!loading, eg::Button::new(label))
                            .clicked()
                        {
                            action = Some(GridAction::LoadMore);
                        }
                    });
                    ui.add_space(12.0);
                }
            });
        drop(cells);

        match action {
            Some(GridAction::Open(id)) => self.on_item_click(id),
            Some(GridAction::LoadMore) => {
                self.gallery.load_more(&mut self.rng);
            }
            None => {}
        }
    }
}
