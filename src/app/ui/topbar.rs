// src/app/ui/topbar.rs
use eframe::egui as eg;

use crate::app::render::count_label;
use crate::app::types::BootPhase;
use crate::app::view::Filter;
use crate::app::GalleryApp;

impl GalleryApp {
    // ---------- TOP BAR ----------
    pub(crate) fn ui_render_topbar(&mut self, ui: &mut eg::Ui) {
        ui.horizontal(|ui| {
            // Title opens the info popup
            let title = ui
                .add(
                    eg::Label::new(
                        eg::RichText::new(&self.cfg.collection_title)
                            .heading()
                            .strong(),
                    )
                    .sense(eg::Sense::click()),
                )
                .on_hover_text("About this collection");
            if title.clicked() {
                self.show_info = true;
            }

            ui.separator();

            let ready = self.boot_phase == BootPhase::Ready;
            ui.add_enabled_ui(ready, |ui| {
                // Search
                let resp = ui.add(
                    eg::TextEdit::singleline(&mut self.search_input)
                        .hint_text("Search name, number or trait…")
                        .desired_width(220.0),
                );
                if resp.changed() {
                    self.on_search_edited();
                }

                ui.separator();

                // Filter
                let current = self.gallery.view.filter();
                for filter in Filter::ALL {
                    if ui
                        .selectable_label(current == filter, filter.label())
                        .clicked()
                    {
                        self.gallery.apply_filter(filter, &mut self.rng);
                    }
                }
            });

            if ready {
                ui.separator();
                ui.label(count_label(&self.gallery.view));
            }

            if self.gallery.view.is_loading() {
                ui.separator();
                ui.add(eg::Spinner::new().size(14.0));
                ui.label(eg::RichText::new("Loading…").weak());
            }
        });
    }
}
