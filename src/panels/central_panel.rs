use crate::PaintApp;

pub fn central_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(egui::Color32::from_gray(230)))
        .show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;

            // The canvas follows the panel; existing ink stays anchored top-left.
            let width = rect.width().round().max(1.0) as u32;
            let height = rect.height().round().max(1.0) as u32;
            let current = (app.session.raster().width(), app.session.raster().height());
            if (width, height) != current && !app.session.is_restoring() {
                let result = app.session.resize(width, height);
                app.report(result, None);
                app.mark_dirty();
            }

            // Handle input
            app.input.set_canvas(rect, app.session.canvas_size());
            let events = app.input.process_input(ctx);
            app.handle_events(events);

            // Render the canvas
            painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
            if let Some(texture) = app.canvas_texture(ctx) {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                let shown = egui::Rect::from_min_size(rect.min, app.session.canvas_size());
                painter.image(texture, shown, uv, egui::Color32::WHITE);
            }

            if app.session.is_restoring() {
                painter.text(
                    rect.right_top() + egui::vec2(-8.0, 8.0),
                    egui::Align2::RIGHT_TOP,
                    "Restoring…",
                    egui::FontId::proportional(14.0),
                    egui::Color32::DARK_GRAY,
                );
            }
        });
}
