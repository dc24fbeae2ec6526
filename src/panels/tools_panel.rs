use crate::PaintApp;
use crate::app::Retry;
use crate::input::InputMode;
use crate::tool::{MAX_WIDTH, MIN_WIDTH, Tool};

const EXPORT_FILE: &str = "inkshape-export.png";

pub fn tools_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Tools");

            let active = app.session.tools().tool();
            for tool in Tool::ALL {
                if ui.selectable_label(active == tool, tool.name()).clicked() {
                    log::info!("Tool selected from UI: {}", tool.name());
                    app.session.set_tool(tool);
                }
            }
            ui.separator();

            let mut color = app.session.tools().color();
            ui.horizontal(|ui| {
                ui.label("Color");
                if ui.color_edit_button_srgba(&mut color).changed() {
                    app.session.set_color(color);
                }
            });

            let mut width = app.session.tools().width();
            if ui
                .add(egui::Slider::new(&mut width, MIN_WIDTH..=MAX_WIDTH).text("Width"))
                .changed()
            {
                if let Err(err) = app.session.set_width(width) {
                    log::warn!("{}", err);
                }
            }

            let eraser = app.session.tools().tool().is_eraser();
            let mut detect = app.session.tools().shape_detection();
            if ui
                .add_enabled(!eraser, egui::Checkbox::new(&mut detect, "Shape detection"))
                .changed()
            {
                if let Err(err) = app.session.set_shape_detection(detect) {
                    log::warn!("{}", err);
                }
            }

            let mut grid = app.session.tools().grid();
            if ui.checkbox(&mut grid, "Grid").changed() {
                app.session.set_grid(grid);
                app.mark_dirty();
            }

            ui.horizontal(|ui| {
                let mode = app.session.input_mode();
                for (choice, label) in [(InputMode::Mouse, "Mouse"), (InputMode::Hand, "Hand")] {
                    if ui.selectable_label(mode == choice, label).clicked() {
                        let result = app.session.set_input_mode(choice);
                        app.report(result, None);
                        app.mark_dirty();
                    }
                }
            });
            ui.separator();

            // Undo/Redo section
            ui.horizontal(|ui| {
                let idle = !app.session.is_restoring();
                if ui
                    .add_enabled(idle && app.session.can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    app.undo();
                }
                if ui
                    .add_enabled(idle && app.session.can_redo(), egui::Button::new("Redo"))
                    .clicked()
                {
                    app.redo();
                }
                if ui.button("Clear").clicked() {
                    app.clear();
                }
            });
            let history = app.session.history();
            ui.label(format!("History: {} / {}", history.cursor() + 1, history.len()));
            if let Some(shape) = &app.last_shape {
                ui.label(format!("Last shape: {}", shape));
            }
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    app.save_drawing();
                }
                if ui.button("Load").clicked() {
                    app.load_drawing();
                }
                if ui.button("Export PNG").clicked() {
                    app.export_png(std::path::Path::new(EXPORT_FILE));
                }
            });
            ui.separator();

            ui.heading("Text");
            let label = if app.is_recognizing() { "Recognizing…" } else { "Recognize text" };
            if ui
                .add_enabled(!app.is_recognizing(), egui::Button::new(label))
                .clicked()
            {
                app.recognize_text();
            }
            ui.add(egui::TextEdit::multiline(&mut app.recognized_text).desired_rows(3));
            ui.horizontal(|ui| {
                if ui.button("Copy").clicked() {
                    ui.ctx().copy_text(app.recognized_text.clone());
                }
                if ui.button("Clear text").clicked() {
                    app.recognized_text.clear();
                }
            });

            let mut retry = None;
            let mut dismiss = false;
            if let Some(status) = &app.status {
                ui.separator();
                ui.label(status.text.as_str());
                ui.horizontal(|ui| {
                    if let Some(action) = status.retry {
                        if ui.button(retry_label(action)).clicked() {
                            retry = Some(action);
                        }
                    }
                    if ui.button("Dismiss").clicked() {
                        dismiss = true;
                    }
                });
            }
            if let Some(action) = retry {
                app.retry(action);
            } else if dismiss {
                app.status = None;
            }
        });
}

fn retry_label(action: Retry) -> &'static str {
    match action {
        Retry::Recognize => "Retry recognition",
        Retry::Save => "Retry save",
        Retry::Load => "Retry load",
    }
}
