use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Stroke, Ui};

use crate::state::AppState;

/// Vertical resolution of the colour bar gradient.
const COLORBAR_STEPS: usize = 64;

const COLORBAR_WIDTH: f32 = 18.0;

/// The gradient inside `rect`, inset vertically by half a label height so the
/// labels centred on its ends stay inside the painter's clip rect.
fn colorbar_rect(rect: egui::Rect, label_height: f32) -> egui::Rect {
    let inset = (label_height / 2.0).min(rect.height() / 4.0);
    egui::Rect::from_min_max(
        egui::pos2(rect.left(), rect.top() + inset),
        egui::pos2(rect.left() + COLORBAR_WIDTH, rect.bottom() - inset),
    )
}

// ---------------------------------------------------------------------------
// Right side panel – colour bar
// ---------------------------------------------------------------------------

/// Render the colour scale with its minimum, midpoint and maximum values.
pub fn colorbar(ui: &mut Ui, state: &AppState) {
    ui.add_space(32.0);

    let Some((vmin, vmax)) = state.value_range else {
        ui.label("No values");
        return;
    };

    let height = (ui.available_height() - 48.0).max(60.0);
    let (rect, _) =
        ui.allocate_exact_size(egui::vec2(ui.available_width(), height), Sense::hover());
    let font = FontId::proportional(12.0);
    let label_height = ui.fonts(|f| f.row_height(&font));
    let bar = colorbar_rect(rect, label_height);
    let painter = ui.painter_at(rect);

    // Top of the bar is the maximum.
    let step_h = bar.height() / COLORBAR_STEPS as f32;
    for i in 0..COLORBAR_STEPS {
        let t = 1.0 - (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        let top = bar.top() + i as f32 * step_h;
        let band = egui::Rect::from_min_max(
            egui::pos2(bar.left(), top),
            egui::pos2(bar.right(), top + step_h + 0.5),
        );
        painter.rect_filled(band, 0.0, state.options.color_scale.sample(t));
    }
    painter.rect_stroke(
        bar,
        0.0,
        Stroke::new(1.0, ui.visuals().weak_text_color()),
        egui::StrokeKind::Inside,
    );

    let fmt = &state.options.cell_format;
    let text_color = ui.visuals().text_color();
    let label_x = bar.right() + 4.0;
    for (value, y) in [
        (vmax, bar.top()),
        ((vmin + vmax) / 2.0, bar.center().y),
        (vmin, bar.bottom()),
    ] {
        painter.line_segment(
            [egui::pos2(bar.right(), y), egui::pos2(label_x - 1.0, y)],
            Stroke::new(1.0, text_color),
        );
        painter.text(
            egui::pos2(label_x, y),
            Align2::LEFT_CENTER,
            fmt.format(value),
            font.clone(),
            text_color,
        );
    }

    ui.add_space(8.0);
    ui.label(RichText::new(&state.options.color_scale.name).small().weak());
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export PNG…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} groups by '{}', {} columns",
            state.table.n_rows(),
            state.table.key_column,
            state.table.n_cols()
        ));

        ui.separator();

        if ui
            .selectable_label(state.options.annotate, "Annotate")
            .clicked()
        {
            state.options.annotate = !state.options.annotate;
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().weak_text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export heatmap")
        .add_filter("PNG image", &["png"])
        .set_file_name("heatmap.png")
        .save_file();

    if let Some(path) = file {
        state.request_export(path, false);
    }
}
