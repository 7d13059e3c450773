use std::ops::RangeInclusive;

use eframe::egui::{self, Align2, RichText, Stroke, Ui};
use egui_plot::{GridInput, GridMark, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::color::text_color_on;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Heatmap (central panel)
// ---------------------------------------------------------------------------

/// Cell `(row, col)` covers `x ∈ [col, col + 1]` and
/// `y ∈ [n_rows - 1 - row, n_rows - row]`, so the first group is on top.
fn cell_corners(row: usize, col: usize, n_rows: usize) -> Vec<[f64; 2]> {
    let x0 = col as f64;
    let y0 = (n_rows - 1 - row) as f64;
    vec![[x0, y0], [x0 + 1.0, y0], [x0 + 1.0, y0 + 1.0], [x0, y0 + 1.0]]
}

fn cell_center(row: usize, col: usize, n_rows: usize) -> PlotPoint {
    PlotPoint::new(col as f64 + 0.5, (n_rows - 1 - row) as f64 + 0.5)
}

/// One grid mark in the middle of every cell along an axis.
fn cell_marks(n: usize) -> Vec<GridMark> {
    (0..n)
        .map(|i| GridMark {
            value: i as f64 + 0.5,
            step_size: 1.0,
        })
        .collect()
}

/// Label for the cell whose centre is at `value`; empty between cells.
fn label_at(labels: &[String], value: f64, reversed: bool) -> String {
    if value < 0.0 || (value.fract() - 0.5).abs() > 1e-6 {
        return String::new();
    }
    let idx = value.floor() as usize;
    let idx = if reversed {
        labels.len().checked_sub(idx + 1)
    } else {
        Some(idx)
    };
    idx.and_then(|i| labels.get(i)).cloned().unwrap_or_default()
}

/// Render the title and the annotated heatmap in the central panel.
pub fn heatmap_plot(ui: &mut Ui, state: &AppState) {
    let table = &state.table;
    let (n_rows, n_cols) = (table.n_rows(), table.n_cols());

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(RichText::new(&state.options.title).strong());
    });

    if table.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Nothing to plot");
        });
        return;
    }

    let columns = table.columns.clone();
    let groups = table.groups.clone();
    let hover_columns = columns.clone();
    let hover_groups = groups.clone();
    let background = ui.visuals().extreme_bg_color;

    Plot::new("heatmap")
        .show_grid(false)
        .show_background(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .include_x(0.0)
        .include_x(n_cols as f64)
        .include_y(0.0)
        .include_y(n_rows as f64)
        .set_margin_fraction(egui::vec2(0.0, 0.0))
        .y_axis_label(table.key_column.as_str())
        .x_grid_spacer(move |_: GridInput| cell_marks(n_cols))
        .y_grid_spacer(move |_: GridInput| cell_marks(n_rows))
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            label_at(&columns, mark.value, false)
        })
        .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            label_at(&groups, mark.value, true)
        })
        .label_formatter(move |_name: &str, p: &PlotPoint| {
            let col = p.x.floor();
            let row = p.y.floor();
            if col < 0.0 || row < 0.0 {
                return String::new();
            }
            let column = label_at(&hover_columns, col + 0.5, false);
            let group = label_at(&hover_groups, row + 0.5, true);
            if column.is_empty() || group.is_empty() {
                String::new()
            } else {
                format!("{group}\n{column}")
            }
        })
        .show(ui, |plot_ui| {
            for row in 0..n_rows {
                for col in 0..n_cols {
                    let corners = PlotPoints::new(cell_corners(row, col, n_rows));
                    let Some(fill) = state.cell_color(row, col) else {
                        // No value: leave the cell as background.
                        plot_ui.polygon(
                            Polygon::new(corners)
                                .fill_color(background)
                                .stroke(Stroke::NONE),
                        );
                        continue;
                    };

                    plot_ui.polygon(
                        Polygon::new(corners)
                            .fill_color(fill)
                            .stroke(Stroke::new(0.5, fill)),
                    );

                    if let Some(label) = state.cell_label(row, col) {
                        plot_ui.text(
                            Text::new(
                                cell_center(row, col, n_rows),
                                RichText::new(label).color(text_color_on(fill)),
                            )
                            .anchor(Align2::CENTER_CENTER),
                        );
                    }
                }
            }
        });
}
