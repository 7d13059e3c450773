use std::path::PathBuf;
use std::sync::mpsc::Sender;

use eframe::egui::Color32;

use crate::config::HeatmapOptions;
use crate::data::aggregate::AggregatedTable;

/// Result of a PNG export, reported back to `main` for `--output` runs.
pub type ExportOutcome = Result<PathBuf, String>;

// ---------------------------------------------------------------------------
// Export requests
// ---------------------------------------------------------------------------

/// Where the next captured frame should go.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub path: PathBuf,
    /// Close the window once the file is written.
    pub close_after: bool,
    /// A screenshot command has been sent and not answered yet.
    pub in_flight: bool,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Per-group means to draw.
    pub table: AggregatedTable,

    /// Colour map, annotation and figure settings.
    pub options: HeatmapOptions,

    /// Finite value range used for colour normalisation.
    pub value_range: Option<(f64, f64)>,

    /// Pending PNG export, if any.
    pub export: Option<ExportRequest>,

    /// Receives the outcome of each export.
    pub export_reporter: Option<Sender<ExportOutcome>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Frames drawn so far.
    pub frames_drawn: u64,
}

impl AppState {
    pub fn new(table: AggregatedTable, options: HeatmapOptions) -> Self {
        let value_range = table.finite_range();
        Self {
            table,
            options,
            value_range,
            export: None,
            export_reporter: None,
            status_message: None,
            frames_drawn: 0,
        }
    }

    /// Fill colour of a cell, `None` for cells without a value.
    pub fn cell_color(&self, row: usize, col: usize) -> Option<Color32> {
        let v = self.table.value(row, col);
        if !v.is_finite() {
            return None;
        }
        let (vmin, vmax) = self.value_range?;
        Some(self.options.color_scale.color_for(v, vmin, vmax))
    }

    /// Annotation text of a cell, `None` when annotations are off or the
    /// cell has no value.
    pub fn cell_label(&self, row: usize, col: usize) -> Option<String> {
        let v = self.table.value(row, col);
        (self.options.annotate && v.is_finite()).then(|| self.options.cell_format.format(v))
    }

    /// Queue a PNG export of the next fully drawn frame.
    pub fn request_export(&mut self, path: PathBuf, close_after: bool) {
        log::info!("Exporting heatmap to {}", path.display());
        self.export = Some(ExportRequest {
            path,
            close_after,
            in_flight: false,
        });
    }

    /// Record the outcome of an export and forward it to the reporter.
    pub fn finish_export(&mut self, outcome: ExportOutcome) {
        self.status_message = match &outcome {
            Ok(path) => Some(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Export failed: {e}");
                Some(format!("Error: {e}"))
            }
        };
        if let Some(tx) = &self.export_reporter {
            // The receiver only goes away once main has stopped listening.
            let _ = tx.send(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Cli, HeatmapOptions};
    use crate::data::aggregate::group_means;
    use crate::data::loader::parse_cell;
    use crate::data::model::Table;
    use crate::data::schema::Schema;
    use clap::Parser;

    fn state(extra_args: &[&str]) -> AppState {
        let mut t = Table::new(vec!["Continent".into(), "a".into(), "b".into()]);
        for row in [["Asia", "0.2", ""], ["Europe", "0.8", "0.5"]] {
            t.rows.push(row.iter().map(|s| parse_cell(s)).collect());
        }
        let schema = Schema::infer(&t);
        let numeric = schema.numeric_columns("Continent");
        let agg = group_means(&t, &schema, &numeric, "Continent").unwrap();

        let mut args = vec!["suitability-heatmap", "in.csv"];
        args.extend_from_slice(extra_args);
        let opts = HeatmapOptions::from_cli(&Cli::try_parse_from(args).unwrap()).unwrap();
        AppState::new(agg, opts)
    }

    #[test]
    fn extremes_get_scale_endpoints() {
        let s = state(&[]);
        assert_eq!(s.value_range, Some((0.2, 0.8)));
        assert_eq!(s.cell_color(0, 0), Some(s.options.color_scale.sample(0.0)));
        assert_eq!(s.cell_color(1, 0), Some(s.options.color_scale.sample(1.0)));
    }

    #[test]
    fn missing_cells_are_blank() {
        let s = state(&[]);
        assert_eq!(s.cell_color(0, 1), None);
        assert_eq!(s.cell_label(0, 1), None);
        assert_eq!(s.cell_label(1, 1).as_deref(), Some("0.50"));
    }

    #[test]
    fn annotations_can_be_disabled() {
        let s = state(&["--no-annot"]);
        assert_eq!(s.cell_label(1, 0), None);
        assert!(s.cell_color(1, 0).is_some());
    }

    #[test]
    fn export_outcome_is_reported() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut s = state(&[]);
        s.export_reporter = Some(tx);
        s.request_export(PathBuf::from("out.png"), true);
        assert!(s.export.as_ref().is_some_and(|e| e.close_after && !e.in_flight));

        s.finish_export(Ok(PathBuf::from("out.png")));
        assert_eq!(rx.try_recv().unwrap(), Ok(PathBuf::from("out.png")));
        assert_eq!(s.status_message.as_deref(), Some("Saved out.png"));
    }
}
