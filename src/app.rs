use std::sync::Arc;

use eframe::egui;

use crate::export::save_png;
use crate::state::AppState;
use crate::ui::{panels, plot};

/// Frames to draw before capturing, so plot bounds and text layout settle.
const FRAMES_BEFORE_CAPTURE: u64 = 2;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct HeatmapApp {
    pub state: AppState,
}

impl HeatmapApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Draw one frame and advance any pending export.
    fn show(&mut self, ctx: &egui::Context) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Right side panel: colour bar ----
        egui::SidePanel::right("colorbar_panel")
            .exact_width(90.0)
            .resizable(false)
            .show(ctx, |ui| {
                panels::colorbar(ui, &self.state);
            });

        // ---- Central panel: title + heatmap ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::heatmap_plot(ui, &self.state);
        });

        self.state.frames_drawn += 1;
        self.drive_export(ctx);
    }

    /// Ask for a screenshot once the pending export's frame is ready, and
    /// save it when egui hands it back.
    fn drive_export(&mut self, ctx: &egui::Context) {
        let Some(request) = self.state.export.as_mut() else {
            return;
        };

        if !request.in_flight {
            if self.state.frames_drawn >= FRAMES_BEFORE_CAPTURE {
                ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(
                    egui::UserData::default(),
                ));
                request.in_flight = true;
            }
            ctx.request_repaint();
            return;
        }

        let captured: Option<Arc<egui::ColorImage>> = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });

        match captured {
            Some(image) => {
                let Some(request) = self.state.export.take() else {
                    return;
                };
                let outcome = save_png(&image, &request.path)
                    .map(|()| request.path.clone())
                    .map_err(|e| format!("{e:#}"));
                self.state.finish_export(outcome);
                if request.close_after {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
            None => ctx.request_repaint(),
        }
    }
}

impl eframe::App for HeatmapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::mpsc;

    use clap::Parser;

    use crate::config::{Cli, HeatmapOptions};
    use crate::pipeline::aggregate_file;

    fn app() -> HeatmapApp {
        let mut csv = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            csv,
            "Continent,Current,Future\nAsia,0.8,0.5\nAsia,0.6,\nEurope,0.4,0.3\n"
        )
        .unwrap();
        let table = aggregate_file(csv.path(), "Continent", None).unwrap();
        let cli = Cli::try_parse_from(["suitability-heatmap", "in.csv"]).unwrap();
        HeatmapApp::new(AppState::new(table, HeatmapOptions::from_cli(&cli).unwrap()))
    }

    fn frame(app: &mut HeatmapApp, ctx: &egui::Context, input: egui::RawInput) {
        let _ = ctx.run(input, |ctx| app.show(ctx));
    }

    #[test]
    fn draws_without_export() {
        let mut app = app();
        let ctx = egui::Context::default();
        for _ in 0..3 {
            frame(&mut app, &ctx, egui::RawInput::default());
        }
        assert_eq!(app.state.frames_drawn, 3);
        assert!(app.state.export.is_none());
    }

    #[test]
    fn export_waits_for_layout_then_saves_the_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatmap.png");
        let (tx, rx) = mpsc::channel();

        let mut app = app();
        app.state.request_export(path.clone(), true);
        app.state.export_reporter = Some(tx);
        let ctx = egui::Context::default();

        frame(&mut app, &ctx, egui::RawInput::default());
        assert!(app.state.export.as_ref().is_some_and(|e| !e.in_flight));

        frame(&mut app, &ctx, egui::RawInput::default());
        assert!(app.state.export.as_ref().is_some_and(|e| e.in_flight));

        let screenshot = egui::Event::Screenshot {
            viewport_id: egui::ViewportId::ROOT,
            user_data: egui::UserData::default(),
            image: Arc::new(egui::ColorImage::new([4, 3], egui::Color32::WHITE)),
        };
        let input = egui::RawInput {
            events: vec![screenshot],
            ..Default::default()
        };
        frame(&mut app, &ctx, input);

        assert!(app.state.export.is_none());
        assert_eq!(rx.try_recv().unwrap(), Ok(path.clone()));
        assert!(path.exists());
    }
}
