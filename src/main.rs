mod app;
mod color;
mod config;
mod data;
mod error;
mod export;
mod format;
mod pipeline;
mod state;
mod ui;

use std::sync::mpsc;

use anyhow::{Context, Result};
use app::HeatmapApp;
use clap::Parser;
use config::{Cli, HeatmapOptions};
use eframe::egui;
use error::PipelineError;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let options = HeatmapOptions::from_cli(&cli)?;

    let table = pipeline::aggregate_file(&cli.input, &cli.group_by, cli.delimiter)
        .with_context(|| format!("processing {}", cli.input.display()))?;

    let mut state = AppState::new(table, options);
    let (tx, rx) = mpsc::channel();
    if let Some(path) = &cli.output {
        state.request_export(path.clone(), true);
        state.export_reporter = Some(tx);
    }

    let title = state.options.title.clone();
    let [width, height] = state.options.figure.size_px();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size([width, height])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };

    // The window is the figure's drawing surface; it lives only for this call.
    eframe::run_native(
        &title,
        native_options,
        Box::new(|_cc| Ok(Box::new(HeatmapApp::new(state)))),
    )
    .map_err(|e| PipelineError::Render(e.to_string()))?;

    if let Some(path) = &cli.output {
        match rx.try_recv() {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(PipelineError::Render(e).into()),
            Err(_) => {
                return Err(PipelineError::Render(format!(
                    "window closed before {} was written",
                    path.display()
                ))
                .into())
            }
        }
    }

    Ok(())
}
