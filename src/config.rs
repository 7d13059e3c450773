use std::path::PathBuf;

use clap::Parser;

use crate::color::ColorScale;
use crate::error::{PipelineError, Result};
use crate::format::CellFormat;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Average numeric columns per group and show them as an annotated heatmap.
#[derive(Debug, Clone, Parser)]
#[command(name = "suitability-heatmap", version, about)]
pub struct Cli {
    /// Input table (.csv, .tsv, .json or .parquet)
    pub input: PathBuf,

    /// Column whose values define the heatmap rows
    #[arg(short = 'g', long, default_value = "Continent")]
    pub group_by: String,

    /// Field delimiter for delimited text input
    #[arg(short = 'd', long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Sequential colour map (append `_r` to reverse)
    #[arg(long, default_value = "YlGnBu")]
    pub cmap: String,

    /// Number format for cell annotations
    #[arg(long, default_value = ".2f")]
    pub fmt: String,

    /// Do not write values into the cells
    #[arg(long)]
    pub no_annot: bool,

    /// Figure title
    #[arg(long, default_value = "Mean Suitability by Continent")]
    pub title: String,

    /// Figure width in inches
    #[arg(long, default_value_t = 10.0)]
    pub width: f32,

    /// Figure height in inches
    #[arg(long, default_value_t = 6.0)]
    pub height: f32,

    /// Pixels per inch
    #[arg(long, default_value_t = 100.0)]
    pub dpi: f32,

    /// Save the rendered figure as PNG and exit instead of staying open
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] => Ok(*b),
            _ => Err(format!("delimiter must be a single byte, got '{s}'")),
        },
    }
}

// ---------------------------------------------------------------------------
// Figure – the drawing surface handed to the renderer
// ---------------------------------------------------------------------------

/// Target figure size, matplotlib style: inches times dots per inch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    pub width_in: f32,
    pub height_in: f32,
    pub dpi: f32,
}

impl Figure {
    pub fn new(width_in: f32, height_in: f32, dpi: f32) -> Result<Self> {
        for (what, v) in [("width", width_in), ("height", height_in), ("dpi", dpi)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(PipelineError::Config(format!(
                    "figure {what} must be positive, got {v}"
                )));
            }
        }
        Ok(Figure {
            width_in,
            height_in,
            dpi,
        })
    }

    /// Window size in logical pixels.
    pub fn size_px(&self) -> [f32; 2] {
        [self.width_in * self.dpi, self.height_in * self.dpi]
    }
}

// ---------------------------------------------------------------------------
// Validated rendering options
// ---------------------------------------------------------------------------

/// Everything the renderer needs besides the data.
#[derive(Debug, Clone)]
pub struct HeatmapOptions {
    pub color_scale: ColorScale,
    pub annotate: bool,
    pub cell_format: CellFormat,
    pub title: String,
    pub figure: Figure,
}

impl HeatmapOptions {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(HeatmapOptions {
            color_scale: ColorScale::by_name(&cli.cmap)?,
            annotate: !cli.no_annot,
            cell_format: cli.fmt.parse()?,
            title: cli.title.clone(),
            figure: Figure::new(cli.width, cli.height, cli.dpi)?,
        })
    }
}
