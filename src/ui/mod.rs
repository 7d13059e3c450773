//! Widgets drawn by [`crate::app::HeatmapApp`].
//!
//! ```text
//!  ┌──────────────────────────────┬──────┐
//!  │ top_bar                      │      │
//!  ├──────────────────────────────┤      │
//!  │ title                        │ color│
//!  │ heatmap_plot                 │ bar  │
//!  │                              │      │
//!  └──────────────────────────────┴──────┘
//! ```

pub mod panels;
pub mod plot;
