//! Data layer: core types, loading, column typing and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader  │  parse file → Table (typed cells)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  schema  │  tag columns → numeric / boolean / text
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate │  group by key → AggregatedTable of means
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod loader;
pub mod model;
pub mod schema;
