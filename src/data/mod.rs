/// Data layer: manifest types, loading, and row selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Manifest
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Manifest  │  columns + rows of (raw text, typed value) cells
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  keep one Set value, sort by name → identifiers
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;

pub use filter::{ManifestQuery, select_identifiers};
pub use loader::load_manifest;
pub use model::Manifest;
