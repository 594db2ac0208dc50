/// Data layer: core types, row parsing, labeling and probe segmentation.
///
/// Architecture:
/// ```text
///  site.csv  (timing[,sample_count])
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows → Vec<TimingRow>
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │ segment   │   │  labels   │  file name → label
///   └──────────┘   └──────────┘
///        │              │
///        ▼              ▼
///      Vec<Probe>  +  label  →  dataset assemblers
/// ```

pub mod labels;
pub mod loader;
pub mod model;
pub mod segment;
