//! Pagination engine, measurement backends and page lookups

pub mod divider;
pub mod engine;
pub mod extract;
pub mod highlight;
pub mod measure;
pub mod metrics;
pub mod page;

pub use engine::Paginator;
pub use extract::{ExtractEdge, PageExtract};
pub use measure::{
    BoxSizing, BoxSpacing, CharGridMeasurer, Measure, MeasureError, StylePreset, TextMetrics,
    TokenProbe, ZoomedSize,
};
pub use metrics::{Baseline, ImageBaseline, SizeLevel, TextBaseline};
pub use page::{Boundary, Page, PageItem, PageMap, PageSpan};
