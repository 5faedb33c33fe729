//! Failures that abort a render call

use thiserror::Error;

use crate::layout::measure::{BoxSizing, MeasureError};

/// A render call aborts on these; every other problem is logged and
/// recovered locally.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("measurement reports {0:?} boxes, content-box sizing is required")]
    BoxSizing(BoxSizing),
    #[error("viewport {width}x{height} cannot host any content")]
    Viewport { width: f32, height: f32 },
    #[error(transparent)]
    Measure(#[from] MeasureError),
}
