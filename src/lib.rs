//! Folio: fixed-viewport pagination for block documents
//!
//! This crate lays ordered content blocks out into viewport-sized pages:
//! - Greedy page filling with text blocks split across page edges
//! - Character-exact page boundaries resolved by token probing
//! - Page lookups by block id and character offset
//! - Keyword highlighting re-rendered per page

pub mod document;
pub mod error;
pub mod layout;
pub mod render;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use document::{Block, BlockContent, BlockId, BlockType, Document, HeadingLevel, RawBlock};
pub use error::LayoutError;
pub use layout::{CharGridMeasurer, Measure, Page, PageItem, PageMap, Paginator, SizeLevel};

/// Fixed page area all content is laid into
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0
    }
}
