//! WASM bindings for the paginator

use log::warn;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::layout::extract::{ExtractEdge, PageExtract};
use crate::layout::measure::CharGridMeasurer;
use crate::layout::metrics::SizeLevel;
use crate::layout::page::{Boundary, Page, PageItem};
use crate::{Paginator, RawBlock, Viewport};

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM-exposed paginator wrapper.
///
/// Blocks come in as JSON arrays; pages and extracts go out as JSON
/// strings with camelCase keys.
#[wasm_bindgen]
pub struct WasmPaginator {
    paginator: Paginator<CharGridMeasurer>,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator for a viewport, size level given by name
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, size: &str) -> Self {
        let size = match SizeLevel::parse(size) {
            Some(size) => size,
            None => {
                warn!("unknown size level {:?}, falling back to default", size);
                SizeLevel::default()
            }
        };
        let measurer = CharGridMeasurer::new(Viewport::new(width, height));
        Self {
            paginator: Paginator::new(measurer, size),
        }
    }

    /// Lay out a JSON block array from scratch, returning pages as JSON
    pub fn render(&mut self, blocks: &str) -> Result<String, JsValue> {
        let blocks = parse_blocks(blocks)?;
        let pages = self
            .paginator
            .render(&blocks)
            .map_err(|failure| JsValue::from_str(&failure.to_string()))?;
        serialize_pages(pages)
    }

    /// Append a JSON block array to the existing layout
    #[wasm_bindgen(js_name = renderMore)]
    pub fn render_more(&mut self, blocks: &str) -> Result<String, JsValue> {
        let blocks = parse_blocks(blocks)?;
        let pages = self
            .paginator
            .render_more(&blocks)
            .map_err(|failure| JsValue::from_str(&failure.to_string()))?;
        serialize_pages(pages)
    }

    /// Serialize a JSON block array as one markup strip, no pagination
    #[wasm_bindgen(js_name = renderFlat)]
    pub fn render_flat(&self, blocks: &str) -> Result<String, JsValue> {
        let blocks = parse_blocks(blocks)?;
        self.paginator
            .render_flat(&blocks)
            .map_err(|failure| JsValue::from_str(&failure.to_string()))
    }

    /// Page index showing a block, or its page showing a character offset
    pub fn locate(&self, id: u64, char_offset: Option<usize>) -> Option<usize> {
        self.paginator.locate(crate::BlockId(id), char_offset)
    }

    /// Like locate, but an unknown id falls forward to the next known one
    #[wasm_bindgen(js_name = locateApproximate)]
    pub fn locate_approximate(&self, id: u64, char_offset: Option<usize>) -> Option<usize> {
        self.paginator
            .locate_approximate(crate::BlockId(id), char_offset)
    }

    /// Edge offsets and visible text of one page, as JSON
    #[wasm_bindgen(js_name = extractPage)]
    pub fn extract_page(&self, page_index: usize) -> Option<String> {
        let extracted = self.paginator.extract_page(page_index)?;
        serde_json::to_string(&ExtractData::from_extract(&extracted)).ok()
    }

    /// Visible text of one page joined into a single string
    #[wasm_bindgen(js_name = extractPageText)]
    pub fn extract_page_text(
        &self,
        page_index: usize,
        separator: Option<String>,
        max_length: Option<usize>,
    ) -> Option<String> {
        self.paginator
            .extract_page_text(page_index, separator.as_deref(), max_length)
    }

    /// Plain text between two character positions of the document
    pub fn excerpt(
        &self,
        from_id: u64,
        from_offset: usize,
        to_id: u64,
        to_offset: usize,
    ) -> String {
        self.paginator.excerpt(
            crate::BlockId(from_id),
            from_offset,
            crate::BlockId(to_id),
            to_offset,
        )
    }

    /// Markup of one page with keyword occurrences painted
    pub fn highlight(&self, page_index: usize, keyword: &str) -> Option<String> {
        self.paginator.highlight(page_index, keyword)
    }

    /// Switch the size level by name; false when the name is unknown
    #[wasm_bindgen(js_name = setSizeLevel)]
    pub fn set_size_level(&mut self, size: &str) -> bool {
        match SizeLevel::parse(size) {
            Some(size) => {
                self.paginator.set_size_level(size);
                true
            }
            None => {
                warn!("unknown size level {:?}, keeping {}", size, self.paginator.size());
                false
            }
        }
    }

    /// Drop the document, pages and index
    pub fn reset(&mut self) {
        self.paginator.reset();
    }

    /// Number of laid-out pages
    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.paginator.page_count()
    }
}

fn parse_blocks(blocks: &str) -> Result<Vec<RawBlock>, JsValue> {
    serde_json::from_str(blocks)
        .map_err(|failure| JsValue::from_str(&format!("malformed block array: {}", failure)))
}

fn serialize_pages(pages: &[Page]) -> Result<String, JsValue> {
    let data: Vec<PageData> = pages.iter().map(PageData::from_page).collect();
    serde_json::to_string(&data)
        .map_err(|failure| JsValue::from_str(&format!("page serialization failed: {}", failure)))
}

/// Serializable page data for JS
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub index: usize,
    pub height: f32,
    pub markup: String,
    pub boundary_from: Option<BoundaryData>,
    pub boundary_to: Option<BoundaryData>,
    pub items: Vec<ItemData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryData {
    pub id: u64,
    pub block_type: String,
    pub paginated: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    pub id: u64,
    pub block_type: String,
    pub offset: f32,
    pub lines: u32,
    pub lines_offset: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractData {
    pub page_index: usize,
    pub item_from: EdgeData,
    pub item_to: EdgeData,
    pub fragments: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub id: u64,
    pub paginated: bool,
    pub char_from: Option<usize>,
    pub char_to: Option<usize>,
    pub char_offset: Option<usize>,
}

impl PageData {
    pub fn from_page(page: &Page) -> Self {
        Self {
            index: page.index,
            height: page.height,
            markup: page.markup.clone(),
            boundary_from: page.boundary_from.as_ref().map(BoundaryData::from_boundary),
            boundary_to: page.boundary_to.as_ref().map(BoundaryData::from_boundary),
            items: page.items.iter().map(ItemData::from_item).collect(),
        }
    }
}

impl BoundaryData {
    fn from_boundary(boundary: &Boundary) -> Self {
        Self {
            id: boundary.id.0,
            block_type: boundary.block_type.as_str().to_string(),
            paginated: boundary.paginated,
        }
    }
}

impl ItemData {
    fn from_item(item: &PageItem) -> Self {
        Self {
            id: item.id.0,
            block_type: item.block_type.as_str().to_string(),
            offset: item.offset,
            lines: item.lines,
            lines_offset: item.lines_offset,
        }
    }
}

impl ExtractData {
    pub fn from_extract(extracted: &PageExtract) -> Self {
        Self {
            page_index: extracted.page_index,
            item_from: EdgeData::from_edge(&extracted.item_from),
            item_to: EdgeData::from_edge(&extracted.item_to),
            fragments: extracted.fragments.clone(),
        }
    }
}

impl EdgeData {
    fn from_edge(edge: &ExtractEdge) -> Self {
        Self {
            id: edge.id.0,
            paginated: edge.paginated,
            char_from: edge.char_from,
            char_to: edge.char_to,
            char_offset: edge.char_offset,
        }
    }
}
