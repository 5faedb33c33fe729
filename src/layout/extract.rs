//! Page boundary offsets and visible text fragments

use log::warn;

use crate::document::{BlockId, Document};
use crate::layout::divider::{divide, DividedText, LineRange};
use crate::layout::measure::Measure;
use crate::layout::metrics::SizeLevel;
use crate::layout::page::{Boundary, Page, PageItem};

/// One edge of an extracted page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractEdge {
    pub id: BlockId,
    /// True when the edge block continues on a neighbouring page
    pub paginated: bool,
    /// First visible character of the edge block, absent for whole blocks
    pub char_from: Option<usize>,
    /// Last visible character of the edge block, absent for whole blocks
    pub char_to: Option<usize>,
    /// The cut position itself: `char_from` on the opening edge,
    /// `char_to` on the closing edge
    pub char_offset: Option<usize>,
}

impl ExtractEdge {
    fn whole(id: BlockId) -> Self {
        Self {
            id,
            paginated: false,
            char_from: None,
            char_to: None,
            char_offset: None,
        }
    }

    fn divided(id: BlockId, divided: &DividedText, char_offset: usize) -> Self {
        Self {
            id,
            paginated: true,
            char_from: Some(divided.char_from),
            char_to: Some(divided.char_to),
            char_offset: Some(char_offset),
        }
    }
}

/// Boundary offsets and visible text of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageExtract {
    pub page_index: usize,
    pub item_from: ExtractEdge,
    pub item_to: ExtractEdge,
    /// Visible text, one entry per textual block in page order
    pub fragments: Vec<String>,
}

/// Resolve a page's edges to character offsets and collect its text.
///
/// Split edge blocks contribute only their visible slice, interior
/// blocks their whole text. Returns `None` for a page without items.
pub fn extract<M: Measure + ?Sized>(
    page: &Page,
    document: &Document,
    measurer: &M,
    size: SizeLevel,
) -> Option<PageExtract> {
    let first = page.first_item()?;
    let last = page.last_item()?;
    let boundary_from = page
        .boundary_from
        .unwrap_or_else(|| Boundary::new(first.id, first.block_type));
    let boundary_to = page
        .boundary_to
        .unwrap_or_else(|| Boundary::new(last.id, last.block_type));

    // A block split on both edges covers the whole page, so one interior
    // division serves both.
    let same_block =
        boundary_from.paginated && boundary_to.paginated && boundary_from.id == boundary_to.id;

    let mut from_division = None;
    let mut to_division = None;
    if same_block {
        let range = LineRange::Middle {
            first_line: first.lines_offset + 1,
            last_line: last.lines_offset + last.lines,
        };
        from_division = edge_division(measurer, document, first, range, size);
    } else {
        if boundary_from.paginated {
            let range = LineRange::Tail {
                first_line: first.lines_offset + 1,
            };
            from_division = edge_division(measurer, document, first, range, size);
        }
        if boundary_to.paginated {
            let range = LineRange::Head {
                last_line: last.lines_offset + last.lines,
            };
            to_division = edge_division(measurer, document, last, range, size);
        }
    }

    let item_from = match &from_division {
        Some(divided) => ExtractEdge::divided(boundary_from.id, divided, divided.char_from),
        None => ExtractEdge::whole(boundary_from.id),
    };
    let closing = if same_block {
        from_division.as_ref()
    } else {
        to_division.as_ref()
    };
    let item_to = match closing {
        Some(divided) => ExtractEdge::divided(boundary_to.id, divided, divided.char_to),
        None => ExtractEdge::whole(boundary_to.id),
    };

    let mut fragments = Vec::new();
    if let Some(divided) = &from_division {
        fragments.push(divided.text.clone());
    }
    let skip_first = from_division.is_some();
    let skip_last = to_division.is_some();
    let count = page.items.len();
    for (position, item) in page.items.iter().enumerate() {
        if position == 0 && skip_first {
            continue;
        }
        if position + 1 == count && skip_last {
            continue;
        }
        match document.get(item.id) {
            Some(block) => {
                if let Some(content) = block.textual() {
                    fragments.push(content.text.clone());
                }
            }
            None => warn!("block {} missing from document, skipping its text", item.id),
        }
    }
    if let Some(divided) = &to_division {
        fragments.push(divided.text.clone());
    }

    Some(PageExtract {
        page_index: page.index,
        item_from,
        item_to,
        fragments,
    })
}

fn edge_division<M: Measure + ?Sized>(
    measurer: &M,
    document: &Document,
    item: &PageItem,
    range: LineRange,
    size: SizeLevel,
) -> Option<DividedText> {
    let block = match document.get(item.id) {
        Some(block) => block,
        None => {
            warn!("block {} missing from document, edge offset dropped", item.id);
            return None;
        }
    };
    let content = match block.textual() {
        Some(content) => content,
        None => {
            warn!("block {} carries no text to slice at a page edge", item.id);
            return None;
        }
    };
    let baseline = match item.baseline.text() {
        Some(baseline) => baseline,
        None => {
            warn!("block {} carries no text baseline, edge offset dropped", item.id);
            return None;
        }
    };
    Some(divide(measurer, block, content, baseline, range, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{normalize_block, Block, BlockType, RawBlock};
    use crate::layout::measure::{CharGridMeasurer, StylePreset};
    use crate::layout::metrics::{Baseline, TextBaseline};
    use crate::Viewport;

    fn fixture_measurer() -> CharGridMeasurer {
        CharGridMeasurer::with_preset(
            Viewport::new(200.0, 300.0),
            StylePreset {
                font_size: 50.0,
                line_height: 100.0,
                padding_top: 0.0,
                padding_bottom: 0.0,
                margin_bottom: 0.0,
            },
        )
    }

    fn text_item(
        measurer: &CharGridMeasurer,
        block: &Block,
        offset: f32,
        lines: u32,
        lines_offset: u32,
    ) -> PageItem {
        let metrics = measurer.text_metrics(block, SizeLevel::S).unwrap();
        PageItem {
            id: block.id,
            block_type: BlockType::Text,
            offset,
            lines,
            lines_offset,
            baseline: Baseline::Text(TextBaseline::from_metrics(&metrics)),
        }
    }

    fn four_line_block() -> Block {
        normalize_block(&RawBlock::text(1, "aaaaaaa bbbbbbb ccccccc ddddddd")).unwrap()
    }

    fn document_of(blocks: Vec<Block>) -> Document {
        let mut document = Document::new();
        for block in blocks {
            document.push(block);
        }
        document
    }

    #[test]
    fn test_extract_head_of_split_block() {
        let measurer = fixture_measurer();
        let block = four_line_block();
        let mut page = Page::new(0);
        page.height = 300.0;
        page.items
            .push(text_item(&measurer, &block, 0.0, 3, 0));
        page.boundary_from = Some(Boundary::new(block.id, BlockType::Text));
        page.boundary_to = Some(Boundary::split(block.id, BlockType::Text));
        let document = document_of(vec![block]);

        let extracted = extract(&page, &document, &measurer, SizeLevel::S).unwrap();
        assert!(!extracted.item_from.paginated);
        assert_eq!(extracted.item_from.char_offset, None);
        assert!(extracted.item_to.paginated);
        assert_eq!(extracted.item_to.char_from, Some(0));
        assert_eq!(extracted.item_to.char_to, Some(22));
        assert_eq!(extracted.item_to.char_offset, Some(22));
        assert_eq!(extracted.fragments, vec!["aaaaaaa bbbbbbb ccccccc"]);
    }

    #[test]
    fn test_extract_tail_of_split_block() {
        let measurer = fixture_measurer();
        let block = four_line_block();
        let mut page = Page::new(1);
        page.height = 100.0;
        page.items
            .push(text_item(&measurer, &block, 300.0, 1, 3));
        page.boundary_from = Some(Boundary::split(block.id, BlockType::Text));
        page.boundary_to = Some(Boundary::new(block.id, BlockType::Text));
        let document = document_of(vec![block]);

        let extracted = extract(&page, &document, &measurer, SizeLevel::S).unwrap();
        assert!(extracted.item_from.paginated);
        assert_eq!(extracted.item_from.char_from, Some(24));
        assert_eq!(extracted.item_from.char_to, Some(30));
        assert_eq!(extracted.item_from.char_offset, Some(24));
        assert!(!extracted.item_to.paginated);
        assert_eq!(extracted.item_to.char_offset, None);
        assert_eq!(extracted.fragments, vec!["ddddddd"]);
    }

    #[test]
    fn test_extract_interior_of_block_split_both_ways() {
        let measurer = fixture_measurer();
        let block = four_line_block();
        let mut page = Page::new(1);
        page.height = 200.0;
        page.items
            .push(text_item(&measurer, &block, 100.0, 2, 1));
        page.boundary_from = Some(Boundary::split(block.id, BlockType::Text));
        page.boundary_to = Some(Boundary::split(block.id, BlockType::Text));
        let document = document_of(vec![block]);

        let extracted = extract(&page, &document, &measurer, SizeLevel::S).unwrap();
        assert_eq!(extracted.item_from.char_offset, Some(8));
        assert_eq!(extracted.item_to.char_offset, Some(22));
        assert_eq!(extracted.fragments, vec!["bbbbbbb ccccccc"]);
    }

    #[test]
    fn test_extract_whole_blocks_in_order() {
        let measurer = fixture_measurer();
        let one = normalize_block(&RawBlock::text(1, "one")).unwrap();
        let two = normalize_block(&RawBlock::text(2, "two")).unwrap();
        let mut page = Page::new(0);
        page.height = 200.0;
        page.items.push(text_item(&measurer, &one, 0.0, 1, 0));
        page.items.push(text_item(&measurer, &two, 0.0, 1, 0));
        page.boundary_from = Some(Boundary::new(one.id, BlockType::Text));
        page.boundary_to = Some(Boundary::new(two.id, BlockType::Text));
        let document = document_of(vec![one, two]);

        let extracted = extract(&page, &document, &measurer, SizeLevel::S).unwrap();
        assert_eq!(extracted.item_from.char_offset, None);
        assert_eq!(extracted.item_to.char_offset, None);
        assert_eq!(extracted.fragments, vec!["one", "two"]);
    }

    #[test]
    fn test_extract_empty_page_is_none() {
        let measurer = fixture_measurer();
        let page = Page::new(0);
        let document = Document::new();
        assert!(extract(&page, &document, &measurer, SizeLevel::S).is_none());
    }
}
