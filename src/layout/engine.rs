//! The paginator: block placement, page bookkeeping and lookups

use log::{debug, error, warn};

use crate::document::{
    normalize_blocks, Block, BlockContent, BlockId, Document, ImageContent, RawBlock, TextContent,
};
use crate::error::LayoutError;
use crate::layout::extract::{self, PageExtract};
use crate::layout::highlight;
use crate::layout::measure::{BoxSizing, Measure, MeasureError, ZoomedSize};
use crate::layout::metrics::{fitted_height, Baseline, ImageBaseline, SizeLevel, TextBaseline};
use crate::layout::page::{Boundary, Page, PageItem, PageMap, PageSpan};
use crate::render::markup;
use crate::Viewport;

/// Paginates blocks into fixed-height pages and answers lookups on the
/// result.
///
/// All state lives here: the validated document, the laid-out pages and
/// the block-to-page index. Lookups never fail hard, they log and return
/// a sentinel; only a broken measurement environment aborts a render.
pub struct Paginator<M: Measure> {
    measurer: M,
    size: SizeLevel,
    viewport: Viewport,
    document: Document,
    pages: Vec<Page>,
    page_map: PageMap,
}

impl<M: Measure> Paginator<M> {
    pub fn new(measurer: M, size: SizeLevel) -> Self {
        let viewport = measurer.viewport();
        Self {
            measurer,
            size,
            viewport,
            document: Document::new(),
            pages: Vec::new(),
            page_map: PageMap::default(),
        }
    }

    /// Lay out blocks from scratch, replacing any previous pages
    pub fn render(&mut self, blocks: &[RawBlock]) -> Result<&[Page], LayoutError> {
        self.render_impl(blocks, false)
    }

    /// Append blocks to the existing layout, reopening the last page
    pub fn render_more(&mut self, blocks: &[RawBlock]) -> Result<&[Page], LayoutError> {
        self.render_impl(blocks, true)
    }

    fn render_impl(&mut self, blocks: &[RawBlock], resume: bool) -> Result<&[Page], LayoutError> {
        if blocks.is_empty() {
            warn!("there is nothing to render");
            return Ok(&[]);
        }
        self.viewport = self.validate_environment()?;
        if resume {
            self.reopen_last_page();
        } else {
            self.reset();
        }

        let start = self.document.len();
        for block in normalize_blocks(blocks) {
            self.document.push(block);
        }

        let outcome = {
            let mut pass = RenderPass {
                measurer: &self.measurer,
                size: self.size,
                viewport: self.viewport,
                pages: &mut self.pages,
                page_map: &mut self.page_map,
            };
            pass.run(&self.document.blocks()[start..])
        };
        if let Err(failure) = outcome {
            error!("measurement failed mid-render ({}), dropping all pages", failure);
            self.reset();
            return Err(failure.into());
        }
        Ok(&self.pages)
    }

    /// Serialize blocks as one continuous strip, without pagination.
    ///
    /// Page breaks carry no meaning here and are skipped. Leaves the
    /// paginated state untouched.
    pub fn render_flat(&self, blocks: &[RawBlock]) -> Result<String, LayoutError> {
        if blocks.is_empty() {
            warn!("there is nothing to render");
            return Ok(String::new());
        }
        let viewport = self.validate_environment()?;

        let mut out = String::new();
        for block in normalize_blocks(blocks) {
            match &block.content {
                BlockContent::Text(content) | BlockContent::Heading { content, .. } => {
                    out.push_str(&markup::text_markup(&block, content, self.size, 0.0, None));
                }
                BlockContent::Image(image) => {
                    let zoomed = self.measurer.image_size(
                        image.natural_width,
                        image.natural_height,
                        viewport.width,
                        self.size.image_ratio(),
                    );
                    out.push_str(&markup::image_markup(&block, image, zoomed, self.size));
                }
                BlockContent::PageBreak => {
                    debug!("page break {} is ignored without pagination", block.id);
                }
            }
        }
        Ok(out)
    }

    /// Page index showing the block, or its page showing `char_offset`.
    ///
    /// A block split over several pages needs the offset to pick one;
    /// without it the first page is returned.
    pub fn locate(&self, id: BlockId, char_offset: Option<usize>) -> Option<usize> {
        let span = match self.page_map.get(id) {
            Some(span) => span,
            None => {
                warn!("block {} is not on any page", id);
                return None;
            }
        };
        match span {
            PageSpan::Single(page) => Some(*page),
            PageSpan::Spanned(pages) => {
                let offset = match char_offset {
                    Some(offset) => offset,
                    None => {
                        debug!("block {} spans several pages, taking the first", id);
                        return pages.first().copied();
                    }
                };
                for &page_index in pages {
                    if let Some(extracted) = self.extract_page(page_index) {
                        let covers = extracted.item_to.id != id
                            || extracted.item_to.char_offset.map_or(true, |end| offset <= end);
                        if covers {
                            return Some(page_index);
                        }
                    }
                }
                debug!(
                    "offset {} of block {} is past its last page, taking the first",
                    offset, id
                );
                pages.first().copied()
            }
        }
    }

    /// Same as [`locate`](Self::locate), but an unknown id resolves to
    /// the nearest block with an id at or above it.
    pub fn locate_approximate(&self, id: BlockId, char_offset: Option<usize>) -> Option<usize> {
        if self.page_map.contains(id) {
            return self.locate(id, char_offset);
        }
        match self.document.nearest_at_or_after(id) {
            Some(block) => {
                debug!("block {} is unknown, standing in block {}", id, block.id);
                self.locate(block.id, char_offset)
            }
            None => {
                warn!("no block at or after {} to locate", id);
                None
            }
        }
    }

    /// Edge offsets and visible text of one page
    pub fn extract_page(&self, page_index: usize) -> Option<PageExtract> {
        if self.pages.is_empty() {
            warn!("there is nothing to extract");
            return None;
        }
        let page = match self.pages.get(page_index) {
            Some(page) => page,
            None => {
                warn!("page index {} is out of range", page_index);
                return None;
            }
        };
        if page.is_empty() {
            warn!("page {} has no content to extract", page_index);
            return None;
        }
        extract::extract(page, &self.document, &self.measurer, self.size)
    }

    /// Visible text of one page as a single string.
    ///
    /// Fragments are joined with `separator` (newline when absent) and
    /// the result truncated to `max_length` characters when given.
    pub fn extract_page_text(
        &self,
        page_index: usize,
        separator: Option<&str>,
        max_length: Option<usize>,
    ) -> Option<String> {
        let extracted = self.extract_page(page_index)?;
        let joined = extracted.fragments.join(separator.unwrap_or("\n"));
        Some(match max_length {
            Some(max) if joined.chars().count() > max => joined.chars().take(max).collect(),
            _ => joined,
        })
    }

    /// Plain text between two character positions of the document.
    ///
    /// Takes every textual block with an id inside the range, slicing
    /// the endpoint blocks at the given offsets, and joins with
    /// newlines. Non-textual blocks are passed over.
    pub fn excerpt(
        &self,
        from_id: BlockId,
        from_offset: usize,
        to_id: BlockId,
        to_offset: usize,
    ) -> String {
        if from_id > to_id {
            warn!("excerpt range {}..{} is reversed", from_id, to_id);
            return String::new();
        }
        let mut parts: Vec<&str> = Vec::new();
        for block in self.document.blocks() {
            if block.id < from_id || block.id > to_id {
                continue;
            }
            let content = match block.textual() {
                Some(content) => content,
                None => continue,
            };
            let piece = if block.id == from_id && block.id == to_id {
                content.slice_chars(from_offset, Some(to_offset))
            } else if block.id == from_id {
                content.slice_chars(from_offset, None)
            } else if block.id == to_id {
                content.slice_chars(0, Some(to_offset))
            } else {
                &content.text
            };
            parts.push(piece);
        }
        parts.join("\n")
    }

    /// Markup of one page with keyword occurrences painted
    pub fn highlight(&self, page_index: usize, keyword: &str) -> Option<String> {
        match self.pages.get(page_index) {
            Some(page) => Some(highlight::highlight(
                page,
                &self.document,
                self.viewport,
                self.size,
                keyword,
            )),
            None => {
                warn!("page index {} is out of range", page_index);
                None
            }
        }
    }

    /// Switch the size level; a change discards all pages
    pub fn set_size_level(&mut self, size: SizeLevel) {
        if self.size != size {
            self.size = size;
            self.reset();
        }
    }

    /// Drop the document, pages and index
    pub fn reset(&mut self) {
        self.document.clear();
        self.pages.clear();
        self.page_map.clear();
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_map(&self) -> &PageMap {
        &self.page_map
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn size(&self) -> SizeLevel {
        self.size
    }

    fn validate_environment(&self) -> Result<Viewport, LayoutError> {
        let sizing = self.measurer.box_sizing();
        if sizing != BoxSizing::ContentBox {
            warn!("measurement backend reports {:?} boxes, content-box is required", sizing);
            return Err(LayoutError::BoxSizing(sizing));
        }
        let viewport = self.measurer.viewport();
        if !viewport.is_valid() {
            warn!(
                "viewport {}x{} cannot host any content",
                viewport.width, viewport.height
            );
            return Err(LayoutError::Viewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        Ok(viewport)
    }

    /// Strip the last page back to raw item markup so new blocks append
    fn reopen_last_page(&mut self) {
        if let Some(page) = self.pages.last_mut() {
            let mut inner = String::new();
            for item in &page.items {
                match self.document.get(item.id) {
                    Some(block) => {
                        if let Some(rebuilt) = rebuilt_item_markup(block, item, self.size) {
                            inner.push_str(&rebuilt);
                        }
                    }
                    None => warn!("block {} missing from document, markup dropped", item.id),
                }
            }
            page.markup = inner;
        }
    }
}

/// One placement pass over freshly added blocks
struct RenderPass<'a, M: Measure> {
    measurer: &'a M,
    size: SizeLevel,
    viewport: Viewport,
    pages: &'a mut Vec<Page>,
    page_map: &'a mut PageMap,
}

impl<M: Measure> RenderPass<'_, M> {
    fn run(&mut self, blocks: &[Block]) -> Result<(), MeasureError> {
        if self.pages.is_empty() {
            self.push_empty_page();
        }
        let count = blocks.len();
        for (position, block) in blocks.iter().enumerate() {
            match &block.content {
                BlockContent::Text(content) => self.place_text(block, content)?,
                BlockContent::Heading { content, .. } => self.place_text(block, content)?,
                BlockContent::Image(image) => self.place_image(block, image),
                BlockContent::PageBreak => {
                    // a trailing page break would only open a page that stays empty
                    if position + 1 != count {
                        self.place_break();
                    }
                }
            }
        }
        self.close_page();
        Ok(())
    }

    fn place_text(&mut self, block: &Block, content: &TextContent) -> Result<(), MeasureError> {
        let metrics = self.measurer.text_metrics(block, self.size)?;
        let baseline = TextBaseline::from_metrics(&metrics);
        let rest = self.rest_height();
        if rest > 0.0 && rest >= baseline.min_containable_height {
            if rest >= baseline.min_content_height {
                let item_markup = markup::text_markup(block, content, self.size, 0.0, None);
                self.place_whole(block, Baseline::Text(baseline), item_markup, rest);
            } else {
                let page = self.current_page_mut();
                if page.items.is_empty() {
                    page.boundary_from = Some(Boundary::new(block.id, block.block_type()));
                }
                self.split_text(block, content, &baseline);
            }
        } else {
            self.close_page();
            if baseline.min_content_height > self.viewport.height {
                self.start_blank_page();
                let page = self.current_page_mut();
                page.boundary_from = Some(Boundary::new(block.id, block.block_type()));
                self.split_text(block, content, &baseline);
            } else {
                let item_markup = markup::text_markup(block, content, self.size, 0.0, None);
                self.push_whole_page(block, Baseline::Text(baseline), item_markup);
            }
        }
        Ok(())
    }

    fn place_image(&mut self, block: &Block, image: &ImageContent) {
        let spacing = self.measurer.image_spacing(self.size);
        let baseline = ImageBaseline::compute(image, &spacing, self.viewport, self.size);
        let zoomed = ZoomedSize {
            width: baseline.zoomed_width,
            height: baseline.zoomed_height,
        };
        let item_markup = markup::image_markup(block, image, zoomed, self.size);
        let rest = self.rest_height();
        if rest > 0.0 && rest >= baseline.min_containable_height {
            self.place_whole(block, Baseline::Image(baseline), item_markup, rest);
        } else {
            self.close_page();
            if baseline.min_content_height > self.viewport.height {
                debug!(
                    "image block {} is taller than the viewport, it gets a page of its own",
                    block.id
                );
            }
            self.push_whole_page(block, Baseline::Image(baseline), item_markup);
        }
    }

    /// Close the current page and open a fresh one behind it
    fn place_break(&mut self) {
        if self.pages.last().map_or(true, |page| page.is_empty()) {
            return;
        }
        self.close_page();
        self.push_empty_page();
    }

    /// Put a block that fits in the remaining space on the current page
    fn place_whole(&mut self, block: &Block, baseline: Baseline, item_markup: String, rest: f32) {
        let fitted = fitted_height(
            rest,
            baseline.min_content_height(),
            baseline.content_height(),
            baseline.complete_height(),
        );
        let lines = baseline.text().map_or(0, |text| text.computed_lines);
        let page_index = {
            let page = self.current_page_mut();
            page.items.push(PageItem {
                id: block.id,
                block_type: block.block_type(),
                offset: 0.0,
                lines,
                lines_offset: 0,
                baseline,
            });
            page.markup.push_str(&item_markup);
            page.height += fitted;
            if page.items.len() == 1 {
                page.boundary_from = Some(Boundary::new(block.id, block.block_type()));
            }
            page.index
        };
        self.page_map.set_single(block.id, page_index);
    }

    /// Split a text block over as many pages as its lines need.
    ///
    /// Every filled page is closed on the spot with a split boundary;
    /// the final slice stays open for the following block.
    fn split_text(&mut self, block: &Block, content: &TextContent, baseline: &TextBaseline) {
        let block_type = block.block_type();
        let mut prev_offset = 0.0f32;
        let mut prev_lines = 0u32;
        loop {
            let (page_index, lines, consumed) = {
                let size = self.size;
                let viewport = self.viewport;
                let page = self.current_page_mut();
                let rest_text = viewport.height - page.height - baseline.padding_top;
                let (lines, text_offset) =
                    line_budget(baseline, rest_text, viewport.height, page.items.is_empty());
                let offset_height = text_offset + baseline.padding_top;
                page.items.push(PageItem {
                    id: block.id,
                    block_type,
                    offset: prev_offset,
                    lines,
                    lines_offset: prev_lines,
                    baseline: Baseline::Text(*baseline),
                });
                page.markup
                    .push_str(&markup::text_markup(block, content, size, prev_offset, None));
                page.height += offset_height;
                page.boundary_to = Some(Boundary::split(block.id, block_type));
                if prev_offset > 0.0 {
                    page.boundary_from = Some(Boundary::split(block.id, block_type));
                }
                page.markup = markup::wrap_page(&page.markup, viewport, page.height);
                (page.index, lines, offset_height + prev_offset)
            };
            if prev_offset > 0.0 {
                self.page_map.extend_span(block.id, page_index);
            } else {
                self.page_map.start_span(block.id, page_index);
            }

            if baseline.min_content_height - consumed > self.viewport.height {
                self.push_empty_page();
                prev_offset = consumed;
                prev_lines += lines;
                continue;
            }

            let shown = prev_lines + lines;
            let index = self.pages.len();
            let mut tail = Page::new(index);
            tail.height = baseline.complete_height - consumed;
            tail.markup = markup::text_markup(block, content, self.size, consumed, None);
            tail.items.push(PageItem {
                id: block.id,
                block_type,
                offset: consumed,
                lines: baseline.computed_lines.saturating_sub(shown),
                lines_offset: shown,
                baseline: Baseline::Text(*baseline),
            });
            tail.boundary_from = Some(Boundary::split(block.id, block_type));
            self.pages.push(tail);
            self.page_map.extend_span(block.id, index);
            return;
        }
    }

    /// Put a block alone on a fresh page, open for followers
    fn push_whole_page(&mut self, block: &Block, baseline: Baseline, item_markup: String) {
        self.start_blank_page();
        let lines = baseline.text().map_or(0, |text| text.computed_lines);
        let complete = baseline.complete_height();
        let page_index = {
            let page = self.current_page_mut();
            page.items.push(PageItem {
                id: block.id,
                block_type: block.block_type(),
                offset: 0.0,
                lines,
                lines_offset: 0,
                baseline,
            });
            page.markup = item_markup;
            page.height = complete;
            page.boundary_from = Some(Boundary::new(block.id, block.block_type()));
            page.index
        };
        self.page_map.set_single(block.id, page_index);
    }

    /// Seal the current page: trailing boundary plus wrapped markup
    fn close_page(&mut self) {
        let viewport = self.viewport;
        let page = self.current_page_mut();
        let last = match page.items.last() {
            Some(last) => Boundary::new(last.id, last.block_type),
            None => return,
        };
        page.boundary_to = Some(last);
        page.markup = markup::wrap_page(&page.markup, viewport, page.height);
    }

    fn start_blank_page(&mut self) {
        if self.pages.last().map_or(true, |page| !page.is_empty()) {
            self.push_empty_page();
        }
    }

    fn push_empty_page(&mut self) {
        let index = self.pages.len();
        self.pages.push(Page::new(index));
    }

    fn current_page_mut(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.push_empty_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn rest_height(&self) -> f32 {
        self.viewport.height - self.pages.last().map_or(0.0, |page| page.height)
    }
}

/// Lines of a split block the current page can still take, with their
/// pixel height. An empty page always takes at least one line or layout
/// would stall on content taller than the viewport.
fn line_budget(
    baseline: &TextBaseline,
    rest_text: f32,
    viewport_height: f32,
    page_empty: bool,
) -> (u32, f32) {
    let capped = rest_text.min(viewport_height);
    let ratio = capped / baseline.computed_line_height;
    let mut lines = if ratio.is_finite() && ratio > 0.0 {
        ratio.floor() as u32
    } else {
        0
    };
    if lines == 0 && page_empty {
        lines = 1;
    }
    (lines, lines as f32 * baseline.computed_line_height)
}

fn rebuilt_item_markup(block: &Block, item: &PageItem, size: SizeLevel) -> Option<String> {
    if let Some(content) = block.textual() {
        return Some(markup::text_markup(block, content, size, item.offset, None));
    }
    if let BlockContent::Image(image) = &block.content {
        return item.baseline.image().map(|baseline| {
            let zoomed = ZoomedSize {
                width: baseline.zoomed_width,
                height: baseline.zoomed_height,
            };
            markup::image_markup(block, image, zoomed, size)
        });
    }
    None
}
