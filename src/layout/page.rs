//! Page records and the block-to-page index

use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::document::{BlockId, BlockType};
use crate::layout::metrics::Baseline;

/// Marks which block a page starts or ends with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub id: BlockId,
    pub block_type: BlockType,
    /// True when the block continues across this page edge
    pub paginated: bool,
}

impl Boundary {
    pub fn new(id: BlockId, block_type: BlockType) -> Self {
        Self {
            id,
            block_type,
            paginated: false,
        }
    }

    pub fn split(id: BlockId, block_type: BlockType) -> Self {
        Self {
            id,
            block_type,
            paginated: true,
        }
    }
}

/// One block placement on a page
#[derive(Debug, Clone, PartialEq)]
pub struct PageItem {
    pub id: BlockId,
    pub block_type: BlockType,
    /// Vertical pixels of this block consumed by earlier pages
    pub offset: f32,
    /// Lines visible on this page, zero for images
    pub lines: u32,
    /// Lines consumed by earlier pages
    pub lines_offset: u32,
    pub baseline: Baseline,
}

/// One laid-out page
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub height: f32,
    pub markup: String,
    pub items: Vec<PageItem>,
    pub boundary_from: Option<Boundary>,
    pub boundary_to: Option<Boundary>,
}

impl Page {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            height: 0.0,
            markup: String::new(),
            items: Vec::new(),
            boundary_from: None,
            boundary_to: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first_item(&self) -> Option<&PageItem> {
        self.items.first()
    }

    pub fn last_item(&self) -> Option<&PageItem> {
        self.items.last()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }
}

/// Pages a block appears on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSpan {
    /// Block sits whole on one page
    Single(usize),
    /// Block is split across consecutive pages
    Spanned(SmallVec<[usize; 2]>),
}

impl PageSpan {
    pub fn pages(&self) -> &[usize] {
        match self {
            PageSpan::Single(page) => std::slice::from_ref(page),
            PageSpan::Spanned(pages) => pages,
        }
    }

    pub fn first(&self) -> Option<usize> {
        self.pages().first().copied()
    }

    pub fn is_split(&self) -> bool {
        matches!(self, PageSpan::Spanned(_))
    }
}

/// Index from block id to the pages it occupies
#[derive(Debug, Clone, Default)]
pub struct PageMap {
    entries: FxHashMap<BlockId, PageSpan>,
}

impl PageMap {
    pub fn get(&self, id: BlockId) -> Option<&PageSpan> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Record a block sitting whole on one page
    pub fn set_single(&mut self, id: BlockId, page: usize) {
        self.entries.insert(id, PageSpan::Single(page));
    }

    /// Open a span for a block that starts splitting on this page
    pub fn start_span(&mut self, id: BlockId, page: usize) {
        self.entries.insert(id, PageSpan::Spanned(smallvec![page]));
    }

    /// Append the next page of an open span
    pub fn extend_span(&mut self, id: BlockId, page: usize) {
        if let Some(PageSpan::Spanned(pages)) = self.entries.get_mut(&id) {
            pages.push(page);
            return;
        }
        self.start_span(id, page);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_flags() {
        let plain = Boundary::new(BlockId(1), BlockType::Text);
        assert!(!plain.paginated);
        let split = Boundary::split(BlockId(1), BlockType::Text);
        assert!(split.paginated);
    }

    #[test]
    fn test_page_item_access() {
        let mut page = Page::new(0);
        assert!(page.is_empty());
        assert!(page.first_item().is_none());

        let baseline = Baseline::Image(crate::layout::metrics::ImageBaseline {
            zoomed_width: 10.0,
            zoomed_height: 10.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            margin_bottom: 0.0,
            min_containable_height: 10.0,
            min_content_height: 10.0,
            content_height: 10.0,
            complete_height: 10.0,
        });
        page.items.push(PageItem {
            id: BlockId(4),
            block_type: BlockType::Image,
            offset: 0.0,
            lines: 0,
            lines_offset: 0,
            baseline,
        });
        assert!(page.contains(BlockId(4)));
        assert!(!page.contains(BlockId(5)));
        assert_eq!(page.last_item().map(|i| i.id), Some(BlockId(4)));
    }

    #[test]
    fn test_span_pages_view() {
        let single = PageSpan::Single(3);
        assert_eq!(single.pages(), &[3]);
        assert_eq!(single.first(), Some(3));
        assert!(!single.is_split());

        let spanned = PageSpan::Spanned(smallvec![1, 2, 3]);
        assert_eq!(spanned.pages(), &[1, 2, 3]);
        assert!(spanned.is_split());
    }

    #[test]
    fn test_map_single_then_span() {
        let mut map = PageMap::default();
        map.set_single(BlockId(7), 0);
        assert_eq!(map.get(BlockId(7)), Some(&PageSpan::Single(0)));

        map.start_span(BlockId(8), 0);
        map.extend_span(BlockId(8), 1);
        map.extend_span(BlockId(8), 2);
        assert_eq!(
            map.get(BlockId(8)).map(PageSpan::pages),
            Some(&[0usize, 1, 2][..])
        );
        assert_eq!(map.len(), 2);

        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn test_extend_without_open_span() {
        let mut map = PageMap::default();
        map.extend_span(BlockId(9), 4);
        assert_eq!(map.get(BlockId(9)), Some(&PageSpan::Spanned(smallvec![4])));
    }
}
