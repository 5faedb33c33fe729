//! Document model: validated content blocks and their lookup index

pub mod block;
pub mod division;

pub use block::{
    Block, BlockContent, BlockId, BlockType, HeadingLevel, ImageContent, RawBlock, RawPayload,
    TextContent,
};
pub use division::{Division, Token, TokenKind};

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

static EXTRA_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs to single spaces
pub fn normalize_text(text: &str) -> String {
    EXTRA_SPACE.replace_all(text, " ").into_owned()
}

/// Validate one raw block, producing `None` for malformed input
pub fn normalize_block(raw: &RawBlock) -> Option<Block> {
    let id = BlockId(raw.id);
    let content = match &raw.payload {
        RawPayload::Text { text } => {
            let text = normalize_text(text);
            if text.trim().is_empty() {
                warn!("block {} has no text, skipping", id);
                return None;
            }
            BlockContent::Text(TextContent::new(text))
        }
        RawPayload::Heading { level, text } => {
            let Some(level) = HeadingLevel::from_number(*level) else {
                warn!("block {} has unsupported heading level {}, skipping", id, level);
                return None;
            };
            let text = normalize_text(text);
            if text.trim().is_empty() {
                warn!("block {} has no text, skipping", id);
                return None;
            }
            BlockContent::Heading {
                level,
                content: TextContent::new(text),
            }
        }
        RawPayload::Image {
            src,
            natural_width,
            natural_height,
        } => {
            if !(natural_width.is_finite()
                && natural_height.is_finite()
                && *natural_width > 0.0
                && *natural_height > 0.0)
            {
                warn!(
                    "block {} has invalid image dimensions {}x{}, skipping",
                    id, natural_width, natural_height
                );
                return None;
            }
            BlockContent::Image(ImageContent {
                src: src.clone(),
                natural_width: *natural_width,
                natural_height: *natural_height,
            })
        }
        RawPayload::PageBreak => BlockContent::PageBreak,
    };
    Some(Block { id, content })
}

/// Validate a batch, dropping (and logging) whatever fails
pub fn normalize_blocks(raw: &[RawBlock]) -> Vec<Block> {
    raw.iter().filter_map(normalize_block).collect()
}

/// Ordered collection of validated blocks with id lookup
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
    index: FxHashMap<BlockId, usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.index.get(&id).map(|&pos| &self.blocks[pos])
    }

    /// Position of a block within the document order
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.index.contains_key(&id)
    }

    /// Append a block; duplicates of an existing id are refused
    pub fn push(&mut self, block: Block) -> bool {
        if self.contains(block.id) {
            warn!("block {} already present, skipping duplicate", block.id);
            return false;
        }
        self.index.insert(block.id, self.blocks.len());
        self.blocks.push(block);
        true
    }

    /// First block whose id is greater than or equal to the requested one
    pub fn nearest_at_or_after(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id >= id)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a  b\t\nc"), "a b c");
        assert_eq!(normalize_text("plain"), "plain");
    }

    #[test]
    fn test_normalize_block_skips_malformed() {
        assert!(normalize_block(&RawBlock::text(1, "   ")).is_none());
        assert!(normalize_block(&RawBlock::heading(2, 4, "deep")).is_none());
        assert!(normalize_block(&RawBlock::image(3, "x.png", 0.0, 240.0)).is_none());
        assert!(normalize_block(&RawBlock::image(4, "x.png", f32::NAN, 240.0)).is_none());
        assert!(normalize_block(&RawBlock::page_break(5)).is_some());
    }

    #[test]
    fn test_normalize_batch_keeps_valid_order() {
        let raw = vec![
            RawBlock::text(1, "one"),
            RawBlock::heading(2, 9, "bad"),
            RawBlock::text(3, "three"),
        ];
        let blocks = normalize_blocks(&raw);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].id, BlockId(1));
        assert_eq!(blocks[1].id, BlockId(3));
    }

    #[test]
    fn test_document_lookup() {
        let mut document = Document::new();
        for block in normalize_blocks(&[
            RawBlock::text(5, "a"),
            RawBlock::text(10, "b"),
            RawBlock::text(15, "c"),
        ]) {
            assert!(document.push(block));
        }
        assert_eq!(document.len(), 3);
        assert_eq!(document.position(BlockId(10)), Some(1));
        assert!(document.get(BlockId(7)).is_none());
    }

    #[test]
    fn test_duplicate_id_refused() {
        let mut document = Document::new();
        assert!(document.push(normalize_block(&RawBlock::text(1, "a")).unwrap()));
        assert!(!document.push(normalize_block(&RawBlock::text(1, "again")).unwrap()));
        assert_eq!(document.len(), 1);
        assert_eq!(
            document
                .get(BlockId(1))
                .and_then(Block::textual)
                .map(|c| c.text.as_str()),
            Some("a")
        );
    }

    #[test]
    fn test_nearest_at_or_after() {
        let mut document = Document::new();
        for block in normalize_blocks(&[
            RawBlock::text(5, "a"),
            RawBlock::text(10, "b"),
            RawBlock::text(15, "c"),
        ]) {
            document.push(block);
        }
        assert_eq!(
            document.nearest_at_or_after(BlockId(7)).map(|b| b.id),
            Some(BlockId(10))
        );
        assert_eq!(
            document.nearest_at_or_after(BlockId(1)).map(|b| b.id),
            Some(BlockId(5))
        );
        assert_eq!(
            document.nearest_at_or_after(BlockId(15)).map(|b| b.id),
            Some(BlockId(15))
        );
        assert!(document.nearest_at_or_after(BlockId(16)).is_none());
    }
}
