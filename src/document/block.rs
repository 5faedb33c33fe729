//! Content block types and their wire form

use serde::{Deserialize, Serialize};

use crate::document::division::Division;

/// Caller-assigned block identifier, unique and ascending within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four block categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Text,
    Heading,
    Image,
    PageBreak,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::Image => "image",
            BlockType::PageBreak => "pagebreak",
        }
    }
}

/// Heading depth, limited to three levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn from_number(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

/// Unvalidated block as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub id: u64,
    #[serde(flatten)]
    pub payload: RawPayload,
}

/// Payload half of the wire form, tagged by block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum RawPayload {
    Text {
        text: String,
    },
    Heading {
        level: u8,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        src: String,
        natural_width: f32,
        natural_height: f32,
    },
    #[serde(rename = "pagebreak")]
    PageBreak,
}

impl RawBlock {
    pub fn text(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            payload: RawPayload::Text { text: text.into() },
        }
    }

    pub fn heading(id: u64, level: u8, text: impl Into<String>) -> Self {
        Self {
            id,
            payload: RawPayload::Heading {
                level,
                text: text.into(),
            },
        }
    }

    pub fn image(id: u64, src: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            id,
            payload: RawPayload::Image {
                src: src.into(),
                natural_width: width,
                natural_height: height,
            },
        }
    }

    pub fn page_break(id: u64) -> Self {
        Self {
            id,
            payload: RawPayload::PageBreak,
        }
    }
}

/// Normalized textual content plus its token breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub text: String,
    pub division: Division,
}

impl TextContent {
    pub fn new(text: String) -> Self {
        let division = Division::build(&text);
        Self { text, division }
    }

    /// Character count of the normalized text
    pub fn char_len(&self) -> usize {
        self.division.char_len()
    }

    /// Slice by character offsets, `to` inclusive; `None` runs to the end
    pub fn slice_chars(&self, from: usize, to: Option<usize>) -> &str {
        let start = byte_at_char(&self.text, from);
        let end = match to {
            Some(to) => byte_at_char(&self.text, to + 1),
            None => self.text.len(),
        };
        if start >= end {
            ""
        } else {
            &self.text[start..end]
        }
    }
}

fn byte_at_char(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Image content with intrinsic pixel dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    pub src: String,
    pub natural_width: f32,
    pub natural_height: f32,
}

/// Validated content by block category
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Text(TextContent),
    Heading {
        level: HeadingLevel,
        content: TextContent,
    },
    Image(ImageContent),
    PageBreak,
}

/// A block that passed validation and normalization
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub content: BlockContent,
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match &self.content {
            BlockContent::Text(_) => BlockType::Text,
            BlockContent::Heading { .. } => BlockType::Heading,
            BlockContent::Image(_) => BlockType::Image,
            BlockContent::PageBreak => BlockType::PageBreak,
        }
    }

    /// Text or heading content, if this block carries any
    pub fn textual(&self) -> Option<&TextContent> {
        match &self.content {
            BlockContent::Text(content) => Some(content),
            BlockContent::Heading { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn is_page_break(&self) -> bool {
        matches!(self.content, BlockContent::PageBreak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_text() {
        let json = r#"{"id":12,"type":"text","data":{"text":"hello"}}"#;
        let raw: RawBlock = serde_json::from_str(json).unwrap();
        assert_eq!(raw, RawBlock::text(12, "hello"));
    }

    #[test]
    fn test_wire_form_heading() {
        let json = r#"{"id":3,"type":"heading","data":{"level":2,"text":"Intro"}}"#;
        let raw: RawBlock = serde_json::from_str(json).unwrap();
        assert_eq!(raw, RawBlock::heading(3, 2, "Intro"));
    }

    #[test]
    fn test_wire_form_image_camel_case() {
        let json = r#"{"id":9,"type":"image","data":{"src":"a.png","naturalWidth":800.0,"naturalHeight":600.0}}"#;
        let raw: RawBlock = serde_json::from_str(json).unwrap();
        assert_eq!(raw, RawBlock::image(9, "a.png", 800.0, 600.0));
    }

    #[test]
    fn test_wire_form_page_break_has_no_data() {
        let json = r#"{"id":4,"type":"pagebreak"}"#;
        let raw: RawBlock = serde_json::from_str(json).unwrap();
        assert_eq!(raw, RawBlock::page_break(4));
    }

    #[test]
    fn test_heading_level_bounds() {
        assert_eq!(HeadingLevel::from_number(1), Some(HeadingLevel::H1));
        assert_eq!(HeadingLevel::from_number(3), Some(HeadingLevel::H3));
        assert_eq!(HeadingLevel::from_number(0), None);
        assert_eq!(HeadingLevel::from_number(4), None);
    }

    #[test]
    fn test_slice_chars_inclusive() {
        let content = TextContent::new("hello world".to_string());
        assert_eq!(content.slice_chars(0, Some(4)), "hello");
        assert_eq!(content.slice_chars(6, None), "world");
        assert_eq!(content.slice_chars(6, Some(10)), "world");
    }

    #[test]
    fn test_slice_chars_multibyte() {
        let content = TextContent::new("漢字 text".to_string());
        assert_eq!(content.slice_chars(0, Some(1)), "漢字");
        assert_eq!(content.slice_chars(3, None), "text");
        assert_eq!(content.slice_chars(5, Some(2)), "");
        assert_eq!(content.slice_chars(0, Some(99)), "漢字 text");
    }

    #[test]
    fn test_textual_access() {
        let block = Block {
            id: BlockId(1),
            content: BlockContent::Text(TextContent::new("body".to_string())),
        };
        assert_eq!(block.block_type(), BlockType::Text);
        assert_eq!(block.textual().map(|c| c.text.as_str()), Some("body"));

        let brk = Block {
            id: BlockId(2),
            content: BlockContent::PageBreak,
        };
        assert!(brk.is_page_break());
        assert!(brk.textual().is_none());
    }
}
