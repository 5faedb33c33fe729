//! HTML string assembly for blocks and pages

use rustc_hash::FxHashSet;

use crate::document::{Block, BlockContent, ImageContent, TextContent};
use crate::layout::measure::ZoomedSize;
use crate::layout::metrics::SizeLevel;
use crate::Viewport;

/// Escape text for embedding in markup
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Markup for one textual block.
///
/// `offset` pulls split continuations up by the given pixel amount;
/// `highlights` names token indices to paint as matches.
pub fn text_markup(
    block: &Block,
    content: &TextContent,
    size: SizeLevel,
    offset: f32,
    highlights: Option<&FxHashSet<usize>>,
) -> String {
    let class = match &block.content {
        BlockContent::Heading { level, .. } => {
            format!("heading-{} heading-{}", size, level.number())
        }
        _ => format!("text-{}", size),
    };

    let mut spans = String::new();
    for (index, token) in content.division.tokens().iter().enumerate() {
        let style = if highlights.is_some_and(|set| set.contains(&index)) {
            " style=\"color:red;\""
        } else {
            ""
        };
        spans.push_str(&format!(
            "<span class=\"word\" data-length=\"{}\" data-offset=\"{}\"{}>{}</span>",
            token.char_len,
            token.char_start,
            style,
            escape(token.text(&content.text))
        ));
    }

    if offset > 0.0 {
        format!(
            "<div class=\"{}\" data-id=\"{}\" style=\"margin-top:-{}px;\">{}</div>",
            class, block.id, offset, spans
        )
    } else {
        format!(
            "<div class=\"{}\" data-id=\"{}\">{}</div>",
            class, block.id, spans
        )
    }
}

/// Markup for an image block at its scaled display size
pub fn image_markup(
    block: &Block,
    image: &ImageContent,
    zoomed: ZoomedSize,
    size: SizeLevel,
) -> String {
    format!(
        "<div class=\"image-{}\" data-id=\"{}\"><img src=\"{}\" style=\"width:{}px;height:{}px;\" /></div>",
        size,
        block.id,
        escape(&image.src),
        zoomed.width,
        zoomed.height
    )
}

/// Wrap accumulated page markup in the page chrome
pub fn wrap_page(inner: &str, viewport: Viewport, page_height: f32) -> String {
    format!(
        "<div class=\"layout-page-wrapper\" style=\"width:{}px;height:{}px;\">\
         <div class=\"layout-page-content\" style=\"height:{}px;\">{}</div></div>",
        viewport.width, viewport.height, page_height, inner
    )
}
