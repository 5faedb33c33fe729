//! Keyword highlighting over rendered pages

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::document::{BlockContent, Document};
use crate::layout::measure::ZoomedSize;
use crate::layout::metrics::SizeLevel;
use crate::layout::page::Page;
use crate::render::markup;
use crate::Viewport;

/// Characters ignored during matching: punctuation, symbols, whitespace
static PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{P}\p{S}\s]").unwrap());

/// Per-block search text, aligned token by token with the block division
struct PureItem {
    /// Tokens with ignored characters removed, case preserved
    stripped: Vec<String>,
    /// Byte length each stripped token contributes to the search text
    folded_len: Vec<usize>,
    /// Start of this block within the page search text
    offset_from: usize,
    pure_len: usize,
}

impl PureItem {
    /// Token owning the given search-text byte position
    fn token_at(&self, pos: usize) -> Option<usize> {
        let mut sum = self.offset_from;
        for (index, len) in self.folded_len.iter().enumerate() {
            if *len == 0 {
                continue;
            }
            if pos >= sum && pos < sum + len {
                return Some(index);
            }
            sum += len;
        }
        None
    }
}

/// Rebuild a page's markup with every keyword occurrence painted.
///
/// Matching ignores case, punctuation, symbols and whitespace, so a
/// keyword can span token and block boundaries. Painting is
/// token-granular: a token is painted when a match touches it and the
/// token itself carries no ignored characters. Returns the page markup
/// unchanged when the keyword normalizes to nothing or never occurs.
pub fn highlight(
    page: &Page,
    document: &Document,
    viewport: Viewport,
    size: SizeLevel,
    keyword: &str,
) -> String {
    let needle = PUNCT.replace_all(keyword, "").to_lowercase();
    if needle.is_empty() {
        return page.markup.clone();
    }

    // Search text of the whole page: stripped lowercased tokens of every
    // textual block, full blocks even when the page shows only a slice.
    let mut pure_text = String::new();
    let mut pure_items: Vec<Option<PureItem>> = Vec::with_capacity(page.items.len());
    let mut running = 0usize;
    for item in &page.items {
        let content = document.get(item.id).and_then(|block| block.textual());
        match content {
            Some(content) => {
                let mut stripped = Vec::new();
                let mut folded_len = Vec::new();
                let mut pure_len = 0usize;
                for token in content.division.tokens() {
                    let clean = PUNCT
                        .replace_all(token.text(&content.text), "")
                        .into_owned();
                    let folded = clean.to_lowercase();
                    pure_text.push_str(&folded);
                    folded_len.push(folded.len());
                    pure_len += folded.len();
                    stripped.push(clean);
                }
                pure_items.push(Some(PureItem {
                    stripped,
                    folded_len,
                    offset_from: running,
                    pure_len,
                }));
                running += pure_len;
            }
            None => pure_items.push(None),
        }
    }

    // Overlapping occurrence scan
    let mut matches = Vec::new();
    let mut from = 0usize;
    while let Some(found) = pure_text[from..].find(&needle) {
        let pos = from + found;
        matches.push(pos);
        let step = pure_text[pos..].chars().next().map_or(1, char::len_utf8);
        from = pos + step;
    }
    if matches.is_empty() {
        return page.markup.clone();
    }

    // Clip each occurrence to the blocks it touches and resolve the
    // clipped edges to token spans, first claim per token wins.
    let mut span_map: FxHashMap<usize, Vec<(usize, usize)>> = FxHashMap::default();
    for (item_index, pure) in pure_items.iter().enumerate() {
        let pure = match pure {
            Some(pure) if pure.pure_len > 0 => pure,
            _ => continue,
        };
        let para_from = pure.offset_from;
        let para_to = pure.offset_from + pure.pure_len - 1;

        let mut start_seen = FxHashSet::default();
        let mut end_seen = FxHashSet::default();
        for &pos in &matches {
            let char_from = pos;
            let char_to = pos + needle.len() - 1;
            let clip = if char_from >= para_from && char_to <= para_to {
                Some((char_from, char_to))
            } else if char_from < para_from && char_to >= para_from && char_to <= para_to {
                Some((para_from, char_to))
            } else if char_from >= para_from && char_from <= para_to && char_to > para_to {
                Some((char_from, para_to))
            } else if char_from < para_from && char_to > para_to {
                Some((para_from, para_to))
            } else {
                None
            };
            let (clip_from, clip_to) = match clip {
                Some(clip) => clip,
                None => continue,
            };
            if let (Some(start), Some(end)) = (pure.token_at(clip_from), pure.token_at(clip_to)) {
                if start_seen.insert(start) && end_seen.insert(end) {
                    span_map.entry(item_index).or_default().push((start, end));
                }
            }
        }
    }

    // Rebuild the page with matched tokens painted
    let mut inner = String::new();
    for (item_index, item) in page.items.iter().enumerate() {
        let block = match document.get(item.id) {
            Some(block) => block,
            None => continue,
        };
        if let Some(content) = block.textual() {
            let mut painted = FxHashSet::default();
            if let (Some(spans), Some(pure)) = (span_map.get(&item_index), &pure_items[item_index])
            {
                for &(start, end) in spans {
                    for index in start..=end {
                        let token = &content.division.tokens()[index];
                        if token.text(&content.text) == pure.stripped[index] {
                            painted.insert(index);
                        }
                    }
                }
            }
            let highlights = if painted.is_empty() {
                None
            } else {
                Some(&painted)
            };
            inner.push_str(&markup::text_markup(
                block,
                content,
                size,
                item.offset,
                highlights,
            ));
        } else if let BlockContent::Image(image) = &block.content {
            if let Some(baseline) = item.baseline.image() {
                let zoomed = ZoomedSize {
                    width: baseline.zoomed_width,
                    height: baseline.zoomed_height,
                };
                inner.push_str(&markup::image_markup(block, image, zoomed, size));
            }
        }
    }
    markup::wrap_page(&inner, viewport, page.height)
}
