//! Resolving visible line ranges of split blocks back to character ranges

use log::warn;
use thiserror::Error;

use crate::document::{Block, Division, TextContent};
use crate::layout::measure::{Measure, MeasureError, TokenProbe};
use crate::layout::metrics::{SizeLevel, TextBaseline};

/// Probe budget for one boundary search
const MAX_PROBES: usize = 64;

/// Visible line range of a split block on one page, 1-based inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRange {
    /// Trailing part: everything from this line down
    Tail { first_line: u32 },
    /// Leading part: everything through this line
    Head { last_line: u32 },
    /// Interior part of a block covering a whole page
    Middle { first_line: u32, last_line: u32 },
}

/// Character slice of a block matching a visible line range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DividedText {
    /// First character of the slice
    pub char_from: usize,
    /// Last character of the slice, inclusive
    pub char_to: usize,
    pub text: String,
}

/// Resolve a line range to characters, falling back to the whole block text
pub fn divide<M: Measure + ?Sized>(
    measurer: &M,
    block: &Block,
    content: &TextContent,
    baseline: &TextBaseline,
    range: LineRange,
    size: SizeLevel,
) -> DividedText {
    match try_divide(measurer, block, content, baseline, range, size) {
        Ok(divided) => divided,
        Err(failure) => {
            warn!(
                "block {} boundary guess failed ({}), taking whole text",
                block.id, failure
            );
            whole_text(content)
        }
    }
}

fn whole_text(content: &TextContent) -> DividedText {
    DividedText {
        char_from: 0,
        char_to: content.char_len().saturating_sub(1),
        text: content.text.clone(),
    }
}

fn try_divide<M: Measure + ?Sized>(
    measurer: &M,
    block: &Block,
    content: &TextContent,
    baseline: &TextBaseline,
    range: LineRange,
    size: SizeLevel,
) -> Result<DividedText, SearchFailure> {
    let division = &content.division;
    if division.is_empty() {
        return Err(SearchFailure::EmptyDivision);
    }
    let probe = measurer.probe(block, size)?;
    let search = LineSearch {
        probe: probe.as_ref(),
        division,
        baseline,
    };

    let (from_token, to_token) = match range {
        LineRange::Head { last_line } => (0, search.boundary_before(last_line + 1)?),
        LineRange::Tail { first_line } => {
            (search.first_of_line(first_line)?, division.len() - 1)
        }
        LineRange::Middle {
            first_line,
            last_line,
        } => (
            search.first_of_line(first_line)?,
            search.boundary_before(last_line + 1)?,
        ),
    };
    if from_token > to_token {
        return Err(SearchFailure::OutOfTokens);
    }

    let first = division.token(from_token).ok_or(SearchFailure::OutOfTokens)?;
    let last = division.token(to_token).ok_or(SearchFailure::OutOfTokens)?;
    Ok(DividedText {
        char_from: first.char_start,
        char_to: last.char_end() - 1,
        text: division
            .slice_text(&content.text, from_token, to_token)
            .to_string(),
    })
}

#[derive(Debug, Error)]
enum SearchFailure {
    #[error(transparent)]
    Probe(#[from] MeasureError),
    #[error("line search did not converge")]
    NoConvergence,
    #[error("ran out of tokens")]
    OutOfTokens,
    #[error("block has no tokens")]
    EmptyDivision,
    #[error("probed line is out of range")]
    BadLine,
}

struct LineSearch<'a> {
    probe: &'a dyn TokenProbe,
    division: &'a Division,
    baseline: &'a TextBaseline,
}

impl LineSearch<'_> {
    /// 1-based line number the token sits on
    fn line_of(&self, index: usize) -> Result<u32, SearchFailure> {
        let top = self.probe.token_top(index)?;
        let line =
            ((top - self.baseline.padding_top) / self.baseline.computed_line_height).ceil();
        if !line.is_finite() || line < 1.0 || line > self.baseline.computed_lines as f32 {
            return Err(SearchFailure::BadLine);
        }
        Ok(line as u32)
    }

    fn skip_blank_forward(&self, index: usize) -> Option<usize> {
        self.division
            .tokens()
            .get(index..)?
            .iter()
            .position(|token| !token.is_blank())
            .map(|found| index + found)
    }

    fn skip_blank_backward(&self, index: usize) -> Option<usize> {
        self.division
            .tokens()
            .get(..=index)?
            .iter()
            .rposition(|token| !token.is_blank())
    }

    /// Last non-blank token sitting before the given 1-based line
    fn boundary_before(&self, target: u32) -> Result<usize, SearchFailure> {
        let mut start = 0usize;
        let mut end = self.division.len();
        let mut pos = self
            .skip_blank_forward((start + end) / 2)
            .ok_or(SearchFailure::NoConvergence)?;

        let mut on_target = false;
        for _ in 0..MAX_PROBES {
            let line = self.line_of(pos)?;
            if line < target {
                start = pos;
                pos = self
                    .skip_blank_forward((start + end) / 2)
                    .ok_or(SearchFailure::NoConvergence)?;
            } else if line > target {
                end = pos;
                pos = self
                    .skip_blank_backward((start + end) / 2)
                    .ok_or(SearchFailure::NoConvergence)?;
            } else {
                on_target = true;
                break;
            }
        }
        if !on_target {
            return Err(SearchFailure::NoConvergence);
        }

        // step back to the last token above the target line
        let mut boundary = self
            .skip_blank_backward(pos.checked_sub(1).ok_or(SearchFailure::OutOfTokens)?)
            .ok_or(SearchFailure::OutOfTokens)?;
        loop {
            if self.line_of(boundary)? < target {
                return Ok(boundary);
            }
            boundary = self
                .skip_blank_backward(boundary.checked_sub(1).ok_or(SearchFailure::OutOfTokens)?)
                .ok_or(SearchFailure::OutOfTokens)?;
        }
    }

    /// First non-blank token of the given 1-based line
    fn first_of_line(&self, line: u32) -> Result<usize, SearchFailure> {
        let before = self.boundary_before(line)?;
        self.skip_blank_forward(before + 1)
            .ok_or(SearchFailure::OutOfTokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{normalize_block, RawBlock};
    use crate::layout::measure::{CharGridMeasurer, StylePreset};
    use crate::Viewport;

    fn text_baseline(measurer: &CharGridMeasurer, block: &Block) -> TextBaseline {
        TextBaseline::from_metrics(&measurer.text_metrics(block, SizeLevel::S).unwrap())
    }

    fn fixture() -> (CharGridMeasurer, Block, TextBaseline) {
        let preset = StylePreset {
            font_size: 50.0,
            line_height: 100.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            margin_bottom: 0.0,
        };
        let measurer = CharGridMeasurer::with_preset(Viewport::new(200.0, 300.0), preset);
        // wraps to four lines of "aaaaaaa " / "bbbbbbb " / "ccccccc " / "ddddddd"
        let block = normalize_block(&RawBlock::text(1, "aaaaaaa bbbbbbb ccccccc ddddddd")).unwrap();
        let baseline = text_baseline(&measurer, &block);
        (measurer, block, baseline)
    }

    fn content(block: &Block) -> &TextContent {
        block.textual().unwrap()
    }

    #[test]
    fn test_head_keeps_leading_lines() {
        let (measurer, block, baseline) = fixture();
        let divided = divide(
            &measurer,
            &block,
            content(&block),
            &baseline,
            LineRange::Head { last_line: 3 },
            SizeLevel::S,
        );
        assert_eq!(divided.text, "aaaaaaa bbbbbbb ccccccc");
        assert_eq!(divided.char_from, 0);
        assert_eq!(divided.char_to, 22);
    }

    #[test]
    fn test_tail_keeps_trailing_lines() {
        let (measurer, block, baseline) = fixture();
        let divided = divide(
            &measurer,
            &block,
            content(&block),
            &baseline,
            LineRange::Tail { first_line: 4 },
            SizeLevel::S,
        );
        assert_eq!(divided.text, "ddddddd");
        assert_eq!(divided.char_from, 24);
        assert_eq!(divided.char_to, 30);
    }

    #[test]
    fn test_middle_keeps_interior_lines() {
        let (measurer, block, baseline) = fixture();
        let divided = divide(
            &measurer,
            &block,
            content(&block),
            &baseline,
            LineRange::Middle {
                first_line: 2,
                last_line: 3,
            },
            SizeLevel::S,
        );
        assert_eq!(divided.text, "bbbbbbb ccccccc");
        assert_eq!(divided.char_from, 8);
        assert_eq!(divided.char_to, 22);
    }

    #[test]
    fn test_boundary_space_excluded_from_both_sides() {
        let (measurer, block, baseline) = fixture();
        let head = divide(
            &measurer,
            &block,
            content(&block),
            &baseline,
            LineRange::Head { last_line: 1 },
            SizeLevel::S,
        );
        let tail = divide(
            &measurer,
            &block,
            content(&block),
            &baseline,
            LineRange::Tail { first_line: 2 },
            SizeLevel::S,
        );
        // the wrap-point space at char 7 belongs to neither side
        assert_eq!(head.char_to, 6);
        assert_eq!(tail.char_from, 8);
    }

    #[test]
    fn test_adjacent_fragments_without_whitespace() {
        let preset = StylePreset {
            font_size: 50.0,
            line_height: 100.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            margin_bottom: 0.0,
        };
        let measurer = CharGridMeasurer::with_preset(Viewport::new(200.0, 300.0), preset);
        let block = normalize_block(&RawBlock::text(2, "一二三四五六七八")).unwrap();
        let baseline = text_baseline(&measurer, &block);

        let head = divide(
            &measurer,
            &block,
            content(&block),
            &baseline,
            LineRange::Head { last_line: 1 },
            SizeLevel::S,
        );
        let tail = divide(
            &measurer,
            &block,
            content(&block),
            &baseline,
            LineRange::Tail { first_line: 2 },
            SizeLevel::S,
        );
        assert_eq!(head.text, "一二三四");
        assert_eq!(tail.text, "五六七八");
        assert_eq!(head.char_to + 1, tail.char_from);
    }

    #[test]
    fn test_unreachable_line_falls_back_to_whole_text() {
        let (measurer, block, _) = fixture();
        // a baseline claiming a single line can never satisfy a line-3 search
        let flat = TextBaseline {
            line_height: 400.0,
            computed_lines: 1,
            computed_line_height: 400.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            margin_bottom: 0.0,
            min_containable_height: 400.0,
            min_content_height: 400.0,
            content_height: 400.0,
            complete_height: 400.0,
        };
        let divided = divide(
            &measurer,
            &block,
            content(&block),
            &flat,
            LineRange::Head { last_line: 2 },
            SizeLevel::S,
        );
        assert_eq!(divided.char_from, 0);
        assert_eq!(divided.char_to, 30);
        assert_eq!(divided.text, "aaaaaaa bbbbbbb ccccccc ddddddd");
    }
}
