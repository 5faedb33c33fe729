//! Measurement provider contract and the built-in deterministic measurer

use rustc_hash::FxHashSet;
use thiserror::Error;
use unicode_linebreak::linebreaks;
use unicode_segmentation::UnicodeSegmentation;

use crate::document::{Block, BlockContent, BlockId, HeadingLevel};
use crate::layout::metrics::{fit_ratio, SizeLevel};
use crate::Viewport;

/// Box model the measurement backend reports sizes in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSizing {
    ContentBox,
    BorderBox,
}

/// Measured box of one wrapped text or heading block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub line_height: f32,
    /// Content height of the wrapped text
    pub height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub margin_bottom: f32,
}

/// Vertical spacing around an image block
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxSpacing {
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub margin_bottom: f32,
}

/// Scaled display size of an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomedSize {
    pub width: f32,
    pub height: f32,
}

/// Failures reported by a measurement backend
#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("block {0} carries no measurable text")]
    NotTextual(BlockId),
    #[error("token {index} out of range for block {id}")]
    TokenOutOfRange { id: BlockId, index: usize },
    #[error("measurement backend failure: {0}")]
    Backend(String),
}

/// Vertical positions of individual tokens within one measured block
pub trait TokenProbe {
    /// Top edge of the token's glyph box, relative to the block border box
    fn token_top(&self, index: usize) -> Result<f32, MeasureError>;
}

/// Measurement backend the paginator works against
pub trait Measure {
    /// Current viewport size
    fn viewport(&self) -> Viewport;

    /// Box model of reported metrics
    fn box_sizing(&self) -> BoxSizing {
        BoxSizing::ContentBox
    }

    /// Measure one wrapped text or heading block at a size level
    fn text_metrics(&self, block: &Block, size: SizeLevel) -> Result<TextMetrics, MeasureError>;

    /// Vertical spacing applied to image blocks at a size level
    fn image_spacing(&self, size: SizeLevel) -> BoxSpacing;

    /// Scale an image into the width budget, never upscaling
    fn image_size(
        &self,
        natural_width: f32,
        natural_height: f32,
        viewport_width: f32,
        size_ratio: f32,
    ) -> ZoomedSize {
        let ratio = fit_ratio(natural_width, natural_height, viewport_width * size_ratio, None);
        ZoomedSize {
            width: (natural_width * ratio).floor(),
            height: (natural_height * ratio).floor(),
        }
    }

    /// Token position probe for boundary searches
    fn probe(&self, block: &Block, size: SizeLevel) -> Result<Box<dyn TokenProbe>, MeasureError>;
}

/// Style constants for one block flavor at one size level.
///
/// `font_size` must stay below `line_height` so probed token tops land
/// strictly inside their line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylePreset {
    pub font_size: f32,
    pub line_height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub margin_bottom: f32,
}

fn text_preset(size: SizeLevel) -> StylePreset {
    let font_size = match size {
        SizeLevel::Xs => 14.0,
        SizeLevel::S => 16.0,
        SizeLevel::M => 18.0,
        SizeLevel::L => 20.0,
        SizeLevel::Xl => 22.0,
    };
    StylePreset {
        font_size,
        line_height: font_size + 8.0,
        padding_top: 0.0,
        padding_bottom: 0.0,
        margin_bottom: match size {
            SizeLevel::Xs => 10.0,
            SizeLevel::S => 11.0,
            SizeLevel::M => 12.0,
            SizeLevel::L => 13.0,
            SizeLevel::Xl => 14.0,
        },
    }
}

fn heading_preset(size: SizeLevel, level: HeadingLevel) -> StylePreset {
    let base = match size {
        SizeLevel::Xs => 20.0,
        SizeLevel::S => 22.0,
        SizeLevel::M => 24.0,
        SizeLevel::L => 26.0,
        SizeLevel::Xl => 28.0,
    };
    let font_size = base
        + match level {
            HeadingLevel::H1 => 6.0,
            HeadingLevel::H2 => 3.0,
            HeadingLevel::H3 => 0.0,
        };
    StylePreset {
        font_size,
        line_height: font_size + 10.0,
        padding_top: match size {
            SizeLevel::Xs => 12.0,
            SizeLevel::S => 13.0,
            SizeLevel::M => 14.0,
            SizeLevel::L => 15.0,
            SizeLevel::Xl => 16.0,
        },
        padding_bottom: match size {
            SizeLevel::Xs | SizeLevel::S => 6.0,
            SizeLevel::M | SizeLevel::L => 7.0,
            SizeLevel::Xl => 8.0,
        },
        margin_bottom: match size {
            SizeLevel::Xs => 12.0,
            SizeLevel::S => 13.0,
            SizeLevel::M => 14.0,
            SizeLevel::L => 15.0,
            SizeLevel::Xl => 16.0,
        },
    }
}

fn image_spacing_preset(size: SizeLevel) -> BoxSpacing {
    let padding = match size {
        SizeLevel::Xs => 6.0,
        SizeLevel::S => 7.0,
        SizeLevel::M => 8.0,
        SizeLevel::L => 9.0,
        SizeLevel::Xl => 10.0,
    };
    BoxSpacing {
        padding_top: padding,
        padding_bottom: padding,
        margin_bottom: match size {
            SizeLevel::Xs => 10.0,
            SizeLevel::S => 11.0,
            SizeLevel::M => 12.0,
            SizeLevel::L => 13.0,
            SizeLevel::Xl => 14.0,
        },
    }
}

/// Deterministic measurer laying text on a character grid.
///
/// Narrow (ASCII) graphemes take half the font size, wide graphemes the
/// full font size. Tokens wrap greedily at Unicode line break
/// opportunities, and reported heights are exact line multiples, so the
/// line count derived from a measurement always matches the wrap
/// performed here.
#[derive(Debug, Clone)]
pub struct CharGridMeasurer {
    viewport: Viewport,
    override_preset: Option<StylePreset>,
}

impl CharGridMeasurer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            override_preset: None,
        }
    }

    /// Pin one preset for every textual block, regardless of size level
    pub fn with_preset(viewport: Viewport, preset: StylePreset) -> Self {
        Self {
            viewport,
            override_preset: Some(preset),
        }
    }

    fn block_preset(&self, block: &Block, size: SizeLevel) -> Result<StylePreset, MeasureError> {
        if let Some(preset) = self.override_preset {
            return Ok(preset);
        }
        match &block.content {
            BlockContent::Text(_) => Ok(text_preset(size)),
            BlockContent::Heading { level, .. } => Ok(heading_preset(size, *level)),
            _ => Err(MeasureError::NotTextual(block.id)),
        }
    }
}

impl Measure for CharGridMeasurer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn text_metrics(&self, block: &Block, size: SizeLevel) -> Result<TextMetrics, MeasureError> {
        let content = block.textual().ok_or(MeasureError::NotTextual(block.id))?;
        let preset = self.block_preset(block, size)?;
        let lines = line_starts(&content.text, preset.font_size, self.viewport.width).len();
        Ok(TextMetrics {
            line_height: preset.line_height,
            height: lines as f32 * preset.line_height,
            padding_top: preset.padding_top,
            padding_bottom: preset.padding_bottom,
            margin_bottom: preset.margin_bottom,
        })
    }

    fn image_spacing(&self, size: SizeLevel) -> BoxSpacing {
        image_spacing_preset(size)
    }

    fn probe(&self, block: &Block, size: SizeLevel) -> Result<Box<dyn TokenProbe>, MeasureError> {
        let content = block.textual().ok_or(MeasureError::NotTextual(block.id))?;
        let preset = self.block_preset(block, size)?;
        let starts = line_starts(&content.text, preset.font_size, self.viewport.width);
        let glyph_inset = (preset.line_height - preset.font_size) / 2.0;
        let tops = content
            .division
            .tokens()
            .iter()
            .map(|token| {
                let line = starts.partition_point(|&start| start <= token.byte_start) - 1;
                preset.padding_top + line as f32 * preset.line_height + glyph_inset
            })
            .collect();
        Ok(Box::new(GridProbe {
            id: block.id,
            tops,
        }))
    }
}

struct GridProbe {
    id: BlockId,
    tops: Vec<f32>,
}

impl TokenProbe for GridProbe {
    fn token_top(&self, index: usize) -> Result<f32, MeasureError> {
        self.tops
            .get(index)
            .copied()
            .ok_or(MeasureError::TokenOutOfRange { id: self.id, index })
    }
}

/// Byte offsets at which lines begin under greedy wrapping
fn line_starts(text: &str, font_size: f32, width: f32) -> Vec<usize> {
    let opportunities: FxHashSet<usize> = linebreaks(text).map(|(offset, _)| offset).collect();
    let mut starts = vec![0usize];
    let mut line_start = 0usize;
    let mut x = 0.0f32;
    let mut break_at: Option<(usize, f32)> = None;

    for (offset, grapheme) in text.grapheme_indices(true) {
        if offset > line_start && opportunities.contains(&offset) {
            break_at = Some((offset, x));
        }
        let w = grapheme_width(grapheme, font_size);
        if x + w > width && offset > line_start {
            match break_at.take() {
                Some((at, at_x)) => {
                    starts.push(at);
                    line_start = at;
                    x -= at_x;
                }
                None => {
                    starts.push(offset);
                    line_start = offset;
                    x = 0.0;
                }
            }
        }
        x += w;
    }
    starts
}

fn grapheme_width(grapheme: &str, font_size: f32) -> f32 {
    match grapheme.chars().next() {
        Some(c) if c.is_ascii() => font_size * 0.5,
        _ => font_size,
    }
}
