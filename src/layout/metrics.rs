//! Size levels and block height thresholds

use crate::document::ImageContent;
use crate::layout::measure::{BoxSpacing, TextMetrics};
use crate::Viewport;

/// The five typography size levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SizeLevel {
    Xs,
    #[default]
    S,
    M,
    L,
    Xl,
}

impl SizeLevel {
    pub const ALL: [SizeLevel; 5] = [
        SizeLevel::Xs,
        SizeLevel::S,
        SizeLevel::M,
        SizeLevel::L,
        SizeLevel::Xl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeLevel::Xs => "xs",
            SizeLevel::S => "s",
            SizeLevel::M => "m",
            SizeLevel::L => "l",
            SizeLevel::Xl => "xl",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "xs" => Some(SizeLevel::Xs),
            "s" => Some(SizeLevel::S),
            "m" => Some(SizeLevel::M),
            "l" => Some(SizeLevel::L),
            "xl" => Some(SizeLevel::Xl),
            _ => None,
        }
    }

    /// Fraction of the viewport width granted to images
    pub fn image_ratio(&self) -> f32 {
        match self {
            SizeLevel::Xs => 0.80,
            SizeLevel::S => 0.82,
            SizeLevel::M => 0.85,
            SizeLevel::L => 0.90,
            SizeLevel::Xl => 0.95,
        }
    }
}

impl std::fmt::Display for SizeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Height thresholds for a text or heading block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBaseline {
    pub line_height: f32,
    /// Wrapped line count derived from the measured height
    pub computed_lines: u32,
    /// Measured height divided by the line count
    pub computed_line_height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub margin_bottom: f32,
    /// One line plus top padding, the least height worth keeping on a page
    pub min_containable_height: f32,
    /// Full text plus top padding
    pub min_content_height: f32,
    /// Full text plus vertical padding
    pub content_height: f32,
    /// Content plus bottom margin
    pub complete_height: f32,
}

impl TextBaseline {
    pub fn from_metrics(metrics: &TextMetrics) -> Self {
        let lines = (metrics.height / metrics.line_height).ceil();
        let lines = if lines.is_finite() && lines >= 1.0 {
            lines
        } else {
            1.0
        };
        let padding_v = metrics.padding_top + metrics.padding_bottom;
        Self {
            line_height: metrics.line_height,
            computed_lines: lines as u32,
            computed_line_height: metrics.height / lines,
            padding_top: metrics.padding_top,
            padding_bottom: metrics.padding_bottom,
            margin_bottom: metrics.margin_bottom,
            min_containable_height: metrics.line_height + metrics.padding_top,
            min_content_height: metrics.height + metrics.padding_top,
            content_height: metrics.height + padding_v,
            complete_height: metrics.height + padding_v + metrics.margin_bottom,
        }
    }
}

/// Height thresholds for an image block scaled into the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBaseline {
    pub zoomed_width: f32,
    pub zoomed_height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub margin_bottom: f32,
    pub min_containable_height: f32,
    pub min_content_height: f32,
    pub content_height: f32,
    pub complete_height: f32,
}

impl ImageBaseline {
    pub fn compute(
        image: &ImageContent,
        spacing: &BoxSpacing,
        viewport: Viewport,
        size: SizeLevel,
    ) -> Self {
        let padding_v = spacing.padding_top + spacing.padding_bottom;
        let max_width = viewport.width * size.image_ratio();
        let max_height = (viewport.height - padding_v).max(0.0);
        let ratio = fit_ratio(
            image.natural_width,
            image.natural_height,
            max_width,
            Some(max_height),
        );
        let zoomed_height = (image.natural_height * ratio).floor();
        let boxed_height = zoomed_height + padding_v;
        Self {
            zoomed_width: (image.natural_width * ratio).floor(),
            zoomed_height,
            padding_top: spacing.padding_top,
            padding_bottom: spacing.padding_bottom,
            margin_bottom: spacing.margin_bottom,
            min_containable_height: boxed_height,
            min_content_height: boxed_height,
            content_height: boxed_height,
            complete_height: boxed_height + spacing.margin_bottom,
        }
    }
}

/// Thresholds for any measurable block
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    Text(TextBaseline),
    Image(ImageBaseline),
}

impl Baseline {
    pub fn min_containable_height(&self) -> f32 {
        match self {
            Baseline::Text(b) => b.min_containable_height,
            Baseline::Image(b) => b.min_containable_height,
        }
    }

    pub fn min_content_height(&self) -> f32 {
        match self {
            Baseline::Text(b) => b.min_content_height,
            Baseline::Image(b) => b.min_content_height,
        }
    }

    pub fn content_height(&self) -> f32 {
        match self {
            Baseline::Text(b) => b.content_height,
            Baseline::Image(b) => b.content_height,
        }
    }

    pub fn complete_height(&self) -> f32 {
        match self {
            Baseline::Text(b) => b.complete_height,
            Baseline::Image(b) => b.complete_height,
        }
    }

    pub fn text(&self) -> Option<&TextBaseline> {
        match self {
            Baseline::Text(b) => Some(b),
            Baseline::Image(_) => None,
        }
    }

    pub fn image(&self) -> Option<&ImageBaseline> {
        match self {
            Baseline::Text(_) => None,
            Baseline::Image(b) => Some(b),
        }
    }
}

/// Largest of the three thresholds that still fits the remaining space
pub fn fitted_height(rest: f32, min_content: f32, content: f32, complete: f32) -> f32 {
    if complete <= rest {
        complete
    } else if content <= rest {
        content
    } else {
        min_content
    }
}

/// Downscale ratio fitting natural dimensions into the given bounds, capped at 1
pub fn fit_ratio(
    natural_width: f32,
    natural_height: f32,
    max_width: f32,
    max_height: Option<f32>,
) -> f32 {
    let mut ratio = max_width / natural_width;
    if let Some(max_height) = max_height {
        ratio = ratio.min(max_height / natural_height);
    }
    ratio.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(height: f32, line_height: f32) -> TextMetrics {
        TextMetrics {
            line_height,
            height,
            padding_top: 10.0,
            padding_bottom: 6.0,
            margin_bottom: 12.0,
        }
    }

    #[test]
    fn test_size_level_parse() {
        assert_eq!(SizeLevel::parse("xs"), Some(SizeLevel::Xs));
        assert_eq!(SizeLevel::parse("xl"), Some(SizeLevel::Xl));
        assert_eq!(SizeLevel::parse("huge"), None);
        assert_eq!(SizeLevel::default(), SizeLevel::S);
        for level in SizeLevel::ALL {
            assert_eq!(SizeLevel::parse(level.as_str()), Some(level));
        }
    }

    #[test]
    fn test_image_ratio_grows_with_size() {
        let mut last = 0.0;
        for level in SizeLevel::ALL {
            assert!(level.image_ratio() > last);
            last = level.image_ratio();
        }
    }

    #[test]
    fn test_text_baseline_thresholds() {
        let baseline = TextBaseline::from_metrics(&metrics(300.0, 100.0));
        assert_eq!(baseline.computed_lines, 3);
        assert_eq!(baseline.computed_line_height, 100.0);
        assert_eq!(baseline.min_containable_height, 110.0);
        assert_eq!(baseline.min_content_height, 310.0);
        assert_eq!(baseline.content_height, 316.0);
        assert_eq!(baseline.complete_height, 328.0);
    }

    #[test]
    fn test_text_baseline_fractional_lines() {
        let baseline = TextBaseline::from_metrics(&metrics(310.0, 100.0));
        assert_eq!(baseline.computed_lines, 4);
        assert_eq!(baseline.computed_line_height, 77.5);
    }

    #[test]
    fn test_text_baseline_never_zero_lines() {
        let baseline = TextBaseline::from_metrics(&metrics(0.0, 100.0));
        assert_eq!(baseline.computed_lines, 1);
    }

    #[test]
    fn test_image_baseline_height_bound() {
        let image = ImageContent {
            src: "a.png".to_string(),
            natural_width: 800.0,
            natural_height: 600.0,
        };
        let spacing = BoxSpacing {
            padding_top: 10.0,
            padding_bottom: 10.0,
            margin_bottom: 12.0,
        };
        let viewport = Viewport::new(1000.0, 500.0);
        let baseline = ImageBaseline::compute(&image, &spacing, viewport, SizeLevel::S);
        // height bound 480 wins over width bound 820
        assert_eq!(baseline.zoomed_width, 640.0);
        assert_eq!(baseline.zoomed_height, 480.0);
        assert_eq!(baseline.min_containable_height, 500.0);
        assert_eq!(baseline.complete_height, 512.0);
    }

    #[test]
    fn test_image_baseline_never_upscales() {
        let image = ImageContent {
            src: "tiny.png".to_string(),
            natural_width: 40.0,
            natural_height: 30.0,
        };
        let spacing = BoxSpacing {
            padding_top: 0.0,
            padding_bottom: 0.0,
            margin_bottom: 0.0,
        };
        let baseline =
            ImageBaseline::compute(&image, &spacing, Viewport::new(1000.0, 500.0), SizeLevel::Xl);
        assert_eq!(baseline.zoomed_width, 40.0);
        assert_eq!(baseline.zoomed_height, 30.0);
    }

    #[test]
    fn test_fit_ratio_width_only() {
        assert_eq!(fit_ratio(200.0, 999.0, 100.0, None), 0.5);
        assert_eq!(fit_ratio(50.0, 50.0, 100.0, None), 1.0);
    }

    #[test]
    fn test_fitted_height_picks_largest_fitting() {
        assert_eq!(fitted_height(520.0, 310.0, 316.0, 328.0), 328.0);
        assert_eq!(fitted_height(320.0, 310.0, 316.0, 328.0), 316.0);
        assert_eq!(fitted_height(312.0, 310.0, 316.0, 328.0), 310.0);
    }
}
