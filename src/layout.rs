//! Layout hierarchy returned by a recognition pass
//!
//! Regions nest block ⊇ paragraph ⊇ line ⊇ word, each with a pixel bounding
//! box. A [`LayoutResult`] also carries the mean confidence of the pass that
//! produced it.

use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the box covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clip to an image of the given size; `None` if nothing remains
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<BoundingBox> {
        let x = self.x.min(image_width);
        let y = self.y.min(image_height);
        let right = self.right().min(image_width);
        let bottom = self.bottom().min(image_height);
        let clipped = BoundingBox::new(x, y, right - x, bottom - y);
        (!clipped.is_empty()).then_some(clipped)
    }
}

/// Recognized word
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub bbox: BoundingBox,
    /// Word confidence in [0, 1]
    pub confidence: f32,
    pub text: String,
}

/// Text line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub bbox: BoundingBox,
    pub words: Vec<Word>,
}

/// Paragraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub bbox: BoundingBox,
    pub lines: Vec<Line>,
}

impl Paragraph {
    /// Number of words across all lines
    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|line| line.words.len()).sum()
    }
}

/// Text block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub bbox: BoundingBox,
    pub paragraphs: Vec<Paragraph>,
}

/// Output of one recognition pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub blocks: Vec<Block>,
    /// Mean confidence of the pass in [0, 1]
    pub mean_confidence: f32,
}

/// Outcome of the anchor-region search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSearch {
    /// The layout holds no region with any height
    NoRegion,
    /// Regions exist but none reached the word threshold
    BelowThreshold,
    /// First paragraph reaching the word threshold
    Anchor(BoundingBox),
}

impl LayoutResult {
    /// Layout with no regions and the given confidence
    pub fn empty(mean_confidence: f32) -> Self {
        Self {
            blocks: Vec::new(),
            mean_confidence,
        }
    }

    /// Iterate over every paragraph, blocks in order then paragraphs in order
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().flat_map(|block| block.paragraphs.iter())
    }

    /// Total number of words in the layout
    pub fn word_count(&self) -> usize {
        self.paragraphs().map(Paragraph::word_count).sum()
    }

    /// Find the first paragraph with at least `min_words` words
    ///
    /// Traversal is top-down, first to last; the first qualifying paragraph
    /// wins without any scoring among candidates.
    pub fn find_anchor(&self, min_words: usize) -> AnchorSearch {
        let mut any_region = false;
        for paragraph in self.paragraphs() {
            if paragraph.bbox.height > 0 {
                any_region = true;
            }
            if paragraph.word_count() >= min_words && !paragraph.bbox.is_empty() {
                return AnchorSearch::Anchor(paragraph.bbox);
            }
        }

        if any_region {
            AnchorSearch::BelowThreshold
        } else {
            AnchorSearch::NoRegion
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Paragraph with `words` words on a single line
    pub(crate) fn paragraph(bbox: BoundingBox, words: usize) -> Paragraph {
        Paragraph {
            bbox,
            lines: vec![Line {
                bbox,
                words: (0..words)
                    .map(|i| Word {
                        bbox,
                        confidence: 0.9,
                        text: format!("w{}", i),
                    })
                    .collect(),
            }],
        }
    }

    pub(crate) fn layout_with(paragraphs: Vec<Paragraph>) -> LayoutResult {
        LayoutResult {
            blocks: vec![Block {
                bbox: BoundingBox::new(0, 0, 1000, 1000),
                paragraphs,
            }],
            mean_confidence: 0.5,
        }
    }

    #[test]
    fn test_bounding_box_edges() {
        let bbox = BoundingBox::new(10, 20, 30, 40);
        assert_eq!(bbox.right(), 40);
        assert_eq!(bbox.bottom(), 60);
        assert!(!bbox.is_empty());
        assert!(BoundingBox::new(1, 1, 5, 0).is_empty());
    }

    #[test]
    fn test_clamp_to_image() {
        let bbox = BoundingBox::new(80, 90, 50, 50);
        assert_eq!(bbox.clamp_to(100, 100), Some(BoundingBox::new(80, 90, 20, 10)));
        assert_eq!(BoundingBox::new(120, 0, 10, 10).clamp_to(100, 100), None);
    }

    #[test]
    fn test_empty_layout_has_no_region() {
        assert_eq!(LayoutResult::empty(0.9).find_anchor(5), AnchorSearch::NoRegion);
    }

    #[test]
    fn test_zero_height_paragraph_is_no_region() {
        let layout = layout_with(vec![paragraph(BoundingBox::new(0, 0, 100, 0), 2)]);
        assert_eq!(layout.find_anchor(5), AnchorSearch::NoRegion);
    }

    #[test]
    fn test_first_qualifying_paragraph_wins() {
        let small = BoundingBox::new(0, 0, 100, 10);
        let first = BoundingBox::new(0, 20, 200, 50);
        let second = BoundingBox::new(0, 100, 400, 300);
        let layout = layout_with(vec![
            paragraph(small, 2),
            paragraph(first, 5),
            paragraph(second, 50),
        ]);
        assert_eq!(layout.find_anchor(5), AnchorSearch::Anchor(first));
    }

    #[test]
    fn test_anchor_search_crosses_blocks() {
        let target = BoundingBox::new(5, 500, 300, 80);
        let layout = LayoutResult {
            blocks: vec![
                Block {
                    bbox: BoundingBox::new(0, 0, 100, 100),
                    paragraphs: vec![paragraph(BoundingBox::new(0, 0, 100, 20), 3)],
                },
                Block {
                    bbox: BoundingBox::new(0, 500, 400, 100),
                    paragraphs: vec![paragraph(target, 6)],
                },
            ],
            mean_confidence: 0.6,
        };
        assert_eq!(layout.find_anchor(5), AnchorSearch::Anchor(target));
        assert_eq!(layout.word_count(), 9);
    }

    #[test]
    fn test_below_threshold() {
        let layout = layout_with(vec![
            paragraph(BoundingBox::new(0, 0, 100, 10), 4),
            paragraph(BoundingBox::new(0, 20, 100, 10), 1),
        ]);
        assert_eq!(layout.find_anchor(5), AnchorSearch::BelowThreshold);
    }

    #[test]
    fn test_word_count_spans_lines() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        let mut para = paragraph(bbox, 3);
        para.lines.push(Line {
            bbox,
            words: vec![Word::default(), Word::default()],
        });
        assert_eq!(para.word_count(), 5);
    }
}
