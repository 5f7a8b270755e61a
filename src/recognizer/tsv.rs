//! Tesseract TSV output parser
//!
//! Columns: `level page_num block_num par_num line_num word_num left top
//! width height conf text`. Levels 1-5 are page, block, paragraph, line and
//! word. Only word rows carry a confidence (0-100); other rows report -1.

use crate::layout::{Block, BoundingBox, LayoutResult, Line, Paragraph, Word};
use thiserror::Error;

const LEVEL_PAGE: u32 = 1;
const LEVEL_BLOCK: u32 = 2;
const LEVEL_PARAGRAPH: u32 = 3;
const LEVEL_LINE: u32 = 4;
const LEVEL_WORD: u32 = 5;

/// Minimum column count (text may be missing)
const MIN_COLUMNS: usize = 11;

/// TSV parse failure
#[derive(Debug, Error, PartialEq)]
#[error("TSV line {line}: {message}")]
pub struct TsvError {
    pub line: usize,
    pub message: String,
}

struct Row<'a> {
    level: u32,
    bbox: BoundingBox,
    conf: f32,
    text: &'a str,
}

fn parse_row(line_no: usize, line: &str) -> Result<Row<'_>, TsvError> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < MIN_COLUMNS {
        return Err(TsvError {
            line: line_no,
            message: format!("expected {} columns, found {}", MIN_COLUMNS, cols.len()),
        });
    }

    let int = |idx: usize, name: &str| -> Result<u32, TsvError> {
        cols[idx].trim().parse::<u32>().map_err(|_| TsvError {
            line: line_no,
            message: format!("invalid {} '{}'", name, cols[idx]),
        })
    };

    let conf = cols[10].trim().parse::<f32>().map_err(|_| TsvError {
        line: line_no,
        message: format!("invalid conf '{}'", cols[10]),
    })?;

    Ok(Row {
        level: int(0, "level")?,
        bbox: BoundingBox::new(
            int(6, "left")?,
            int(7, "top")?,
            int(8, "width")?,
            int(9, "height")?,
        ),
        conf,
        text: cols.get(11).map(|t| t.trim()).unwrap_or(""),
    })
}

/// Parse `tesseract ... tsv` output into a [`LayoutResult`]
///
/// A header row, if present, is skipped. Regions that appear without their
/// parent (a word before any line, say) get a parent sharing their box.
pub fn parse_tsv(tsv: &str) -> Result<LayoutResult, TsvError> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut conf_sum = 0.0f64;
    let mut conf_count = 0usize;

    for (idx, raw) in tsv.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim().is_empty() || raw.starts_with("level") {
            continue;
        }
        let row = parse_row(line_no, raw)?;

        match row.level {
            LEVEL_PAGE => {}
            LEVEL_BLOCK => blocks.push(Block {
                bbox: row.bbox,
                paragraphs: Vec::new(),
            }),
            LEVEL_PARAGRAPH => current_block(&mut blocks, row.bbox).paragraphs.push(Paragraph {
                bbox: row.bbox,
                lines: Vec::new(),
            }),
            LEVEL_LINE => current_paragraph(&mut blocks, row.bbox).lines.push(Line {
                bbox: row.bbox,
                words: Vec::new(),
            }),
            LEVEL_WORD => {
                let confidence = if row.conf >= 0.0 {
                    conf_sum += row.conf as f64;
                    conf_count += 1;
                    (row.conf / 100.0).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                current_line(&mut blocks, row.bbox).words.push(Word {
                    bbox: row.bbox,
                    confidence,
                    text: row.text.to_string(),
                });
            }
            other => {
                return Err(TsvError {
                    line: line_no,
                    message: format!("unknown level {}", other),
                })
            }
        }
    }

    let mean_confidence = if conf_count == 0 {
        0.0
    } else {
        ((conf_sum / conf_count as f64) / 100.0).clamp(0.0, 1.0) as f32
    };

    Ok(LayoutResult {
        blocks,
        mean_confidence,
    })
}

fn current_block(blocks: &mut Vec<Block>, bbox: BoundingBox) -> &mut Block {
    if blocks.is_empty() {
        blocks.push(Block {
            bbox,
            paragraphs: Vec::new(),
        });
    }
    let last = blocks.len() - 1;
    &mut blocks[last]
}

fn current_paragraph(blocks: &mut Vec<Block>, bbox: BoundingBox) -> &mut Paragraph {
    let block = current_block(blocks, bbox);
    if block.paragraphs.is_empty() {
        block.paragraphs.push(Paragraph {
            bbox,
            lines: Vec::new(),
        });
    }
    let last = block.paragraphs.len() - 1;
    &mut block.paragraphs[last]
}

fn current_line(blocks: &mut Vec<Block>, bbox: BoundingBox) -> &mut Line {
    let paragraph = current_paragraph(blocks, bbox);
    if paragraph.lines.is_empty() {
        paragraph.lines.push(Line {
            bbox,
            words: Vec::new(),
        });
    }
    let last = paragraph.lines.len() - 1;
    &mut paragraph.lines[last]
}
