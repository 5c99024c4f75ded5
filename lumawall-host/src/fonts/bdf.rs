//! BDF bitmap font parser
//!
//! Reads the subset of BDF 2.1 needed to draw text: the font bounding box,
//! `FONT_ASCENT`/`FONT_DESCENT` and, per character, `ENCODING`, `DWIDTH`,
//! `BBX` and the `BITMAP` rows.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use lumawall_core::traits::{FontMetrics, Glyph, GlyphBitmap};

/// BDF parse errors
#[derive(Debug, Error)]
pub enum BdfError {
    #[error("failed to read font: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: &'static str },
    #[error("font defines no glyphs")]
    Empty,
}

#[derive(Debug, Clone)]
struct BdfGlyph {
    width: u8,
    height: u8,
    x_offset: i8,
    y_offset: i8,
    advance: u8,
    stride: usize,
    rows: Vec<u8>,
}

/// A parsed BDF font
#[derive(Debug, Clone)]
pub struct BdfFont {
    metrics: FontMetrics,
    glyphs: HashMap<char, BdfGlyph>,
}

impl BdfFont {
    pub fn load(path: &Path) -> Result<Self, BdfError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, BdfError> {
        let mut parser = Parser::default();
        let mut lines = text.lines().enumerate();

        while let Some((index, line)) = lines.next() {
            let line_no = index + 1;
            let mut fields = line.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };
            let args: Vec<&str> = fields.collect();

            match keyword {
                "FONTBOUNDINGBOX" => {
                    let [_, h, _, yoff] = numbers::<4>(&args, line_no)?;
                    parser.bbox = Some((h, yoff));
                }
                "FONT_ASCENT" => parser.ascent = Some(numbers::<1>(&args, line_no)?[0]),
                "FONT_DESCENT" => parser.descent = Some(numbers::<1>(&args, line_no)?[0]),
                "STARTCHAR" => parser.current = Some(PendingGlyph::default()),
                "ENCODING" => {
                    let code = numbers::<1>(&args, line_no)?[0];
                    if let Some(pending) = parser.current.as_mut() {
                        pending.ch = u32::try_from(code).ok().and_then(char::from_u32);
                    }
                }
                "DWIDTH" => {
                    let dx = numbers::<1>(&args, line_no)?[0];
                    if let Some(pending) = parser.current.as_mut() {
                        pending.advance = Some(fit(dx, line_no)?);
                    }
                }
                "BBX" => {
                    let [w, h, xoff, yoff] = numbers::<4>(&args, line_no)?;
                    if let Some(pending) = parser.current.as_mut() {
                        pending.bbx = Some((fit(w, line_no)?, fit(h, line_no)?, fit(xoff, line_no)?, fit(yoff, line_no)?));
                    }
                }
                "BITMAP" => {
                    let Some(pending) = parser.current.as_mut() else {
                        return Err(syntax(line_no, "BITMAP outside STARTCHAR"));
                    };
                    let Some((width, height, _, _)) = pending.bbx else {
                        return Err(syntax(line_no, "BITMAP before BBX"));
                    };
                    let stride = (width as usize).div_ceil(8);
                    for _ in 0..height {
                        let Some((index, row)) = lines.next() else {
                            return Err(syntax(line_no, "truncated BITMAP"));
                        };
                        pending.rows.extend(hex_row(row.trim(), stride, index + 1)?);
                    }
                    pending.stride = stride;
                }
                "ENDCHAR" => {
                    if let Some(pending) = parser.current.take() {
                        parser.finish(pending, line_no)?;
                    }
                }
                _ => {}
            }
        }

        parser.build()
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    pub fn glyph(&self, ch: char) -> Option<Glyph<'_>> {
        self.glyphs.get(&ch).map(|g| Glyph {
            width: g.width,
            height: g.height,
            x_offset: g.x_offset,
            y_offset: g.y_offset,
            advance: g.advance,
            bitmap: GlyphBitmap::Rows {
                data: &g.rows,
                stride: g.stride,
            },
        })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Debug, Default)]
struct PendingGlyph {
    ch: Option<char>,
    advance: Option<u8>,
    bbx: Option<(u8, u8, i8, i8)>,
    stride: usize,
    rows: Vec<u8>,
}

#[derive(Debug, Default)]
struct Parser {
    bbox: Option<(i64, i64)>,
    ascent: Option<i64>,
    descent: Option<i64>,
    current: Option<PendingGlyph>,
    glyphs: HashMap<char, BdfGlyph>,
}

impl Parser {
    fn finish(&mut self, pending: PendingGlyph, line: usize) -> Result<(), BdfError> {
        // Unencoded glyphs (ENCODING -1) are skipped
        let Some(ch) = pending.ch else {
            return Ok(());
        };
        let Some((width, height, x_offset, y_offset)) = pending.bbx else {
            return Err(syntax(line, "glyph without BBX"));
        };
        self.glyphs.insert(
            ch,
            BdfGlyph {
                width,
                height,
                x_offset,
                y_offset,
                advance: pending.advance.unwrap_or(width),
                stride: pending.stride,
                rows: pending.rows,
            },
        );
        Ok(())
    }

    fn build(self) -> Result<BdfFont, BdfError> {
        if self.glyphs.is_empty() {
            return Err(BdfError::Empty);
        }
        let (bbox_h, bbox_yoff) = self.bbox.unwrap_or((8, -1));
        let ascent = self.ascent.unwrap_or(bbox_h + bbox_yoff);
        let descent = self.descent.unwrap_or(-bbox_yoff);
        Ok(BdfFont {
            metrics: FontMetrics {
                ascent: ascent.clamp(0, u8::MAX as i64) as u8,
                descent: descent.clamp(0, u8::MAX as i64) as u8,
            },
            glyphs: self.glyphs,
        })
    }
}

fn syntax(line: usize, message: &'static str) -> BdfError {
    BdfError::Syntax { line, message }
}

fn numbers<const N: usize>(args: &[&str], line: usize) -> Result<[i64; N], BdfError> {
    if args.len() < N {
        return Err(syntax(line, "missing numeric field"));
    }
    let mut out = [0i64; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().map_err(|_| syntax(line, "invalid number"))?;
    }
    Ok(out)
}

fn fit<T: TryFrom<i64>>(value: i64, line: usize) -> Result<T, BdfError> {
    T::try_from(value).map_err(|_| syntax(line, "value out of range"))
}

fn hex_row(row: &str, stride: usize, line: usize) -> Result<Vec<u8>, BdfError> {
    let mut bytes = vec![0u8; stride];
    for (i, slot) in bytes.iter_mut().enumerate() {
        let Some(pair) = row.get(i * 2..i * 2 + 2) else {
            break;
        };
        *slot = u8::from_str_radix(pair, 16).map_err(|_| syntax(line, "invalid BITMAP row"))?;
    }
    Ok(bytes)
}
