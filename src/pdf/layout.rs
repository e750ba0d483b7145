use std::sync::Arc;

use crate::fonts::FontStyle;
use crate::images::{EmbeddedImage, is_embedded_image};
use crate::model::{Field, display_text};

use super::canvas::Canvas;

pub const LINE_HEIGHT: f32 = 14.0;

const BODY_SIZE: f32 = 11.0;
const LABEL_COLUMN: f32 = 120.0;
const VALUE_COLUMN: f32 = 140.0;
const MIN_FIELD_HEIGHT: f32 = 18.0;
const FIELD_SLACK: f32 = 10.0;

const SECTION_HEADER_RESERVE: f32 = 60.0;
const NOTE_RESERVE: f32 = 90.0;
const NOTE_PADDING_X: f32 = 12.0;
const GROUP_RESERVE: f32 = 110.0;

const PHOTO_FRAME: f32 = 220.0;
const PHOTO_PADDING: f32 = 8.0;

/// Greedy word wrap against Helvetica advance widths.
///
/// Explicit newlines start a new line. A word wider than `max_width` is broken
/// between characters rather than truncated. Always returns at least one line.
pub fn wrap_text(text: &str, style: FontStyle, font_size: f32, max_width: f32) -> Vec<String> {
    let space_w = style.text_width(" ", font_size);
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in paragraph.split_whitespace() {
            let ww = style.text_width(word, font_size);
            let proposed = if current.is_empty() {
                ww
            } else {
                current_w + space_w + ww
            };

            if proposed <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_w = proposed;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if ww <= max_width {
                current.push_str(word);
                current_w = ww;
            } else {
                let mut pieces = break_word(word, style, font_size, max_width);
                let last = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                current_w = style.text_width(&last, font_size);
                current = last;
            }
        }

        if !current.is_empty() || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn break_word(word: &str, style: FontStyle, font_size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && style.text_width(&piece, font_size) > max_width {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

pub(super) fn draw_lines(
    canvas: &mut Canvas,
    x: f32,
    first_baseline: f32,
    lines: &[String],
    style: FontStyle,
    size: f32,
) {
    for (i, line) in lines.iter().enumerate() {
        canvas.text(x, first_baseline + i as f32 * LINE_HEIGHT, line.as_str(), style, size);
    }
}

/// Bold title with an underline rule.
pub fn section_header(canvas: &mut Canvas, title: &str) {
    canvas.ensure_space(SECTION_HEADER_RESERVE);
    canvas.advance(5.0);
    let y = canvas.y();
    let x = canvas.geometry().margin_x;
    canvas.text(x, y, title, FontStyle::Bold, 14.0);
    canvas.advance(8.0);
    let y = canvas.y();
    canvas.rule(y, 80, 0.6);
    canvas.advance(12.0);
}

/// `label : value` with the value wrapped to the space right of the label column.
pub fn write_line(canvas: &mut Canvas, label: &str, value: Option<&str>) {
    let g = *canvas.geometry();
    let value_width = g.content_width() - VALUE_COLUMN;
    let value_lines = wrap_text(display_text(value), FontStyle::Regular, BODY_SIZE, value_width);
    // Long labels wrap inside their column instead of running into the value.
    let label_lines = wrap_text(label, FontStyle::Regular, BODY_SIZE, LABEL_COLUMN - 4.0);

    let line_count = value_lines.len().max(label_lines.len());
    let row_h = (line_count as f32 * LINE_HEIGHT).max(MIN_FIELD_HEIGHT);
    canvas.ensure_space(row_h + FIELD_SLACK);

    let y = canvas.y();
    draw_lines(canvas, g.margin_x, y, &label_lines, FontStyle::Regular, BODY_SIZE);
    canvas.text(g.margin_x + LABEL_COLUMN, y, ":", FontStyle::Regular, BODY_SIZE);
    draw_lines(
        canvas,
        g.margin_x + VALUE_COLUMN,
        y,
        &value_lines,
        FontStyle::Regular,
        BODY_SIZE,
    );
    canvas.advance(row_h);
}

/// Bold caption above a rounded box sized to the wrapped text.
pub fn write_multi_line_block(canvas: &mut Canvas, label: &str, value: Option<&str>) {
    let g = *canvas.geometry();
    let box_w = g.content_width();
    let lines = wrap_text(
        display_text(value),
        FontStyle::Regular,
        BODY_SIZE,
        box_w - 2.0 * NOTE_PADDING_X,
    );
    let box_h = (lines.len() as f32 * LINE_HEIGHT).max(24.0) + 10.0;

    // Caption and box move together.
    canvas.ensure_space((LINE_HEIGHT + box_h).max(NOTE_RESERVE));

    let y = canvas.y();
    canvas.text(g.margin_x, y, label, FontStyle::Bold, BODY_SIZE);
    canvas.advance(LINE_HEIGHT);

    let y = canvas.y();
    canvas.rounded_rect(g.margin_x, y, box_w, box_h, 10.0, 220);
    draw_lines(
        canvas,
        g.margin_x + NOTE_PADDING_X,
        y + 18.0,
        &lines,
        FontStyle::Regular,
        BODY_SIZE,
    );
    canvas.advance(box_h + 14.0);
}

/// Framed photo. Returns `false` without drawing anything when `source` is not
/// an embedded-image string. A payload that fails to decode is replaced by a
/// short notice inside the frame.
pub fn add_photo(canvas: &mut Canvas, label: &str, source: Option<&str>) -> bool {
    let Some(src) = source.filter(|s| is_embedded_image(s)) else {
        return false;
    };

    canvas.ensure_space(PHOTO_FRAME + 70.0);
    let x = canvas.geometry().margin_x;
    let y = canvas.y();
    canvas.text(x, y, label, FontStyle::Bold, BODY_SIZE);
    canvas.advance(12.0);

    let y = canvas.y();
    canvas.rounded_rect(x, y, PHOTO_FRAME, PHOTO_FRAME, 12.0, 220);

    match EmbeddedImage::from_data_uri(src) {
        Ok(img) => {
            let inner = PHOTO_FRAME - 2.0 * PHOTO_PADDING;
            let (w, h) = img.fit_within(inner, inner);
            canvas.image(
                x + PHOTO_PADDING + (inner - w) / 2.0,
                y + PHOTO_PADDING + (inner - h) / 2.0,
                w,
                h,
                Arc::new(img),
            );
        }
        Err(e) => {
            log::warn!("{label}: {e}");
            canvas.text(
                x + 12.0,
                y + 22.0,
                "Image could not be embedded.",
                FontStyle::Regular,
                10.0,
            );
        }
    }

    canvas.advance(PHOTO_FRAME + 18.0);
    true
}

/// Bold subheading, its field lines, then a light divider.
pub fn group(canvas: &mut Canvas, title: &str, fields: &[Field]) {
    canvas.ensure_space(GROUP_RESERVE);
    let x = canvas.geometry().margin_x;
    let y = canvas.y();
    canvas.text(x, y, title, FontStyle::Bold, 12.0);
    canvas.advance(16.0);

    for field in fields {
        write_line(canvas, &field.label, field.value.as_deref());
    }

    let y = canvas.y();
    canvas.rule(y + 6.0, 220, 0.8);
    canvas.advance(14.0);
}
