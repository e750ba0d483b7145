use crate::fonts::FontStyle;
use crate::model::{Column, Table, display_text};

use super::canvas::Canvas;
use super::layout::{LINE_HEIGHT, draw_lines, wrap_text, write_line};

const HEADER_SIZE: f32 = 11.0;
const CELL_SIZE: f32 = 10.0;
const CELL_PADDING: f32 = 4.0;
const HEADER_RESERVE: f32 = 30.0;
const ROW_SLACK: f32 = 8.0;

struct RowLayout {
    height: f32,
    cell_lines: Vec<Vec<String>>,
}

/// Wrap every cell to its column. The row is as tall as its tallest cell.
fn compute_row_layout(values: &[Option<String>], widths: &[f32]) -> RowLayout {
    let cell_lines: Vec<Vec<String>> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let text = display_text(values.get(i).and_then(|v| v.as_deref()));
            wrap_text(text, FontStyle::Regular, CELL_SIZE, (w - CELL_PADDING).max(1.0))
        })
        .collect();
    let line_count = cell_lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
    RowLayout {
        height: line_count as f32 * LINE_HEIGHT,
        cell_lines,
    }
}

fn draw_row(canvas: &mut Canvas, layout: &RowLayout, widths: &[f32]) {
    let mut x = canvas.geometry().margin_x;
    let y = canvas.y();
    for (lines, w) in layout.cell_lines.iter().zip(widths) {
        draw_lines(canvas, x, y, lines, FontStyle::Regular, CELL_SIZE);
        x += w;
    }
    canvas.advance(layout.height);
}

/// Bold column labels at cumulative offsets, then a light rule.
pub fn table_header(canvas: &mut Canvas, columns: &[Column]) {
    canvas.ensure_space(HEADER_RESERVE);
    let mut x = canvas.geometry().margin_x;
    let y = canvas.y();
    for col in columns {
        canvas.text(x, y, col.label.as_str(), FontStyle::Bold, HEADER_SIZE);
        x += col.width;
    }
    canvas.advance(16.0);
    let y = canvas.y();
    canvas.rule(y - 10.0, 220, 0.5);
}

/// One body row. Returns the number of visual lines the row took.
pub fn table_row(canvas: &mut Canvas, values: &[Option<String>], widths: &[f32]) -> usize {
    let layout = compute_row_layout(values, widths);
    canvas.ensure_space(layout.height + ROW_SLACK);
    draw_row(canvas, &layout, widths);
    (layout.height / LINE_HEIGHT).round() as usize
}

/// Header plus rows, repeating the header after a page break. An empty
/// table becomes a single summary line.
pub fn render_table(canvas: &mut Canvas, table: &Table) {
    if table.rows.is_empty() {
        write_line(canvas, &table.empty_label, Some(&table.empty_message));
        return;
    }

    table_header(canvas, &table.columns);
    let widths = table.widths();
    for (ri, row) in table.rows.iter().enumerate() {
        let layout = compute_row_layout(row, &widths);
        if canvas.ensure_space(layout.height + ROW_SLACK) {
            log::debug!("table row {ri} moved to page {}", canvas.page_count());
            table_header(canvas, &table.columns);
        }
        draw_row(canvas, &layout, &widths);
    }
}
