use std::sync::Arc;

use crate::fonts::FontStyle;
use crate::images::EmbeddedImage;
use crate::model::BannerMode;

use super::cursor::{Cursor, PageGeometry};

pub(super) const BORDER_INSET: f32 = 20.0;
const BORDER_GRAY: u8 = 50;
const BORDER_WIDTH: f32 = 1.2;
const LOGO_SIZE: f32 = 60.0;
const LOGO_SIDE_X: f32 = 60.0;

/// One drawing instruction. Coordinates are in points from the top-left
/// corner; text `y` is the baseline.
#[derive(Clone, Debug)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        style: FontStyle,
        size: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        gray: u8,
        width: f32,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        gray: u8,
        width: f32,
    },
    RoundedRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        gray: u8,
        width: f32,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: Arc<EmbeddedImage>,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }

    /// True when the page carries the full-page frame.
    pub fn has_border(&self, geometry: &PageGeometry) -> bool {
        self.ops.iter().any(|op| {
            matches!(op, DrawOp::Rect { x, y, w, h, .. }
                if *x == BORDER_INSET
                    && *y == BORDER_INSET
                    && (*w - (geometry.width - 2.0 * BORDER_INSET)).abs() < 0.01
                    && (*h - (geometry.height - 2.0 * BORDER_INSET)).abs() < 0.01)
        })
    }
}

/// Logos, title and subtitle drawn at the top of a report.
#[derive(Clone, Debug)]
pub struct Banner {
    pub logos: [Arc<EmbeddedImage>; 3],
    pub title: String,
    pub subtitle: String,
}

/// Pages under construction plus the write cursor.
pub struct Canvas {
    geometry: PageGeometry,
    cursor: Cursor,
    pages: Vec<Page>,
    banner: Option<(Banner, BannerMode)>,
    /// Cursor position right after the current page's decoration.
    page_top: f32,
}

impl Canvas {
    /// A canvas whose pages carry the border only.
    pub fn new(geometry: PageGeometry) -> Self {
        let mut canvas = Canvas {
            geometry,
            cursor: Cursor::new(&geometry),
            pages: Vec::new(),
            banner: None,
            page_top: geometry.top_margin,
        };
        canvas.start_page();
        canvas
    }

    /// A canvas with the banner on the first page, and on every later page
    /// when `mode` is [`BannerMode::EveryPage`].
    pub fn with_banner(geometry: PageGeometry, banner: Banner, mode: BannerMode) -> Self {
        let mut canvas = Canvas {
            geometry,
            cursor: Cursor::new(&geometry),
            pages: Vec::new(),
            banner: None,
            page_top: geometry.top_margin,
        };
        canvas.pages.push(Page::default());
        canvas.draw_border();
        draw_banner(&mut canvas, &banner);
        canvas.page_top = canvas.cursor.y;
        canvas.banner = Some((banner, mode));
        canvas
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn y(&self) -> f32 {
        self.cursor.y
    }

    pub fn advance(&mut self, dy: f32) {
        self.cursor.advance(dy);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Space left between the cursor and the bottom margin.
    pub fn remaining(&self) -> f32 {
        self.geometry.content_bottom() - self.cursor.y
    }

    /// Start a new page when a block of `needed` points would run past the
    /// bottom margin. Returns whether a page break happened.
    ///
    /// A block taller than a whole page is not subdivided: on a fresh page
    /// it is drawn anyway and clipped by the page edge.
    pub fn ensure_space(&mut self, needed: f32) -> bool {
        if self.cursor.y + needed <= self.geometry.content_bottom() {
            return false;
        }
        if self.cursor.y <= self.page_top {
            log::debug!(
                "block of {needed:.1}pt exceeds a full page on page {}, clipping",
                self.pages.len()
            );
            return false;
        }
        log::debug!(
            "page break at y={:.1} (needed {needed:.1}, remaining {:.1})",
            self.cursor.y,
            self.remaining()
        );
        self.start_page();
        true
    }

    fn start_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor.reset_top();
        self.draw_border();
        if let Some((banner, BannerMode::EveryPage)) = &self.banner {
            let banner = banner.clone();
            draw_banner(self, &banner);
        }
        self.page_top = self.cursor.y;
    }

    fn draw_border(&mut self) {
        let g = self.geometry;
        self.push(DrawOp::Rect {
            x: BORDER_INSET,
            y: BORDER_INSET,
            w: g.width - 2.0 * BORDER_INSET,
            h: g.height - 2.0 * BORDER_INSET,
            gray: BORDER_GRAY,
            width: BORDER_WIDTH,
        });
    }

    pub(crate) fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, style: FontStyle, size: f32) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.push(DrawOp::Text {
            x,
            y,
            text,
            style,
            size,
        });
    }

    pub fn text_centered(&mut self, y: f32, text: &str, style: FontStyle, size: f32) {
        let x = (self.geometry.width - style.text_width(text, size)) / 2.0;
        self.text(x, y, text, style, size);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, gray: u8, width: f32) {
        self.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            gray,
            width,
        });
    }

    /// Horizontal rule across the content width at `y`.
    pub fn rule(&mut self, y: f32, gray: u8, width: f32) {
        let g = self.geometry;
        self.line(g.margin_x, y, g.width - g.margin_x, y, gray, width);
    }

    pub fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, gray: u8) {
        self.push(DrawOp::RoundedRect {
            x,
            y,
            w,
            h,
            radius,
            gray,
            width: 1.0,
        });
    }

    pub fn image(&mut self, x: f32, y: f32, w: f32, h: f32, image: Arc<EmbeddedImage>) {
        self.push(DrawOp::Image { x, y, w, h, image });
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}

fn draw_banner(canvas: &mut Canvas, banner: &Banner) {
    let g = *canvas.geometry();
    let y = canvas.y();
    let xs = [
        LOGO_SIDE_X,
        g.width / 2.0 - LOGO_SIZE / 2.0,
        g.width - LOGO_SIDE_X - LOGO_SIZE,
    ];
    for (logo, x) in banner.logos.iter().zip(xs) {
        canvas.image(x, y, LOGO_SIZE, LOGO_SIZE, Arc::clone(logo));
    }
    canvas.advance(80.0);

    let y = canvas.y();
    canvas.text_centered(y, &banner.title, FontStyle::Bold, 18.0);
    canvas.advance(25.0);

    let y = canvas.y();
    canvas.text_centered(y, &banner.subtitle, FontStyle::Bold, 12.0);
    canvas.advance(20.0);

    let y = canvas.y();
    canvas.rule(y, 180, 1.0);
    canvas.advance(20.0);
}
