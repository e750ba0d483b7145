mod canvas;
mod cursor;
mod layout;
mod table;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::assets::{AssetSource, LogoCache};
use crate::error::Error;
use crate::fonts::{FontStyle, register_fonts, to_winansi_bytes};
use crate::images::{EmbeddedImage, write_image_xobject};
use crate::model::{Block, Report, Section};

pub use canvas::{Banner, Canvas, DrawOp, Page};
pub use cursor::{Cursor, PageGeometry};
pub use layout::{
    LINE_HEIGHT, add_photo, group, section_header, wrap_text, write_line, write_multi_line_block,
};
pub use table::{render_table, table_header, table_row};

const FOOTER_RESERVE: f32 = 40.0;
const FOOTER_OFFSET: f32 = 40.0;

/// Page geometry and the asset paths of the three banner logos.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub geometry: PageGeometry,
    pub logos: [String; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            geometry: PageGeometry::A4,
            logos: [
                "/g20.png".to_string(),
                "/railway.png".to_string(),
                "/tourism.png".to_string(),
            ],
        }
    }
}

/// The three decoded banner logos, left to right.
#[derive(Clone, Debug)]
pub struct Logos(pub [Arc<EmbeddedImage>; 3]);

impl Logos {
    /// Any failure here is fatal to the render; nothing is retried.
    pub fn load(
        source: &dyn AssetSource,
        cache: &LogoCache,
        config: &RenderConfig,
    ) -> Result<Self, Error> {
        let [a, b, c] = &config.logos;
        Ok(Logos([
            cache.get_or_fetch(source, a)?,
            cache.get_or_fetch(source, b)?,
            cache.get_or_fetch(source, c)?,
        ]))
    }
}

/// A fully laid out report, ready to be written.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    pub file_name: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

fn render_section(canvas: &mut Canvas, section: &Section) {
    section_header(canvas, &section.title);
    for block in &section.blocks {
        match block {
            Block::Field(field) => write_line(canvas, &field.label, field.value.as_deref()),
            Block::Note(field) => {
                write_multi_line_block(canvas, &field.label, field.value.as_deref())
            }
            Block::Photo { label, source } => {
                add_photo(canvas, label, source.as_deref());
            }
            Block::Table(table) => render_table(canvas, table),
            Block::Group { title, fields } => group(canvas, title, fields),
        }
    }
}

/// Lay out `report`: banner, every section in order, then the footer line.
pub fn render(report: &Report, logos: &Logos, config: &RenderConfig) -> RenderedReport {
    let t0 = std::time::Instant::now();
    let banner = Banner {
        logos: logos.0.clone(),
        title: report.title.clone(),
        subtitle: report.subtitle.clone(),
    };
    let mut canvas = Canvas::with_banner(config.geometry, banner, report.banner);

    for (si, section) in report.sections.iter().enumerate() {
        log::debug!(
            "section {} '{}' ({} blocks) at page={} y={:.1}",
            si + 1,
            section.title,
            section.blocks.len(),
            canvas.page_count(),
            canvas.y()
        );
        render_section(&mut canvas, section);
    }

    canvas.ensure_space(FOOTER_RESERVE);
    let footer_y = config.geometry.height - FOOTER_OFFSET;
    canvas.text_centered(footer_y, &report.footer, FontStyle::Italic, 10.0);

    let pages = canvas.into_pages();
    log::info!(
        "Layout: {} section(s) on {} page(s) in {:.1}ms",
        report.sections.len(),
        pages.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    RenderedReport {
        file_name: report.file_name.clone(),
        geometry: config.geometry,
        pages,
    }
}

fn rounded_rect_path(content: &mut Content, x: f32, y: f32, w: f32, h: f32, radius: f32) {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    // Bezier handle length for a quarter circle.
    let k = r * 0.552_284_8;
    content.move_to(x + r, y);
    content.line_to(x + w - r, y);
    content.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    content.line_to(x + w, y + h - r);
    content.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    content.line_to(x + r, y + h);
    content.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    content.line_to(x, y + r);
    content.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    content.close_path();
}

impl RenderedReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text drawn on each page, in drawing order.
    pub fn text_content(&self) -> Vec<Vec<String>> {
        self.pages
            .iter()
            .map(|p| p.texts().map(str::to_string).collect())
            .collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|p| p.texts().any(|t| t == needle))
    }

    fn page_content(
        &self,
        page: &Page,
        image_names: &HashMap<*const EmbeddedImage, String>,
    ) -> Content {
        // Layout works top-down; PDF user space grows upward.
        let ph = self.geometry.height;
        let mut content = Content::new();

        for op in &page.ops {
            match op {
                DrawOp::Text {
                    x,
                    y,
                    text,
                    style,
                    size,
                } => {
                    content.begin_text();
                    content.set_font(Name(style.pdf_name().as_bytes()), *size);
                    content.next_line(*x, ph - *y);
                    content.show(Str(&to_winansi_bytes(text)));
                    content.end_text();
                }
                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    gray,
                    width,
                } => {
                    content.save_state();
                    content.set_line_width(*width);
                    content.set_stroke_gray(*gray as f32 / 255.0);
                    content.move_to(*x1, ph - *y1);
                    content.line_to(*x2, ph - *y2);
                    content.stroke();
                    content.restore_state();
                }
                DrawOp::Rect {
                    x,
                    y,
                    w,
                    h,
                    gray,
                    width,
                } => {
                    content.save_state();
                    content.set_line_width(*width);
                    content.set_stroke_gray(*gray as f32 / 255.0);
                    content.rect(*x, ph - *y - *h, *w, *h);
                    content.stroke();
                    content.restore_state();
                }
                DrawOp::RoundedRect {
                    x,
                    y,
                    w,
                    h,
                    radius,
                    gray,
                    width,
                } => {
                    content.save_state();
                    content.set_line_width(*width);
                    content.set_stroke_gray(*gray as f32 / 255.0);
                    rounded_rect_path(&mut content, *x, ph - *y - *h, *w, *h, *radius);
                    content.stroke();
                    content.restore_state();
                }
                DrawOp::Image { x, y, w, h, image } => {
                    let Some(name) = image_names.get(&Arc::as_ptr(image)) else {
                        continue;
                    };
                    content.save_state();
                    content.transform([*w, 0.0, 0.0, *h, *x, ph - *y - *h]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
            }
        }
        content
    }

    /// Serialize to PDF bytes.
    pub fn to_pdf(&self) -> Result<Vec<u8>, Error> {
        let t0 = std::time::Instant::now();
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let info_id = alloc();

        let font_pairs = register_fonts(&mut pdf, &mut alloc);

        // Logos repeat on every page of some reports; write each image once.
        let mut image_names: HashMap<*const EmbeddedImage, String> = HashMap::new();
        let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
        for op in self.pages.iter().flat_map(|p| p.ops.iter()) {
            let DrawOp::Image { image, .. } = op else {
                continue;
            };
            let key = Arc::as_ptr(image);
            if image_names.contains_key(&key) {
                continue;
            }
            let xobj_ref = alloc();
            write_image_xobject(&mut pdf, image, xobj_ref, &mut alloc)?;
            let pdf_name = format!("Im{}", image_xobjects.len() + 1);
            image_names.insert(key, pdf_name.clone());
            image_xobjects.push((pdf_name, xobj_ref));
        }
        let t_images = t0.elapsed();

        let n = self.pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        for (i, page) in self.pages.iter().enumerate() {
            let raw = self.page_content(page, &image_names).finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);
        pdf.document_info(info_id)
            .title(TextStr(self.file_name.trim_end_matches(".pdf")))
            .producer(TextStr(concat!("vimarsha-pdf ", env!("CARGO_PKG_VERSION"))));

        let g = self.geometry;
        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, g.width, g.height))
                .parent(pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for (name, font_ref) in &font_pairs {
                    fonts.pair(Name(name.as_bytes()), *font_ref);
                }
            }
            if !image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        let bytes = pdf.finish();
        log::info!(
            "Write: {} page(s), {} image(s), images={:.1}ms, total={:.1}ms (output {} bytes)",
            n,
            image_xobjects.len(),
            t_images.as_secs_f64() * 1000.0,
            t0.elapsed().as_secs_f64() * 1000.0,
            bytes.len(),
        );
        Ok(bytes)
    }

    /// Write the PDF into `dir` under the report's file name. The name is
    /// flattened to a single path component first.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, Error> {
        let bytes = self.to_pdf()?;
        std::fs::create_dir_all(dir)?;
        let name = flat_file_name(&self.file_name);
        if name != self.file_name {
            log::debug!("save: file name {:?} written as {:?}", self.file_name, name);
        }
        let path = dir.join(name);
        std::fs::write(&path, &bytes).map_err(Error::Io)?;
        Ok(path)
    }
}

/// Replace path separators so ids like `ERC/2024/01` stay inside the output
/// directory.
pub fn flat_file_name(name: &str) -> String {
    let flat: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match flat.trim() {
        "" | "." | ".." => "report.pdf".to_string(),
        _ => flat,
    }
}
