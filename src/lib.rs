pub mod analytics;
mod assets;
mod error;
mod fonts;
mod images;
pub mod model;
pub mod pdf;
pub mod reports;

#[cfg(feature = "http")]
pub use assets::HttpSource;
pub use assets::{AssetSource, DirSource, LogoCache};
pub use error::Error;
pub use fonts::FontStyle;
pub use images::{EmbeddedImage, ImageFormat, is_embedded_image};
pub use pdf::{Logos, RenderConfig, RenderedReport};

use std::path::{Path, PathBuf};
use std::time::Instant;

use model::Report;

/// Render `report` and write it into `out_dir`. Returns the written path.
///
/// Logo loading happens first; if it fails nothing is written.
pub fn generate_report(
    report: &Report,
    source: &dyn AssetSource,
    cache: &LogoCache,
    config: &RenderConfig,
    out_dir: &Path,
) -> Result<PathBuf, Error> {
    let t0 = Instant::now();

    let logos = Logos::load(source, cache, config)?;
    let t_logos = t0.elapsed();

    let rendered = pdf::render(report, &logos, config);
    let t_layout = t0.elapsed();

    let path = rendered.save(out_dir)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: logos={:.1}ms, layout={:.1}ms, write={:.1}ms, total={:.1}ms ({} page(s) -> {})",
        t_logos.as_secs_f64() * 1000.0,
        (t_layout - t_logos).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        rendered.page_count(),
        path.display(),
    );

    Ok(path)
}
