mod common;

use std::sync::Arc;

use vimarsha_pdf::{AssetSource, DirSource, EmbeddedImage, Error, ImageFormat, LogoCache, Logos, RenderConfig};

#[test]
fn logos_fetched_once_per_cache() {
    let _ = env_logger::try_init();
    let source = common::logo_source();
    let cache = LogoCache::new();
    let config = RenderConfig::default();

    let first = Logos::load(&source, &cache, &config).expect("first load");
    assert_eq!(source.fetches(), 3);
    assert_eq!(cache.len(), 3);

    let second = Logos::load(&source, &cache, &config).expect("second load");
    assert_eq!(source.fetches(), 3);
    for (a, b) in first.0.iter().zip(second.0.iter()) {
        assert!(Arc::ptr_eq(a, b));
    }
}

#[test]
fn repeated_path_is_fetched_once() {
    let source = common::MemorySource::default().with("/logo.png", common::png_bytes(16, 16));
    let cache = LogoCache::new();
    let config = RenderConfig {
        logos: ["/logo.png".to_string(), "/logo.png".to_string(), "/logo.png".to_string()],
        ..RenderConfig::default()
    };
    Logos::load(&source, &cache, &config).expect("load");
    assert_eq!(source.fetches(), 1);
    assert!(cache.contains("/logo.png"));
}

#[test]
fn failed_fetch_is_not_cached() {
    let source = common::MemorySource::default();
    let cache = LogoCache::new();

    let err = cache.get_or_fetch(&source, "/g20.png").expect_err("missing");
    assert!(matches!(err, Error::Asset { .. }));
    assert!(cache.is_empty());

    let _ = cache.get_or_fetch(&source, "/g20.png");
    assert_eq!(source.fetches(), 2);
}

#[test]
fn undecodable_logo_is_an_asset_error() {
    let source = common::MemorySource::default().with("/g20.png", b"<html>404</html>".to_vec());
    let err = LogoCache::new()
        .get_or_fetch(&source, "/g20.png")
        .expect_err("not an image");
    match err {
        Error::Asset { path, .. } => assert_eq!(path, "/g20.png"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dir_source_maps_web_paths() {
    let dir = common::output_dir("dir_source");
    std::fs::write(dir.join("railway.png"), common::png_bytes(12, 6)).expect("write logo");

    let source = DirSource::new(&dir);
    let bytes = source.fetch("/railway.png").expect("fetch");
    let img = EmbeddedImage::from_bytes(bytes).expect("decode");
    assert_eq!(img.format, ImageFormat::Png);
    assert_eq!((img.pixel_width, img.pixel_height), (12, 6));

    assert!(matches!(source.fetch("/nope.png"), Err(Error::Asset { .. })));
}

#[test]
fn jpeg_logo_sniffed_from_bytes() {
    let img = EmbeddedImage::from_bytes(common::jpeg_bytes(20, 10)).expect("decode");
    assert_eq!(img.format, ImageFormat::Jpeg);
    assert_eq!(img.fit_within(60.0, 60.0), (60.0, 30.0));
}
