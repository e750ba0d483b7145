#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::fs;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use vimarsha_pdf::{AssetSource, Error, LogoCache, Logos, RenderConfig};

/// Asset source backed by a map, counting every fetch.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn with(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.files.get(path).cloned().ok_or_else(|| Error::Asset {
            path: path.to_string(),
            reason: "not found".to_string(),
        })
    }
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 90, 160]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// Half-transparent PNG, written with a soft mask.
pub fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 128]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([120, 120, 60]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// Valid PNG header over a damaged deflate stream.
pub fn corrupt_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = png_bytes(width, height);
    let idat = bytes
        .windows(4)
        .position(|w| w == b"IDAT")
        .expect("IDAT chunk");
    let end = (idat + 20).min(bytes.len());
    for b in &mut bytes[idat + 4..end] {
        *b ^= 0xA5;
    }
    bytes
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn png_data_uri(width: u32, height: u32) -> String {
    data_uri("image/png", &png_bytes(width, height))
}

pub fn jpeg_data_uri(width: u32, height: u32) -> String {
    data_uri("image/jpeg", &jpeg_bytes(width, height))
}

/// Source serving the three default logo paths.
pub fn logo_source() -> MemorySource {
    MemorySource::default()
        .with("/g20.png", png_bytes(64, 64))
        .with("/railway.png", rgba_png_bytes(48, 48))
        .with("/tourism.png", jpeg_bytes(80, 40))
}

pub fn logos() -> Logos {
    Logos::load(&logo_source(), &LogoCache::new(), &RenderConfig::default())
        .expect("load test logos")
}

/// Output directory: tests/output/<name>/
pub fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    fs::create_dir_all(&dir).ok();
    dir
}
