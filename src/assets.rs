use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::images::EmbeddedImage;

/// Where static report assets (the three logos) come from.
pub trait AssetSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, Error>;
}

/// Resolves asset paths against a directory, the way a web server maps
/// `/g20.png` onto its public folder.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource { root: root.into() }
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, Error> {
        let full = self.root.join(path.trim_start_matches('/'));
        std::fs::read(&full).map_err(|e| Error::Asset {
            path: path.to_string(),
            reason: format!("{}: {}", e, full.display()),
        })
    }
}

/// Fetches assets relative to a base URL.
#[cfg(feature = "http")]
pub struct HttpSource {
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpSource {
            base_url: base_url.into(),
        }
    }
}

#[cfg(feature = "http")]
impl AssetSource for HttpSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, Error> {
        use std::io::Read;

        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let asset_err = |reason: String| Error::Asset {
            path: path.to_string(),
            reason,
        };
        // ureq reports 4xx/5xx as Err(Status), which lands here too.
        let response = ureq::get(&url)
            .call()
            .map_err(|e| asset_err(format!("HTTP request failed: {e}")))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| asset_err(format!("failed to read response: {e}")))?;
        Ok(bytes)
    }
}

/// Decoded logos keyed by asset path, shared by every render of one
/// application instance.
///
/// The lock is not held while fetching: two renders missing on the same path
/// both fetch, and the later insert wins. Both values are identical.
#[derive(Default)]
pub struct LogoCache {
    entries: Mutex<HashMap<String, Arc<EmbeddedImage>>>,
}

impl LogoCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<EmbeddedImage>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_or_fetch(
        &self,
        source: &dyn AssetSource,
        path: &str,
    ) -> Result<Arc<EmbeddedImage>, Error> {
        if let Some(hit) = self.lock().get(path) {
            return Ok(Arc::clone(hit));
        }

        let t0 = std::time::Instant::now();
        let bytes = source.fetch(path)?;
        let image = EmbeddedImage::from_bytes(bytes).map_err(|e| Error::Asset {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        log::debug!(
            "logo {path}: fetched {}x{} in {:.1}ms",
            image.pixel_width,
            image.pixel_height,
            t0.elapsed().as_secs_f64() * 1000.0
        );

        let image = Arc::new(image);
        self.lock().insert(path.to_string(), Arc::clone(&image));
        Ok(image)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
