//! Image texture cache keyed by URL, plus the background loader that fills it.
//!
//! Loads run on detached worker threads and report back over a channel. The
//! store itself only ever changes on the frame thread when results are
//! drained, and entries are never removed, so a missing key simply means
//! "not ready" (pending and failed look the same).

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use image::RgbaImage;
use reqwest::blocking::Client;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read image '{url}': {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch image '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode image '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image '{url}' has zero width or height")]
    Empty { url: String },
    #[error("could not start a loader thread for '{url}': {source}")]
    Spawn {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// CPU-side RGBA8 image, rows ordered top to bottom.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbaImage,
}

impl DecodedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn decode(url: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let image = image::load_from_memory(bytes).map_err(|source| LoadError::Decode {
            url: url.to_string(),
            source,
        })?;
        let pixels = image.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(LoadError::Empty {
                url: url.to_string(),
            });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Where image bytes come from. Implementations run on loader threads.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<DecodedImage, LoadError>;
}

/// Resolves page image URLs: `http(s)://` over HTTP, everything else from
/// disk relative to the page's asset root. A leading `/` is treated as the
/// site root, i.e. the asset root itself.
#[derive(Debug, Clone)]
pub struct PageImageSource {
    asset_root: PathBuf,
    http: Client,
}

impl PageImageSource {
    pub fn new(asset_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            asset_root: asset_root.into(),
            http,
        })
    }

    pub fn resolve_path(&self, url: &str) -> PathBuf {
        let local = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(local);
        if url.starts_with("file://") && path.is_absolute() {
            return path.to_path_buf();
        }
        let relative = local.trim_start_matches('/');
        self.asset_root.join(relative)
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let fetch_error = |source| LoadError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = self
            .http
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?;
        let bytes = response.bytes().map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }
}

impl ImageSource for PageImageSource {
    fn fetch(&self, url: &str) -> Result<DecodedImage, LoadError> {
        let bytes = if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_remote(url)?
        } else {
            let path = self.resolve_path(url);
            fs::read(&path).map_err(|source| LoadError::Read {
                url: url.to_string(),
                source,
            })?
        };
        DecodedImage::decode(url, &bytes)
    }
}

/// A texture in the store along with its pixel dimensions.
#[derive(Debug, Clone)]
pub struct StoredImage<T> {
    pub handle: T,
    pub width: u32,
    pub height: u32,
}

impl<T> StoredImage<T> {
    /// Height over width, the ratio the resize handler letterboxes against.
    pub fn aspect(&self) -> f32 {
        self.height.max(1) as f32 / self.width.max(1) as f32
    }
}

/// Append-only map from image URL to loaded texture.
#[derive(Debug)]
pub struct TextureStore<T> {
    entries: HashMap<String, StoredImage<T>>,
}

impl<T> TextureStore<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Stores a texture. Loading the same URL again replaces the entry.
    pub fn insert(&mut self, url: impl Into<String>, image: StoredImage<T>) {
        self.entries.insert(url.into(), image);
    }

    /// `None` means not loaded yet, whether the load is pending or failed.
    pub fn lookup(&self, url: &str) -> Option<&StoredImage<T>> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TextureStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one background load.
#[derive(Debug)]
pub struct LoadedImage {
    pub url: String,
    pub result: Result<DecodedImage, LoadError>,
}

/// Fire-and-forget image loader. There is no retry and no cancellation; a
/// result that arrives late is simply picked up by the next drain.
pub struct TextureLoader {
    source: Arc<dyn ImageSource>,
    sender: Sender<LoadedImage>,
    receiver: Receiver<LoadedImage>,
    in_flight: usize,
}

impl TextureLoader {
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            source,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Starts one load per distinct URL and returns how many were started.
    pub fn preload<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = urls.into_iter().map(Into::into).collect();
        let mut started = 0;
        for url in distinct {
            let source = Arc::clone(&self.source);
            let sender = self.sender.clone();
            let thread_url = url.clone();
            let spawned = thread::Builder::new()
                .name("texture-load".to_string())
                .spawn(move || {
                    let result = source.fetch(&thread_url);
                    // The receiver only disappears when the loader is dropped.
                    let _ = sender.send(LoadedImage {
                        url: thread_url,
                        result,
                    });
                });
            match spawned {
                Ok(_) => {
                    debug!(%url, "texture load started");
                    self.in_flight += 1;
                    started += 1;
                }
                Err(source) => {
                    let error = LoadError::Spawn { url, source };
                    warn!(%error, "texture load not started");
                }
            }
        }
        started
    }

    /// Loads started but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Returns every finished load without blocking.
    pub fn drain(&mut self) -> Vec<LoadedImage> {
        let finished: Vec<LoadedImage> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(finished.len());
        finished
    }

    /// Blocks up to `timeout` for the next finished load.
    pub fn wait_next(&mut self, timeout: Duration) -> Option<LoadedImage> {
        match self.receiver.recv_timeout(timeout) {
            Ok(loaded) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(loaded)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use image::{ImageFormat, Rgba};

    struct CountingSource {
        calls: Mutex<Vec<String>>,
    }

    impl ImageSource for CountingSource {
        fn fetch(&self, url: &str) -> Result<DecodedImage, LoadError> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("missing") {
                return Err(LoadError::Empty {
                    url: url.to_string(),
                });
            }
            Ok(DecodedImage::new(RgbaImage::new(4, 2)))
        }
    }

    fn collect_all(loader: &mut TextureLoader, expected: usize) -> Vec<LoadedImage> {
        let mut results = Vec::new();
        while results.len() < expected {
            match loader.wait_next(Duration::from_secs(5)) {
                Some(loaded) => results.push(loaded),
                None => break,
            }
        }
        results
    }

    #[test]
    fn preload_collapses_duplicate_urls() {
        let source = Arc::new(CountingSource {
            calls: Mutex::new(Vec::new()),
        });
        let mut loader = TextureLoader::new(source.clone());
        let started = loader.preload(["/a.jpg", "/b.jpg", "/a.jpg"]);
        assert_eq!(started, 2);
        assert_eq!(loader.in_flight(), 2);
        let results = collect_all(&mut loader, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(loader.in_flight(), 0);
        let mut calls = source.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["/a.jpg".to_string(), "/b.jpg".to_string()]);
    }

    #[test]
    fn failed_loads_report_errors_without_panicking() {
        let source = Arc::new(CountingSource {
            calls: Mutex::new(Vec::new()),
        });
        let mut loader = TextureLoader::new(source);
        loader.preload(["/missing.jpg"]);
        let results = collect_all(&mut loader, 1);
        assert_eq!(results.len(), 1);
        assert!(results[0].result.is_err());
    }

    #[test]
    fn store_lookup_is_absent_until_inserted_and_last_write_wins() {
        let mut store: TextureStore<u32> = TextureStore::new();
        assert!(store.lookup("/a.jpg").is_none());
        store.insert(
            "/a.jpg",
            StoredImage {
                handle: 1,
                width: 10,
                height: 5,
            },
        );
        assert_eq!(store.lookup("/a.jpg").map(|image| image.handle), Some(1));
        store.insert(
            "/a.jpg",
            StoredImage {
                handle: 2,
                width: 10,
                height: 5,
            },
        );
        assert_eq!(store.lookup("/a.jpg").map(|image| image.handle), Some(2));
        assert_eq!(store.len(), 1);
        assert!((store.lookup("/a.jpg").unwrap().aspect() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn page_source_reads_root_relative_paths_from_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("img");
        fs::create_dir_all(&images).unwrap();
        let mut pixels = RgbaImage::new(3, 6);
        pixels.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        pixels
            .save_with_format(images.join("a.png"), ImageFormat::Png)
            .unwrap();

        let source = PageImageSource::new(dir.path()).expect("http client");
        let decoded = source.fetch("/img/a.png").expect("decode png");
        assert_eq!((decoded.width(), decoded.height()), (3, 6));
        let decoded = source.fetch("img/a.png").expect("relative path");
        assert_eq!(decoded.pixels().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));

        let err = source.fetch("/img/nope.png").unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = DecodedImage::decode("/junk.png", b"not an image").unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }
}
