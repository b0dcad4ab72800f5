#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;
use pageconfig::{PreviewSettings, ProjectLink};
use renderer::{
    DecodedImage, DisplacementField, FrameBackend, FrameError, FrameUniforms, ImageSource,
    LoadError, PixelSize, Preview, PreviewOptions, Quad,
};

/// Backend that records what the engine asked of it.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub next_image: u32,
    pub quads: usize,
    pub configured: Vec<PixelSize>,
    pub displacement_writes: usize,
    pub last_field_size: Option<usize>,
    pub bound: Option<u32>,
    pub draws: Vec<FrameUniforms>,
}

impl FrameBackend for RecordingBackend {
    type Image = u32;

    fn create_image(&mut self, image: &DecodedImage) -> Result<Self::Image, FrameError> {
        if image.width() > 4096 {
            return Err(FrameError::ImageTooLarge {
                width: image.width(),
                height: image.height(),
                limit: 4096,
            });
        }
        self.next_image += 1;
        Ok(self.next_image)
    }

    fn upload_quad(&mut self, _quad: &Quad) {
        self.quads += 1;
    }

    fn configure(&mut self, size: PixelSize) {
        self.configured.push(size);
    }

    fn write_displacement(&mut self, field: &DisplacementField) {
        self.displacement_writes += 1;
        self.last_field_size = Some(field.size());
    }

    fn bind_image(&mut self, image: Option<&Self::Image>) {
        self.bound = image.copied();
    }

    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), FrameError> {
        self.draws.push(*uniforms);
        Ok(())
    }
}

/// Serves solid images whose size is encoded in the URL, e.g. `/200x100.png`.
/// URLs containing `broken` fail.
pub struct StubSource;

impl ImageSource for StubSource {
    fn fetch(&self, url: &str) -> Result<DecodedImage, LoadError> {
        if url.contains("broken") {
            return Err(LoadError::Empty {
                url: url.to_string(),
            });
        }
        let stem = url
            .trim_start_matches('/')
            .split('.')
            .next()
            .unwrap_or_default();
        let (width, height) = stem
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
            .unwrap_or((4, 4));
        Ok(DecodedImage::new(RgbaImage::new(width, height)))
    }
}

pub fn settings() -> PreviewSettings {
    PreviewSettings::default()
}

pub fn options(width: u32, height: u32) -> PreviewOptions {
    PreviewOptions {
        size: PixelSize::new(width, height),
        seed: Some(42),
        ..PreviewOptions::default()
    }
}

pub fn preview(width: u32, height: u32) -> Preview<RecordingBackend> {
    Preview::new(
        RecordingBackend::default(),
        &settings(),
        &options(width, height),
        Arc::new(StubSource),
    )
}

pub fn link(image: &str, href: Option<&str>) -> ProjectLink {
    ProjectLink {
        image: image.to_string(),
        href: href.map(str::to_string),
    }
}

/// Pumps the loader until nothing is in flight or five seconds pass.
pub fn settle(preview: &mut Preview<RecordingBackend>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while preview.pending_loads() > 0 && Instant::now() < deadline {
        preview.pump_textures();
        thread::sleep(Duration::from_millis(5));
    }
    preview.pump_textures();
}

/// Preloads `urls` and waits for them to land in the store.
pub fn cached_preview(width: u32, height: u32, urls: &[&str]) -> Preview<RecordingBackend> {
    let mut preview = preview(width, height);
    preview.preload(urls.iter().copied());
    settle(&mut preview);
    preview
}
