//! Everything one preview instance owns, wired together.

use std::sync::Arc;
use std::time::Instant;

use pageconfig::PreviewSettings;
use scheduler::FrameScheduler;
use tracing::{debug, info, warn};

use crate::animation::{AnimationLoop, LoopState};
use crate::engine::{FrameBackend, FrameError, RenderEngine};
use crate::field::FieldGenerator;
use crate::textures::{ImageSource, StoredImage, TextureLoader, TextureStore};
use crate::types::{PixelSize, PreviewOptions};

pub struct Preview<B: FrameBackend> {
    engine: RenderEngine<B>,
    animation: AnimationLoop,
    scheduler: FrameScheduler,
    textures: TextureStore<B::Image>,
    loader: TextureLoader,
}

impl<B: FrameBackend> Preview<B> {
    pub fn new(
        backend: B,
        settings: &PreviewSettings,
        options: &PreviewOptions,
        source: Arc<dyn ImageSource>,
    ) -> Self {
        let generator = FieldGenerator::from_seed(options.seed);
        Self {
            engine: RenderEngine::new(backend, settings, options.size, generator),
            animation: AnimationLoop::new(settings.relaxation),
            scheduler: FrameScheduler::new(options.pacing),
            textures: TextureStore::new(),
            loader: TextureLoader::new(source),
        }
    }

    /// Starts background loads for `urls`; duplicates are collapsed.
    pub fn preload<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let started = self.loader.preload(urls);
        info!(started, "preloading preview images");
        started
    }

    /// Uploads every finished load and stores it. Failed loads are logged
    /// and stay absent. Returns how many textures were stored.
    pub fn pump_textures(&mut self) -> usize {
        let mut stored = 0;
        for loaded in self.loader.drain() {
            let decoded = match loaded.result {
                Ok(decoded) => decoded,
                Err(error) => {
                    warn!(url = %loaded.url, %error, "image failed to load");
                    continue;
                }
            };
            match self.engine.backend_mut().create_image(&decoded) {
                Ok(handle) => {
                    debug!(
                        url = %loaded.url,
                        width = decoded.width(),
                        height = decoded.height(),
                        "image texture ready"
                    );
                    self.textures.insert(
                        loaded.url,
                        StoredImage {
                            handle,
                            width: decoded.width(),
                            height: decoded.height(),
                        },
                    );
                    stored += 1;
                }
                Err(error) => {
                    warn!(url = %loaded.url, %error, "image upload failed");
                }
            }
        }
        stored
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.in_flight()
    }

    pub fn lookup(&self, url: &str) -> Option<&StoredImage<B::Image>> {
        self.textures.lookup(url)
    }

    /// Makes the stored image for `url` active. Does nothing and returns
    /// `false` when it has not loaded.
    pub fn show_image(&mut self, url: &str) -> bool {
        let Some(stored) = self.textures.lookup(url) else {
            debug!(%url, "image not loaded yet; keeping current texture");
            return false;
        };
        let handle = stored.handle.clone();
        let aspect = stored.aspect();
        self.engine.set_active_image(handle, aspect);
        true
    }

    pub fn start(&mut self) {
        self.scheduler.reset_pacing();
        self.animation.start(&mut self.scheduler, &mut self.engine);
    }

    pub fn stop(&mut self) {
        self.animation.stop(&mut self.scheduler);
    }

    pub fn resize(&mut self, size: PixelSize) {
        self.engine.on_resize(size);
    }

    /// Runs every task due at `now` and returns how many frames were drawn.
    pub fn frame(&mut self, now: Instant) -> Result<usize, FrameError> {
        let mut drawn = 0;
        for token in self.scheduler.begin_frame(now) {
            if self.animation.tick(token, &mut self.engine)? {
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    pub fn loop_state(&self) -> LoopState {
        self.animation.state()
    }

    pub fn animation(&self) -> &AnimationLoop {
        &self.animation
    }

    pub fn engine(&self) -> &RenderEngine<B> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RenderEngine<B> {
        &mut self.engine
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }
}
