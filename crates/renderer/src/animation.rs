use scheduler::{FrameScheduler, FrameToken};
use tracing::{debug, trace};

use crate::engine::{FrameBackend, FrameError, RenderEngine};

/// Shader time added per tick, independent of wall-clock frame spacing.
pub const TIME_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

/// Drives the per-frame relax/draw cycle through a [`FrameScheduler`].
///
/// The controller holds at most one scheduler token. Ticks carrying any other
/// token, or arriving while stopped, do nothing.
#[derive(Debug)]
pub struct AnimationLoop {
    state: LoopState,
    token: Option<FrameToken>,
    time: f32,
    relaxation: f32,
    ticks: u64,
}

impl AnimationLoop {
    pub fn new(relaxation: f32) -> Self {
        Self {
            state: LoopState::Stopped,
            token: None,
            time: 0.0,
            relaxation,
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn token(&self) -> Option<FrameToken> {
        self.token
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Ticks handled since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// (Re)starts the loop with a fresh field and time zero. A running loop is
    /// stopped first, so repeated starts never leave two tasks scheduled.
    pub fn start<B: FrameBackend>(
        &mut self,
        scheduler: &mut FrameScheduler,
        engine: &mut RenderEngine<B>,
    ) {
        self.stop(scheduler);
        engine.regenerate_field();
        self.time = 0.0;
        engine.set_time(self.time);
        self.state = LoopState::Running;
        let token = scheduler.schedule_repeating();
        self.token = Some(token);
        debug!(?token, "animation started");
    }

    pub fn stop(&mut self, scheduler: &mut FrameScheduler) {
        if let Some(token) = self.token.take() {
            scheduler.cancel(token);
            debug!(?token, "animation stopped");
        }
        self.state = LoopState::Stopped;
    }

    /// Handles one frame boundary. Returns whether a frame was drawn.
    pub fn tick<B: FrameBackend>(
        &mut self,
        token: FrameToken,
        engine: &mut RenderEngine<B>,
    ) -> Result<bool, FrameError> {
        if self.state != LoopState::Running || self.token != Some(token) {
            trace!(?token, "ignoring stale frame token");
            return Ok(false);
        }
        self.time += TIME_STEP;
        self.ticks += 1;
        engine.relax_field(self.relaxation);
        engine.set_time(self.time);
        engine.draw()?;
        Ok(true)
    }
}
