use std::collections::BTreeSet;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("frame rate must be zero or a finite positive rate with a representable interval (got {0})")]
    InvalidFps(f32),
}

/// Identifies one repeating frame task. Holding the token is the only way to
/// cancel the task; a cancelled token is never reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(u64);

/// How display refreshes translate into frame boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePacing {
    /// Every display refresh is a frame boundary.
    #[default]
    EveryRefresh,
    /// At most one frame boundary per interval.
    Capped { interval: Duration },
}

impl FramePacing {
    /// `None` and `0` both mean uncapped.
    pub fn from_fps(fps: Option<f32>) -> Result<Self, SchedulerError> {
        match fps {
            None => Ok(Self::EveryRefresh),
            Some(value) if !value.is_finite() || value < 0.0 => {
                Err(SchedulerError::InvalidFps(value))
            }
            Some(value) if value == 0.0 => Ok(Self::EveryRefresh),
            Some(value) => Duration::try_from_secs_f32(1.0 / value)
                .map(|interval| Self::Capped { interval })
                .map_err(|_| SchedulerError::InvalidFps(value)),
        }
    }
}

/// Cooperative, single-threaded frame scheduler.
///
/// Owners register a repeating task and receive a [`FrameToken`]. The host
/// calls [`FrameScheduler::begin_frame`] once per display refresh and hands
/// every returned token to its owner. Nothing runs on its own; the scheduler
/// only decides which tasks are due.
#[derive(Debug)]
pub struct FrameScheduler {
    pacing: FramePacing,
    tasks: BTreeSet<FrameToken>,
    next_id: u64,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(pacing: FramePacing) -> Self {
        Self {
            pacing,
            tasks: BTreeSet::new(),
            next_id: 0,
            last_frame: None,
        }
    }

    pub fn pacing(&self) -> FramePacing {
        self.pacing
    }

    /// Registers a task that fires on every frame boundary until cancelled.
    pub fn schedule_repeating(&mut self) -> FrameToken {
        let token = FrameToken(self.next_id);
        self.next_id += 1;
        self.tasks.insert(token);
        token
    }

    /// Cancels a task. Returns `false` if it was not scheduled.
    pub fn cancel(&mut self, token: FrameToken) -> bool {
        self.tasks.remove(&token)
    }

    pub fn is_scheduled(&self, token: FrameToken) -> bool {
        self.tasks.contains(&token)
    }

    /// Number of tasks waiting for the next frame boundary.
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the host should keep requesting redraws.
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Whether a frame boundary may be issued at `now` under the pacing rule.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        if self.tasks.is_empty() {
            return false;
        }
        match (self.pacing, self.last_frame) {
            (FramePacing::EveryRefresh, _) | (_, None) => true,
            (FramePacing::Capped { interval }, Some(last)) => {
                now.saturating_duration_since(last) >= interval
            }
        }
    }

    /// Earliest instant at which the next frame boundary may be issued, when
    /// pacing is capped and a task is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.tasks.is_empty() {
            return None;
        }
        match (self.pacing, self.last_frame) {
            (FramePacing::Capped { interval }, Some(last)) => Some(last + interval),
            _ => None,
        }
    }

    /// Marks a frame boundary at `now` and returns the tokens due for it.
    /// Returns nothing when the pacing rule says it is too early.
    pub fn begin_frame(&mut self, now: Instant) -> Vec<FrameToken> {
        if !self.ready_for_frame(now) {
            return Vec::new();
        }
        self.last_frame = Some(now);
        self.tasks.iter().copied().collect()
    }

    /// Forgets the last frame time so the next refresh is immediately due.
    pub fn reset_pacing(&mut self) {
        self.last_frame = None;
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(FramePacing::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_task_fires_every_refresh_until_cancelled() {
        let mut scheduler = FrameScheduler::default();
        let token = scheduler.schedule_repeating();
        let now = Instant::now();
        assert_eq!(scheduler.begin_frame(now), vec![token]);
        assert_eq!(scheduler.begin_frame(now), vec![token]);
        assert!(scheduler.cancel(token));
        assert!(scheduler.begin_frame(now).is_empty());
        assert!(!scheduler.cancel(token), "double cancel reports false");
    }

    #[test]
    fn tokens_are_never_reused() {
        let mut scheduler = FrameScheduler::default();
        let first = scheduler.schedule_repeating();
        scheduler.cancel(first);
        let second = scheduler.schedule_repeating();
        assert_ne!(first, second);
        assert!(!scheduler.is_scheduled(first));
        assert!(scheduler.is_scheduled(second));
        assert_eq!(scheduler.outstanding(), 1);
    }

    #[test]
    fn capped_pacing_skips_early_refreshes() {
        let pacing = FramePacing::from_fps(Some(4.0)).unwrap();
        let mut scheduler = FrameScheduler::new(pacing);
        let token = scheduler.schedule_repeating();
        let start = Instant::now();
        assert_eq!(scheduler.begin_frame(start), vec![token]);
        assert!(scheduler
            .begin_frame(start + Duration::from_millis(125))
            .is_empty());
        assert_eq!(
            scheduler.next_deadline(),
            Some(start + Duration::from_millis(250))
        );
        assert_eq!(
            scheduler.begin_frame(start + Duration::from_millis(250)),
            vec![token]
        );
    }

    #[test]
    fn zero_fps_treated_as_uncapped() {
        assert_eq!(
            FramePacing::from_fps(Some(0.0)).unwrap(),
            FramePacing::EveryRefresh
        );
        assert!(FramePacing::from_fps(Some(-5.0)).is_err());
        assert!(FramePacing::from_fps(Some(f32::NAN)).is_err());
        assert!(FramePacing::from_fps(Some(1e-30)).is_err());
        assert!(FramePacing::from_fps(Some(f32::MIN_POSITIVE)).is_err());
    }

    #[test]
    fn idle_scheduler_requests_nothing() {
        let scheduler = FrameScheduler::default();
        assert!(!scheduler.has_pending());
        assert!(!scheduler.ready_for_frame(Instant::now()));
        assert_eq!(scheduler.next_deadline(), None);
    }
}
