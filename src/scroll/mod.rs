//! Cyclic auto-scroll of the results viewport.
//!
//! The scheduler knows nothing about posts. Every tick it reads the viewport
//! geometry, advances by most of a screen, and wraps back to the top once the
//! end has been reached.

pub mod config;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub use config::ScrollConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Snapshot of a scrollable area, in whatever unit the viewport uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGeometry {
    pub offset: f64,
    pub content_extent: f64,
    pub viewport_extent: f64,
}

impl ScrollGeometry {
    pub fn max_offset(&self) -> f64 {
        self.content_extent - self.viewport_extent
    }

    /// Where the next tick should scroll to, or `None` if nothing can scroll.
    pub fn next_target(&self, config: &ScrollConfig) -> Option<f64> {
        let max = self.max_offset();
        if max <= 0.0 {
            return None;
        }

        if self.offset >= max - config.wrap_tolerance {
            Some(0.0)
        } else {
            Some((self.offset + self.viewport_extent * config.step_ratio).min(max))
        }
    }
}

/// A scrollable area the scheduler can drive.
pub trait Viewport: Send + Sync {
    fn geometry(&self) -> ScrollGeometry;
    fn scroll_to(&self, offset: f64, behavior: ScrollBehavior);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

pub struct ScrollScheduler {
    viewport: Arc<dyn Viewport>,
    config: ScrollConfig,
    timer: Option<JoinHandle<()>>,
}

impl ScrollScheduler {
    pub fn new(viewport: Arc<dyn Viewport>, config: ScrollConfig) -> Self {
        Self {
            viewport,
            config,
            timer: None,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        if self.timer.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Start ticking, replacing any timer that is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.stop();

        let period = self.config.interval();
        let first_tick = Instant::now() + period;
        let viewport = self.viewport.clone();
        let config = self.config.clone();

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick(viewport.as_ref(), &config);
            }
        }));

        tracing::debug!("Auto-scroll started ({}ms)", period.as_millis());
    }

    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::debug!("Auto-scroll stopped");
        }
    }
}

impl Drop for ScrollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run one scroll step against the viewport. Returns the target, if any.
pub fn tick(viewport: &dyn Viewport, config: &ScrollConfig) -> Option<f64> {
    let target = viewport.geometry().next_target(config)?;
    viewport.scroll_to(target, ScrollBehavior::Smooth);
    Some(target)
}
