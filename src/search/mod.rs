//! The search lifecycle: validate tags, fetch, render, start auto-scroll.
//!
//! A [`SearchSink`] is whatever shows results to the user. The controller only
//! ever talks to it through status text, a clear, and a full render, so a
//! search either renders every normalized post or nothing.

use crate::app::{Result, TagscrollError};
use crate::domain::{Post, Tags};
use crate::fetcher::FetchOrchestrator;
use crate::scroll::ScrollScheduler;

pub const GENERIC_FAILURE: &str =
    "Unable to load posts. The API may be unavailable or blocked. Tried multiple endpoints; try again later.";
pub const NO_POSTS: &str = "No posts found for the selected tags.";

/// Receiver of search output.
pub trait SearchSink {
    fn set_status(&mut self, message: &str);
    fn clear_results(&mut self);
    fn render_posts(&mut self, posts: &[Post]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Loading,
}

/// How a submitted search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank input, no request was made.
    Rejected,
    Success(usize),
    Empty,
    Failed(String),
}

pub struct SearchController {
    orchestrator: FetchOrchestrator,
    scheduler: ScrollScheduler,
    phase: SearchPhase,
}

impl SearchController {
    pub fn new(orchestrator: FetchOrchestrator, scheduler: ScrollScheduler) -> Self {
        Self {
            orchestrator,
            scheduler,
            phase: SearchPhase::Idle,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn scheduler(&self) -> &ScrollScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ScrollScheduler {
        &mut self.scheduler
    }

    /// Run a whole search for raw user input.
    pub async fn submit(&mut self, input: &str, sink: &mut dyn SearchSink) -> SearchOutcome {
        match self.begin(input, sink) {
            Some(tags) => self.complete(&tags, sink).await,
            None => SearchOutcome::Rejected,
        }
    }

    /// First half of a search: validation and reset. Returns the tags to fetch,
    /// or `None` if the input was blank.
    ///
    /// Split from [`complete`](Self::complete) so a UI can redraw the loading
    /// state before the request goes out.
    pub fn begin(&mut self, input: &str, sink: &mut dyn SearchSink) -> Option<Tags> {
        let tags = match Tags::parse(input) {
            Ok(tags) => tags,
            Err(e) => {
                sink.set_status(&e.to_string());
                return None;
            }
        };

        self.scheduler.stop();
        sink.clear_results();
        sink.set_status(&format!("Loading posts for tags: {}", tags));
        self.phase = SearchPhase::Loading;

        Some(tags)
    }

    pub async fn complete(&mut self, tags: &Tags, sink: &mut dyn SearchSink) -> SearchOutcome {
        let result = self.orchestrator.fetch_posts(tags).await;
        self.phase = SearchPhase::Idle;
        self.finish(result, sink)
    }

    fn finish(&mut self, result: Result<Vec<Post>>, sink: &mut dyn SearchSink) -> SearchOutcome {
        match result {
            Ok(posts) if posts.is_empty() => {
                sink.set_status(NO_POSTS);
                SearchOutcome::Empty
            }
            Ok(posts) => {
                sink.render_posts(&posts);
                sink.set_status(&format!(
                    "Loaded {} posts. Auto-scrolling every {} seconds.",
                    posts.len(),
                    self.scheduler.config().interval_secs()
                ));
                self.scheduler.start();
                SearchOutcome::Success(posts.len())
            }
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                let message = match e {
                    TagscrollError::ApiRejected(_) => format!("Unable to load posts. {}", e),
                    _ => GENERIC_FAILURE.to_string(),
                };
                sink.set_status(&message);
                SearchOutcome::Failed(message)
            }
        }
    }
}
