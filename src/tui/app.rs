use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::domain::Post;
use crate::scroll::{ScrollBehavior, ScrollGeometry, Viewport};
use crate::search::SearchSink;

/// Lines taken by one post in the results pane, separator included.
pub const CARD_HEIGHT: u16 = 5;

/// Fraction of the remaining distance covered per UI tick while animating.
const SMOOTH_FACTOR: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Results,
}

/// Result of a key press while the search field has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Submit(String),
    Quit,
    None,
}

#[derive(Debug, Default)]
struct ScrollState {
    offset: f64,
    target: f64,
    content: f64,
    viewport: f64,
}

impl ScrollState {
    fn max_offset(&self) -> f64 {
        (self.content - self.viewport).max(0.0)
    }

    fn clamp(&self, offset: f64) -> f64 {
        offset.clamp(0.0, self.max_offset())
    }
}

/// Scroll position of the results pane, in lines.
///
/// Shared between the draw loop and the auto-scroll task. Smooth scrolls only
/// set a target; [`animate`](Self::animate) moves towards it once per UI tick.
#[derive(Debug, Clone, Default)]
pub struct ResultsViewport {
    state: Arc<Mutex<ScrollState>>,
}

impl ResultsViewport {
    fn lock(&self) -> MutexGuard<'_, ScrollState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the current content and visible heights, clamping the position.
    pub fn set_extents(&self, content: f64, viewport: f64) {
        let mut state = self.lock();
        state.content = content;
        state.viewport = viewport;
        state.offset = state.clamp(state.offset);
        state.target = state.clamp(state.target);
    }

    /// The row to render from.
    pub fn offset(&self) -> u16 {
        self.lock().offset.round().max(0.0) as u16
    }

    pub fn viewport_extent(&self) -> f64 {
        self.lock().viewport
    }

    pub fn scroll_by(&self, delta: f64) {
        let mut state = self.lock();
        let offset = state.clamp(state.target + delta);
        state.offset = offset;
        state.target = offset;
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.offset = 0.0;
        state.target = 0.0;
    }

    /// Step a smooth scroll. Returns true while still moving.
    pub fn animate(&self) -> bool {
        let mut state = self.lock();
        let remaining = state.target - state.offset;
        if remaining.abs() < 0.5 {
            state.offset = state.target;
            return false;
        }
        state.offset += remaining * SMOOTH_FACTOR;
        true
    }
}

impl Viewport for ResultsViewport {
    fn geometry(&self) -> ScrollGeometry {
        let state = self.lock();
        ScrollGeometry {
            offset: state.offset,
            content_extent: state.content,
            viewport_extent: state.viewport,
        }
    }

    fn scroll_to(&self, offset: f64, behavior: ScrollBehavior) {
        let mut state = self.lock();
        let offset = state.clamp(offset);
        state.target = offset;
        if behavior == ScrollBehavior::Instant {
            state.offset = offset;
        }
    }
}

pub struct TuiApp {
    pub focus: Focus,
    pub input: String,
    pub posts: Vec<Post>,
    pub status_message: Option<String>,
    pub is_loading: bool,
    pub auto_scroll: bool,
    pub last_loaded_at: Option<DateTime<Local>>,
    pub last_tags: Option<String>,
    pub viewport: ResultsViewport,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new() -> Self {
        Self {
            focus: Focus::Input,
            input: String::new(),
            posts: Vec::new(),
            status_message: None,
            is_loading: false,
            auto_scroll: false,
            last_loaded_at: None,
            last_tags: None,
            viewport: ResultsViewport::default(),
            should_quit: false,
        }
    }

    /// Text editing for the search field.
    pub fn handle_input_key(&mut self, key: KeyEvent) -> InputAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return InputAction::Submit(self.input.clone()),
            KeyCode::Char('c') if ctrl => return InputAction::Quit,
            KeyCode::Char('u') if ctrl => self.input.clear(),
            KeyCode::Esc => self.focus = Focus::Results,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !ctrl => self.input.push(c),
            _ => {}
        }
        InputAction::None
    }

    pub fn content_height(&self) -> f64 {
        f64::from(CARD_HEIGHT) * self.posts.len() as f64
    }

    /// The first post whose card is at least partly visible.
    pub fn top_visible_post(&self) -> Option<&Post> {
        let index = usize::from(self.viewport.offset() / CARD_HEIGHT);
        self.posts.get(index)
    }

    pub fn scroll_lines(&self, lines: f64) {
        self.viewport.scroll_by(lines);
    }

    pub fn scroll_pages(&self, pages: f64) {
        let page = (self.viewport.viewport_extent() - 1.0).max(1.0);
        self.viewport.scroll_by(page * pages);
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSink for TuiApp {
    fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    fn clear_results(&mut self) {
        self.posts.clear();
        self.viewport.reset();
        self.viewport.set_extents(0.0, self.viewport.viewport_extent());
    }

    fn render_posts(&mut self, posts: &[Post]) {
        self.posts = posts.to_vec();
        self.last_loaded_at = Some(Local::now());
        self.viewport.reset();
        self.viewport
            .set_extents(self.content_height(), self.viewport.viewport_extent());
        self.focus = Focus::Results;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn post(id: i64) -> Post {
        Post {
            file_url: format!("http://x/{}.jpg", id),
            preview_url: String::new(),
            score: 0,
            fields: Map::from_iter([("id".to_string(), id.into())]),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_input_editing() {
        let mut app = TuiApp::new();
        for c in "cat x".chars() {
            assert_eq!(app.handle_input_key(key(KeyCode::Char(c))), InputAction::None);
        }
        app.handle_input_key(key(KeyCode::Backspace));
        assert_eq!(app.input, "cat ");

        assert_eq!(
            app.handle_input_key(key(KeyCode::Enter)),
            InputAction::Submit("cat ".to_string())
        );
        assert_eq!(
            app.handle_input_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            InputAction::Quit
        );

        app.handle_input_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(app.input.is_empty());

        app.handle_input_key(key(KeyCode::Esc));
        assert_eq!(app.focus, Focus::Results);
    }

    #[test]
    fn test_viewport_clamps_and_animates() {
        let viewport = ResultsViewport::default();
        viewport.set_extents(100.0, 20.0);

        viewport.scroll_to(500.0, ScrollBehavior::Instant);
        assert_eq!(viewport.geometry().offset, 80.0);

        viewport.scroll_to(0.0, ScrollBehavior::Smooth);
        assert_eq!(viewport.geometry().offset, 80.0);

        let mut ticks = 0;
        while viewport.animate() {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!(ticks > 1);
        assert_eq!(viewport.offset(), 0);
    }

    #[test]
    fn test_scheduler_cycle_over_viewport() {
        let viewport = ResultsViewport::default();
        viewport.set_extents(100.0, 20.0);
        let config = crate::scroll::ScrollConfig::default();

        let mut offsets = Vec::new();
        for _ in 0..6 {
            crate::scroll::tick(&viewport, &config);
            while viewport.animate() {}
            offsets.push(viewport.offset());
        }
        assert_eq!(offsets, vec![18, 36, 54, 72, 80, 0]);
    }

    #[test]
    fn test_render_and_clear() {
        let mut app = TuiApp::new();
        app.viewport.set_extents(0.0, 10.0);

        app.render_posts(&[post(1), post(2), post(3)]);
        assert_eq!(app.posts.len(), 3);
        assert_eq!(app.focus, Focus::Results);
        assert!(app.last_loaded_at.is_some());
        assert_eq!(app.viewport.geometry().content_extent, 15.0);

        app.scroll_lines(6.0);
        assert_eq!(app.top_visible_post().and_then(Post::id).as_deref(), Some("2"));

        app.clear_results();
        assert!(app.posts.is_empty());
        assert_eq!(app.viewport.offset(), 0);
        assert!(app.top_visible_post().is_none());
    }
}
