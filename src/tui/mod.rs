pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppContext, Result};
use crate::search::{SearchController, SearchSink};

use self::app::{Focus, InputAction, TuiApp};
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// UI tick, also the step rate of smooth scrolling.
const TICK_RATE: Duration = Duration::from_millis(40);

pub async fn run(ctx: Arc<AppContext>, initial_tags: Option<String>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, initial_tags).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Tui,
    ctx: Arc<AppContext>,
    initial_tags: Option<String>,
) -> Result<()> {
    let config = ctx.config.clone();
    let mut tui_app = TuiApp::new();
    let mut controller = ctx.search_controller(Arc::new(tui_app.viewport.clone()));
    let event_handler = EventHandler::new(TICK_RATE);

    if let Some(tags) = initial_tags {
        tui_app.input = tags.clone();
        run_search(terminal, &mut tui_app, &mut controller, &ctx, &tags).await?;
    }

    loop {
        terminal.draw(|frame| layout::render(frame, &tui_app, &config.colors))?;

        match event_handler.next()? {
            AppEvent::Key(key) => {
                if tui_app.focus == Focus::Input {
                    match tui_app.handle_input_key(key) {
                        InputAction::Submit(input) => {
                            run_search(terminal, &mut tui_app, &mut controller, &ctx, &input)
                                .await?;
                        }
                        InputAction::Quit => tui_app.should_quit = true,
                        InputAction::None => {}
                    }
                } else {
                    handle_action(
                        terminal,
                        &mut tui_app,
                        &mut controller,
                        &ctx,
                        config.keybindings.get_action(&key),
                    )
                    .await?;
                }
            }
            AppEvent::Tick => {
                tui_app.viewport.animate();
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    controller.scheduler_mut().stop();
    Ok(())
}

async fn handle_action(
    terminal: &mut Tui,
    tui_app: &mut TuiApp,
    controller: &mut SearchController,
    ctx: &AppContext,
    action: Action,
) -> Result<()> {
    match action {
        Action::Quit => tui_app.should_quit = true,
        Action::FocusSearch => tui_app.focus = Focus::Input,
        Action::ScrollUp => tui_app.scroll_lines(-1.0),
        Action::ScrollDown => tui_app.scroll_lines(1.0),
        Action::PageUp => tui_app.scroll_pages(-1.0),
        Action::PageDown => tui_app.scroll_pages(1.0),
        Action::ToggleAutoScroll => {
            let scheduler = controller.scheduler_mut();
            if scheduler.is_running() {
                scheduler.stop();
                tui_app.set_status("Auto-scroll paused.");
            } else if !tui_app.posts.is_empty() {
                scheduler.start();
                tui_app.set_status(&format!(
                    "Auto-scrolling every {} seconds.",
                    scheduler.config().interval_secs()
                ));
            }
            tui_app.auto_scroll = controller.scheduler().is_running();
        }
        Action::OpenInBrowser => {
            if let Some(post) = tui_app.top_visible_post() {
                let url = post.file_url.clone();
                if let Err(e) = open::that(&url) {
                    tui_app.set_status(&format!("Failed to open browser: {}", e));
                }
            }
        }
        Action::Refresh => {
            if let Some(tags) = tui_app.last_tags.clone() {
                run_search(terminal, tui_app, controller, ctx, &tags).await?;
            }
        }
        Action::None => {}
    }
    Ok(())
}

/// Validate, redraw the loading state, then fetch and render.
async fn run_search(
    terminal: &mut Tui,
    tui_app: &mut TuiApp,
    controller: &mut SearchController,
    ctx: &AppContext,
    input: &str,
) -> Result<()> {
    let Some(tags) = controller.begin(input, tui_app) else {
        return Ok(());
    };

    tui_app.is_loading = true;
    tui_app.auto_scroll = false;
    tui_app.last_tags = Some(tags.to_string());
    terminal.draw(|frame| layout::render(frame, tui_app, &ctx.config.colors))?;

    let outcome = controller.complete(&tags, tui_app).await;
    tracing::debug!("Search for {} finished: {:?}", tags, outcome);

    tui_app.is_loading = false;
    tui_app.auto_scroll = controller.scheduler().is_running();
    Ok(())
}
