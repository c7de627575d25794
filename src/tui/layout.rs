use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::config::ColorConfig;
use crate::domain::Post;
use crate::tui::app::{Focus, TuiApp};

pub fn render(frame: &mut Frame, app: &TuiApp, colors: &ColorConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search input
            Constraint::Min(5),    // Results
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_input(frame, app, chunks[0], colors);
    render_results(frame, app, chunks[1], colors);
    render_status_bar(frame, app, chunks[2], colors);
}

fn border_style(active: bool, colors: &ColorConfig) -> Style {
    if active {
        Style::default().fg(colors.active_border)
    } else {
        Style::default().fg(colors.inactive_border)
    }
}

fn render_input(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let is_active = app.focus == Focus::Input;

    let block = Block::default()
        .title(" Tags ")
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));

    let paragraph = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(colors.input_text))
        .block(block);

    frame.render_widget(paragraph, area);

    if is_active {
        let width = app.input.chars().count() as u16;
        let x = (area.x + 1 + width).min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_results(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let is_active = app.focus == Focus::Results;

    // Pane height drives the auto-scroll step, so record it before drawing.
    let inner_height = area.height.saturating_sub(2);
    app.viewport
        .set_extents(app.content_height(), f64::from(inner_height));

    let mut title = format!(" Posts ({}) ", app.posts.len());
    if app.auto_scroll {
        title.push_str("[auto] ");
    }
    if let Some(loaded) = app.last_loaded_at {
        title.push_str(&format!("loaded {} ", loaded.format("%H:%M:%S")));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));

    let text = if app.posts.is_empty() {
        Text::from(if app.is_loading {
            "Loading..."
        } else {
            "No posts. Press / and enter tags to search."
        })
    } else {
        let width = area.width.saturating_sub(2) as usize;
        Text::from(
            app.posts
                .iter()
                .flat_map(|post| post_card(post, width, colors))
                .collect::<Vec<_>>(),
        )
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .scroll((app.viewport.offset(), 0));

    frame.render_widget(paragraph, area);
}

/// Exactly `CARD_HEIGHT` lines per post; the results pane scrolls by line.
fn post_card(post: &Post, width: usize, colors: &ColorConfig) -> [Line<'static>; 5] {
    let preview = if post.preview_url.is_empty() {
        "-".to_string()
    } else {
        post.preview_url.clone()
    };
    let tags = post.field_str("tags").unwrap_or_default().trim().to_string();

    [
        Line::from(vec![
            Span::styled(
                format!("#{}", post.display_id()),
                Style::default()
                    .fg(colors.post_id)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("score {}", post.score),
                Style::default().fg(colors.post_score),
            ),
        ]),
        Line::from(Span::styled(
            post.file_url.clone(),
            Style::default().fg(colors.post_link),
        )),
        Line::from(Span::styled(
            format!("preview: {}", preview),
            Style::default().fg(colors.post_preview),
        )),
        Line::from(truncate(&tags, width)),
        Line::from("─".repeat(width)),
    ]
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let status = if let Some(ref msg) = app.status_message {
        msg.clone()
    } else if app.focus == Focus::Input {
        "Enter:Search  Esc:Results  Ctrl+u:Clear  Ctrl+c:Quit".to_string()
    } else {
        "/:Search  j/k:Scroll  n/p:Page  a:Auto-scroll  o:Open  R:Refresh  q:Quit".to_string()
    };

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(colors.status_fg).bg(colors.status_bg));

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchSink;
    use crate::tui::app::CARD_HEIGHT;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::{json, Map};

    fn post(id: i64, tags: &str) -> Post {
        let mut fields = Map::new();
        fields.insert("id".into(), json!(id));
        fields.insert("tags".into(), json!(tags));
        Post {
            file_url: format!("http://img.example/{}.jpg", id),
            preview_url: String::new(),
            score: id * 10,
            fields,
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_card_height_matches_lines() {
        let card = post_card(&post(1, "a b"), 40, &ColorConfig::default());
        assert_eq!(card.len(), usize::from(CARD_HEIGHT));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
    }

    #[test]
    fn test_render_posts_and_extents() {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let mut app = TuiApp::new();
        app.render_posts(&[post(7, "fox solo"), post(8, "cat")]);
        app.set_status("Loaded 2 posts.");

        terminal
            .draw(|frame| render(frame, &app, &ColorConfig::default()))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Posts (2)"));
        assert!(text.contains("#7"));
        assert!(text.contains("score 70"));
        assert!(text.contains("http://img.example/8.jpg"));
        assert!(text.contains("Loaded 2 posts."));

        // 20 rows minus input (3), status (1) and borders (2)
        let geometry = crate::scroll::Viewport::geometry(&app.viewport);
        assert_eq!(geometry.viewport_extent, 14.0);
        assert_eq!(geometry.content_extent, 10.0);
    }
}
