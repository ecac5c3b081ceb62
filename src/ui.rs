use ratatui::{prelude::*, widgets::*};

use crate::app::ratings::RatingState;
use crate::app::state::NoticeKind;
use crate::messages::ui_events::InputMode;
use crate::messages::RenderState;

/// Renders a text input field; yellow while editing, cyan when focused
pub fn render_input<'a>(
    content: &'a str,
    title: &'a str,
    is_focused: bool,
    is_editing: bool,
) -> Paragraph<'a> {
    let style = if is_focused && is_editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);

    Paragraph::new(content).block(block)
}

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Five-star widget text, rounded down to the nearest half star
pub fn star_line(rating: f64) -> String {
    let halves = (rating.clamp(0.0, 5.0) * 2.0).floor() as usize;
    let full = halves / 2;
    let half = halves % 2;
    let empty = 5 - full - half;
    format!("{}{}{}", "★".repeat(full), "⯪".repeat(half), "☆".repeat(empty))
}

/// Rating color
pub fn rating_color(rating: f64) -> Color {
    match rating {
        r if r >= 4.0 => Color::Green,
        r if r >= 3.0 => Color::Yellow,
        r if r > 0.0 => Color::Red,
        _ => Color::DarkGray,
    }
}

/// Short tag describing where a submitted rating stands
pub fn rating_state_label(state: Option<RatingState>) -> Option<(String, Color)> {
    match state? {
        RatingState::Pending { rating, .. } => Some((format!("saving {}★…", rating), Color::Yellow)),
        RatingState::Confirmed { rating, .. } => Some((format!("you rated {}★", rating), Color::Green)),
        RatingState::Failed { rating } => Some((format!("{}★ not saved", rating), Color::Red)),
    }
}

pub fn notice_color(kind: NoticeKind) -> Color {
    match kind {
        NoticeKind::Info => Color::Green,
        NoticeKind::Error => Color::Red,
    }
}

/// Bottom bar: the latest status message followed by the key hints
pub fn status_text(state: &RenderState) -> String {
    if state.is_loading {
        return String::from(" Loading... ");
    }
    let hints = if !state.screen.is_authenticated() {
        ""
    } else if state.input_mode == InputMode::Editing {
        "ESC:stop editing | arrows:move | Enter:submit"
    } else {
        "Tab:panel | /:search | f:filters | r:refresh | 1-5:rate | L:logout | ?:help | q:quit"
    };
    match &state.status {
        Some(status) if hints.is_empty() => format!(" {} ", status),
        Some(status) => format!(" {} | {} ", status, hints),
        None => format!(" {} ", hints),
    }
}

/// Password field display
pub fn masked(text: &str) -> String {
    "*".repeat(text.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_line_halves() {
        assert_eq!(star_line(0.0), "☆☆☆☆☆");
        assert_eq!(star_line(4.5), "★★★★⯪");
        assert_eq!(star_line(3.7), "★★★⯪☆");
        assert_eq!(star_line(9.0), "★★★★★");
    }

    #[test]
    fn test_rating_state_label() {
        assert!(rating_state_label(None).is_none());
        let (label, color) = rating_state_label(Some(RatingState::Failed { rating: 2 })).unwrap();
        assert!(label.contains("not saved"));
        assert_eq!(color, Color::Red);
    }

    #[test]
    fn test_status_keeps_key_hints() {
        use crate::messages::ui_events::Screen;

        let mut state = RenderState {
            screen: Screen::Main,
            status: Some("12 wineries".into()),
            ..Default::default()
        };
        let text = status_text(&state);
        assert!(text.starts_with(" 12 wineries | "));
        assert!(text.contains("?:help"));

        state.input_mode = InputMode::Editing;
        assert!(status_text(&state).contains("ESC:stop editing"));

        state.is_loading = true;
        assert_eq!(status_text(&state), " Loading... ");
    }

    #[test]
    fn test_masked_counts_chars() {
        assert_eq!(masked("סוד"), "***");
    }
}
