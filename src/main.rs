//! Kerem TUI - Actor-based winery explorer
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution

use std::io;
use std::time::Duration;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::canvas::{Canvas, Map, MapResolution},
    widgets::*,
};
use tokio::sync::mpsc;

use kerem::app::forms::{AuthField, AuthForm, WineryField};
use kerem::constants::{APP_NAME, LOG_FILE, SETTINGS_FILE};
use kerem::messages::render::WineryRow;
use kerem::messages::ui_events::{key_to_ui_event, InputMode, Panel, Screen};
use kerem::models::Region;
use kerem::ui::{
    masked, notice_color, rating_color, rating_state_label, render_input, render_tabs, star_line,
    status_text,
};
use kerem::{
    ApiClient, AppActor, AppState, NetworkActor, NetworkCommand, NetworkResponse, RenderState,
    Settings, Storage, UiEvent,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let storage = Storage::new();
    let settings = load_settings(&storage).with_env_override();
    let client = ApiClient::new(&settings);
    tracing::info!(api = %client.base_url(), "Starting {}", APP_NAME);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _terminal_guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn app actor (restores the stored session)
    let state = AppState::new(storage, client.base_url());
    let app_actor = AppActor::new(state, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Spawn network actor
    let network_actor = NetworkActor::new(client, net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    tracing::info!("Shut down");
    Ok(())
}

/// Read `config.yaml`, writing the defaults out on first run
fn load_settings(storage: &Storage) -> Settings {
    let first_run = !storage.config_dir().join(SETTINGS_FILE).exists();
    match storage.load_settings() {
        Ok(settings) => {
            if first_run {
                if let Err(e) = storage.save_settings(&settings) {
                    tracing::warn!(error = %format!("{:#}", e), "Could not write default settings");
                }
            }
            settings
        }
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Falling back to default settings");
            Settings::default()
        }
    }
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(key, current_state.key_context()) {
                    if matches!(event, UiEvent::Quit) {
                        let _ = ui_tx.send(event);
                        break;
                    }
                    let _ = ui_tx.send(event);
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_header(f, state, main_chunks[0]);

    match state.screen {
        Screen::Login | Screen::Register => draw_auth_page(f, state, main_chunks[1]),
        Screen::Main => draw_main_view(f, state, main_chunks[1]),
    }

    draw_status_bar(f, state, main_chunks[2]);

    // Popups
    if state.show_help {
        draw_help_popup(f, area);
    }

    if state.notice.is_some() {
        draw_notice_popup(f, state, area);
    }
}

fn draw_header(f: &mut Frame, state: &RenderState, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", APP_NAME),
        Style::default().fg(Color::Black).bg(Color::Magenta).bold(),
    )];

    if let Some(username) = &state.username {
        spans.push(Span::raw(format!("  {}", username)));
        if state.is_admin {
            spans.push(Span::styled(" [admin]", Style::default().fg(Color::Yellow).bold()));
        }
        if let Some(expires) = state.session_expires_at {
            spans.push(Span::styled(
                format!("  session until {}", expires.with_timezone(&chrono::Local).format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    spans.push(Span::styled(
        format!("  {}", state.api_base_url),
        Style::default().fg(Color::DarkGray),
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Column for the terminal cursor inside `text` at byte offset `cursor`
fn cursor_column(text: &str, cursor: usize) -> u16 {
    text.get(..cursor).map(|s| s.chars().count()).unwrap_or(0) as u16
}

fn place_cursor(f: &mut Frame, area: Rect, row: u16, column: u16) {
    let max_x = area.x + area.width.saturating_sub(2);
    let cursor_x = (area.x + column + 1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, area.y + 1 + row));
}

// ----------------------------------------------------------------------------
// Login / register
// ----------------------------------------------------------------------------

fn draw_auth_page(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup = centered_rect(50, 60, area);
    let is_register = state.screen == Screen::Register;
    let form: &AuthForm = if is_register {
        &state.register_form
    } else {
        &state.login_form
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tabs
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(if is_register { 1 } else { 0 }),
            Constraint::Min(0),    // Hints
        ])
        .split(popup);

    let tabs = render_tabs(&["Login", "Register"], usize::from(is_register));
    f.render_widget(tabs, chunks[0]);

    let username = render_input(
        &form.username,
        " Username ",
        form.field == AuthField::Username,
        true,
    );
    f.render_widget(username, chunks[1]);

    let password_text = masked(&form.password);
    let password = render_input(
        &password_text,
        " Password ",
        form.field == AuthField::Password,
        true,
    );
    f.render_widget(password, chunks[2]);

    if is_register {
        let focused = form.field == AuthField::AdminFlag;
        let checkbox = format!(" [{}] Register as admin", if form.is_admin { "x" } else { " " });
        let style = if focused {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        };
        f.render_widget(Paragraph::new(checkbox).style(style), chunks[3]);
    }

    let action = if is_register { "register" } else { "log in" };
    let other = if is_register { "login" } else { "register" };
    let hints = Paragraph::new(vec![
        Line::from(""),
        Line::from(format!(" Tab: next field | Enter: {} ", action)),
        Line::from(format!(" F2 / Ctrl+R: switch to {} | Ctrl+C: quit ", other)),
    ])
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hints, chunks[4]);

    match form.field {
        AuthField::Username => {
            place_cursor(f, chunks[1], 0, cursor_column(&form.username, state.cursor_position))
        }
        AuthField::Password => {
            place_cursor(f, chunks[2], 0, cursor_column(&form.password, state.cursor_position))
        }
        AuthField::AdminFlag => {}
    }
}

// ----------------------------------------------------------------------------
// Main view
// ----------------------------------------------------------------------------

fn draw_main_view(f: &mut Frame, state: &RenderState, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let filters_height = if state.filters.expanded {
        Region::ALL.len() as u16 + 3
    } else {
        3
    };
    let form_height = if state.winery_form.open { 6 } else { 0 };

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // Search
            Constraint::Length(filters_height), // Filters
            Constraint::Length(form_height),    // Add winery
            Constraint::Min(3),                 // List
        ])
        .split(columns[0]);

    draw_search_bar(f, state, left[0]);
    draw_filters(f, state, left[1]);
    if state.winery_form.open {
        draw_winery_form(f, state, left[2]);
    }
    draw_winery_list(f, state, left[3]);

    let detail_height = if state.selected.is_some() { 10 } else { 0 };
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(detail_height)])
        .split(columns[1]);

    draw_map(f, state, right[0]);
    if let Some(row) = &state.selected {
        draw_detail(f, state, row, right[1]);
    }
}

fn border_style(state: &RenderState, panel: Panel) -> Style {
    let focused = state.active_panel == panel;
    if focused && state.input_mode == InputMode::Editing {
        Style::default().fg(Color::Yellow)
    } else if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_search_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.active_panel == Panel::Search;
    let editing = state.input_mode == InputMode::Editing
        && matches!(state.active_panel, Panel::Search | Panel::Filters);
    let input = render_input(&state.filters.name, " Search by name (/) ", focused, editing);
    f.render_widget(input, area);

    if editing {
        place_cursor(f, area, 0, cursor_column(&state.filters.name, state.cursor_position));
    }
}

fn draw_filters(f: &mut Frame, state: &RenderState, area: Rect) {
    let filters = &state.filters;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state, Panel::Filters))
        .title(if filters.expanded {
            " Filters (f:collapse c:clear s:search) "
        } else {
            " Filters (f:expand) "
        });

    let rating_line = Line::from(vec![
        Span::raw(" Min rating "),
        Span::styled(star_line(filters.min_rating), Style::default().fg(rating_color(filters.min_rating))),
        Span::raw(format!(" {:.1}", filters.min_rating)),
    ]);

    if !filters.expanded {
        let summary = if filters.regions.is_empty() {
            String::from("  all regions")
        } else {
            format!("  {} region(s)", filters.regions.len())
        };
        let mut line = rating_line;
        line.push_span(Span::styled(summary, Style::default().fg(Color::DarkGray)));
        f.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    let focused = state.active_panel == Panel::Filters;
    let mut lines = vec![rating_line];
    for (i, region) in Region::ALL.iter().enumerate() {
        let mark = if filters.is_selected(*region) { "[x]" } else { "[ ]" };
        let style = if focused && i == filters.region_cursor {
            Style::default().fg(Color::Yellow).bold()
        } else if filters.is_selected(*region) {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!(" {} {}", mark, region.as_str()), style)));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_winery_form(f: &mut Frame, state: &RenderState, area: Rect) {
    let form = &state.winery_form;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state, Panel::AddWinery))
        .title(" Add Winery (Tab:field Enter:save a:cancel) ");

    let fields = [
        WineryField::Name,
        WineryField::Description,
        WineryField::Latitude,
        WineryField::Longitude,
    ];
    let focused = state.active_panel == Panel::AddWinery;
    let lines: Vec<Line> = fields
        .iter()
        .map(|field| {
            let style = if focused && *field == form.field {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{:>12}: ", field.label()), style.bold()),
                Span::styled(form.get(*field).clone(), style),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);

    if focused && state.input_mode == InputMode::Editing {
        let row = fields.iter().position(|field| *field == form.field).unwrap_or(0) as u16;
        let column = 14 + cursor_column(form.get(form.field), state.cursor_position);
        place_cursor(f, area, row, column);
    }
}

fn winery_line(row: &WineryRow) -> Line<'static> {
    let rating = row.displayed_rating;
    let mut spans = vec![
        Span::raw(format!("{} ", row.winery.name)),
        Span::styled(star_line(rating), Style::default().fg(rating_color(rating))),
        Span::styled(format!(" {:.1}", rating), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("  {}", row.winery.region_label()), Style::default().fg(Color::DarkGray)),
    ];
    if let Some((label, color)) = rating_state_label(row.rating_state) {
        spans.push(Span::styled(format!("  {}", label), Style::default().fg(color)));
    }
    Line::from(spans)
}

fn draw_winery_list(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.active_panel == Panel::List;
    let refreshed = state
        .last_refreshed
        .map(|t| format!(" updated {} ", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let loading = if state.is_loading { " [...]" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state, Panel::List))
        .title(format!(" {} ({}){} ", Panel::List.title(), state.wineries.len(), loading))
        .title_bottom(Line::from(refreshed).right_aligned());

    if state.wineries.is_empty() {
        let empty = Paragraph::new("No wineries. Press r to refresh.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = state
        .wineries
        .iter()
        .map(|row| {
            let selected = state.selected.as_ref().is_some_and(|s| s.winery.id == row.winery.id);
            let item = ListItem::new(winery_line(row));
            if selected {
                item.style(Style::default().fg(Color::Magenta))
            } else {
                item
            }
        })
        .collect();

    let highlight_style = if focused {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().bold()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style)
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.list_cursor));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_map(f: &mut Frame, state: &RenderState, area: Rect) {
    let map = state.map;
    let (x_bounds, y_bounds) = map.bounds();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state, Panel::Map))
        .title(format!(
            " {} {:.4}, {:.4} z{} (arrows:pan +/-:zoom Enter:pick) ",
            Panel::Map.title(),
            map.latitude,
            map.longitude,
            map.zoom
        ));

    let selected_id = state.selected.as_ref().map(|row| row.winery.id);
    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: Color::DarkGray,
            });
            ctx.layer();
            for row in &state.wineries {
                let w = &row.winery;
                if !map.contains(w.latitude, w.longitude) {
                    continue;
                }
                let style = if Some(w.id) == selected_id {
                    Style::default().fg(Color::Black).bg(Color::Magenta).bold()
                } else {
                    Style::default().fg(rating_color(row.displayed_rating)).bold()
                };
                ctx.print(w.longitude, w.latitude, Span::styled(w.initial().to_string(), style));
            }
        });

    f.render_widget(canvas, area);
}

fn draw_detail(f: &mut Frame, state: &RenderState, row: &WineryRow, area: Rect) {
    let w = &row.winery;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(state, Panel::Detail))
        .title(format!(" {} ", w.name))
        .title_style(Style::default().bold());

    let mut rating_spans = vec![
        Span::raw("Rating: "),
        Span::styled(star_line(row.displayed_rating), Style::default().fg(rating_color(row.displayed_rating))),
        Span::raw(format!(" {:.1}", row.displayed_rating)),
    ];
    if let Some((label, color)) = rating_state_label(row.rating_state) {
        rating_spans.push(Span::styled(format!("  {}", label), Style::default().fg(color)));
    }

    let lines = vec![
        Line::from(w.description.clone()),
        Line::from(""),
        Line::from(format!("Location: {:.6}, {:.6}", w.latitude, w.longitude)),
        Line::from(format!("Region: {}", w.region_label())),
        Line::from(rating_spans),
        Line::from(Span::styled(
            "1-5: rate | x: close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let detail = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(detail, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let bar = Paragraph::new(status_text(state)).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);

    let help_text = r#"
 KEREM - Keyboard Shortcuts

 NAVIGATION
   Tab / Shift+Tab    Switch panels
   ↑ / ↓              Move in list / regions
   Enter              Select winery / toggle region

 SEARCH & FILTERS
   /                  Edit name search
   f                  Expand / collapse filters
   ← / →  or  - / +   Lower / raise minimum rating
   Space              Toggle region
   s                  Search    c  Clear filters
   r                  Reload all wineries

 WINERY
   1 - 5              Rate (list or details)
   x / Esc            Close details

 MAP
   arrows             Pan
   + / -              Zoom
   Enter              Pick marker nearest center

 ADMIN
   a                  Add winery form

 GENERAL
   L                  Logout
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_notice_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(notice) = &state.notice else { return };
    let popup_area = centered_rect(50, 20, area);
    let color = notice_color(notice.kind);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(" Notice (any key to close) ")
        .style(Style::default().bg(Color::Black));

    let text = Paragraph::new(notice.message.as_str())
        .style(Style::default().fg(color))
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
