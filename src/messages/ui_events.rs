//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Which top-level screen is shown. Derived from session presence.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum Screen {
    #[default]
    Login,
    Register,
    Main,
}

impl Screen {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Screen::Main)
    }
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Login / register pages
    SwitchAuthPage,
    NextField,
    SubmitAuth,

    // Panel navigation
    NextPanel,
    PrevPanel,
    FocusSearch,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,

    // Collection
    Refresh,
    Search,

    // Filters
    ToggleFilters,
    ClearFilters,
    NextRegion,
    PrevRegion,
    ToggleRegion,
    RaiseMinRating,
    LowerMinRating,

    // List & selection
    NextWinery,
    PrevWinery,
    SelectWinery,
    CloseDetail,

    // Rating widget: star 1..=5
    Rate(u8),

    // Map
    PanMap { lat: i32, lon: i32 },
    ZoomIn,
    ZoomOut,
    SelectNearest,

    // Admin form
    ToggleAddWinery,
    SubmitWinery,

    // Session
    Logout,

    // Popups
    ToggleHelp,
    CloseHelp,
    DismissNotice,

    // System
    Quit,
}

/// Focusable panel on the main screen
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum Panel {
    #[default]
    Search,
    Filters,
    AddWinery,
    List,
    Map,
    Detail,
}

impl Panel {
    /// Tab order
    pub const ORDER: [Panel; 6] = [
        Panel::Search,
        Panel::Filters,
        Panel::AddWinery,
        Panel::List,
        Panel::Map,
        Panel::Detail,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Panel::Search => "Search",
            Panel::Filters => "Filters",
            Panel::AddWinery => "Add Winery",
            Panel::List => "Wineries",
            Panel::Map => "Map",
            Panel::Detail => "Details",
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// UI context needed to interpret a key press
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyContext {
    pub screen: Screen,
    pub panel: Panel,
    pub input_mode: InputMode,
    pub show_help: bool,
    pub has_notice: bool,
    pub is_admin: bool,
    pub detail_open: bool,
    /// Region checklist is visible
    pub filters_expanded: bool,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(key: KeyEvent, ctx: KeyContext) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('r') if !ctx.screen.is_authenticated() => {
                return Some(UiEvent::SwitchAuthPage)
            }
            _ => {}
        }
    }

    // Blocking popups swallow the key
    if ctx.has_notice {
        return Some(UiEvent::DismissNotice);
    }
    if ctx.show_help {
        return Some(UiEvent::CloseHelp);
    }

    match ctx.screen {
        Screen::Login | Screen::Register => handle_auth_keys(key),
        Screen::Main => match ctx.input_mode {
            InputMode::Normal => handle_main_keys(key, ctx),
            InputMode::Editing => handle_editing_keys(key, ctx.panel),
        },
    }
}

/// Login/register pages are always in text entry
fn handle_auth_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::F(2) => Some(UiEvent::SwitchAuthPage),
        KeyCode::Tab | KeyCode::Down => Some(UiEvent::NextField),
        KeyCode::Enter => Some(UiEvent::SubmitAuth),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}

fn handle_editing_keys(key: KeyEvent, panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        KeyCode::Tab if panel == Panel::AddWinery => Some(UiEvent::NextField),
        KeyCode::Enter => match panel {
            Panel::Search | Panel::Filters => Some(UiEvent::Search),
            Panel::AddWinery => Some(UiEvent::SubmitWinery),
            _ => Some(UiEvent::StopEditing),
        },
        _ => None,
    }
}

fn handle_main_keys(key: KeyEvent, ctx: KeyContext) -> Option<UiEvent> {
    let panel = ctx.panel;
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Tab => Some(UiEvent::NextPanel),
        KeyCode::BackTab => Some(UiEvent::PrevPanel),
        KeyCode::Char('/') => Some(UiEvent::FocusSearch),
        KeyCode::Char('s') => Some(UiEvent::Search),
        KeyCode::Char('r') => Some(UiEvent::Refresh),
        KeyCode::Char('f') => Some(UiEvent::ToggleFilters),
        KeyCode::Char('c') => Some(UiEvent::ClearFilters),
        KeyCode::Char('L') => Some(UiEvent::Logout),
        KeyCode::Char('a') if ctx.is_admin => Some(UiEvent::ToggleAddWinery),
        KeyCode::Char(c @ '1'..='5') if matches!(panel, Panel::List | Panel::Detail) => {
            c.to_digit(10).map(|n| UiEvent::Rate(n as u8))
        }
        KeyCode::Esc | KeyCode::Char('x') if ctx.detail_open => Some(UiEvent::CloseDetail),
        KeyCode::Char('e') => match panel {
            Panel::Search | Panel::Filters | Panel::AddWinery => Some(UiEvent::StartEditing),
            _ => None,
        },
        KeyCode::Enter => match panel {
            Panel::Search | Panel::AddWinery => Some(UiEvent::StartEditing),
            Panel::Filters if ctx.filters_expanded => Some(UiEvent::ToggleRegion),
            Panel::Filters => Some(UiEvent::ToggleFilters),
            Panel::List => Some(UiEvent::SelectWinery),
            Panel::Map => Some(UiEvent::SelectNearest),
            Panel::Detail => None,
        },
        KeyCode::Char(' ') if panel == Panel::Filters && ctx.filters_expanded => {
            Some(UiEvent::ToggleRegion)
        }
        KeyCode::Up => match panel {
            Panel::Filters if ctx.filters_expanded => Some(UiEvent::PrevRegion),
            Panel::List => Some(UiEvent::PrevWinery),
            Panel::Map => Some(UiEvent::PanMap { lat: 1, lon: 0 }),
            _ => None,
        },
        KeyCode::Down => match panel {
            Panel::Filters if ctx.filters_expanded => Some(UiEvent::NextRegion),
            Panel::List => Some(UiEvent::NextWinery),
            Panel::Map => Some(UiEvent::PanMap { lat: -1, lon: 0 }),
            _ => None,
        },
        KeyCode::Left => match panel {
            Panel::Filters => Some(UiEvent::LowerMinRating),
            Panel::Map => Some(UiEvent::PanMap { lat: 0, lon: -1 }),
            _ => None,
        },
        KeyCode::Right => match panel {
            Panel::Filters => Some(UiEvent::RaiseMinRating),
            Panel::Map => Some(UiEvent::PanMap { lat: 0, lon: 1 }),
            _ => None,
        },
        KeyCode::Char('+') | KeyCode::Char('=') => match panel {
            Panel::Map => Some(UiEvent::ZoomIn),
            Panel::Filters => Some(UiEvent::RaiseMinRating),
            _ => None,
        },
        KeyCode::Char('-') => match panel {
            Panel::Map => Some(UiEvent::ZoomOut),
            Panel::Filters => Some(UiEvent::LowerMinRating),
            _ => None,
        },
        _ => None,
    }
}
