//! App state - pure data structure with no network I/O

use chrono::{DateTime, Local};

use crate::app::filters::FilterState;
use crate::app::forms::{AuthForm, WineryForm};
use crate::app::map::MapView;
use crate::app::ratings::RatingBook;
use crate::messages::render::WineryRow;
use crate::messages::ui_events::{InputMode, Panel, Screen};
use crate::messages::RenderState;
use crate::models::Winery;
use crate::session::Session;
use crate::storage::Storage;

/// Which unauthenticated page is shown
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum AuthPage {
    #[default]
    Login,
    Register,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Blocking alert; dismissed by any key
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice { kind: NoticeKind::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice { kind: NoticeKind::Error, message: message.into() }
    }
}

/// Main application state - pure data, no network I/O
pub struct AppState {
    // Session (the only thing deciding which screen is shown)
    pub session: Option<Session>,
    pub auth_page: AuthPage,
    pub login_form: AuthForm,
    pub register_form: AuthForm,
    pub auth_request_id: Option<u64>,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Collection
    pub wineries: Vec<Winery>,
    pub list_cursor: usize,
    pub collection_request_id: Option<u64>,
    pub last_refreshed: Option<DateTime<Local>>,

    // Filters, ratings, admin form
    pub filters: FilterState,
    pub ratings: RatingBook,
    pub winery_form: WineryForm,
    pub create_request_id: Option<u64>,

    // Selection & map
    pub selected: Option<Winery>,
    pub map: MapView,

    // Popups & status
    pub show_help: bool,
    pub notice: Option<Notice>,
    pub status: Option<String>,

    pub api_base_url: String,
    pub next_request_id: u64,

    // Storage (persisted token)
    pub storage: Storage,
}

impl AppState {
    /// Build state, restoring a persisted session if one decodes
    pub fn new(storage: Storage, api_base_url: impl Into<String>) -> Self {
        let session = storage.load_token().and_then(|token| {
            match Session::from_token(&token) {
                Ok(session) => {
                    tracing::info!(username = %session.username, is_admin = session.is_admin, "Restored session from stored token");
                    Some(session)
                }
                Err(e) => {
                    tracing::warn!(error = %format!("{:#}", e), "Discarding unreadable stored token");
                    if let Err(e) = storage.clear_token() {
                        tracing::warn!(error = %e, "Could not remove stored token");
                    }
                    None
                }
            }
        });

        AppState {
            session,
            auth_page: AuthPage::Login,
            login_form: AuthForm::default(),
            register_form: AuthForm::default(),
            auth_request_id: None,
            active_panel: Panel::List,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            wineries: Vec::new(),
            list_cursor: 0,
            collection_request_id: None,
            last_refreshed: None,
            filters: FilterState::default(),
            ratings: RatingBook::default(),
            winery_form: WineryForm::default(),
            create_request_id: None,
            selected: None,
            map: MapView::default(),
            show_help: false,
            notice: None,
            status: None,
            api_base_url: api_base_url.into(),
            next_request_id: 1,
            storage,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Screen follows session presence and nothing else
    pub fn screen(&self) -> Screen {
        match (&self.session, self.auth_page) {
            (Some(_), _) => Screen::Main,
            (None, AuthPage::Login) => Screen::Login,
            (None, AuthPage::Register) => Screen::Register,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_admin)
    }

    /// Bearer token for the next command, taken from the session
    pub fn bearer(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.token().to_string())
    }

    pub fn is_loading(&self) -> bool {
        self.auth_request_id.is_some()
            || self.collection_request_id.is_some()
            || self.create_request_id.is_some()
    }

    /// Panels reachable with Tab on the main screen
    pub fn visible_panels(&self) -> Vec<Panel> {
        Panel::ORDER
            .iter()
            .copied()
            .filter(|panel| match panel {
                Panel::AddWinery => self.winery_form.open && self.is_admin(),
                Panel::Detail => self.selected.is_some(),
                _ => true,
            })
            .collect()
    }

    /// Get the current input field content
    pub fn current_input(&self) -> Option<&String> {
        match self.screen() {
            Screen::Login => self.login_form.text(),
            Screen::Register => self.register_form.text(),
            Screen::Main => match self.active_panel {
                Panel::Search | Panel::Filters => Some(&self.filters.name),
                Panel::AddWinery => Some(self.winery_form.get(self.winery_form.field)),
                _ => None,
            },
        }
    }

    /// Get mutable reference to current input field
    pub fn current_input_mut(&mut self) -> Option<&mut String> {
        match self.screen() {
            Screen::Login => self.login_form.text_mut(),
            Screen::Register => self.register_form.text_mut(),
            Screen::Main => match self.active_panel {
                Panel::Search | Panel::Filters => Some(&mut self.filters.name),
                Panel::AddWinery => Some(self.winery_form.current_mut()),
                _ => None,
            },
        }
    }

    fn row(&self, winery: &Winery) -> WineryRow {
        WineryRow {
            winery: winery.clone(),
            displayed_rating: self.ratings.displayed(winery),
            rating_state: self.ratings.state(winery.id),
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            screen: self.screen(),
            login_form: self.login_form.clone(),
            register_form: self.register_form.clone(),
            username: self.session.as_ref().map(|s| s.username.clone()),
            is_admin: self.is_admin(),
            session_expires_at: self.session.as_ref().and_then(|s| s.expires_at),
            active_panel: self.active_panel,
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            filters: self.filters.clone(),
            winery_form: self.winery_form.clone(),
            wineries: self.wineries.iter().map(|w| self.row(w)).collect(),
            list_cursor: self.list_cursor,
            selected: self.selected.as_ref().map(|w| self.row(w)),
            map: self.map,
            is_loading: self.is_loading(),
            status: self.status.clone(),
            last_refreshed: self.last_refreshed,
            api_base_url: self.api_base_url.clone(),
            show_help: self.show_help,
            notice: self.notice.clone(),
        }
    }
}
