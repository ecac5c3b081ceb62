//! Render state - data structure sent from App layer to UI for rendering

use chrono::{DateTime, Local, Utc};

use crate::app::filters::FilterState;
use crate::app::forms::{AuthForm, WineryForm};
use crate::app::map::MapView;
use crate::app::ratings::RatingState;
use crate::app::state::Notice;
use crate::messages::ui_events::{InputMode, KeyContext, Panel, Screen};
use crate::models::Winery;

/// A winery as the list, map and detail panel show it
#[derive(Debug, Clone, PartialEq)]
pub struct WineryRow {
    pub winery: Winery,
    /// Optimistic value while a submission is pending, otherwise the aggregate
    pub displayed_rating: f64,
    pub rating_state: Option<RatingState>,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub screen: Screen,

    // Login / register
    pub login_form: AuthForm,
    pub register_form: AuthForm,

    // Session
    pub username: Option<String>,
    pub is_admin: bool,
    pub session_expires_at: Option<DateTime<Utc>>,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Main view
    pub filters: FilterState,
    pub winery_form: WineryForm,
    pub wineries: Vec<WineryRow>,
    pub list_cursor: usize,
    pub selected: Option<WineryRow>,
    pub map: MapView,

    // Activity
    pub is_loading: bool,
    pub status: Option<String>,
    pub last_refreshed: Option<DateTime<Local>>,
    pub api_base_url: String,

    // Popups
    pub show_help: bool,
    pub notice: Option<Notice>,
}

impl RenderState {
    /// Context for interpreting the next key press
    pub fn key_context(&self) -> KeyContext {
        KeyContext {
            screen: self.screen,
            panel: self.active_panel,
            input_mode: self.input_mode,
            show_help: self.show_help,
            has_notice: self.notice.is_some(),
            is_admin: self.is_admin,
            detail_open: self.selected.is_some(),
            filters_expanded: self.filters.expanded,
        }
    }
}
