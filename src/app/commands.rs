//! Command handlers - business logic for processing UI events and API results

use chrono::Local;

use crate::app::state::{AppState, AuthPage, Notice};
use crate::messages::network::Operation;
use crate::messages::ui_events::{InputMode, Panel, Screen};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::Winery;
use crate::session::Session;

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

impl AppState {
    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.cycle_panel(1);
    }

    pub fn prev_panel(&mut self) {
        self.cycle_panel(-1);
    }

    fn cycle_panel(&mut self, step: isize) {
        let panels = self.visible_panels();
        let current = panels
            .iter()
            .position(|p| *p == self.active_panel)
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(panels.len() as isize) as usize;
        self.active_panel = panels[next];
        self.input_mode = InputMode::Normal;
    }

    pub fn focus_search(&mut self) {
        self.active_panel = Panel::Search;
        self.start_editing();
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        if let Some(len) = self.current_input().map(|s| s.len()) {
            self.input_mode = InputMode::Editing;
            self.cursor_position = len;
        }
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    fn reset_cursor(&mut self) {
        self.cursor_position = self.current_input().map(|s| s.len()).unwrap_or(0);
    }

    pub fn move_cursor_left(&mut self) {
        let Some(input) = self.current_input() else { return };
        if self.cursor_position > 0 {
            let new_pos = input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let Some(input) = self.current_input() else { return };
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        // Space toggles the register page's admin checkbox
        if self.screen() == Screen::Register && self.register_form.text().is_none() {
            if c == ' ' {
                self.register_form.is_admin = !self.register_form.is_admin;
            }
            return;
        }
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            if cursor_pos <= input.len() {
                input.insert(cursor_pos, c);
                self.cursor_position = cursor_pos + c.len_utf8();
            }
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor_pos = self.cursor_position;
        if let Some(input) = self.current_input_mut() {
            let prev_pos = input[..cursor_pos]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            input.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    /// Tab inside a form
    pub fn next_field(&mut self) {
        match self.screen() {
            Screen::Login => self.login_form.next_field(false),
            Screen::Register => self.register_form.next_field(true),
            Screen::Main => {
                if self.active_panel == Panel::AddWinery {
                    self.winery_form.field = self.winery_form.field.next();
                }
            }
        }
        self.reset_cursor();
    }

    // ========================
    // Session
    // ========================

    pub fn switch_auth_page(&mut self) {
        self.auth_page = match self.auth_page {
            AuthPage::Login => AuthPage::Register,
            AuthPage::Register => AuthPage::Login,
        };
        self.reset_cursor();
    }

    /// Submit the login or register form
    pub fn submit_auth(&mut self) -> Option<NetworkCommand> {
        if self.auth_request_id.is_some() {
            return None;
        }
        let screen = self.screen();
        let form = match screen {
            Screen::Login => &self.login_form,
            Screen::Register => &self.register_form,
            Screen::Main => return None,
        };
        if !form.is_complete() {
            self.notice = Some(Notice::error("Please enter a username and password."));
            return None;
        }
        let credentials = form.credentials();
        let registration = form.registration();

        let id = self.next_id();
        self.auth_request_id = Some(id);
        if screen == Screen::Login {
            Some(NetworkCommand::Login { id, credentials })
        } else {
            Some(NetworkCommand::Register { id, registration })
        }
    }

    /// Drop the session, the stored token and everything the main view held
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(username = %session.username, "Logged out");
        }
        if let Err(e) = self.storage.clear_token() {
            tracing::error!(error = %format!("{:#}", e), "Failed to remove stored token");
        }

        self.wineries.clear();
        self.list_cursor = 0;
        self.collection_request_id = None;
        self.last_refreshed = None;
        self.filters = Default::default();
        self.ratings.clear();
        self.winery_form.reset();
        self.create_request_id = None;
        self.selected = None;
        self.map = Default::default();
        self.status = None;
        self.active_panel = Panel::List;
        self.input_mode = InputMode::Normal;

        self.auth_page = AuthPage::Login;
        self.login_form.password.clear();
        self.reset_cursor();
    }

    fn establish_session(&mut self, token: String) -> Option<NetworkCommand> {
        match Session::from_token(&token) {
            Ok(session) => {
                tracing::info!(username = %session.username, is_admin = session.is_admin, "Logged in");
                if let Err(e) = self.storage.save_token(session.token()) {
                    tracing::error!(error = %format!("{:#}", e), "Failed to persist token");
                }
                self.session = Some(session);
                self.login_form.password.clear();
                self.active_panel = Panel::List;
                self.input_mode = InputMode::Normal;
                self.fetch_all()
            }
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Login returned an unreadable token");
                self.notice = Some(Notice::error(LOGIN_FAILED));
                None
            }
        }
    }

    // ========================
    // Collection
    // ========================

    /// GET /wineries; only meaningful with a session
    pub fn fetch_all(&mut self) -> Option<NetworkCommand> {
        let token = Some(self.bearer()?);
        let id = self.next_id();
        self.collection_request_id = Some(id);
        Some(NetworkCommand::FetchWineries { id, token })
    }

    /// Search with the current filters. Empty criteria fetch everything.
    pub fn search(&mut self) -> Option<NetworkCommand> {
        self.stop_editing();
        let query = self.filters.to_query();
        if query.is_unfiltered() {
            return self.fetch_all();
        }
        let token = Some(self.bearer()?);
        let id = self.next_id();
        self.collection_request_id = Some(id);
        Some(NetworkCommand::SearchWineries { id, token, query })
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        if matches!(self.active_panel, Panel::Search | Panel::Filters) {
            self.reset_cursor();
        }
    }

    pub fn toggle_filters(&mut self) {
        self.filters.toggle_expanded();
        if self.filters.expanded {
            self.active_panel = Panel::Filters;
        }
    }

    // ========================
    // List & selection
    // ========================

    pub fn next_winery(&mut self) {
        if !self.wineries.is_empty() {
            self.list_cursor = (self.list_cursor + 1) % self.wineries.len();
        }
    }

    pub fn prev_winery(&mut self) {
        if !self.wineries.is_empty() {
            self.list_cursor = self
                .list_cursor
                .checked_sub(1)
                .unwrap_or(self.wineries.len() - 1);
        }
    }

    /// Select the winery under the list cursor
    pub fn select_winery(&mut self) {
        if let Some(winery) = self.wineries.get(self.list_cursor).cloned() {
            self.select(winery);
        }
    }

    /// Select the marker closest to the map center
    pub fn select_nearest(&mut self) {
        if let Some(winery) = self.map.nearest(&self.wineries).cloned() {
            if let Some(index) = self.wineries.iter().position(|w| w.id == winery.id) {
                self.list_cursor = index;
            }
            self.select(winery);
        }
    }

    /// Fill the selection slot, recenter the map and open the detail panel
    pub fn select(&mut self, winery: Winery) {
        self.map.focus(winery.latitude, winery.longitude);
        self.selected = Some(winery);
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
        if self.active_panel == Panel::Detail {
            self.active_panel = Panel::List;
        }
    }

    // ========================
    // Ratings
    // ========================

    /// Submit `rating` stars for the winery the focused panel refers to
    pub fn rate(&mut self, rating: u8) -> Option<NetworkCommand> {
        if !(1..=5).contains(&rating) {
            return None;
        }
        let winery_id = match self.active_panel {
            Panel::Detail => self.selected.as_ref()?.id,
            Panel::List => self.wineries.get(self.list_cursor)?.id,
            _ => return None,
        };
        let token = Some(self.bearer()?);
        let id = self.next_id();
        self.ratings.submit(winery_id, id, rating);
        Some(NetworkCommand::RateWinery { id, token, winery_id, rating })
    }

    fn apply_average(&mut self, winery_id: u64, average_rating: f64) {
        if let Some(winery) = self.wineries.iter_mut().find(|w| w.id == winery_id) {
            winery.average_rating = average_rating;
        }
        if let Some(selected) = self.selected.as_mut().filter(|w| w.id == winery_id) {
            selected.average_rating = average_rating;
        }
    }

    // ========================
    // Map
    // ========================

    pub fn pan_map(&mut self, lat: i32, lon: i32) {
        self.map.pan(lat, lon);
    }

    pub fn zoom_in(&mut self) {
        self.map.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.map.zoom_out();
    }

    // ========================
    // Admin form
    // ========================

    /// Show/hide the add-winery form. Display gate only; the API decides.
    pub fn toggle_add_winery(&mut self) {
        if !self.is_admin() {
            return;
        }
        self.winery_form.open = !self.winery_form.open;
        if self.winery_form.open {
            self.active_panel = Panel::AddWinery;
            self.start_editing();
        } else if self.active_panel == Panel::AddWinery {
            self.active_panel = Panel::List;
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn submit_winery(&mut self) -> Option<NetworkCommand> {
        if !self.is_admin() || !self.winery_form.open || self.create_request_id.is_some() {
            return None;
        }
        let winery = match self.winery_form.to_new_winery() {
            Ok(winery) => winery,
            Err(e) => {
                self.notice = Some(Notice::error(format!("{:#}", e)));
                return None;
            }
        };
        let token = Some(self.bearer()?);
        self.stop_editing();
        let id = self.next_id();
        self.create_request_id = Some(id);
        Some(NetworkCommand::CreateWinery { id, token, winery })
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ========================
    // Response handling
    // ========================

    /// Apply an API result; returns follow-up commands to send
    pub fn handle_response(&mut self, response: NetworkResponse) -> Vec<NetworkCommand> {
        let mut follow_up = Vec::new();

        match response {
            NetworkResponse::LoggedIn { id, token } => {
                if self.auth_request_id == Some(id) {
                    self.auth_request_id = None;
                    follow_up.extend(self.establish_session(token));
                }
            }
            NetworkResponse::Registered { id, is_admin } => {
                if self.auth_request_id == Some(id) {
                    self.auth_request_id = None;
                    self.notice = Some(Notice::info(if is_admin {
                        "Admin user created successfully. Please login."
                    } else {
                        "User created successfully. Please login."
                    }));
                    self.login_form.username = self.register_form.username.trim().to_string();
                    self.login_form.password.clear();
                    self.register_form = Default::default();
                    self.auth_page = AuthPage::Login;
                    self.reset_cursor();
                }
            }
            NetworkResponse::Wineries { id, wineries } => {
                if self.collection_request_id != Some(id) {
                    tracing::debug!(id, "Dropping stale collection response");
                } else {
                    self.collection_request_id = None;
                    self.replace_collection(wineries);
                }
            }
            NetworkResponse::WineryCreated { id, winery } => {
                if self.create_request_id == Some(id) {
                    self.create_request_id = None;
                    let name = winery
                        .map(|w| w.name)
                        .unwrap_or_else(|| self.winery_form.name.trim().to_string());
                    self.status = Some(format!("Added {}", name));
                    self.winery_form.reset();
                    if self.active_panel == Panel::AddWinery {
                        self.active_panel = Panel::List;
                        self.input_mode = InputMode::Normal;
                    }
                    follow_up.extend(self.fetch_all());
                }
            }
            NetworkResponse::RatingAccepted { id, winery_id, average_rating } => {
                if self.ratings.confirm(winery_id, id, average_rating) {
                    self.apply_average(winery_id, average_rating);
                    self.status = Some(format!("Rating saved, new average {:.1}", average_rating));
                } else {
                    tracing::debug!(id, winery_id, "Dropping outdated rating aggregate");
                }
            }
            NetworkResponse::Error { id, operation, message } => {
                self.handle_error(id, operation, message);
            }
        }

        follow_up
    }

    fn replace_collection(&mut self, wineries: Vec<Winery>) {
        tracing::info!(count = wineries.len(), "Winery collection replaced");
        self.wineries = wineries;
        if self.list_cursor >= self.wineries.len() {
            self.list_cursor = self.wineries.len().saturating_sub(1);
        }
        // Refresh the selected snapshot when the winery is still listed
        if let Some(selected) = self.selected.as_mut() {
            if let Some(fresh) = self.wineries.iter().find(|w| w.id == selected.id) {
                *selected = fresh.clone();
            }
        }
        self.last_refreshed = Some(Local::now());
        self.status = Some(format!("{} wineries", self.wineries.len()));
    }

    fn handle_error(&mut self, id: u64, operation: Operation, message: String) {
        match operation {
            Operation::Login | Operation::Register => {
                if self.auth_request_id == Some(id) {
                    self.auth_request_id = None;
                    self.notice = Some(Notice::error(if operation == Operation::Login {
                        LOGIN_FAILED
                    } else {
                        REGISTRATION_FAILED
                    }));
                }
            }
            Operation::FetchWineries | Operation::SearchWineries => {
                // The previous list stays on screen
                if self.collection_request_id == Some(id) {
                    self.collection_request_id = None;
                    self.status = Some(format!("Error {}: {}", operation.as_str(), message));
                }
            }
            Operation::CreateWinery => {
                if self.create_request_id == Some(id) {
                    self.create_request_id = None;
                    self.status = Some(format!("Error {}: {}", operation.as_str(), message));
                }
            }
            Operation::RateWinery(winery_id) => {
                if self.ratings.fail(winery_id, id) {
                    self.status = Some(format!("Rating not saved: {}", message));
                }
            }
        }
    }
}
