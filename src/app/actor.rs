//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // A restored session loads the collection right away
        let initial = self.state.fetch_all();
        self.send(initial);
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    for cmd in self.state.handle_response(response) {
                        self.send(Some(cmd));
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn send(&self, cmd: Option<NetworkCommand>) {
        if let Some(cmd) = cmd {
            if self.network_tx.send(cmd).is_err() {
                tracing::warn!("Network actor is gone; command dropped");
            }
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        let state = &mut self.state;
        let cmd = match event {
            // Login / register
            UiEvent::SwitchAuthPage => {
                state.switch_auth_page();
                None
            }
            UiEvent::NextField => {
                state.next_field();
                None
            }
            UiEvent::SubmitAuth => state.submit_auth(),
            UiEvent::Logout => {
                state.logout();
                None
            }

            // Panel navigation
            UiEvent::NextPanel => {
                state.next_panel();
                None
            }
            UiEvent::PrevPanel => {
                state.prev_panel();
                None
            }
            UiEvent::FocusSearch => {
                state.focus_search();
                None
            }

            // Input editing
            UiEvent::StartEditing => {
                state.start_editing();
                None
            }
            UiEvent::StopEditing => {
                state.stop_editing();
                None
            }
            UiEvent::CharInput(c) => {
                state.enter_char(c);
                None
            }
            UiEvent::Backspace => {
                state.delete_char();
                None
            }
            UiEvent::CursorLeft => {
                state.move_cursor_left();
                None
            }
            UiEvent::CursorRight => {
                state.move_cursor_right();
                None
            }

            // Collection
            UiEvent::Refresh => state.fetch_all(),
            UiEvent::Search => state.search(),

            // Filters
            UiEvent::ToggleFilters => {
                state.toggle_filters();
                None
            }
            UiEvent::ClearFilters => {
                state.clear_filters();
                None
            }
            UiEvent::NextRegion => {
                state.filters.next_region();
                None
            }
            UiEvent::PrevRegion => {
                state.filters.prev_region();
                None
            }
            UiEvent::ToggleRegion => {
                state.filters.toggle_highlighted_region();
                None
            }
            UiEvent::RaiseMinRating => {
                state.filters.raise_min_rating();
                None
            }
            UiEvent::LowerMinRating => {
                state.filters.lower_min_rating();
                None
            }

            // List & selection
            UiEvent::NextWinery => {
                state.next_winery();
                None
            }
            UiEvent::PrevWinery => {
                state.prev_winery();
                None
            }
            UiEvent::SelectWinery => {
                state.select_winery();
                None
            }
            UiEvent::CloseDetail => {
                state.close_detail();
                None
            }
            UiEvent::Rate(stars) => state.rate(stars),

            // Map
            UiEvent::PanMap { lat, lon } => {
                state.pan_map(lat, lon);
                None
            }
            UiEvent::ZoomIn => {
                state.zoom_in();
                None
            }
            UiEvent::ZoomOut => {
                state.zoom_out();
                None
            }
            UiEvent::SelectNearest => {
                state.select_nearest();
                None
            }

            // Admin form
            UiEvent::ToggleAddWinery => {
                state.toggle_add_winery();
                None
            }
            UiEvent::SubmitWinery => state.submit_winery(),

            // Popups
            UiEvent::ToggleHelp => {
                state.toggle_help();
                None
            }
            UiEvent::CloseHelp => {
                state.close_help();
                None
            }
            UiEvent::DismissNotice => {
                state.dismiss_notice();
                None
            }

            // System
            UiEvent::Quit => return true,
        };

        self.send(cmd);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::encode_test_token;
    use crate::storage::Storage;
    use serde_json::json;

    #[tokio::test]
    async fn test_restored_session_fetches_on_start_and_quit_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());
        let token = encode_test_token(&json!({"sub": {"username": "dana", "is_admin": false}}));
        storage.save_token(&token).unwrap();

        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_resp_tx, resp_rx) = mpsc::unbounded_channel();
        let (net_tx, mut net_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(AppState::new(storage, "http://wine.test"), net_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, resp_rx));

        match net_rx.recv().await {
            Some(NetworkCommand::FetchWineries { token: Some(t), .. }) => assert_eq!(t, token),
            other => panic!("expected initial fetch, got {:?}", other),
        }
        let first = render_rx.recv().await.unwrap();
        assert!(first.screen.is_authenticated());
        assert!(first.is_loading);

        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();
        assert!(matches!(net_rx.recv().await, Some(NetworkCommand::Shutdown)));
    }

    #[tokio::test]
    async fn test_no_session_means_no_requests() {
        let dir = tempfile::tempdir().unwrap();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_resp_tx, resp_rx) = mpsc::unbounded_channel();
        let (net_tx, mut net_rx) = mpsc::unbounded_channel();
        let (render_tx, _render_rx) = mpsc::unbounded_channel();

        let state = AppState::new(Storage::with_dir(dir.path()), "http://wine.test");
        let handle = tokio::spawn(AppActor::new(state, net_tx, render_tx).run(ui_rx, resp_rx));

        ui_tx.send(UiEvent::Refresh).unwrap();
        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();
        assert!(matches!(net_rx.recv().await, Some(NetworkCommand::Shutdown)));
    }
}
