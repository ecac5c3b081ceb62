//! # Kerem TUI
//!
//! A terminal client for the Kerem winery API.
//!
//! ## Features
//! - Login / registration with a persisted bearer token
//! - Winery list with name, minimum rating and region filters
//! - Star ratings with optimistic display and rollback
//! - World map with winery markers
//! - Admin form for adding wineries
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod constants;
pub mod models;
pub mod session;
pub mod storage;
pub mod ui;
pub mod messages;
pub mod app;
pub mod network;

// Re-export commonly used types
pub use models::{Region, SearchQuery, Winery, WineryId};
pub use session::Session;
pub use storage::{Settings, Storage};
pub use messages::{UiEvent, NetworkCommand, NetworkResponse, RenderState};
pub use app::{AppState, AppActor};
pub use network::{ApiClient, NetworkActor};
