//! Network messages - communication between App and Network layers

use crate::models::{Credentials, NewWinery, Registration, SearchQuery, Winery, WineryId};

/// Commands sent from App layer to Network layer.
///
/// Every authenticated command carries the bearer token taken from the
/// session when the command was issued; the network layer keeps none.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    Login {
        id: u64,
        credentials: Credentials,
    },
    Register {
        id: u64,
        registration: Registration,
    },
    /// GET /wineries
    FetchWineries {
        id: u64,
        token: Option<String>,
    },
    /// GET /wineries/search
    SearchWineries {
        id: u64,
        token: Option<String>,
        query: SearchQuery,
    },
    CreateWinery {
        id: u64,
        token: Option<String>,
        winery: NewWinery,
    },
    RateWinery {
        id: u64,
        token: Option<String>,
        winery_id: WineryId,
        rating: u8,
    },
    /// Shutdown the network actor
    Shutdown,
}

impl NetworkCommand {
    /// Bearer token attached to this command, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            NetworkCommand::FetchWineries { token, .. }
            | NetworkCommand::SearchWineries { token, .. }
            | NetworkCommand::CreateWinery { token, .. }
            | NetworkCommand::RateWinery { token, .. } => token.as_deref(),
            NetworkCommand::Login { .. }
            | NetworkCommand::Register { .. }
            | NetworkCommand::Shutdown => None,
        }
    }
}

/// Which call an error belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Login,
    Register,
    FetchWineries,
    SearchWineries,
    CreateWinery,
    RateWinery(WineryId),
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::Register => "registration",
            Operation::FetchWineries => "loading wineries",
            Operation::SearchWineries => "searching wineries",
            Operation::CreateWinery => "adding winery",
            Operation::RateWinery(_) => "rating winery",
        }
    }
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    LoggedIn {
        id: u64,
        token: String,
    },
    Registered {
        id: u64,
        is_admin: bool,
    },
    /// Result of either a fetch or a search
    Wineries {
        id: u64,
        wineries: Vec<Winery>,
    },
    WineryCreated {
        id: u64,
        winery: Option<Winery>,
    },
    RatingAccepted {
        id: u64,
        winery_id: WineryId,
        average_rating: f64,
    },
    Error {
        id: u64,
        operation: Operation,
        message: String,
    },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::LoggedIn { id, .. } => *id,
            NetworkResponse::Registered { id, .. } => *id,
            NetworkResponse::Wineries { id, .. } => *id,
            NetworkResponse::WineryCreated { id, .. } => *id,
            NetworkResponse::RatingAccepted { id, .. } => *id,
            NetworkResponse::Error { id, .. } => *id,
        }
    }
}
