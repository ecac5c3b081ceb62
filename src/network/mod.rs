//! Network layer - async API calls executed on the Tokio runtime

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
pub use client::ApiClient;
