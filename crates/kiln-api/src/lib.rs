pub mod auth;
pub mod chat;
pub mod error;
pub mod generation;
pub mod messages;
pub mod middleware;
pub mod preview;
pub mod projects;
pub mod provider;
pub mod router;
pub mod state;

pub use router::router;
pub use state::{AppState, AppStateInner};
