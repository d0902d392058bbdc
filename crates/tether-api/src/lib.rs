//! HTTP boundary for the tether chat engine.
//!
//! Serves `POST /api/chat`, `GET|POST /api/chat/{id}/stream`, `POST /api/chat/attachments`
//! and `POST /api/maintenance/retention` as event streams or JSON.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
pub mod ui;

pub use router::build_router;
pub use state::AppState;
