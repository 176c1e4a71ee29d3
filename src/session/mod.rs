pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use services::Session;

pub fn router() -> Router<AppState> {
    handlers::session_routes()
}
