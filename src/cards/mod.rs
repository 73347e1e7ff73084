mod dto;
pub mod handlers;
pub mod services;

pub use dto::{Card, RegisterCardRequest};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::card_routes()
}
