mod map;

use axum::Router;
use crate::app::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new().merge(map::router())
}
