pub mod health;
pub mod proxy;

use axum::Router;

use crate::state::AppState;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(proxy::routes(state))
}
