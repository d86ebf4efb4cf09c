use super::handlers::{get_order, list_orders};
use super::AppState;
use axum::routing::get;
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/order/{id}", get(get_order))
        .route("/orders", get(list_orders))
        .with_state(state)
}
