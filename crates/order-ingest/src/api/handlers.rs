use super::error::ApiError;
use super::AppState;
use crate::model::Order;
use axum::extract::{Path, State};
use axum::Json;
use ingest_framework::Counter;
use tracing::info;
use uuid::Uuid;

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state.metrics.increment(Counter::Requests);

    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("invalid order id"))?;
    info!(%id, "Order requested");

    let order = state
        .service
        .get(id)
        .await
        .map_err(|e| ApiError::from_service(e, "failed to get order"))?;
    Ok(Json(order))
}

pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    state.metrics.increment(Counter::Requests);

    let orders = state
        .service
        .list()
        .await
        .map_err(|e| ApiError::from_service(e, "failed to get orders list"))?;
    Ok(Json(orders))
}
