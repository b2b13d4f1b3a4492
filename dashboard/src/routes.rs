use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Serialize;
use tracker::{Entity, EntityAggregate, Frame, Prefecture};

use crate::state::AppState;
use crate::views;

pub fn router(state: Arc<AppState>) -> Router {
    let fragment_routes = Router::new().route("/counts", get(views::counts::fragment_counts));

    let api_routes = Router::new()
        .route("/frame", get(latest_frame))
        .route("/prefectures", get(list_prefectures))
        .route("/prefectures/{id}", get(prefecture_aggregate));

    Router::new()
        .route("/", get(views::counts::index))
        .route("/prefecture/{id}", get(views::prefecture::prefecture_detail))
        .route("/styles.css", get(views::styles))
        .nest("/fragments", fragment_routes)
        .nest("/api", api_routes)
        .with_state(state)
}

pub async fn latest_frame(State(state): State<Arc<AppState>>) -> Result<Json<Frame>, StatusCode> {
    state
        .latest_frame()
        .map(|frame| Json(Frame::clone(&frame)))
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

pub async fn list_prefectures(State(state): State<Arc<AppState>>) -> Json<Vec<Prefecture>> {
    Json(state.tracker.catalog().iter().cloned().collect())
}

#[derive(Serialize)]
pub struct AggregateResponse {
    entity: Entity,
    last_day: String,
    #[serde(flatten)]
    aggregate: EntityAggregate,
}

pub async fn prefecture_aggregate(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AggregateResponse>, StatusCode> {
    let Ok(entity) = id.parse::<Entity>();
    let epoch = state
        .tracker
        .current_epoch()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let aggregate = epoch.aggregate(&entity).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(AggregateResponse {
        entity,
        last_day: epoch.aggregation.last_day.to_string(),
        aggregate: aggregate.clone(),
    }))
}
