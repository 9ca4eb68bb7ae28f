use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, Instrument};

use natours_core::{Features, StoreError, TourQuery};

use crate::errors::{error_boundary, AppError};
use crate::middleware::{stamp_request_time, RequestTime};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/version", get(version))
        .route("/api/v1/tours", get(get_all_tours).post(create_tour).fallback(not_found))
        // static segments shadow `/:id`, so they also answer the id verbs
        .route("/api/v1/tours/top-5-cheap", get(top_five_cheap).patch(update_tour).delete(delete_tour).fallback(not_found))
        .route("/api/v1/tours/tour-stats", get(get_tour_stats).patch(update_tour).delete(delete_tour).fallback(not_found))
        .route("/api/v1/tours/monthly-plan/:year", get(get_monthly_plan).fallback(not_found))
        .route("/api/v1/tours/:id", get(get_tour).patch(update_tour).delete(delete_tour).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), error_boundary))
        .layer(middleware::from_fn(stamp_request_time))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs a store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(f).await.map_err(|e| AppError::Internal(e.into()))?;
    Ok(joined?)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v).map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn path_param(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    path.map(|Path(v)| v).map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn query_pairs(query: Result<Query<Vec<(String, String)>>, QueryRejection>) -> Result<Vec<(String, String)>, AppError> {
    query.map(|Query(v)| v).map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn version() -> impl IntoResponse {
    let svc_version = env!("CARGO_PKG_VERSION");
    let core_version = natours_core::version();
    (StatusCode::OK, Json(json!({"service_version": svc_version, "core_version": core_version})))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Can't find {uri} on this server!"))
}

pub async fn get_all_tours(
    State(state): State<AppState>,
    Extension(time): Extension<RequestTime>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let params = query_pairs(params)?;
    list_tours(state, time, TourQuery::from_pairs(params)).await
}

/// Same listing as [`get_all_tours`], with a fixed query in place of the caller's.
pub async fn top_five_cheap(State(state): State<AppState>, Extension(time): Extension<RequestTime>) -> Result<Json<Value>, AppError> {
    let query = TourQuery::top_five_cheap();
    debug!(?query, "top-5-cheap alias");
    list_tours(state, time, query).await
}

async fn list_tours(state: AppState, time: RequestTime, query: TourQuery) -> Result<Json<Value>, AppError> {
    let span = info_span!("list_tours", filters = query.filters.len());
    let store = state.store.clone();
    let tours = blocking(move || {
        let features = Features::new(&query).filter()?.sort().limit_fields()?.paginate();
        store.find(&features)
    })
    .instrument(span)
    .await?;
    info!(results = tours.len(), "tours listed");

    Ok(Json(json!({
        "status": "success",
        "requestTime": time.0,
        "results": tours.len(),
        "data": { "tours": tours },
    })))
}

pub async fn get_tour(
    State(state): State<AppState>,
    Extension(time): Extension<RequestTime>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    let store = state.store.clone();
    let tour = blocking(move || store.find_by_id(&id)).await?.ok_or_else(AppError::tour_not_found)?;

    Ok(Json(json!({
        "status": "success",
        "requestTime": time.0,
        "data": { "tour": tour },
    })))
}

pub async fn create_tour(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, AppError> {
    let body = json_body(body)?;
    let store = state.store.clone();
    let tour = blocking(move || store.create(body)).await?;
    info!(id = %tour.id, name = %tour.name, "tour created");

    Ok(Json(json!({
        "status": "success",
        "data": { "tour": tour },
    })))
}

pub async fn update_tour(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_param(id)?;
    let patch = json_body(body)?;
    let store = state.store.clone();
    let tour = blocking(move || store.update_by_id(&id, patch)).await?.ok_or_else(AppError::tour_not_found)?;
    info!(id = %tour.id, "tour updated");

    Ok(Json(json!({
        "status": "success",
        "data": { "tour": tour },
    })))
}

pub async fn delete_tour(State(state): State<AppState>, id: Result<Path<String>, PathRejection>) -> Result<StatusCode, AppError> {
    let id = path_param(id)?;
    let store = state.store.clone();
    let removed = blocking(move || store.delete_by_id(&id)).await?.ok_or_else(AppError::tour_not_found)?;
    info!(id = %removed.id, "tour deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_tour_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let stats = blocking(move || store.tour_stats()).await?;
    debug!(groups = stats.len(), "tour stats");

    Ok(Json(json!({
        "status": "success",
        "data": { "stats": stats },
    })))
}

pub async fn get_monthly_plan(State(state): State<AppState>, year: Result<Path<String>, PathRejection>) -> Result<Json<Value>, AppError> {
    let year = path_param(year)?;
    let year: i32 = year.trim().parse().map_err(|_| AppError::BadRequest(format!("Invalid year: {year}.")))?;
    let store = state.store.clone();
    let plan = blocking(move || store.monthly_plan(year)).await?;
    debug!(year, months = plan.len(), "monthly plan");

    Ok(Json(json!({
        "status": "success",
        "data": { "plan": plan },
    })))
}
