//! HTTP endpoint handlers
//!
//! Each handler unwraps the request, calls the matching command and wraps the
//! result in an `ApiResponse`. Errors map to status codes via `AppError`.

use crate::api::types::{ApiResponse, Empty, QuotesQuery};
use crate::cache::CacheEntry;
use crate::commands::widgets::{AddWidgetRequest, MoveWidgetRequest, UpdateWidgetRequest};
use crate::commands::{dashboard, market, widgets};
use crate::error::Result;
use crate::market::types::{DailyBar, Quote};
use crate::state::AppState;
use crate::views::{DashboardView, ViewQuery, WidgetView};
use crate::widgets::{Widget, WidgetTemplate};
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use std::sync::Arc;

type ApiResult<T> = Result<Json<ApiResponse<T>>>;

fn ok<T: serde::Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success_with_data(data)))
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::<Empty>::success_with_message("FinBoard API is running"))
}

// ============================================================================
// Widgets
// ============================================================================

pub async fn list_widget_types() -> ApiResult<Vec<WidgetTemplate>> {
    ok(widgets::get_widget_types())
}

pub async fn list_widgets(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Widget>> {
    ok(widgets::list_widgets(&state))
}

pub async fn add_widget(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddWidgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Widget>>)> {
    let widget = widgets::add_widget(&state, request)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success_with_data(widget))))
}

pub async fn update_widget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateWidgetRequest>,
) -> ApiResult<Widget> {
    ok(widgets::update_widget(&state, &id, request)?)
}

pub async fn delete_widget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Widget> {
    ok(widgets::remove_widget(&state, &id)?)
}

pub async fn reorder_widgets(
    State(state): State<Arc<AppState>>,
    Json(order): Json<Vec<Widget>>,
) -> ApiResult<Vec<Widget>> {
    ok(widgets::reorder_widgets(&state, order))
}

pub async fn move_widget(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveWidgetRequest>,
) -> ApiResult<Vec<Widget>> {
    ok(widgets::move_widget(&state, request)?)
}

pub async fn refresh_widget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Empty> {
    widgets::refresh_widget(&state, &id)?;
    Ok(Json(ApiResponse::success_with_message("Refresh started")))
}

pub async fn snapshot_widget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Widget> {
    ok(widgets::snapshot_widget(&state, &id).await?)
}

// ============================================================================
// Views
// ============================================================================

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> ApiResult<DashboardView> {
    ok(market::get_dashboard(&state))
}

pub async fn get_widget_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<WidgetView> {
    ok(market::get_widget_view(&state, &id, &query)?)
}

// ============================================================================
// Market data
// ============================================================================

pub async fn get_quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuotesQuery>,
) -> ApiResult<CacheEntry<Quote>> {
    ok(market::get_quotes(&state, &query.symbols)?)
}

pub async fn get_gainers(State(state): State<Arc<AppState>>) -> ApiResult<CacheEntry<Quote>> {
    ok(market::get_gainers(&state))
}

pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<CacheEntry<DailyBar>> {
    ok(market::get_chart(&state, &symbol))
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> ApiResult<Empty> {
    market::clear_cache(&state);
    Ok(Json(ApiResponse::success_with_message("Cache cleared")))
}

pub async fn clear_errors(State(state): State<Arc<AppState>>) -> ApiResult<Empty> {
    market::clear_errors(&state);
    Ok(Json(ApiResponse::success()))
}

// ============================================================================
// Export / Import
// ============================================================================

pub async fn export_config(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let body = dashboard::export_json(&state)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        dashboard::export_file_name(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub async fn import_config(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Vec<Widget>> {
    ok(dashboard::import_dashboard(&state, &body)?)
}
