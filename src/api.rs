use crate::domain::StandingsRow;
use crate::services::league_table::{DataSource, LeagueTableService};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::backtrace::Backtrace;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const STATUS_CHECK: &str = "status-check";

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[serde(default)]
    pub force_refresh: bool,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<StandingsRow>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success(SuccessResponse),
    Failure(FailureResponse),
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl ApiResponse {
    fn success(body: SuccessResponse) -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody::Success(body),
        }
    }

    fn failure(status: StatusCode, message: &str, error: String, details: Option<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Failure(FailureResponse {
                success: false,
                message: message.to_string(),
                error,
                details,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success(_))
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn status_check() -> ApiResponse {
    ApiResponse::success(SuccessResponse {
        success: true,
        message: "League table service is running".to_string(),
        data: Vec::new(),
        last_updated: Some(Utc::now()),
        teams_count: None,
        source: None,
        warnings: Vec::new(),
        error: None,
    })
}

/// Entry point for every trigger: status check, or scrape-or-serve.
/// Errors never escape; they become a structured failure response.
pub async fn handle(service: &LeagueTableService, request: TriggerRequest) -> ApiResponse {
    match request.action.as_deref() {
        Some(STATUS_CHECK) => return status_check(),
        Some(other) => {
            return ApiResponse::failure(
                StatusCode::BAD_REQUEST,
                "Unknown action",
                format!("unsupported action '{other}'"),
                None,
            )
        }
        None => {}
    }

    let table = match service.get_league_table(request.force_refresh).await {
        Ok(table) => table,
        Err(e) => {
            error!("League table request failed: {:?}", e);
            return ApiResponse::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load league table",
                e.to_string(),
                Some(e.kind().to_string()),
            );
        }
    };

    let message = match (&table.source, &table.refresh_error) {
        (DataSource::Scrape, _) => "League table scraped successfully",
        (DataSource::Cache, Some(_)) => "Refresh failed, serving cached league table",
        (DataSource::Cache, None) => "Serving cached league table",
    };
    let teams_count = (table.source == DataSource::Scrape).then_some(table.rows.len());

    info!("{} ({} teams)", message, table.rows.len());

    ApiResponse::success(SuccessResponse {
        success: true,
        message: message.to_string(),
        data: table.rows,
        last_updated: table.last_updated,
        teams_count,
        source: Some(table.source),
        warnings: table.warnings.into_iter().map(|w| w.message).collect(),
        error: table.refresh_error,
    })
}

async fn get_league_table(
    State(service): State<Arc<LeagueTableService>>,
    Query(request): Query<TriggerRequest>,
) -> ApiResponse {
    handle(&service, request).await
}

async fn post_league_table(
    State(service): State<Arc<LeagueTableService>>,
    body: Bytes,
) -> ApiResponse {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        TriggerRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return ApiResponse::failure(
                    StatusCode::BAD_REQUEST,
                    "Invalid request body",
                    e.to_string(),
                    None,
                )
            }
        }
    };

    handle(&service, request).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Logs panics through tracing with their source location and a backtrace
/// (captured when `RUST_BACKTRACE` is set). `CatchPanicLayer` only sees the
/// payload after unwinding, so the stack has to be recorded here.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unknown location".to_string());
        error!(
            location = %location,
            backtrace = %Backtrace::capture(),
            "Panic: {}",
            describe_panic(info.payload())
        );
    }));
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = describe_panic(err.as_ref());
    error!("Panic while handling league table request: {}", details);

    ApiResponse::failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Unexpected error while loading league table",
        "panic".to_string(),
        Some(details),
    )
    .into_response()
}

pub fn router(service: Arc<LeagueTableService>) -> Router {
    Router::new()
        .route("/league-table", get(get_league_table).post(post_league_table))
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
