// GPay Transaction Analyzer - Web Server
// Upload → classify → pie chart + drill-down, one isolated session per upload

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use gpay_analyzer::{
    analyze_bytes, render_pie_svg, to_csv_bytes, Analysis, AnalyzerConfig, AnalyzerError,
    Category, Classifier, SessionStore, Summary, TransactionDetail, TransactionRow,
    EXPORT_FILE_NAME,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const CHART_SIZE: u32 = 360;

#[derive(Parser)]
#[command(name = "gpay-server", version, about = "Web UI for the GPay transaction analyzer")]
struct Args {
    /// Membership configuration file (JSON)
    #[arg(short, long, env = "GPAY_ANALYZER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "GPAY_ANALYZER_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value_t = 10)]
    max_upload_mb: usize,
}

/// Shared application state. The configuration is read-only; every upload
/// gets its own session.
#[derive(Clone)]
struct AppState {
    config: Arc<AnalyzerConfig>,
    classifier: Arc<Classifier>,
    sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    fn new(config: AnalyzerConfig) -> Self {
        Self {
            classifier: Arc::new(config.classifier()),
            sessions: Arc::new(Mutex::new(SessionStore::new(config.max_sessions))),
            config: Arc::new(config),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn analysis(&self, session_id: &str) -> Result<Arc<Analysis>, ApiError> {
        let sessions = self.sessions();
        let session = sessions.get_by_str(session_id)?;
        let analysis = Arc::clone(&session.analysis);
        Ok(analysis)
    }

    fn currency(&self) -> &str {
        &self.config.currency_symbol
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

struct ApiError(AnalyzerError);

impl From<AnalyzerError> for ApiError {
    fn from(err: AnalyzerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AnalyzerError::UnknownColumnSet { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyzerError::SessionNotFound(_)
            | AnalyzerError::TransactionNotFound(_)
            | AnalyzerError::UnknownCategory(_) => StatusCode::NOT_FOUND,
            AnalyzerError::Csv(_) => StatusCode::BAD_REQUEST,
            AnalyzerError::Io(_) | AnalyzerError::Json(_) | AnalyzerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }

        (status, Json(ApiResponse::err(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Serialize)]
struct UploadResponse {
    session_id: String,
    summary: Summary,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/config - Membership lists in use (read-only)
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.config.as_ref().clone()))
}

/// POST /api/upload - Analyze a CSV body into a new session
async fn upload(State(state): State<AppState>, body: Bytes) -> ApiResult<UploadResponse> {
    let analysis = analyze_bytes(&body, &state.classifier)?;
    let summary = Summary::from_analysis(&analysis, state.currency());

    let session_id = state.sessions().create(analysis);
    tracing::info!(
        session = %session_id,
        bytes = body.len(),
        transactions = summary.total_transactions,
        skipped = summary.skipped_count,
        "upload analyzed"
    );

    Ok(Json(ApiResponse::ok(UploadResponse {
        session_id: session_id.to_string(),
        summary,
    })))
}

/// GET /api/sessions/:id - Pie slices, totals, skipped rows
async fn get_summary(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Summary> {
    let analysis = state.analysis(&id)?;
    Ok(Json(ApiResponse::ok(Summary::from_analysis(
        &analysis,
        state.currency(),
    ))))
}

/// GET /api/sessions/:id/categories/:category - Drill-down table
async fn get_category_rows(
    State(state): State<AppState>,
    Path((id, category)): Path<(String, String)>,
) -> ApiResult<Vec<TransactionRow>> {
    let category: Category = category.parse()?;
    let analysis = state.analysis(&id)?;

    let rows = analysis
        .rows_for_category(category)
        .iter()
        .map(|tx| TransactionRow::new(tx, state.currency()))
        .collect();

    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/sessions/:id/transactions/:line - Single transaction detail
async fn get_transaction(
    State(state): State<AppState>,
    Path((id, line)): Path<(String, usize)>,
) -> ApiResult<TransactionDetail> {
    let analysis = state.analysis(&id)?;
    let tx = analysis.transaction_at_line(line)?;

    Ok(Json(ApiResponse::ok(TransactionDetail::new(
        &analysis,
        tx,
        state.currency(),
    ))))
}

/// GET /api/sessions/:id/chart.svg - Pie chart
async fn get_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let analysis = state.analysis(&id)?;
    let summary = Summary::from_analysis(&analysis, state.currency());
    let svg = render_pie_svg(&summary.slices, CHART_SIZE, state.currency());

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// GET /api/sessions/:id/export - Classified CSV download
async fn export_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let analysis = state.analysis(&id)?;
    let body = to_csv_bytes(&analysis)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        body,
    )
        .into_response())
}

/// DELETE /api/sessions/:id - Discard an upload
async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<bool> {
    let uuid = gpay_analyzer::session::parse_session_id(&id)?;
    if state.sessions().remove(&uuid) {
        Ok(Json(ApiResponse::ok(true)))
    } else {
        Err(AnalyzerError::SessionNotFound(id).into())
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn upload_limit_bytes(max_upload_mb: usize) -> usize {
    max_upload_mb.saturating_mul(1024 * 1024)
}

fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/config", get(get_config))
        .route("/upload", post(upload))
        .route("/sessions/:id", get(get_summary).delete(delete_session))
        .route("/sessions/:id/categories/:category", get(get_category_rows))
        .route("/sessions/:id/transactions/:line", get(get_transaction))
        .route("/sessions/:id/chart.svg", get(get_chart))
        .route("/sessions/:id/export", get(export_csv))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;

    gpay_analyzer::init_logging("info");
    let args = Args::parse();

    println!("🌐 GPay Transaction Analyzer - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AnalyzerConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    println!(
        "✓ Membership: {} merchants, {} friends ({:?} matching)",
        config.merchants.len(),
        config.friends.len(),
        config.match_mode
    );
    for name in config.overlapping_names() {
        tracing::warn!(account = %name, precedence = ?config.precedence, "name listed as both merchant and friend");
    }

    let app = build_router(AppState::new(config), upload_limit_bytes(args.max_upload_mb));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    println!("\n🚀 Server running on http://{}", args.bind);
    println!("   UI:  http://{}/", args.bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
