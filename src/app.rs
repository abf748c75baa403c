//! HTTP API

use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::dataset::Dataset;
use crate::error::AnalyticsError;
use crate::metrics;
use crate::models;
use crate::operation::Operation;
use crate::operations::{
    self, RankingParams, RegionParams, RegionRow, SummaryParams, TrendParams, TrendPoint,
};
use crate::store::DatasetMeta;
use crate::types::Frequency;
use crate::validated::{ValidatedJson, ValidatedQuery};

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower::Layer;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Name of the multipart field holding an uploaded CSV file.
const UPLOAD_FIELD: &str = "file";

/// Column used by the map endpoint when the requested metric is absent.
const FALLBACK_METRIC_COLUMN: &str = "value";

/// Application service: the router with trailing slashes removed from request paths.
pub type Service = NormalizePath<Router>;

/// Initialise the application.
pub fn init(args: &CommandLineArgs) {
    if args.use_rayon {
        tracing::info!("running analytics on the Rayon thread pool");
    }
}

/// Returns a [axum::Router] for the geo analytics API.
///
/// The router is populated with all routes as well as the following middleware:
///
/// * a [tower_http::request_id::SetRequestIdLayer] giving every request an `x-request-id`
/// * a [tower_http::trace::TraceLayer] for tracing requests and responses, which also feeds the
///   Prometheus metrics
/// * a [tower_http::request_id::PropagateRequestIdLayer] copying the request ID to the response
/// * a [tower_http::cors::CorsLayer] allowing the configured origins
/// * a [axum::extract::DefaultBodyLimit] capping upload sizes
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn router(args: &CommandLineArgs) -> Router {
    let state: SharedAppState = Arc::new(AppState::new(args));

    fn api() -> Router<SharedAppState> {
        Router::new()
            .route("/health", get(health))
            .route("/datasets", get(list_datasets))
            .route("/datasets/json", post(ingest_json))
            .route("/datasets/csv", post(ingest_csv))
            .route("/datasets/:dataset_id/schema", get(schema))
            .route("/datasets/:dataset_id/preview", get(preview))
            .route("/regions", get(map_regions))
            .route("/analytics/regions", get(regions))
            .route("/analytics/rankings", get(rankings))
            .route("/analytics/trends", get(trends))
            .route("/analytics/executive-summary", get(executive_summary))
    }

    Router::new()
        .nest("/api", api())
        .route("/metrics", get(metrics::metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .on_request(metrics::request_counter)
                        .on_response(metrics::record_response_metrics),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors(&args.allowed_origins))
                .layer(DefaultBodyLimit::max(args.max_upload_size)),
        )
        .with_state(state)
}

/// Returns a [crate::app::Service] for the geo analytics API.
///
/// The service is populated with all routes as well as the following middleware:
///
/// * a [tower_http::normalize_path::NormalizePathLayer] for trimming trailing slashes from
///   requests
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn service(args: &CommandLineArgs) -> Service {
    // Note that any middleware that should affect routing must wrap the router.
    // See
    // https://docs.rs/axum/0.6.12/axum/middleware/index.html#rewriting-request-uri-in-middleware.
    NormalizePathLayer::trim_trailing_slash().layer(router(args))
}

/// Build the CORS layer.
///
/// An origin of `*` allows any origin. Origins that are not valid header values are skipped.
fn cors(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|origin| origin.trim() == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Run an operation on a dataset.
///
/// The operation runs on the Rayon thread pool when enabled, keeping CPU-bound work off the async
/// runtime.
async fn run_operation<O: Operation + 'static>(
    state: &AppState,
    dataset: Arc<Dataset>,
    params: O::Params,
) -> Result<O::Output, AnalyticsError> {
    if state.args.use_rayon {
        tokio_rayon::spawn(move || O::execute(&dataset, &params)).await
    } else {
        O::execute(&dataset, &params)
    }
}

async fn health() -> Json<models::Health> {
    Json(models::Health { status: "ok" })
}

async fn list_datasets(State(state): State<SharedAppState>) -> Json<Vec<DatasetMeta>> {
    Json(state.store.list())
}

async fn schema(
    State(state): State<SharedAppState>,
    Path(dataset_id): Path<String>,
) -> Result<Json<models::Schema>, AnalyticsError> {
    let dataset = state.store.get(&dataset_id)?;
    Ok(Json(models::Schema {
        dataset_id,
        columns: dataset.columns().to_vec(),
        rows: dataset.num_rows(),
    }))
}

async fn preview(
    State(state): State<SharedAppState>,
    Path(dataset_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<models::PreviewQuery>,
) -> Result<Response, AnalyticsError> {
    let dataset = state.store.get(&dataset_id)?;
    let preview = models::Preview {
        rows: dataset.num_rows(),
        preview: dataset.head(query.limit),
        dataset_id,
    };
    Ok(Json(preview).into_response())
}

async fn ingest_json(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<models::NameQuery>,
    ValidatedJson(records): ValidatedJson<models::Records>,
) -> Result<Json<DatasetMeta>, AnalyticsError> {
    let meta = state
        .store
        .put_records(records.records, query.name.as_deref())?;
    Ok(Json(meta))
}

async fn ingest_csv(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<models::NameQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DatasetMeta>, AnalyticsError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_lowercase().ends_with(".csv") {
            return Err(AnalyticsError::InvalidUpload {
                reason: "upload a .csv file".to_string(),
            });
        }
        let data = field.bytes().await?;
        let dataset = Dataset::from_csv(data.as_ref())?;
        let name = query.name.unwrap_or(filename);
        return Ok(Json(state.store.put(dataset, Some(&name))));
    }
    Err(AnalyticsError::InvalidUpload {
        reason: format!("missing multipart field '{}'", UPLOAD_FIELD),
    })
}

async fn map_regions(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<models::MapQuery>,
) -> Result<Json<Vec<models::MapRegion>>, AnalyticsError> {
    let dataset = state.store.get(&query.dataset_id)?;
    let value_col = if dataset.has_column(&query.metric) {
        query.metric.as_str()
    } else if dataset.has_column(FALLBACK_METRIC_COLUMN) {
        FALLBACK_METRIC_COLUMN
    } else {
        return Err(AnalyticsError::MetricNotFound {
            metric: query.metric.clone(),
            available: dataset.columns().to_vec(),
        });
    };
    let params = RegionParams::new(&query.region_col, value_col, query.agg)
        .with_coordinates(&query.lat_col, &query.lon_col);
    let rows: Vec<RegionRow> =
        run_operation::<operations::Regions>(&state, dataset, params).await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| models::MapRegion::new(row, &query.metric))
            .collect(),
    ))
}

async fn regions(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<models::RegionsQuery>,
) -> Result<Json<models::RegionsResponse>, AnalyticsError> {
    let dataset = state.store.get(&query.dataset_id)?;
    let params = RegionParams::new(&query.region_col, &query.value_col, query.agg);
    let regions = run_operation::<operations::Regions>(&state, dataset, params).await?;
    Ok(Json(models::RegionsResponse {
        dataset_id: query.dataset_id,
        value_col: query.value_col,
        agg: query.agg,
        regions,
    }))
}

async fn rankings(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<models::RankingsQuery>,
) -> Result<Json<models::RankingsResponse>, AnalyticsError> {
    let dataset = state.store.get(&query.dataset_id)?;
    let params = RankingParams {
        region: RegionParams::new(&query.region_col, &query.value_col, query.agg),
        top_n: query.top_n,
    };
    let ranked = run_operation::<operations::Rankings>(&state, dataset, params).await?;
    Ok(Json(models::RankingsResponse {
        dataset_id: query.dataset_id,
        value_col: query.value_col,
        agg: query.agg,
        top_n: query.top_n,
        top: ranked.top,
        bottom: ranked.bottom,
    }))
}

async fn trends(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<models::TrendsQuery>,
) -> Result<Json<models::TrendsResponse>, AnalyticsError> {
    let dataset = state.store.get(&query.dataset_id)?;
    let freq: Frequency = query.freq.parse()?;
    let params = TrendParams {
        date_col: query.date_col,
        region_col: query.region_col,
        value_col: query.value_col.clone(),
        agg: query.agg,
        freq,
    };
    let series: Vec<TrendPoint> =
        run_operation::<operations::Trends>(&state, dataset, params).await?;
    Ok(Json(models::TrendsResponse {
        dataset_id: query.dataset_id,
        value_col: query.value_col,
        agg: query.agg,
        freq: query.freq,
        series,
    }))
}

async fn executive_summary(
    State(state): State<SharedAppState>,
    ValidatedQuery(query): ValidatedQuery<models::SummaryQuery>,
) -> Result<Json<models::SummaryResponse>, AnalyticsError> {
    let dataset = state.store.get(&query.dataset_id)?;
    let params = SummaryParams {
        metric: query.metric,
        region: RegionParams::new(&query.region_col, &query.value_col, query.agg),
        top_n: query.top_n,
    };
    let summary = run_operation::<operations::ExecutiveSummary>(&state, dataset, params).await?;
    Ok(Json(models::SummaryResponse {
        summary,
        dataset_id: query.dataset_id,
    }))
}
