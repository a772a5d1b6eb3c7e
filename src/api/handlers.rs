//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::types::*;
use crate::core::{Analysis, ContractAnalyzer};
use crate::models::{
    AppError, AppResult, ChainId, RiskLevel, RiskReport, ScannerConfig, ScoringConfig,
};
use crate::providers::{EtherscanClient, SourceProvider};
use crate::utils::constants::{APP_VERSION, MAX_BATCH_CONCURRENCY, MAX_BATCH_SIZE};
use crate::utils::telemetry::ScanTelemetry;

/// Builds the source provider for a chain
pub type ProviderFactory =
    Arc<dyn Fn(ChainId) -> AppResult<Arc<dyn SourceProvider>> + Send + Sync>;

pub type SharedAnalyzer = ContractAnalyzer<Arc<dyn SourceProvider>>;

/// Shared application state
pub struct AppState {
    pub scoring: Arc<ScoringConfig>,
    pub telemetry: Arc<ScanTelemetry>,
    pub start_time: Instant,
    /// One provider per chain, created on first use
    providers: DashMap<ChainId, Arc<dyn SourceProvider>>,
    factory: ProviderFactory,
}

impl AppState {
    /// State backed by Etherscan V2 clients
    pub fn new(
        scanner: ScannerConfig,
        scoring: ScoringConfig,
        telemetry: Arc<ScanTelemetry>,
    ) -> Self {
        let factory: ProviderFactory =
            Arc::new(move |chain: ChainId| -> AppResult<Arc<dyn SourceProvider>> {
                let client = EtherscanClient::new(chain, &scanner)?;
                Ok(Arc::new(client) as Arc<dyn SourceProvider>)
            });
        Self::with_provider_factory(scoring, telemetry, factory)
    }

    pub fn with_provider_factory(
        scoring: ScoringConfig,
        telemetry: Arc<ScanTelemetry>,
        factory: ProviderFactory,
    ) -> Self {
        Self {
            scoring: Arc::new(scoring),
            telemetry,
            start_time: Instant::now(),
            providers: DashMap::new(),
            factory,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Analyzer for `chain`, reusing the chain's provider
    pub fn analyzer(&self, chain: ChainId) -> AppResult<SharedAnalyzer> {
        let provider = match self.providers.get(&chain) {
            Some(provider) => provider.value().clone(),
            None => {
                let provider = (self.factory)(chain)?;
                info!("🔌 Source provider ready for {} ({})", chain.name(), provider.name());
                self.providers.insert(chain, provider.clone());
                provider
            }
        };
        Ok(ContractAnalyzer::new(provider, self.scoring.clone()))
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn status_of(err: &AppError) -> StatusCode {
    StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();
    Json(ApiResponse::success(
        HealthData {
            status: "healthy".to_string(),
            version: APP_VERSION.to_string(),
            uptime_seconds: state.uptime_seconds(),
        },
        elapsed_ms(start),
    ))
}

// ============================================
// Single Analysis
// ============================================

/// `POST /analyze`: plain report on success, `{detail}` on failure
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<RiskReport>, (StatusCode, Json<ErrorDetail>)> {
    let Json(req) = body.map_err(|rejection| {
        state.telemetry.record_rejected();
        warn!("Malformed analyze request: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorDetail {
                detail: rejection.body_text(),
            }),
        )
    })?;

    let result: AppResult<Analysis> = async {
        let chain = ChainId::resolve(req.chain.as_deref())?;
        state.analyzer(chain)?.analyze_detailed(&req.address).await
    }
    .await;

    match result {
        Ok(analysis) => {
            state.telemetry.record(&analysis);
            Ok(Json(analysis.report))
        }
        Err(e) if e.is_client_error() => {
            state.telemetry.record_rejected();
            warn!(code = e.code_str(), "Rejected analyze request: {}", e.message);
            Err((status_of(&e), Json(ErrorDetail { detail: e.message })))
        }
        Err(e) => {
            error!(code = e.code_str(), "Analyze request failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorDetail {
                    detail: format!("Internal error: {}", e.message),
                }),
            ))
        }
    }
}

// ============================================
// Batch Analysis
// ============================================

pub async fn batch_analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchAnalyzeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BatchAnalyzeData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();
    let reject = |status: StatusCode, error: ApiError| {
        (status, Json(ApiResponse::error(error, elapsed_ms(start))))
    };

    let Json(req) = body.map_err(|rejection| {
        state.telemetry.record_rejected();
        reject(
            StatusCode::BAD_REQUEST,
            ApiError::bad_request(rejection.body_text()),
        )
    })?;

    if req.addresses.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            ApiError::bad_request("addresses array cannot be empty"),
        ));
    }

    if req.addresses.len() > MAX_BATCH_SIZE {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            ApiError::bad_request(format!(
                "Maximum {} addresses per batch request",
                MAX_BATCH_SIZE
            )),
        ));
    }

    let chain = ChainId::resolve(req.chain.as_deref())
        .map_err(|e| reject(status_of(&e), ApiError::from(&e)))?;
    let analyzer = Arc::new(
        state
            .analyzer(chain)
            .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, ApiError::from(&e)))?,
    );

    let concurrency = req.concurrency.clamp(1, MAX_BATCH_CONCURRENCY);
    info!(
        "📦 Batch of {} addresses on {} (concurrency {})",
        req.addresses.len(),
        chain.name(),
        concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(req.addresses.len());

    for address in req.addresses.iter().cloned() {
        let sem = semaphore.clone();
        let analyzer = analyzer.clone();
        let task_address = address.clone();

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            let item_start = Instant::now();
            let outcome = analyzer.analyze_detailed(&task_address).await;
            (outcome, elapsed_ms(item_start))
        });
        handles.push((address, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (address, handle) in handles {
        let item = match handle.await {
            Ok((Ok(analysis), latency_ms)) => {
                state.telemetry.record(&analysis);
                BatchItemResult {
                    address,
                    status: "success".to_string(),
                    report: Some(analysis.report),
                    error: None,
                    latency_ms,
                }
            }
            Ok((Err(e), latency_ms)) => {
                if e.is_client_error() {
                    state.telemetry.record_rejected();
                }
                BatchItemResult {
                    address,
                    status: "error".to_string(),
                    report: None,
                    error: Some(ApiError::from(&e)),
                    latency_ms,
                }
            }
            Err(join_error) => {
                error!("Batch task for {} aborted: {}", address, join_error);
                BatchItemResult {
                    address,
                    status: "error".to_string(),
                    report: None,
                    error: Some(ApiError::from(&AppError::internal("analysis task aborted"))),
                    latency_ms: 0.0,
                }
            }
        };
        results.push(item);
    }

    let count_tier = |tier: RiskLevel| {
        results
            .iter()
            .filter(|r| r.report.as_ref().is_some_and(|report| report.risk == tier))
            .count()
    };

    let data = BatchAnalyzeData {
        chain: chain.key().to_string(),
        total_requested: req.addresses.len(),
        total_processed: results.len(),
        total_safe: count_tier(RiskLevel::Safe),
        total_medium: count_tier(RiskLevel::Medium),
        total_high: count_tier(RiskLevel::High),
        total_errors: results.iter().filter(|r| r.error.is_some()).count(),
        processing_time_ms: elapsed_ms(start),
        results,
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let stats = state.telemetry.snapshot();

    Json(ApiResponse::success(
        StatsData {
            total_analyzed: stats.total_analyzed,
            safe: stats.safe,
            medium: stats.medium,
            high: stats.high,
            unverified: stats.unverified,
            proxies_followed: stats.proxies_followed,
            rejected: stats.rejected,
            avg_latency_ms: stats.avg_latency_ms,
            uptime_seconds: state.uptime_seconds(),
            api_version: APP_VERSION.to_string(),
        },
        elapsed_ms(start),
    ))
}
