use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::AppConfig,
    dataset::{DatasetStore, StoredDataset, ensure_json_filename},
    error::ServiceError,
    model::TextGenerator,
    params::{GenerationParameters, ParameterStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub parameters: Arc<ParameterStore>,
    pub datasets: Arc<DatasetStore>,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            parameters: Arc::new(ParameterStore::default()),
            datasets: Arc::new(DatasetStore::new(config.upload_dir.clone())),
            generator,
            config,
        }
    }
}

/// JSON extractor whose rejections render as `ServiceError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
struct ApiJson<T>(T);

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct UpdateResponse {
    message: &'static str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct FineTuneResponse {
    message: &'static str,
    dataset: StoredDataset,
    parameters: GenerationParameters,
}

pub fn build_router(config: Arc<AppConfig>, generator: Arc<dyn TextGenerator>) -> Router {
    router(AppState::new(config, generator))
}

pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .route("/parameters", get(current_parameters))
        .route("/chat", post(chat))
        .route("/update-parameters", post(update_parameters))
        .route("/fine-tune", post(fine_tune).layer(upload_limit))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn current_parameters(State(state): State<AppState>) -> Json<GenerationParameters> {
    Json(state.parameters.get())
}

async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ServiceError> {
    if request.message.is_empty() {
        return Err(ServiceError::BadRequest("message must not be empty".into()));
    }

    let params = state.parameters.get();
    let timeout = state.config.request_timeout;
    let response = tokio::time::timeout(
        timeout,
        state.generator.generate(&request.message, &params),
    )
    .await
    .map_err(|_| ServiceError::Timeout(timeout))??;

    Ok(Json(ChatResponse { response }))
}

async fn update_parameters(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<GenerationParameters>,
) -> Json<UpdateResponse> {
    state.parameters.replace(params);
    info!(?params, "generation parameters replaced");

    Json(UpdateResponse {
        message: "Parameters updated successfully",
        parameters: params,
    })
}

async fn fine_tune(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FineTuneResponse>, ServiceError> {
    let mut multipart = multipart?;
    let limit = state.config.max_upload_bytes;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::from_multipart(e, limit))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        ensure_json_filename(&file_name)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::from_multipart(e, limit))?;
        upload = Some((file_name, bytes));
        break;
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| ServiceError::BadRequest("no file found in upload".into()))?;

    let dataset = state.datasets.save(&bytes, &file_name).await?;
    state.datasets.validate(&dataset).await?;

    // Simulated tuning: dataset content does not influence the result.
    let parameters = state.parameters.apply_fine_tune_overrides();
    info!(
        dataset_id = %dataset.id,
        original_name = %dataset.original_name,
        size_bytes = dataset.size_bytes,
        ?parameters,
        "fine-tuning simulation applied"
    );

    Ok(Json(FineTuneResponse {
        message: "Fine-tuning simulation completed successfully",
        dataset,
        parameters,
    }))
}
