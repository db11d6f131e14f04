//! The thin REST projection (spec.md §1 "Out of scope … treated as an
//! external collaborator"; §6 "Management surface … reproduced here for
//! completeness"): read-only views of the store, plus one manual
//! batch-submit POST that invokes the exact same `run_batch` the
//! scheduler calls. Grounded on `nexus-api::{lib.rs, routes::health}`.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::{get, post}, Json, Router};
use footfall_chain::ChainGateway;
use footfall_db::repository::{devices, pets, submissions};
use serde::Serialize;

#[derive(Clone)]
pub struct RestState {
    pub db: footfall_db::Database,
    pub chain: Option<Arc<ChainGateway>>,
    pub chain_deadline: Duration,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    chain_configured: bool,
}

pub fn build_router(state: RestState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/devices/{device_id}", get(get_device))
        .route("/submissions/pending", get(list_pending))
        .route("/pets/{device_id}", get(get_pet))
        .route("/batch/run", post(run_batch_now))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::compression::CompressionLayer::new())
        .with_state(Arc::new(state))
}

async fn health(State(state): State<Arc<RestState>>) -> Json<HealthResponse> {
    let db_ok = state.db.health_check().await;
    Json(HealthResponse {
        status: if db_ok { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        chain_configured: state.chain.is_some(),
    })
}

async fn get_device(
    State(state): State<Arc<RestState>>,
    axum::extract::Path(device_id): axum::extract::Path<String>,
) -> Result<Json<footfall_common::models::device::Device>, footfall_common::error::FootfallError> {
    devices::find_by_id(&state.db.pool, &device_id)
        .await?
        .map(Json)
        .ok_or(footfall_common::error::FootfallError::UnknownDevice)
}

async fn list_pending(
    State(state): State<Arc<RestState>>,
) -> Result<Json<Vec<footfall_common::models::submission::SubmissionRecord>>, footfall_common::error::FootfallError>
{
    Ok(Json(submissions::list_pending(&state.db.pool, None).await?))
}

async fn get_pet(
    State(state): State<Arc<RestState>>,
    axum::extract::Path(device_id): axum::extract::Path<String>,
) -> Result<Json<footfall_common::models::pet::PetState>, footfall_common::error::FootfallError> {
    pets::find_by_device(&state.db.pool, &device_id)
        .await?
        .map(Json)
        .ok_or(footfall_common::error::FootfallError::UnknownDevice)
}

async fn run_batch_now(
    State(state): State<Arc<RestState>>,
) -> Result<Json<footfall_batch::BatchSummary>, footfall_common::error::FootfallError> {
    let summary = footfall_batch::run_batch(&state.db.pool, state.chain.as_deref(), state.chain_deadline)
        .await
        .map_err(footfall_common::error::FootfallError::from)?;
    Ok(Json(summary))
}
