use crate::api::api_error::APIError;
use crate::api::model::{CreateRecordRequest, DeleteRecordsResult, EvictResult, UpdateTtlRequest};
use crate::api::server::AppState;
use crate::error::Error;
use crate::record::{normalize_domain, normalize_qtype, StoredRecord};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/records", get(list_records).post(create_record))
        .route(
            "/records/:domain/:qtype",
            put(update_record_ttl).delete(delete_records),
        )
        .route("/cache/:domain/:qtype", post(warm_cache).delete(evict_cache))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

fn pair((domain, qtype): (String, String)) -> (String, String) {
    (normalize_domain(&domain), normalize_qtype(&qtype))
}

/// Rewrite the cache entry for a pair, but only if one is live. Failures are logged.
async fn refresh_cached(state: &AppState, domain: &str, qtype: &str) {
    match state.cache.contains(domain, qtype).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(err) => {
            tracing::warn!("failed to check cache for {qtype} {domain}: {err}");
            return;
        }
    }
    let refreshed = match state.store.lookup(domain, qtype).await {
        Ok(records) => state.cache.put_records(domain, qtype, &records).await,
        Err(err) => Err(err),
    };
    if let Err(err) = refreshed {
        tracing::warn!("failed to refresh cache for {qtype} {domain}: {err}");
    }
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<StoredRecord>>, APIError> {
    Ok(Json(state.store.scan_all().await?))
}

async fn create_record(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateRecordRequest>, APIError>,
) -> Result<(StatusCode, Json<StoredRecord>), APIError> {
    let record = payload.into_record();
    record.validate()?;
    state.store.upsert(&record).await?;
    tracing::info!(
        "stored {} {} {} (ttl {})",
        record.qtype,
        record.domain,
        record.value,
        record.ttl
    );
    refresh_cached(&state, &record.domain, &record.qtype).await;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_record_ttl(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateTtlRequest>, APIError>,
) -> Result<Json<Vec<StoredRecord>>, APIError> {
    let (domain, qtype) = pair(path);
    let records = state.store.lookup(&domain, &qtype).await?;
    if records.is_empty() {
        return Err(Error::RecordNotFound(domain, qtype).into());
    }

    let mut updated = Vec::with_capacity(records.len());
    for mut record in records {
        record.ttl = payload.ttl;
        state.store.upsert(&record).await?;
        updated.push(record);
    }
    tracing::info!("set ttl {} on {qtype} {domain}", payload.ttl);
    refresh_cached(&state, &domain, &qtype).await;
    Ok(Json(updated))
}

async fn delete_records(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
) -> Result<Json<DeleteRecordsResult>, APIError> {
    let (domain, qtype) = pair(path);
    let deleted = state.store.delete(&domain, &qtype).await?;
    state.cache.evict(&domain, &qtype).await?;
    tracing::info!("deleted {deleted} {qtype} records for {domain}");
    Ok(Json(DeleteRecordsResult { deleted }))
}

async fn warm_cache(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
) -> Result<Json<Vec<StoredRecord>>, APIError> {
    let (domain, qtype) = pair(path);
    let records = state.store.lookup(&domain, &qtype).await?;
    if records.is_empty() {
        return Err(Error::RecordNotFound(domain, qtype).into());
    }
    state.cache.put_records(&domain, &qtype, &records).await?;
    tracing::info!("cached {qtype} {domain}");
    Ok(Json(records))
}

async fn evict_cache(
    State(state): State<AppState>,
    Path(path): Path<(String, String)>,
) -> Result<Json<EvictResult>, APIError> {
    let (domain, qtype) = pair(path);
    let evicted = state.cache.evict(&domain, &qtype).await?;
    Ok(Json(EvictResult { evicted }))
}
