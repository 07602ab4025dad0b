//! Admin CRUD endpoints for sync schedules.
//!
//! All routes require the admin API key in the `X-API-Key` header. Bodies
//! and responses are JSON; errors carry a `{message}` body (plus
//! `fieldErrors` for validation failures).

use axum::{
    extract::{Path, State},
    http::{header::HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::models::sync_schedule::{
    CreateScheduleRequest, ErrorResponse, ScheduleResponse, UpdateScheduleRequest,
};
use crate::models::sync_types::{calculate_next_run, Frequency, SyncType};
use crate::services::schedule_store::{NewSchedule, SchedulePatch, StoreError};
use crate::AppState;

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Admin sync-schedule routes, without middleware layers or state.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/sync/schedules",
            get(list_schedules).post(create_schedule),
        )
        .route(
            "/api/admin/sync/schedules/bulk-twice-daily",
            post(bulk_create_twice_daily),
        )
        .route(
            "/api/admin/sync/schedules/{id}",
            get(get_schedule)
                .put(update_schedule)
                .delete(delete_schedule),
        )
}

/// GET /api/admin/sync/schedules
pub async fn list_schedules(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ScheduleResponse>>, HandlerError> {
    check_admin_auth(&state, &headers)?;

    let schedules = state
        .store
        .list_schedules()
        .await
        .map_err(|err| internal_error("list sync schedules", err))?;

    Ok(Json(
        schedules.into_iter().map(ScheduleResponse::from).collect(),
    ))
}

/// GET /api/admin/sync/schedules/{id}
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ScheduleResponse>, HandlerError> {
    check_admin_auth(&state, &headers)?;

    match state.store.get_schedule(id).await {
        Ok(Some(schedule)) => Ok(Json(schedule.into())),
        Ok(None) => Err(not_found(id)),
        Err(err) => Err(internal_error("fetch sync schedule", err)),
    }
}

/// POST /api/admin/sync/schedules
///
/// The initial `next_run` is computed server-side from the frequency table,
/// so a new hourly schedule first fires an hour from creation.
pub async fn create_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), HandlerError> {
    check_admin_auth(&state, &headers)?;

    let (sync_type, frequency) = validate_create(&req)?;
    let next_run = calculate_next_run(frequency.as_str(), Utc::now().naive_utc());

    let created = state
        .store
        .create_schedule(NewSchedule {
            name: req.name.trim().to_string(),
            sync_type: sync_type.as_str().to_string(),
            is_enabled: req.is_enabled,
            frequency: frequency.as_str().to_string(),
            next_run: Some(next_run),
        })
        .await
        .map_err(|err| internal_error("create sync schedule", err))?;

    info!(
        schedule_id = created.id,
        sync_type = %created.sync_type,
        frequency = %created.frequency,
        "created sync schedule"
    );
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// PUT /api/admin/sync/schedules/{id}
///
/// Partial patch. A frequency change recomputes `next_run` immediately from
/// the same table the create path uses.
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(req): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, HandlerError> {
    check_admin_auth(&state, &headers)?;

    let mut field_errors = BTreeMap::new();

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            field_errors.insert("name".to_string(), "name must not be empty".to_string());
        }
    }
    let sync_type = match &req.sync_type {
        Some(raw) => match SyncType::parse(raw) {
            Some(sync_type) => Some(sync_type),
            None => {
                field_errors.insert(
                    "syncType".to_string(),
                    format!("unknown sync type '{}'", raw),
                );
                None
            }
        },
        None => None,
    };
    let frequency = match &req.frequency {
        Some(raw) => match Frequency::parse(raw) {
            Some(frequency) => Some(frequency),
            None => {
                field_errors.insert(
                    "frequency".to_string(),
                    format!("unknown frequency '{}'", raw),
                );
                None
            }
        },
        None => None,
    };

    if !field_errors.is_empty() {
        warn!(schedule_id = id, ?field_errors, "rejected schedule update");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_fields(
                "Invalid schedule payload",
                field_errors,
            )),
        ));
    }

    let mut patch = SchedulePatch {
        name: req.name.map(|name| name.trim().to_string()),
        sync_type: sync_type.map(|sync_type| sync_type.as_str().to_string()),
        is_enabled: req.is_enabled,
        frequency: frequency.map(|frequency| frequency.as_str().to_string()),
        next_run: None,
    };
    if let Some(frequency) = frequency {
        patch.next_run = Some(calculate_next_run(
            frequency.as_str(),
            Utc::now().naive_utc(),
        ));
    }

    match state.store.update_schedule(id, patch).await {
        Ok(updated) => {
            info!(schedule_id = id, "updated sync schedule");
            Ok(Json(updated.into()))
        }
        Err(StoreError::NotFound) => Err(not_found(id)),
        Err(err) => Err(internal_error("update sync schedule", err)),
    }
}

/// DELETE /api/admin/sync/schedules/{id}
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<StatusCode, HandlerError> {
    check_admin_auth(&state, &headers)?;

    match state.store.delete_schedule(id).await {
        Ok(()) => {
            info!(schedule_id = id, "deleted sync schedule");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::NotFound) => Err(not_found(id)),
        Err(err) => Err(internal_error("delete sync schedule", err)),
    }
}

/// POST /api/admin/sync/schedules/bulk-twice-daily
///
/// Creates one twice-daily schedule per concrete sync type, staggering
/// `next_run` by 30 minutes per entry so the syncs do not all fire at once.
pub async fn bulk_create_twice_daily(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Vec<ScheduleResponse>>), HandlerError> {
    check_admin_auth(&state, &headers)?;

    let base = Utc::now().naive_utc();
    let mut created = Vec::new();
    for (index, sync_type) in SyncType::individual().into_iter().enumerate() {
        let next_run = base + Duration::minutes(30 * index as i64);
        let schedule = state
            .store
            .create_schedule(NewSchedule {
                name: format!("{} (twice daily)", sync_type.label()),
                sync_type: sync_type.as_str().to_string(),
                is_enabled: true,
                frequency: Frequency::TwiceDaily.as_str().to_string(),
                next_run: Some(next_run),
            })
            .await
            .map_err(|err| internal_error("bulk-create sync schedules", err))?;
        created.push(ScheduleResponse::from(schedule));
    }

    info!(count = created.len(), "bulk-created twice-daily sync schedules");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Check admin authentication via X-API-Key header.
fn check_admin_auth(state: &AppState, headers: &HeaderMap) -> Result<(), HandlerError> {
    if state.admin_api_key.is_empty() {
        error!("ADMIN_API_KEY not configured");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Server configuration error")),
        ));
    }

    let provided_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if provided_key != state.admin_api_key {
        warn!("rejected sync schedule request with invalid or missing API key");
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Admin access required")),
        ));
    }

    Ok(())
}

fn validate_create(req: &CreateScheduleRequest) -> Result<(SyncType, Frequency), HandlerError> {
    let mut field_errors = BTreeMap::new();

    if req.name.trim().is_empty() {
        field_errors.insert("name".to_string(), "name must not be empty".to_string());
    }
    let sync_type = SyncType::parse(&req.sync_type);
    if sync_type.is_none() {
        field_errors.insert(
            "syncType".to_string(),
            format!("unknown sync type '{}'", req.sync_type),
        );
    }
    let frequency = Frequency::parse(&req.frequency);
    if frequency.is_none() {
        field_errors.insert(
            "frequency".to_string(),
            format!("unknown frequency '{}'", req.frequency),
        );
    }

    match (sync_type, frequency) {
        (Some(sync_type), Some(frequency)) if field_errors.is_empty() => Ok((sync_type, frequency)),
        _ => {
            warn!(?field_errors, "rejected schedule creation");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_fields(
                    "Invalid schedule payload",
                    field_errors,
                )),
            ))
        }
    }
}

fn not_found(id: i32) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Schedule {} not found", id))),
    )
}

fn internal_error(context: &str, err: StoreError) -> HandlerError {
    error!("failed to {}: {}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}
