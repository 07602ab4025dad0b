//! Request/response models for the admin sync-schedule endpoints.
//!
//! Bodies use camelCase field names to match the web app's JSON convention.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::sync_schedules;

/// Body of POST /api/admin/sync/schedules
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub name: String,
    pub sync_type: String,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    pub frequency: String,
}

fn default_enabled() -> bool {
    true
}

/// Body of PUT /api/admin/sync/schedules/{id}; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub sync_type: Option<String>,
    pub is_enabled: Option<bool>,
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: i32,
    pub name: String,
    pub sync_type: String,
    pub is_enabled: bool,
    pub frequency: String,
    pub next_run: Option<NaiveDateTime>,
    pub last_run: Option<NaiveDateTime>,
    pub last_result: Option<String>,
    pub last_error: Option<String>,
    pub run_count: i64,
}

impl From<sync_schedules::Model> for ScheduleResponse {
    fn from(model: sync_schedules::Model) -> Self {
        ScheduleResponse {
            id: model.id,
            name: model.name,
            sync_type: model.sync_type,
            is_enabled: model.is_enabled,
            frequency: model.frequency,
            next_run: model.next_run,
            last_run: model.last_run,
            last_result: model.last_result,
            last_error: model.last_error,
            run_count: model.run_count,
        }
    }
}

/// Error body: `{message}` plus a per-field map for validation failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(rename = "fieldErrors", skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn with_fields(message: impl Into<String>, field_errors: BTreeMap<String, String>) -> Self {
        ErrorResponse {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }
}
