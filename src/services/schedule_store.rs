//! Persistence for sync schedules.
//!
//! The scheduler and the admin handlers only see the [`ScheduleStore`] trait;
//! [`DbScheduleStore`] is the SeaORM implementation used in production. No
//! transactional guarantees beyond last-write-wins per field, except for
//! [`ScheduleStore::claim_for_run`], which is a single conditional update.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::prelude::SyncSchedules;
use crate::entities::sync_schedules::{self, Model};
use crate::models::sync_types::RunResult;

#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Database(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "schedule not found"),
            StoreError::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Fields for a new schedule. `next_run` is computed by the caller (the
/// create handler uses the frequency table, bulk-create staggers from now).
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: String,
    pub sync_type: String,
    pub is_enabled: bool,
    pub frequency: String,
    pub next_run: Option<NaiveDateTime>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub sync_type: Option<String>,
    pub is_enabled: Option<bool>,
    pub frequency: Option<String>,
    pub next_run: Option<NaiveDateTime>,
}

impl SchedulePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sync_type.is_none()
            && self.is_enabled.is_none()
            && self.frequency.is_none()
            && self.next_run.is_none()
    }
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_schedules(&self) -> Result<Vec<Model>, StoreError>;

    async fn get_schedule(&self, id: i32) -> Result<Option<Model>, StoreError>;

    async fn create_schedule(&self, data: NewSchedule) -> Result<Model, StoreError>;

    /// Applies a partial update. Fails with [`StoreError::NotFound`] for an
    /// unknown id.
    async fn update_schedule(&self, id: i32, patch: SchedulePatch) -> Result<Model, StoreError>;

    /// Hard delete. Fails with [`StoreError::NotFound`] for an unknown id.
    async fn delete_schedule(&self, id: i32) -> Result<(), StoreError>;

    /// Atomically claims a schedule for execution: marks it `pending`, stamps
    /// `last_run = now` and increments `run_count`, but only if the row is
    /// enabled, due at `now` and not already pending. Returns whether the
    /// claim succeeded, so concurrent claimers (a second tick, or another
    /// process pointed at the same database) get `false` instead of a
    /// duplicate run.
    async fn claim_for_run(&self, id: i32, now: NaiveDateTime) -> Result<bool, StoreError>;

    /// Records the outcome of a claimed run: sets `last_result`, the freshly
    /// recomputed `next_run`, and `last_error` (cleared on success).
    async fn record_outcome(
        &self,
        id: i32,
        result: RunResult,
        next_run: NaiveDateTime,
        last_error: Option<String>,
    ) -> Result<(), StoreError>;
}

pub struct DbScheduleStore {
    db: DatabaseConnection,
}

impl DbScheduleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScheduleStore for DbScheduleStore {
    async fn list_schedules(&self) -> Result<Vec<Model>, StoreError> {
        Ok(SyncSchedules::find()
            .order_by_asc(sync_schedules::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn get_schedule(&self, id: i32) -> Result<Option<Model>, StoreError> {
        Ok(SyncSchedules::find_by_id(id).one(&self.db).await?)
    }

    async fn create_schedule(&self, data: NewSchedule) -> Result<Model, StoreError> {
        let new_record = sync_schedules::ActiveModel {
            name: Set(data.name),
            sync_type: Set(data.sync_type),
            is_enabled: Set(data.is_enabled),
            frequency: Set(data.frequency),
            next_run: Set(data.next_run),
            last_run: Set(None),
            last_result: Set(None),
            last_error: Set(None),
            run_count: Set(0),
            ..Default::default()
        };
        Ok(new_record.insert(&self.db).await?)
    }

    async fn update_schedule(&self, id: i32, patch: SchedulePatch) -> Result<Model, StoreError> {
        let existing = SyncSchedules::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound)?;

        if patch.is_empty() {
            return Ok(existing);
        }

        let mut active_model: sync_schedules::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active_model.name = Set(name);
        }
        if let Some(sync_type) = patch.sync_type {
            active_model.sync_type = Set(sync_type);
        }
        if let Some(is_enabled) = patch.is_enabled {
            active_model.is_enabled = Set(is_enabled);
        }
        if let Some(frequency) = patch.frequency {
            active_model.frequency = Set(frequency);
        }
        if let Some(next_run) = patch.next_run {
            active_model.next_run = Set(Some(next_run));
        }
        Ok(active_model.update(&self.db).await?)
    }

    async fn delete_schedule(&self, id: i32) -> Result<(), StoreError> {
        let result = SyncSchedules::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn claim_for_run(&self, id: i32, now: NaiveDateTime) -> Result<bool, StoreError> {
        let result = SyncSchedules::update_many()
            .col_expr(
                sync_schedules::Column::LastResult,
                Expr::value(RunResult::Pending.as_str()),
            )
            .col_expr(sync_schedules::Column::LastRun, Expr::value(now))
            .col_expr(
                sync_schedules::Column::RunCount,
                Expr::col(sync_schedules::Column::RunCount).add(1),
            )
            .filter(sync_schedules::Column::Id.eq(id))
            .filter(sync_schedules::Column::IsEnabled.eq(true))
            .filter(sync_schedules::Column::NextRun.is_not_null())
            .filter(sync_schedules::Column::NextRun.lte(now))
            .filter(
                Condition::any()
                    .add(sync_schedules::Column::LastResult.is_null())
                    .add(sync_schedules::Column::LastResult.ne(RunResult::Pending.as_str())),
            )
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn record_outcome(
        &self,
        id: i32,
        result: RunResult,
        next_run: NaiveDateTime,
        last_error: Option<String>,
    ) -> Result<(), StoreError> {
        let update = SyncSchedules::update_many()
            .col_expr(
                sync_schedules::Column::LastResult,
                Expr::value(result.as_str()),
            )
            .col_expr(sync_schedules::Column::NextRun, Expr::value(next_run))
            .col_expr(sync_schedules::Column::LastError, Expr::value(last_error))
            .filter(sync_schedules::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if update.rows_affected == 0 {
            // Deleted while running; nothing left to record against.
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
