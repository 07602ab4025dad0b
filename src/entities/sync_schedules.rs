//! `SeaORM` Entity for sync_schedules table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Persisted configuration and run-state for one recurring sync job.
///
/// `sync_type` and `frequency` are stored as text so that a row carrying a
/// value this binary no longer recognizes degrades to a recorded failure
/// (or the default re-run interval) instead of failing to load.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub sync_type: String,
    pub is_enabled: bool,
    pub frequency: String,
    pub next_run: Option<DateTime>,
    pub last_run: Option<DateTime>,
    pub last_result: Option<String>,
    pub last_error: Option<String>,
    pub run_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
