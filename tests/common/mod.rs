#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::{NaiveDateTime, Utc};

use pawsitivecheck_backend::entities::sync_schedules::Model;
use pawsitivecheck_backend::handlers::admin_sync;
use pawsitivecheck_backend::models::sync_types::{RunResult, SyncType};
use pawsitivecheck_backend::services::schedule_store::{
    NewSchedule, SchedulePatch, ScheduleStore, StoreError,
};
use pawsitivecheck_backend::services::sync_executors::{SyncError, SyncExecutor};
use pawsitivecheck_backend::AppState;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// In-memory ScheduleStore so scheduler and handler tests run without a
/// database. The claim check-and-set happens under one lock, matching the
/// conditional-update semantics of the SeaORM store.
#[derive(Default)]
pub struct InMemoryScheduleStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    schedules: Vec<Model>,
    next_id: i32,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a prebuilt schedule, assigning it the next id.
    pub fn seed(&self, mut schedule: Model) -> i32 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        schedule.id = inner.next_id;
        let id = schedule.id;
        inner.schedules.push(schedule);
        id
    }

    pub fn snapshot(&self, id: i32) -> Option<Model> {
        self.inner
            .lock()
            .unwrap()
            .schedules
            .iter()
            .find(|schedule| schedule.id == id)
            .cloned()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn list_schedules(&self) -> Result<Vec<Model>, StoreError> {
        Ok(self.inner.lock().unwrap().schedules.clone())
    }

    async fn get_schedule(&self, id: i32) -> Result<Option<Model>, StoreError> {
        Ok(self.snapshot(id))
    }

    async fn create_schedule(&self, data: NewSchedule) -> Result<Model, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let schedule = Model {
            id: inner.next_id,
            name: data.name,
            sync_type: data.sync_type,
            is_enabled: data.is_enabled,
            frequency: data.frequency,
            next_run: data.next_run,
            last_run: None,
            last_result: None,
            last_error: None,
            run_count: 0,
        };
        inner.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn update_schedule(&self, id: i32, patch: SchedulePatch) -> Result<Model, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let schedule = inner
            .schedules
            .iter_mut()
            .find(|schedule| schedule.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = patch.name {
            schedule.name = name;
        }
        if let Some(sync_type) = patch.sync_type {
            schedule.sync_type = sync_type;
        }
        if let Some(is_enabled) = patch.is_enabled {
            schedule.is_enabled = is_enabled;
        }
        if let Some(frequency) = patch.frequency {
            schedule.frequency = frequency;
        }
        if let Some(next_run) = patch.next_run {
            schedule.next_run = Some(next_run);
        }
        Ok(schedule.clone())
    }

    async fn delete_schedule(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.schedules.len();
        inner.schedules.retain(|schedule| schedule.id != id);
        if inner.schedules.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn claim_for_run(&self, id: i32, now: NaiveDateTime) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(schedule) = inner
            .schedules
            .iter_mut()
            .find(|schedule| schedule.id == id)
        else {
            return Ok(false);
        };
        let eligible = schedule.is_enabled
            && schedule.next_run.is_some_and(|next_run| next_run <= now)
            && schedule.last_result.as_deref() != Some(RunResult::Pending.as_str());
        if !eligible {
            return Ok(false);
        }
        schedule.last_result = Some(RunResult::Pending.as_str().to_string());
        schedule.last_run = Some(now);
        schedule.run_count += 1;
        Ok(true)
    }

    async fn record_outcome(
        &self,
        id: i32,
        result: RunResult,
        next_run: NaiveDateTime,
        last_error: Option<String>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let schedule = inner
            .schedules
            .iter_mut()
            .find(|schedule| schedule.id == id)
            .ok_or(StoreError::NotFound)?;
        schedule.last_result = Some(result.as_str().to_string());
        schedule.next_run = Some(next_run);
        schedule.last_error = last_error;
        Ok(())
    }
}

/// Store wrapper that injects database errors into selected operations, for
/// testing that the scheduler survives store failures.
#[derive(Default)]
pub struct FaultyStore {
    inner: InMemoryScheduleStore,
    fail_list: AtomicBool,
    fail_claim_for: Mutex<Option<i32>>,
    fail_record_for: Mutex<Option<i32>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, schedule: Model) -> i32 {
        self.inner.seed(schedule)
    }

    pub fn snapshot(&self, id: i32) -> Option<Model> {
        self.inner.snapshot(id)
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_claim_for(&self, id: i32) {
        *self.fail_claim_for.lock().unwrap() = Some(id);
    }

    pub fn fail_record_for(&self, id: i32) {
        *self.fail_record_for.lock().unwrap() = Some(id);
    }

    fn db_error() -> StoreError {
        StoreError::Database("connection reset".to_string())
    }
}

#[async_trait]
impl ScheduleStore for FaultyStore {
    async fn list_schedules(&self) -> Result<Vec<Model>, StoreError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::db_error());
        }
        self.inner.list_schedules().await
    }

    async fn get_schedule(&self, id: i32) -> Result<Option<Model>, StoreError> {
        self.inner.get_schedule(id).await
    }

    async fn create_schedule(&self, data: NewSchedule) -> Result<Model, StoreError> {
        self.inner.create_schedule(data).await
    }

    async fn update_schedule(&self, id: i32, patch: SchedulePatch) -> Result<Model, StoreError> {
        self.inner.update_schedule(id, patch).await
    }

    async fn delete_schedule(&self, id: i32) -> Result<(), StoreError> {
        self.inner.delete_schedule(id).await
    }

    async fn claim_for_run(&self, id: i32, now: NaiveDateTime) -> Result<bool, StoreError> {
        if *self.fail_claim_for.lock().unwrap() == Some(id) {
            return Err(Self::db_error());
        }
        self.inner.claim_for_run(id, now).await
    }

    async fn record_outcome(
        &self,
        id: i32,
        result: RunResult,
        next_run: NaiveDateTime,
        last_error: Option<String>,
    ) -> Result<(), StoreError> {
        if *self.fail_record_for.lock().unwrap() == Some(id) {
            return Err(Self::db_error());
        }
        self.inner
            .record_outcome(id, result, next_run, last_error)
            .await
    }
}

/// Test executor that records invocations and optionally fails or sleeps.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<SyncType>>,
    count: AtomicUsize,
    fail_with: Option<String>,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<SyncType> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncExecutor for RecordingExecutor {
    async fn execute(&self, sync_type: SyncType) -> Result<(), SyncError> {
        self.calls.lock().unwrap().push(sync_type);
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(SyncError::Executor(message.clone())),
            None => Ok(()),
        }
    }
}

/// A schedule that is due now (next_run one hour in the past), enabled,
/// with no previous runs.
pub fn due_schedule(sync_type: &str, frequency: &str) -> Model {
    Model {
        id: 0,
        name: format!("{} sync", sync_type),
        sync_type: sync_type.to_string(),
        is_enabled: true,
        frequency: frequency.to_string(),
        next_run: Some(Utc::now().naive_utc() - chrono::Duration::hours(1)),
        last_run: None,
        last_result: None,
        last_error: None,
        run_count: 0,
    }
}

/// Router with the admin sync routes and a fixed test admin key.
pub fn test_app(store: Arc<InMemoryScheduleStore>) -> Router {
    let state = AppState {
        store,
        admin_api_key: TEST_ADMIN_KEY.to_string(),
    };
    admin_sync::api_router().with_state(state)
}
