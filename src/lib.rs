// src/lib.rs

use std::sync::Arc;

use services::schedule_store::ScheduleStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScheduleStore>,
    pub admin_api_key: String,
}

pub mod entities {
    pub mod prelude;
    pub mod sync_schedules;
}

pub mod models {
    pub mod sync_schedule;
    pub mod sync_types;
}

pub mod services {
    pub mod schedule_store;
    pub mod sync_executors;
}

pub mod jobs {
    pub mod sync_scheduler;
}

pub mod handlers {
    pub mod admin_sync;
}
