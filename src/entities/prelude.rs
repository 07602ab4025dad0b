pub use super::sync_schedules::Entity as SyncSchedules;
