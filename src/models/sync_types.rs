//! Sync type and frequency enums shared by the scheduler and the admin CRUD
//! handlers, plus the frequency table that computes when a schedule is next
//! due.

use chrono::{Duration, Months, NaiveDateTime};
use std::fmt;

/// The kind of data a scheduled sync refreshes.
///
/// Each variant maps to one executor in [`crate::services::sync_executors`];
/// `All` is a composite that fans out to every other variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncType {
    Products,
    Recalls,
    Ingredients,
    Livestock,
    FeedNutrition,
    FarmSafety,
    ExoticProducts,
    ExoticNutrition,
    ExoticSafety,
    All,
}

impl SyncType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncType::Products => "products",
            SyncType::Recalls => "recalls",
            SyncType::Ingredients => "ingredients",
            SyncType::Livestock => "livestock",
            SyncType::FeedNutrition => "feed-nutrition",
            SyncType::FarmSafety => "farm-safety",
            SyncType::ExoticProducts => "exotic-products",
            SyncType::ExoticNutrition => "exotic-nutrition",
            SyncType::ExoticSafety => "exotic-safety",
            SyncType::All => "all",
        }
    }

    /// Human label used when naming bulk-created schedules.
    pub const fn label(&self) -> &'static str {
        match self {
            SyncType::Products => "Pet products",
            SyncType::Recalls => "Product recalls",
            SyncType::Ingredients => "Ingredient safety",
            SyncType::Livestock => "Livestock products",
            SyncType::FeedNutrition => "Feed nutrition",
            SyncType::FarmSafety => "Farm animal safety",
            SyncType::ExoticProducts => "Exotic pet products",
            SyncType::ExoticNutrition => "Exotic pet nutrition",
            SyncType::ExoticSafety => "Exotic pet safety",
            SyncType::All => "Everything",
        }
    }

    pub fn parse(s: &str) -> Option<SyncType> {
        match s {
            "products" => Some(SyncType::Products),
            "recalls" => Some(SyncType::Recalls),
            "ingredients" => Some(SyncType::Ingredients),
            "livestock" => Some(SyncType::Livestock),
            "feed-nutrition" => Some(SyncType::FeedNutrition),
            "farm-safety" => Some(SyncType::FarmSafety),
            "exotic-products" => Some(SyncType::ExoticProducts),
            "exotic-nutrition" => Some(SyncType::ExoticNutrition),
            "exotic-safety" => Some(SyncType::ExoticSafety),
            "all" => Some(SyncType::All),
            _ => None,
        }
    }

    /// Every concrete sync type, in the order the `all` composite and the
    /// bulk-create endpoint walk them. Excludes `All` itself.
    pub const fn individual() -> [SyncType; 9] {
        [
            SyncType::Products,
            SyncType::Recalls,
            SyncType::Ingredients,
            SyncType::Livestock,
            SyncType::FeedNutrition,
            SyncType::FarmSafety,
            SyncType::ExoticProducts,
            SyncType::ExoticNutrition,
            SyncType::ExoticSafety,
        ]
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a schedule recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    TwiceDaily,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl Frequency {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::TwiceDaily => "twice_daily",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Frequency> {
        match s {
            "hourly" => Some(Frequency::Hourly),
            "twice_daily" => Some(Frequency::TwiceDaily),
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "custom" => Some(Frequency::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome sentinel persisted in `sync_schedules.last_result`.
///
/// `Pending` doubles as the in-flight marker: a schedule whose last result
/// is `pending` is currently executing and must not be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    Pending,
    Success,
    Failure,
}

impl RunResult {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RunResult::Pending => "pending",
            RunResult::Success => "success",
            RunResult::Failure => "failure",
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the next due time for a schedule that starts running at `now`.
///
/// This is the single frequency table used by schedule creation, frequency
/// updates and the scheduler's post-run recompute, so the three paths cannot
/// drift apart. `frequency` is matched as stored text: an unrecognized value
/// falls back to one day so a stale row keeps cycling instead of sticking.
pub fn calculate_next_run(frequency: &str, now: NaiveDateTime) -> NaiveDateTime {
    match frequency {
        "hourly" => now + Duration::hours(1),
        "twice_daily" => now + Duration::hours(12),
        "daily" => now + Duration::days(1),
        "weekly" => now + Duration::days(7),
        "monthly" => now
            .checked_add_months(Months::new(1))
            .unwrap_or(now + Duration::days(30)),
        // No cron expression support; custom schedules re-run hourly.
        "custom" => now + Duration::hours(1),
        _ => now + Duration::days(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn next_run_weekly() {
        let now = at(2024, 1, 1);
        assert_eq!(calculate_next_run("weekly", now), at(2024, 1, 8));
    }

    #[test]
    fn next_run_frequency_table() {
        let now = at(2024, 1, 1);
        assert_eq!(calculate_next_run("hourly", now), now + Duration::hours(1));
        assert_eq!(
            calculate_next_run("twice_daily", now),
            now + Duration::hours(12)
        );
        assert_eq!(calculate_next_run("daily", now), at(2024, 1, 2));
        assert_eq!(calculate_next_run("monthly", now), at(2024, 2, 1));
        assert_eq!(calculate_next_run("custom", now), now + Duration::hours(1));
    }

    #[test]
    fn next_run_monthly_clamps_to_month_end() {
        assert_eq!(calculate_next_run("monthly", at(2024, 1, 31)), at(2024, 2, 29));
    }

    #[test]
    fn next_run_unrecognized_frequency_defaults_to_one_day() {
        let now = at(2024, 1, 1);
        assert_eq!(calculate_next_run("fortnightly", now), at(2024, 1, 2));
        assert_eq!(calculate_next_run("", now), at(2024, 1, 2));
    }

    #[test]
    fn sync_type_round_trips() {
        for sync_type in SyncType::individual() {
            assert_eq!(SyncType::parse(sync_type.as_str()), Some(sync_type));
        }
        assert_eq!(SyncType::parse("all"), Some(SyncType::All));
        assert_eq!(SyncType::parse("cosmic-alignment"), None);
    }

    #[test]
    fn individual_excludes_composite() {
        assert!(!SyncType::individual().contains(&SyncType::All));
    }

    #[test]
    fn frequency_round_trips() {
        for frequency in [
            Frequency::Hourly,
            Frequency::TwiceDaily,
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::Custom,
        ] {
            assert_eq!(Frequency::parse(frequency.as_str()), Some(frequency));
        }
        assert_eq!(Frequency::parse("biweekly"), None);
    }
}
