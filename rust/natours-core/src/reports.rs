//! Aggregate report rows returned by [`crate::TourStore::tour_stats`] and
//! [`crate::TourStore::monthly_plan`].

use itertools::Itertools;
use serde::Serialize;

use crate::models::Difficulty;

/// Minimum `ratingAverage` for a tour to count towards the stats.
pub const STATS_MIN_RATING: f64 = 4.0;

/// One bucket of the difficulty statistics. The group key is `_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    #[serde(rename = "_id")]
    pub difficulty: Difficulty,
    pub num_tours: i64,
    pub num_rating: f64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPlan {
    pub num_tour_starts: usize,
    pub tours: Vec<String>,
    pub month: u32,
}

/// Inclusive `[first, last]` bounds of the plan window for `year`, in the
/// stored date form. The window ends at the first instant of December 1st.
pub fn year_window(year: i32) -> (String, String) {
    (format!("{year:04}-01-01T00:00:00.000Z"), format!("{year:04}-12-01T00:00:00.000Z"))
}

/// Folds month-ordered `(month, tour name)` starts into one entry per month.
pub fn group_by_month(starts: Vec<(u32, String)>) -> Vec<MonthPlan> {
    let grouped = starts.into_iter().group_by(|(month, _)| *month);
    let mut plan = Vec::new();
    for (month, group) in &grouped {
        let tours: Vec<String> = group.map(|(_, name)| name).collect();
        plan.push(MonthPlan { num_tour_starts: tours.len(), tours, month });
    }
    plan
}
