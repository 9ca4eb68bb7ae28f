use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Difficult];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored tour document as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub duration: f64,
    pub max_group_size: i64,
    pub difficulty: Difficulty,
    pub rating_average: f64,
    pub ratings_quantity: i64,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_cover: Option<String>,
    pub images: Vec<String>,
    #[serde(with = "date_vec")]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(with = "date")]
    pub created_at: DateTime<Utc>,
}

/// Untrusted document body for create and update. Every field is optional;
/// defaults and rules are applied by [`crate::schema`]. Unknown keys are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourInput {
    pub name: Option<String>,
    pub duration: Option<f64>,
    pub max_group_size: Option<i64>,
    pub difficulty: Option<String>,
    pub rating_average: Option<f64>,
    pub ratings_quantity: Option<i64>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<String>>,
}

/// Canonical storage and wire form: RFC 3339, UTC, millisecond precision.
/// Fixed width, so lexical order matches chronological order.
pub fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, the `YYYY-MM-DD,HH:MM`
/// form used by the dev data, or a bare date (midnight UTC). Precision is
/// cut to milliseconds to match the stored form.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    parse_date_exact(s.trim()).map(|d| d.trunc_subsecs(3))
}

fn parse_date_exact(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d,%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(n.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

mod date {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(d))
    }
}

mod date_vec {
    use chrono::{DateTime, Utc};
    use serde::ser::SerializeSeq;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(ds: &[DateTime<Utc>], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(ds.len()))?;
        for d in ds {
            seq.serialize_element(&super::format_date(d))?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_supported_date_forms() {
        let d = parse_date("2021-03-21T09:00:00Z").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2021, 3, 21, 9));

        let d = parse_date("2021-06-19,10:00").unwrap();
        assert_eq!((d.month(), d.day(), d.hour()), (6, 19, 10));

        let d = parse_date("2022-12-01").unwrap();
        assert_eq!(format_date(&d), "2022-12-01T00:00:00.000Z");

        assert!(parse_date("next tuesday").is_none());
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let d = parse_date("2021-01-01T01:30:00+02:00").unwrap();
        assert_eq!(format_date(&d), "2020-12-31T23:30:00.000Z");
    }

    #[test]
    fn difficulty_round_trips_through_str() {
        for d in Difficulty::ALL {
            assert_eq!(Difficulty::parse(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::parse("extreme"), None);
    }
}
