use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::models::{format_date, Difficulty, Tour};

impl ToSql for Difficulty {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Difficulty {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Difficulty::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown difficulty '{s}'").into()))
    }
}

fn conversion<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn date_column(r: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = r.get(idx)?;
    DateTime::parse_from_rfc3339(&raw).map(|d| d.with_timezone(&Utc)).map_err(|e| conversion(idx, e))
}

fn json_column<T: serde::de::DeserializeOwned>(r: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = r.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion(idx, e))
}

/// Maps a row selected with [`super::queries::TOUR_COLUMNS`].
pub fn map_tour_row(r: &Row) -> rusqlite::Result<Tour> {
    let raw_dates: Vec<String> = json_column(r, 13)?;
    let mut start_dates = Vec::with_capacity(raw_dates.len());
    for raw in raw_dates {
        let d = DateTime::parse_from_rfc3339(&raw).map_err(|e| conversion(13, e))?;
        start_dates.push(d.with_timezone(&Utc));
    }
    Ok(Tour {
        id: r.get(0)?,
        name: r.get(1)?,
        duration: r.get(2)?,
        max_group_size: r.get(3)?,
        difficulty: r.get(4)?,
        rating_average: r.get(5)?,
        ratings_quantity: r.get(6)?,
        price: r.get(7)?,
        price_discount: r.get(8)?,
        summary: r.get(9)?,
        description: r.get(10)?,
        image_cover: r.get(11)?,
        images: json_column(r, 12)?,
        start_dates,
        created_at: date_column(r, 14)?,
    })
}

/// Column values in `INSERT_TOUR` / `UPDATE_TOUR` parameter order.
pub struct TourParams {
    images: String,
    start_dates: String,
    created_at: String,
}

impl TourParams {
    pub fn new(tour: &Tour) -> serde_json::Result<Self> {
        let dates: Vec<String> = tour.start_dates.iter().map(format_date).collect();
        Ok(Self {
            images: serde_json::to_string(&tour.images)?,
            start_dates: serde_json::to_string(&dates)?,
            created_at: format_date(&tour.created_at),
        })
    }

    pub fn bind<'a>(&'a self, tour: &'a Tour) -> [&'a dyn ToSql; 15] {
        [
            &tour.id,
            &tour.name,
            &tour.duration,
            &tour.max_group_size,
            &tour.difficulty,
            &tour.rating_average,
            &tour.ratings_quantity,
            &tour.price,
            &tour.price_discount,
            &tour.summary,
            &tour.description,
            &tour.image_cover,
            &self.images,
            &self.start_dates,
            &self.created_at,
        ]
    }
}
