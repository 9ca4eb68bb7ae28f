use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{SubsecRound, Utc};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::{Result, StoreError};
use crate::features::Features;
use crate::models::{Tour, TourInput};
use crate::reports::{self, DifficultyStats, MonthPlan, STATS_MIN_RATING};
use crate::schema::build_tour;

use self::open::{open_with_config, DbOpenConfig};
use self::queries::*;
use self::rows::{map_tour_row, TourParams};

pub mod open;
pub mod queries;
pub mod rows;

/// SQLite-backed tour collection. One connection, serialized behind a mutex;
/// every public call is a single short critical section.
pub struct TourStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for TourStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourStore").finish_non_exhaustive()
    }
}

impl TourStore {
    pub fn open<P: AsRef<Path>>(path: P, cfg: &DbOpenConfig) -> Result<Self> {
        let path = path.as_ref();
        info!(db_path = %path.display(), "opening tour store");
        Self::from_connection(open_with_config(path, cfg)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Writes run in transactions, so a poisoned lock still guards a consistent connection.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validates `body` as a new tour and inserts it.
    pub fn create(&self, body: Value) -> Result<Tour> {
        let tour = new_tour(body)?;
        insert(&self.conn(), &tour)?;
        debug!(id = %tour.id, name = %tour.name, "tour created");
        Ok(tour)
    }

    /// Inserts every body or none of them.
    pub fn insert_many(&self, bodies: Vec<Value>) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut n = 0;
        for body in bodies {
            insert(&tx, &new_tour(body)?)?;
            n += 1;
        }
        tx.commit()?;
        Ok(n)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Tour>> {
        select_by_id(&self.conn(), id)
    }

    /// Runs a compiled list plan and returns projected documents.
    pub fn find(&self, features: &Features<'_>) -> Result<Vec<Value>> {
        let (tail, bound) = features.to_sql();
        let sql = format!("SELECT {TOUR_COLUMNS} FROM tours{tail}");
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bound.iter()), map_tour_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(features.projection.apply(serde_json::to_value(r?)?));
        }
        Ok(out)
    }

    /// Merges `patch` over the stored document, re-validates the merged
    /// document and stores it. Returns the updated tour, or `None` when `id`
    /// does not exist.
    pub fn update_by_id(&self, id: &str, patch: Value) -> Result<Option<Tour>> {
        let patch: Map<String, Value> = serde_json::from_value(patch).map_err(StoreError::Body)?;
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let Some(current) = select_by_id(&tx, id)? else { return Ok(None) };

        let mut merged = match serde_json::to_value(&current)? {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        for (k, v) in patch {
            if k != "_id" && k != "createdAt" {
                merged.insert(k, v);
            }
        }
        let input: TourInput = serde_json::from_value(Value::Object(merged)).map_err(StoreError::Body)?;
        let tour = build_tour(input, current.id, current.created_at)?;

        let p = TourParams::new(&tour)?;
        tx.execute(UPDATE_TOUR, &p.bind(&tour)[..]).map_err(|e| write_error(e, &tour))?;
        tx.commit()?;
        debug!(id = %tour.id, "tour updated");
        Ok(Some(tour))
    }

    /// Removes the tour and returns what was removed.
    pub fn delete_by_id(&self, id: &str) -> Result<Option<Tour>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let Some(tour) = select_by_id(&tx, id)? else { return Ok(None) };
        tx.execute(DELETE_TOUR, params![id])?;
        tx.commit()?;
        debug!(id, "tour deleted");
        Ok(Some(tour))
    }

    pub fn delete_all(&self) -> Result<usize> {
        Ok(self.conn().execute(DELETE_ALL_TOURS, [])?)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self.conn().query_row(COUNT_TOURS, [], |r| r.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn tour_stats(&self) -> Result<Vec<DifficultyStats>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(TOUR_STATS)?;
        let rows = stmt.query_map(params![STATS_MIN_RATING], |r| {
            Ok(DifficultyStats {
                difficulty: r.get(0)?,
                num_tours: r.get(1)?,
                num_rating: r.get(2)?,
                avg_rating: r.get(3)?,
                avg_price: r.get(4)?,
                min_price: r.get(5)?,
                max_price: r.get(6)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn monthly_plan(&self, year: i32) -> Result<Vec<MonthPlan>> {
        let (first, last) = reports::year_window(year);
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(MONTHLY_STARTS)?;
        let rows = stmt.query_map(params![first, last], |r| Ok((r.get::<_, u32>(0)?, r.get::<_, String>(1)?)))?;
        let mut starts = Vec::new();
        for r in rows {
            starts.push(r?);
        }
        Ok(reports::group_by_month(starts))
    }
}

fn new_tour(body: Value) -> Result<Tour> {
    let body: Map<String, Value> = serde_json::from_value(body).map_err(StoreError::Body)?;
    let input: TourInput = serde_json::from_value(Value::Object(body)).map_err(StoreError::Body)?;
    let id = uuid::Uuid::new_v4().simple().to_string();
    build_tour(input, id, Utc::now().trunc_subsecs(3))
}

fn insert(conn: &Connection, tour: &Tour) -> Result<()> {
    let p = TourParams::new(tour)?;
    conn.execute(INSERT_TOUR, &p.bind(tour)[..]).map_err(|e| write_error(e, tour))?;
    Ok(())
}

fn select_by_id(conn: &Connection, id: &str) -> Result<Option<Tour>> {
    let mut stmt = conn.prepare_cached(&format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = ?1"))?;
    Ok(stmt.query_row(params![id], map_tour_row).optional()?)
}

/// Unique-name violations become [`StoreError::Duplicate`].
fn write_error(err: rusqlite::Error, tour: &Tour) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == ErrorCode::ConstraintViolation && msg.contains("tours.name") {
            return StoreError::Duplicate { field: "name", value: tour.name.clone() };
        }
    }
    StoreError::Sqlite(err)
}

