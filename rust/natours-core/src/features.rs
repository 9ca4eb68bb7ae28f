//! List query features: filter, sort, field projection and pagination.
//!
//! A [`TourQuery`] is the raw, caller-supplied query string. [`Features`]
//! compiles it step by step into a whitelisted SQL plan that
//! [`crate::TourStore::find`] executes; nothing from the query string is ever
//! spliced into SQL except through the column catalogue below.

use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

use crate::errors::{Result, StoreError};
use crate::models::{format_date, parse_date};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 100;
pub const DEFAULT_SORT: &str = "-createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Number,
    Integer,
    Text,
    Date,
}

/// JSON field name, SQL column, value kind.
const COLUMNS: &[(&str, &str, Kind)] = &[
    ("_id", "id", Kind::Text),
    ("name", "name", Kind::Text),
    ("duration", "duration", Kind::Number),
    ("maxGroupSize", "max_group_size", Kind::Integer),
    ("difficulty", "difficulty", Kind::Text),
    ("ratingAverage", "rating_average", Kind::Number),
    ("ratingsQuantity", "ratings_quantity", Kind::Integer),
    ("price", "price", Kind::Number),
    ("priceDiscount", "price_discount", Kind::Number),
    ("summary", "summary", Kind::Text),
    ("imageCover", "image_cover", Kind::Text),
    ("createdAt", "created_at", Kind::Date),
];

fn column(field: &str) -> Option<(&'static str, Kind)> {
    COLUMNS.iter().find(|(f, _, _)| *f == field).map(|(_, c, k)| (*c, *k))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(CmpOp::Gt),
            "gte" => Some(CmpOp::Gte),
            "lt" => Some(CmpOp::Lt),
            "lte" => Some(CmpOp::Lte),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
        }
    }
}

/// A caller's list query, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TourQuery {
    /// `(key, value)` pairs that are not one of the reserved parameters,
    /// e.g. `("price[lt]", "1000")`.
    pub filters: Vec<(String, String)>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TourQuery {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut q = TourQuery::default();
        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());
            match k.as_str() {
                "sort" => q.sort = Some(v),
                "fields" => q.fields = Some(v),
                "page" => q.page = Some(v),
                "limit" => q.limit = Some(v),
                _ => q.filters.push((k, v)),
            }
        }
        q
    }

    /// The canned "five cheapest, best rated" view. Ignores anything the
    /// caller sent.
    pub fn top_five_cheap() -> Self {
        TourQuery {
            filters: Vec::new(),
            sort: Some("price,ratingAverage".into()),
            fields: Some("name,price,ratingAverage,difficulty".into()),
            page: None,
            limit: Some("5".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub op: CmpOp,
    pub value: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl Projection {
    pub fn apply(&self, doc: Value) -> Value {
        let map = match doc {
            Value::Object(map) => map,
            other => return other,
        };
        match self {
            Projection::All => Value::Object(map),
            Projection::Include(keep) => {
                let mut out = Map::new();
                for (k, v) in map {
                    if k == "_id" || keep.iter().any(|f| *f == k) {
                        out.insert(k, v);
                    }
                }
                Value::Object(out)
            }
            Projection::Exclude(drop) => Value::Object(map.into_iter().filter(|(k, _)| !drop.iter().any(|f| f == k)).collect()),
        }
    }
}

/// Compiled list plan, built by chaining
/// `Features::new(&q).filter()?.sort().limit_fields()?.paginate()`.
#[derive(Debug, Clone)]
pub struct Features<'q> {
    query: &'q TourQuery,
    pub conditions: Vec<Condition>,
    pub order: Vec<(&'static str, bool)>,
    pub projection: Projection,
    pub limit: u64,
    pub offset: u64,
}

impl<'q> Features<'q> {
    pub fn new(query: &'q TourQuery) -> Self {
        Self {
            query,
            conditions: Vec::new(),
            order: Vec::new(),
            projection: Projection::All,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Turns `field=value` and `field[op]=value` pairs into typed conditions.
    /// Fields outside the catalogue are dropped.
    pub fn filter(mut self) -> Result<Self> {
        let query = self.query;
        for (key, raw) in &query.filters {
            let (field, op) = match key.split_once('[') {
                Some((field, rest)) => {
                    let op_name = rest.strip_suffix(']').unwrap_or(rest);
                    let op = CmpOp::parse(op_name).ok_or_else(|| StoreError::Query(format!("unsupported operator '{op_name}' on {field}")))?;
                    (field, op)
                }
                None => (key.as_str(), CmpOp::Eq),
            };
            let Some((column, kind)) = column(field) else {
                tracing::debug!(field, "ignoring filter on unknown field");
                continue;
            };
            let value = cast(field, kind, raw)?;
            self.conditions.push(Condition { column, op, value });
        }
        Ok(self)
    }

    pub fn sort(mut self) -> Self {
        let query = self.query;
        let spec = query.sort.as_deref().unwrap_or(DEFAULT_SORT);
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, desc) = match part.strip_prefix('-') {
                Some(f) => (f, true),
                None => (part, false),
            };
            if let Some((column, _)) = column(field) {
                if !self.order.iter().any(|(c, _)| *c == column) {
                    self.order.push((column, desc));
                }
            }
        }
        self
    }

    /// Field projection; `fields=a,b` keeps `_id`, `a` and `b`, `fields=-a`
    /// drops `a`. Mixing the two forms is rejected.
    pub fn limit_fields(mut self) -> Result<Self> {
        let query = self.query;
        let Some(spec) = query.fields.as_deref() else { return Ok(self) };
        let parts: Vec<&str> = spec.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return Ok(self);
        }
        let excluded = parts.iter().filter(|p| p.starts_with('-')).count();
        self.projection = if excluded == 0 {
            Projection::Include(parts.iter().map(|p| p.to_string()).collect())
        } else if excluded == parts.len() {
            Projection::Exclude(parts.iter().map(|p| p[1..].to_string()).collect())
        } else {
            return Err(StoreError::Query("projection cannot mix inclusion and exclusion".into()));
        };
        Ok(self)
    }

    pub fn paginate(mut self) -> Self {
        let page = positive(self.query.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let limit = positive(self.query.limit.as_deref()).unwrap_or(DEFAULT_LIMIT);
        self.limit = limit;
        self.offset = (page - 1).saturating_mul(limit);
        self
    }

    /// `WHERE ... ORDER BY ... LIMIT ? OFFSET ?` tail plus its bound values.
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut params = Vec::with_capacity(self.conditions.len() + 2);
        if !self.conditions.is_empty() {
            let clauses: Vec<String> = self
                .conditions
                .iter()
                .map(|c| {
                    params.push(c.value.clone());
                    format!("{} {} ?{}", c.column, c.op.sql(), params.len())
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        for (column, desc) in &self.order {
            sql.push_str(column);
            sql.push_str(if *desc { " DESC, " } else { " ASC, " });
        }
        // insertion order breaks ties, in the direction of the leading key
        let newest_first = self.order.first().is_some_and(|(_, desc)| *desc);
        sql.push_str(if newest_first { "seq DESC" } else { "seq ASC" });
        params.push(SqlValue::Integer(clamp_i64(self.limit)));
        sql.push_str(&format!(" LIMIT ?{}", params.len()));
        params.push(SqlValue::Integer(clamp_i64(self.offset)));
        sql.push_str(&format!(" OFFSET ?{}", params.len()));
        (sql, params)
    }
}

fn cast(field: &str, kind: Kind, raw: &str) -> Result<SqlValue> {
    let bad = || StoreError::Cast { field: field.to_string(), value: raw.to_string() };
    Ok(match kind {
        Kind::Text => SqlValue::Text(raw.to_string()),
        Kind::Number => SqlValue::Real(raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()).ok_or_else(bad)?),
        Kind::Integer => SqlValue::Integer(raw.trim().parse::<i64>().map_err(|_| bad())?),
        Kind::Date => SqlValue::Text(parse_date(raw).map(|d| format_date(&d)).ok_or_else(bad)?),
    })
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).filter(|n| *n > 0)
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
