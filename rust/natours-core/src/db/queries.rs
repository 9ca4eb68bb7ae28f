pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tours (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
    id               TEXT    NOT NULL UNIQUE,
    name             TEXT    NOT NULL UNIQUE,
    duration         REAL    NOT NULL,
    max_group_size   INTEGER NOT NULL,
    difficulty       TEXT    NOT NULL CHECK (difficulty IN ('easy', 'medium', 'difficult')),
    rating_average   REAL    NOT NULL,
    ratings_quantity INTEGER NOT NULL DEFAULT 0,
    price            REAL    NOT NULL,
    price_discount   REAL,
    summary          TEXT,
    description      TEXT,
    image_cover      TEXT,
    images           TEXT    NOT NULL DEFAULT '[]',
    start_dates      TEXT    NOT NULL DEFAULT '[]',
    created_at       TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tours_price ON tours (price, rating_average);
CREATE INDEX IF NOT EXISTS idx_tours_created_at ON tours (created_at);
"#;

pub const TOUR_COLUMNS: &str = "id, name, duration, max_group_size, difficulty, rating_average, ratings_quantity, \
     price, price_discount, summary, description, image_cover, images, start_dates, created_at";

pub const INSERT_TOUR: &str = "INSERT INTO tours (id, name, duration, max_group_size, difficulty, rating_average, \
     ratings_quantity, price, price_discount, summary, description, image_cover, images, start_dates, created_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

pub const UPDATE_TOUR: &str = "UPDATE tours SET name = ?2, duration = ?3, max_group_size = ?4, difficulty = ?5, \
     rating_average = ?6, ratings_quantity = ?7, price = ?8, price_discount = ?9, summary = ?10, \
     description = ?11, image_cover = ?12, images = ?13, start_dates = ?14, created_at = ?15 WHERE id = ?1";

pub const DELETE_TOUR: &str = "DELETE FROM tours WHERE id = ?1";

pub const DELETE_ALL_TOURS: &str = "DELETE FROM tours";

pub const COUNT_TOURS: &str = "SELECT COUNT(*) FROM tours";

/// Match on minimum rating, group by difficulty, order by average price.
pub const TOUR_STATS: &str = "SELECT difficulty, COUNT(*), SUM(rating_average), AVG(rating_average), \
     AVG(price), MIN(price), MAX(price) \
     FROM tours WHERE rating_average >= ?1 \
     GROUP BY difficulty ORDER BY AVG(price) ASC, difficulty ASC";

/// Unwinds `start_dates` with `json_each` and keeps starts in `[?1, ?2]`.
/// Rows come out month-ordered, then in document and array order.
pub const MONTHLY_STARTS: &str = "SELECT CAST(substr(d.value, 6, 2) AS INTEGER) AS month, t.name \
     FROM tours AS t, json_each(t.start_dates) AS d \
     WHERE d.value >= ?1 AND d.value <= ?2 \
     ORDER BY month ASC, t.seq ASC, d.key ASC";
