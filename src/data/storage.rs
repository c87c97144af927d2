//! SQLite storage layer for the running log.
//!
//! Database schema (`RunningLog.db` inside the data directory):
//! - `run_data` table: one row per run, dates stored as `YYYY-MM-DD` text
//! - `monthly_totals` / `yearly_totals` views: per-period totals with running sums
//! - `run_summary` view: statistics over per-day distance totals

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::models::{MonthlyTotals, NewRun, RunRecord, Summary, YearlyTotals};

/// File name of the database inside the data directory
pub const DB_FILE_NAME: &str = "RunningLog.db";

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS run_data (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    date             TEXT    NOT NULL,
    distance         REAL    NOT NULL,
    duration         TEXT,
    duration_seconds INTEGER,
    pace             TEXT,
    cadence          INTEGER,
    heart_rate       REAL,
    heart_rate_max   REAL,
    vo2max           TEXT,
    temperature      REAL,
    humidity         REAL,
    time_of_day      TEXT,
    place            TEXT,
    notes            TEXT
);

CREATE INDEX IF NOT EXISTS idx_run_data_date ON run_data (date);

CREATE VIEW IF NOT EXISTS monthly_totals AS
SELECT month,
       days_run,
       SUM(days_run) OVER (ORDER BY month) AS cumulative_days_run,
       total_distance,
       SUM(total_distance) OVER (ORDER BY month) AS cumulative_distance
FROM (
    SELECT substr(date, 1, 7) AS month,
           COUNT(DISTINCT date) AS days_run,
           SUM(distance) AS total_distance
    FROM run_data
    GROUP BY month
);

CREATE VIEW IF NOT EXISTS yearly_totals AS
SELECT year,
       days_run,
       SUM(days_run) OVER (ORDER BY year) AS cumulative_days_run,
       total_distance,
       SUM(total_distance) OVER (ORDER BY year) AS cumulative_distance
FROM (
    SELECT CAST(substr(date, 1, 4) AS INTEGER) AS year,
           COUNT(DISTINCT date) AS days_run,
           SUM(distance) AS total_distance
    FROM run_data
    GROUP BY year
);

CREATE VIEW IF NOT EXISTS run_summary AS
SELECT COUNT(*) AS days_run,
       COALESCE(SUM(day_distance), 0.0) AS total_distance,
       COALESCE(AVG(day_distance), 0.0) AS avg_distance,
       COALESCE(MIN(day_distance), 0.0) AS min_distance,
       COALESCE(MAX(day_distance), 0.0) AS max_distance
FROM (
    SELECT date, SUM(distance) AS day_distance
    FROM run_data
    GROUP BY date
);
"#;

const RUN_COLUMNS: &str = "id, date, distance, duration, duration_seconds, pace, cadence, \
     heart_rate, heart_rate_max, vo2max, temperature, humidity, time_of_day, place, notes";

/// Half-open `[Jan 1 of year, Jan 1 of year + 1)` range as stored text
fn year_bounds(year: i32) -> Result<(String, String)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .with_context(|| format!("Year out of range: {year}"))?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
        .with_context(|| format!("Year out of range: {year}"))?;
    Ok((
        start.format(DATE_FORMAT).to_string(),
        end.format(DATE_FORMAT).to_string(),
    ))
}

/// Map a `run_data` row (selected with `RUN_COLUMNS`) into a record
fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    let date_text: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    // Unknown labels from hand-edited databases are dropped rather than failing the load
    let time_of_day = row
        .get::<_, Option<String>>(12)?
        .and_then(|t| t.parse().ok());

    Ok(RunRecord {
        id: row.get(0)?,
        date,
        distance: row.get(2)?,
        duration: row.get(3)?,
        duration_seconds: row.get(4)?,
        pace: row.get(5)?,
        cadence: row.get(6)?,
        heart_rate: row.get(7)?,
        heart_rate_max: row.get(8)?,
        vo2max: row.get(9)?,
        temperature: row.get(10)?,
        humidity: row.get(11)?,
        time_of_day,
        place: row.get(13)?,
        notes: row.get(14)?,
    })
}

/// Storage interface for the running log database
pub struct Storage {
    db_path: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Open (creating if needed) the database inside `data_dir`
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {data_dir:?}"))?;
        let db_path = data_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {db_path:?}"))?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialise database schema")?;
        debug!(path = ?db_path, "opened running log database");
        Ok(Storage { db_path, conn })
    }

    /// In-memory database, used by tests
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Storage {
            db_path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// All runs of a year grouped by date
    pub fn load_year(&self, year: i32) -> Result<BTreeMap<NaiveDate, Vec<RunRecord>>> {
        let (start, end) = year_bounds(year)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM run_data WHERE date >= ?1 AND date < ?2 ORDER BY date, id"
        ))?;

        let mut by_date: BTreeMap<NaiveDate, Vec<RunRecord>> = BTreeMap::new();
        for run in stmt.query_map(params![start, end], run_from_row)? {
            let run = run?;
            by_date.entry(run.date).or_default().push(run);
        }
        Ok(by_date)
    }

    /// Sum of distances per day for a year
    pub fn daily_distances(&self, year: i32) -> Result<BTreeMap<NaiveDate, f64>> {
        Ok(self
            .load_year(year)?
            .into_iter()
            .map(|(date, runs)| (date, runs.iter().map(|r| r.distance).sum()))
            .collect())
    }

    /// Per-month totals, oldest first
    pub fn monthly_totals(&self) -> Result<Vec<MonthlyTotals>> {
        let mut stmt = self.conn.prepare(
            "SELECT month, days_run, cumulative_days_run, total_distance, cumulative_distance \
             FROM monthly_totals ORDER BY month",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MonthlyTotals {
                month: row.get(0)?,
                days_run: row.get(1)?,
                cumulative_days_run: row.get(2)?,
                total_distance: row.get(3)?,
                cumulative_distance: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read monthly totals")
    }

    /// Per-year totals, oldest first
    pub fn yearly_totals(&self) -> Result<Vec<YearlyTotals>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, days_run, cumulative_days_run, total_distance, cumulative_distance \
             FROM yearly_totals ORDER BY year",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(YearlyTotals {
                year: row.get(0)?,
                days_run: row.get(1)?,
                cumulative_days_run: row.get(2)?,
                total_distance: row.get(3)?,
                cumulative_distance: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read yearly totals")
    }

    /// Overall statistics; all zeros when nothing is logged
    pub fn summary(&self) -> Result<Summary> {
        self.conn
            .query_row(
                "SELECT days_run, total_distance, avg_distance, min_distance, max_distance \
                 FROM run_summary",
                [],
                |row| {
                    Ok(Summary {
                        days_run: row.get(0)?,
                        total_distance: row.get(1)?,
                        avg_distance: row.get(2)?,
                        min_distance: row.get(3)?,
                        max_distance: row.get(4)?,
                    })
                },
            )
            .context("Failed to read summary")
    }

    /// Insert a run and return its id
    pub fn save(&self, run: &NewRun) -> Result<i64> {
        insert_run(&self.conn, run)?;
        let id = self.conn.last_insert_rowid();
        info!(id, distance = run.distance, "saved run");
        Ok(id)
    }

    /// Insert many runs atomically, returning how many were written
    pub fn save_all(&mut self, runs: &[NewRun]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for run in runs {
            insert_run(&tx, run)?;
        }
        tx.commit().context("Failed to commit imported runs")?;
        info!(count = runs.len(), "saved runs");
        Ok(runs.len())
    }

    /// Whether any run falls in the given year
    pub fn year_has_data(&self, year: i32) -> Result<bool> {
        let (start, end) = year_bounds(year)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM run_data WHERE date >= ?1 AND date < ?2",
            params![start, end],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Distinct years with at least one run, ascending
    pub fn years_with_data(&self) -> Result<Vec<i32>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT CAST(substr(date, 1, 4) AS INTEGER) AS year FROM run_data ORDER BY year",
        )?;
        let years = stmt.query_map([], |row| row.get(0))?;
        years
            .collect::<rusqlite::Result<Vec<i32>>>()
            .context("Failed to list years")
    }

    /// Delete a run by id. Returns false when no row matched.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM run_data WHERE id = ?1", params![id])?;
        if affected > 0 {
            info!(id, "deleted run");
        }
        Ok(affected > 0)
    }

    /// Id of the most recently inserted run still present
    pub fn last_id(&self) -> Result<Option<i64>> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM run_data", [], |row| row.get(0))?;
        Ok(id)
    }

    /// Fetch a single run
    pub fn get(&self, id: i64) -> Result<Option<RunRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM run_data WHERE id = ?1"),
                params![id],
                run_from_row,
            )
            .optional()
            .context("Failed to read run")
    }
}

fn insert_run(conn: &Connection, run: &NewRun) -> Result<()> {
    run.validate()?;
    let date = run.date.format(DATE_FORMAT).to_string();
    debug!(%date, "inserting run");
    conn.execute(
        "INSERT INTO run_data (date, distance, duration, duration_seconds, pace, cadence, \
         heart_rate, heart_rate_max, vo2max, temperature, humidity, time_of_day, place, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            date,
            run.distance,
            run.duration(),
            run.duration_seconds,
            run.effective_pace(),
            run.cadence,
            run.heart_rate,
            run.heart_rate_max,
            run.vo2max,
            run.temperature,
            run.humidity,
            run.time_of_day.map(|t| t.as_str()),
            run.place,
            run.notes,
        ],
    )
    .context("Failed to insert run")?;
    Ok(())
}
