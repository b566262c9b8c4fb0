//! SQLite record store.
//!
//! Uses a single SQLite database file with two tables:
//! - `logs`: workout sets
//! - `body_stats`: body weight and body-fat measurements
//!
//! A connection is opened, used, and closed per operation; nothing is held
//! across a turn. The schema is additive-only: `initialize` appends any
//! column of `logs` that an older database is missing.

use async_trait::async_trait;
use ironcoach_core::error::StoreError;
use ironcoach_core::record::{BodyStatEntry, NewBodyStat, NewWorkout, RecordStore, WorkoutEntry};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Columns that may be missing from databases created by older versions,
/// with the declaration used to add them.
const ADDITIVE_LOG_COLUMNS: &[(&str, &str)] = &[
    ("sets", "INTEGER DEFAULT 1"),
    ("note", "TEXT"),
];

/// A file-backed SQLite record store.
pub struct SqliteStore {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl SqliteStore {
    /// Create a store for the database file at `path`.
    ///
    /// No I/O happens here; the file is created by the first operation.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        Self { path, options }
    }

    /// Create the store and run [`RecordStore::initialize`].
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self::new(path);
        store.initialize().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection, sqlx::Error> {
        self.options.connect().await
    }

    /// Names of the columns currently present on `table`.
    async fn table_columns(
        conn: &mut SqliteConnection,
        table: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
            .fetch_all(&mut *conn)
            .await?;
        rows.iter().map(|r| r.try_get::<String, _>("name")).collect()
    }

    async fn run_migrations(conn: &mut SqliteConnection) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                date     TEXT,
                exercise TEXT,
                weight   REAL,
                reps     INTEGER,
                sets     INTEGER DEFAULT 1,
                note     TEXT
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("logs table: {e}")))?;

        let existing = Self::table_columns(conn, "logs")
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("logs columns: {e}")))?;

        for (column, decl) in ADDITIVE_LOG_COLUMNS {
            if existing.iter().any(|c| c == column) {
                continue;
            }
            sqlx::query(&format!("ALTER TABLE logs ADD COLUMN {column} {decl}"))
                .execute(&mut *conn)
                .await
                .map_err(|e| StoreError::MigrationFailed(format!("add logs.{column}: {e}")))?;
            info!(column, "Added missing column to logs");
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS body_stats (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                date     TEXT,
                weight   REAL,
                body_fat REAL,
                note     TEXT
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("body_stats table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_workout(row: &SqliteRow) -> Result<WorkoutEntry, sqlx::Error> {
        Ok(WorkoutEntry {
            id: row.try_get("id")?,
            date: row.try_get::<Option<String>, _>("date")?.unwrap_or_default(),
            exercise: row.try_get::<Option<String>, _>("exercise")?.unwrap_or_default(),
            weight: row.try_get::<Option<f64>, _>("weight")?.unwrap_or(0.0),
            reps: row.try_get::<Option<i64>, _>("reps")?.unwrap_or(0),
            sets: row.try_get::<Option<i64>, _>("sets")?.unwrap_or(1),
            note: row.try_get::<Option<String>, _>("note")?.unwrap_or_default(),
        })
    }

    fn row_to_body_stat(row: &SqliteRow) -> Result<BodyStatEntry, sqlx::Error> {
        Ok(BodyStatEntry {
            id: row.try_get("id")?,
            date: row.try_get::<Option<String>, _>("date")?.unwrap_or_default(),
            weight: row.try_get::<Option<f64>, _>("weight")?.unwrap_or(0.0),
            body_fat: row.try_get("body_fat")?,
            note: row.try_get::<Option<String>, _>("note")?.unwrap_or_default(),
        })
    }

    async fn read_workouts(&self) -> Result<Vec<WorkoutEntry>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(
            "SELECT id, date, exercise, weight, reps, sets, note FROM logs ORDER BY date DESC, id DESC",
        )
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        rows.iter().map(Self::row_to_workout).collect()
    }

    async fn read_body_stats(&self) -> Result<Vec<BodyStatEntry>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(
            "SELECT id, date, weight, body_fat, note FROM body_stats ORDER BY date DESC, id DESC",
        )
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        rows.iter().map(Self::row_to_body_stat).collect()
    }

    async fn read_exercises(&self) -> Result<Vec<String>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query("SELECT DISTINCT exercise FROM logs WHERE exercise IS NOT NULL")
            .fetch_all(&mut conn)
            .await?;
        conn.close().await?;
        rows.iter().map(|r| r.try_get::<String, _>("exercise")).collect()
    }

    async fn read_latest_weight(&self) -> Result<Option<f64>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let row = sqlx::query("SELECT weight FROM body_stats ORDER BY date DESC, id DESC LIMIT 1")
            .fetch_optional(&mut conn)
            .await?;
        conn.close().await?;
        match row {
            Some(row) => row.try_get::<Option<f64>, _>("weight"),
            None => Ok(None),
        }
    }

    /// The row is already committed, so a failed close is logged, not returned.
    async fn close_after_write(conn: SqliteConnection, table: &str) {
        if let Err(e) = conn.close().await {
            warn!(table, error = %e, "Failed to close connection after insert");
        }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("{}: {e}", parent.display())))?;
        }

        let mut conn = self
            .connect()
            .await
            .map_err(|e| StoreError::Open(format!("{}: {e}", self.path.display())))?;
        Self::run_migrations(&mut conn).await?;
        conn.close()
            .await
            .map_err(|e| StoreError::Open(format!("close: {e}")))?;

        info!("SQLite record store initialized at {}", self.path.display());
        Ok(())
    }

    async fn insert_workout(&self, workout: NewWorkout) -> Result<i64, StoreError> {
        let mut conn = self
            .connect()
            .await
            .map_err(|e| StoreError::Open(format!("{}: {e}", self.path.display())))?;

        let result = sqlx::query(
            "INSERT INTO logs (date, exercise, weight, reps, sets, note) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&workout.date)
        .bind(&workout.exercise)
        .bind(workout.weight)
        .bind(workout.reps)
        .bind(workout.sets)
        .bind(&workout.note)
        .execute(&mut conn)
        .await
        .map_err(|e| StoreError::WriteFailed(format!("INSERT INTO logs failed: {e}")))?;

        let id = result.last_insert_rowid();
        Self::close_after_write(conn, "logs").await;
        debug!(id, exercise = %workout.exercise, "Stored workout");
        Ok(id)
    }

    async fn insert_body_stat(&self, stat: NewBodyStat) -> Result<i64, StoreError> {
        let mut conn = self
            .connect()
            .await
            .map_err(|e| StoreError::Open(format!("{}: {e}", self.path.display())))?;

        let result = sqlx::query(
            "INSERT INTO body_stats (date, weight, body_fat, note) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&stat.date)
        .bind(stat.weight)
        .bind(stat.body_fat)
        .bind(&stat.note)
        .execute(&mut conn)
        .await
        .map_err(|e| StoreError::WriteFailed(format!("INSERT INTO body_stats failed: {e}")))?;

        let id = result.last_insert_rowid();
        Self::close_after_write(conn, "body_stats").await;
        debug!(id, weight = stat.weight, "Stored body stat");
        Ok(id)
    }

    async fn list_workouts(&self) -> Vec<WorkoutEntry> {
        self.read_workouts().await.unwrap_or_else(|e| {
            warn!("Reading workouts failed, returning empty: {e}");
            Vec::new()
        })
    }

    async fn list_body_stats(&self) -> Vec<BodyStatEntry> {
        self.read_body_stats().await.unwrap_or_else(|e| {
            warn!("Reading body stats failed, returning empty: {e}");
            Vec::new()
        })
    }

    async fn distinct_exercises(&self) -> Vec<String> {
        self.read_exercises().await.unwrap_or_else(|e| {
            warn!("Reading exercise names failed, returning empty: {e}");
            Vec::new()
        })
    }

    async fn latest_body_weight(&self) -> Option<f64> {
        self.read_latest_weight().await.unwrap_or_else(|e| {
            warn!("Reading latest body weight failed: {e}");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("training.db")).await.unwrap();
        (dir, store)
    }

    fn workout(date: &str, exercise: &str, weight: f64) -> NewWorkout {
        NewWorkout {
            date: date.into(),
            exercise: exercise.into(),
            weight,
            reps: 10,
            sets: 3,
            note: "felt strong".into(),
        }
    }

    fn body_stat(date: &str, weight: f64) -> NewBodyStat {
        NewBodyStat {
            date: date.into(),
            weight,
            body_fat: None,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (_dir, store) = test_store().await;
        store.insert_workout(workout("2024-01-01", "Squat", 100.0)).await.unwrap();

        store.initialize().await.unwrap();
        store.initialize().await.unwrap();

        let rows = store.list_workouts().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise, "Squat");
    }

    #[tokio::test]
    async fn insert_then_list_round_trips_every_field() {
        let (_dir, store) = test_store().await;
        let id = store
            .insert_workout(workout("2024-02-10", "Bench Press", 62.5))
            .await
            .unwrap();

        let rows = store.list_workouts().await;
        assert_eq!(rows, vec![workout("2024-02-10", "Bench Press", 62.5).into_entry(id)]);
    }

    #[tokio::test]
    async fn writes_release_the_connection() {
        let (dir, store) = test_store().await;
        store.insert_workout(workout("2024-02-10", "Squat", 100.0)).await.unwrap();
        store.insert_body_stat(body_stat("2024-02-10", 80.0)).await.unwrap();

        // An exclusive lock only succeeds when no earlier connection is left open
        let mut conn = SqliteConnectOptions::new()
            .filename(dir.path().join("training.db"))
            .connect()
            .await
            .unwrap();
        sqlx::query("BEGIN EXCLUSIVE").execute(&mut conn).await.unwrap();
        sqlx::query("COMMIT").execute(&mut conn).await.unwrap();
        conn.close().await.unwrap();

        assert_eq!(store.list_workouts().await.len(), 1);
        assert_eq!(store.latest_body_weight().await, Some(80.0));
    }

    #[tokio::test]
    async fn workouts_list_newest_date_first() {
        let (_dir, store) = test_store().await;
        store.insert_workout(workout("2024-02-01", "Squat", 100.0)).await.unwrap();
        store.insert_workout(workout("2024-03-01", "Squat", 105.0)).await.unwrap();
        store.insert_workout(workout("2024-01-01", "Squat", 95.0)).await.unwrap();
        let same_day = store.insert_workout(workout("2024-03-01", "Deadlift", 140.0)).await.unwrap();

        let dates: Vec<String> = store.list_workouts().await.into_iter().map(|w| w.date).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-01", "2024-02-01", "2024-01-01"]);
        // Same date: newest insert first
        assert_eq!(store.list_workouts().await[0].id, same_day);
    }

    #[tokio::test]
    async fn latest_body_weight_uses_greatest_date() {
        let (_dir, store) = test_store().await;
        assert_eq!(store.latest_body_weight().await, None);

        store.insert_body_stat(body_stat("2024-01-01", 70.0)).await.unwrap();
        store.insert_body_stat(body_stat("2024-03-01", 72.0)).await.unwrap();
        store.insert_body_stat(body_stat("2024-02-01", 71.0)).await.unwrap();

        assert_eq!(store.latest_body_weight().await, Some(72.0));
    }

    #[tokio::test]
    async fn body_fat_is_nullable() {
        let (_dir, store) = test_store().await;
        store.insert_body_stat(body_stat("2024-01-01", 70.0)).await.unwrap();
        store
            .insert_body_stat(NewBodyStat {
                body_fat: Some(15.5),
                ..body_stat("2024-01-02", 69.8)
            })
            .await
            .unwrap();

        let stats = store.list_body_stats().await;
        assert_eq!(stats[0].body_fat, Some(15.5));
        assert_eq!(stats[1].body_fat, None);
    }

    #[tokio::test]
    async fn distinct_exercises_deduplicates() {
        let (_dir, store) = test_store().await;
        store.insert_workout(workout("2024-01-01", "Squat", 100.0)).await.unwrap();
        store.insert_workout(workout("2024-01-02", "Squat", 102.5)).await.unwrap();
        store.insert_workout(workout("2024-01-02", "Row", 60.0)).await.unwrap();

        let mut names = store.distinct_exercises().await;
        names.sort();
        assert_eq!(names, vec!["Row", "Squat"]);
    }

    #[tokio::test]
    async fn reads_before_initialize_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("fresh.db"));

        assert!(store.list_workouts().await.is_empty());
        assert!(store.list_body_stats().await.is_empty());
        assert!(store.distinct_exercises().await.is_empty());
        assert_eq!(store.latest_body_weight().await, None);
    }

    #[tokio::test]
    async fn writes_before_initialize_fail() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("fresh.db"));

        let err = store.insert_workout(workout("2024-01-01", "Squat", 100.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed(_)));
    }

    #[tokio::test]
    async fn initialize_adds_missing_columns_without_losing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");

        // A database from before `sets` and `note` existed
        let mut conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE logs (id INTEGER PRIMARY KEY AUTOINCREMENT, date TEXT, exercise TEXT, weight REAL, reps INTEGER)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query("INSERT INTO logs (date, exercise, weight, reps) VALUES ('2023-12-31', 'Squat', 90.0, 8)")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();

        let store = SqliteStore::open(&path).await.unwrap();
        let rows = store.list_workouts().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise, "Squat");
        assert_eq!(rows[0].sets, 1);
        assert_eq!(rows[0].note, "");

        store.insert_workout(workout("2024-01-01", "Squat", 92.5)).await.unwrap();
        assert_eq!(store.list_workouts().await.len(), 2);
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("training.db");
        let store = SqliteStore::open(&path).await.unwrap();
        assert!(store.path().exists());
    }
}
