//! Local persistence for evaluation and notes results.
//!
//! Two append-only tables in one SQLite file: `exam_results` (one row per
//! evaluated document) and `bullet_points` (one row per note bullet).
//! There is no update or delete API — rows are history, not state.
//! Timestamps are assigned by SQLite (`CURRENT_TIMESTAMP`), so the crate
//! never generates wall-clock values itself.

use crate::error::DeckGenError;
use crate::output::EvaluationResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

/// A persisted exam evaluation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExamRecord {
    pub id: i64,
    pub exam_file: String,
    pub evaluation: String,
    pub score: i64,
    pub timestamp: String,
}

/// A persisted note bullet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteRecord {
    pub id: i64,
    pub topic: String,
    pub point: String,
    pub timestamp: String,
}

/// Append-only store over the two result tables.
pub struct ResultStore {
    pool: SqlitePool,
}

impl ResultStore {
    /// Open (creating if missing) the database file and its tables.
    pub async fn open(path: &Path) -> Result<Self, DeckGenError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        debug!("Opened result store at {}", path.display());
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps every query
    /// on the same ephemeral database.
    pub async fn open_in_memory() -> Result<Self, DeckGenError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), DeckGenError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS exam_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exam_file TEXT NOT NULL,
                evaluation TEXT NOT NULL,
                score INTEGER,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bullet_points (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic TEXT NOT NULL,
                point TEXT NOT NULL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append one evaluation row; returns its id.
    pub async fn store_exam(
        &self,
        exam_file: &str,
        result: &EvaluationResult,
    ) -> Result<i64, DeckGenError> {
        let done = sqlx::query(
            "INSERT INTO exam_results (exam_file, evaluation, score) VALUES (?, ?, ?)",
        )
        .bind(exam_file)
        .bind(&result.evaluation)
        .bind(result.score)
        .execute(&self.pool)
        .await?;

        Ok(done.last_insert_rowid())
    }

    /// Append one note bullet; returns its id.
    pub async fn store_note(&self, topic: &str, point: &str) -> Result<i64, DeckGenError> {
        let done = sqlx::query("INSERT INTO bullet_points (topic, point) VALUES (?, ?)")
            .bind(topic)
            .bind(point)
            .execute(&self.pool)
            .await?;

        Ok(done.last_insert_rowid())
    }

    /// All evaluation rows, oldest first.
    pub async fn exam_results(&self) -> Result<Vec<ExamRecord>, DeckGenError> {
        let rows = sqlx::query_as::<_, ExamRecord>(
            "SELECT id, exam_file, evaluation, score, timestamp FROM exam_results ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Note bullets recorded for one topic, oldest first.
    pub async fn notes_for_topic(&self, topic: &str) -> Result<Vec<NoteRecord>, DeckGenError> {
        let rows = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, topic, point, timestamp FROM bullet_points WHERE topic = ? ORDER BY id",
        )
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exam_rows_round_trip() {
        let store = ResultStore::open_in_memory().await.unwrap();

        let result = EvaluationResult {
            evaluation: "Solid fundamentals, weak on edge cases.".into(),
            score: 72,
        };
        let id = store.store_exam("/exams/midterm.pdf", &result).await.unwrap();
        assert!(id > 0);

        let rows = store.exam_results().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exam_file, "/exams/midterm.pdf");
        assert_eq!(rows[0].score, 72);
        assert!(!rows[0].timestamp.is_empty());
    }

    #[tokio::test]
    async fn notes_are_scoped_by_topic() {
        let store = ResultStore::open_in_memory().await.unwrap();

        store.store_note("rust", "ownership").await.unwrap();
        store.store_note("rust", "borrowing").await.unwrap();
        store.store_note("python", "duck typing").await.unwrap();

        let rust_notes = store.notes_for_topic("rust").await.unwrap();
        assert_eq!(rust_notes.len(), 2);
        assert_eq!(rust_notes[0].point, "ownership");
        assert_eq!(rust_notes[1].point, "borrowing");

        assert_eq!(store.notes_for_topic("python").await.unwrap().len(), 1);
        assert!(store.notes_for_topic("go").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_creates_the_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.db");

        let store = ResultStore::open(&path).await.unwrap();
        store.store_note("t", "p").await.unwrap();

        assert!(path.exists());
    }
}
