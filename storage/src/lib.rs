use anyhow::Result;

use hondana_common::models;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

pub mod progress;

pub use progress::SaveProgressParams;

#[derive(Clone)]
pub struct Storage {
    pub pool: Pool<Sqlite>,
    pub data_dir: PathBuf,
}

impl Storage {
    pub async fn new(data_dir: &str) -> Result<Self> {
        let path = PathBuf::from(data_dir);
        if !path.exists() {
            fs::create_dir_all(&path).await?;
        }

        let db_path = path.join("hondana.db");
        let db_url = format!("sqlite://{}", db_path.to_string_lossy());

        // Create DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        Self::bootstrap(&pool).await?;

        Ok(Self {
            pool,
            data_dir: path,
        })
    }

    /// Single-connection in-memory database, used by tests and throwaway runs.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::bootstrap(&pool).await?;

        Ok(Self {
            pool,
            data_dir: PathBuf::new(),
        })
    }

    async fn bootstrap(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS libraries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS series (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                library_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                format TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(library_id) REFERENCES libraries(id)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS volumes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                series_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                min_number REAL NOT NULL,
                max_number REAL NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(series_id) REFERENCES series(id)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chapters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                volume_id INTEGER NOT NULL,
                \"range\" TEXT NOT NULL,
                min_number REAL NOT NULL,
                max_number REAL NOT NULL,
                sort_order REAL NOT NULL,
                is_special INTEGER NOT NULL DEFAULT 0,
                pages INTEGER NOT NULL DEFAULT 0,
                release_date TEXT,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(volume_id) REFERENCES volumes(id)
            )",
        )
        .execute(pool)
        .await?;

        // No UNIQUE index on (user_id, chapter_id): uniqueness is enforced
        // logically so that consolidation can repair pre-existing duplicates.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                chapter_id INTEGER NOT NULL,
                volume_id INTEGER NOT NULL,
                series_id INTEGER NOT NULL,
                library_id INTEGER NOT NULL,
                pages_read INTEGER NOT NULL DEFAULT 0,
                scroll_id TEXT,
                last_modified INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collection_series (
                collection_id INTEGER NOT NULL,
                series_id INTEGER NOT NULL,
                PRIMARY KEY (collection_id, series_id)
            )",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

pub struct CreateSeriesParams {
    pub library_id: i64,
    pub name: String,
    pub format: models::SeriesFormat,
}

pub struct CreateVolumeParams {
    pub series_id: i64,
    pub name: String,
    pub min_number: f64,
    pub max_number: f64,
}

pub struct CreateChapterParams {
    pub volume_id: i64,
    pub range: String,
    pub min_number: f64,
    pub max_number: f64,
    pub sort_order: f64,
    pub is_special: bool,
    pub pages: i32,
    pub release_date: Option<chrono::NaiveDate>,
}

impl Storage {
    pub async fn create_library(&self, name: &str) -> Result<i64> {
        let created_at = chrono::Utc::now().timestamp();
        let res = sqlx::query("INSERT INTO libraries (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn create_user(&self, name: &str) -> Result<i64> {
        let created_at = chrono::Utc::now().timestamp();
        let res = sqlx::query("INSERT INTO users (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn create_series(&self, params: CreateSeriesParams) -> Result<i64> {
        let created_at = chrono::Utc::now().timestamp();
        let res = sqlx::query(
            "INSERT INTO series (library_id, name, format, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(params.library_id)
        .bind(&params.name)
        .bind(params.format)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn create_volume(&self, params: CreateVolumeParams) -> Result<i64> {
        let created_at = chrono::Utc::now().timestamp();
        let res = sqlx::query(
            "INSERT INTO volumes (series_id, name, min_number, max_number, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(params.series_id)
        .bind(&params.name)
        .bind(params.min_number)
        .bind(params.max_number)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn create_chapter(&self, params: CreateChapterParams) -> Result<i64> {
        let created_at = chrono::Utc::now().timestamp();
        let res = sqlx::query(
            "INSERT INTO chapters (volume_id, \"range\", min_number, max_number, sort_order, is_special, pages, release_date, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.volume_id)
        .bind(&params.range)
        .bind(params.min_number)
        .bind(params.max_number)
        .bind(params.sort_order)
        .bind(params.is_special)
        .bind(params.pages)
        .bind(params.release_date)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Scanner hook: a re-scan found a different page count for the chapter.
    pub async fn update_chapter_pages(&self, chapter_id: i64, pages: i32) -> Result<()> {
        sqlx::query("UPDATE chapters SET pages = ? WHERE id = ?")
            .bind(pages)
            .bind(chapter_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Scanner hook: the chapter's file disappeared. Progress rows pointing at
    /// it become orphans until the next cleanup pass.
    pub async fn delete_chapter(&self, chapter_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chapters WHERE id = ?")
            .bind(chapter_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_series(&self, series_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM chapters WHERE volume_id IN (SELECT id FROM volumes WHERE series_id = ?)",
        )
        .bind(series_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM volumes WHERE series_id = ?")
            .bind(series_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM series WHERE id = ?")
            .bind(series_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_series(&self, id: i64) -> Result<Option<models::Series>> {
        let series = sqlx::query_as::<_, models::Series>("SELECT * FROM series WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(series)
    }

    pub async fn get_volume(&self, id: i64) -> Result<Option<models::Volume>> {
        let volume = sqlx::query_as::<_, models::Volume>("SELECT * FROM volumes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(volume)
    }

    pub async fn get_chapter(&self, id: i64) -> Result<Option<models::Chapter>> {
        let chapter = sqlx::query_as::<_, models::Chapter>("SELECT * FROM chapters WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(chapter)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<models::User>> {
        let user = sqlx::query_as::<_, models::User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// One load with includes: every volume of the series together with its
    /// chapters. Engine queries never go back to the store after this.
    pub async fn get_volumes_with_chapters(
        &self,
        series_id: i64,
    ) -> Result<Vec<models::VolumeChapters>> {
        let volumes = sqlx::query_as::<_, models::Volume>(
            "SELECT * FROM volumes WHERE series_id = ? ORDER BY min_number ASC, id ASC",
        )
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;

        let chapters = sqlx::query_as::<_, models::Chapter>(
            "SELECT c.* FROM chapters c
             JOIN volumes v ON c.volume_id = v.id
             WHERE v.series_id = ?
             ORDER BY c.sort_order ASC, c.id ASC",
        )
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_volume: HashMap<i64, Vec<models::Chapter>> = HashMap::new();
        for chapter in chapters {
            by_volume.entry(chapter.volume_id).or_default().push(chapter);
        }

        Ok(volumes
            .into_iter()
            .map(|volume| models::VolumeChapters {
                chapters: by_volume.remove(&volume.id).unwrap_or_default(),
                volume,
            })
            .collect())
    }

    pub async fn create_collection(&self, title: &str) -> Result<i64> {
        let created_at = chrono::Utc::now().timestamp();
        let res = sqlx::query("INSERT INTO collections (title, created_at) VALUES (?, ?)")
            .bind(title)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn add_series_to_collection(&self, collection_id: i64, series_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO collection_series (collection_id, series_id) VALUES (?, ?)",
        )
        .bind(collection_id)
        .bind(series_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_collections(&self) -> Result<Vec<models::Collection>> {
        let collections =
            sqlx::query_as::<_, models::Collection>("SELECT * FROM collections ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(collections)
    }
}
