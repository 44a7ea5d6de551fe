//! Progress rows and the maintenance passes that keep them honest.
//!
//! Uniqueness of (user_id, chapter_id) is a logical invariant here, not a
//! schema constraint: writes go UPDATE-first inside one transaction, and the
//! passes below repair whatever slips through race windows or legacy data.

use anyhow::Result;
use hondana_common::models;
use sqlx::{Sqlite, Transaction};

use crate::Storage;

pub struct SaveProgressParams {
    pub user_id: i64,
    pub chapter_id: i64,
    pub volume_id: i64,
    pub series_id: i64,
    pub library_id: i64,
    pub pages_read: i32,
    pub scroll_id: Option<String>,
}

impl Storage {
    /// Upserts the single row keyed by (user, chapter) in one transaction.
    /// The UPDATE targets the key, not a row id, so a duplicate pair left
    /// over from a race is at least kept mutually consistent.
    pub async fn save_progress(&self, params: SaveProgressParams) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now().timestamp();

        let updated = sqlx::query(
            "UPDATE progress SET pages_read = ?, scroll_id = ?, last_modified = ?
             WHERE user_id = ? AND chapter_id = ?",
        )
        .bind(params.pages_read)
        .bind(&params.scroll_id)
        .bind(now)
        .bind(params.user_id)
        .bind(params.chapter_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO progress (user_id, chapter_id, volume_id, series_id, library_id, pages_read, scroll_id, last_modified)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(params.user_id)
            .bind(params.chapter_id)
            .bind(params.volume_id)
            .bind(params.series_id)
            .bind(params.library_id)
            .bind(params.pages_read)
            .bind(&params.scroll_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Batch-mark helper: sets pages_read for one chapter inside the caller's
    /// transaction, upserting the row if it does not exist yet.
    pub async fn set_pages_read(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        library_id: i64,
        chapter: &models::Chapter,
        series_id: i64,
        pages_read: i32,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        let updated = sqlx::query(
            "UPDATE progress SET pages_read = ?, last_modified = ?
             WHERE user_id = ? AND chapter_id = ?",
        )
        .bind(pages_read)
        .bind(now)
        .bind(user_id)
        .bind(chapter.id)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO progress (user_id, chapter_id, volume_id, series_id, library_id, pages_read, scroll_id, last_modified)
                 VALUES (?, ?, ?, ?, ?, ?, NULL, ?)",
            )
            .bind(user_id)
            .bind(chapter.id)
            .bind(chapter.volume_id)
            .bind(series_id)
            .bind(library_id)
            .bind(pages_read)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    pub async fn get_progress(
        &self,
        user_id: i64,
        chapter_id: i64,
    ) -> Result<Option<models::Progress>> {
        // Duplicates may exist until consolidation runs; prefer the furthest one.
        let row = sqlx::query_as::<_, models::Progress>(
            "SELECT * FROM progress WHERE user_id = ? AND chapter_id = ?
             ORDER BY pages_read DESC, last_modified DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_series_progress(
        &self,
        user_id: i64,
        series_id: i64,
    ) -> Result<Vec<models::Progress>> {
        let rows = sqlx::query_as::<_, models::Progress>(
            "SELECT * FROM progress WHERE user_id = ? AND series_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Collapses duplicate (user, chapter) rows to a single one, keeping the
    /// maximum pages_read and the most recently written scroll marker.
    /// Returns the number of rows removed.
    pub async fn consolidate_progress(&self) -> Result<u64> {
        let dups: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT user_id, chapter_id FROM progress
             GROUP BY user_id, chapter_id HAVING COUNT(*) > 1",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut removed = 0u64;
        for (user_id, chapter_id) in dups {
            let mut tx = self.pool.begin().await?;

            let rows = sqlx::query_as::<_, models::Progress>(
                "SELECT * FROM progress WHERE user_id = ? AND chapter_id = ?",
            )
            .bind(user_id)
            .bind(chapter_id)
            .fetch_all(&mut *tx)
            .await?;

            let Some(keeper) = rows
                .iter()
                .max_by(|a, b| {
                    a.pages_read
                        .cmp(&b.pages_read)
                        .then(a.last_modified.cmp(&b.last_modified))
                })
            else {
                continue;
            };
            let scroll_id = rows
                .iter()
                .filter(|r| r.scroll_id.is_some())
                .max_by_key(|r| r.last_modified)
                .and_then(|r| r.scroll_id.clone());

            sqlx::query("UPDATE progress SET scroll_id = ? WHERE id = ?")
                .bind(&scroll_id)
                .bind(keeper.id)
                .execute(&mut *tx)
                .await?;
            let deleted = sqlx::query(
                "DELETE FROM progress WHERE user_id = ? AND chapter_id = ? AND id != ?",
            )
            .bind(user_id)
            .bind(chapter_id)
            .bind(keeper.id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            removed += deleted.rows_affected();
        }

        if removed > 0 {
            tracing::warn!("Consolidated {} duplicate progress rows", removed);
        }
        Ok(removed)
    }

    /// Clamps pages_read back into [0, chapter.pages] after a re-scan shrank
    /// a chapter. Returns the number of rows touched.
    pub async fn ensure_chapter_progress_is_capped(&self) -> Result<u64> {
        let capped = sqlx::query(
            "UPDATE progress
             SET pages_read = (SELECT pages FROM chapters WHERE chapters.id = progress.chapter_id)
             WHERE pages_read > (SELECT pages FROM chapters WHERE chapters.id = progress.chapter_id)",
        )
        .execute(&self.pool)
        .await?;

        let floored = sqlx::query("UPDATE progress SET pages_read = 0 WHERE pages_read < 0")
            .execute(&self.pool)
            .await?;

        let touched = capped.rows_affected() + floored.rows_affected();
        if touched > 0 {
            tracing::warn!("Re-clamped pages_read on {} progress rows", touched);
        }
        Ok(touched)
    }

    /// Removes progress rows whose chapter no longer exists and collections
    /// left with zero member series.
    pub async fn cleanup_db_entries(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let orphans =
            sqlx::query("DELETE FROM progress WHERE chapter_id NOT IN (SELECT id FROM chapters)")
                .execute(&mut *tx)
                .await?;
        sqlx::query(
            "DELETE FROM collection_series WHERE series_id NOT IN (SELECT id FROM series)",
        )
        .execute(&mut *tx)
        .await?;
        let empty = sqlx::query(
            "DELETE FROM collections WHERE id NOT IN (SELECT collection_id FROM collection_series)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if orphans.rows_affected() > 0 || empty.rows_affected() > 0 {
            tracing::info!(
                "Cleanup removed {} orphaned progress rows and {} empty collections",
                orphans.rows_affected(),
                empty.rows_affected()
            );
        }
        Ok(())
    }
}
