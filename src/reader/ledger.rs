//! Progress ledger: single saves and bulk mark-as-read/unread operations.
//!
//! Each public operation validates its referents, batches every row write
//! into one transaction, and emits a best-effort event afterwards.

use anyhow::{bail, Result};

use hondana_common::models::{Chapter, ChapterKind, VolumeKind};
use hondana_storage::SaveProgressParams;

use super::ReaderService;
use crate::events::ProgressEvent;

pub struct SaveProgressDto {
    pub chapter_id: i64,
    pub volume_id: i64,
    pub series_id: i64,
    pub page_num: i32,
    pub scroll_id: Option<String>,
}

impl ReaderService {
    /// Upserts the user's progress on one chapter. The page number is clamped
    /// into [0, chapter.pages]; only an unknown chapter/user/series yields
    /// `false`.
    pub async fn save_reading_progress(&self, user_id: i64, dto: SaveProgressDto) -> Result<bool> {
        let Some(chapter) = self.storage.get_chapter(dto.chapter_id).await? else {
            tracing::error!("Progress save for unknown chapter {}", dto.chapter_id);
            return Ok(false);
        };
        if self.storage.get_user(user_id).await?.is_none() {
            tracing::error!("Progress save for unknown user {}", user_id);
            return Ok(false);
        }
        let Some(series) = self.storage.get_series(dto.series_id).await? else {
            tracing::error!("Progress save for unknown series {}", dto.series_id);
            return Ok(false);
        };

        let pages_read = dto.page_num.clamp(0, chapter.pages);

        self.storage
            .save_progress(SaveProgressParams {
                user_id,
                chapter_id: chapter.id,
                volume_id: dto.volume_id,
                series_id: dto.series_id,
                library_id: series.library_id,
                pages_read,
                scroll_id: dto.scroll_id,
            })
            .await?;

        self.events.publish(ProgressEvent::ProgressUpdated {
            user_id,
            series_id: dto.series_id,
            chapter_id: chapter.id,
            pages_read,
        });
        Ok(true)
    }

    /// Sets exactly the given chapters to fully read. Idempotent; rows that
    /// do not exist yet are created.
    pub async fn mark_chapters_as_read(
        &self,
        user_id: i64,
        series_id: i64,
        chapters: &[Chapter],
    ) -> Result<()> {
        self.set_chapters(user_id, series_id, chapters, true).await
    }

    /// Resets exactly the given chapters to zero pages read. Rows are reset,
    /// never deleted.
    pub async fn mark_chapters_as_unread(
        &self,
        user_id: i64,
        series_id: i64,
        chapters: &[Chapter],
    ) -> Result<()> {
        self.set_chapters(user_id, series_id, chapters, false).await
    }

    pub async fn mark_series_as_read(&self, user_id: i64, series_id: i64) -> Result<()> {
        let chapters = self.all_chapters(series_id).await?;
        self.set_chapters(user_id, series_id, &chapters, true).await
    }

    pub async fn mark_series_as_unread(&self, user_id: i64, series_id: i64) -> Result<()> {
        let chapters = self.all_chapters(series_id).await?;
        self.set_chapters(user_id, series_id, &chapters, false).await
    }

    /// Marks every regular and loose-leaf chapter numbered at or below the
    /// threshold as read. Specials are excluded whatever their number, and so
    /// are placeholder chapters, whose sentinel label carries no number.
    pub async fn mark_chapters_until_as_read(
        &self,
        user_id: i64,
        series_id: i64,
        chapter_number: f64,
    ) -> Result<()> {
        let volumes = self.storage.get_volumes_with_chapters(series_id).await?;
        let targets: Vec<Chapter> = volumes
            .iter()
            .filter(|vc| !matches!(vc.volume.kind(), VolumeKind::Special))
            .flat_map(|vc| vc.chapters.iter())
            .filter(|ch| {
                !ch.is_special
                    && ch.kind() == ChapterKind::Numbered
                    && ch.min_number <= chapter_number
            })
            .cloned()
            .collect();
        self.set_chapters(user_id, series_id, &targets, true).await
    }

    /// Marks every chapter of each regular volume numbered at or below the
    /// threshold as read, placeholder chapters included. Loose-leaf chapters
    /// are never touched by this call even when numerically smaller.
    pub async fn mark_volumes_until_as_read(
        &self,
        user_id: i64,
        series_id: i64,
        volume_number: f64,
    ) -> Result<()> {
        let volumes = self.storage.get_volumes_with_chapters(series_id).await?;
        let targets: Vec<Chapter> = volumes
            .iter()
            .filter(|vc| matches!(vc.volume.kind(), VolumeKind::Regular(n) if n <= volume_number))
            .flat_map(|vc| vc.chapters.iter())
            .cloned()
            .collect();
        self.set_chapters(user_id, series_id, &targets, true).await
    }

    async fn all_chapters(&self, series_id: i64) -> Result<Vec<Chapter>> {
        let volumes = self.storage.get_volumes_with_chapters(series_id).await?;
        Ok(volumes
            .into_iter()
            .flat_map(|vc| vc.chapters.into_iter())
            .collect())
    }

    async fn set_chapters(
        &self,
        user_id: i64,
        series_id: i64,
        chapters: &[Chapter],
        read: bool,
    ) -> Result<()> {
        if chapters.is_empty() {
            return Ok(());
        }
        if self.storage.get_user(user_id).await?.is_none() {
            bail!("Unknown user {}", user_id);
        }
        let Some(series) = self.storage.get_series(series_id).await? else {
            bail!("Unknown series {}", series_id);
        };

        let mut tx = self.storage.pool.begin().await?;
        for chapter in chapters {
            let pages_read = if read { chapter.pages } else { 0 };
            self.storage
                .set_pages_read(&mut tx, user_id, series.library_id, chapter, series_id, pages_read)
                .await?;
        }
        tx.commit().await?;

        let chapter_ids: Vec<i64> = chapters.iter().map(|c| c.id).collect();
        let event = if read {
            ProgressEvent::ChaptersMarkedRead {
                user_id,
                series_id,
                chapter_ids,
            }
        } else {
            ProgressEvent::ChaptersMarkedUnread {
                user_id,
                series_id,
                chapter_ids,
            }
        };
        self.events.publish(event);
        Ok(())
    }
}
