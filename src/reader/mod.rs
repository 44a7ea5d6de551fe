//! The reading engine: navigation, continue point and the progress ledger.
//!
//! Every public operation loads the series catalog once, computes what it
//! needs in memory, and commits any writes as one transaction.

pub mod continue_point;
pub mod ledger;
pub mod navigation;

use anyhow::{anyhow, Result};
use std::collections::HashMap;

use hondana_common::models::Chapter;
use hondana_common::ordering::{canonical_order, ReadingUnit};
use hondana_storage::Storage;

use crate::events::EventSink;

pub struct ReaderService {
    storage: Storage,
    events: EventSink,
}

impl ReaderService {
    pub fn new(storage: Storage, events: EventSink) -> Self {
        Self { storage, events }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Recomputed from current catalog state on every call, so chapters
    /// picked up by a re-scan are visible immediately.
    async fn load_order(&self, series_id: i64) -> Result<Vec<ReadingUnit>> {
        let volumes = self.storage.get_volumes_with_chapters(series_id).await?;
        Ok(canonical_order(&volumes))
    }

    /// Chapter immediately after the given one in canonical order, or None
    /// past the end of the series (specials included) and for stale refs.
    pub async fn get_next_chapter_id(
        &self,
        series_id: i64,
        volume_id: i64,
        chapter_id: i64,
        user_id: i64,
    ) -> Result<Option<i64>> {
        tracing::debug!(
            "Next chapter for user {} from chapter {} in series {}",
            user_id,
            chapter_id,
            series_id
        );
        let order = self.load_order(series_id).await?;
        Ok(navigation::next_in_order(&order, volume_id, chapter_id))
    }

    /// Mirror of [`Self::get_next_chapter_id`]: None before the first unit.
    pub async fn get_prev_chapter_id(
        &self,
        series_id: i64,
        volume_id: i64,
        chapter_id: i64,
        user_id: i64,
    ) -> Result<Option<i64>> {
        tracing::debug!(
            "Previous chapter for user {} from chapter {} in series {}",
            user_id,
            chapter_id,
            series_id
        );
        let order = self.load_order(series_id).await?;
        Ok(navigation::prev_in_order(&order, volume_id, chapter_id))
    }

    /// The chapter the user should resume the series at.
    pub async fn get_continue_point(&self, series_id: i64, user_id: i64) -> Result<Chapter> {
        let order = self.load_order(series_id).await?;
        let progress = self.storage.get_series_progress(user_id, series_id).await?;

        let has_any_progress = !progress.is_empty();
        let mut pages_read: HashMap<i64, i32> = HashMap::new();
        for row in progress {
            // Pre-consolidation duplicates: the furthest row wins.
            let entry = pages_read.entry(row.chapter_id).or_insert(0);
            *entry = (*entry).max(row.pages_read);
        }

        continue_point::continue_point(&order, &pages_read, has_any_progress)
            .ok_or_else(|| anyhow!("Series {} has no chapters", series_id))
    }
}
