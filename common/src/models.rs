use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Volume number the scanner assigns to chapters not grouped under a real volume.
pub const LOOSE_LEAF_VOLUME_NUMBER: f64 = -100_000.0;
/// Volume number the scanner assigns to bonus content. Always sorts last.
pub const SPECIAL_VOLUME_NUMBER: f64 = 100_000.0;
/// Range label of a chapter that stands in for its whole volume.
pub const DEFAULT_CHAPTER_RANGE: &str = "-100000";

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SeriesFormat {
    Archive,
    Image,
    Book,
    Pdf,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Library {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Series {
    pub id: i64,
    pub library_id: i64,
    pub name: String,
    pub format: SeriesFormat,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Volume {
    pub id: i64,
    pub series_id: i64,
    pub name: String,
    pub min_number: f64,
    pub max_number: f64,
    pub created_at: i64,
}

/// Classification a volume's sentinel numbers encode. Ordering logic matches
/// on this instead of comparing raw numbers against the sentinels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeKind {
    Regular(f64),
    LooseLeaf,
    Special,
}

impl Volume {
    pub fn kind(&self) -> VolumeKind {
        if self.min_number == SPECIAL_VOLUME_NUMBER {
            VolumeKind::Special
        } else if self.min_number == LOOSE_LEAF_VOLUME_NUMBER {
            VolumeKind::LooseLeaf
        } else {
            VolumeKind::Regular(self.min_number)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub volume_id: i64,
    /// Display label. May be non-numeric ("SP01").
    pub range: String,
    pub min_number: f64,
    pub max_number: f64,
    /// Assigned independently of the label so numeric ordering is always possible.
    pub sort_order: f64,
    pub is_special: bool,
    pub pages: i32,
    pub release_date: Option<NaiveDate>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterKind {
    Numbered,
    /// Sole chapter standing in for its volume as a unit.
    Placeholder,
}

impl Chapter {
    pub fn kind(&self) -> ChapterKind {
        if self.range == DEFAULT_CHAPTER_RANGE {
            ChapterKind::Placeholder
        } else {
            ChapterKind::Numbered
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Progress {
    pub id: i64,
    pub user_id: i64,
    pub chapter_id: i64,
    pub volume_id: i64,
    pub series_id: i64,
    pub library_id: i64,
    pub pages_read: i32,
    /// Scroll-position marker for book-format chapters.
    pub scroll_id: Option<String>,
    pub last_modified: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    pub created_at: i64,
}

/// A volume with its chapters, as loaded by one series fetch.
#[derive(Debug, Clone)]
pub struct VolumeChapters {
    pub volume: Volume,
    pub chapters: Vec<Chapter>,
}
