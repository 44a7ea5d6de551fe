#![allow(dead_code)]

use hondana::reader::ledger::SaveProgressDto;
use hondana::{EventSink, ReaderService};
use hondana_common::models::{
    SeriesFormat, DEFAULT_CHAPTER_RANGE, LOOSE_LEAF_VOLUME_NUMBER, SPECIAL_VOLUME_NUMBER,
};
use hondana_storage::{CreateChapterParams, CreateSeriesParams, CreateVolumeParams, Storage};

/// Scenario catalog used across the suites: a loose-leaf volume with
/// chapters 1 and 2, volumes "2" and "3" with two chapters each, and one
/// special chapter at the end.
pub struct SeededSeries {
    pub storage: Storage,
    pub reader: ReaderService,
    pub user_id: i64,
    pub series_id: i64,
    pub loose_volume_id: i64,
    pub vol2_id: i64,
    pub vol3_id: i64,
    pub special_volume_id: i64,
    pub ch1: i64,
    pub ch2: i64,
    pub ch3: i64,
    pub ch4: i64,
    pub ch5: i64,
    pub ch6: i64,
    pub sp1: i64,
}

pub async fn seeded_series() -> SeededSeries {
    let storage = Storage::new_in_memory().await.unwrap();
    let library_id = storage.create_library("Manga").await.unwrap();
    let user_id = storage.create_user("alice").await.unwrap();
    let series_id = storage
        .create_series(CreateSeriesParams {
            library_id,
            name: "Test Series".to_string(),
            format: SeriesFormat::Archive,
        })
        .await
        .unwrap();

    let loose_volume_id = add_volume(&storage, series_id, "", LOOSE_LEAF_VOLUME_NUMBER).await;
    let vol2_id = add_volume(&storage, series_id, "Volume 2", 2.0).await;
    let vol3_id = add_volume(&storage, series_id, "Volume 3", 3.0).await;
    let special_volume_id = add_volume(&storage, series_id, "Specials", SPECIAL_VOLUME_NUMBER).await;

    let ch1 = add_chapter(&storage, loose_volume_id, "1", 1.0, 1.0, 10).await;
    let ch2 = add_chapter(&storage, loose_volume_id, "2", 2.0, 2.0, 10).await;
    let ch3 = add_chapter(&storage, vol2_id, "3", 3.0, 1.0, 10).await;
    let ch4 = add_chapter(&storage, vol2_id, "4", 4.0, 2.0, 10).await;
    let ch5 = add_chapter(&storage, vol3_id, "5", 5.0, 1.0, 10).await;
    let ch6 = add_chapter(&storage, vol3_id, "6", 6.0, 2.0, 10).await;
    let sp1 = add_special_chapter(&storage, special_volume_id, "SP01", 1.0, 10).await;

    let reader = ReaderService::new(storage.clone(), EventSink::default());

    SeededSeries {
        storage,
        reader,
        user_id,
        series_id,
        loose_volume_id,
        vol2_id,
        vol3_id,
        special_volume_id,
        ch1,
        ch2,
        ch3,
        ch4,
        ch5,
        ch6,
        sp1,
    }
}

pub async fn add_volume(storage: &Storage, series_id: i64, name: &str, number: f64) -> i64 {
    storage
        .create_volume(CreateVolumeParams {
            series_id,
            name: name.to_string(),
            min_number: number,
            max_number: number,
        })
        .await
        .unwrap()
}

pub async fn add_chapter(
    storage: &Storage,
    volume_id: i64,
    range: &str,
    number: f64,
    sort_order: f64,
    pages: i32,
) -> i64 {
    storage
        .create_chapter(CreateChapterParams {
            volume_id,
            range: range.to_string(),
            min_number: number,
            max_number: number,
            sort_order,
            is_special: false,
            pages,
            release_date: None,
        })
        .await
        .unwrap()
}

pub async fn add_special_chapter(
    storage: &Storage,
    volume_id: i64,
    label: &str,
    sort_order: f64,
    pages: i32,
) -> i64 {
    storage
        .create_chapter(CreateChapterParams {
            volume_id,
            range: label.to_string(),
            min_number: 0.0,
            max_number: 0.0,
            sort_order,
            is_special: true,
            pages,
            release_date: None,
        })
        .await
        .unwrap()
}

pub async fn add_placeholder_chapter(storage: &Storage, volume_id: i64, pages: i32) -> i64 {
    storage
        .create_chapter(CreateChapterParams {
            volume_id,
            range: DEFAULT_CHAPTER_RANGE.to_string(),
            min_number: 0.0,
            max_number: 0.0,
            sort_order: 0.0,
            is_special: false,
            pages,
            release_date: None,
        })
        .await
        .unwrap()
}

/// Reads the chapter to its last page through the public save path.
pub async fn read_fully(s: &SeededSeries, chapter_id: i64) {
    let chapter = s.storage.get_chapter(chapter_id).await.unwrap().unwrap();
    let saved = s
        .reader
        .save_reading_progress(
            s.user_id,
            SaveProgressDto {
                chapter_id,
                volume_id: chapter.volume_id,
                series_id: s.series_id,
                page_num: chapter.pages,
                scroll_id: None,
            },
        )
        .await
        .unwrap();
    assert!(saved);
}

pub async fn pages_read(s: &SeededSeries, chapter_id: i64) -> Option<i32> {
    s.storage
        .get_progress(s.user_id, chapter_id)
        .await
        .unwrap()
        .map(|p| p.pages_read)
}
