mod support;

use hondana::reader::ledger::SaveProgressDto;
use hondana::ProgressEvent;
use support::{add_placeholder_chapter, add_volume, pages_read, read_fully, seeded_series};

#[tokio::test]
async fn save_clamps_page_number_into_chapter_bounds() {
    let s = seeded_series().await;
    let saved = s
        .reader
        .save_reading_progress(
            s.user_id,
            SaveProgressDto {
                chapter_id: s.ch1,
                volume_id: s.loose_volume_id,
                series_id: s.series_id,
                page_num: 9999,
                scroll_id: None,
            },
        )
        .await
        .unwrap();
    assert!(saved);
    assert_eq!(pages_read(&s, s.ch1).await, Some(10));

    s.reader
        .save_reading_progress(
            s.user_id,
            SaveProgressDto {
                chapter_id: s.ch1,
                volume_id: s.loose_volume_id,
                series_id: s.series_id,
                page_num: -3,
                scroll_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(pages_read(&s, s.ch1).await, Some(0));
}

#[tokio::test]
async fn save_for_unknown_chapter_or_user_reports_failure() {
    let s = seeded_series().await;
    let saved = s
        .reader
        .save_reading_progress(
            s.user_id,
            SaveProgressDto {
                chapter_id: 9999,
                volume_id: s.loose_volume_id,
                series_id: s.series_id,
                page_num: 1,
                scroll_id: None,
            },
        )
        .await
        .unwrap();
    assert!(!saved);

    let saved = s
        .reader
        .save_reading_progress(
            9999,
            SaveProgressDto {
                chapter_id: s.ch1,
                volume_id: s.loose_volume_id,
                series_id: s.series_id,
                page_num: 1,
                scroll_id: None,
            },
        )
        .await
        .unwrap();
    assert!(!saved);
    assert_eq!(pages_read(&s, s.ch1).await, None);
}

#[tokio::test]
async fn mark_series_read_then_unread_resets_without_deleting() {
    let s = seeded_series().await;
    s.reader
        .mark_series_as_read(s.user_id, s.series_id)
        .await
        .unwrap();

    let rows = s
        .storage
        .get_series_progress(s.user_id, s.series_id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|r| r.pages_read == 10));

    s.reader
        .mark_series_as_unread(s.user_id, s.series_id)
        .await
        .unwrap();

    let rows = s
        .storage
        .get_series_progress(s.user_id, s.series_id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|r| r.pages_read == 0));
}

#[tokio::test]
async fn marking_is_idempotent() {
    let s = seeded_series().await;
    for _ in 0..2 {
        s.reader
            .mark_series_as_read(s.user_id, s.series_id)
            .await
            .unwrap();
    }
    let rows = s
        .storage
        .get_series_progress(s.user_id, s.series_id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 7);
}

#[tokio::test]
async fn chapters_until_excludes_specials_whatever_their_number() {
    let s = seeded_series().await;
    s.reader
        .mark_chapters_until_as_read(s.user_id, s.series_id, 100.0)
        .await
        .unwrap();

    for id in [s.ch1, s.ch2, s.ch3, s.ch4, s.ch5, s.ch6] {
        assert_eq!(pages_read(&s, id).await, Some(10));
    }
    assert_eq!(pages_read(&s, s.sp1).await, None);
}

#[tokio::test]
async fn chapters_until_respects_the_numeric_threshold() {
    let s = seeded_series().await;
    s.reader
        .mark_chapters_until_as_read(s.user_id, s.series_id, 3.0)
        .await
        .unwrap();

    for id in [s.ch1, s.ch2, s.ch3] {
        assert_eq!(pages_read(&s, id).await, Some(10));
    }
    for id in [s.ch4, s.ch5, s.ch6, s.sp1] {
        assert_eq!(pages_read(&s, id).await, None);
    }
}

#[tokio::test]
async fn volumes_until_covers_placeholders_but_never_loose_leaf() {
    let s = seeded_series().await;
    // Volume 1 exists only as a whole-volume placeholder.
    let vol1 = add_volume(&s.storage, s.series_id, "Volume 1", 1.0).await;
    let placeholder = add_placeholder_chapter(&s.storage, vol1, 10).await;

    s.reader
        .mark_volumes_until_as_read(s.user_id, s.series_id, 2.0)
        .await
        .unwrap();

    assert_eq!(pages_read(&s, placeholder).await, Some(10));
    assert_eq!(pages_read(&s, s.ch3).await, Some(10));
    assert_eq!(pages_read(&s, s.ch4).await, Some(10));
    // Loose-leaf chapters 1 and 2 are numerically smaller but untouched.
    assert_eq!(pages_read(&s, s.ch1).await, None);
    assert_eq!(pages_read(&s, s.ch2).await, None);
    assert_eq!(pages_read(&s, s.ch5).await, None);
}

#[tokio::test]
async fn duplicate_rows_consolidate_to_the_furthest_read() {
    let s = seeded_series().await;
    for pages in [1, 3] {
        sqlx::query(
            "INSERT INTO progress (user_id, chapter_id, volume_id, series_id, library_id, pages_read, scroll_id, last_modified)
             VALUES (?, ?, ?, ?, 1, ?, NULL, 0)",
        )
        .bind(s.user_id)
        .bind(s.ch1)
        .bind(s.loose_volume_id)
        .bind(s.series_id)
        .bind(pages)
        .execute(&s.storage.pool)
        .await
        .unwrap();
    }

    s.storage.consolidate_progress().await.unwrap();

    let rows = s
        .storage
        .get_series_progress(s.user_id, s.series_id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pages_read, 3);
}

#[tokio::test]
async fn rescan_shrink_is_repaired_by_the_cap_pass() {
    let s = seeded_series().await;
    s.reader
        .save_reading_progress(
            s.user_id,
            SaveProgressDto {
                chapter_id: s.ch1,
                volume_id: s.loose_volume_id,
                series_id: s.series_id,
                page_num: 2,
                scroll_id: None,
            },
        )
        .await
        .unwrap();
    s.storage.update_chapter_pages(s.ch1, 1).await.unwrap();

    s.storage.ensure_chapter_progress_is_capped().await.unwrap();
    assert_eq!(pages_read(&s, s.ch1).await, Some(1));
}

#[tokio::test]
async fn progress_operations_emit_events() {
    let s = seeded_series().await;
    let mut rx = s.reader.events().subscribe();

    read_fully(&s, s.ch1).await;
    match rx.recv().await.unwrap() {
        ProgressEvent::ProgressUpdated {
            chapter_id,
            pages_read,
            ..
        } => {
            assert_eq!(chapter_id, s.ch1);
            assert_eq!(pages_read, 10);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    s.reader
        .mark_series_as_unread(s.user_id, s.series_id)
        .await
        .unwrap();
    match rx.recv().await.unwrap() {
        ProgressEvent::ChaptersMarkedUnread { chapter_ids, .. } => {
            assert!(chapter_ids.contains(&s.ch1));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn scroll_marker_round_trips_through_save() {
    let s = seeded_series().await;
    s.reader
        .save_reading_progress(
            s.user_id,
            SaveProgressDto {
                chapter_id: s.ch1,
                volume_id: s.loose_volume_id,
                series_id: s.series_id,
                page_num: 3,
                scroll_id: Some("//p[4]".to_string()),
            },
        )
        .await
        .unwrap();

    let row = s
        .storage
        .get_progress(s.user_id, s.ch1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.scroll_id.as_deref(), Some("//p[4]"));
}
