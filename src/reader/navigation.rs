//! Pure next/previous resolution over a precomputed canonical order.
//!
//! Read state never skips a unit, and there is no wraparound: walking past
//! either end yields None, which the caller surfaces as "end of series".

use hondana_common::ordering::ReadingUnit;

fn position(order: &[ReadingUnit], volume_id: i64, chapter_id: i64) -> Option<usize> {
    // Matching on the (volume, chapter) pair treats a chapter whose volume
    // assignment changed under us as stale rather than jumping somewhere odd.
    order
        .iter()
        .position(|u| u.chapter.id == chapter_id && u.volume_id == volume_id)
}

pub fn next_in_order(order: &[ReadingUnit], volume_id: i64, chapter_id: i64) -> Option<i64> {
    let pos = position(order, volume_id, chapter_id)?;
    order.get(pos + 1).map(|u| u.chapter.id)
}

pub fn prev_in_order(order: &[ReadingUnit], volume_id: i64, chapter_id: i64) -> Option<i64> {
    let pos = position(order, volume_id, chapter_id)?;
    let prev = pos.checked_sub(1)?;
    order.get(prev).map(|u| u.chapter.id)
}
