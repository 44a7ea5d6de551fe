//! Canonical reading order for one series.
//!
//! Regular volumes ascend by number, chapters within a volume by sort order.
//! Loose-leaf chapters are merged numerically between volumes, special
//! chapters always come last. Navigation and the continue point both walk
//! the sequence this module produces and nothing else.

use crate::models::{Chapter, ChapterKind, Volume, VolumeChapters, VolumeKind};

/// One entry in the canonical order. Always backed by a chapter; when the
/// chapter is the sole placeholder of its volume, the unit represents that
/// volume read as a whole.
#[derive(Debug, Clone)]
pub struct ReadingUnit {
    pub chapter: Chapter,
    pub volume_id: i64,
    pub volume_kind: VolumeKind,
    pub whole_volume: bool,
}

/// Flattens a series' volumes into the canonical total order of reading units.
pub fn canonical_order(volumes: &[VolumeChapters]) -> Vec<ReadingUnit> {
    let mut regular: Vec<&VolumeChapters> = Vec::new();
    let mut loose: Vec<(&Volume, &Chapter)> = Vec::new();
    let mut special: Vec<(&Volume, &Chapter)> = Vec::new();

    for vc in volumes {
        match vc.volume.kind() {
            VolumeKind::Regular(_) => regular.push(vc),
            VolumeKind::LooseLeaf => loose.extend(vc.chapters.iter().map(|c| (&vc.volume, c))),
            VolumeKind::Special => special.extend(vc.chapters.iter().map(|c| (&vc.volume, c))),
        }
    }

    // Numerically equal volumes ("1" vs "1.0") rank by creation id.
    regular.sort_by(|a, b| {
        a.volume
            .min_number
            .total_cmp(&b.volume.min_number)
            .then(a.volume.id.cmp(&b.volume.id))
    });
    loose.sort_by(|a, b| {
        a.1.min_number
            .total_cmp(&b.1.min_number)
            .then(a.1.sort_order.total_cmp(&b.1.sort_order))
            .then(a.1.id.cmp(&b.1.id))
    });
    special.sort_by(|a, b| a.1.sort_order.total_cmp(&b.1.sort_order).then(a.1.id.cmp(&b.1.id)));

    let mut order = Vec::new();
    let mut pending = loose.into_iter().peekable();

    for vc in regular {
        // A loose chapter precedes the first volume whose range reaches its
        // numeric value; on exact ties the loose chapter comes first.
        while let Some((vol, ch)) = pending.peek() {
            if ch.min_number <= vc.volume.max_number {
                push_unit(&mut order, vol, ch, VolumeKind::LooseLeaf, false);
                pending.next();
            } else {
                break;
            }
        }
        push_volume(&mut order, vc);
    }
    for (vol, ch) in pending {
        push_unit(&mut order, vol, ch, VolumeKind::LooseLeaf, false);
    }
    for (vol, ch) in special {
        push_unit(&mut order, vol, ch, VolumeKind::Special, false);
    }

    order
}

fn push_volume(order: &mut Vec<ReadingUnit>, vc: &VolumeChapters) {
    let mut chapters: Vec<&Chapter> = vc.chapters.iter().collect();
    chapters.sort_by(|a, b| a.sort_order.total_cmp(&b.sort_order).then(a.id.cmp(&b.id)));

    // Only a true singleton placeholder reads as "this volume, as a unit".
    let whole = chapters.len() == 1 && chapters[0].kind() == ChapterKind::Placeholder;
    for ch in chapters {
        push_unit(order, &vc.volume, ch, vc.volume.kind(), whole);
    }
}

fn push_unit(
    order: &mut Vec<ReadingUnit>,
    volume: &Volume,
    chapter: &Chapter,
    kind: VolumeKind,
    whole_volume: bool,
) {
    order.push(ReadingUnit {
        chapter: chapter.clone(),
        volume_id: volume.id,
        volume_kind: kind,
        whole_volume,
    });
}
