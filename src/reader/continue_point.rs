//! Resume-chapter selection.

use std::collections::HashMap;

use hondana_common::models::Chapter;
use hondana_common::ordering::ReadingUnit;

/// First unit in canonical order that is not fully read. A user with no
/// progress in the series at all gets the very first unit regardless of
/// anything else, and so does a user who has read everything (restart).
/// Specials sit at the end of the order, so they are only reached once all
/// regular and loose-leaf content is fully read.
///
/// `has_any_progress` is an explicit input so the selection stays a pure
/// function of its arguments.
pub fn continue_point(
    order: &[ReadingUnit],
    pages_read: &HashMap<i64, i32>,
    has_any_progress: bool,
) -> Option<Chapter> {
    let first = order.first()?;
    if !has_any_progress {
        return Some(first.chapter.clone());
    }

    for unit in order {
        let read = pages_read.get(&unit.chapter.id).copied().unwrap_or(0);
        if read < unit.chapter.pages {
            return Some(unit.chapter.clone());
        }
    }

    Some(first.chapter.clone())
}
