//! Page-spread pairing for two-page reader layouts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Image metadata for one page, as reported by the renderer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PageMeta {
    pub page_number: i32,
    pub width: u32,
    pub height: u32,
    pub is_wide: bool,
}

/// Maps each page to the first page of its spread. The cover (index 0) and
/// wide pages never pair; a wide page also resets parity, so the page after
/// it starts a fresh pair. A trailing unmatched page maps to itself.
pub fn get_pairs(pages: &[PageMeta]) -> HashMap<i32, i32> {
    let mut pairs = HashMap::new();
    let mut pending: Option<i32> = None;

    for (i, page) in pages.iter().enumerate() {
        if i == 0 {
            pairs.insert(page.page_number, page.page_number);
            continue;
        }
        if page.is_wide {
            if let Some(first) = pending.take() {
                pairs.insert(first, first);
            }
            pairs.insert(page.page_number, page.page_number);
            continue;
        }
        match pending.take() {
            None => pending = Some(page.page_number),
            Some(first) => {
                pairs.insert(first, first);
                pairs.insert(page.page_number, first);
            }
        }
    }
    if let Some(first) = pending {
        pairs.insert(first, first);
    }

    pairs
}
