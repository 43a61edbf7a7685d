//! Page arithmetic for the notes list

use std::num::IntErrorKind;

use crate::config::defaults;

const UNTITLED_LABEL: &str = "Untitled";

/// Highest valid page index for `total` items.
pub fn max_page(total: u64, page_size: u64) -> u64 {
    total.saturating_sub(1) / page_size.max(1)
}

/// Parse a page field from trigger data. Anything that is not a
/// non-negative integer becomes page 0. Numbers too large for `u64`
/// saturate.
pub fn parse_page(raw: &str) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(page) => page,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => u64::MAX,
        Err(_) => 0,
    }
}

/// A clamped slice of an owner's notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub max_page: u64,
    pub total: u64,
    pub page_size: u64,
}

impl PageWindow {
    /// Clamp `requested` into `[0, max_page]` for the given total.
    pub fn new(requested: u64, total: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let max_page = max_page(total, page_size);
        Self {
            page: requested.min(max_page),
            max_page,
            total,
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.max_page
    }

    /// 1-based position shown between the navigation arrows, e.g. "2/3".
    pub fn indicator(&self) -> String {
        format!("{}/{}", self.page + 1, self.max_page + 1)
    }
}

/// Single-line list label: the first line of the note, cut to 40 characters.
pub fn note_label(text: &str) -> String {
    let first_line = text.trim().lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return UNTITLED_LABEL.to_string();
    }
    first_line.chars().take(defaults::LABEL_MAX_CHARS).collect()
}
