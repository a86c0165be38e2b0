// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::ops::RangeInclusive;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of page buttons shown once there are more pages than fit.
const BUTTON_WINDOW: usize = 3;
/// Up to this many pages every button is shown.
const ALL_BUTTONS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page window over a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'v, T> {
    pub items: &'v [T],
    pub current_page: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            bail!("page size must be at least 1");
        }
        Ok(Self { page_size })
    }

    pub const fn page_size(self) -> usize {
        self.page_size
    }

    pub fn total_pages(self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Resolves `requested_page` against `view`.
    ///
    /// A request past the last page snaps back to page 1, not to the last
    /// page. With an empty view the request is kept as-is and the window is
    /// empty. Page 0 is treated as page 1.
    pub fn page<'v, T>(self, view: &'v [T], requested_page: usize) -> Page<'v, T> {
        let total_pages = self.total_pages(view.len());
        let requested_page = requested_page.max(1);
        let current_page = if total_pages > 0 && requested_page > total_pages {
            1
        } else {
            requested_page
        };

        let end_limit = view.len();
        let start_index = ((current_page - 1).saturating_mul(self.page_size)).min(end_limit);
        let end_index = start_index.saturating_add(self.page_size).min(end_limit);

        Page {
            items: &view[start_index..end_index],
            current_page,
            total_pages,
            start_index,
            end_index,
        }
    }
}

impl<T> Page<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn buttons(&self) -> RangeInclusive<usize> {
        page_buttons(self.current_page, self.total_pages)
    }

    pub fn can_go(&self, nav: PageNav) -> bool {
        nav.target(self.current_page, self.total_pages) != self.current_page
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    First,
    Prev,
    Next,
    Last,
    To(usize),
}

impl PageNav {
    /// Page reached from `current`. Returns `current` when the move is not
    /// possible, including every move on a view with no pages.
    pub fn target(self, current: usize, total_pages: usize) -> usize {
        if total_pages == 0 {
            return current;
        }
        match self {
            Self::First => 1,
            Self::Prev => current.saturating_sub(1).max(1),
            Self::Next => (current + 1).min(total_pages),
            Self::Last => total_pages,
            Self::To(page) if (1..=total_pages).contains(&page) => page,
            Self::To(_) => current,
        }
    }
}

/// Page numbers to render as buttons.
///
/// Up to five pages every page is listed. Beyond that a three-page window
/// slides with the current page, pinned to either end near the edges.
pub fn page_buttons(current_page: usize, total_pages: usize) -> RangeInclusive<usize> {
    if total_pages <= ALL_BUTTONS_LIMIT {
        return 1..=total_pages;
    }
    if current_page <= 2 {
        1..=BUTTON_WINDOW
    } else if current_page >= total_pages - 1 {
        (total_pages - 2)..=total_pages
    } else {
        (current_page - 1)..=(current_page + 1)
    }
}
