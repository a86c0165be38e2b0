// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::ops::RangeInclusive;
use time::OffsetDateTime;
use tracing::debug;

use crate::export::{self, Export, ExportFormat};
use crate::filter;
use crate::pager::{PageNav, Pager, page_buttons};
use crate::{Invoice, RecordStore};

/// Search and page state over a [`RecordStore`].
///
/// Only the query and the requested page change during a session. Changing
/// the query always returns to page 1. The requested page is not validated
/// when set; [`Pager::page`] resolves it on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceBrowser {
    store: RecordStore,
    pager: Pager,
    query: String,
    page: usize,
}

/// What the list screen renders: one page window plus the match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSlice<'a> {
    pub items: Vec<&'a Invoice>,
    pub current_page: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub total_matches: usize,
}

impl VisibleSlice<'_> {
    /// 1-based inclusive bounds for "Showing X to Y of Z results". All zero
    /// when nothing matches.
    pub fn showing(&self) -> (usize, usize, usize) {
        if self.total_matches == 0 {
            return (0, 0, 0);
        }
        (self.start_index + 1, self.end_index, self.total_matches)
    }

    pub fn summary(&self) -> String {
        let (first, last, total) = self.showing();
        format!("Showing {first} to {last} of {total} results")
    }

    pub fn buttons(&self) -> RangeInclusive<usize> {
        page_buttons(self.current_page, self.total_pages)
    }

    pub fn can_go(&self, nav: PageNav) -> bool {
        nav.target(self.current_page, self.total_pages) != self.current_page
    }
}

impl InvoiceBrowser {
    pub fn new(store: RecordStore, pager: Pager) -> Self {
        Self {
            store,
            pager,
            query: String::new(),
            page: 1,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn requested_page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.pager.page_size()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
        debug!(query = %self.query, "browser query changed");
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Moves relative to the page actually shown, which can differ from the
    /// requested page after a snap back.
    pub fn navigate(&mut self, nav: PageNav) {
        let slice = self.visible_slice();
        let target = nav.target(slice.current_page, slice.total_pages);
        self.page = target;
    }

    /// Every record matching the current query, in store order.
    pub fn filtered(&self) -> Vec<&Invoice> {
        filter::filter(self.store.records(), &self.query)
    }

    pub fn visible_slice(&self) -> VisibleSlice<'_> {
        let view = self.filtered();
        let total_matches = view.len();
        let page = self.pager.page(&view, self.page);
        VisibleSlice {
            items: page.items.to_vec(),
            current_page: page.current_page,
            total_pages: page.total_pages,
            start_index: page.start_index,
            end_index: page.end_index,
            total_matches,
        }
    }

    /// Export of the full filtered view, independent of the current page.
    pub fn export(&self, format: ExportFormat, now: OffsetDateTime) -> Export {
        let view = self.filtered();
        debug!(
            format = format.extension(),
            records = view.len(),
            "building export"
        );
        Export::build(format, &view, now)
    }

    pub fn clipboard_payload(&self) -> Result<String> {
        export::to_clipboard_payload(&self.filtered())
    }

    /// Print document for the rows on the current page only.
    pub fn print_document(&self) -> String {
        let slice = self.visible_slice();
        export::print_document(&slice.items, slice.start_index)
    }
}
