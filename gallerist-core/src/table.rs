//! State behind the paginated artwork table.
//!
//! `TableState` never performs I/O. It hands out [`PageRequest`]s and
//! [`BulkRequest`]s, and whoever runs them reports back through
//! [`TableState::apply_page`] and [`TableState::finish_bulk`]. All mutation
//! happens through `&mut self` on the caller's single event thread.

use tracing::{debug, info, warn};

use crate::{page_count, Artwork, ArtworkId, BulkRequest, FetchError, Page, Selection};

/// A page fetch, tagged with the cursor that was current when it was issued
/// and a dispatch number that only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub seq: u64,
}

/// What [`TableState::apply_page`] did with a finished fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The response (or its error) is now what the table shows.
    Applied,
    /// The cursor moved on before the response arrived; nothing changed.
    Stale,
    /// The response reported fewer pages than the cursor asked for. The
    /// cursor now sits on the last page and this request must be run.
    Redirect(PageRequest),
}

#[derive(Debug, Clone)]
pub struct TableState {
    cursor: u32,
    window: Vec<Artwork>,
    total: u64,
    selection: Selection,
    page_loading: bool,
    bulk_loading: bool,
    last_dispatch: u64,
    page_error: Option<String>,
    bulk_error: Option<String>,
    page_capacity: usize,
}

impl TableState {
    pub fn new(page_capacity: usize) -> Self {
        Self {
            cursor: 1,
            window: Vec::new(),
            total: 0,
            selection: Selection::new(),
            page_loading: false,
            bulk_loading: false,
            last_dispatch: 0,
            page_error: None,
            bulk_error: None,
            page_capacity: page_capacity.max(1),
        }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn window(&self) -> &[Artwork] {
        &self.window
    }

    pub fn total_records(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        page_count(self.total, self.page_capacity)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_loading(&self) -> bool {
        self.page_loading || self.bulk_loading
    }

    pub fn is_bulk_loading(&self) -> bool {
        self.bulk_loading
    }

    /// Why the last fetch of the current page failed, until a later fetch
    /// succeeds.
    pub fn page_error(&self) -> Option<&str> {
        self.page_error.as_deref()
    }

    /// Why the last bulk selection failed, until the next one is submitted.
    pub fn bulk_error(&self) -> Option<&str> {
        self.bulk_error.as_deref()
    }

    /// Rows of the current window that render as checked.
    pub fn visible_selection(&self) -> Vec<ArtworkId> {
        self.selection.visible(&self.window)
    }

    /// First fetch for the current cursor.
    pub fn open(&mut self) -> PageRequest {
        self.reload()
    }

    /// Re-issue the fetch for the page under the cursor.
    pub fn reload(&mut self) -> PageRequest {
        self.last_dispatch += 1;
        self.page_loading = true;
        debug!(page = self.cursor, seq = self.last_dispatch, "page fetch dispatched");
        PageRequest {
            page: self.cursor,
            seq: self.last_dispatch,
        }
    }

    /// Move to the 0-based `index` a paginator reports.
    ///
    /// Returns `None` when that is already the current page and nothing is
    /// pending for it. Once a total is known the target is clamped to the
    /// last page.
    pub fn on_page_change(&mut self, index: u32) -> Option<PageRequest> {
        let mut page = index.saturating_add(1);
        let pages = self.total_pages();
        if pages > 0 {
            page = page.min(pages);
        }
        if page == self.cursor && !self.window.is_empty() && !self.page_loading {
            return None;
        }
        self.cursor = page;
        Some(self.reload())
    }

    /// Apply a finished page fetch.
    ///
    /// Results whose page no longer matches the cursor are dropped. A result
    /// for the right page still leaves the loading flag up if a newer fetch
    /// of that page is outstanding.
    pub fn apply_page(&mut self, req: PageRequest, result: Result<Page, FetchError>) -> PageOutcome {
        if req.page != self.cursor {
            warn!(stale = req.page, cursor = self.cursor, "discarding superseded page response");
            return PageOutcome::Stale;
        }
        if req.seq == self.last_dispatch {
            self.page_loading = false;
        }
        match result {
            Ok(page) => {
                self.total = page.total;
                self.page_error = None;
                let pages = self.total_pages();
                if pages > 0 && self.cursor > pages {
                    info!(requested = self.cursor, last = pages, "page is past the end, moving to the last page");
                    self.cursor = pages;
                    return PageOutcome::Redirect(self.reload());
                }
                debug!(page = req.page, rows = page.records.len(), total = page.total, "page applied");
                self.window = page.records;
            }
            Err(e) => {
                warn!(page = req.page, error = %e, "page fetch failed");
                self.page_error = Some(e.to_string());
            }
        }
        PageOutcome::Applied
    }

    /// Reconcile the checked subset the table reports for the visible rows.
    ///
    /// Ignored while a bulk selection is running, since its result replaces
    /// the selection anyway.
    pub fn on_selection_toggle(&mut self, checked: &[ArtworkId]) -> bool {
        if self.bulk_loading {
            debug!("toggle ignored during bulk selection");
            return false;
        }
        self.selection.reconcile(checked, &self.window);
        true
    }

    /// Start a "select first N" run from raw input text.
    ///
    /// Invalid input, or a run already in flight, is a silent no-op.
    pub fn on_bulk_select_submit(&mut self, limit_text: &str) -> Option<BulkRequest> {
        if self.bulk_loading {
            return None;
        }
        let req = BulkRequest::new(limit_text, self.total, self.page_capacity)?;
        self.bulk_loading = true;
        self.bulk_error = None;
        debug!(limit = req.limit, pages = req.pages_needed(), "bulk selection dispatched");
        Some(req)
    }

    /// Commit a bulk run. The selection is replaced only on success; returns
    /// whether the run succeeded.
    pub fn finish_bulk(&mut self, req: BulkRequest, result: Result<Vec<ArtworkId>, FetchError>) -> bool {
        self.bulk_loading = false;
        match result {
            Ok(ids) => {
                info!(limit = req.limit, selected = ids.len(), "bulk selection committed");
                self.selection.replace(ids);
                true
            }
            Err(e) => {
                warn!(limit = req.limit, error = %e, "bulk selection aborted");
                self.bulk_error = Some(format!("bulk select failed: {e}"));
                false
            }
        }
    }
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(crate::PAGE_CAPACITY)
    }
}
