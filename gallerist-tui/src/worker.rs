//! Runs catalog fetches off the UI thread.
//!
//! Jobs go to the tokio blocking pool; their results come back over a
//! channel and are applied to the [`TableState`] only on the event loop, so
//! the table has a single mutator. Page jobs may finish in any order; the
//! table's cursor check throws away the stale ones. A response that moves
//! the cursor back to the last page queues the follow-up fetch itself.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use gallerist_core::{
    collect_first, ArtworkId, BulkRequest, FetchError, Page, PageOutcome, PageRequest, PageSource, TableState,
};
use tokio::runtime::Handle;

enum Completion {
    Page(PageRequest, Result<Page, FetchError>),
    Bulk(BulkRequest, Result<Vec<ArtworkId>, FetchError>),
}

/// What a drained completion changed, for the caller's UI bookkeeping.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Drained {
    pub pages_applied: usize,
    pub stale_discarded: usize,
    pub redirected: usize,
    pub bulk_succeeded: bool,
    pub bulk_failed: bool,
}

pub struct Worker {
    handle: Handle,
    source: Arc<dyn PageSource>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    pending: usize,
}

impl Worker {
    pub fn new(handle: Handle, source: Arc<dyn PageSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            handle,
            source,
            tx,
            rx,
            pending: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn spawn_page(&mut self, req: PageRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.pending += 1;
        self.handle.spawn_blocking(move || {
            let result = source.fetch(req.page);
            let _ = tx.send(Completion::Page(req, result));
        });
    }

    /// The whole bulk run is one job so its pages are fetched strictly in
    /// order.
    pub fn spawn_bulk(&mut self, req: BulkRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.pending += 1;
        self.handle.spawn_blocking(move || {
            let result = collect_first(&req, source.as_ref());
            let _ = tx.send(Completion::Bulk(req, result));
        });
    }

    /// Apply every completion that has already arrived.
    pub fn drain(&mut self, table: &mut TableState) -> Drained {
        let mut out = Drained::default();
        loop {
            match self.rx.try_recv() {
                Ok(done) => self.apply(done, table, &mut out),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Block until every outstanding job has reported back or `timeout`
    /// passes without progress.
    pub fn settle(&mut self, table: &mut TableState, timeout: Duration) -> Drained {
        let mut out = Drained::default();
        while self.pending > 0 {
            match self.rx.recv_timeout(timeout) {
                Ok(done) => self.apply(done, table, &mut out),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(pending = self.pending, "gave up waiting for fetch jobs");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        out
    }

    fn apply(&mut self, done: Completion, table: &mut TableState, out: &mut Drained) {
        self.pending = self.pending.saturating_sub(1);
        match done {
            Completion::Page(req, result) => match table.apply_page(req, result) {
                PageOutcome::Applied => out.pages_applied += 1,
                PageOutcome::Stale => out.stale_discarded += 1,
                PageOutcome::Redirect(next) => {
                    out.redirected += 1;
                    self.spawn_page(next);
                }
            },
            Completion::Bulk(req, result) => {
                if table.finish_bulk(req, result) {
                    out.bulk_succeeded = true;
                } else {
                    out.bulk_failed = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallerist_core::{MemSource, PAGE_CAPACITY};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn page_and_bulk_jobs_report_back() {
        let rt = runtime();
        let src = Arc::new(MemSource::demo(100));
        let mut w = Worker::new(rt.handle().clone(), src.clone());
        let mut table = TableState::new(PAGE_CAPACITY);

        w.spawn_page(table.open());
        let d = w.settle(&mut table, Duration::from_secs(5));
        assert_eq!(d.pages_applied, 1);
        assert_eq!(table.total_records(), 100);

        let req = table.on_bulk_select_submit("15").unwrap();
        w.spawn_bulk(req);
        let d = w.settle(&mut table, Duration::from_secs(5));
        assert!(d.bulk_succeeded);
        assert_eq!(table.selection().len(), 15);
        assert_eq!(w.pending(), 0);
        assert_eq!(src.requests(), vec![1, 1, 2]);
    }

    #[test]
    fn superseded_page_is_counted_as_stale() {
        let rt = runtime();
        let src = Arc::new(MemSource::demo(100));
        let mut w = Worker::new(rt.handle().clone(), src);
        let mut table = TableState::new(PAGE_CAPACITY);
        w.spawn_page(table.open());
        w.settle(&mut table, Duration::from_secs(5));

        w.spawn_page(table.on_page_change(1).unwrap());
        w.spawn_page(table.on_page_change(2).unwrap());
        let d = w.settle(&mut table, Duration::from_secs(5));
        assert_eq!(d.pages_applied, 1);
        assert_eq!(d.stale_discarded, 1);
        assert_eq!(table.cursor(), 3);
        assert_eq!(table.window()[0].id, 25);
    }

    #[test]
    fn page_past_the_end_is_refetched_as_last_page() {
        let rt = runtime();
        let src = Arc::new(MemSource::demo(100));
        let mut w = Worker::new(rt.handle().clone(), src.clone());
        let mut table = TableState::new(PAGE_CAPACITY);

        w.spawn_page(table.on_page_change(49).unwrap());
        let d = w.settle(&mut table, Duration::from_secs(5));
        assert_eq!(d.redirected, 1);
        assert_eq!(d.pages_applied, 1);
        assert_eq!(w.pending(), 0);
        assert_eq!(table.cursor(), 9);
        assert_eq!(table.window()[0].id, 97);
        assert!(!table.is_loading());
        assert_eq!(src.requests(), vec![50, 9]);
    }
}
