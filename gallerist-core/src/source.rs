use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::{Artwork, FetchError, Page, PAGE_CAPACITY};

/// Anything that can serve one numbered page of the catalog.
///
/// Pages are 1-based. Implementations block; callers that must stay
/// responsive run them on a worker.
pub trait PageSource: Send + Sync {
    fn fetch(&self, page: u32) -> Result<Page, FetchError>;
}

impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    fn fetch(&self, page: u32) -> Result<Page, FetchError> {
        (**self).fetch(page)
    }
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn fetch(&self, page: u32) -> Result<Page, FetchError> {
        (**self).fetch(page)
    }
}

/// In-memory catalog. Serves the demo mode and tests; records every page it
/// was asked for so callers can check fetch order.
pub struct MemSource {
    records: Vec<Artwork>,
    failing: Mutex<HashSet<u32>>,
    requests: Mutex<Vec<u32>>,
}

impl MemSource {
    pub fn new(records: Vec<Artwork>) -> Self {
        Self {
            records,
            failing: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `count` synthetic artworks with ids `1..=count`.
    pub fn demo(count: u64) -> Self {
        let places = ["France", "Japan", "Italy", "United States", "Netherlands"];
        let records = (1..=count)
            .map(|id| Artwork {
                id,
                title: Some(format!("Study No. {id}")),
                place_of_origin: Some(places[(id as usize) % places.len()].to_string()),
                artist_display: Some(format!("Workshop {}", (id % 7) + 1)),
                inscriptions: (id % 3 == 0).then(|| format!("signed l.r.: {id}")),
                date_start: Some(1800 + id as i64),
                date_end: Some(1805 + id as i64),
            })
            .collect();
        Self::new(records)
    }

    /// Make every fetch of `page` fail from now on.
    pub fn fail_page(&self, page: u32) {
        self.failing.lock().expect("poisoned").insert(page);
    }

    /// Pages requested so far, in request order.
    pub fn requests(&self) -> Vec<u32> {
        self.requests.lock().expect("poisoned").clone()
    }
}

impl PageSource for MemSource {
    fn fetch(&self, page: u32) -> Result<Page, FetchError> {
        self.requests.lock().expect("poisoned").push(page);
        if self.failing.lock().expect("poisoned").contains(&page) {
            return Err(FetchError::Injected { page });
        }
        let start = (page.saturating_sub(1) as usize).saturating_mul(PAGE_CAPACITY);
        let records = self
            .records
            .iter()
            .skip(start)
            .take(PAGE_CAPACITY)
            .cloned()
            .collect();
        Ok(Page {
            records,
            total: self.records.len() as u64,
        })
    }
}
