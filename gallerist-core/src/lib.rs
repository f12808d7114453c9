//! gallerist-core: catalog records, page sources, and the selection state that
//! survives server-side pagination.

use serde::{Deserialize, Serialize};

pub mod bulk;
pub mod error;
pub mod http;
pub mod selection;
pub mod source;
pub mod table;

pub use bulk::{collect_first, parse_limit, BulkRequest};
pub use error::FetchError;
pub use http::{ArticClient, ClientConfig, RetryConfig};
pub use selection::Selection;
pub use source::{MemSource, PageSource};
pub use table::{PageOutcome, PageRequest, TableState};

pub type ArtworkId = u64;

/// Rows per page. The catalog serves pages of this size and all pagination
/// math assumes it.
pub const PAGE_CAPACITY: usize = 12;

/// One catalog item. Only `id` takes part in selection; the rest is display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub place_of_origin: Option<String>,
    #[serde(default)]
    pub artist_display: Option<String>,
    #[serde(default)]
    pub inscriptions: Option<String>,
    #[serde(default)]
    pub date_start: Option<i64>,
    #[serde(default)]
    pub date_end: Option<i64>,
}

impl Artwork {
    pub fn new<S: Into<String>>(id: ArtworkId, title: S) -> Self {
        Self {
            id,
            title: Some(title.into()),
            place_of_origin: None,
            artist_display: None,
            inscriptions: None,
            date_start: None,
            date_end: None,
        }
    }
}

/// A single fetched page plus the catalog-wide record count reported with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<Artwork>,
    pub total: u64,
}

impl Page {
    pub fn ids(&self) -> impl Iterator<Item = ArtworkId> + '_ {
        self.records.iter().map(|r| r.id)
    }
}

/// Number of pages needed to show `total` records at `capacity` per page.
pub fn page_count(total: u64, capacity: usize) -> u32 {
    if capacity == 0 {
        return 0;
    }
    let pages = total.div_ceil(capacity as u64);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 12), 0);
        assert_eq!(page_count(1, 12), 1);
        assert_eq!(page_count(12, 12), 1);
        assert_eq!(page_count(13, 12), 2);
        assert_eq!(page_count(100, 12), 9);
    }

    #[test]
    fn artwork_tolerates_null_and_missing_fields() {
        let a: Artwork =
            serde_json::from_str(r#"{"id": 7, "title": null, "date_start": 1890}"#).unwrap();
        assert_eq!(a.id, 7);
        assert_eq!(a.title, None);
        assert_eq!(a.artist_display, None);
        assert_eq!(a.date_start, Some(1890));
    }
}
