//! "Select the first N" across pages.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::{page_count, ArtworkId, FetchError, PageSource};

/// A validated bulk selection, already clamped to the known record count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkRequest {
    pub limit: usize,
    pub page_capacity: usize,
}

impl BulkRequest {
    /// Parse `text` and clamp it to `total`. `None` means the input is not a
    /// positive integer and nothing should happen.
    pub fn new(text: &str, total: u64, page_capacity: usize) -> Option<Self> {
        let requested = parse_limit(text)?;
        let limit = usize::try_from(total).map_or(requested, |t| requested.min(t));
        Some(Self {
            limit,
            page_capacity,
        })
    }

    pub fn pages_needed(&self) -> u32 {
        page_count(self.limit as u64, self.page_capacity)
    }
}

/// Read a positive integer from user input.
///
/// Leading whitespace and an optional sign are accepted, then the leading run
/// of digits is used and anything after it ignored (`"12abc"` is 12). Zero,
/// negatives and input without leading digits yield `None`. Values too large
/// for `usize` saturate.
pub fn parse_limit(text: &str) -> Option<usize> {
    let s = text.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = rest[..digits]
        .bytes()
        .fold(0usize, |acc, d| acc.saturating_mul(10).saturating_add((d - b'0') as usize));
    if negative || value == 0 {
        return None;
    }
    Some(value)
}

/// Fetch pages `1..=pages_needed` strictly in order and return the first
/// `limit` identifiers seen.
///
/// Stops as soon as enough ids are collected. Any failed page aborts the
/// whole run; the caller gets the error and no partial list.
pub fn collect_first<S: PageSource + ?Sized>(
    req: &BulkRequest,
    source: &S,
) -> Result<Vec<ArtworkId>, FetchError> {
    let needed = req.pages_needed();
    let mut ids: Vec<ArtworkId> = Vec::with_capacity(req.limit.min(4096));
    let mut seen: HashSet<ArtworkId> = HashSet::new();
    for page in 1..=needed {
        if ids.len() >= req.limit {
            break;
        }
        let fetched = source.fetch(page)?;
        debug!(page, rows = fetched.records.len(), "bulk page fetched");
        ids.extend(fetched.ids().filter(|id| seen.insert(*id)));
    }
    ids.truncate(req.limit);
    info!(limit = req.limit, selected = ids.len(), pages = needed, "bulk selection collected");
    Ok(ids)
}
