use thiserror::Error;

/// Why a page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("catalog returned HTTP {status} for page {page}")]
    Status { page: u32, status: u16 },
    #[error("transport error fetching page {page}: {message}")]
    Transport { page: u32, message: String },
    #[error("malformed catalog response for page {page}: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },
    #[error("page {page} is configured to fail")]
    Injected { page: u32 },
}

impl FetchError {
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Status { page, .. }
            | FetchError::Transport { page, .. }
            | FetchError::Decode { page, .. }
            | FetchError::Injected { page } => *page,
        }
    }

    /// Transport failures, throttling and server errors may succeed on a
    /// second attempt; client errors and bad payloads will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode { .. } | FetchError::Injected { .. } => false,
        }
    }
}
