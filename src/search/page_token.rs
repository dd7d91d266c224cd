//! Opaque next-page tokens.
//!
//! A token is the URL-safe base64 of a small JSON document carrying the next page
//! number and the sort that produced the current page.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};

/// Decoded contents of a next-page token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageToken {
    pub page: u32,
    pub sort_by: String,
    pub sort_descending: bool,
}

impl PageToken {
    pub fn new(page: u32, sort_by: impl Into<String>, sort_descending: bool) -> Self {
        Self {
            page,
            sort_by: sort_by.into(),
            sort_descending,
        }
    }

    /// Token pointing past `page`, or `None` when `page * page_size >= total_count`.
    pub fn after(
        page: u32,
        page_size: u32,
        total_count: usize,
        sort_by: &str,
        sort_descending: bool,
    ) -> Option<Self> {
        let consumed = page as u64 * page_size as u64;
        if consumed >= total_count as u64 {
            return None;
        }
        Some(Self::new(page + 1, sort_by, sort_descending))
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(Base64UrlUnpadded::encode_string(&json))
    }

    /// Reverse [`encode`](Self::encode). Garbage yields `None`.
    pub fn decode(token: &str) -> Option<Self> {
        let bytes = Base64UrlUnpadded::decode_vec(token.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
