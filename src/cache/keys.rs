//! Cache key construction.
//!
//! Every key starts with [`NAMESPACE`]. The version segment changes whenever the
//! shape of a cached value changes, so old entries are simply never read again.

use crate::models::{ContactId, ContactSearchRequest};
use serde::Serialize;

/// Prefix shared by every key this crate writes.
pub const NAMESPACE: &str = "contact-search:v1:";

const RESULT_SEGMENT: &str = "result:";
const DEAL_VALUE_SEGMENT: &str = "deal-value:";

/// Key for a whole result page.
///
/// The request is serialized field by field in declaration order, with absent
/// filters written as `null`, so distinct requests never share a key and equal
/// requests always do. Callers skip the cache when this fails.
pub fn search_result_key(request: &ContactSearchRequest) -> serde_json::Result<String> {
    serialized_key(RESULT_SEGMENT, request)
}

fn serialized_key<T: Serialize + ?Sized>(segment: &str, value: &T) -> serde_json::Result<String> {
    let body = serde_json::to_string(value)?;
    Ok(format!("{}{}{}", NAMESPACE, segment, body))
}

/// Key for one contact's memoized deal value.
pub fn deal_value_key(contact_id: ContactId) -> String {
    format!("{}{}{}", NAMESPACE, DEAL_VALUE_SEGMENT, contact_id)
}
