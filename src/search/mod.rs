//! Query building, deal-value scoring and pagination tokens.
//!
//! These pieces are pure: they never touch a store or a cache. The services layer
//! combines them into a search.

pub mod deal_value;
pub mod page_token;
pub mod query;

pub use deal_value::compute_deal_value;
pub use page_token::PageToken;
pub use query::{split_tags, ContactFilter, ContactQuery, SortField, SortSpec};
