//! Data models for contact search.
//!
//! This module contains the stored entities (contacts and their tags, interactions
//! and deals) and the transient request/response shapes of a search.

pub mod contact;
pub mod search;

pub use contact::{
    Contact, ContactId, ContactRecord, Deal, DealStage, Interaction, InteractionType, Tag,
};
pub use search::{
    parse_timestamp, ContactDto, ContactSearchRequest, RawSearchParams, SearchResult,
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT_BY,
};
