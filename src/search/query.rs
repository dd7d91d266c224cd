//! Store-agnostic description of a contact query.
//!
//! A [`ContactQuery`] captures the filters and ordering that a store can evaluate
//! itself. The minimum-deal-value threshold is not part of it: deal values are
//! derived, so the searcher applies that filter after loading rows.
//!
//! Stores must agree on ordering. Strings compare by bytes, and ties are broken by
//! ascending contact id so that paging is stable.

use crate::models::{ContactRecord, ContactSearchRequest, DealStage};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Field a search is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// `first_name + " " + last_name`
    FullName,
    Company,
    Email,
    LastContactDate,
}

impl SortField {
    /// Recognizes `fullname`, `company` and `email` (case-insensitive); anything
    /// else sorts by last contact date.
    pub fn parse(sort_by: &str) -> Self {
        match sort_by.trim().to_ascii_lowercase().as_str() {
            "fullname" => SortField::FullName,
            "company" => SortField::Company,
            "email" => SortField::Email,
            _ => SortField::LastContactDate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl SortSpec {
    /// Compare two records under this sort, falling back to ascending id.
    pub fn compare(&self, a: &ContactRecord, b: &ContactRecord) -> Ordering {
        let (a, b) = (&a.contact, &b.contact);
        let primary = match self.field {
            SortField::FullName => a.full_name().cmp(&b.full_name()),
            SortField::Company => a.company.cmp(&b.company),
            SortField::Email => a.email.cmp(&b.email),
            SortField::LastContactDate => a.last_contact_date.cmp(&b.last_contact_date),
        };
        let primary = if self.descending {
            primary.reverse()
        } else {
            primary
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Filters a store can evaluate without deriving deal values. All are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    /// Exact city match.
    pub city: Option<String>,
    /// Match when the contact carries any of these tag names.
    pub any_tags: Vec<String>,
    /// Last contact strictly before this instant.
    pub last_contact_before: Option<DateTime<Utc>>,
    /// Exact stage match.
    pub deal_stage: Option<DealStage>,
}

impl ContactFilter {
    /// Evaluate the filter in process.
    pub fn matches(&self, record: &ContactRecord) -> bool {
        let contact = &record.contact;

        if let Some(city) = &self.city {
            if &contact.city != city {
                return false;
            }
        }
        if !self.any_tags.is_empty() && !record.tags.iter().any(|t| self.any_tags.contains(t)) {
            return false;
        }
        if let Some(before) = self.last_contact_before {
            if contact.last_contact_date >= before {
                return false;
            }
        }
        if let Some(stage) = self.deal_stage {
            if contact.deal_stage != Some(stage) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self == &ContactFilter::default()
    }
}

/// Filters plus ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    pub filter: ContactFilter,
    pub sort: SortSpec,
}

impl ContactQuery {
    /// Build the store-side part of a search request.
    ///
    /// Empty city strings and blank tag entries are ignored.
    pub fn from_request(request: &ContactSearchRequest) -> Self {
        let city = request
            .city
            .as_ref()
            .filter(|c| !c.is_empty())
            .cloned();

        let any_tags = request
            .tags
            .as_deref()
            .map(split_tags)
            .unwrap_or_default();

        Self {
            filter: ContactFilter {
                city,
                any_tags,
                last_contact_before: request.last_contact_before,
                deal_stage: request.deal_stage,
            },
            sort: SortSpec {
                field: SortField::parse(&request.sort_by),
                descending: request.sort_descending,
            },
        }
    }

    /// Apply filter and sort to an in-memory collection.
    pub fn apply(&self, records: impl IntoIterator<Item = ContactRecord>) -> Vec<ContactRecord> {
        let mut matched: Vec<ContactRecord> = records
            .into_iter()
            .filter(|r| self.filter.matches(r))
            .collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));
        matched
    }
}

/// Split a comma-separated tag list, trimming entries and dropping blanks.
pub fn split_tags(tags: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
