//! Search request, result envelope and the projected contact read-model.

use super::contact::{ContactId, DealStage};
use crate::search::PageToken;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Page used when the request does not name one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the request does not name one, or names one below 1.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Sort field used when the request does not name one.
pub const DEFAULT_SORT_BY: &str = "LastContactDate";

/// Filter, sort and paging parameters for a contact search.
///
/// Optional filters that arrive malformed (unparseable dates, unknown stages,
/// non-numeric thresholds) deserialize as absent rather than failing. Malformed
/// paging and sort fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSearchRequest {
    pub city: Option<String>,
    /// Comma-separated tag names; a contact matches if it carries any of them.
    pub tags: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_contact_before: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub deal_stage: Option<DealStage>,
    #[serde(deserialize_with = "lenient")]
    pub min_deal_value: Option<Decimal>,
    /// 1-indexed.
    #[serde(deserialize_with = "lenient_page")]
    pub page: u32,
    #[serde(deserialize_with = "lenient_page_size")]
    pub page_size: u32,
    /// `fullname`, `company`, `email`; anything else sorts by last contact date.
    #[serde(deserialize_with = "lenient_sort_by")]
    pub sort_by: String,
    #[serde(deserialize_with = "lenient_sort_descending")]
    pub sort_descending: bool,
}

impl Default for ContactSearchRequest {
    fn default() -> Self {
        Self {
            city: None,
            tags: None,
            last_contact_before: None,
            deal_stage: None,
            min_deal_value: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_descending: true,
        }
    }
}

impl ContactSearchRequest {
    /// Clamp paging into range: page 0 becomes 1, page size 0 becomes the default,
    /// and page sizes above `max_page_size` are capped.
    pub fn normalized(mut self, max_page_size: u32) -> Self {
        if self.page == 0 {
            self.page = DEFAULT_PAGE;
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if max_page_size > 0 && self.page_size > max_page_size {
            self.page_size = max_page_size;
        }
        self
    }

    /// Offset of the first row on the requested page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }

    /// The request for the page a next-page token points at.
    ///
    /// Filters are kept from `self`; page and sort come from the token.
    /// Returns `None` if the token cannot be decoded.
    pub fn with_page_token(&self, token: &str) -> Option<Self> {
        let token = PageToken::decode(token)?;
        Some(Self {
            page: token.page,
            sort_by: token.sort_by,
            sort_descending: token.sort_descending,
            ..self.clone()
        })
    }
}

/// Untyped search parameters as they arrive at the boundary (query string, CLI).
///
/// Conversion into [`ContactSearchRequest`] never fails: anything that does not
/// parse is treated as absent, or as the default for paging and sort fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSearchParams {
    pub city: Option<String>,
    pub tags: Option<String>,
    pub last_contact_before: Option<String>,
    pub deal_stage: Option<String>,
    pub min_deal_value: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_descending: Option<String>,
}

impl RawSearchParams {
    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// Keys are matched case-insensitively against the camelCase field names.
    /// Unknown keys are ignored; a repeated key keeps its last value.
    pub fn from_query_string(query: &str) -> Self {
        let mut params = Self::default();
        let query = query.trim_start_matches('?');

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value);
            let slot = match decode_component(key).to_ascii_lowercase().as_str() {
                "city" => &mut params.city,
                "tags" => &mut params.tags,
                "lastcontactbefore" => &mut params.last_contact_before,
                "dealstage" => &mut params.deal_stage,
                "mindealvalue" => &mut params.min_deal_value,
                "page" => &mut params.page,
                "pagesize" => &mut params.page_size,
                "sortby" => &mut params.sort_by,
                "sortdescending" => &mut params.sort_descending,
                other => {
                    tracing::debug!(key = %other, "Ignoring unknown search parameter");
                    continue;
                }
            };
            *slot = Some(value);
        }

        params
    }

    /// Convert into a typed request with parse-or-skip semantics.
    pub fn into_request(self) -> ContactSearchRequest {
        let defaults = ContactSearchRequest::default();

        ContactSearchRequest {
            city: self.city,
            tags: self.tags,
            last_contact_before: self.last_contact_before.as_deref().and_then(parse_timestamp),
            deal_stage: self.deal_stage.as_deref().and_then(|s| s.parse().ok()),
            min_deal_value: self
                .min_deal_value
                .as_deref()
                .and_then(|s| Decimal::from_str(s.trim()).ok()),
            page: self
                .page
                .as_deref()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.page),
            page_size: self
                .page_size
                .as_deref()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.page_size),
            sort_by: self
                .sort_by
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.sort_by),
            sort_descending: self
                .sort_descending
                .as_deref()
                .and_then(parse_flag)
                .unwrap_or(defaults.sort_descending),
        }
    }
}

/// Flattened read-model of a contact, built fresh for every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: ContactId,
    pub full_name: String,
    pub email: String,
    pub company: String,
    pub city: String,
    pub last_contact_date: DateTime<Utc>,
    pub tags: Vec<String>,
    pub interaction_count: usize,
    pub deal_value: Decimal,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
    pub data: Vec<ContactDto>,
    pub elapsed_milliseconds: f64,
    /// Opaque; `None` once `page * page_size >= total_count`.
    pub next_page_token: Option<String>,
}

impl SearchResult {
    /// Equality ignoring elapsed-time telemetry.
    pub fn same_page(&self, other: &SearchResult) -> bool {
        self.total_count == other.total_count
            && self.page == other.page
            && self.page_size == other.page_size
            && self.data == other.data
            && self.next_page_token == other.next_page_token
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Parsed(T),
    #[allow(dead_code)]
    Ignored(IgnoredAny),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Parsed(value)) => Some(value),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = lenient(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn lenient_page<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or(DEFAULT_PAGE))
}

fn lenient_page_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or(DEFAULT_PAGE_SIZE))
}

fn lenient_sort_by<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_else(|| DEFAULT_SORT_BY.to_string()))
}

fn lenient_sort_descending<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or(true))
}
