//! Sample contacts shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use contact_search::models::{Contact, ContactId, ContactRecord, DealStage, InteractionType};
use rust_decimal::Decimal;

const CITIES: [&str; 3] = ["Paris", "London", "Berlin"];
const FIRST_NAMES: [&str; 5] = ["Ada", "Grace", "Alan", "Edsger", "Barbara"];
const LAST_NAMES: [&str; 5] = ["Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov"];

/// Instant all fixtures and manual clocks are anchored to.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Create a sample contact last contacted `days_ago` days before [`now`].
pub fn sample_contact(id: ContactId, first: &str, last: &str, days_ago: i64) -> Contact {
    let mut contact = Contact::new(id, first, last, now() - Duration::days(days_ago));
    contact.email = format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase());
    contact.company = format!("{} Labs", last);
    contact
}

/// `count` contacts with ids `1..=count` and distinct last-contact dates.
///
/// Cities rotate through Paris, London and Berlin. Every contact has a base value
/// of 1000, the Qualified stage and one call, and was contacted within the last
/// 30 days, so each is worth exactly 630.00.
pub fn roster(count: usize) -> Vec<ContactRecord> {
    (1..=count)
        .map(|i| {
            let id = i as ContactId;
            let mut contact = sample_contact(
                id,
                FIRST_NAMES[i % FIRST_NAMES.len()],
                LAST_NAMES[(i / FIRST_NAMES.len()) % LAST_NAMES.len()],
                0,
            );
            contact.last_contact_date = now() - Duration::hours(i as i64);
            contact.city = CITIES[i % CITIES.len()].to_string();
            contact.deal_stage = Some(DealStage::Qualified);
            contact.base_potential_value = Some(Decimal::new(1000, 0));
            ContactRecord::new(contact).with_interaction(InteractionType::Call, now())
        })
        .collect()
}

/// A record whose deal value is exactly `value` (via a single deal, no base).
pub fn valued(id: ContactId, value: i64) -> ContactRecord {
    let mut contact = sample_contact(id, "Val", &format!("Ued{:03}", id), 1);
    contact.deal_stage = Some(DealStage::Proposal);
    ContactRecord::new(contact).with_deal(Some(Decimal::new(value, 0)))
}

pub fn ids(data: &[contact_search::models::ContactDto]) -> Vec<ContactId> {
    data.iter().map(|c| c.id).collect()
}
