//! Contact model and the rows related to it: tags, interactions and deals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a contact row.
pub type ContactId = i64;

/// Position of a contact's sales opportunity in the pipeline.
///
/// The discriminants are the stored/wire values `0..=5`. Deserializes from either
/// the code or the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DealStageRepr")]
pub enum DealStage {
    Prospect = 0,
    Qualified = 1,
    Proposal = 2,
    Negotiation = 3,
    ClosedWon = 4,
    ClosedLost = 5,
}

impl DealStage {
    /// All stages in pipeline order.
    pub const ALL: [DealStage; 6] = [
        DealStage::Prospect,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    /// Map a stored discriminant back to a stage.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.code() == code)
    }

    /// The stored discriminant.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Canonical name, as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            DealStage::Prospect => "Prospect",
            DealStage::Qualified => "Qualified",
            DealStage::Proposal => "Proposal",
            DealStage::Negotiation => "Negotiation",
            DealStage::ClosedWon => "ClosedWon",
            DealStage::ClosedLost => "ClosedLost",
        }
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStage {
    type Err = String;

    /// Accepts a numeric code (`"3"`) or a case-insensitive name (`"negotiation"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown deal stage code {}", code));
        }
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown deal stage '{}'", s))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DealStageRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<DealStageRepr> for DealStage {
    type Error = String;

    fn try_from(repr: DealStageRepr) -> Result<Self, Self::Error> {
        match repr {
            DealStageRepr::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown deal stage code {}", code))
            }
            DealStageRepr::Name(name) => name.parse(),
        }
    }
}

/// Kind of touchpoint recorded against a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    Email = 0,
    Call = 1,
    Meeting = 2,
    Demo = 3,
    Other = 4,
}

impl InteractionType {
    /// Map a stored discriminant back to a type. Unknown codes become `Other`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => InteractionType::Email,
            1 => InteractionType::Call,
            2 => InteractionType::Meeting,
            3 => InteractionType::Demo,
            _ => InteractionType::Other,
        }
    }

    /// The stored discriminant.
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// A person in the contact store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub city: String,
    pub last_contact_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_stage: Option<DealStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_potential_value: Option<Decimal>,
}

impl Contact {
    /// Create a contact with the required fields; stage and base value start empty.
    pub fn new(
        id: ContactId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        last_contact_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: String::new(),
            company: String::new(),
            city: String::new(),
            last_contact_date,
            deal_stage: None,
            base_potential_value: None,
        }
    }

    /// `first + " " + last`. Sorting by name and the projected DTO both use this.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A tag row. Names are unique across the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A recorded touchpoint with a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: i64,
    pub contact_id: ContactId,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    pub date: DateTime<Utc>,
}

/// An opportunity attached to a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: i64,
    pub contact_id: ContactId,
    #[serde(default)]
    pub estimated_value: Option<Decimal>,
}

/// A contact together with its eagerly loaded related rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecord {
    pub contact: Contact,
    pub tags: Vec<String>,
    pub interactions: Vec<Interaction>,
    pub deals: Vec<Deal>,
}

impl ContactRecord {
    /// A record with no related rows.
    pub fn new(contact: Contact) -> Self {
        Self {
            contact,
            tags: Vec::new(),
            interactions: Vec::new(),
            deals: Vec::new(),
        }
    }

    /// Attach a tag name, ignoring duplicates.
    pub fn with_tag(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.tags.contains(&name) {
            self.tags.push(name);
        }
        self
    }

    /// Attach an interaction.
    pub fn with_interaction(mut self, interaction_type: InteractionType, date: DateTime<Utc>) -> Self {
        let id = self.interactions.len() as i64 + 1;
        self.interactions.push(Interaction {
            id,
            contact_id: self.contact.id,
            interaction_type,
            date,
        });
        self
    }

    /// Attach a deal.
    pub fn with_deal(mut self, estimated_value: Option<Decimal>) -> Self {
        let id = self.deals.len() as i64 + 1;
        self.deals.push(Deal {
            id,
            contact_id: self.contact.id,
            estimated_value,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deal_stage_codes_round_trip() {
        for stage in DealStage::ALL {
            assert_eq!(DealStage::from_code(stage.code()), Some(stage));
        }
        assert_eq!(DealStage::from_code(6), None);
        assert_eq!(DealStage::from_code(-1), None);
    }

    #[test]
    fn test_deal_stage_from_str() {
        assert_eq!("3".parse::<DealStage>(), Ok(DealStage::Negotiation));
        assert_eq!("closedwon".parse::<DealStage>(), Ok(DealStage::ClosedWon));
        assert_eq!(" Prospect ".parse::<DealStage>(), Ok(DealStage::Prospect));
        assert!("9".parse::<DealStage>().is_err());
        assert!("Won".parse::<DealStage>().is_err());
    }

    #[test]
    fn test_unknown_interaction_code_is_other() {
        assert_eq!(InteractionType::from_code(3), InteractionType::Demo);
        assert_eq!(InteractionType::from_code(42), InteractionType::Other);
    }

    #[test]
    fn test_full_name_concatenation() {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let contact = Contact::new(1, "Ada", "Lovelace", when);
        assert_eq!(contact.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_record_builder_ignores_duplicate_tags() {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = ContactRecord::new(Contact::new(7, "A", "B", when))
            .with_tag("VIP")
            .with_tag("VIP")
            .with_interaction(InteractionType::Call, when)
            .with_deal(None);

        assert_eq!(record.tags, vec!["VIP".to_string()]);
        assert_eq!(record.interactions[0].contact_id, 7);
        assert_eq!(record.deals[0].contact_id, 7);
    }
}
