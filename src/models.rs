//! Row types for the `roommates`, `profiles` and `events` relations

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One user's view of a shared-expense contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roommate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_id: String,
    pub email: String,
    pub phone: Option<String>,
    /// Amount owed in currency units; positive means the roommate owes the owner.
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance: f64,
}

/// Insert payload for a roommate row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRoommate {
    pub user_id: Uuid,
    pub name: String,
    pub payment_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub balance: f64,
}

impl NewRoommate {
    /// Row owned by `owner` describing the account behind `profile`
    pub fn from_profile(owner: Uuid, profile: &Profile) -> Self {
        Self {
            user_id: owner,
            name: profile.display_name(),
            payment_id: profile.payment_id.clone().unwrap_or_default(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            balance: 0.0,
        }
    }
}

/// Canonical identity record of a registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub payment_id: Option<String>,
    pub phone: Option<String>,
}

impl Profile {
    /// Full name, then short name, then the local part of the email
    pub fn display_name(&self) -> String {
        [self.full_name.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .unwrap_or(&self.email)
                    .to_string()
            })
    }
}

/// Category of a household event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Chore,
    Bill,
    Social,
    Maintenance,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Chore,
        EventType::Bill,
        EventType::Social,
        EventType::Maintenance,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Chore => "chore",
            EventType::Bill => "bill",
            EventType::Social => "social",
            EventType::Maintenance => "maintenance",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| format!("unknown event type '{}'", s))
    }
}

/// A household calendar entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    /// Stored as `YYYY-MM-DD`
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    pub event_type: EventType,
    pub created_by: Uuid,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Write payload for an event row, with the date already normalised
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub name: String,
    pub date: String,
    pub notes: String,
    pub event_type: EventType,
    /// Set on insert only; updates keep the original creator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(full_name: Option<&str>, name: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "sam.lee@example.com".to_string(),
            name: name.map(str::to_string),
            full_name: full_name.map(str::to_string),
            payment_id: Some("@sam-lee".to_string()),
            phone: None,
        }
    }

    #[test]
    fn display_name_fallbacks() {
        assert_eq!(profile(Some("Sam Lee"), Some("Sam")).display_name(), "Sam Lee");
        assert_eq!(profile(Some("  "), Some("Sam")).display_name(), "Sam");
        assert_eq!(profile(None, None).display_name(), "sam.lee");
    }

    #[test]
    fn new_roommate_starts_at_zero_balance() {
        let owner = Uuid::new_v4();
        let row = NewRoommate::from_profile(owner, &profile(Some("Sam Lee"), None));
        assert_eq!(row.user_id, owner);
        assert_eq!(row.balance, 0.0);
        assert_eq!(row.payment_id, "@sam-lee");

        let body = serde_json::to_value(&row).unwrap();
        assert!(body.get("phone").is_none());
        assert!(body.get("id").is_none());
    }

    #[test]
    fn event_type_round_trips_through_text() {
        assert_eq!("Bill".parse::<EventType>().unwrap(), EventType::Bill);
        assert!("party".parse::<EventType>().is_err());
        assert_eq!(serde_json::to_value(EventType::Maintenance).unwrap(), json!("maintenance"));
    }

    #[test]
    fn event_parses_backend_row() {
        let id = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let event: Event = serde_json::from_value(json!({
            "id": id,
            "name": "Rent due",
            "date": "2026-11-01",
            "notes": null,
            "event_type": "bill",
            "created_by": creator
        }))
        .unwrap();
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(event.event_type, EventType::Bill);
        assert!(event.notes.is_empty());
    }
}
