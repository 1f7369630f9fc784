//! Event form: validated input turned into an insert or an update

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Event, EventRecord, EventType};
use crate::notify::{Notification, Notifier};
use crate::postgrest::SortOrder;
use crate::Roomshare;

pub const EVENTS_TABLE: &str = "events";

/// Wire format of event dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 500;

/// Raw form values, as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventInput {
    pub name: String,
    /// `YYYY-MM-DD`, `MM/DD/YYYY`, or an RFC 3339 / ISO date-time
    pub date: String,
    pub notes: String,
    pub event_type: String,
}

impl EventInput {
    /// Pre-fill the form from an existing event
    pub fn from_event(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            date: event.date.format(DATE_FORMAT).to_string(),
            notes: event.notes.clone(),
            event_type: event.event_type.to_string(),
        }
    }
}

/// Parse the accepted date spellings into a calendar date. Date-times keep
/// their own calendar day; no timezone conversion is applied.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::validation("date is required"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    Err(Error::validation(format!("'{}' is not a valid date", raw)))
}

/// Checked form values
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEvent {
    pub name: String,
    pub date: NaiveDate,
    pub notes: String,
    pub event_type: EventType,
}

impl ValidEvent {
    fn record(&self, created_by: Option<uuid::Uuid>) -> EventRecord {
        EventRecord {
            name: self.name.clone(),
            date: self.date.format(DATE_FORMAT).to_string(),
            notes: self.notes.clone(),
            event_type: self.event_type,
            created_by,
        }
    }
}

pub fn validate(input: &EventInput) -> Result<ValidEvent> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(Error::validation("name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    let notes = input.notes.trim();
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(Error::validation(format!(
            "notes must be at most {} characters",
            MAX_NOTES_LEN
        )));
    }
    let date = parse_event_date(&input.date)?;
    let event_type = input.event_type.parse::<EventType>().map_err(Error::Validation)?;

    Ok(ValidEvent {
        name: name.to_string(),
        date,
        notes: notes.to_string(),
        event_type,
    })
}

/// Creates or edits events for the signed-in user
#[derive(Clone)]
pub struct EventForm {
    client: Roomshare,
    notifier: Arc<dyn Notifier>,
}

impl EventForm {
    pub fn new(client: Roomshare, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    /// Insert a new event, or update `editing` when given. Invalid input
    /// never reaches the network.
    pub async fn try_submit(&self, input: &EventInput, editing: Option<&Event>) -> Result<Event> {
        let valid = validate(input)?;
        let events = self.client.from_authed(EVENTS_TABLE)?;

        let rows = match editing {
            Some(existing) => {
                events
                    .update(valid.record(None))
                    .eq("id", existing.id)
                    .execute::<Event>()
                    .await?
            }
            None => {
                let me = self.client.auth().current_user()?;
                events
                    .insert(valid.record(Some(me.id)))
                    .execute::<Event>()
                    .await?
            }
        };

        let event = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::database("event write returned no row"))?;
        log::info!(
            "{} event {} ({})",
            if editing.is_some() { "Updated" } else { "Created" },
            event.id,
            event.date
        );
        Ok(event)
    }

    /// Hook-style submit: reports through the notifier and returns the
    /// written event on success
    pub async fn submit(&self, input: &EventInput, editing: Option<&Event>) -> Option<Event> {
        match self.try_submit(input, editing).await {
            Ok(event) => {
                let (title, verb) = if editing.is_some() {
                    ("Event updated", "updated")
                } else {
                    ("Event created", "added to the calendar")
                };
                self.notifier.notify(Notification::success(
                    title,
                    format!("{} has been {}", event.name, verb),
                ));
                Some(event)
            }
            Err(e) => {
                log::error!("Error saving event: {}", e);
                let title = if matches!(e, Error::Validation(_)) {
                    "Invalid event"
                } else {
                    "Error saving event"
                };
                self.notifier
                    .notify(Notification::error(title, e.to_string()));
                None
            }
        }
    }

    /// Events visible to the signed-in user, earliest first
    pub async fn try_fetch_events(&self) -> Result<Vec<Event>> {
        self.client
            .from_authed(EVENTS_TABLE)?
            .select("*")
            .order("date", SortOrder::Ascending)
            .execute::<Event>()
            .await
    }

    pub async fn fetch_events(&self) -> Vec<Event> {
        match self.try_fetch_events().await {
            Ok(events) => events,
            Err(e) => {
                log::error!("Error fetching events: {}", e);
                self.notifier
                    .notify(Notification::error("Error fetching events", e.to_string()));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, date: &str, event_type: &str) -> EventInput {
        EventInput {
            name: name.to_string(),
            date: date.to_string(),
            notes: String::new(),
            event_type: event_type.to_string(),
        }
    }

    #[test]
    fn normalises_date_spellings() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        for raw in [
            "2026-03-07",
            "03/07/2026",
            "2026-03-07T18:30:00Z",
            "2026-03-07T18:30:00+02:00",
            "2026-03-07T18:30:00.000",
        ] {
            assert_eq!(parse_event_date(raw).unwrap(), expected, "{}", raw);
        }
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(parse_event_date("").is_err());
        assert!(parse_event_date("2026-02-30").is_err());
        assert!(parse_event_date("next tuesday").is_err());
    }

    #[test]
    fn validation_trims_and_checks() {
        let valid = validate(&input("  Trash day ", "2026-03-07", "Chore")).unwrap();
        assert_eq!(valid.name, "Trash day");
        assert_eq!(valid.event_type, EventType::Chore);
        assert_eq!(valid.record(None).date, "2026-03-07");

        assert!(matches!(
            validate(&input("   ", "2026-03-07", "chore")),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate(&input("Party", "2026-03-07", "party")),
            Err(Error::Validation(_))
        ));
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate(&input(&long, "2026-03-07", "other")).is_err());
    }

    #[test]
    fn notes_are_capped() {
        let mut at_limit = input("Rent", "2026-03-07", "bill");
        at_limit.notes = "n".repeat(MAX_NOTES_LEN);
        assert_eq!(validate(&at_limit).unwrap().notes.len(), MAX_NOTES_LEN);

        // surrounding whitespace does not count
        at_limit.notes = format!("  {}  ", "n".repeat(MAX_NOTES_LEN));
        assert!(validate(&at_limit).is_ok());

        let mut over = input("Rent", "2026-03-07", "bill");
        over.notes = "n".repeat(MAX_NOTES_LEN + 1);
        match validate(&over) {
            Err(Error::Validation(msg)) => assert!(msg.contains("500")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn form_prefills_from_event() {
        let event = Event {
            id: uuid::Uuid::new_v4(),
            name: "Rent".into(),
            date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            notes: "transfer by noon".into(),
            event_type: EventType::Bill,
            created_by: uuid::Uuid::new_v4(),
        };
        let input = EventInput::from_event(&event);
        assert_eq!(input.date, "2026-11-01");
        assert_eq!(input.event_type, "bill");
        assert_eq!(validate(&input).unwrap().notes, "transfer by noon");
    }
}
