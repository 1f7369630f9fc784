//! Roommate list management: listing, adding with a reciprocal row,
//! deleting, and payment reminders.
//!
//! Every operation comes in two flavours. The `try_*` methods return a typed
//! [`Result`]. The plain methods behave like the app's data hook: they report
//! the outcome through the [`Notifier`], refetch the caller's list after a
//! mutation, and return whether the operation went through.

use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::models::{NewRoommate, Profile, Roommate};
use crate::notify::{Notification, Notifier};
use crate::postgrest::{PostgrestClient, SortOrder};
use crate::reminders::Sender;
use crate::validation::{is_valid_email, same_email};
use crate::Roomshare;

pub const ROOMMATES_TABLE: &str = "roommates";
pub const PROFILES_TABLE: &str = "profiles";

/// Result of a successful [`Roommates::try_add_roommate`]
#[derive(Debug, Clone, PartialEq)]
pub struct AddedRoommate {
    /// Row written for the caller
    pub roommate: Roommate,
    /// Whether the mirrored row for the other user was written
    pub reciprocal: bool,
}

#[derive(Debug, Deserialize)]
struct ListedEmail {
    email: String,
}

/// Roommate operations for the signed-in user
#[derive(Clone)]
pub struct Roommates {
    client: Roomshare,
    notifier: Arc<dyn Notifier>,
    in_flight: Arc<AtomicUsize>,
}

struct LoadingGuard(Arc<AtomicUsize>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Roommates {
    pub fn new(client: Roomshare, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn begin(&self) -> LoadingGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(self.in_flight.clone())
    }

    /// True while any operation of this handle is awaiting the backend
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Last fetched list of the signed-in user, empty when nothing is cached
    pub async fn roommates(&self) -> Vec<Roommate> {
        match self.client.auth().current_user() {
            Ok(me) => self
                .client
                .roommate_cache()
                .get(me.id)
                .await
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn table(&self, name: &str) -> Result<PostgrestClient> {
        self.client.from_authed(name)
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    /// Read every row owned by the signed-in user and replace the cached list
    pub async fn try_fetch_roommates(&self) -> Result<Vec<Roommate>> {
        let _loading = self.begin();
        let me = self.client.auth().current_user()?;

        let roommates = self
            .table(ROOMMATES_TABLE)?
            .select("*")
            .eq("user_id", me.id)
            .order("name", SortOrder::Ascending)
            .execute::<Roommate>()
            .await?;

        log::debug!("Fetched {} roommates for {}", roommates.len(), me.id);
        self.client
            .roommate_cache()
            .put(me.id, roommates.clone())
            .await;
        Ok(roommates)
    }

    pub async fn fetch_roommates(&self) -> Vec<Roommate> {
        match self.try_fetch_roommates().await {
            Ok(roommates) => roommates,
            Err(e) => {
                log::error!("Error fetching roommates: {}", e);
                self.notify(Notification::error(
                    "Error fetching roommates",
                    e.to_string(),
                ));
                Vec::new()
            }
        }
    }

    /// Add the account registered under `email` as a roommate.
    ///
    /// Checks run in order and stop at the first failure: address format,
    /// self-addition, profile lookup, existing row. Then the caller's row is
    /// inserted, followed by a best-effort reciprocal row owned by the other
    /// user. Nothing is transactional and a reciprocal failure does not undo
    /// the first insert. Two concurrent calls for the same email can both get
    /// past the existing-row check.
    pub async fn try_add_roommate(&self, email: &str) -> Result<AddedRoommate> {
        let _loading = self.begin();
        let email = email.trim().to_lowercase();
        let email = email.as_str();

        if !is_valid_email(email) {
            return Err(Error::InvalidEmail(email.to_string()));
        }
        let me = self.client.auth().current_user()?;
        if same_email(email, &me.email) {
            return Err(Error::SelfAddition);
        }

        let target = self
            .find_profile(email)
            .await?
            .ok_or_else(|| Error::ProfileNotFound(email.to_string()))?;
        if target.id == me.id {
            return Err(Error::SelfAddition);
        }

        if self.lists_email(me.id, email).await? {
            return Err(Error::AlreadyRoommate(email.to_string()));
        }

        let roommate = self
            .table(ROOMMATES_TABLE)?
            .insert(NewRoommate::from_profile(me.id, &target))
            .execute::<Roommate>()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::database("insert returned no row"))?;
        log::info!("Added {} as roommate of {}", target.id, me.id);

        let reciprocal = match self.insert_reciprocal(&me, &target).await {
            Ok(written) => written,
            Err(e) => {
                log::warn!(
                    "Reciprocal roommate row for {} -> {} failed: {}",
                    target.id,
                    me.id,
                    e
                );
                false
            }
        };

        self.client
            .roommate_cache()
            .invalidate(&[me.id, target.id])
            .await;

        Ok(AddedRoommate {
            roommate,
            reciprocal,
        })
    }

    /// Profile registered under exactly `email`, ignoring case. The `ilike`
    /// lookup can return near matches (`*` is a server-side wildcard), so
    /// every candidate is compared before one is accepted.
    async fn find_profile(&self, email: &str) -> Result<Option<Profile>> {
        let candidates = self
            .table(PROFILES_TABLE)?
            .select("*")
            .eq_ignore_case("email", email)
            .execute::<Profile>()
            .await?;
        Ok(candidates
            .into_iter()
            .find(|profile| same_email(&profile.email, email)))
    }

    /// Whether `owner` already has a row for exactly `email`
    async fn lists_email(&self, owner: Uuid, email: &str) -> Result<bool> {
        let rows = self
            .table(ROOMMATES_TABLE)?
            .select("email")
            .eq("user_id", owner)
            .eq_ignore_case("email", email)
            .execute::<ListedEmail>()
            .await?;
        Ok(rows.iter().any(|row| same_email(&row.email, email)))
    }

    async fn own_profile(&self, me: &CurrentUser) -> Result<Profile> {
        self.table(PROFILES_TABLE)?
            .select("*")
            .eq("id", me.id)
            .execute_one::<Profile>()
            .await?
            .ok_or_else(|| Error::ProfileNotFound(me.email.clone()))
    }

    /// Mirror the relationship under `target`. Returns `Ok(false)` when the
    /// target already lists the caller.
    async fn insert_reciprocal(&self, me: &CurrentUser, target: &Profile) -> Result<bool> {
        let my_profile = self.own_profile(me).await?;

        if self.lists_email(target.id, &my_profile.email).await? {
            log::debug!("{} already lists {}", target.id, me.id);
            return Ok(false);
        }

        self.table(ROOMMATES_TABLE)?
            .insert(NewRoommate::from_profile(target.id, &my_profile))
            .execute_no_return()
            .await?;
        Ok(true)
    }

    /// Hook-style add: notifies, refetches on success, returns whether the
    /// caller's row was written. A failed reciprocal insert still counts as
    /// success.
    pub async fn add_roommate(&self, email: &str) -> bool {
        match self.try_add_roommate(email).await {
            Ok(added) => {
                self.notify(Notification::success(
                    "Roommate added",
                    format!("{} has been added as your roommate", added.roommate.name),
                ));
                self.fetch_roommates().await;
                true
            }
            Err(e) => {
                self.notify(add_failure_notification(&e));
                false
            }
        }
    }

    /// Delete one of the caller's rows by id
    pub async fn try_delete_roommate(&self, id: Uuid) -> Result<()> {
        let _loading = self.begin();
        let me = self.client.auth().current_user()?;

        self.table(ROOMMATES_TABLE)?
            .delete()
            .eq("id", id)
            .eq("user_id", me.id)
            .execute()
            .await?;

        log::info!("Deleted roommate {} of {}", id, me.id);
        self.client.roommate_cache().invalidate(&[me.id]).await;
        Ok(())
    }

    pub async fn delete_roommate(&self, id: Uuid) -> bool {
        match self.try_delete_roommate(id).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Roommate removed",
                    "The roommate has been removed from your list",
                ));
                self.fetch_roommates().await;
                true
            }
            Err(e) => {
                log::error!("Error deleting roommate {}: {}", id, e);
                self.notify(Notification::error("Error removing roommate", e.to_string()));
                false
            }
        }
    }

    /// Delete every row owned by the caller. Rows owned by others, including
    /// their reciprocal rows pointing at the caller, are left alone.
    pub async fn try_delete_all_my_roommates(&self) -> Result<()> {
        let _loading = self.begin();
        let me = self.client.auth().current_user()?;

        self.table(ROOMMATES_TABLE)?
            .delete()
            .eq("user_id", me.id)
            .execute()
            .await?;

        log::info!("Deleted all roommates of {}", me.id);
        self.client.roommate_cache().invalidate(&[me.id]).await;
        Ok(())
    }

    pub async fn delete_all_my_roommates(&self) -> bool {
        match self.try_delete_all_my_roommates().await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Roommates cleared",
                    "All roommates have been removed from your list",
                ));
                self.fetch_roommates().await;
                true
            }
            Err(e) => {
                log::error!("Error deleting roommates: {}", e);
                self.notify(Notification::error(
                    "Error removing roommates",
                    e.to_string(),
                ));
                false
            }
        }
    }

    /// Email `roommate` a reminder of the current balance. The caller's own
    /// payment handle is included so a debtor knows where to pay; a failed
    /// profile read only drops the handle.
    pub async fn try_send_payment_reminder(&self, roommate: &Roommate) -> Result<()> {
        let _loading = self.begin();
        let session = self
            .client
            .auth()
            .get_session()
            .ok_or_else(|| Error::auth("Not logged in"))?;
        let me = self.client.auth().current_user()?;
        let mailer = self.client.mailer()?;

        let profile = match self.own_profile(&me).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                log::warn!("Sending reminder without payment handle: {}", e);
                None
            }
        };
        let sender = Sender {
            name: session
                .user
                .full_name()
                .map(str::to_string)
                .or_else(|| profile.as_ref().map(Profile::display_name))
                .unwrap_or_else(|| me.email.clone()),
            payment_id: profile
                .and_then(|p| p.payment_id)
                .filter(|id| !id.trim().is_empty()),
        };

        let message = mailer.payment_reminder(roommate, &sender);
        mailer.send(&message).await
    }

    pub async fn send_payment_reminder(&self, roommate: &Roommate) -> bool {
        match self.try_send_payment_reminder(roommate).await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Reminder sent",
                    format!("Payment reminder sent to {}", roommate.email),
                ));
                true
            }
            Err(e) => {
                log::error!("Error sending reminder to {}: {}", roommate.email, e);
                self.notify(Notification::error("Error sending reminder", e.to_string()));
                false
            }
        }
    }
}

fn add_failure_notification(error: &Error) -> Notification {
    match error {
        Error::InvalidEmail(_) => {
            Notification::error("Invalid email", "Please enter a valid email address")
        }
        Error::SelfAddition => Notification::error(
            "Invalid roommate",
            "You cannot add yourself as a roommate",
        ),
        Error::ProfileNotFound(email) => Notification::error(
            "User not found",
            format!("No registered user found with email {}", email),
        ),
        Error::AlreadyRoommate(email) => Notification::info(
            "Already added",
            format!("{} is already in your roommate list", email),
        ),
        other => {
            log::error!("Error adding roommate: {}", other);
            Notification::error("Error adding roommate", other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;

    #[test]
    fn failure_notifications_name_the_reason() {
        let n = add_failure_notification(&Error::InvalidEmail("x".into()));
        assert_eq!(n.title, "Invalid email");

        let n = add_failure_notification(&Error::ProfileNotFound("a@b.co".into()));
        assert_eq!(n.title, "User not found");
        assert!(n.description.contains("a@b.co"));

        let n = add_failure_notification(&Error::AlreadyRoommate("a@b.co".into()));
        assert_eq!(n.severity, Severity::Info);

        let n = add_failure_notification(&Error::database("boom"));
        assert_eq!(n.title, "Error adding roommate");
    }
}
