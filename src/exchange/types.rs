//! Core types for gift exchanges.
//!
//! Field names on the wire follow the document layout of the store:
//! participants carry `likes` and `createdAt`, assignments carry
//! `giverId`/`giverName`/`giverManager`/`giverPhone` plus a full
//! `receiver` snapshot.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet used for generated event codes (base 36, upper case).
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Short opaque code identifying an event.
///
/// Codes are always trimmed and upper-cased, so `" ab12cd "` and
/// `"AB12CD"` refer to the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCode(String);

impl EventCode {
    /// Normalizes user input into a code.
    ///
    /// Returns `None` when the input is blank.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            None
        } else {
            Some(Self(code))
        }
    }

    /// Generates a random base-36 code of `len` characters.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        let code = (0..len)
            .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps an identity reference issued by an identity provider.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Accepting registrations.
    #[default]
    Open,
    /// Draw done; roster frozen.
    Closed,
}

impl EventStatus {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// An exchange event (`events/{code}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Display name.
    pub name: String,
    /// Gift budget as entered (numeric string).
    pub budget: String,
    /// Identity of the organizer.
    pub admin: Identity,
    /// Lifecycle status.
    pub status: EventStatus,
}

impl Event {
    /// Creates an open event owned by `admin`.
    #[must_use]
    pub fn new(name: impl Into<String>, budget: impl Into<String>, admin: Identity) -> Self {
        Self {
            name: name.into(),
            budget: budget.into(),
            admin,
            status: EventStatus::Open,
        }
    }

    /// Returns whether the event still accepts roster changes.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == EventStatus::Open
    }

    /// Returns whether `identity` organizes this event.
    #[must_use]
    pub fn is_admin(&self, identity: &Identity) -> bool {
        &self.admin == identity
    }
}

/// Partial update of an event document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New budget.
    pub budget: Option<String>,
    /// New status.
    pub status: Option<EventStatus>,
}

impl EventUpdate {
    /// Update that only changes the status.
    #[must_use]
    pub const fn status(status: EventStatus) -> Self {
        Self {
            name: None,
            budget: None,
            status: Some(status),
        }
    }

    /// Applies the set fields to `event`.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.name.clone_from(name);
        }
        if let Some(budget) = &self.budget {
            event.budget.clone_from(budget);
        }
        if let Some(status) = self.status {
            event.status = status;
        }
    }
}

/// A registered participant (`events/{code}/list/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Store-assigned id, unique within the event.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Digits-only phone, prefixed with the country code.
    pub phone: String,
    /// Free-text wishlist.
    #[serde(rename = "likes")]
    pub wishlist: String,
    /// Identity that registered this participant.
    pub manager: Identity,
    /// Insert timestamp in milliseconds. Missing values sort first.
    #[serde(default)]
    pub created_at: i64,
}

/// A participant before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    /// Display name.
    pub name: String,
    /// Digits-only phone, prefixed with the country code.
    pub phone: String,
    /// Free-text wishlist.
    pub wishlist: String,
    /// Identity that registers this participant.
    pub manager: Identity,
    /// Insert timestamp in milliseconds.
    pub created_at: i64,
}

impl ParticipantRecord {
    /// Attaches the store-assigned id.
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Participant {
        Participant {
            id: id.into(),
            name: self.name,
            phone: self.phone,
            wishlist: self.wishlist,
            manager: self.manager,
            created_at: self.created_at,
        }
    }
}

/// One giver → receiver pair of a draw.
///
/// Both sides are snapshots taken when the draw ran; later edits to the
/// participant records do not change a finished draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Giver participant id.
    pub giver_id: String,
    /// Giver display name.
    pub giver_name: String,
    /// Identity that registered the giver.
    pub giver_manager: Identity,
    /// Giver phone (digits, prefixed).
    pub giver_phone: String,
    /// Full receiver snapshot.
    pub receiver: Participant,
}

impl Assignment {
    /// Pairs `giver` with `receiver`, snapshotting both.
    #[must_use]
    pub fn between(giver: &Participant, receiver: &Participant) -> Self {
        Self {
            giver_id: giver.id.clone(),
            giver_name: giver.name.clone(),
            giver_manager: giver.manager.clone(),
            giver_phone: giver.phone.clone(),
            receiver: receiver.clone(),
        }
    }
}

/// All assignments of one draw, in draw order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    assignments: Vec<Assignment>,
}

impl ResultSet {
    /// Wraps the assignments of a draw.
    #[must_use]
    pub const fn new(assignments: Vec<Assignment>) -> Self {
        Self { assignments }
    }

    /// Returns the assignments in draw order.
    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Returns the number of assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns whether the set holds no assignments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Encodes the set into the string stored in the `data` field.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.assignments)
    }

    /// Decodes the `data` field of a results document.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not an encoded assignment list.
    pub fn decode(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data).map(Self::new)
    }
}

/// Strips everything but ASCII digits.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
