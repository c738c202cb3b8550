//! Live per-event view.
//!
//! [`LiveEvent`] holds the three subscriptions of one event and derives
//! what a session shows: households, which controls are offered, and the
//! viewer's results. Snapshots of the three documents arrive independently
//! and in no guaranteed order relative to each other, so every derived
//! value is computed from whatever the latest snapshots are.

use crate::exchange::{
    group_households, Assignment, Event, EventCode, Household, Identity, Participant, Result,
    ResultSet, Viewer, VisibilityResolver, MIN_PARTICIPANTS,
};
use crate::store::{StoreClient, Subscription};

/// What the viewer's results area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsState {
    /// No draw yet.
    Open,
    /// Event closed but the result set has not arrived.
    Pending,
    /// Assignments this viewer may see, possibly none.
    Ready(Vec<Assignment>),
}

impl ResultsState {
    /// Returns whether the viewer should be offered the phone search box.
    #[must_use]
    pub fn needs_contact_search(&self) -> bool {
        matches!(self, Self::Ready(visible) if visible.is_empty())
    }
}

/// Latest known state of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSnapshot {
    /// Event code.
    pub code: EventCode,
    /// Event document, `None` if it does not exist (yet).
    pub event: Option<Event>,
    /// Participant list.
    pub participants: Vec<Participant>,
    /// Latest result set, if one was ever written.
    pub results: Option<ResultSet>,
}

impl EventSnapshot {
    /// Households derived from the current participant list.
    #[must_use]
    pub fn households(&self) -> Vec<Household> {
        group_households(&self.participants)
    }

    /// Returns whether the event document says closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.event.as_ref().is_some_and(|e| !e.is_open())
    }

    /// Results as seen by `viewer`.
    ///
    /// A result set only counts once the event is closed; one written by a
    /// draw whose close failed is ignored.
    #[must_use]
    pub fn results_state(&self, viewer: Viewer<'_>, resolver: &VisibilityResolver) -> ResultsState {
        if !self.is_closed() {
            return ResultsState::Open;
        }
        match &self.results {
            None => ResultsState::Pending,
            Some(results) => ResultsState::Ready(
                resolver
                    .visible(results.assignments(), viewer)
                    .into_iter()
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Returns whether `viewer` is offered deletion of `participant`.
    #[must_use]
    pub fn can_delete(&self, participant: &Participant, viewer: &Identity) -> bool {
        !self.is_closed() && self.event.is_some() && &participant.manager == viewer
    }

    /// Returns whether `viewer` is offered the draw.
    #[must_use]
    pub fn can_draw(&self, viewer: &Identity) -> bool {
        self.event
            .as_ref()
            .is_some_and(|e| e.is_open() && e.is_admin(viewer))
            && self.participants.len() >= MIN_PARTICIPANTS
    }
}

/// Subscriptions to the documents of one event.
///
/// Dropping it detaches all three.
#[derive(Debug)]
pub struct LiveEvent {
    code: EventCode,
    event: Subscription<Option<Event>>,
    participants: Subscription<Vec<Participant>>,
    results: Subscription<Option<ResultSet>>,
}

impl LiveEvent {
    /// Subscribes to the event document, participant list and result set.
    ///
    /// # Errors
    ///
    /// Returns an error if any first snapshot cannot be read.
    pub fn attach(store: &StoreClient, code: &EventCode) -> Result<Self> {
        Ok(Self {
            code: code.clone(),
            event: store.subscribe_event(code)?,
            participants: store.subscribe_participants(code)?,
            results: store.subscribe_results(code)?,
        })
    }

    /// Event code.
    #[must_use]
    pub const fn code(&self) -> &EventCode {
        &self.code
    }

    /// Latest snapshots of all three documents.
    #[must_use]
    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot {
            code: self.code.clone(),
            event: self.event.current(),
            participants: self.participants.current(),
            results: self.results.current(),
        }
    }

    /// Returns whether any document changed since last observed.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.event.has_changed() || self.participants.has_changed() || self.results.has_changed()
    }

    /// Waits until any of the documents changes.
    ///
    /// Returns `false` once the store has dropped a feed.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            alive = self.event.changed() => alive,
            alive = self.participants.changed() => alive,
            alive = self.results.changed() => alive,
        }
    }
}
