//! The draw: who gives to whom.
//!
//! Participants are shuffled uniformly (Fisher–Yates) and each one gives to
//! the next in the shuffled order, the last giving to the first. The
//! result is a single cycle through everybody, so for two or more
//! participants nobody draws themselves, everybody gives once, and
//! everybody receives once. No rejection sampling is involved.

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use super::error::{ExchangeError, Result};
use super::types::{Assignment, EventCode, EventStatus, EventUpdate, Participant, ResultSet};
use crate::store::StoreClient;

/// Fewest participants a draw accepts.
pub const MIN_PARTICIPANTS: usize = 2;

/// Shuffles `participants` and closes them into one gift cycle.
///
/// # Errors
///
/// Returns [`ExchangeError::NotEnoughParticipants`] for fewer than
/// [`MIN_PARTICIPANTS`] participants.
pub fn draw_assignments<R: Rng + ?Sized>(
    participants: &[Participant],
    rng: &mut R,
) -> Result<ResultSet> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(ExchangeError::NotEnoughParticipants {
            found: participants.len(),
        });
    }

    let mut pool = participants.to_vec();
    pool.shuffle(rng);
    Ok(close_cycle(&pool))
}

/// Pairs `order[i]` with `order[(i + 1) % n]`.
#[must_use]
pub fn close_cycle(order: &[Participant]) -> ResultSet {
    let n = order.len();
    let assignments = order
        .iter()
        .enumerate()
        .map(|(i, giver)| Assignment::between(giver, &order[(i + 1) % n]))
        .collect();
    ResultSet::new(assignments)
}

/// Runs draws against the store.
pub struct AssignmentEngine<'a> {
    store: &'a StoreClient,
}

impl<'a> AssignmentEngine<'a> {
    /// Creates an engine writing through `store`.
    #[must_use]
    pub const fn new(store: &'a StoreClient) -> Self {
        Self { store }
    }

    /// Draws the current roster of `code` and closes the event.
    ///
    /// The result set is written first, in one write, and only then is the
    /// event marked closed. If closing fails the event stays open with a
    /// stale result set that nothing treats as final; running the draw
    /// again replaces it. Running it on a closed event replaces the
    /// previous result set outright.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist, has fewer than
    /// [`MIN_PARTICIPANTS`] participants (nothing is written), or a store
    /// write fails.
    pub fn run<R: Rng + ?Sized>(&self, code: &EventCode, rng: &mut R) -> Result<ResultSet> {
        let event = self
            .store
            .get_event(code)?
            .ok_or_else(|| ExchangeError::EventNotFound(code.to_string()))?;

        let participants = self.store.list_participants(code)?;
        let results = draw_assignments(&participants, rng)?;

        if !event.is_open() {
            warn!(
                "event=redraw module=draw code={code} previous_status={}",
                event.status.as_str()
            );
        }

        self.store.put_results(code, &results)?;

        if event.is_open() {
            self.store
                .update_event(code, &EventUpdate::status(EventStatus::Closed))?;
        }

        info!(
            "event=draw_completed module=draw status=ok code={code} participants={}",
            results.len()
        );
        Ok(results)
    }
}
