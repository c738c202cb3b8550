//! Error types for gift exchange operations.
//!
//! Every variant belongs to one [`ErrorKind`]. Errors are terminal to the
//! operation that raised them: a failed write never reaches a subscriber,
//! so derived views keep their last good snapshot.

use thiserror::Error;

use crate::store::StoreError;

/// Broad category of an [`ExchangeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input; nothing was written.
    Validation,
    /// The referenced event or participant does not exist.
    NotFound,
    /// The caller may not perform the action.
    Authorization,
    /// The draw could not run.
    Engine,
    /// The document store (or local session file) failed.
    Store,
}

/// Error type for gift exchange operations.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Invalid data provided.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Event not found.
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// Participant not found in the active event.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    /// The action needs a signed-in identity.
    #[error("Not signed in")]
    NotSignedIn,

    /// The action needs a joined event.
    #[error("No active event")]
    NoActiveEvent,

    /// The caller does not own the record or event.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The event no longer accepts roster changes.
    #[error("Event is closed: {0}")]
    EventClosed(String),

    /// Draw attempted with too few participants.
    #[error("Draw needs at least 2 participants, found {found}")]
    NotEnoughParticipants {
        /// Participants present at draw time.
        found: usize,
    },

    /// Document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local session file could not be read or written.
    #[error("Session error: {0}")]
    Session(String),
}

impl ExchangeError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::EventNotFound(_) | Self::ParticipantNotFound(_) | Self::NoActiveEvent => {
                ErrorKind::NotFound
            }
            Self::NotSignedIn | Self::Unauthorized(_) | Self::EventClosed(_) => {
                ErrorKind::Authorization
            }
            Self::NotEnoughParticipants { .. } => ErrorKind::Engine,
            Self::Store(_) | Self::Session(_) => ErrorKind::Store,
        }
    }
}

/// Result type alias for gift exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
